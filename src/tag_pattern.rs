//! Tag patterns: regular expressions over `<TAG>` units.
//!
//! A tag pattern differs from an ordinary regex in three ways:
//!
//! - `<` and `>` group like parentheses, so `<NN>+` repeats the whole
//!   `<NN>` and `<NN|IN>` alternates only the tag names.
//! - whitespace is ignored, so `<DT> | <NN>` is the same as `<DT>|<NN>`.
//! - `.` matches any character that can appear inside a tag, i.e. anything
//!   but `{`, `}`, `<` and `>`. `<NN.*>` matches any single tag starting
//!   with `NN`.

use crate::chunkstring::CHUNK_TAG_CHAR;
use crate::error::{Error, Result};

/// Converts a tag pattern into a standard regular expression.
///
/// ```
/// use rechunk::tag_pattern_to_regex;
///
/// assert_eq!(tag_pattern_to_regex("<DT> | <NN>").unwrap(), "(<(DT)>)|(<(NN)>)");
/// assert!(tag_pattern_to_regex("<DT<NN>>").is_err());
/// ```
pub fn tag_pattern_to_regex(tag_pattern: &str) -> Result<String> {
  // angle brackets have to stay literal in the match, so wrap them in
  // groups instead of replacing them
  let mut grouped = String::with_capacity(tag_pattern.len() * 2);
  for c in tag_pattern.chars().filter(|c| !c.is_whitespace()) {
    match c {
      '<' => grouped.push_str("(<("),
      '>' => grouped.push_str(")>)"),
      c => grouped.push(c),
    }
  }

  regex_static!(CHUNK_TAG_PATTERN, r"^(?:[^\{\}<>]+|<[^\{\}<>]+>)*$");
  if !CHUNK_TAG_PATTERN.is_match(&grouped) {
    return Err(Error::invalid_pattern(
      tag_pattern,
      "braces are not allowed, and angle brackets must pair up without nesting",
    ));
  }

  // done after the check, since the tag char class adds braces and brackets
  Ok(expand_dots(&grouped))
}

/// Replaces each unescaped `.` with the tag character class. An escaped
/// character (`\.`, `\\`) is copied through as a unit.
fn expand_dots(pattern: &str) -> String {
  let mut out = String::with_capacity(pattern.len());
  let mut chars = pattern.chars();
  while let Some(c) = chars.next() {
    match c {
      '\\' => {
        out.push(c);
        if let Some(escaped) = chars.next() {
          out.push(escaped);
        }
      }
      '.' => out.push_str(CHUNK_TAG_CHAR),
      c => out.push(c),
    }
  }
  out
}
