//! The string encoding that chunk rules operate on.
//!
//! A sentence is encoded as its tag sequence with chunks marked by braces:
//!
//! ```text
//! {<DT><JJ><NN>}<VBN><IN>{<DT><NN>}<.>{<DT><NN>}<VBD><.>
//! ```
//!
//! Rules rewrite this string with regular expressions. A rewrite may only
//! add or remove braces: the tags stay the same and in the same order, and
//! braces never nest.

use std::fmt;

use fancy_regex::Regex;

use crate::error::{Error, Result};
use crate::syntree::SynTree;

/// Regex character class for a character that can appear inside a tag.
pub const CHUNK_TAG_CHAR: &str = r"[^\{\}<>]";

/// Where a match has to end for a scoped rewrite to replace it.
///
/// A position is inside a chunk when the next brace at or after it is `}`,
/// and inside a chink when the next brace is `{` or there is none. Tag
/// patterns never match a brace, so a match lies entirely in one run and
/// its end position decides for the whole match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
  Anywhere,
  InChunk,
  InChink,
}

/// `table[i]` is true when position `i` of `encoded` is inside a chunk.
fn chunk_positions(encoded: &str) -> Vec<bool> {
  let bytes = encoded.as_bytes();
  let mut table = vec![false; bytes.len() + 1];
  let mut next_close = false;
  for i in (0..bytes.len()).rev() {
    match bytes[i] {
      b'}' => next_close = true,
      b'{' => next_close = false,
      _ => {}
    }
    table[i] = next_close;
  }
  table
}

/// How much checking a [`ChunkString`] does on its encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum DebugLevel {
  /// No checks at all.
  Off,
  /// Full check once, when converting back into a tree.
  #[default]
  CheckOnFinalize,
  /// Full check when converting back, plus a structural check (bracketing
  /// only) after every rewrite.
  CheckCheaply,
  /// Full check, tags included, after every rewrite.
  CheckFully,
}

impl DebugLevel {
  /// Maps the historical integer levels (0 to 3) onto the enum; anything
  /// above 3 checks fully.
  pub fn from_level(level: u8) -> Self {
    match level {
      0 => Self::Off,
      1 => Self::CheckOnFinalize,
      2 => Self::CheckCheaply,
      _ => Self::CheckFully,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verify {
  Structure,
  StructureAndTags,
}

/// A chunking of one sentence, encoded as a string of tags and braces.
///
/// Created fresh from a tree at the start of a stage, rewritten in place by
/// rules, and consumed by [`ChunkString::into_tree`].
#[derive(Debug, Clone)]
pub struct ChunkString {
  pieces: Vec<SynTree>,
  tags: Vec<String>,
  encoded: String,
  debug: DebugLevel,
}

impl ChunkString {
  /// Encodes the immediate children of `chunk_struct`. Nothing is chunked
  /// initially; subtrees contribute their label as their tag.
  pub fn new(chunk_struct: &SynTree, debug: DebugLevel) -> Result<Self> {
    Self::from_pieces(chunk_struct.children().to_vec(), debug)
  }

  pub fn from_pieces(pieces: Vec<SynTree>, debug: DebugLevel) -> Result<Self> {
    let mut tags = Vec::with_capacity(pieces.len());
    let mut encoded = String::new();
    for piece in pieces.iter() {
      let tag = piece.tag();
      if tag.is_empty() || tag.contains(['{', '}', '<', '>']) {
        return Err(Error::InvalidTag(tag.to_string()));
      }
      encoded.push('<');
      encoded.push_str(tag);
      encoded.push('>');
      tags.push(tag.to_string());
    }

    Ok(Self {
      pieces,
      tags,
      encoded,
      debug,
    })
  }

  /// The raw encoding, e.g. `{<DT><NN>}<VBD>`.
  pub fn as_str(&self) -> &str {
    &self.encoded
  }

  pub fn tags(&self) -> &[String] {
    &self.tags
  }

  pub fn debug_level(&self) -> DebugLevel {
    self.debug
  }

  /// Replaces every non-overlapping match of `regex` with `replacement`
  /// (`$name` / `${name}` refer to named groups), then drops any empty
  /// `{}` chunks the replacement left behind.
  ///
  /// The replacement must only add or remove braces. Depending on the debug
  /// level, the result is checked and [`Error::InvalidRewrite`] returned if
  /// it isn't a valid chunking of the same tags; on error the encoding is
  /// left unchanged.
  pub fn rewrite(&mut self, regex: &Regex, replacement: &str) -> Result<()> {
    self.rewrite_in(Scope::Anywhere, regex, replacement)
  }

  /// Like [`ChunkString::rewrite`], but only replaces matches that end in
  /// `scope`. Other matches are left as they are.
  pub fn rewrite_in(&mut self, scope: Scope, regex: &Regex, replacement: &str) -> Result<()> {
    let rewritten = match scope {
      Scope::Anywhere => regex
        .try_replacen(&self.encoded, 0, replacement)
        .map_err(|e| Error::RegexRuntime(e.to_string()))?
        .into_owned(),
      scope => self.replace_scoped(scope, regex, replacement)?,
    };
    let rewritten = rewritten.replace("{}", "");

    match self.debug {
      DebugLevel::Off | DebugLevel::CheckOnFinalize => {}
      DebugLevel::CheckCheaply => self.verify(&rewritten, Verify::Structure)?,
      DebugLevel::CheckFully => self.verify(&rewritten, Verify::StructureAndTags)?,
    }

    self.encoded = rewritten;
    Ok(())
  }

  fn replace_scoped(&self, scope: Scope, regex: &Regex, replacement: &str) -> Result<String> {
    let encoded = self.encoded.as_str();
    let in_chunk = chunk_positions(encoded);
    let want_chunk = scope == Scope::InChunk;

    let mut out = String::with_capacity(encoded.len() + 8);
    let mut last = 0;
    for caps in regex.captures_iter(encoded) {
      let caps = caps.map_err(|e| Error::RegexRuntime(e.to_string()))?;
      let Some(m) = caps.get(0) else { continue };
      if in_chunk[m.end()] != want_chunk {
        continue;
      }
      out.push_str(&encoded[last..m.start()]);
      caps.expand(replacement, &mut out);
      last = m.end();
    }
    out.push_str(&encoded[last..]);
    Ok(out)
  }

  /// Checks that `s` is well formed and, if asked, that it still encodes
  /// exactly this string's tags.
  fn verify(&self, s: &str, what: Verify) -> Result<()> {
    regex_static!(VALID, r"^(?:\{?<[^\{\}<>]+>\}?)*$");
    if !VALID.is_match(s) {
      return Err(Error::invalid_rewrite(s, "malformed encoding"));
    }

    let mut open = false;
    for c in s.chars() {
      match (c, open) {
        ('{', false) => open = true,
        ('}', true) => open = false,
        ('{', true) => return Err(Error::invalid_rewrite(s, "nested chunk")),
        ('}', false) => return Err(Error::invalid_rewrite(s, "unbalanced `}`")),
        _ => {}
      }
    }
    if open {
      return Err(Error::invalid_rewrite(s, "unclosed chunk"));
    }

    if what == Verify::StructureAndTags {
      let found = s
        .split(['{', '}', '<', '>'])
        .filter(|t| !t.is_empty());
      if !found.eq(self.tags.iter().map(String::as_str)) {
        return Err(Error::invalid_rewrite(s, "tag changed"));
      }
    }

    Ok(())
  }

  /// Builds the tree this encoding describes: pieces outside braces become
  /// direct children of a `top_label` root, each braced run becomes one
  /// `chunk_label` subtree.
  pub fn into_tree(self, chunk_label: &str, top_label: &str) -> Result<SynTree> {
    if self.debug != DebugLevel::Off {
      self.verify(&self.encoded, Verify::StructureAndTags)?;
    }

    let total = self.pieces.len();
    let mut pieces = self.pieces.into_iter();
    let mut consumed = 0;
    let mut children = Vec::with_capacity(total);

    // runs alternate between outside and inside a chunk, starting outside
    for (idx, run) in self.encoded.split(['{', '}']).enumerate() {
      let length = run.matches('<').count();
      if consumed + length > total {
        return Err(Error::invalid_rewrite(
          &self.encoded,
          "encoding has more tags than the sentence",
        ));
      }
      consumed += length;

      let run_pieces = pieces.by_ref().take(length);
      if idx % 2 == 1 {
        children.push(SynTree::branch(chunk_label, run_pieces.collect()));
      } else {
        children.extend(run_pieces);
      }
    }

    if consumed != total {
      return Err(Error::invalid_rewrite(
        &self.encoded,
        "encoding has fewer tags than the sentence",
      ));
    }

    Ok(SynTree::branch(top_label, children))
  }
}

/// Pads the encoding so that the tags of several chunkings of one sentence
/// line up when printed one above the other.
impl fmt::Display for ChunkString {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut out = String::with_capacity(self.encoded.len() * 2);
    let mut prev: Option<char> = None;
    let mut chars = self.encoded.chars().peekable();
    while let Some(c) = chars.next() {
      if c == '<' && prev != Some('{') {
        out.push(' ');
      }
      out.push(c);
      if c == '>' && chars.peek() != Some(&'}') {
        out.push(' ');
      }
      prev = Some(c);
    }
    write!(f, "{}", out)
  }
}
