use std::fmt;

use fancy_regex::{Regex, RegexBuilder};

use crate::chunkstring::{ChunkString, Scope};
use crate::error::{Error, Result};
use crate::tag_pattern::tag_pattern_to_regex;

/// What a rule does, along with the tag patterns it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
  /// Chunk any chink run matching the pattern.
  Chunk(String),
  /// Remove any chunked run matching the pattern from its chunk.
  Chink(String),
  /// Un-chunk any complete chunk matching the pattern.
  UnChunk(String),
  /// Merge a chunk ending in `left` with a following chunk starting with `right`.
  Merge { left: String, right: String },
  /// Split a chunk between a `left` match and a `right` match.
  Split { left: String, right: String },
  /// Grow a chunk starting with `right` leftward over chink material matching `left`.
  ExpandLeft { left: String, right: String },
  /// Grow a chunk ending in `left` rightward over chink material matching `right`.
  ExpandRight { left: String, right: String },
  /// Chunk a chink run matching `chunk` when it sits between `left` and `right`.
  /// Both contexts are consumed by the match.
  ChunkWithContext {
    left: String,
    chunk: String,
    right: String,
  },
  /// A hand-written regex and replacement over the encoding.
  Raw,
}

/// One rewrite step over a [`ChunkString`]: a compiled regex, a replacement
/// template, and a short description used in traces.
#[derive(Debug, Clone)]
pub struct RegexpChunkRule {
  kind: RuleKind,
  regex: Regex,
  replacement: String,
  scope: Scope,
  descr: String,
}

/// Backtracking budget for a single search over an encoding.
const BACKTRACK_LIMIT: usize = 10_000_000;

fn compile(pattern: &str, regex: &str) -> Result<Regex> {
  RegexBuilder::new(regex)
    .backtrack_limit(BACKTRACK_LIMIT)
    .build()
    .map_err(|e| Error::invalid_pattern(pattern, e.to_string()))
}

/// Compiles a tag pattern on its own, so a bad pattern is reported against
/// itself rather than the assembled rule regex.
fn sub_pattern(tag_pattern: &str) -> Result<String> {
  let re = tag_pattern_to_regex(tag_pattern)?;
  compile(tag_pattern, &re)?;
  Ok(re)
}

impl RegexpChunkRule {
  /// A rule from an arbitrary regex over the encoding. The replacement may
  /// refer to groups as `$name` or `${name}`, and must only add or remove
  /// braces.
  pub fn new(regex: &str, replacement: impl Into<String>, descr: impl Into<String>) -> Result<Self> {
    Ok(Self {
      kind: RuleKind::Raw,
      regex: compile(regex, regex)?,
      replacement: replacement.into(),
      scope: Scope::Anywhere,
      descr: descr.into(),
    })
  }

  fn build(kind: RuleKind, regex: String, replacement: &str, descr: &str) -> Result<Self> {
    let scope = match &kind {
      RuleKind::Chunk(_) | RuleKind::ChunkWithContext { .. } => Scope::InChink,
      RuleKind::Chink(_) => Scope::InChunk,
      _ => Scope::Anywhere,
    };
    let regex = compile(&regex, &regex)?;
    Ok(Self {
      kind,
      regex,
      replacement: replacement.to_string(),
      scope,
      descr: descr.to_string(),
    })
  }

  pub fn chunk(tag_pattern: &str, descr: &str) -> Result<Self> {
    let re = format!("(?P<chunk>{})", sub_pattern(tag_pattern)?);
    Self::build(RuleKind::Chunk(tag_pattern.to_string()), re, "{${chunk}}", descr)
  }

  pub fn chink(tag_pattern: &str, descr: &str) -> Result<Self> {
    let re = format!("(?P<chink>{})", sub_pattern(tag_pattern)?);
    Self::build(RuleKind::Chink(tag_pattern.to_string()), re, "}${chink}{", descr)
  }

  pub fn unchunk(tag_pattern: &str, descr: &str) -> Result<Self> {
    let re = format!(r"\{{(?P<chunk>{})\}}", sub_pattern(tag_pattern)?);
    Self::build(RuleKind::UnChunk(tag_pattern.to_string()), re, "${chunk}", descr)
  }

  pub fn merge(left: &str, right: &str, descr: &str) -> Result<Self> {
    let re = format!(
      r"(?P<left>{})\}}\{{(?={})",
      sub_pattern(left)?,
      sub_pattern(right)?
    );
    let kind = RuleKind::Merge {
      left: left.to_string(),
      right: right.to_string(),
    };
    Self::build(kind, re, "${left}", descr)
  }

  pub fn split(left: &str, right: &str, descr: &str) -> Result<Self> {
    let re = format!(
      "(?P<left>{})(?={})",
      sub_pattern(left)?,
      sub_pattern(right)?
    );
    let kind = RuleKind::Split {
      left: left.to_string(),
      right: right.to_string(),
    };
    Self::build(kind, re, "${left}}{", descr)
  }

  pub fn expand_left(left: &str, right: &str, descr: &str) -> Result<Self> {
    let re = format!(
      r"(?P<left>{})\{{(?P<right>{})",
      sub_pattern(left)?,
      sub_pattern(right)?
    );
    let kind = RuleKind::ExpandLeft {
      left: left.to_string(),
      right: right.to_string(),
    };
    Self::build(kind, re, "{${left}${right}", descr)
  }

  pub fn expand_right(left: &str, right: &str, descr: &str) -> Result<Self> {
    let re = format!(
      r"(?P<left>{})\}}(?P<right>{})",
      sub_pattern(left)?,
      sub_pattern(right)?
    );
    let kind = RuleKind::ExpandRight {
      left: left.to_string(),
      right: right.to_string(),
    };
    Self::build(kind, re, "${left}${right}}", descr)
  }

  pub fn chunk_with_context(left: &str, chunk: &str, right: &str, descr: &str) -> Result<Self> {
    let re = format!(
      "(?P<left>{})(?P<chunk>{})(?P<right>{})",
      sub_pattern(left)?,
      sub_pattern(chunk)?,
      sub_pattern(right)?
    );
    let kind = RuleKind::ChunkWithContext {
      left: left.to_string(),
      chunk: chunk.to_string(),
      right: right.to_string(),
    };
    Self::build(kind, re, "${left}{${chunk}}${right}", descr)
  }

  /// Applies this rule to `chunkstr` in place.
  pub fn apply(&self, chunkstr: &mut ChunkString) -> Result<()> {
    chunkstr.rewrite_in(self.scope, &self.regex, &self.replacement)
  }

  pub fn kind(&self) -> &RuleKind {
    &self.kind
  }

  pub fn descr(&self) -> &str {
    &self.descr
  }

  pub fn regex(&self) -> &Regex {
    &self.regex
  }

  pub fn replacement(&self) -> &str {
    &self.replacement
  }

  /// Where a match must end for this rule to rewrite it.
  pub fn scope(&self) -> Scope {
    self.scope
  }
}

impl fmt::Display for RegexpChunkRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.kind {
      RuleKind::Chunk(p) => write!(f, "<ChunkRule: {:?}>", p),
      RuleKind::Chink(p) => write!(f, "<ChinkRule: {:?}>", p),
      RuleKind::UnChunk(p) => write!(f, "<UnChunkRule: {:?}>", p),
      RuleKind::Merge { left, right } => write!(f, "<MergeRule: {:?}, {:?}>", left, right),
      RuleKind::Split { left, right } => write!(f, "<SplitRule: {:?}, {:?}>", left, right),
      RuleKind::ExpandLeft { left, right } => {
        write!(f, "<ExpandLeftRule: {:?}, {:?}>", left, right)
      }
      RuleKind::ExpandRight { left, right } => {
        write!(f, "<ExpandRightRule: {:?}, {:?}>", left, right)
      }
      RuleKind::ChunkWithContext { left, chunk, right } => write!(
        f,
        "<ChunkRuleWithContext: {:?}, {:?}, {:?}>",
        left, chunk, right
      ),
      RuleKind::Raw => write!(
        f,
        "<RegexpChunkRule: {:?}->{:?}>",
        self.regex.as_str(),
        self.replacement
      ),
    }
  }
}
