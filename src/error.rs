//! Error types for chunk grammars and chunk parsing.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
  /// A tag pattern (or the rule regex built from it) is malformed.
  #[error("bad tag pattern {pattern:?}: {reason}")]
  InvalidPattern { pattern: String, reason: String },

  /// A line of a grammar is neither a stage label, a rule, nor a comment.
  #[error("grammar line {line}: {reason}: {text:?}")]
  InvalidGrammarLine {
    line: usize,
    text: String,
    reason: String,
  },

  /// A grammar rule whose tag pattern failed to compile; `source` is the
  /// [`Error::InvalidPattern`].
  #[error("grammar line {line}: {source}")]
  InvalidRulePattern {
    line: usize,
    #[source]
    source: Box<Error>,
  },

  #[error("grammar has no stages (expected a stage marker such as `NP:`)")]
  EmptyGrammar,

  /// A rule produced an encoding that is unbalanced, nested, or changes the tags.
  #[error("transformation generated invalid chunkstring ({reason}):\n  {encoded}")]
  InvalidRewrite { encoded: String, reason: String },

  /// A leaf tag or subtree label can't be written into a chunk string.
  #[error("tag {0:?} is empty or contains one of `{{}}<>`")]
  InvalidTag(String),

  #[error("regex engine failed while applying a rule: {0}")]
  RegexRuntime(String),

  #[error("bad tagged string at char {position}: {reason}")]
  InvalidTagString { position: usize, reason: String },

  #[error("bad CoNLL data on line {line}: {reason}")]
  InvalidConll { line: usize, reason: String },

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl Error {
  pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
    Self::InvalidPattern {
      pattern: pattern.to_string(),
      reason: reason.into(),
    }
  }

  pub(crate) fn invalid_rewrite(encoded: &str, reason: impl Into<String>) -> Self {
    Self::InvalidRewrite {
      encoded: encoded.to_string(),
      reason: reason.into(),
    }
  }
}
