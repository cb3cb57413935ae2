//! Line-based parsing of chunk grammars.
//!
//! A grammar is a list of stages. Each stage starts with a `LABEL:` line
//! and is followed by its rules, one per line:
//!
//! ```text
//! NP:
//!   {<DT|JJ>}          # chunk determiners and adjectives
//!   }<[\.VI].*>+{      # chink any tag beginning with V, I, or .
//!   <.*>}{<DT>         # split a chunk at a determiner
//!   <DT|JJ>{}<NN.*>    # merge chunk ending with det/adj
//!                      # with one starting with a noun
//! PP: {<IN><NP>}       # the first rule may share the label's line
//! ```
//!
//! Anything after an unescaped `#` is the rule's description.
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};
use crate::grammar::Grammar;
use crate::rules::RegexpChunkRule;

impl FromStr for Grammar {
  type Err = Error;

  /// Compiles a grammar from its text. Stages run in the order they appear.
  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    let stages = parse_stages(s)?;
    Grammar::from_stages(stages)
  }
}

impl RegexpChunkRule {
  /// Builds a rule from one line of grammar syntax:
  ///
  /// ```text
  /// {pattern}              chunk
  /// }pattern{              chink
  /// left}{right            split
  /// left{}right            merge
  /// left{pattern}right     chunk with context
  /// ```
  pub fn parse(s: &str) -> Result<Self> {
    parse_rule(s, 1)
  }
}

/// A stage as written: its chunk label and its rules, in order.
pub type StageSource = (String, Vec<RegexpChunkRule>);

fn bad_line(line: usize, text: &str, reason: impl Into<String>) -> Error {
  Error::InvalidGrammarLine {
    line,
    text: text.to_string(),
    reason: reason.into(),
  }
}

/// Splits a rule line into its body and its (possibly empty) description.
/// `\#` does not start a comment.
fn split_comment(s: &str) -> (&str, &str) {
  regex_static!(RULE_AND_COMMENT, r"^(?P<rule>(?:\\.|[^#])*)(?P<comment>#.*)?$");
  match RULE_AND_COMMENT.captures(s) {
    Some(caps) => {
      let rule = caps.name("rule").map_or("", |m| m.as_str());
      let comment = caps.name("comment").map_or("", |m| &m.as_str()[1..]);
      (rule.trim(), comment.trim())
    }
    None => (s.trim(), ""),
  }
}

/// Parses one rule line. `line` is only used for error reporting.
fn parse_rule(s: &str, line: usize) -> Result<RegexpChunkRule> {
  regex_static!(WITH_CONTEXT, r"^(?P<left>[^\{\}]*)\{(?P<chunk>[^\{\}]*)\}(?P<right>[^\{\}]*)$");

  let (rule, descr) = split_comment(s);
  if rule.is_empty() {
    return Err(bad_line(line, s, "empty chunk pattern"));
  }

  if rule.len() >= 2 && rule.starts_with('{') && rule.ends_with('}') {
    RegexpChunkRule::chunk(&rule[1..rule.len() - 1], descr)
  } else if rule.len() >= 2 && rule.starts_with('}') && rule.ends_with('{') {
    RegexpChunkRule::chink(&rule[1..rule.len() - 1], descr)
  } else if rule.contains("}{") {
    match rule.split("}{").collect::<Vec<_>>()[..] {
      [left, right] => RegexpChunkRule::split(left, right, descr),
      _ => Err(bad_line(line, s, "more than one `}{` in split rule")),
    }
  } else if rule.contains("{}") {
    match rule.split("{}").collect::<Vec<_>>()[..] {
      [left, right] => RegexpChunkRule::merge(left, right, descr),
      _ => Err(bad_line(line, s, "more than one `{}` in merge rule")),
    }
  } else if let Some(caps) = WITH_CONTEXT.captures(rule) {
    RegexpChunkRule::chunk_with_context(&caps["left"], &caps["chunk"], &caps["right"], descr)
  } else {
    Err(bad_line(line, s, "illegal chunk pattern"))
  }
}

/// Parses grammar text into its stages, without building parsers.
pub fn parse_stages(s: &str) -> Result<Vec<StageSource>> {
  regex_static!(STAGE_LABEL, r"^(?P<label>[^\s:<>\{\}#]+)\s*:(?P<rest>.*)$");

  let mut stages: Vec<StageSource> = Vec::new();
  for (idx, raw) in s.lines().enumerate() {
    let line_no = idx + 1;
    let mut line = raw.trim();

    if let Some(caps) = STAGE_LABEL.captures(line) {
      let label = caps.name("label").map_or("", |m| m.as_str());
      debug!(label, line = line_no, "new stage");
      stages.push((label.to_string(), Vec::new()));
      line = caps.name("rest").map_or("", |m| m.as_str()).trim();
    }

    if line.is_empty() || line.starts_with('#') {
      continue;
    }

    let rule = parse_rule(line, line_no).map_err(|e| match e {
      Error::InvalidGrammarLine { reason, .. } => bad_line(line_no, raw.trim(), reason),
      e @ Error::InvalidPattern { .. } => Error::InvalidRulePattern {
        line: line_no,
        source: Box::new(e),
      },
      e => e,
    })?;

    match stages.last_mut() {
      Some((_, rules)) => rules.push(rule),
      None => {
        return Err(bad_line(
          line_no,
          raw.trim(),
          "expected a stage marker (e.g. `NP:`) before the first rule",
        ));
      }
    }
  }

  if stages.is_empty() {
    return Err(Error::EmptyGrammar);
  }
  Ok(stages)
}
