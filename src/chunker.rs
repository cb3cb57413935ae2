use std::fmt;

use tracing::{debug, debug_span, info};

use crate::chunkstring::{ChunkString, DebugLevel};
use crate::error::Result;
use crate::rules::RegexpChunkRule;
use crate::syntree::SynTree;

/// Something that can find non-overlapping chunks in a sentence. Unlike a
/// full parser, a chunker always produces exactly one analysis.
pub trait ChunkParse {
  /// Chunks (or further chunks) `chunk_struct`.
  fn parse(&self, chunk_struct: &SynTree) -> Result<SynTree>;
}

/// Finds chunks of a single type by running an ordered list of rules over a
/// [`ChunkString`].
///
/// Each rule runs exactly once, in order. A later rule can undo what an
/// earlier one did; nothing is retried.
#[derive(Debug, Clone)]
pub struct RegexpChunkParser {
  rules: Vec<RegexpChunkRule>,
  chunk_label: String,
  top_label: String,
  trace: u8,
  debug: DebugLevel,
}

impl RegexpChunkParser {
  pub fn new(rules: Vec<RegexpChunkRule>, chunk_label: impl Into<String>) -> Self {
    Self {
      rules,
      chunk_label: chunk_label.into(),
      top_label: "S".to_string(),
      trace: 0,
      debug: DebugLevel::default(),
    }
  }

  /// Label for the root of returned trees (default `S`).
  pub fn with_top_label(mut self, top_label: impl Into<String>) -> Self {
    self.top_label = top_label.into();
    self
  }

  /// 0 is silent, 1 traces each rule, 2 or more also names the rule kind.
  pub fn with_trace(mut self, trace: u8) -> Self {
    self.trace = trace;
    self
  }

  pub fn with_debug_level(mut self, debug: DebugLevel) -> Self {
    self.debug = debug;
    self
  }

  pub fn rules(&self) -> &[RegexpChunkRule] {
    &self.rules
  }

  pub fn chunk_label(&self) -> &str {
    &self.chunk_label
  }

  pub fn top_label(&self) -> &str {
    &self.top_label
  }

  /// Like [`ChunkParse::parse`], overriding the configured trace level.
  pub fn parse_with_trace(&self, chunk_struct: &SynTree, trace: u8) -> Result<SynTree> {
    let _span = debug_span!("chunk_stage", label = %self.chunk_label).entered();

    if chunk_struct.is_empty() {
      debug!("parsing empty text");
      return Ok(SynTree::branch(self.top_label.clone(), Vec::new()));
    }

    let mut chunkstr = ChunkString::new(chunk_struct, self.debug)?;
    if trace > 0 {
      self.trace_apply(&mut chunkstr, trace > 1)?;
    } else {
      for rule in self.rules.iter() {
        rule.apply(&mut chunkstr)?;
      }
    }

    chunkstr.into_tree(&self.chunk_label, &self.top_label)
  }

  fn trace_apply(&self, chunkstr: &mut ChunkString, verbose: bool) -> Result<()> {
    info!("# Input:\n{}", chunkstr);
    for rule in self.rules.iter() {
      rule.apply(chunkstr)?;
      if verbose {
        info!("# {} ({}):\n{}", rule.descr(), rule, chunkstr);
      } else {
        info!("# {}:\n{}", rule.descr(), chunkstr);
      }
    }
    Ok(())
  }
}

impl ChunkParse for RegexpChunkParser {
  fn parse(&self, chunk_struct: &SynTree) -> Result<SynTree> {
    self.parse_with_trace(chunk_struct, self.trace)
  }
}

impl fmt::Display for RegexpChunkParser {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "RegexpChunkParser with {} rules:", self.rules.len())?;
    let margin = self.rules.iter().map(|r| r.descr().len()).max().unwrap_or(0);
    for rule in self.rules.iter() {
      if margin < 35 {
        write!(f, "\n    {:width$}{}", rule.descr(), rule, width = margin + 3)?;
      } else {
        write!(f, "\n    {}\n      {}", rule.descr(), rule)?;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::io;
  use std::sync::{Arc, Mutex};

  use super::*;
  use crate::error::Error;

  fn np_parser() -> RegexpChunkParser {
    RegexpChunkParser::new(
      vec![
        RegexpChunkRule::chunk("<DT>?<JJ>*<NN.*>", "chunk nominals").unwrap(),
        RegexpChunkRule::chunk("<NNP>+", "chunk proper nouns").unwrap(),
      ],
      "NP",
    )
  }

  fn sentence() -> SynTree {
    SynTree::from_tagged(
      "S",
      [
        ("the", "DT"),
        ("little", "JJ"),
        ("cat", "NN"),
        ("sat", "VBD"),
        ("on", "IN"),
        ("the", "DT"),
        ("mat", "NN"),
      ],
    )
  }

  #[test]
  fn test_parse() {
    let tree = np_parser().parse(&sentence()).unwrap();
    assert_eq!(
      tree.to_string(),
      "(S (NP the/DT little/JJ cat/NN) sat/VBD on/IN (NP the/DT mat/NN))"
    );
  }

  #[test]
  fn test_empty_input() {
    let parser = np_parser().with_top_label("ROOT");
    let tree = parser.parse(&SynTree::branch("S", vec![])).unwrap();
    assert_eq!(tree, SynTree::branch("ROOT", vec![]));
  }

  #[test]
  fn test_no_rules_is_identity() {
    let parser = RegexpChunkParser::new(vec![], "NP");
    assert_eq!(parser.parse(&sentence()).unwrap(), sentence());
  }

  #[test]
  fn test_trace_does_not_change_output() {
    let parser = np_parser();
    let quiet = parser.parse_with_trace(&sentence(), 0).unwrap();
    assert_eq!(parser.parse_with_trace(&sentence(), 1).unwrap(), quiet);
    assert_eq!(parser.parse_with_trace(&sentence(), 2).unwrap(), quiet);
  }

  #[test]
  fn test_chink_on_long_sentence() {
    let tags = ["DT", "JJ", "NN", "VBD", "IN"];
    let long = SynTree::from_tagged("S", (0..2000).map(|i| ("w", tags[i % tags.len()])));
    let parser = RegexpChunkParser::new(vec![RegexpChunkRule::chink("<.*>+", "").unwrap()], "NP");
    assert_eq!(parser.parse(&long).unwrap(), long);
  }

  #[derive(Clone, Default)]
  struct Captured(Arc<Mutex<Vec<u8>>>);

  impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
      self.0.lock().unwrap().extend_from_slice(buf);
      Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
      Ok(())
    }
  }

  fn traced(parser: &RegexpChunkParser, trace: u8) -> String {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
      .with_writer(move || writer.clone())
      .with_ansi(false)
      .without_time()
      .with_max_level(tracing::Level::INFO)
      .finish();
    tracing::subscriber::with_default(subscriber, || parser.parse_with_trace(&sentence(), trace))
      .unwrap();
    let bytes = captured.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
  }

  #[test]
  fn test_trace_events() {
    let out = traced(&np_parser(), 1);
    assert_eq!(out.matches("# Input:").count(), 1);
    assert!(out.contains(" <DT>  <JJ>  <NN>  <VBD>  <IN>  <DT>  <NN> "));
    assert_eq!(out.matches("# chunk nominals:").count(), 1);
    assert_eq!(out.matches("# chunk proper nouns:").count(), 1);
    assert!(out.contains("{<DT>  <JJ>  <NN>} <VBD>  <IN> {<DT>  <NN>}"));
    assert!(!out.contains("<ChunkRule:"));

    let verbose = traced(&np_parser(), 2);
    assert!(verbose.contains(r#"# chunk proper nouns (<ChunkRule: "<NNP>+">):"#));

    assert!(traced(&np_parser(), 0).is_empty());
  }

  #[test]
  fn test_rules_run_once_in_order() {
    // the chink reopens part of the chunk and nothing re-chunks it
    let parser = RegexpChunkParser::new(
      vec![
        RegexpChunkRule::chunk("<.*>+", "").unwrap(),
        RegexpChunkRule::chink("<VBD|IN>+", "").unwrap(),
      ],
      "NP",
    );
    let tree = parser.parse(&sentence()).unwrap();
    assert_eq!(
      tree.to_string(),
      "(S (NP the/DT little/JJ cat/NN) sat/VBD on/IN (NP the/DT mat/NN))"
    );
  }

  #[test]
  fn test_bad_rule_reported_at_full_debug() {
    let parser = RegexpChunkParser::new(
      vec![RegexpChunkRule::new("<DT>", "{<DT>", "opens a chunk and never closes it").unwrap()],
      "NP",
    )
    .with_debug_level(DebugLevel::CheckFully);
    assert!(matches!(
      parser.parse(&sentence()),
      Err(Error::InvalidRewrite { .. })
    ));
  }

  #[test]
  fn test_display_lists_rules() {
    let shown = np_parser().to_string();
    assert!(shown.starts_with("RegexpChunkParser with 2 rules:"));
    assert!(shown.contains("chunk proper nouns"));
    assert!(shown.contains(r#"<ChunkRule: "<NNP>+">"#));
  }
}
