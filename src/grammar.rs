use std::fmt;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::chunker::{ChunkParse, RegexpChunkParser};
use crate::chunkstring::DebugLevel;
use crate::error::{Error, Result};
use crate::parse_grammar::StageSource;
use crate::syntree::SynTree;

/// A cascade of single-type chunkers. Each stage chunks the output of the
/// one before it, so a grammar with stages NP, PP, VP can build VPs out of
/// PPs out of NPs.
#[derive(Debug, Clone)]
pub struct Grammar {
  stages: Vec<RegexpChunkParser>,
  top_label: String,
  trace: u8,
  loops: usize,
}

impl Grammar {
  /// Builds a cascade from already constructed stages.
  pub fn new(stages: Vec<RegexpChunkParser>) -> Result<Self> {
    if stages.is_empty() {
      return Err(Error::EmptyGrammar);
    }
    Ok(Self {
      stages,
      top_label: "S".to_string(),
      trace: 0,
      loops: 1,
    })
  }

  pub(crate) fn from_stages(sources: Vec<StageSource>) -> Result<Self> {
    let stages = sources
      .into_iter()
      .map(|(label, rules)| {
        debug!(label = %label, rules = rules.len(), "compiled stage");
        RegexpChunkParser::new(rules, label)
      })
      .collect();
    Self::new(stages)
  }

  /// Compiles grammar text; the same as `text.parse::<Grammar>()`.
  pub fn compile(text: &str) -> Result<Self> {
    text.parse()
  }

  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
    let text = fs::read_to_string(path)?;
    text.parse()
  }

  /// Root label of the trees every stage returns (default `S`).
  pub fn with_top_label(mut self, top_label: impl Into<String>) -> Self {
    let top_label = top_label.into();
    self.stages = self
      .stages
      .into_iter()
      .map(|s| s.with_top_label(top_label.clone()))
      .collect();
    self.top_label = top_label;
    self
  }

  pub fn with_trace(mut self, trace: u8) -> Self {
    self.trace = trace;
    self
  }

  pub fn with_debug_level(mut self, debug: DebugLevel) -> Self {
    self.stages = self
      .stages
      .into_iter()
      .map(|s| s.with_debug_level(debug))
      .collect();
    self
  }

  /// How many times the whole cascade is run (default 1). Rules within a
  /// stage still run once per pass.
  pub fn with_loops(mut self, loops: usize) -> Self {
    self.loops = loops;
    self
  }

  pub fn stages(&self) -> &[RegexpChunkParser] {
    &self.stages
  }

  pub fn top_label(&self) -> &str {
    &self.top_label
  }

  /// Feeds `chunk_struct` through every stage in order and returns the last
  /// stage's tree.
  pub fn run(&self, chunk_struct: &SynTree) -> Result<SynTree> {
    self.parse_with_trace(chunk_struct, self.trace)
  }

  pub fn parse_with_trace(&self, chunk_struct: &SynTree, trace: u8) -> Result<SynTree> {
    let mut tree = chunk_struct.clone();
    for _ in 0..self.loops {
      for stage in self.stages.iter() {
        tree = stage.parse_with_trace(&tree, trace)?;
      }
    }
    Ok(tree)
  }
}

impl ChunkParse for Grammar {
  fn parse(&self, chunk_struct: &SynTree) -> Result<SynTree> {
    self.run(chunk_struct)
  }
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Grammar with {} stages:", self.stages.len())?;
    for stage in self.stages.iter() {
      write!(f, "\n{}: {}", stage.chunk_label(), stage)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::rules::RegexpChunkRule;

  const CASCADE: &str = r"
    NP: {<DT|JJ|NN.*>+}          # chunk sequences of DT, JJ, NN
    PP: {<IN><NP>}               # chunk prepositions followed by NP
    VP: {<VB.*><NP|PP|CLAUSE>+$} # chunk verbs and their arguments
    CLAUSE: {<NP><VP>}           # chunk NP, VP
  ";

  fn mary_saw_the_cat() -> SynTree {
    SynTree::from_tagged(
      "S",
      [
        ("Mary", "NN"),
        ("saw", "VBD"),
        ("the", "DT"),
        ("cat", "NN"),
        ("sit", "VB"),
        ("on", "IN"),
        ("the", "DT"),
        ("mat", "NN"),
      ],
    )
  }

  #[test]
  fn test_cascade() {
    let g: Grammar = CASCADE.parse().unwrap();
    assert_eq!(g.stages().len(), 4);

    let tree = g.run(&mary_saw_the_cat()).unwrap();
    assert_eq!(
      tree.to_string(),
      "(S (NP Mary/NN) saw/VBD (CLAUSE (NP the/DT cat/NN) (VP sit/VB (PP on/IN (NP the/DT mat/NN)))))"
    );
  }

  #[test]
  fn test_loops_rerun_the_cascade() {
    let g: Grammar = CASCADE.parse::<Grammar>().unwrap().with_loops(2);
    let tree = g.run(&mary_saw_the_cat()).unwrap();
    assert_eq!(
      tree.to_string(),
      "(S (CLAUSE (NP Mary/NN) (VP saw/VBD (CLAUSE (NP the/DT cat/NN) (VP sit/VB (PP on/IN (NP the/DT mat/NN)))))))"
    );
  }

  #[test]
  fn test_top_label() {
    let g = Grammar::compile("NP: {<NN>}").unwrap().with_top_label("ROOT");
    let tree = g.run(&SynTree::from_tagged("S", [("cats", "NN")])).unwrap();
    assert_eq!(tree.to_string(), "(ROOT (NP cats/NN))");
    assert_eq!(g.stages()[0].top_label(), "ROOT");
  }

  #[test]
  fn test_empty_sentence() {
    let g: Grammar = CASCADE.parse().unwrap();
    let tree = g.run(&SynTree::branch("S", vec![])).unwrap();
    assert_eq!(tree, SynTree::branch("S", vec![]));
  }

  #[test]
  fn test_new_rejects_no_stages() {
    assert!(matches!(Grammar::new(vec![]), Err(Error::EmptyGrammar)));
    let stage = RegexpChunkParser::new(vec![RegexpChunkRule::chunk("<NN>", "").unwrap()], "NP");
    assert!(Grammar::new(vec![stage]).is_ok());
  }

  #[test]
  fn test_read_from_missing_file() {
    assert!(matches!(
      Grammar::read_from_file("/nonexistent/grammar.chunk"),
      Err(Error::Io(_))
    ));
  }

  #[test]
  fn test_display() {
    let g: Grammar = CASCADE.parse().unwrap();
    let shown = g.to_string();
    assert!(shown.starts_with("Grammar with 4 stages:"));
    assert!(shown.contains("\nPP: RegexpChunkParser with 1 rules:"));
  }
}
