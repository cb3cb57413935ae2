#[macro_use]
extern crate lazy_static;

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: regex::Regex = regex::Regex::new($pattern).unwrap();
    }
  };
}

pub mod chunker;
pub mod chunkscore;
pub mod chunkstring;
pub mod error;
pub mod grammar;
pub mod parse_grammar;
pub mod rules;
pub mod syntree;
pub mod tag_pattern;
pub mod utils;

pub use crate::chunker::{ChunkParse, RegexpChunkParser};
pub use crate::chunkscore::ChunkScore;
pub use crate::chunkstring::{ChunkString, DebugLevel};
pub use crate::error::{Error, Result};
pub use crate::grammar::Grammar;
pub use crate::rules::{RegexpChunkRule, RuleKind};
pub use crate::syntree::{SynTree, Word};
pub use crate::tag_pattern::tag_pattern_to_regex;

#[cfg(test)]
fn tagged(words: &[(&str, &str)]) -> SynTree {
  SynTree::from_tagged("S", words.iter().copied())
}

#[test]
fn test_np_chunking_end_to_end() {
  let g: Grammar = r"
    NP: {<DT><JJ>*<NN>}
  "
  .parse()
  .unwrap();

  let sentence = tagged(&[
    ("the", "DT"),
    ("little", "JJ"),
    ("cat", "NN"),
    ("sat", "VBD"),
    ("on", "IN"),
    ("the", "DT"),
    ("mat", "NN"),
  ]);

  let tree = g.parse(&sentence).unwrap();
  assert_eq!(
    tree.to_string(),
    "(S (NP the/DT little/JJ cat/NN) sat/VBD on/IN (NP the/DT mat/NN))"
  );
}

#[test]
fn test_cascade_builds_pp_from_nps() {
  let g: Grammar = r"
    NP:
      {<DT>?<NN>}     # determiner + noun
    PP:
      {<NP><IN><NP>}  # noun phrase, preposition, noun phrase
  "
  .parse()
  .unwrap();

  let sentence = tagged(&[
    ("the", "DT"),
    ("cat", "NN"),
    ("on", "IN"),
    ("the", "DT"),
    ("mat", "NN"),
  ]);

  let tree = g.parse(&sentence).unwrap();
  assert_eq!(
    tree.to_string(),
    "(S (PP (NP the/DT cat/NN) on/IN (NP the/DT mat/NN)))"
  );
}

#[test]
fn test_cascade_order_matters() {
  // the PP stage runs first and sees no NPs, so nothing is grouped as a PP
  let g: Grammar = r"
    PP: {<NP><IN><NP>}
    NP: {<DT>?<NN>}
  "
  .parse()
  .unwrap();

  let sentence = tagged(&[("cat", "NN"), ("on", "IN"), ("mat", "NN")]);
  let tree = g.parse(&sentence).unwrap();
  assert_eq!(tree.to_string(), "(S (NP cat/NN) on/IN (NP mat/NN))");
}

#[test]
fn test_chink_merge_split_grammar() {
  let g: Grammar = r"
    NP:
      {<.*>+}          # chunk everything
      }<VB.*|IN>+{     # chink verbs and prepositions
      <NN>}{<DT>       # split before a determiner
  "
  .parse()
  .unwrap();

  let sentence = tagged(&[
    ("john", "NNP"),
    ("saw", "VBD"),
    ("the", "DT"),
    ("cat", "NN"),
    ("the", "DT"),
    ("dog", "NN"),
  ]);

  let tree = g.parse(&sentence).unwrap();
  assert_eq!(
    tree.to_string(),
    "(S (NP john/NNP) saw/VBD (NP the/DT cat/NN) (NP the/DT dog/NN))"
  );
}
