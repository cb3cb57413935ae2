//! Precision / recall scoring of a chunker against reference chunkings.

use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;

use crate::error::{Error, Result};
use crate::syntree::SynTree;

/// A chunk, identified by sentence number and the number of words preceding
/// it in that sentence.
type ChunkKey = (usize, usize, SynTree);

#[derive(Debug, Clone, Default)]
struct Measures {
  tp: BTreeSet<ChunkKey>,
  fp: BTreeSet<ChunkKey>,
  fn_: BTreeSet<ChunkKey>,
}

/// Accumulates chunk-level precision, recall and F-measure over any number
/// of scored sentences.
///
/// ```
/// use rechunk::{ChunkParse, ChunkScore, Grammar};
/// use rechunk::utils::tagstr_to_tree;
///
/// let g: Grammar = "NP: {<DT>?<NN>}".parse().unwrap();
/// let gold = tagstr_to_tree("[ the/DT cat/NN ] sat/VBD", "NP", "S").unwrap();
///
/// let mut score = ChunkScore::new();
/// score.score(&gold, &g.parse(&gold.flatten()).unwrap());
/// assert_eq!(score.f_measure(0.5), 1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChunkScore {
  reference: BTreeSet<ChunkKey>,
  candidate: BTreeSet<ChunkKey>,
  chunk_label: Option<Regex>,
  count: usize,
  measures: OnceCell<Measures>,
}

impl ChunkScore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Only score chunks whose label matches `pattern` (anchored at the start
  /// of the label).
  pub fn with_chunk_label(pattern: &str) -> Result<Self> {
    let re = Regex::new(&format!("^(?:{})", pattern))
      .map_err(|e| Error::invalid_pattern(pattern, e.to_string()))?;
    Ok(Self {
      chunk_label: Some(re),
      ..Self::default()
    })
  }

  /// Scores `candidate` against `reference` as the next sentence.
  pub fn score(&mut self, reference: &SynTree, candidate: &SynTree) {
    self.record(reference, candidate, self.count);
  }

  /// Scores `candidate` against `reference` as sentence `sentence`. Chunks
  /// from different sentences never match each other.
  pub fn record(&mut self, reference: &SynTree, candidate: &SynTree, sentence: usize) {
    let reference = self.chunks(reference, sentence);
    let candidate = self.chunks(candidate, sentence);
    self.reference.extend(reference);
    self.candidate.extend(candidate);
    self.count = self.count.max(sentence + 1);
    self.measures.take();
  }

  /// Folds in a score accumulated separately, e.g. by another worker. Its
  /// sentences are numbered after this score's.
  pub fn merge(&mut self, other: ChunkScore) {
    let offset = self.count;
    let shift = |(s, p, t): ChunkKey| (s + offset, p, t);
    self.reference.extend(other.reference.into_iter().map(shift));
    self.candidate.extend(other.candidate.into_iter().map(shift));
    self.count += other.count;
    self.measures.take();
  }

  fn chunks(&self, tree: &SynTree, sentence: usize) -> Vec<ChunkKey> {
    let mut pos = 0;
    let mut out = Vec::new();
    for child in tree.children() {
      if let Some(label) = child.label() {
        if self.chunk_label.as_ref().is_none_or(|re| re.is_match(label)) {
          out.push((sentence, pos, child.clone()));
        }
      }
      pos += child.leaf_count();
    }
    out
  }

  fn measures(&self) -> &Measures {
    self.measures.get_or_init(|| Measures {
      tp: self.candidate.intersection(&self.reference).cloned().collect(),
      fp: self.candidate.difference(&self.reference).cloned().collect(),
      fn_: self.reference.difference(&self.candidate).cloned().collect(),
    })
  }

  /// Fraction of guessed chunks that are correct; 0 if nothing was guessed.
  pub fn precision(&self) -> f64 {
    let m = self.measures();
    let div = m.tp.len() + m.fp.len();
    if div == 0 {
      0.0
    } else {
      m.tp.len() as f64 / div as f64
    }
  }

  /// Fraction of reference chunks that were found; 0 if there were none.
  pub fn recall(&self) -> f64 {
    let m = self.measures();
    let div = m.tp.len() + m.fn_.len();
    if div == 0 {
      0.0
    } else {
      m.tp.len() as f64 / div as f64
    }
  }

  /// Weighted harmonic mean of precision and recall. A larger `alpha`
  /// weights precision more; `0.5` is the usual balanced F1.
  pub fn f_measure(&self, alpha: f64) -> f64 {
    let p = self.precision();
    let r = self.recall();
    if p == 0.0 || r == 0.0 {
      return 0.0;
    }
    1.0 / (alpha / p + (1.0 - alpha) / r)
  }

  /// Reference chunks the candidate missed, in sentence order.
  pub fn missed(&self) -> Vec<&SynTree> {
    self.measures().fn_.iter().map(|(_, _, t)| t).collect()
  }

  /// Candidate chunks not in the reference, in sentence order.
  pub fn incorrect(&self) -> Vec<&SynTree> {
    self.measures().fp.iter().map(|(_, _, t)| t).collect()
  }

  /// All reference chunks.
  pub fn correct(&self) -> Vec<&SynTree> {
    self.reference.iter().map(|(_, _, t)| t).collect()
  }

  /// All candidate chunks.
  pub fn guessed(&self) -> Vec<&SynTree> {
    self.candidate.iter().map(|(_, _, t)| t).collect()
  }

  /// Number of reference chunks scored so far.
  pub fn len(&self) -> usize {
    let m = self.measures();
    m.tp.len() + m.fn_.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Number of sentences scored so far.
  pub fn sentences(&self) -> usize {
    self.count
  }
}

impl fmt::Display for ChunkScore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "ChunkParse score:")?;
    writeln!(f, "    Precision: {:5.1}%", self.precision() * 100.0)?;
    writeln!(f, "    Recall:    {:5.1}%", self.recall() * 100.0)?;
    write!(f, "    F-Measure: {:5.1}%", self.f_measure(0.5) * 100.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn np(words: &[(&str, &str)]) -> SynTree {
    SynTree::branch(
      "NP",
      words.iter().map(|(w, t)| SynTree::leaf(*w, *t)).collect(),
    )
  }

  fn the_cat_sat() -> SynTree {
    SynTree::branch(
      "S",
      vec![
        np(&[("the", "DT"), ("cat", "NN")]),
        SynTree::leaf("sat", "VBD"),
      ],
    )
  }

  #[test]
  fn test_identical() {
    let mut score = ChunkScore::new();
    score.record(&the_cat_sat(), &the_cat_sat(), 0);
    assert_eq!(score.precision(), 1.0);
    assert_eq!(score.recall(), 1.0);
    assert_eq!(score.f_measure(0.5), 1.0);
    assert_eq!(score.len(), 1);
    assert!(score.missed().is_empty());
    assert!(score.incorrect().is_empty());
  }

  #[test]
  fn test_empty_candidate() {
    let mut score = ChunkScore::new();
    score.record(&the_cat_sat(), &the_cat_sat().flatten(), 0);
    assert_eq!(score.precision(), 0.0);
    assert_eq!(score.recall(), 0.0);
    assert_eq!(score.f_measure(0.5), 0.0);
    assert_eq!(score.missed(), vec![&np(&[("the", "DT"), ("cat", "NN")])]);
    assert!(score.guessed().is_empty());
  }

  #[test]
  fn test_nothing_scored() {
    let score = ChunkScore::new();
    assert_eq!(score.precision(), 0.0);
    assert_eq!(score.recall(), 0.0);
    assert!(score.is_empty());
  }

  #[test]
  fn test_position_matters() {
    // same words chunked, but at a different offset
    let reference = SynTree::branch(
      "S",
      vec![SynTree::leaf("a", "DT"), np(&[("cat", "NN")]), SynTree::leaf("cat", "NN")],
    );
    let candidate = SynTree::branch(
      "S",
      vec![SynTree::leaf("a", "DT"), SynTree::leaf("cat", "NN"), np(&[("cat", "NN")])],
    );
    let mut score = ChunkScore::new();
    score.score(&reference, &candidate);
    assert_eq!(score.precision(), 0.0);
    assert_eq!(score.missed().len(), 1);
    assert_eq!(score.incorrect().len(), 1);
  }

  #[test]
  fn test_partial_and_lazy_update() {
    let reference = SynTree::branch(
      "S",
      vec![
        np(&[("the", "DT"), ("cat", "NN")]),
        SynTree::leaf("saw", "VBD"),
        np(&[("the", "DT"), ("dog", "NN")]),
      ],
    );
    let candidate = SynTree::branch(
      "S",
      vec![
        np(&[("the", "DT"), ("cat", "NN")]),
        SynTree::leaf("saw", "VBD"),
        SynTree::leaf("the", "DT"),
        np(&[("dog", "NN")]),
      ],
    );

    let mut score = ChunkScore::new();
    score.score(&reference, &candidate);
    assert_eq!(score.precision(), 0.5);
    assert_eq!(score.recall(), 0.5);
    assert_eq!(score.f_measure(0.5), 0.5);

    // a second, perfect sentence invalidates the cached measures
    score.score(&the_cat_sat(), &the_cat_sat());
    assert_eq!(score.sentences(), 2);
    assert!((score.precision() - 2.0 / 3.0).abs() < 1e-9);
    assert!((score.recall() - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(score.correct().len(), 3);
    assert_eq!(score.guessed().len(), 3);
  }

  #[test]
  fn test_f_measure_weighting() {
    let reference = SynTree::branch(
      "S",
      vec![np(&[("a", "DT")]), np(&[("b", "NN")])],
    );
    let candidate = SynTree::branch("S", vec![np(&[("a", "DT")]), SynTree::leaf("b", "NN")]);
    let mut score = ChunkScore::new();
    score.score(&reference, &candidate);
    // precision 1, recall 0.5
    assert_eq!(score.f_measure(1.0), 1.0);
    assert_eq!(score.f_measure(0.0), 0.5);
    assert!((score.f_measure(0.5) - 2.0 / 3.0).abs() < 1e-9);
  }

  #[test]
  fn test_chunk_label_filter() {
    let reference = SynTree::branch(
      "S",
      vec![
        np(&[("cats", "NNS")]),
        SynTree::branch("VP", vec![SynTree::leaf("sleep", "VBP")]),
      ],
    );
    let candidate = reference.flatten();
    let mut score = ChunkScore::with_chunk_label("VP").unwrap();
    score.score(&reference, &candidate);
    assert_eq!(score.missed().len(), 1);
    assert_eq!(score.missed()[0].label(), Some("VP"));
    assert!(ChunkScore::with_chunk_label("(").is_err());
  }

  #[test]
  fn test_merge_keeps_sentences_apart() {
    let mut left = ChunkScore::new();
    left.score(&the_cat_sat(), &the_cat_sat());
    let mut right = ChunkScore::new();
    right.score(&the_cat_sat(), &the_cat_sat().flatten());

    left.merge(right);
    assert_eq!(left.sentences(), 2);
    assert_eq!(left.correct().len(), 2);
    assert_eq!(left.precision(), 1.0);
    assert_eq!(left.recall(), 0.5);
  }

  #[test]
  fn test_display() {
    let mut score = ChunkScore::new();
    score.score(&the_cat_sat(), &the_cat_sat());
    assert_eq!(
      score.to_string(),
      "ChunkParse score:\n    Precision: 100.0%\n    Recall:    100.0%\n    F-Measure: 100.0%"
    );
  }
}
