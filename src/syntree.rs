use std::fmt;

/// A token paired with its part-of-speech tag.
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Clone)]
pub struct Word {
  pub text: String,
  pub tag: String,
}

impl Word {
  pub fn new(text: impl Into<String>, tag: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      tag: tag.into(),
    }
  }
}

impl fmt::Display for Word {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.text, self.tag)
  }
}

impl<T, U> From<(T, U)> for Word
where
  T: Into<String>,
  U: Into<String>,
{
  fn from((text, tag): (T, U)) -> Self {
    Self::new(text, tag)
  }
}

/// A chunk structure: a labelled branch whose children are tagged words or
/// further (usually one-level) branches.
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Clone)]
pub enum SynTree {
  Branch(String, Vec<SynTree>),
  Leaf(Word),
}

impl SynTree {
  pub fn branch(label: impl Into<String>, children: Vec<SynTree>) -> Self {
    Self::Branch(label.into(), children)
  }

  pub fn leaf(text: impl Into<String>, tag: impl Into<String>) -> Self {
    Self::Leaf(Word::new(text, tag))
  }

  /// Builds an unchunked sentence from `(word, tag)` pairs.
  pub fn from_tagged<I, W>(label: impl Into<String>, words: I) -> Self
  where
    I: IntoIterator<Item = W>,
    W: Into<Word>,
  {
    Self::Branch(
      label.into(),
      words.into_iter().map(|w| Self::Leaf(w.into())).collect(),
    )
  }

  pub fn is_leaf(&self) -> bool {
    matches!(self, Self::Leaf(_))
  }

  pub fn is_branch(&self) -> bool {
    matches!(self, Self::Branch(_, _))
  }

  pub fn get_leaf(&self) -> Option<&Word> {
    match self {
      Self::Leaf(w) => Some(w),
      _ => None,
    }
  }

  pub fn get_branch(&self) -> Option<(&str, &[SynTree])> {
    match self {
      Self::Branch(label, cs) => Some((label, cs)),
      _ => None,
    }
  }

  pub fn into_branch(self) -> Option<(String, Vec<SynTree>)> {
    match self {
      Self::Branch(label, cs) => Some((label, cs)),
      _ => None,
    }
  }

  /// The branch label, or `None` for a leaf.
  pub fn label(&self) -> Option<&str> {
    match self {
      Self::Branch(label, _) => Some(label),
      Self::Leaf(_) => None,
    }
  }

  /// The symbol this node contributes to a chunk string: a leaf's tag or a
  /// branch's label.
  pub fn tag(&self) -> &str {
    match self {
      Self::Branch(label, _) => label,
      Self::Leaf(w) => &w.tag,
    }
  }

  /// Immediate children. Leaves have none.
  pub fn children(&self) -> &[SynTree] {
    match self {
      Self::Branch(_, cs) => cs,
      Self::Leaf(_) => &[],
    }
  }

  pub fn len(&self) -> usize {
    self.children().len()
  }

  pub fn is_empty(&self) -> bool {
    self.children().is_empty()
  }

  /// All words under this node, left to right.
  pub fn leaves(&self) -> Vec<&Word> {
    let mut out = Vec::new();
    self.collect_leaves(&mut out);
    out
  }

  fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Word>) {
    match self {
      Self::Leaf(w) => out.push(w),
      Self::Branch(_, cs) => {
        for c in cs {
          c.collect_leaves(out);
        }
      }
    }
  }

  /// The leaf count, without collecting them.
  pub fn leaf_count(&self) -> usize {
    match self {
      Self::Leaf(_) => 1,
      Self::Branch(_, cs) => cs.iter().map(Self::leaf_count).sum(),
    }
  }

  /// A copy of this tree with every intermediate branch removed, keeping the
  /// root label.
  pub fn flatten(&self) -> SynTree {
    let label = self.label().unwrap_or_default();
    Self::Branch(
      label.to_string(),
      self
        .leaves()
        .into_iter()
        .map(|w| Self::Leaf(w.clone()))
        .collect(),
    )
  }

  /// Tags of the leaves, in order.
  pub fn leaf_tags(&self) -> Vec<&str> {
    self.leaves().into_iter().map(|w| w.tag.as_str()).collect()
  }
}

impl fmt::Display for SynTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Leaf(w) => write!(f, "{}", w),
      Self::Branch(label, cs) => {
        write!(f, "({}", label)?;
        for c in cs.iter() {
          write!(f, " {}", c)?;
        }
        write!(f, ")")
      }
    }
  }
}
