//! Conversions between chunk trees and common text formats, and a
//! tag-level accuracy measure.

use crate::chunker::ChunkParse;
use crate::error::{Error, Result};
use crate::syntree::{SynTree, Word};

/// Splits `word/TAG` on its last slash. The tag is uppercased.
fn str_to_word(s: &str, position: usize) -> Result<Word> {
  match s.rsplit_once('/') {
    Some((text, tag)) if !tag.is_empty() => Ok(Word::new(text, tag.to_uppercase())),
    _ => Err(Error::InvalidTagString {
      position,
      reason: format!("expected word/TAG, got {:?}", s),
    }),
  }
}

/// Reads bracketed, tagged text such as
/// `[ the/DT cat/NN ] sat/VBD on/IN [ the/DT mat/NN ]` into a tree, with
/// each bracketed group as a `chunk_label` chunk. Chunks may not nest.
pub fn tagstr_to_tree(s: &str, chunk_label: &str, top_label: &str) -> Result<SynTree> {
  regex_static!(WORD_OR_BRACKET, r"\[|\]|[^\[\]\s]+");

  let mut top = Vec::new();
  let mut chunk: Option<(usize, Vec<SynTree>)> = None;
  for m in WORD_OR_BRACKET.find_iter(s) {
    match m.as_str() {
      "[" => {
        if chunk.is_some() {
          return Err(Error::InvalidTagString {
            position: m.start(),
            reason: "unexpected [".to_string(),
          });
        }
        chunk = Some((m.start(), Vec::new()));
      }
      "]" => match chunk.take() {
        Some((_, children)) => top.push(SynTree::branch(chunk_label, children)),
        None => {
          return Err(Error::InvalidTagString {
            position: m.start(),
            reason: "unexpected ]".to_string(),
          });
        }
      },
      word => {
        let leaf = SynTree::Leaf(str_to_word(word, m.start())?);
        match chunk.as_mut() {
          Some((_, children)) => children.push(leaf),
          None => top.push(leaf),
        }
      }
    }
  }

  if let Some((start, _)) = chunk {
    return Err(Error::InvalidTagString {
      position: start,
      reason: "unclosed [".to_string(),
    });
  }
  Ok(SynTree::branch(top_label, top))
}

/// Reads one sentence of CoNLL-2000 style IOB lines (`word TAG B-NP`).
///
/// Chunks of types not in `chunk_types` are read as unchunked words. An
/// `I-X` line that doesn't continue an `X` chunk starts a new one.
pub fn conllstr_to_tree(s: &str, chunk_types: &[&str], top_label: &str) -> Result<SynTree> {
  regex_static!(LINE, r"^(\S+)\s+(\S+)\s+([IOB])-?(\S+)?");

  let mut top: Vec<SynTree> = Vec::new();
  let mut chunk: Option<(String, Vec<SynTree>)> = None;

  for (idx, line) in s.lines().enumerate() {
    if line.trim().is_empty() {
      continue;
    }
    let caps = LINE.captures(line).ok_or_else(|| Error::InvalidConll {
      line: idx + 1,
      reason: format!("expected `word tag IOB`, got {:?}", line),
    })?;
    let word = Word::new(&caps[1], &caps[2]);
    let chunk_type = caps.get(4).map_or("", |m| m.as_str());

    let mut state = &caps[3];
    if !chunk_types.contains(&chunk_type) {
      state = "O";
    }

    let continues = state == "I" && chunk.as_ref().is_some_and(|(label, _)| label == chunk_type);
    if !continues {
      if let Some((label, children)) = chunk.take() {
        top.push(SynTree::branch(label, children));
      }
      if state != "O" {
        chunk = Some((chunk_type.to_string(), Vec::new()));
      }
    }

    match chunk.as_mut() {
      Some((_, children)) => children.push(SynTree::Leaf(word)),
      None => top.push(SynTree::Leaf(word)),
    }
  }

  if let Some((label, children)) = chunk {
    top.push(SynTree::branch(label, children));
  }
  Ok(SynTree::branch(top_label, top))
}

/// Flattens a one-level chunk tree into `(word, tag, IOB)` triples.
pub fn tree_to_conll_tags(tree: &SynTree) -> Result<Vec<(String, String, String)>> {
  let mut tags = Vec::with_capacity(tree.leaf_count());
  for child in tree.children() {
    match child {
      SynTree::Leaf(w) => tags.push((w.text.clone(), w.tag.clone(), "O".to_string())),
      SynTree::Branch(label, contents) => {
        let mut prefix = "B-";
        for c in contents {
          let w = c.get_leaf().ok_or_else(|| Error::InvalidConll {
            line: tags.len() + 1,
            reason: "tree is too deeply nested for CoNLL format".to_string(),
          })?;
          tags.push((w.text.clone(), w.tag.clone(), format!("{}{}", prefix, label)));
          prefix = "I-";
        }
      }
    }
  }
  Ok(tags)
}

/// [`tree_to_conll_tags`], one `word tag IOB` line per word.
pub fn tree_to_conllstr(tree: &SynTree) -> Result<String> {
  Ok(
    tree_to_conll_tags(tree)?
      .into_iter()
      .map(|(w, t, iob)| format!("{} {} {}", w, t, iob))
      .collect::<Vec<_>>()
      .join("\n"),
  )
}

/// Re-chunks each gold tree's words with `chunker` and returns the fraction
/// of words whose IOB tag matches the gold one.
pub fn accuracy<'a, C, I>(chunker: &C, gold: I) -> Result<f64>
where
  C: ChunkParse + ?Sized,
  I: IntoIterator<Item = &'a SynTree>,
{
  let mut total = 0;
  let mut correct = 0;
  for gold_tree in gold {
    let test_tree = chunker.parse(&gold_tree.flatten())?;
    let gold_tags = tree_to_conll_tags(gold_tree)?;
    let test_tags = tree_to_conll_tags(&test_tree)?;
    total += gold_tags.len();
    correct += gold_tags
      .iter()
      .zip(test_tags.iter())
      .filter(|(g, t)| g == t)
      .count();
  }

  if total == 0 {
    Ok(0.0)
  } else {
    Ok(correct as f64 / total as f64)
  }
}
