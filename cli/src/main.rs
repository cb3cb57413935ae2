use std::env;
use std::io;
use std::io::{BufRead, Write};
use std::process;

use tracing_subscriber::EnvFilter;

use rechunk::utils::tagstr_to_tree;
use rechunk::{ChunkScore, Grammar};

const MAX_LISTED: usize = 10;

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} GRAMMAR_FILE [options]

Reads one sentence per line from stdin, as `word/TAG word/TAG ...`,
and prints its chunk tree.

Options:
  -h, --help     Print this message
  -t, --trace    Log each rule's effect on the chunk string
  -v, --verbose  Like --trace, and also name each rule
  -e, --eval     Read bracketed gold sentences (`[ the/DT cat/NN ] sat/VBD`)
                 and print precision and recall at end of input",
    prog_name
  )
}

struct Args {
  filename: String,
  trace: u8,
  eval: bool,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    let mut iter = v.into_iter();
    let prog_name = match iter.next() {
      Some(p) => p,
      None => {
        return Err(Self::make_error_message(
          "bad argument vector",
          "rechunk-cli",
        ));
      }
    };

    let mut filename: Option<String> = None;
    let mut trace: u8 = 0;
    let mut eval = false;

    for o in iter {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-t" || o == "--trace" {
        trace = trace.max(1);
      } else if o == "-v" || o == "--verbose" {
        trace = 2;
      } else if o == "-e" || o == "--eval" {
        eval = true;
      } else if filename.is_none() && !o.starts_with('-') {
        filename = Some(o);
      } else {
        return Err(Self::make_error_message("invalid arguments", prog_name));
      }
    }

    match filename {
      Some(filename) => Ok(Self {
        filename,
        trace,
        eval,
      }),
      None => Err(Self::make_error_message("missing filename", prog_name)),
    }
  }
}

fn chunk_line(g: &Grammar, line: &str, label: &str, trace: u8) -> rechunk::Result<()> {
  let sentence = tagstr_to_tree(line, label, g.top_label())?;
  let tree = g.parse_with_trace(&sentence, trace)?;
  println!("{}", tree);
  Ok(())
}

fn score_line(
  g: &Grammar,
  line: &str,
  label: &str,
  trace: u8,
  score: &mut ChunkScore,
) -> rechunk::Result<()> {
  let gold = tagstr_to_tree(line, label, g.top_label())?;
  let guess = g.parse_with_trace(&gold.flatten(), trace)?;
  score.score(&gold, &guess);
  Ok(())
}

/// Scores every gold sentence in `input`. A line that can't be read or
/// chunked is reported with its line number and left out of the score.
fn eval(g: &Grammar, input: impl BufRead, label: &str, trace: u8) -> rechunk::Result<ChunkScore> {
  let mut score = ChunkScore::new();
  for (idx, line) in input.lines().enumerate() {
    let line = line?;
    let line = line.trim();
    if line.is_empty() {
      continue;
    }
    if let Err(e) = score_line(g, line, label, trace, &mut score) {
      eprintln!("line {}: error: {}", idx + 1, e);
    }
  }
  Ok(score)
}

fn print_chunks(heading: &str, chunks: &[&rechunk::SynTree]) {
  if chunks.is_empty() {
    return;
  }
  println!("\n{} ({} total):", heading, chunks.len());
  for c in chunks.iter().take(MAX_LISTED) {
    println!("  {}", c);
  }
  if chunks.len() > MAX_LISTED {
    println!("  ...");
  }
}

fn main() -> rechunk::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let g = Grammar::read_from_file(&opts.filename)?;
  // bracketed input is read as chunks of the final stage's type
  let gold_label = g
    .stages()
    .last()
    .map_or("NP", |s| s.chunk_label())
    .to_string();

  let stdin = io::stdin();
  if opts.eval {
    let score = eval(&g, stdin.lock(), &gold_label, opts.trace)?;
    println!("{}", score);
    print_chunks("Missed", &score.missed());
    print_chunks("Incorrect", &score.incorrect());
    return Ok(());
  }

  let mut input = String::new();
  loop {
    print!("> ");
    io::stdout().flush()?;

    input.clear();
    if stdin.lock().read_line(&mut input)? == 0 {
      // ctrl+d
      return Ok(());
    }
    let line = input.trim();
    if line.is_empty() {
      continue;
    }

    if let Err(e) = chunk_line(&g, line, &gold_label, opts.trace) {
      eprintln!("error: {}", e);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_eval_skips_bad_lines() {
    let g: Grammar = "NP: {<DT>?<NN>}".parse().unwrap();
    let input = "[ the/DT cat/NN ] sat/VBD\n\n[ the/DT [ dog/NN ] ]\nno-tag\n[ a/DT mat/NN ]\n";
    let score = eval(&g, input.as_bytes(), "NP", 0).unwrap();
    assert_eq!(score.sentences(), 2);
    assert_eq!(score.len(), 2);
    assert_eq!(score.precision(), 1.0);
    assert_eq!(score.recall(), 1.0);
  }

  #[test]
  fn test_args() {
    let args = |v: &[&str]| Args::parse(v.iter().map(|s| s.to_string()).collect());
    let opts = args(&["rechunk-cli", "np.chunk", "-v", "--eval"]).unwrap();
    assert_eq!(opts.filename, "np.chunk");
    assert_eq!(opts.trace, 2);
    assert!(opts.eval);
    assert!(args(&["rechunk-cli"]).is_err());
    assert!(args(&["rechunk-cli", "a", "b"]).is_err());
  }
}
