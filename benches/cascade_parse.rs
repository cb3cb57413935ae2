use criterion::{Criterion, black_box, criterion_group, criterion_main};

use rechunk::{ChunkParse, Grammar, SynTree};

const GRAMMAR_SRC: &str = include_str!("./np_pp_vp.chunk");

fn sentence(tagged: &str) -> SynTree {
  SynTree::from_tagged(
    "S",
    tagged
      .split(' ')
      .filter_map(|w| w.rsplit_once('/')),
  )
}

fn parse(g: &Grammar, input: &SynTree) -> usize {
  g.parse(input).map_or(0, |t| t.len())
}

fn criterion_benchmark(c: &mut Criterion) {
  let grammar = GRAMMAR_SRC.parse::<Grammar>().unwrap();
  let short_input = sentence("the/DT cat/NN sat/VBD on/IN the/DT mat/NN");
  let long_input = sentence(
    "Rapunzel/NNP let/VBD down/RP her/PP$ long/JJ golden/JJ hair/NN \
     from/IN the/DT high/JJ window/NN of/IN the/DT old/JJ stone/NN tower/NN \
     and/CC the/DT young/JJ prince/NN climbed/VBD up/RP to/TO her/PP$ \
     little/JJ room/NN in/IN the/DT moonlight/NN",
  );

  c.bench_function("cascade short", |b| {
    b.iter(|| parse(black_box(&grammar), black_box(&short_input)))
  });

  c.bench_function("cascade long", |b| {
    b.iter(|| parse(black_box(&grammar), black_box(&long_input)))
  });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
