//! Benchmarks for lexfa compilation and matching
//!
//! Matching benchmarks drive the DFA the way a copying filter does: take the
//! longest match, or copy one character when nothing matches.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lexfa::{CharSource, Config, Dfa, FailPolicy, MatchResult, Nfa, StrSource, SubmatchData, Tag};

const WORDS: &str = "the quick brown fox jumps over the lazy dog 1234 0x1F ";

fn text(repeat: usize) -> String {
    WORDS.repeat(repeat)
}

fn tokenizer() -> Dfa {
    Nfa::with_action("[a-zA-Z_][a-zA-Z_0-9]*", Arc::new(Tag::new("ident")))
        .unwrap()
        .or_regex("[0-9]+", Arc::new(Tag::new("number")))
        .unwrap()
        .or_regex("0x[0-9a-fA-F]+", Arc::new(Tag::new("hex")))
        .unwrap()
        .or_regex(" +", Arc::new(Tag::new("space")))
        .unwrap()
        .compile(FailPolicy::Copy)
        .unwrap()
}

fn run(dfa: &Dfa, input: &str, mut sd: Option<&mut SubmatchData>) -> usize {
    let mut src = StrSource::from(input);
    let mut out = String::with_capacity(input.len());
    let mut matched = 0;
    loop {
        match dfa.match_next(&mut src, &mut out, sd.as_deref_mut()).unwrap() {
            MatchResult::Matched(_) => matched += 1,
            MatchResult::NoMatch => match src.read().unwrap() {
                Some(c) => out.push(c),
                None => break,
            },
            MatchResult::Eof => break,
        }
    }
    matched
}

fn bench_compile_tokenizer(c: &mut Criterion) {
    c.bench_function("compile_tokenizer", |b| b.iter(|| black_box(tokenizer())));
}

fn bench_compile_keywords(c: &mut Criterion) {
    let keywords: Vec<String> = (0..200).map(|i| format!("keyword{}", i)).collect();
    c.bench_function("compile_200_keywords", |b| {
        b.iter(|| {
            let mut nfa = Nfa::new();
            for kw in &keywords {
                nfa = nfa
                    .or_regex(kw, Arc::new(Tag::new(kw.as_str())))
                    .unwrap();
            }
            black_box(nfa.compile(FailPolicy::Copy).unwrap())
        })
    });
}

fn bench_compile_operators(c: &mut Criterion) {
    c.bench_function("compile_not_and_skip", |b| {
        b.iter(|| {
            let nfa = Nfa::with_action("/\\*(\\*/)^\\*/", Arc::new(Tag::new("comment")))
                .unwrap()
                .complete_to_skip(Arc::new(Tag::new("skip")))
                .unwrap();
            black_box(nfa.compile(FailPolicy::Copy).unwrap())
        })
    });
}

fn bench_tokenize(c: &mut Criterion) {
    let dfa = tokenizer();
    let mut group = c.benchmark_group("tokenize");
    for repeat in [1usize, 16, 256] {
        let input = text(repeat);
        group.bench_with_input(BenchmarkId::from_parameter(repeat), &input, |b, input| {
            b.iter(|| run(&dfa, black_box(input), None))
        });
    }
    group.finish();
}

fn bench_push_back_heavy(c: &mut Criterion) {
    // every "abcabc..." run reads ahead for "abcd" and gives most of it back
    let dfa = Nfa::with_action("abcd", Arc::new(Tag::new("abcd")))
        .unwrap()
        .or_regex("a", Arc::new(Tag::new("a")))
        .unwrap()
        .compile(FailPolicy::Copy)
        .unwrap();
    let input = "abcabcabx".repeat(128);
    c.bench_function("push_back_heavy", |b| {
        b.iter(|| run(&dfa, black_box(&input), None))
    });
}

fn bench_submatches(c: &mut Criterion) {
    let dfa = Nfa::with_action("(![a-z]+)=(![0-9]+);", Arc::new(Tag::new("pair")))
        .unwrap()
        .compile(FailPolicy::Copy)
        .unwrap();
    let input = "key=123;value=4567;x=8;".repeat(64);
    let mut sd = SubmatchData::new();
    c.bench_function("submatches", |b| {
        b.iter(|| run(&dfa, black_box(&input), Some(&mut sd)))
    });
}

fn bench_table_tradeoff(c: &mut Criterion) {
    let input = text(64);
    let mut group = c.benchmark_group("memory_for_speed");
    for factor in [0.25f32, 1.0, 8.0] {
        let config = Config {
            memory_for_speed: factor,
        };
        let dfa = Nfa::from_regex_with("[a-z]+|[0-9]+|[ ]+", config)
            .unwrap()
            .add_action(Arc::new(Tag::new("token")))
            .compile(FailPolicy::Copy)
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(factor), &input, |b, input| {
            b.iter(|| run(&dfa, black_box(input), None))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_compile_tokenizer,
    bench_compile_keywords,
    bench_compile_operators,
    bench_tokenize,
    bench_push_back_heavy,
    bench_submatches,
    bench_table_tradeoff,
);
criterion_main!(benches);
