use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use searchbench::search::{search, Algorithm, PatternMatcher};

const WORDS: &[&str] = &[
    "the", "research", "team", "measured", "each", "algorithm", "against", "a", "long",
    "article", "about", "string", "matching", "and", "reported", "results",
];

fn generate_article(words: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut text = String::new();
    for i in 0..words {
        text.push_str(WORDS[rng.gen_range(0..WORDS.len())]);
        text.push(if i % 12 == 11 { '\n' } else { ' ' });
    }
    text.into_bytes()
}

fn generate_dna(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| b"acgt"[rng.gen_range(0..4)]).collect()
}

fn bench_article_patterns(c: &mut Criterion) {
    let text = generate_article(50_000, 1);
    let mut group = c.benchmark_group("Article Patterns");
    group.throughput(Throughput::Bytes(text.len() as u64));

    for (label, pattern) in [("existing", "algorithm"), ("fictional", "xyz123notfound")] {
        for algorithm in Algorithm::ALL {
            group.bench_with_input(
                BenchmarkId::new(algorithm.name(), label),
                pattern.as_bytes(),
                |b, pattern| b.iter(|| black_box(search(algorithm, &text, pattern))),
            );
        }
    }
    group.finish();
}

fn bench_small_alphabet(c: &mut Criterion) {
    let text = generate_dna(200_000, 2);
    let mut group = c.benchmark_group("Small Alphabet");
    group.throughput(Throughput::Bytes(text.len() as u64));

    for len in [4usize, 16, 64] {
        let pattern = generate_dna(len, len as u64);
        for algorithm in Algorithm::ALL {
            group.bench_with_input(
                BenchmarkId::new(algorithm.name(), len),
                &pattern,
                |b, pattern| b.iter(|| black_box(search(algorithm, &text, pattern))),
            );
        }
    }
    group.finish();
}

fn bench_worst_case(c: &mut Criterion) {
    let text = vec![b'a'; 100_000];
    let mut pattern = vec![b'a'; 32];
    pattern[0] = b'b';
    let mut group = c.benchmark_group("Worst Case");

    for algorithm in Algorithm::ALL {
        group.bench_function(algorithm.name(), |b| {
            b.iter(|| black_box(search(algorithm, &text, &pattern)))
        });
    }
    group.finish();
}

fn bench_preprocessing(c: &mut Criterion) {
    let text = generate_article(2_000, 3);
    let mut group = c.benchmark_group("Preprocessing");

    for algorithm in Algorithm::ALL {
        group.bench_function(format!("{}_prepare", algorithm.name()), |b| {
            b.iter(|| black_box(PatternMatcher::new(algorithm, b"measured against")))
        });

        let Ok(matcher) = PatternMatcher::new(algorithm, b"measured against") else {
            continue;
        };
        group.bench_function(format!("{}_scan", algorithm.name()), |b| {
            b.iter(|| black_box(matcher.find_matches(&text)))
        });
    }
    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = bench_article_patterns, bench_small_alphabet,
              bench_worst_case, bench_preprocessing
}

criterion_main!(benches);
