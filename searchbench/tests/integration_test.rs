use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use searchbench::search::{search, search_with_params, Algorithm, RollingHashParams};
use searchbench::{
    run_benchmark, BenchConfig, CellOutcome, ColumnKey, EncodingMode, FileCorpus, PatternKind,
    PreprocessingPolicy, Statistic, TextSpec,
};
use std::fs::File;
use std::io::Write;
use std::num::NonZeroUsize;
use tempfile::tempdir;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn naive(text: &[u8], pattern: &[u8]) -> Vec<usize> {
    if pattern.len() > text.len() {
        return Vec::new();
    }
    (0..=text.len() - pattern.len())
        .filter(|&i| &text[i..i + pattern.len()] == pattern)
        .collect()
}

fn random_bytes(rng: &mut StdRng, alphabet: &[u8], len: usize) -> Vec<u8> {
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
        .collect()
}

fn create_article(dir: &tempfile::TempDir, name: &str, paragraphs: usize) -> Result<()> {
    let mut file = File::create(dir.path().join(name))?;
    for i in 0..paragraphs {
        writeln!(
            file,
            "Paragraph {}: the research team compared each algorithm on a long article.",
            i
        )?;
    }
    Ok(())
}

#[test]
fn test_cross_algorithm_equivalence() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let alphabets: [&[u8]; 4] = [b"a", b"ab", b"abc", b"abcdefghijklmnopqrstuvwxyz "];

    for round in 0..2000 {
        let alphabet = alphabets[round % alphabets.len()];
        let text_len = rng.gen_range(1..120);
        let pattern_len = rng.gen_range(1..8);
        let text = random_bytes(&mut rng, alphabet, text_len);
        let pattern = random_bytes(&mut rng, alphabet, pattern_len);
        let expected = naive(&text, &pattern);

        for algorithm in Algorithm::ALL {
            let found = search(algorithm, &text, &pattern).unwrap();
            assert_eq!(
                found.offsets(),
                &expected[..],
                "{} disagrees on text {:?} pattern {:?}",
                algorithm,
                String::from_utf8_lossy(&text),
                String::from_utf8_lossy(&pattern)
            );
        }
    }
}

#[test]
fn test_every_offset_is_a_real_match() {
    let mut rng = StdRng::seed_from_u64(42);
    let text = random_bytes(&mut rng, b"acgt", 5000);
    for _ in 0..50 {
        let start = rng.gen_range(0..4990);
        let pattern = text[start..start + rng.gen_range(1..10)].to_vec();
        for algorithm in Algorithm::ALL {
            let found = search(algorithm, &text, &pattern).unwrap();
            assert!(found.offsets().contains(&start));
            for &o in found.offsets() {
                assert_eq!(&text[o..o + pattern.len()], &pattern[..]);
            }
        }
    }
}

#[test]
fn test_binary_text() {
    let text: Vec<u8> = (0..=255u8).cycle().take(2048).collect();
    let pattern = [0xFEu8, 0xFF, 0x00, 0x01];
    for algorithm in Algorithm::ALL {
        let found = search(algorithm, &text, &pattern).unwrap();
        assert_eq!(found.offsets(), &[254, 510, 766, 1022, 1278, 1534, 1790]);
    }
}

#[test]
fn test_rabin_karp_tiny_modulus_stays_correct() {
    // Modulus 101 and base 256: the textbook parameters collide constantly
    let params = RollingHashParams {
        base: 256,
        modulus: 101,
    };
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let text = random_bytes(&mut rng, b"xyz", 200);
        let pattern = random_bytes(&mut rng, b"xyz", 3);
        let found = search_with_params(Algorithm::RabinKarp, &text, &pattern, params).unwrap();
        assert_eq!(found.into_offsets(), naive(&text, &pattern));
    }
}

#[test]
fn test_full_run_on_files() -> Result<()> {
    init_tracing();
    let dir = tempdir()?;
    create_article(&dir, "article1.txt", 200)?;
    create_article(&dir, "article2.txt", 50)?;

    let config = BenchConfig {
        corpus_root: dir.path().to_path_buf(),
        warmup_iterations: 2,
        repetitions: NonZeroUsize::new(5).unwrap(),
        statistic: Statistic::Median,
        preprocessing: PreprocessingPolicy::Excluded,
        ..BenchConfig::default()
    };
    let corpus = FileCorpus::new(&config.corpus_root, EncodingMode::FailFast);
    let report = run_benchmark(&config, &corpus)?;

    assert_eq!(report.texts.len(), 2);
    assert_eq!(report.grid.columns().len(), 4);
    assert!(report.grid.is_complete());
    assert_eq!(report.grid.failed_cells(), 0);

    let present = ColumnKey::new("article1.txt", PatternKind::Present);
    for algorithm in Algorithm::ALL {
        match report.grid.get(algorithm, &present) {
            Some(CellOutcome::Measured(stats)) => assert_eq!(stats.match_count, 200),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    let absent = ColumnKey::new("article2.txt", PatternKind::Absent);
    assert!(report.rankings.winner_for(&absent).is_some());
    assert!(report.rankings.fastest_overall.is_some());
    Ok(())
}

#[test]
fn test_report_serializes() -> Result<()> {
    let dir = tempdir()?;
    create_article(&dir, "paper.txt", 10)?;

    let config = BenchConfig {
        corpus_root: dir.path().to_path_buf(),
        texts: vec![TextSpec::new("paper.txt", "research", "zebra")],
        warmup_iterations: 0,
        repetitions: NonZeroUsize::new(2).unwrap(),
        ..BenchConfig::default()
    };
    let corpus = FileCorpus::new(&config.corpus_root, EncodingMode::Lossy);
    let report = run_benchmark(&config, &corpus)?;

    let json = serde_json::to_value(&report)?;
    assert_eq!(json["settings"]["repetitions"], 2);
    assert_eq!(json["settings"]["statistic"], "mean");
    assert_eq!(json["scenarios"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["grid"]["cells"].as_array().map(Vec::len), Some(6));
    assert!(json["rankings"]["fastest_overall"]["algorithm"].is_string());
    Ok(())
}

#[test]
fn test_timeout_fails_cells_not_run() -> Result<()> {
    init_tracing();
    let dir = tempdir()?;
    create_article(&dir, "article1.txt", 5)?;
    create_article(&dir, "article2.txt", 5)?;

    let config = BenchConfig {
        corpus_root: dir.path().to_path_buf(),
        time_budget: "1ns".to_string(),
        ..BenchConfig::default()
    };
    let corpus = FileCorpus::new(&config.corpus_root, EncodingMode::Lossy);
    let report = run_benchmark(&config, &corpus)?;

    assert!(report.grid.is_complete());
    assert_eq!(report.grid.failed_cells(), 12);
    assert_eq!(report.stats.verifications_run, 0);
    assert!(report.rankings.fastest_overall.is_none());
    Ok(())
}

#[test]
fn test_missing_corpus_file() -> Result<()> {
    let dir = tempdir()?;
    create_article(&dir, "article2.txt", 5)?;
    let config = BenchConfig {
        corpus_root: dir.path().to_path_buf(),
        warmup_iterations: 0,
        repetitions: NonZeroUsize::new(2).unwrap(),
        ..BenchConfig::default()
    };
    let corpus = FileCorpus::new(&config.corpus_root, EncodingMode::Lossy);
    let report = run_benchmark(&config, &corpus)?;

    assert_eq!(report.grid.failed_cells(), 2 * Algorithm::ALL.len());
    let missing = ColumnKey::new("article1.txt", PatternKind::Present);
    match report.grid.get(Algorithm::Kmp, &missing) {
        Some(CellOutcome::Failed { error }) => assert!(error.contains("File not found")),
        other => panic!("unexpected outcome {:?}", other),
    }
    let present = ColumnKey::new("article2.txt", PatternKind::Present);
    assert!(report.rankings.winner_for(&present).is_some());
    Ok(())
}

#[test]
fn test_empty_file_fails_only_its_columns() -> Result<()> {
    init_tracing();
    let dir = tempdir()?;
    create_article(&dir, "good.txt", 20)?;
    File::create(dir.path().join("empty.txt"))?;

    let config = BenchConfig {
        corpus_root: dir.path().to_path_buf(),
        texts: vec![
            TextSpec::new("good.txt", "research", "zebra"),
            TextSpec::new("empty.txt", "research", "zebra"),
        ],
        warmup_iterations: 0,
        repetitions: NonZeroUsize::new(2).unwrap(),
        ..BenchConfig::default()
    };
    let corpus = FileCorpus::new(&config.corpus_root, EncodingMode::Lossy);
    let report = run_benchmark(&config, &corpus)?;

    assert!(report.grid.is_complete());
    assert_eq!(report.grid.failed_cells(), 2 * Algorithm::ALL.len());
    assert!(report.rankings.fastest_overall.is_some());

    let json = serde_json::to_value(&report)?;
    assert!(json["texts"][0].get("error").is_none());
    assert!(json["texts"][1]["error"]
        .as_str()
        .is_some_and(|e| e.contains("empty")));
    Ok(())
}
