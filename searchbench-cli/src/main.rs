mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use searchbench::{
    format_duration,
    search::{search_with_params, RollingHashParams},
    Algorithm, BenchConfig, BenchmarkReport, BenchmarkRunner, CliOverrides, EncodingMode,
    FileCorpus, PreprocessingPolicy, Statistic, TextSource, TextSpec,
};
use std::{fs, num::NonZeroUsize, path::PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
    Yaml,
}

#[derive(Parser)]
struct RunArgs {
    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing the texts
    #[arg(short = 'd', long)]
    root: Option<PathBuf>,

    /// Text and its patterns as NAME:PRESENT:ABSENT (can be specified multiple times)
    #[arg(short = 't', long = "text")]
    texts: Vec<TextSpec>,

    /// Algorithms to benchmark (boyer_moore, kmp, rabin_karp)
    #[arg(short = 'a', long = "algorithm", value_delimiter = ',')]
    algorithms: Vec<Algorithm>,

    /// Timed repetitions per cell
    #[arg(short = 'n', long)]
    repetitions: Option<NonZeroUsize>,

    /// Untimed warm-up invocations per cell
    #[arg(short = 'w', long)]
    warmup: Option<usize>,

    /// Statistic summarising the samples (mean|median|min|trimmed_mean)
    #[arg(long)]
    statistic: Option<Statistic>,

    /// Build pattern tables once, outside the timed region
    #[arg(long)]
    exclude_preprocessing: bool,

    /// Wall-clock budget for the whole run (e.g. 30s, 5m)
    #[arg(long)]
    budget: Option<String>,

    /// Skip the cross-algorithm verification pass
    #[arg(long)]
    no_verify: bool,

    /// How to handle texts that are not valid UTF-8 (failfast|lossy)
    #[arg(long)]
    encoding: Option<EncodingMode>,

    /// Report format
    #[arg(short = 'f', long, value_enum, default_value = "markdown")]
    format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Show a progress bar while measuring
    #[arg(long)]
    progress: bool,

    /// Log level (overridden by RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Benchmark the algorithms over a set of texts
    Run(Box<RunArgs>),

    /// Print the offsets of every occurrence of a pattern in a file
    Search {
        /// Algorithm to search with
        #[arg(short = 'a', long, default_value = "boyer_moore")]
        algorithm: Algorithm,

        /// Pattern to search for
        #[arg(short = 'p', long)]
        pattern: String,

        /// File to search
        file: PathBuf,

        /// Only print the number of matches
        #[arg(short, long)]
        count: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run(*args),
        Commands::Search {
            algorithm,
            pattern,
            file,
            count,
        } => search_file(algorithm, &pattern, file, count),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(args: RunArgs) -> Result<()> {
    let overrides = CliOverrides {
        corpus_root: args.root,
        texts: args.texts,
        algorithms: args.algorithms,
        warmup_iterations: args.warmup,
        repetitions: args.repetitions,
        statistic: args.statistic,
        preprocessing: args
            .exclude_preprocessing
            .then_some(PreprocessingPolicy::Excluded),
        time_budget: args.budget,
        verify_equivalence: args.no_verify.then_some(false),
        encoding_mode: args.encoding,
        log_level: args.log_level,
    };

    let config = BenchConfig::load_from(args.config.as_deref())
        .context("failed to load configuration")?
        .merge_with_cli(overrides);
    init_logging(&config.log_level);
    debug!("Effective configuration: {:?}", config);

    let corpus = FileCorpus::new(&config.corpus_root, config.encoding_mode);
    let report = BenchmarkRunner::new(config)
        .with_progress(args.progress)
        .run(&corpus)?;

    let rendered = match args.format {
        OutputFormat::Markdown => report::render_markdown(&report),
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Yaml => serde_yaml::to_string(&report)?,
    };

    match args.output {
        Some(path) => {
            fs::write(&path, rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            print_summary(&report);
            println!("Report written to {}", path.display().to_string().blue());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn print_summary(report: &BenchmarkReport) {
    for column in &report.rankings.fastest_per_column {
        let title = format!("{} ({})", column.column.text_id, column.column.kind);
        match column.winner {
            Some(w) => println!(
                "{}: {} {}",
                title.blue(),
                w.algorithm.display_name().green(),
                format_duration(w.duration)
            ),
            None => println!("{}: {}", title.blue(), "no successful measurement".red()),
        }
    }

    let failed = report.grid.failed_cells();
    if failed > 0 {
        println!("{}", format!("{} cell(s) failed", failed).red());
    }
    if let Some(w) = report.rankings.fastest_overall {
        println!(
            "Overall fastest: {} ({} on average)",
            w.algorithm.display_name().green().bold(),
            format_duration(w.duration)
        );
    }
}

fn search_file(algorithm: Algorithm, pattern: &str, file: PathBuf, count: bool) -> Result<()> {
    init_logging("warn");

    let root = file
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = file
        .file_name()
        .with_context(|| format!("not a file: {}", file.display()))?
        .to_string_lossy()
        .into_owned();
    let text = FileCorpus::new(root, EncodingMode::Lossy).load(&name)?;

    debug!("Searching {} bytes of {} with {}", text.len(), name, algorithm);
    let matches = search_with_params(
        algorithm,
        text.as_bytes(),
        pattern.as_bytes(),
        RollingHashParams::default(),
    )?;

    if count {
        println!("{}", matches.len());
        return Ok(());
    }
    for offset in matches.offsets() {
        println!("{}", offset);
    }
    println!(
        "\nFound {} matches of {} in {} with {}",
        matches.len().to_string().green(),
        pattern.yellow(),
        file.display().to_string().blue(),
        algorithm.display_name()
    );
    Ok(())
}
