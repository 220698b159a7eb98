//! CLI front end (C9): `solve`, `candidates`, `check`, `prune`.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};

use anacryptogram::admin;
use anacryptogram::config::{self, CliOverrides, FileConfig};
use anacryptogram::node::Status;
use anacryptogram::oracle::{LengthPenaltyOracle, Oracle};
use anacryptogram::puzzle::PuzzleConfig;
use anacryptogram::scoring::FrequencyOracle;
use anacryptogram::search::{self, SearchConfig};
use anacryptogram::store::Store;
use anacryptogram_vocab::{Token, Vocabulary};

/// Persistent, guided tree search for anacryptogram-style letter-bank puzzles.
#[derive(Parser, Debug)]
#[command(name = "anacryptogram", version, about)]
struct Cli {
    /// Built-in puzzle profile to use.
    #[arg(long, global = true, default_value = "c1663")]
    profile: String,

    /// Path to a TOML config file layered beneath environment variables and flags.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the newline-delimited vocabulary word list.
    #[arg(long, global = true)]
    vocabulary: Option<PathBuf>,

    /// Path to the persistent store file.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Directory holding the reference oracle's `lemma_counts.csv` and `transitions.csv`. When
    /// absent, a length-penalty stub oracle is used instead.
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the search loop until a solution is found or the budget is exhausted.
    Solve {
        /// Softmax selection temperature.
        #[arg(long)]
        temperature: Option<f64>,
        /// PRNG seed.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Maximum number of roll-outs to perform.
        #[arg(long, default_value_t = 10_000)]
        max_iterations: u64,
    },
    /// Show child demographics and top candidates/descendants for a stored prefix.
    Candidates {
        /// The canonical sentence prefix to inspect.
        prefix: String,
        /// How many top children/descendants to show.
        #[arg(long, default_value_t = 10)]
        top_k: usize,
        /// Delete every strict descendant of `prefix`.
        #[arg(long, default_value_t = false)]
        trim: bool,
        /// Override `prefix`'s own status (e.g. `7` to manually exclude it).
        #[arg(long)]
        status: Option<i64>,
    },
    /// Trace a sentence's prefixes against the puzzle's constraints.
    Check {
        /// The sentence to check.
        sentence: String,
        /// Only report the full sentence, not every prefix.
        #[arg(long, default_value_t = false)]
        candidate_only: bool,
        /// Emit a JSON array of tuples instead of a human-readable table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Trim every stored sentence at the first occurrence of each given word.
    Prune {
        /// Words to prune on.
        words: Vec<String>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{e:#}");
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let puzzle = PuzzleConfig::by_name(&cli.profile)
        .with_context(|| format!("unknown puzzle profile `{}`", cli.profile))?;

    let file_config = FileConfig::load(cli.config.as_deref())
        .context("loading config file")?;
    let overrides = CliOverrides {
        vocabulary_path: cli.vocabulary.clone(),
        store_path: cli.store.clone(),
        model_path: cli.model.clone(),
        temperature: None,
    };
    let resolved = config::resolve(file_config, overrides).context("resolving configuration")?;

    let vocabulary = load_vocabulary(&resolved.vocabulary_path, &puzzle)
        .with_context(|| format!("loading vocabulary from {:?}", resolved.vocabulary_path))?;
    info!("loaded vocabulary ({} tokens)", vocabulary.len());

    match cli.command {
        Command::Solve {
            temperature,
            seed,
            max_iterations,
        } => {
            let oracle = load_oracle(resolved.model_path.as_deref())?;
            let mut store = Store::open(&resolved.store_path)
                .with_context(|| format!("opening store at {:?}", resolved.store_path))?;
            let search_config = SearchConfig {
                temperature: temperature.unwrap_or(resolved.temperature),
                max_iterations,
            };
            let report = search::run(
                &mut store,
                &puzzle,
                &vocabulary,
                oracle.as_ref(),
                search_config,
                seed,
            )?;
            if let Some(solution) = report.solutions.first() {
                println!("{solution}");
                Ok(0)
            } else {
                println!(
                    "search exhausted after {} iteration(s) without a solution",
                    report.iterations
                );
                Ok(2)
            }
        }
        Command::Candidates {
            prefix,
            top_k,
            trim,
            status,
        } => {
            let mut store = Store::open(&resolved.store_path)
                .with_context(|| format!("opening store at {:?}", resolved.store_path))?;
            let status_override = status.map(Status::from_code).transpose()?;
            let report = admin::candidates(
                &mut store,
                &puzzle,
                &vocabulary,
                &prefix,
                top_k,
                trim,
                status_override,
            )?;
            print_candidates(&report);
            Ok(0)
        }
        Command::Check {
            sentence,
            candidate_only,
            json,
        } => {
            let oracle = load_oracle(resolved.model_path.as_deref())?;
            let rows = admin::check(&puzzle, &vocabulary, oracle.as_ref(), &sentence, candidate_only)?;
            if json {
                let tuples: Vec<_> = rows
                    .iter()
                    .map(|r| {
                        serde_json::json!([
                            r.sentence,
                            r.flags.c1_contains,
                            r.flags.c2_vowel_floor,
                            r.flags.c3_longest_word_feasible,
                            r.flags.c4_anchors_and_punctuation,
                            r.score,
                            r.status,
                        ])
                    })
                    .collect();
                println!("{}", serde_json::to_string(&tuples)?);
            } else {
                for row in &rows {
                    println!("{}\t{}\t{}", row.status, row.score, row.sentence);
                }
            }
            Ok(0)
        }
        Command::Prune { words } => {
            let mut store = Store::open(&resolved.store_path)
                .with_context(|| format!("opening store at {:?}", resolved.store_path))?;
            let trimmed = admin::prune(&mut store, &words)?;
            println!("trimmed {trimmed} node(s)");
            Ok(0)
        }
    }
}

fn print_candidates(report: &admin::CandidatesReport) {
    let mut statuses: Vec<_> = report.demographics.iter().collect();
    statuses.sort_by(|a, b| a.0.cmp(b.0));
    for (status, count) in statuses {
        println!("status {status}: {count}");
    }
    println!("-- top children --");
    for child in &report.top_children {
        println!("{}\t{}", child.score, child.sentence);
    }
    println!("-- top descendants --");
    for descendant in &report.top_descendants {
        println!("{}\t{}", descendant.mean_descendant_score, descendant.sentence);
    }
}

fn load_vocabulary(path: &std::path::Path, puzzle: &PuzzleConfig) -> Result<Vocabulary> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading vocabulary file {path:?}"))?;
    let words = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let punctuation = puzzle
        .required_punctuation
        .iter()
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .map(|c| c.to_string());

    let tokens = words
        .map(String::from)
        .chain(punctuation)
        .filter_map(Token::new);
    Ok(Vocabulary::from_tokens(tokens)?)
}

fn load_oracle(model_path: Option<&std::path::Path>) -> Result<Box<dyn Oracle>> {
    match model_path {
        Some(dir) => {
            let lemma_counts = dir.join("lemma_counts.csv");
            let transitions = dir.join("transitions.csv");
            let oracle = FrequencyOracle::new(&lemma_counts, &transitions)
                .with_context(|| format!("loading reference oracle model from {dir:?}"))?;
            Ok(Box::new(oracle))
        }
        None => Ok(Box::new(LengthPenaltyOracle)),
    }
}

