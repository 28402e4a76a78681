//! sshvanity CLI
//!
//! Ed25519 SSH vanity key generator.

mod output;

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sshvanity_core::{
    format_difficulty, format_duration, Pattern, PatternType, SearchConfig, VanitySearch,
};

use crate::output::KeyReport;

#[derive(Parser)]
#[command(name = "sshvanity")]
#[command(version)]
#[command(about = "Ed25519 SSH vanity key generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a key whose public line matches any of the patterns
    Generate {
        /// Patterns to search for (first match wins). Use /expr/ for a regex
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Pattern type. Prefix patterns must start with `ssh-ed25519 AAAA`
        #[arg(short = 't', long = "type", default_value = "contains")]
        pattern_type: PatternTypeArg,

        /// Case insensitive search
        #[arg(short = 'i', long)]
        case_insensitive: bool,

        /// Number of threads (0 = auto)
        #[arg(long, default_value = "0")]
        threads: usize,

        /// Keys per batch; a stop request lands within one batch
        #[arg(long, default_value = "1000")]
        batch_size: u32,

        /// Maximum attempts (0 = unlimited)
        #[arg(long, default_value = "0")]
        max_attempts: u64,

        /// Maximum time in seconds (0 = unlimited)
        #[arg(long, default_value = "0")]
        max_time: u64,

        /// Comment appended to the public key and stored in the private key
        #[arg(short, long, default_value = "")]
        comment: String,

        /// Directory to write the key files into
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Key file name inside the output directory
        #[arg(long, default_value = "id_ed25519")]
        name: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Measure key generation speed
    Benchmark {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,

        /// Number of threads (0 = auto)
        #[arg(long, default_value = "0")]
        threads: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PatternTypeArg {
    Contains,
    Prefix,
    Suffix,
    Regex,
}

impl From<PatternTypeArg> for PatternType {
    fn from(arg: PatternTypeArg) -> Self {
        match arg {
            PatternTypeArg::Contains => PatternType::Contains,
            PatternTypeArg::Prefix => PatternType::Prefix,
            PatternTypeArg::Suffix => PatternType::Suffix,
            PatternTypeArg::Regex => PatternType::Regex,
        }
    }
}

struct GenerateArgs {
    patterns: Vec<Pattern>,
    config: SearchConfig,
    comment: String,
    output: Option<PathBuf>,
    name: String,
    json: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            patterns,
            pattern_type,
            case_insensitive,
            threads,
            batch_size,
            max_attempts,
            max_time,
            comment,
            output,
            name,
            json,
        } => {
            let patterns = patterns
                .into_iter()
                .map(|value| {
                    let pattern = Pattern::parse(&value, pattern_type.into());
                    if case_insensitive {
                        pattern.case_insensitive()
                    } else {
                        pattern
                    }
                })
                .collect();

            cmd_generate(GenerateArgs {
                patterns,
                config: SearchConfig {
                    threads,
                    batch_size,
                    max_attempts,
                    max_time_secs: max_time,
                },
                comment,
                output,
                name,
                json,
            })?;
        }
        Commands::Benchmark { duration, threads } => {
            cmd_benchmark(duration, threads)?;
        }
    }

    Ok(())
}

fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let search = VanitySearch::new(args.patterns, args.config).context("invalid search")?;
    install_stop_handler(&search)?;

    let difficulty = search.difficulty();
    if !args.json {
        eprintln!("sshvanity v{}", env!("CARGO_PKG_VERSION"));
        for pattern in search.patterns() {
            eprintln!("Pattern:    {}", pattern);
        }
        eprintln!("Threads:    {}", search.config().thread_count());
        eprintln!("Difficulty: {}", format_difficulty(difficulty));
        eprintln!("Press Ctrl-C to stop");
        eprintln!();
    }

    let result = search.run_with_callback(|stats| {
        if !args.json {
            eprint!("\r{}", stats.format(difficulty));
            let _ = std::io::stderr().flush();
        }
    })?;
    if !args.json {
        eprintln!();
    }

    let Some(result) = result else {
        if args.json {
            println!("{{\"error\": \"No match found\"}}");
        } else {
            eprintln!("No match found (stopped or limits reached).");
        }
        return Ok(());
    };

    let report = KeyReport::new(&result, &args.comment)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print();
    }

    if let Some(dir) = &args.output {
        let (private_path, public_path) = report.save(dir, &args.name)?;
        tracing::info!(
            private = %private_path.display(),
            public = %public_path.display(),
            "keys saved"
        );
    }

    Ok(())
}

fn cmd_benchmark(duration_secs: u64, threads: usize) -> Result<()> {
    // A 20-character suffix never turns up in practice, so this runs until timeout
    let pattern = Pattern::suffix("/".repeat(20));
    let config = SearchConfig {
        threads,
        max_time_secs: duration_secs.max(1),
        ..Default::default()
    };
    let search = VanitySearch::new(vec![pattern], config)?;
    install_stop_handler(&search)?;

    eprintln!(
        "Benchmarking for {}s on {} threads...",
        duration_secs.max(1),
        search.config().thread_count()
    );

    let mut keys_per_second = 0.0;
    let mut keys_tested = 0;
    search.run_with_callback(|stats| {
        keys_per_second = stats.keys_per_second();
        keys_tested = stats.total_keys();
        eprint!("\r{:.0} keys/s, {} keys", keys_per_second, keys_tested);
        let _ = std::io::stderr().flush();
    })?;

    eprintln!();
    println!("Keys tested: {}", keys_tested);
    println!("Speed:       {:.0} keys/s", keys_per_second);
    for len in [4, 6, 8] {
        let difficulty = Pattern::suffix("A".repeat(len)).difficulty();
        println!(
            "{}-char suffix: ~{} at this speed (50%)",
            len,
            format_duration(sshvanity_core::estimate_time_50pct(difficulty, keys_per_second))
        );
    }

    Ok(())
}

fn install_stop_handler(search: &VanitySearch) -> Result<()> {
    let stop = search.stop_handle();
    ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
        .context("failed to install Ctrl-C handler")
}
