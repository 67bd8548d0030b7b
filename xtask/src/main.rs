//! Build automation tasks for the exam block workspace.
//!
//! Run with: `cargo run -p xtask -- <command>`
//!
//! # Available Commands
//!
//! - `check`: Run all checks (fmt, clippy, test)
//! - `fmt`: Format code with rustfmt
//! - `lint`: Run clippy with all targets
//! - `test`: Run all tests
//! - `doc`: Build documentation
//! - `dataset`: Load a dataset, allocate every session and print a summary

// xtask is a build tool - printing is expected
#![allow(clippy::print_stderr, clippy::print_stdout)]

use std::process::Command;

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use eb_codec::ExamBlock;
use eb_core::Config;
use eb_scheduler::{BlockSummary, SessionPlanner};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Build automation for the exam block workspace
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for the exam block workspace")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks (fmt --check, clippy, test)
    Check,
    /// Format code with rustfmt
    Fmt {
        /// Check formatting without modifying files
        #[arg(long)]
        check: bool,
    },
    /// Run clippy lints
    Lint {
        /// Automatically fix lint warnings
        #[arg(long)]
        fix: bool,
    },
    /// Run all tests
    Test {
        /// Run tests with release optimizations
        #[arg(long)]
        release: bool,
    },
    /// Generate documentation
    Doc {
        /// Open in browser after building
        #[arg(long)]
        open: bool,
    },
    /// Load a dataset, allocate every session and print a summary
    Dataset {
        /// The dataset file
        path: Utf8PathBuf,
        /// JSON configuration file
        #[arg(long, env = "EB_CONFIG")]
        config: Option<Utf8PathBuf>,
        /// Print desk maps instead of the JSON summary
        #[arg(long)]
        desks: bool,
        /// Log every item read and written
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            format_code(true)?;
            lint(false)?;
            test(false)?;
        }
        Commands::Fmt { check } => format_code(check)?,
        Commands::Lint { fix } => lint(fix)?,
        Commands::Test { release } => test(release)?,
        Commands::Doc { open } => {
            let mut args = vec!["doc", "--workspace", "--no-deps"];
            if open {
                args.push("--open");
            }
            cargo(&args)?;
        }
        Commands::Dataset {
            path,
            config,
            desks,
            verbose,
        } => {
            init_tracing(verbose);
            dataset(&path, config.as_deref(), desks)?;
        }
    }

    Ok(())
}

fn format_code(check: bool) -> Result<()> {
    let mut args = vec!["fmt", "--all"];
    if check {
        args.extend(["--", "--check"]);
    }
    cargo(&args)
}

fn lint(fix: bool) -> Result<()> {
    let mut args = vec!["clippy", "--workspace", "--all-targets"];
    if fix {
        args.extend(["--fix", "--allow-dirty"]);
    }
    args.extend(["--", "-D", "warnings"]);
    cargo(&args)
}

fn test(release: bool) -> Result<()> {
    let mut args = vec!["test", "--workspace"];
    if release {
        args.push("--release");
    }
    cargo(&args)
}

fn cargo(args: &[&str]) -> Result<()> {
    let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_owned());
    eprintln!("$ cargo {}", args.join(" "));

    let status = Command::new(&cargo)
        .args(args)
        .current_dir(workspace_root())
        .status()
        .with_context(|| format!("failed to run {cargo}"))?;
    if !status.success() {
        bail!("cargo {} failed with {status}", args.join(" "));
    }
    Ok(())
}

fn workspace_root() -> &'static Utf8Path {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap_or_else(|| Utf8Path::new("."))
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "warn" })
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn dataset(path: &Utf8Path, config: Option<&Utf8Path>, desks: bool) -> Result<()> {
    let config = match config {
        Some(config) => Config::load(config).with_context(|| format!("loading {config}"))?,
        None => Config::default(),
    };
    config.validate()?;

    let mut block = ExamBlock::load(path).with_context(|| format!("loading {path}"))?;
    let (allocations, summary, maps) = block.modify("allocations", |registry| {
        let mut planner = SessionPlanner::with_config(registry, config.allocation);
        let allocations = planner.allocate_all()?;

        let mut maps = Vec::new();
        if desks {
            planner.write_allocations(&mut maps, config.layout.column_width)?;
        }
        let summary = BlockSummary::from_registry(planner.registry());
        anyhow::Ok((allocations, summary, maps))
    })?;

    for (session, allocation) in &allocations {
        if allocation.is_overflow() {
            eprintln!("warning: session {session} is over capacity, desks left as they were");
        }
    }

    if desks {
        print!("{}", String::from_utf8_lossy(&maps));
    } else {
        println!("{}", summary.to_json()?);
    }
    eprintln!("{} ({} sessions)", block.title(), allocations.len());
    Ok(())
}
