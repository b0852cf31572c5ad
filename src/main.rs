//! trackit CLI

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use trackit::diff::{diff, diff_lines, Diff, DiffKind, Granularity};
use trackit::log::{parse_date, LogOptions};
use trackit::{Commit, Error, Repository};

/// trackit - snapshot history for a single file
#[derive(Parser)]
#[command(name = "trackit")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking a file in the current directory
    Init {
        /// The file to track, relative to the current directory
        file: String,
    },
    /// Record the current contents of the tracked file
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },
    /// Show the commit history, newest first
    Log {
        /// Limit the number of commits shown
        #[arg(short = 'n', long = "max-count")]
        max_count: Option<usize>,
        /// One line per commit
        #[arg(long)]
        oneline: bool,
        /// Only commits at or after this date (YYYY-MM-DD or Unix time)
        #[arg(long)]
        since: Option<String>,
        /// Only commits at or before this date (YYYY-MM-DD or Unix time)
        #[arg(long)]
        until: Option<String>,
    },
    /// Compare the tracked file with the latest commit
    Status,
    /// Restore the tracked file to a past commit
    Revert {
        /// Commit digest or unique prefix (at least 4 characters)
        commit: String,
    },
    /// Show differences between two files or commits
    ///
    /// Each side is read from a file if one exists at that path, and is
    /// otherwise resolved as a commit digest or prefix.
    Diff {
        /// Old side
        a: String,
        /// New side
        b: String,
        /// Compare whole lines instead of characters
        #[arg(long)]
        lines: bool,
    },
    /// Re-hash every commit and snapshot in the history
    Verify,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Human-readable events to stderr, filtered by `RUST_LOG` or `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Maps an error to a process exit code by its kind.
fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<Error>() {
        Some(Error::AlreadyInitialized(_)) => 3,
        Some(Error::NotInitialized(_)) => 4,
        Some(Error::SourceUnreadable { .. }) => 5,
        Some(Error::Storage(_)) => 6,
        Some(
            Error::ObjectNotFound(_)
            | Error::CommitNotFound(_)
            | Error::InvalidDigest(_)
            | Error::AmbiguousDigest(_),
        ) => 7,
        Some(
            Error::BrokenHistory { .. } | Error::InvalidObject { .. } | Error::CorruptObject { .. },
        ) => 8,
        Some(Error::InvalidRef { .. } | Error::RefConflict { .. } | Error::RefLocked(_)) => 9,
        Some(Error::InvalidConfig(_) | Error::InvalidUtf8) => 10,
        None => 1,
    }
}

fn run(cli: Cli) -> Result<()> {
    let dir = cli.dir.unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        Commands::Init { file } => cmd_init(&dir, &file),
        Commands::Commit { message } => cmd_commit(&dir, &message),
        Commands::Log {
            max_count,
            oneline,
            since,
            until,
        } => {
            let mut options = LogOptions::new();
            if let Some(n) = max_count {
                options = options.max_count(n);
            }
            if let Some(since) = since {
                options = options.since_timestamp(date_arg(&since)?);
            }
            if let Some(until) = until {
                options = options.until_timestamp(date_arg(&until)?);
            }
            cmd_log(&dir, options, oneline)
        }
        Commands::Status => cmd_status(&dir),
        Commands::Revert { commit } => cmd_revert(&dir, &commit),
        Commands::Diff { a, b, lines } => cmd_diff(&dir, &a, &b, lines),
        Commands::Verify => cmd_verify(&dir),
    }
}

fn date_arg(value: &str) -> Result<i64> {
    match parse_date(value) {
        Some(ts) => Ok(ts),
        None => bail!("unrecognised date '{}' (expected YYYY-MM-DD or Unix time)", value),
    }
}

fn cmd_init(dir: &Path, file: &str) -> Result<()> {
    let repo = Repository::init(dir, file)?;
    println!(
        "Initialized empty trackit repository in {}",
        repo.backend().root().display()
    );
    println!("Tracking {}", repo.tracked_name());
    Ok(())
}

fn cmd_commit(dir: &Path, message: &str) -> Result<()> {
    let repo = Repository::discover(dir)?;
    let digest = repo.commit(message)?;
    let commit = repo.find_commit(&digest)?;

    let label = if commit.is_root() { " (root-commit)" } else { "" };
    println!("[{}{}] {}", digest.short(), label, commit.summary());
    Ok(())
}

fn cmd_log(dir: &Path, options: LogOptions, oneline: bool) -> Result<()> {
    let repo = Repository::discover(dir)?;
    let mut out = io::stdout().lock();

    for (i, commit) in repo.log_with_options(options)?.enumerate() {
        let commit = commit?;
        if oneline {
            writeln!(out, "{} {}", commit.digest().short(), commit.summary())?;
        } else {
            if i > 0 {
                writeln!(out)?;
            }
            write_commit(&mut out, &commit)?;
        }
    }

    Ok(())
}

fn write_commit(out: &mut impl Write, commit: &Commit) -> io::Result<()> {
    writeln!(out, "commit {}", commit.digest())?;
    if let Some(parent) = commit.parent() {
        writeln!(out, "Parent: {}", parent.short())?;
    }
    writeln!(out, "Date:   {}", format_time(commit.time(), commit.timestamp()))?;
    writeln!(out)?;
    for line in commit.message().lines() {
        writeln!(out, "    {}", line)?;
    }
    Ok(())
}

fn format_time(time: Option<DateTime<Utc>>, timestamp: i64) -> String {
    match time {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("@{}", timestamp),
    }
}

fn cmd_status(dir: &Path) -> Result<()> {
    let repo = Repository::discover(dir)?;
    let status = repo.status()?;

    match repo.resolve()? {
        Some(tip) => println!("{}: {} (at {})", repo.tracked_name(), status, tip.short()),
        None => println!("{}: {} (no commits yet)", repo.tracked_name(), status),
    }
    Ok(())
}

fn cmd_revert(dir: &Path, target: &str) -> Result<()> {
    let repo = Repository::discover(dir)?;
    let digest = repo.resolve_commit(target)?;
    let content = repo.revert(&digest)?;

    println!(
        "Restored {} to {} ({} bytes)",
        repo.tracked_name(),
        digest.short(),
        content.len()
    );
    Ok(())
}

fn cmd_diff(dir: &Path, a: &str, b: &str, lines: bool) -> Result<()> {
    let old = load_side(dir, a)?;
    let new = load_side(dir, b)?;

    let result = if lines {
        diff_lines(&old, &new)
    } else {
        diff(&old, &new)
    };

    let mut out = io::stdout().lock();
    write_diff(&mut out, &result)?;

    let stats = result.stats();
    let unit = match result.granularity() {
        Granularity::Char => "characters",
        Granularity::Byte => "bytes",
        Granularity::Line => "lines",
    };
    writeln!(
        out,
        "{} {} inserted(+), {} deleted(-)",
        stats.inserted, unit, stats.deleted
    )?;
    Ok(())
}

fn write_diff(out: &mut impl Write, result: &Diff) -> io::Result<()> {
    if result.granularity() != Granularity::Line {
        let rendered = result.to_string();
        write!(out, "{}", rendered)?;
        if !rendered.ends_with('\n') {
            writeln!(out)?;
        }
        return Ok(());
    }

    for op in result.ops() {
        let text = op.text();
        for line in text.split_inclusive('\n') {
            write!(out, "{}{}", op.kind().as_char(), line)?;
            if !line.ends_with('\n') {
                writeln!(out)?;
                if op.kind() != DiffKind::Equal {
                    writeln!(out, "\\ No newline at end of file")?;
                }
            }
        }
    }
    Ok(())
}

fn cmd_verify(dir: &Path) -> Result<()> {
    let repo = Repository::discover(dir)?;
    let count = repo.verify()?;

    let noun = if count == 1 { "commit" } else { "commits" };
    println!("verified {} {}", count, noun);
    Ok(())
}

/// Reads one side of a diff from a file, or from a commit's snapshot.
fn load_side(dir: &Path, spec: &str) -> Result<Vec<u8>> {
    let path = dir.join(spec);
    if path.is_file() {
        return std::fs::read(&path).with_context(|| format!("reading {}", path.display()));
    }

    let repo = Repository::discover(dir)
        .with_context(|| format!("'{}' is not a file, and no repository was found", spec))?;
    let digest = repo.resolve_commit(spec)?;
    Ok(repo.snapshot(&digest)?)
}
