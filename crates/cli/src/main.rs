//! CLI for nestkit.
//!
//! Deep lookup over JSON documents, expiring session records, email checks,
//! and waiting for a path to appear.

mod sink;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use nestkit_core::{deep_get, deep_get_or_else, Lookup, NestkitError};
use nestkit_web::{validate, FileStore, PollConfig, SessionStore};
use serde_json::Value;
use sink::{JsonStreamSink, ResolutionRow};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "nestkit", version, about = "Fail-soft deep lookup and small web utilities")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve one dotted path in a JSON document.
    Get {
        /// Dotted path, e.g. `a.b.c`. Omitted or empty prints `undefined`.
        path: Option<String>,

        /// JSON document to read; `-` reads stdin.
        #[arg(short, long, default_value = "-")]
        file: String,

        /// JSON fallback printed when the path is missing.
        #[arg(long = "or")]
        fallback: Option<String>,
    },

    /// Resolve many paths and emit one NDJSON row each.
    Batch {
        #[arg(short, long, default_value = "-")]
        file: String,

        /// "ndjson" writes to stdout, "ndjson:/path/to/file" writes to file.
        #[arg(long, default_value = "ndjson")]
        sink: String,

        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Check addresses against the email pattern.
    Email {
        #[arg(required = true)]
        addresses: Vec<String>,
    },

    /// Read and write expiring session records in a file store.
    Session {
        #[arg(long, env = "NESTKIT_STORE", default_value = ".nestkit-session.json")]
        store: PathBuf,

        #[command(subcommand)]
        action: SessionAction,
    },

    /// Wait for a filesystem path to exist.
    Wait {
        path: PathBuf,

        #[arg(long, env = "NESTKIT_POLL_INTERVAL_MS", default_value_t = 100)]
        interval_ms: u64,

        #[arg(long, env = "NESTKIT_POLL_MAX_ATTEMPTS", default_value_t = 50)]
        max_attempts: u32,
    },
}

#[derive(Subcommand, Debug)]
enum SessionAction {
    Set {
        key: String,

        /// JSON value; bare words are stored as strings.
        value: String,

        /// Expire the record this many seconds from now.
        #[arg(long)]
        ttl_secs: Option<i64>,
    },
    Get {
        key: String,
    },
    Remove {
        key: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Get {
            path,
            file,
            fallback,
        } => {
            let doc = read_document(&file)?;
            let fallback = fallback.as_deref().map(parse_loose);

            let resolved = match &fallback {
                Some(fb) => deep_get_or_else(&doc, path.as_deref(), fb).map(Lookup::Found),
                None => deep_get(&doc, path.as_deref()),
            };

            match resolved {
                None => println!("undefined"),
                Some(Lookup::Found(value)) => println!("{}", serde_json::to_string_pretty(value)?),
                Some(Lookup::Nothing) => {
                    tracing::warn!(path = path.as_deref().unwrap_or_default(), "nothing at path");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }

        Commands::Batch { file, sink, paths } => {
            let doc = read_document(&file)?;
            let rows: Vec<ResolutionRow<'_>> = paths
                .iter()
                .map(|p| ResolutionRow::resolve(&doc, p))
                .collect();
            let found = rows.iter().filter(|r| r.found).count();

            if sink == "ndjson" {
                let mut s = JsonStreamSink::stdout();
                s.write_rows(&rows)?;
                let n = s.finish()?;
                tracing::info!(rows = n, found, "ndjson sink: wrote to stdout");
            } else if let Some(out) = sink.strip_prefix("ndjson:") {
                let mut s = JsonStreamSink::new(std::fs::File::create(out)?);
                s.write_rows(&rows)?;
                let n = s.finish()?;
                tracing::info!(rows = n, found, path = out, "ndjson sink: wrote to file");
            } else {
                eprintln!("Unknown sink: {}. Use 'ndjson' or 'ndjson:/path'", sink);
                return Ok(ExitCode::from(2));
            }
        }

        Commands::Email { addresses } => {
            let mut all_valid = true;
            for addr in &addresses {
                let valid = validate::is_email(addr);
                all_valid &= valid;
                println!("{addr}\t{}", if valid { "valid" } else { "invalid" });
            }
            if !all_valid {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Session { store, action } => {
            let mut session = SessionStore::new(FileStore::open(&store)?);
            match action {
                SessionAction::Set {
                    key,
                    value,
                    ttl_secs,
                } => {
                    let expires_at = ttl_secs
                        .map(|secs| expiry_from_ttl(Utc::now(), secs))
                        .transpose()?;
                    session.set(&key, &parse_loose(&value), expires_at)?;
                    tracing::info!(key, store = %store.display(), "session record stored");
                }
                SessionAction::Get { key } => match session.get(&key)? {
                    Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                    None => {
                        tracing::warn!(key, "no session record");
                        return Ok(ExitCode::FAILURE);
                    }
                },
                SessionAction::Remove { key } => session.remove(&key)?,
            }
        }

        Commands::Wait {
            path,
            interval_ms,
            max_attempts,
        } => {
            let config = PollConfig::new(Duration::from_millis(interval_ms), max_attempts);
            tracing::info!(path = %path.display(), interval_ms, max_attempts, "waiting");

            let found = nestkit_web::wait_for(|| path.exists().then_some(()), &config).await;
            if found.is_none() {
                tracing::warn!(path = %path.display(), "gave up waiting");
                return Ok(ExitCode::FAILURE);
            }
            println!("{}", path.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn read_document(source: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(source)?
    };
    Ok(serde_json::from_str(&text)?)
}

/// `now + ttl_secs`; out-of-range TTLs are rejected rather than wrapped.
fn expiry_from_ttl(now: DateTime<Utc>, ttl_secs: i64) -> Result<DateTime<Utc>, NestkitError> {
    chrono::Duration::try_seconds(ttl_secs)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            NestkitError::InvalidInput(format!("--ttl-secs {ttl_secs} is out of range"))
        })
}

/// JSON if it parses, otherwise the raw text as a string.
fn parse_loose(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
