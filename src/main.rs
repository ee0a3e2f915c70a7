//! StashKV shell
//!
//! A line-oriented front end over an `ExpiringStore<String>`: reads commands
//! from stdin, prints replies to stdout, logs to stderr. With `--dir` it
//! loads the directory at startup and persists every mutation.

use anyhow::Context;
use stashkv::{ExpiringStore, ExpirySweeper, Outcome, StoreConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Shell configuration
struct Config {
    /// Persistence directory
    dir: Option<PathBuf>,
    /// Default TTL for SET without an explicit TTL
    ttl: Duration,
    /// Sweep interval
    sweep: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let defaults = StoreConfig::default();
        Self {
            dir: None,
            ttl: defaults.ttl,
            sweep: defaults.sweep_interval,
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--dir" | "-d" => {
                    config.dir = Some(PathBuf::from(required_value(&args, i)));
                    i += 2;
                }
                "--ttl" | "-t" => {
                    config.ttl = Duration::from_secs(parse_secs(&args, i));
                    i += 2;
                }
                "--sweep" | "-s" => {
                    config.sweep = Duration::from_secs(parse_secs(&args, i));
                    i += 2;
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("StashKV version {}", stashkv::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    fn store_config(&self) -> StoreConfig {
        let config = StoreConfig::default()
            .with_ttl(self.ttl)
            .with_sweep_interval(self.sweep);

        match &self.dir {
            Some(dir) => config.with_persistence_dir(dir),
            None => config,
        }
    }
}

fn required_value(args: &[String], i: usize) -> &str {
    match args.get(i + 1) {
        Some(value) => value,
        None => {
            eprintln!("Error: {} requires a value", args[i]);
            std::process::exit(1);
        }
    }
}

fn parse_secs(args: &[String], i: usize) -> u64 {
    required_value(args, i).parse().unwrap_or_else(|_| {
        eprintln!("Error: {} expects a whole number of seconds", args[i]);
        std::process::exit(1);
    })
}

fn print_help() {
    println!(
        r#"
StashKV - An Expiring In-Memory Key-Value Store

USAGE:
    stashkv [OPTIONS]

OPTIONS:
    -d, --dir <PATH>      Persist entries to PATH and load them at startup
    -t, --ttl <SECS>      Default time-to-live (default: 3600)
    -s, --sweep <SECS>    Sweep interval (default: 60)
    -v, --version         Print version information
        --help            Print this help message

COMMANDS:
    SET key value [ttl_secs]
    GET key
    DEL key
    TTL key
    KEYS | VALUES | ALL | LEN | STATS | SWEEP
    QUIT
"#
    );
}

/// What the shell does after a command
enum Reply {
    Lines(Vec<String>),
    Quit,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Reply::Lines(vec![text.into()])
    }
}

struct Shell {
    store: Arc<ExpiringStore<String>>,
    persist: bool,
}

impl Shell {
    /// Persists an outcome when the shell was started with `--dir`.
    fn commit(&self, outcome: Outcome<'_, String>) -> anyhow::Result<()> {
        if self.persist {
            let key = outcome.key().to_string();
            outcome
                .persist()
                .with_context(|| format!("failed to persist {key:?}"))?;
        }
        Ok(())
    }

    fn execute(&self, line: &str) -> anyhow::Result<Reply> {
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return Ok(Reply::Lines(Vec::new()));
        };
        let args: Vec<&str> = parts.collect();

        let reply = match (command.to_ascii_uppercase().as_str(), args.as_slice()) {
            ("SET", [key, value]) => {
                self.commit(self.store.set(*key, value.to_string()))?;
                Reply::line("OK")
            }
            ("SET", [key, value, ttl]) => {
                let ttl: u64 = ttl.parse().context("TTL must be a whole number of seconds")?;
                self.commit(self.store.set_with_ttl(
                    *key,
                    value.to_string(),
                    Duration::from_secs(ttl),
                ))?;
                Reply::line("OK")
            }
            ("GET", [key]) => Reply::line(self.store.get(key).unwrap_or_else(|| "(nil)".into())),
            ("DEL", [key]) => {
                self.commit(self.store.remove(key))?;
                Reply::line("OK")
            }
            ("TTL", [key]) => Reply::line(match self.store.ttl(key) {
                Some(ttl) => ttl.as_secs().to_string(),
                None => "(nil)".to_string(),
            }),
            ("KEYS", []) => Reply::Lines(self.store.keys().collect()),
            ("VALUES", []) => Reply::Lines(self.store.values().collect()),
            ("ALL", []) => Reply::Lines(
                self.store
                    .all()
                    .map(|(key, value)| format!("{key} = {value}"))
                    .collect(),
            ),
            ("LEN", []) => Reply::line(self.store.len().to_string()),
            ("STATS", []) => Reply::line(format!("{:?}", self.store.stats())),
            ("SWEEP", []) => Reply::line(format!("swept {}", self.store.sweep())),
            ("QUIT" | "EXIT", []) => Reply::Quit,
            _ => anyhow::bail!("unknown command or wrong number of arguments: {line}"),
        };

        Ok(reply)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    // Logs go to stderr so stdout only carries replies
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let store: Arc<ExpiringStore<String>> =
        Arc::new(ExpiringStore::with_config(config.store_config()));

    if let Some(dir) = &config.dir {
        let loaded = store
            .load()
            .with_context(|| format!("failed to load entries from {}", dir.display()))?;
        info!("Restored {} entries from {}", loaded, dir.display());
    }

    let sweeper = ExpirySweeper::start(Arc::clone(&store));
    let shell = Shell {
        store,
        persist: config.dir.is_some(),
    };

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    tokio::select! {
        result = repl(&shell) => result?,
        _ = shutdown => {}
    }

    sweeper.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

/// Reads commands from stdin until EOF or QUIT.
async fn repl(shell: &Shell) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let output = match shell.execute(&line) {
            Ok(Reply::Quit) => break,
            Ok(Reply::Lines(out)) => out,
            Err(e) => vec![format!("ERR {e:#}")],
        };

        for text in output {
            stdout.write_all(text.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;
    }

    Ok(())
}
