// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Franklin - memory and context maintenance for the Franklin assistant.
//!
//! This is the binary entry point. It owns configuration loading, tracing
//! setup, and construction of the database and memory subsystem.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod doctor;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use franklin_config::FranklinConfig;
use franklin_core::Channel;
use franklin_memory::MemoryType;

/// Franklin - memory and context maintenance.
#[derive(Parser, Debug)]
#[command(name = "franklin", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the default lookup.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Delete stale low-importance memories.
    Decay,
    /// Store a memory directly.
    Remember {
        #[arg(long)]
        user: String,
        #[arg(long)]
        channel: Channel,
        /// fact, preference, event, or context.
        #[arg(long = "type", default_value = "fact")]
        memory_type: MemoryType,
        /// 1-10.
        #[arg(long, default_value_t = 5)]
        importance: u8,
        content: String,
    },
    /// Semantic search over a user's memories.
    Search {
        #[arg(long)]
        user: String,
        #[arg(long)]
        channel: Channel,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        min_similarity: Option<f32>,
        query: String,
    },
    /// List or forget memories.
    Memories {
        #[command(subcommand)]
        action: MemoriesCommand,
    },
    /// Print the context block that would be injected for a query.
    Context {
        #[arg(long)]
        user: String,
        #[arg(long)]
        channel: Channel,
        #[arg(long)]
        query: Option<String>,
    },
    /// Print recent conversation turns, oldest first.
    History {
        #[arg(long)]
        user: String,
        #[arg(long)]
        channel: Channel,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Run memory extraction on one exchange and wait for the result.
    Extract {
        #[arg(long)]
        user: String,
        #[arg(long)]
        channel: Channel,
        #[arg(long)]
        user_message: String,
        #[arg(long)]
        assistant_response: String,
    },
    /// Run diagnostic checks.
    Doctor {
        /// Run integrity and memory checks as well.
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[derive(Subcommand, Debug)]
enum MemoriesCommand {
    /// All memories for a user, most important first.
    List {
        #[arg(long)]
        user: String,
        #[arg(long)]
        channel: Channel,
        #[arg(long = "type")]
        memory_type: Option<MemoryType>,
    },
    /// Delete a memory by id.
    Forget { id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => franklin_config::load_and_validate_path(path),
        None => franklin_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            franklin_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    if let Err(e) = run(cli, config).await {
        eprintln!("franklin: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: FranklinConfig) -> Result<(), franklin_core::FranklinError> {
    if let Commands::Doctor { deep, plain } = cli.command {
        return doctor::run_doctor(&config, cli.config.as_deref(), deep, plain).await;
    }

    let app = commands::App::open(&config).await?;
    let result = match cli.command {
        Commands::Decay => app.decay().await,
        Commands::Remember {
            user,
            channel,
            memory_type,
            importance,
            content,
        } => app.remember(&user, channel, memory_type, importance, &content).await,
        Commands::Search {
            user,
            channel,
            limit,
            min_similarity,
            query,
        } => app.search(&user, channel, &query, limit, min_similarity).await,
        Commands::Memories { action } => match action {
            MemoriesCommand::List {
                user,
                channel,
                memory_type,
            } => app.list(&user, channel, memory_type).await,
            MemoriesCommand::Forget { id } => app.forget(&id).await,
        },
        Commands::Context {
            user,
            channel,
            query,
        } => app.context(&user, channel, query.as_deref()).await,
        Commands::History {
            user,
            channel,
            limit,
        } => app.history(&user, channel, limit).await,
        Commands::Extract {
            user,
            channel,
            user_message,
            assistant_response,
        } => app.extract(&user, channel, &user_message, &assistant_response).await,
        Commands::Doctor { .. } => Ok(()),
    };
    app.close().await?;
    result
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("franklin={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_remember_with_type() {
        let cli = Cli::try_parse_from([
            "franklin",
            "remember",
            "--user",
            "u1",
            "--channel",
            "Telegram",
            "--type",
            "preference",
            "--importance",
            "7",
            "prefers index funds",
        ])
        .unwrap();
        match cli.command {
            Commands::Remember {
                channel,
                memory_type,
                importance,
                content,
                ..
            } => {
                assert_eq!(channel, Channel::Telegram);
                assert_eq!(memory_type, MemoryType::Preference);
                assert_eq!(importance, 7);
                assert_eq!(content, "prefers index funds");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_channel() {
        let parsed = Cli::try_parse_from([
            "franklin", "history", "--user", "u1", "--channel", "fax",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_memories_forget_with_global_config() {
        let cli = Cli::try_parse_from([
            "franklin",
            "memories",
            "forget",
            "abc-123",
            "--config",
            "/tmp/franklin.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/franklin.toml")));
        assert!(matches!(
            cli.command,
            Commands::Memories {
                action: MemoriesCommand::Forget { .. }
            }
        ));
    }
}
