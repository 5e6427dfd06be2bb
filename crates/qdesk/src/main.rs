// SPDX-FileCopyrightText: 2026 Qdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! qdesk - ticket queue and calling-desk server.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use qdesk_config::QdeskConfig;

/// qdesk - ticket queue and calling-desk server.
#[derive(Parser, Debug)]
#[command(name = "qdesk", version, about, long_about = None)]
struct Cli {
    /// Load this file instead of the standard config hierarchy.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the store, apply the catalog and serve the gateway.
    Serve,
    /// Apply the configured catalog to the store and exit.
    Seed,
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate configuration, then print a summary.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            qdesk_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Seed) => serve::run_seed(config).await,
        Some(Commands::Config {
            action: ConfigCommand::Check,
        }) => {
            print!("{}", summary(&config));
            Ok(())
        }
        None => {
            println!("qdesk: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("qdesk: {e}");
        std::process::exit(1);
    }
}

fn load(path: Option<&std::path::Path>) -> Result<QdeskConfig, Vec<qdesk_config::ConfigError>> {
    match path {
        Some(path) => qdesk_config::load_and_validate_path(path),
        None => qdesk_config::load_and_validate(),
    }
}

/// Human-readable outline printed by `qdesk config check`.
fn summary(config: &QdeskConfig) -> String {
    let gateway = if config.gateway.enabled {
        format!(
            "{}:{} (auth {})",
            config.gateway.host,
            config.gateway.port,
            if config.gateway.bearer_token.is_some() { "on" } else { "off" }
        )
    } else {
        "disabled".to_string()
    };
    format!(
        "config ok: site `{}`\n  \
         storage:  {}\n  \
         gateway:  {gateway}\n  \
         catalog:  {} services, {} rooms, {} priority rules, {} sessions, {} displays\n",
        config.site.name,
        config.storage.database_path,
        config.services.len(),
        config.rooms.len(),
        config.priority.len(),
        config.sessions.len(),
        config.displays.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_nested_config_check() {
        let cli = Cli::try_parse_from(["qdesk", "--config", "site.toml", "config", "check"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("site.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigCommand::Check
            })
        ));
    }

    #[test]
    fn summary_counts_catalog_entries() {
        let config = qdesk_config::load_and_validate_str(
            r#"
[gateway]
bearer_token = "t"

[[services]]
id = 1
code = "XN"
name = "Blood tests"

[[rooms]]
id = 10
code = "XN1"
name = "Lab 1"
service = "XN"
"#,
        )
        .unwrap();
        let text = summary(&config);
        assert!(text.contains("site `qdesk`"));
        assert!(text.contains("127.0.0.1:8470 (auth on)"));
        assert!(text.contains("1 services, 1 rooms, 0 priority rules"));
    }
}
