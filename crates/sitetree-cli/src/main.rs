//! sitetree binary.
//!
//! Usage:
//!   # List the root of ./public as JSON
//!   sitetree list
//!
//!   # List a subdirectory, failing on stale metadata
//!   sitetree list docs --strict --pretty
//!
//!   # Regenerate public/_meta.json from git history
//!   sitetree generate
//!
//!   # Show the effective configuration
//!   sitetree show-config
//!
//! Listings and error payloads go to stdout; logs go to stderr
//! (`RUST_LOG=sitetree_kernel=debug` for per-entry detail).

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use sitetree_kernel::generator::persist;
use sitetree_kernel::{
    CONFIG_FILE, ListingService, MetadataGenerator, MetadataPolicy, MetadataTable, SiteConfig,
};
use sitetree_types::TimeSource;
use tracing_subscriber::{EnvFilter, fmt};

/// Sandboxed listings and metadata for a static file tree.
#[derive(Parser, Debug)]
#[command(name = "sitetree")]
#[command(about = "Browse a static file tree and generate its metadata table")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the listing of one directory as JSON
    List {
        /// Directory relative to the root (empty for the root)
        #[arg(default_value = "")]
        path: String,

        #[command(flatten)]
        site: SiteArgs,

        /// Fail on missing metadata instead of falling back to live stats
        #[arg(long)]
        strict: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Walk the tree and write the metadata table
    Generate {
        #[command(flatten)]
        site: SiteArgs,

        /// Use filesystem times only, ignoring git history
        #[arg(long)]
        no_git: bool,

        /// Write the table here instead of <root>/<meta_file>
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    ShowConfig {
        #[command(flatten)]
        site: SiteArgs,
    },
}

#[derive(Args, Debug)]
struct SiteArgs {
    /// Config file (default: ./sitetree.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tree root, overriding the config file
    #[arg(short, long)]
    root: Option<PathBuf>,
}

impl SiteArgs {
    fn load(&self) -> Result<SiteConfig> {
        let mut config = match &self.config {
            Some(path) => {
                if !path.exists() {
                    bail!("config file {} does not exist", path.display());
                }
                SiteConfig::load(path)
            }
            None => SiteConfig::load(Path::new(CONFIG_FILE)),
        }
        .context("failed to load configuration")?;

        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // stdout carries JSON; logs go to stderr
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::List {
            path,
            site,
            strict,
            pretty,
        } => {
            let mut config = site.load()?;
            if strict {
                config.metadata_policy = MetadataPolicy::Strict;
            }
            list(config, &path, pretty).await
        }
        Command::Generate {
            site,
            no_git,
            output,
        } => {
            let mut config = site.load()?;
            if no_git {
                config.use_git_history = false;
            }
            generate(config, output).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::ShowConfig { site } => {
            let config = site.load()?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Exit code for a listing status: 0 ok, 2 client error, 1 otherwise.
fn exit_code(status: u16) -> ExitCode {
    match status {
        200..=299 => ExitCode::SUCCESS,
        400..=499 => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

async fn list(config: SiteConfig, path: &str, pretty: bool) -> Result<ExitCode> {
    let service = ListingService::new(config);
    let response = service.respond(path).await;

    let json = if pretty {
        serde_json::to_string_pretty(&response.body)?
    } else {
        serde_json::to_string(&response.body)?
    };
    println!("{json}");

    Ok(exit_code(response.status))
}

async fn generate(config: SiteConfig, output: Option<PathBuf>) -> Result<()> {
    let generator = MetadataGenerator::from_config(Arc::new(config));
    let table = generator
        .generate()
        .await
        .context("metadata generation failed")?;

    let table = match output {
        Some(path) => MetadataTable::new(path, table.meta_file().clone()),
        None => table,
    };
    let table = persist(table).await.context("failed to write metadata")?;

    let source = match table.time_source() {
        TimeSource::Git => "git history",
        TimeSource::Filesystem => "filesystem times",
    };
    tracing::info!(
        path = %table.source().display(),
        entries = table.len(),
        "metadata written using {source}"
    );
    Ok(())
}
