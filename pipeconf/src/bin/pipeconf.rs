//! Command line front end for pipeline configuration documents.

#![allow(clippy::print_stdout)]

use std::{env, fmt, io::Read, ops::Range, str::FromStr};

use clap::{Args, Parser, Subcommand};
use pipeconf::{
    document::{self, Document, View},
    kinds::Role,
    registry,
};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, util::SubscriberInitExt};

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid pipeline document: {0}")]
    Document(#[from] document::Error),
    #[error("Failed to render listing: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_config_path() -> String {
    "/etc/pipeconf/pipeconf.toml".to_string()
}

/// A `[low, high)` slice of a listing, given as `LOW,HIGH`.
#[derive(Debug, Clone)]
struct CliRange(Range<usize>);

impl fmt::Display for CliRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.0.start, self.0.end)
    }
}

impl FromStr for CliRange {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim().trim_start_matches('[').trim_end_matches(']');
        let (low, high) = input
            .split_once(',')
            .ok_or_else(|| format!("expected LOW,HIGH, got `{input}`"))?;
        let low: usize = low
            .trim()
            .parse()
            .map_err(|err| format!("invalid low bound `{low}`: {err}"))?;
        let high: usize = high
            .trim()
            .parse()
            .map_err(|err| format!("invalid high bound `{high}`: {err}"))?;
        Ok(Self(low..high))
    }
}

#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the document and exit
    Check(DocumentArgs),
    /// Print the document with every default filled in
    Fmt(DocumentArgs),
    /// Print the nodes of the document as JSON
    List(ListCommand),
    /// Print the node types known for each role
    Types,
}

#[derive(Args)]
struct DocumentArgs {
    /// path on disk to the pipeline document
    #[clap(long, default_value_t = default_config_path())]
    config_path: String,
}

#[derive(Args)]
struct ListCommand {
    #[command(flatten)]
    document: DocumentArgs,
    /// include id, name, role and type with each node
    #[clap(long)]
    display: bool,
    /// only list nodes LOW up to but excluding HIGH, format LOW,HIGH
    #[clap(long)]
    range: Option<CliRange>,
}

fn load_config_contents(config_path: &str) -> Result<String, Error> {
    if let Ok(env_var_value) = env::var("PIPECONF_CONFIG") {
        debug!("Using config from env var 'PIPECONF_CONFIG'");
        Ok(env_var_value)
    } else {
        debug!("Attempting to open configuration file at: {}", config_path);
        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .open(config_path)
            .map_err(|err| {
                error!("Could not read config file '{}': {}", config_path, err);
                err
            })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Ok(contents)
    }
}

fn load_document(args: &DocumentArgs) -> Result<Document, Error> {
    let contents = load_config_contents(&args.config_path)?;
    Document::from_text(registry::global(), &contents).map_err(|err| {
        error!("Document validation failed: {}", err);
        Error::Document(err)
    })
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .finish()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Check(args) => {
            let document = load_document(&args)?;
            for role in Role::ALL {
                let count = document
                    .nodes()
                    .iter()
                    .filter(|node| node.role() == role)
                    .count();
                info!(%role, count, "nodes");
            }
            info!("Document is valid");
        }
        Commands::Fmt(args) => {
            let document = load_document(&args)?;
            print!("{}", document.serialize()?);
        }
        Commands::List(list) => {
            let document = load_document(&list.document)?;
            let view = if list.display {
                View::Display
            } else {
                View::Fields
            };
            let listing = document.list(view, list.range.map(|range| range.0))?;
            println!("{}", serde_json::to_string_pretty(&listing.items)?);
            if let Some(content_range) = listing.content_range {
                println!("Content-Range: {content_range}");
            }
        }
        Commands::Types => {
            let registry = registry::global();
            for role in Role::ALL {
                println!("{}: {}", role.group(), registry.types(role).join(", "));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_parses_with_and_without_brackets() {
        let range: CliRange = "2,5".parse().expect("valid range");
        assert_eq!(range.0, 2..5);
        let range: CliRange = "[ 0 , 10 ]".parse().expect("valid range");
        assert_eq!(range.0, 0..10);
        assert_eq!(range.to_string(), "0,10");
    }

    #[test]
    fn range_rejects_garbage() {
        assert!("5".parse::<CliRange>().is_err());
        assert!("a,b".parse::<CliRange>().is_err());
        assert!("-1,3".parse::<CliRange>().is_err());
    }
}
