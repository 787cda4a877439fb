//! Schema References CLI
//!
//! Loads a fragment set, runs the reference pass and prints either the
//! decision table or the exported document.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use familiar_refs::{export, load_document, DocumentWriter, FragmentSet, RefsConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-refs")]
#[command(about = "Decide which schema fragments are inlined and which are shared by reference")]
struct Cli {
    /// Config file (defaults to refs.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    /// Name every root up front instead of waiting for reuse
    #[arg(long)]
    capture_roots: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the node → reference name table
    Resolve {
        /// Fragment set (JSON)
        file: PathBuf,
    },

    /// Render the document with shared schemas under components
    Export {
        /// Fragment set (JSON)
        file: PathBuf,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = RefsConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    if cli.capture_roots {
        config.resolver.capture_roots_by_ref = true;
    }

    match cli.command {
        Commands::Resolve { file } => {
            let set = FragmentSet::from_path(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let document = load_document(&set, &config.loader)?;
            let table = document.resolve(config.resolver.capture_roots_by_ref);

            let arena = document.cache.arena();
            for (root_name, root) in &document.roots {
                println!("{}:", root_name);
                for id in arena.reachable(*root) {
                    let hint = arena.get(id).schema_id().unwrap_or("-");
                    match table.name(id) {
                        Some(name) => println!("  {:>5}  {:<24} -> {}", id.to_string(), hint, name),
                        None => println!("  {:>5}  {:<24} -> (inline)", id.to_string(), hint),
                    }
                }
            }
            println!();
            println!("{} nodes seen, {} shared by reference", table.len(), table.named().len());
        }

        Commands::Export { file, output } => {
            let set = FragmentSet::from_path(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let document = load_document(&set, &config.loader)?;
            let table = document.resolve(config.resolver.capture_roots_by_ref);

            let writer = DocumentWriter::new(document.cache.arena(), &table, &config.export);
            let rendered = writer.document(&document.roots);

            match output {
                Some(path) => {
                    export::write_document(&rendered, &config.export, &path)?;
                    eprintln!("✅ Exported to: {:?}", path);
                }
                None => println!("{}", export::to_string(&rendered, &config.export)?),
            }
        }

        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
