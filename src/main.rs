use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ifcwise::chunker::estimate_units;
use ifcwise::config::ChunkPolicy;
use ifcwise::export::{self, ExportFormat};
use ifcwise::extractor::TableFilter;
use ifcwise::summary::ModelSummary;
use ifcwise::{Config, DirectoryTransmitter, IfcWiseError, Pipeline};
use std::path::PathBuf;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Debug, Parser)]
#[command(name = "ifcwise", version = VERSION, about = "Tabulate and chunk IFC building models")]
struct Cli {
    /// Log pipeline progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "IFCWISE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show schema, creation date and element counts
    Info {
        file: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the element table as CSV or JSON
    Export {
        file: PathBuf,
        #[arg(long, default_value = "csv")]
        format: ExportFormat,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Plan chunks and optionally write them as messages
    Chunks {
        file: PathBuf,
        #[arg(long)]
        policy: Option<ChunkPolicy>,
        #[arg(long)]
        max_rows: Option<usize>,
        #[arg(long)]
        max_units: Option<usize>,
        #[arg(long)]
        divisor: Option<usize>,
        #[command(flatten)]
        filter: FilterArgs,
        /// Write every chunk message under this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Write messages to the configured outbox directory
        #[arg(long, conflicts_with = "out_dir")]
        send: bool,
        /// Sub-directory (conversation) the messages belong to
        #[arg(long, default_value = "default")]
        destination: String,
        /// 0-based chunk index to resume from
        #[arg(long, default_value_t = 0)]
        start_at: usize,
    },
}

#[derive(Debug, Args)]
struct FilterArgs {
    /// Element category to read (`IfcProduct` for all products)
    #[arg(long)]
    category: Option<String>,
    /// Keep only these element types
    #[arg(long, value_delimiter = ',')]
    types: Vec<String>,
    /// Keep only these columns, in this order
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,
    /// Keep rows containing this text (case-insensitive)
    #[arg(long)]
    search: Option<String>,
}

impl FilterArgs {
    fn apply_to(&self, config: &mut Config) {
        if let Some(category) = &self.category {
            config.extraction.category = category.clone();
        }
    }

    fn table_filter(&self) -> TableFilter {
        TableFilter {
            element_types: self.types.clone(),
            search: self.search.clone(),
            columns: self.columns.clone(),
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::load_or_default()?,
    };
    config.apply_env_overrides();
    Ok(config)
}

/// Settings mistakes exit with status 2 and a one-line message
fn check_settings(config: &Config) -> Result<()> {
    if let Err(e) = config.validate() {
        if e.is_user_error() {
            eprintln!("ifcwise: {}", e);
            std::process::exit(2);
        }
        return Err(e.into());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Info { file, json } => {
            let model = Pipeline::new(config).load_model(&file)?;
            let summary = ModelSummary::from_file(&model, &file)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", summary);
            }
        }

        Command::Export {
            file,
            format,
            output,
            filter,
        } => {
            filter.apply_to(&mut config);
            check_settings(&config)?;
            let pipeline = Pipeline::new(config);
            let model = pipeline.load_model(&file)?;
            let table = filter.table_filter().apply(&pipeline.extract(&model));
            let text = export::export(&table, format)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!("Wrote {} rows to {}", table.len(), path.display());
                }
                None => print!("{}", text),
            }
        }

        Command::Chunks {
            file,
            policy,
            max_rows,
            max_units,
            divisor,
            filter,
            out_dir,
            send,
            destination,
            start_at,
        } => {
            filter.apply_to(&mut config);
            if let Some(policy) = policy {
                config.chunking.chunk_policy = policy;
            }
            if let Some(rows) = max_rows {
                config.chunking.max_rows_per_chunk = rows;
            }
            if let Some(units) = max_units {
                config.chunking.max_size_units_per_chunk = units;
            }
            if let Some(divisor) = divisor {
                config.chunking.size_unit_divisor = divisor;
            }
            check_settings(&config)?;

            let outbox = out_dir.or_else(|| send.then(|| config.transmission.outbox_dir.clone()));
            let unit_divisor = config.chunking.size_unit_divisor;
            let pipeline = Pipeline::new(config);

            let model = pipeline.load_model(&file)?;
            let table = filter.table_filter().apply(&pipeline.extract(&model));
            let chunks = pipeline.plan(&table)?;

            for (i, chunk) in chunks.iter().enumerate() {
                println!(
                    "{:>4}  {:<40} {:>5} rows {:>7} units{}  {}",
                    i,
                    chunk.label(),
                    chunk.row_count(),
                    estimate_units(chunk.payload.len(), unit_divisor),
                    if chunk.oversized { " (oversized)" } else { "" },
                    &chunk.digest()[..12]
                );
            }

            if let Some(root) = outbox {
                let transmitter = DirectoryTransmitter::new(root);
                match pipeline
                    .transmit(&transmitter, &destination, &chunks, start_at)
                    .await
                {
                    Ok(report) => eprintln!(
                        "Wrote {} messages for '{}' under {}",
                        report.sent,
                        report.destination,
                        transmitter.root().display()
                    ),
                    Err(e) => {
                        eprintln!("{}", e);
                        if e.is_retryable() {
                            let resume_at = match &e {
                                IfcWiseError::Transmission(failed) => failed.index,
                                _ => start_at,
                            };
                            eprintln!("Resume with --start-at {}", resume_at);
                        }
                        return Err(e.into());
                    }
                }
            }
        }
    }

    Ok(())
}
