//! Folio CLI binary.
//!
//! Resolves SEC EDGAR filings to their primary documents.

mod batch;
mod settings;

use batch::{DEFAULT_CONCURRENCY, read_rows_from_path, resolve_all};
use clap::{Args, Parser, Subcommand};
use folio_edgar::edgar::ACCEPT_HTML;
use folio_edgar::{
    EdgarClient, Fetch, FilenamePatterns, FormMap, PrimaryDocumentResolver, ResolvedDocument,
    ResolverConfig,
};
use folio_output::{ExportFormat, Exporter, ExtractOptions, extract_tables};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use settings::{ConfigOverrides, load_config};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio: SEC EDGAR primary-document resolver", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file (default: <config dir>/folio/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Listing-service URL template ({cik}, {accession}, {accession_raw}, {form})
    #[arg(long, global = true)]
    listing_url: Option<String>,

    /// User-Agent sent to SEC EDGAR
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Log more (-v info, -vv debug); RUST_LOG applies when absent
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilingArgs {
    /// Filer CIK, with or without leading zeros
    cik: String,

    /// Accession number, with or without dashes
    accession: String,

    /// Form type (e.g. 10-K, 8-K, 4)
    form: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a filing to its primary document URL
    Resolve {
        #[command(flatten)]
        filing: FilingArgs,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Download a filing's primary document
    Fetch {
        #[command(flatten)]
        filing: FilingArgs,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract the tables of a filing's primary document
    Tables {
        #[command(flatten)]
        filing: FilingArgs,

        /// Output format (csv, json or pretty-json)
        #[arg(long, default_value = "csv")]
        format: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep tables with at least this many rows
        #[arg(long, default_value_t = 2)]
        min_rows: usize,

        /// Keep tables with at least this many columns
        #[arg(long, default_value_t = 2)]
        min_columns: usize,
    },

    /// Resolve every filing listed in a CSV file (cik,accession,form)
    Batch {
        /// Input CSV file
        input: PathBuf,

        /// Write results to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum concurrent resolutions
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },

    /// Show the deterministic form map and filename patterns in effect
    Forms,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&ConfigOverrides {
        config: cli.config,
        listing_url: cli.listing_url,
        user_agent: cli.user_agent,
    })?;

    match cli.command {
        Commands::Resolve { filing, format } => {
            resolve_filing(&config, &filing, &format).await?;
        }
        Commands::Fetch { filing, output } => {
            fetch_document(&config, &filing, output.as_deref()).await?;
        }
        Commands::Tables {
            filing,
            format,
            output,
            min_rows,
            min_columns,
        } => {
            let options = ExtractOptions {
                min_rows,
                min_columns,
            };
            export_tables(&config, &filing, &format, output.as_deref(), &options).await?;
        }
        Commands::Batch {
            input,
            output,
            concurrency,
        } => {
            run_batch(&config, &input, output.as_deref(), concurrency).await?;
        }
        Commands::Forms => {
            list_forms(&config)?;
        }
    }

    Ok(())
}

/// Resolver and the client it fetches through, for commands that also download.
fn build_resolver(
    config: &ResolverConfig,
) -> Result<(PrimaryDocumentResolver, Arc<EdgarClient>), Box<dyn std::error::Error>> {
    let client = Arc::new(EdgarClient::with_config(config)?);
    let resolver = PrimaryDocumentResolver::new(config, client.clone())?;
    Ok((resolver, client))
}

async fn resolve(
    resolver: &PrimaryDocumentResolver,
    filing: &FilingArgs,
) -> Result<ResolvedDocument, Box<dyn std::error::Error>> {
    let doc = resolver
        .resolve(&filing.cik, &filing.accession, &filing.form)
        .await?;
    Ok(doc)
}

async fn resolve_filing(
    config: &ResolverConfig,
    filing: &FilingArgs,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (resolver, _) = build_resolver(config)?;
    let doc = resolve(&resolver, filing).await?;

    if format.eq_ignore_ascii_case("json") {
        let output = json!({
            "cik": filing.cik,
            "accession": filing.accession,
            "form": filing.form,
            "url": doc.url,
            "strategy": doc.source,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", doc.url);
        eprintln!("  resolved via {}", doc.source);
    }
    Ok(())
}

async fn fetch_document(
    config: &ResolverConfig,
    filing: &FilingArgs,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (resolver, client) = build_resolver(config)?;
    let doc = resolve(&resolver, filing).await?;
    let bytes = client.get_bytes(&doc.url).await?;

    match output {
        Some(path) => {
            std::fs::write(path, &bytes)?;
            eprintln!("Wrote {} bytes from {} to {}", bytes.len(), doc.url, path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

async fn export_tables(
    config: &ResolverConfig,
    filing: &FilingArgs,
    format: &str,
    output: Option<&Path>,
    options: &ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let format: ExportFormat = format.parse()?;
    let (resolver, client) = build_resolver(config)?;
    let doc = resolve(&resolver, filing).await?;

    let markup = client.get_text(&doc.url, ACCEPT_HTML).await?;
    let tables = extract_tables(&markup, options);
    tracing::info!(url = %doc.url, tables = tables.len(), "extracted tables");

    match output {
        Some(path) => {
            tables.export_to_file(path, format)?;
            eprintln!("Wrote {} tables to {}", tables.len(), path.display());
        }
        None => print!("{}", tables.export_to_string(format)?),
    }
    Ok(())
}

async fn run_batch(
    config: &ResolverConfig,
    input: &Path,
    output: Option<&Path>,
    concurrency: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = read_rows_from_path(input)?;
    let (resolver, _) = build_resolver(config)?;

    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!(
        "Resolving {} filings ({} concurrent)...",
        rows.len(),
        concurrency.max(1)
    ));

    let records = resolve_all(&resolver, rows, concurrency, Some(&pb)).await;
    let resolved = records.iter().filter(|r| r.is_resolved()).count();
    pb.finish_with_message(format!("Resolved {}/{} filings", resolved, records.len()));

    match output {
        Some(path) => records.export_to_file(path, ExportFormat::Csv)?,
        None => print!("{}", records.export_to_string(ExportFormat::Csv)?),
    }
    Ok(())
}

fn list_forms(config: &ResolverConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut forms = FormMap::with_defaults();
    forms.extend(&config.form_paths);
    let patterns = FilenamePatterns::from_map(&config.filename_patterns)?;

    println!("Deterministic forms ({}):", forms.len());
    for (form, path) in forms.iter() {
        println!("  {:16} {}", form, path);
    }

    println!("\nFilename patterns:");
    let described = patterns.describe();
    if described.is_empty() {
        println!("  (none configured)");
    }
    for (form, rules) in described {
        println!("  {:16} {}", form, rules.join("  "));
    }
    Ok(())
}
