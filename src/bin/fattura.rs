use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use fattura::core::PartyBuilder;
use fattura::fatturapa;
use fattura::ingest::{IngestConfig, Ingestor, MemoryStore, OperatingCompany, OutcomeKind, Upload};

#[derive(Parser)]
#[command(name = "fattura")]
#[command(about = "FatturaPA invoice ingestion")]
struct Cli {
    /// TOML configuration file (FATTURA__* variables override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON store snapshot, overriding `store_path`
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest FatturaPA files in order and print one JSON report per file
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Extract a file without touching the store and print it as JSON
    Inspect { file: PathBuf },
    /// Register the operating company, replacing any earlier one
    Operating {
        #[arg(long)]
        name: String,
        #[arg(long)]
        vat: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        postal_code: Option<String>,
        #[arg(long, default_value = "IT")]
        country: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = IngestConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let store_path = cli.store.unwrap_or_else(|| config.store_path.clone());

    match cli.command {
        Commands::Ingest { files } => {
            let store = MemoryStore::load(&store_path)?;
            let operating = match &config.operating_vat_id {
                Some(vat) => OperatingCompany::by_vat_id(&store, vat)?,
                None => OperatingCompany::resolve(&store)?,
            };
            tracing::info!(company = %operating.name, vat_id = %operating.vat_id, "operating company");

            let contents = files
                .iter()
                .map(|path| {
                    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
                })
                .collect::<Result<Vec<_>>>()?;
            let names: Vec<String> = files
                .iter()
                .map(|path| {
                    path.file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string())
                })
                .collect();

            let mut ingestor = Ingestor::new(store, operating, config.options());
            let reports = ingestor.ingest_batch(
                names
                    .iter()
                    .zip(&contents)
                    .map(|(name, content)| Upload::new(name, content)),
            );
            ingestor.into_store().save(&store_path)?;

            println!("{}", serde_json::to_string_pretty(&reports)?);
            let failed = reports
                .iter()
                .filter(|r| r.status == OutcomeKind::Error)
                .count();
            if failed > 0 {
                bail!("{failed} of {} files failed", reports.len());
            }
        }
        Commands::Inspect { file } => {
            let xml = std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            let invoice = fatturapa::extract(&xml, &config.options().extract)
                .with_context(|| format!("extracting {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&invoice)?);
        }
        Commands::Operating {
            name,
            vat,
            address,
            city,
            postal_code,
            country,
        } => {
            let mut store = MemoryStore::load(&store_path)?;
            let mut party = PartyBuilder::new(name, vat);
            if let Some(address) = address.as_deref() {
                party = party.address(address, None);
            }
            party = party.city(
                city.unwrap_or_default(),
                postal_code.unwrap_or_default(),
                country,
            );
            let company = store.register_operating_company(party.build())?;
            store.save(&store_path)?;
            println!("{}", serde_json::to_string_pretty(&OperatingCompany::from(company))?);
        }
    }

    Ok(())
}
