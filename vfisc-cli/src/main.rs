use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use vfisc_core::config::Config;
use vfisc_core::mapping::{map_document, DocumentKind, MappingOptions};
use vfisc_core::pipeline::Submitter;
use vfisc_core::source::SourceDocument;

#[derive(Parser)]
#[command(name = "vfisc")]
#[command(about = "MRA e-invoice mapping and submission CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
enum Kind {
    /// Standard invoice
    #[default]
    Std,
    /// Standard invoice, first line item only
    Std1,
    /// Credit note
    Crn,
    /// Debit note
    Drn,
    /// Proforma
    Prf,
}

impl From<Kind> for DocumentKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Std => DocumentKind::Standard,
            Kind::Std1 => DocumentKind::StandardSingleItem,
            Kind::Crn => DocumentKind::CreditNote,
            Kind::Drn => DocumentKind::DebitNote,
            Kind::Prf => DocumentKind::Proforma,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Map a webhook payload to the gateway schema and print the JSON
    Map {
        #[arg(long, value_enum, default_value = "std")]
        kind: Kind,
        /// Webhook JSON file with invoice_id, invoice_number, invoice_data
        #[arg(long)]
        input: PathBuf,
        /// Reference invoice for credit/debit notes
        #[arg(long)]
        reference: Option<String>,
        /// Reason for credit/debit notes
        #[arg(long)]
        reason: Option<String>,
    },
    /// Map and submit a single document, printing the IRN
    Submit {
        #[arg(long, value_enum, default_value = "std")]
        kind: Kind,
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        reference: Option<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Map and submit a batch file (up to 10 invoices) in one handshake
    SubmitBatch {
        /// JSON file with an "invoices" array of webhook payloads
        #[arg(long)]
        input: PathBuf,
        /// Require each invoice to mix VATable and non-VATable lines
        #[arg(long)]
        require_vat_mix: bool,
    },
}

#[derive(Deserialize)]
struct WebhookPayload {
    invoice_id: String,
    invoice_number: String,
    invoice_data: serde_json::Value,
    /// Per-invoice document kind, batch files only. Defaults to std.
    #[serde(default)]
    kind: Kind,
}

#[derive(Deserialize)]
struct BatchPayload {
    invoices: Vec<WebhookPayload>,
}

fn read_webhook(path: &Path) -> Result<(WebhookPayload, SourceDocument)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let payload: WebhookPayload =
        serde_json::from_str(&text).context("payload must carry invoice_id, invoice_number and invoice_data")?;
    let document = SourceDocument::from_value(payload.invoice_data.clone())
        .context("parsing invoice_data")?;
    Ok((payload, document))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Map {
            kind,
            input,
            reference,
            reason,
        } => {
            let (payload, document) = read_webhook(&input)?;
            let options = MappingOptions {
                reference_override: reference,
                reason_override: reason,
                ..Default::default()
            };
            let invoice = map_document(
                kind.into(),
                &payload.invoice_id,
                &payload.invoice_number,
                &document,
                config.seller(),
                &options,
            )?;
            println!("{}", serde_json::to_string_pretty(&invoice)?);
        }
        Commands::Submit {
            kind,
            input,
            reference,
            reason,
        } => {
            let (payload, document) = read_webhook(&input)?;
            let options = MappingOptions {
                reference_override: reference,
                reason_override: reason,
                ..Default::default()
            };
            let invoice = map_document(
                kind.into(),
                &payload.invoice_id,
                &payload.invoice_number,
                &document,
                config.seller(),
                &options,
            )?;
            let submitter = Submitter::new(config)?;
            let receipt = submitter.submit(&invoice).await?;
            match receipt.first_irn() {
                Some(irn) => println!("IRN: {irn}"),
                None => bail!(
                    "no IRN issued, gateway response: {}",
                    receipt.response().body()
                ),
            }
        }
        Commands::SubmitBatch {
            input,
            require_vat_mix,
        } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let batch: BatchPayload =
                serde_json::from_str(&text).context("batch file must carry an invoices array")?;
            let options = MappingOptions {
                require_vat_mix,
                ..Default::default()
            };
            let mut mapped = Vec::with_capacity(batch.invoices.len());
            for entry in &batch.invoices {
                let document = SourceDocument::from_value(entry.invoice_data.clone())
                    .with_context(|| format!("parsing invoice_data for {}", entry.invoice_number))?;
                mapped.push(map_document(
                    entry.kind.into(),
                    &entry.invoice_id,
                    &entry.invoice_number,
                    &document,
                    config.seller(),
                    &options,
                )?);
            }
            let submitter = Submitter::new(config)?;
            let receipt = submitter.submit_batch(&mapped).await?;
            for fiscalised in receipt.fiscalised_invoices() {
                println!(
                    "{}: {}",
                    fiscalised.invoice_identifier().unwrap_or("?"),
                    fiscalised.irn().unwrap_or("no IRN")
                );
            }
        }
    }

    Ok(())
}
