//! CLI binary for cardscan.
//!
//! A thin shim over the library crate: subcommands map onto the pipeline
//! operations and the contact store, and results print as JSON.

use anyhow::{Context, Result};
use cardscan::{
    config::settings,
    extract::extract,
    pipeline::ocr::{engine_from_settings, run_ocr},
    ContactBatch, ContactModel, ContactStore,
};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Recognize text only (no API key needed)
  cardscan ocr card.jpg

  # Full extraction to JSON on stdout
  cardscan extract card.jpg

  # Extract and persist the contacts
  cardscan extract card.jpg --save --db contacts.db

  # Refine a previously extracted batch
  cardscan improve batch.json --instructions "company names are German"

  # Merge true duplicates of the same person
  cardscan dedupe batch.json

  # Browse the store
  cardscan list --db contacts.db
  cardscan search acme --db contacts.db

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default backend)
  CARDSCAN_LLM_PROVIDER   Override provider (gemini, openai, anthropic, ...)
  CARDSCAN_MODEL          Override model ID (default: gemini-2.0-flash)
  CARDSCAN_OCR_PROVIDER   OCR backend (default: tesseract)
  CARDSCAN_OCR_LANG       Tesseract language code (default: eng)
  TESSERACT_CMD           Path to the tesseract binary

SETUP:
  1. Install Tesseract:   apt install tesseract-ocr  (or brew install tesseract)
  2. Set API key:         export GEMINI_API_KEY=...
  3. Extract:             cardscan extract card.jpg
"#;

/// Turn business-card photos into structured contact records.
#[derive(Parser, Debug)]
#[command(
    name = "cardscan",
    version,
    about = "Turn business-card photos into structured contact records using OCR and LLMs",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "CARDSCAN_VERBOSE")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize text and report OCR confidence; no model call.
    Ocr {
        /// Image file (PNG or JPEG).
        image: PathBuf,
    },
    /// Run the full pipeline: OCR → structuring → normalization.
    Extract {
        /// Image file (PNG or JPEG).
        image: PathBuf,
        /// Persist extracted contacts into the store.
        #[arg(long)]
        save: bool,
        /// SQLite store path.
        #[arg(long, env = "CARDSCAN_DB", default_value = "contacts.db")]
        db: PathBuf,
    },
    /// Refine a contact batch with free-text instructions.
    Improve {
        /// JSON file holding {"contacts": [...]}.
        batch: PathBuf,
        /// Free-text guidance for the model.
        #[arg(short, long)]
        instructions: Option<String>,
    },
    /// Merge true duplicates of the same person in a batch.
    Dedupe {
        /// JSON file holding {"contacts": [...]}.
        batch: PathBuf,
    },
    /// List stored contacts, newest first.
    List {
        #[arg(long, env = "CARDSCAN_DB", default_value = "contacts.db")]
        db: PathBuf,
        #[arg(long, default_value_t = 100)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Substring search over name, email, phone, and company.
    Search {
        query: String,
        #[arg(long, env = "CARDSCAN_DB", default_value = "contacts.db")]
        db: PathBuf,
        #[arg(long, default_value_t = 100)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Delete a stored contact by id.
    Delete {
        id: i64,
        #[arg(long, env = "CARDSCAN_DB", default_value = "contacts.db")]
        db: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Ocr { image } => {
            let bytes = read_file(&image)?;
            let engine = engine_from_settings(settings()?);
            let result = run_ocr(engine, bytes).await.context("OCR failed")?;
            print_json(&result)
        }
        Command::Extract { image, save, db } => {
            let bytes = read_file(&image)?;
            let output = extract(bytes).await.context("Extraction failed")?;

            if save {
                let store = ContactStore::open(&db)
                    .with_context(|| format!("Failed to open store at {}", db.display()))?;
                for contact in output.contacts.contacts.iter().cloned() {
                    let stored = store.create(contact).await.context("Failed to save contact")?;
                    eprintln!("saved contact #{}", stored.id);
                }
            }
            print_json(&output)
        }
        Command::Improve {
            batch,
            instructions,
        } => {
            let input = read_batch(&batch)?;
            let model = ContactModel::shared().context("LLM backend unavailable")?;
            let improved = model
                .improve(&input, instructions.as_deref())
                .await
                .context("Improvement failed")?;
            print_json(&improved)
        }
        Command::Dedupe { batch } => {
            let input = read_batch(&batch)?;
            let before = input.len();
            let model = ContactModel::shared().context("LLM backend unavailable")?;
            let merged = model.dedupe(input).await.context("Deduplication failed")?;
            eprintln!("{} → {} contacts", before, merged.len());
            print_json(&merged)
        }
        Command::List { db, limit, offset } => {
            let store = ContactStore::open(&db)?;
            let contacts = store.search(None, limit, offset).await?;
            print_json(&contacts)
        }
        Command::Search {
            query,
            db,
            limit,
            offset,
        } => {
            let store = ContactStore::open(&db)?;
            let total = store.count(Some(query.clone())).await?;
            let contacts = store.search(Some(query), limit, offset).await?;
            eprintln!("{} matching, showing {}", total, contacts.len());
            print_json(&contacts)
        }
        Command::Delete { id, db } => {
            let store = ContactStore::open(&db)?;
            if store.delete(id).await? {
                eprintln!("deleted contact #{id}");
            } else {
                eprintln!("no contact #{id}");
            }
            Ok(())
        }
    }
}

fn read_file(path: &PathBuf) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_batch(path: &PathBuf) -> Result<ContactBatch> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a contact batch JSON file", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle.write_all(json.as_bytes()).context("Failed to write to stdout")?;
    handle.write_all(b"\n").ok();
    Ok(())
}
