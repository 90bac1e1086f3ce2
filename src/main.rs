//! Self-signed certificate issuer.
//!
//! Usage:
//!   selfcert -c cert.conf
//!   selfcert -c cert.conf --store /var/lib/selfcert/store -v

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use log::{error, info};

use selfcert::config;
use selfcert::issuance::{CertificateIssuer, Issuance};
use selfcert::request::IssuanceRequest;
use selfcert::store::{CertificateStore, FileStore, NoopStore};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "selfcert", about = "Issue a self-signed RSA-4096 certificate as PFX, CER or PEM")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", default_value = "selfcert.conf")]
    config: PathBuf,

    /// Directory of the file-backed certificate store (overrides Certificate.Store).
    #[arg(long)]
    store: Option<PathBuf>,

    /// Certificate lifetime in days (overrides Certificate.ValidityDays).
    #[arg(long)]
    validity_days: Option<u32>,

    /// Log debug details.
    #[arg(short, long)]
    verbose: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match run(&cli) {
        Ok(issuance) => {
            println!("{}", issuance.summary);
            println!("Thumbprint:  {}", issuance.certificate.thumbprint);
        }
        Err(e) => {
            error!("{e:#}");
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<Issuance> {
    let mut settings = config::load_config(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let store_dir = cli.store.clone().or_else(|| settings.store.take());
    if let Some(days) = cli.validity_days {
        settings.validity_days = Some(days.to_string());
    }
    let request = settings.into_request().context("invalid certificate settings")?;

    match store_dir {
        Some(dir) => {
            info!("using certificate store {}", dir.display());
            issue(FileStore::new(dir), &request)
        }
        None => {
            info!("no certificate store configured; skipping store replacement");
            issue(NoopStore, &request)
        }
    }
}

fn issue<S: CertificateStore>(store: S, request: &IssuanceRequest) -> anyhow::Result<Issuance> {
    let issuance = CertificateIssuer::new(store)
        .issue(request)
        .with_context(|| format!("issuing certificate for {}", request.subject()))?;
    info!("summary written to {}", issuance.summary_path.display());
    Ok(issuance)
}

// ── Logging setup ─────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
