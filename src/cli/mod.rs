//! # Command Line Interface
//!
//! `serve` runs the secret-provider plugin, `issue` mints one bundle from the
//! command line through the same validation and issuance path, and `inspect`
//! summarises a bundle on disk.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::config::{AppConfig, BackendConfig, ObservabilityConfig};
use crate::observability::{init_observability, log_config_info};
use crate::pki::{build_backend, CaBackend, CertificateRequest, Issuer, StaticCaBackend};
use crate::plugin::{
    start_plugin_server, DockerLabelResolver, FallbackLabelResolver, LabelResolver,
    RequestLabels, SecretDriver,
};
use crate::utils::certificates::{inspect_certificate, CertificateInfo};

#[derive(Parser)]
#[command(name = "tlsmint")]
#[command(about = "Short-lived TLS certificate issuer and Docker secret provider")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the secret-provider plugin on its Unix socket
    Serve {
        /// Plugin socket path (overrides TLSMINT_PLUGIN_SOCKET)
        #[arg(long)]
        socket: Option<PathBuf>,

        /// Where request labels are read from
        #[arg(long, value_enum, default_value_t = LabelSource::Auto)]
        labels: LabelSource,
    },

    /// Issue one certificate bundle
    Issue {
        /// Request label, e.g. `--label pki.cn=web.internal`
        #[arg(short, long = "label", value_parser = parse_label, required = true)]
        labels: Vec<(String, String)>,

        /// Write the bundle here (mode 0600) instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Sign with this CA chain instead of the configured backend
        #[arg(long, requires = "ca_key")]
        ca_cert: Option<PathBuf>,

        /// Private key for --ca-cert
        #[arg(long, requires = "ca_cert")]
        ca_key: Option<PathBuf>,
    },

    /// Print the certificates and key type of a bundle
    Inspect {
        path: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Label source for `serve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LabelSource {
    /// Labels sent with the request
    Request,
    /// Labels read from the Docker daemon
    Daemon,
    /// Request labels, falling back to the daemon when there are none
    Auto,
}

fn parse_label(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    initialise_logging(cli.verbose)?;

    match cli.command {
        Commands::Serve { socket, labels } => serve(socket, labels).await,
        Commands::Issue { labels, out, ca_cert, ca_key } => {
            let labels: HashMap<String, String> = labels.into_iter().collect();
            issue(labels, out.as_deref(), ca_cert.zip(ca_key)).await
        }
        Commands::Inspect { path, json } => inspect(&path, json),
    }
}

fn initialise_logging(verbose: bool) -> anyhow::Result<()> {
    let mut config = ObservabilityConfig::from_env()?;
    if verbose {
        config.log_level = "debug".to_string();
    }
    init_observability(&config)?;
    Ok(())
}

async fn serve(socket: Option<PathBuf>, source: LabelSource) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(socket) = socket {
        config.plugin.socket_path = socket.display().to_string();
    }
    config.validate()?;
    log_config_info(&config);

    let backend = build_backend(&config.backend)
        .await
        .context("pki: error initializing CA backend")?;

    let daemon = || {
        DockerLabelResolver::new(&config.plugin.docker_socket, &config.plugin.docker_api_version)
    };
    let labels: Arc<dyn LabelResolver> = match source {
        LabelSource::Request => Arc::new(RequestLabels),
        LabelSource::Daemon => Arc::new(daemon()),
        LabelSource::Auto => Arc::new(FallbackLabelResolver::new(daemon())),
    };

    let driver = SecretDriver::new(Issuer::new(backend), labels);
    start_plugin_server(Path::new(&config.plugin.socket_path), driver).await?;
    Ok(())
}

async fn issue(
    labels: HashMap<String, String>,
    out: Option<&Path>,
    authority_files: Option<(PathBuf, PathBuf)>,
) -> anyhow::Result<()> {
    let request = CertificateRequest::from_labels(&labels)?;

    let backend: Arc<dyn CaBackend> = match authority_files {
        Some((cert_path, key_path)) => {
            let certificate = std::fs::read(&cert_path)
                .with_context(|| format!("reading {}", cert_path.display()))?;
            let key = std::fs::read(&key_path)
                .with_context(|| format!("reading {}", key_path.display()))?;
            Arc::new(StaticCaBackend::from_pem(&certificate, &key)?)
        }
        None => {
            let config = BackendConfig::from_env()?;
            build_backend(&config).await?
        }
    };

    let bundle = Issuer::new(backend).issue_isolated(request).await?;
    let pem = bundle.to_pem();

    match out {
        Some(path) => {
            write_private_file(path, pem.as_bytes())
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), serial = %bundle.serial(), "Wrote certificate bundle");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(pem.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[derive(Serialize)]
struct BundleSummary {
    key_type: &'static str,
    certificates: Vec<CertificateInfo>,
}

fn inspect(path: &Path, json: bool) -> anyhow::Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let decoded = crate::pki::decode_bundle(&bytes)?;

    let certificates = decoded
        .chain
        .iter()
        .map(|certificate| inspect_certificate(certificate, path))
        .collect::<Result<Vec<_>, _>>()?;
    let summary =
        BundleSummary { key_type: decoded.private_key.encoding().label(), certificates };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Private key: {}", summary.key_type);
    for (index, info) in summary.certificates.iter().enumerate() {
        println!();
        println!("Certificate {}{}", index, if info.is_ca { " (CA)" } else { "" });
        println!("  Subject:    {}", info.subject);
        println!("  Issuer:     {}", info.issuer);
        println!("  Serial:     {}", info.serial);
        println!("  Not before: {}", info.not_before);
        println!("  Not after:  {}", info.not_after);
        if !info.dns_names.is_empty() {
            println!("  DNS names:  {}", info.dns_names.join(", "));
        }
        if !info.ip_addresses.is_empty() {
            let ips: Vec<String> = info.ip_addresses.iter().map(ToString::to_string).collect();
            println!("  IP addrs:   {}", ips.join(", "));
        }
    }
    Ok(())
}
