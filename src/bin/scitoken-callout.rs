use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use scitoken_callout::cache::credential::Credential;
use scitoken_callout::cache::token_cache::TokenCache;
use scitoken_callout::cache::token_request::EntryDescriptor;
use scitoken_callout::helpers::time::now_u64;
use scitoken_callout::observability::metrics::export_textfile;
use scitoken_callout::utils::config_loader;
use scitoken_callout::utils::logging::{self, LogLevel};
use serde_json::json;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// token only, one line
    Plain,
    /// token, lifetime, status and expiry as JSON
    Json,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "/etc/gwms-frontend/scitoken-callout.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    /// frontend group
    #[arg(short, long)]
    group: String,
    /// entry name, also the subject seed
    #[arg(short, long)]
    entry_name: Option<String>,
    /// gatekeeper address; its last word becomes the audience
    #[arg(long)]
    gatekeeper: Option<String>,
    #[arg(long)]
    trust_domain: Option<String>,
    /// mint even if the cached token is fresh
    #[arg(long)]
    force: bool,
    #[arg(short, long, value_enum, default_value = "plain")]
    output: OutputFormat,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // -------------------------------
    // 1. Load YAML config, start logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level.to_owned())?;

    // -------------------------------
    // 2. Resolve credential
    // -------------------------------

    let cache = TokenCache::from_config(&service_config);
    let entry = EntryDescriptor::new(args.entry_name.to_owned(), args.gatekeeper.to_owned());
    let trust_domain = args.trust_domain.as_deref();
    let credential = if args.force {
        cache.refresh_credential(&args.group, &entry, trust_domain).await
    } else {
        cache.get_credential(&args.group, &entry, trust_domain).await
    };
    debug!("credential status: {}", credential.status.as_str());

    // -------------------------------
    // 3. Metrics textfile
    // -------------------------------

    let metrics = &service_config.settings.metrics;
    if let (true, Some(textfile_path)) = (metrics.is_enabled, metrics.textfile_path.as_ref()) {
        if let Err(err) = export_textfile(Path::new(textfile_path)).await {
            warn!("metrics export failed: {:#}", err);
        }
    }

    // -------------------------------
    // 4. Print
    // -------------------------------

    print_credential(&credential, args.output)?;
    Ok(if credential.is_usable() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn print_credential(credential: &Credential, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Plain => println!("{}", credential.token),
        OutputFormat::Json => {
            let body = json!({
                "token": credential.token,
                "lifetime_seconds": credential.lifetime_seconds,
                "expires_at": now_u64() + credential.lifetime_seconds,
                "status": credential.status.as_str(),
                "error": credential.error().map(|e| e.to_string()),
            });
            println!("{}", serde_json::to_string(&body)?);
        }
    }
    Ok(())
}
