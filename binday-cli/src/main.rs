//! Command-line front end for binday: resolve an address and print its bin collections as JSON.

mod args;
mod output;

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use binday_core::{
    BinService, CouncilId, PluginRegistry, PortError, parse_headers, to_request_headers,
};
use binday_provider_south_tyneside::{self as south_tyneside, HttpTransport, SouthTynesideConfig};

use crate::args::{Cli, Command, HttpArgs, LookupArgs};
use crate::output::{AddressOutput, write_councils, write_json};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_err| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // clap writes help and version to stdout, usage errors to stderr
            err.print().ok();
            return ExitCode::from(args::exit_status(&err));
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Councils => {
            let service = service(&HttpArgs::default())?;
            write_councils(io::stdout().lock(), &service.councils())
        }
        Command::Lookup(args) => lookup(args).await,
    }
}

async fn lookup(args: LookupArgs) -> Result<()> {
    let service = service(&args.http)?;
    let council = CouncilId(args.council);
    let postcode = args.postcode.as_deref();
    let house_number = args.paon.as_deref();

    info!(%council, postcode, house_number, "looking up collections");

    if args.address_only {
        let address = service
            .resolve_address(&council, postcode, house_number)
            .await?;
        return write_json(io::stdout().lock(), &AddressOutput::from(&address), args.pretty);
    }

    let bins = service.bins_for(&council, postcode, house_number).await?;
    if bins.is_empty() {
        warn!(%council, "council reported no collections");
    } else {
        info!(%council, collections = bins.len(), "collections found");
    }
    write_json(io::stdout().lock(), &bins, args.pretty)
}

/// Build the council registry on top of one shared HTTP client.
fn service(http: &HttpArgs) -> Result<BinService> {
    let client = client(http)?;

    let mut config = SouthTynesideConfig::default();
    if let Some(api_url) = &http.api_url {
        config = config.with_api_url(api_url.as_str());
    }

    let plugins = vec![south_tyneside::plugin_with(
        Arc::new(HttpTransport::new(client)),
        config,
    )];
    let registry = Arc::new(PluginRegistry::new(plugins));
    Ok(BinService::new(registry))
}

fn client(http: &HttpArgs) -> Result<Client> {
    let mut builder = Client::builder().user_agent(http.user_agent.as_str());

    if let Some(raw) = &http.headers {
        let headers = parse_headers(raw).context("Invalid --headers value")?;
        let headers = to_request_headers(&headers).context("Invalid --headers value")?;
        builder = builder.default_headers(headers);
    }
    if let Some(timeout) = http.timeout() {
        builder = builder.timeout(timeout);
    }

    builder.build().context("Cannot build HTTP client")
}

fn report(err: &anyhow::Error) {
    let mut stderr = io::stderr().lock();
    let hint = match err.downcast_ref::<PortError>() {
        Some(PortError::InvalidInput(invalid)) => Some(invalid.hint()),
        _ => None,
    };

    // stderr may already be closed, nothing left to report to then
    writeln!(stderr, "Error: {err:#}").ok();
    if let Some(hint) = hint {
        writeln!(stderr, "{hint}").ok();
    }
}
