use std::time::Duration;

use clap::{Args, Parser, Subcommand};

const DEFAULT_USER_AGENT: &str = concat!("binday/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Parser)]
#[command(name = "binday", version)]
#[command(about = "Look up council bin collection dates for a UK address")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Fetch the collection schedule for a postcode and house number
    Lookup(LookupArgs),
    /// List the councils binday can query
    Councils,
}

#[derive(Debug, Args)]
pub(crate) struct LookupArgs {
    /// Council slug, see `binday councils`
    #[arg(short, long, default_value = "south-tyneside")]
    pub council: String,

    /// Postcode of the property, e.g. "NE34 6AA"
    #[arg(short, long)]
    pub postcode: Option<String>,

    /// House number or name (PAON)
    #[arg(long, visible_alias = "house-number")]
    pub paon: Option<String>,

    /// Only resolve the address token, skip the schedule request
    #[arg(long)]
    pub address_only: bool,

    #[command(flatten)]
    pub http: HttpArgs,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Args)]
pub(crate) struct HttpArgs {
    /// Override the council API endpoint
    #[arg(long)]
    pub api_url: Option<String>,

    /// Extra request headers as "name: value|name: value"
    #[arg(long)]
    pub headers: Option<String>,

    /// User agent sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Give up on a request after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

impl Default for HttpArgs {
    fn default() -> Self {
        Self {
            api_url: None,
            headers: None,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout_secs: None,
        }
    }
}

impl HttpArgs {
    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Exit status for an argument parsing outcome: `--help` and `--version`
/// succeed, anything clap rejects fails like every other error.
pub(crate) fn exit_status(err: &clap::Error) -> u8 {
    u8::from(err.use_stderr())
}
