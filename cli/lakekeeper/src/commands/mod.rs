mod server;
mod warehouse;

use std::fmt;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use indoc::indoc;
use lakekeeper_client::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;

pub const LAKEKEEPER_VERSION: &str = env!("CARGO_PKG_VERSION");

static LAKEKEEPER_DESCRIPTION: &str = indoc! {"
    Command line client for the Lakekeeper management API.

    Connection and authentication settings are read from
    $XDG_CONFIG_HOME/lakekeeper/lakekeeper.toml and LAKEKEEPER_* variables."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(LAKEKEEPER_DESCRIPTION), version(LAKEKEEPER_VERSION))]
pub struct LakekeeperCli(#[bpaf(external(lakekeeper_args))] pub LakekeeperArgs);

/// Main args parser
///
/// To parse the full CLI, use [`LakekeeperCli`] via [`lakekeeper_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)]
pub struct LakekeeperArgs {
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    /// Server URL, overrides 'server_url' from the config
    #[bpaf(long("server"), argument("URL"))]
    server: Option<String>,

    /// Bearer token, overrides all configured authentication
    #[bpaf(long("token"), argument("TOKEN"))]
    token: Option<String>,

    /// Do not retry failed requests
    #[bpaf(long("no-retry"))]
    no_retry: bool,

    #[bpaf(external(commands))]
    command: Commands,
}

impl LakekeeperArgs {
    /// Apply flag overrides to `config`, connect and run the selected command.
    pub async fn handle(self, mut config: Config) -> Result<()> {
        if let Some(server) = self.server {
            config.server_url = server;
        }
        if let Some(token) = self.token {
            config.token = Some(token);
            config.oauth = None;
        }
        if self.no_retry {
            config.retry.enabled = false;
        }

        debug!(server_url = %config.server_url, "connecting");
        let client = Client::connect(config.client_config()?)
            .await
            .with_context(|| format!("Could not connect to '{}'", config.server_url))?;

        self.command.handle(&client).await
    }
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// Show server version and bootstrap status
    #[bpaf(command)]
    Info,

    /// Show the authenticated principal
    #[bpaf(command)]
    Whoami,

    /// Bootstrap the server and accept its terms of use
    #[bpaf(command)]
    Bootstrap(#[bpaf(external(server::bootstrap))] server::Bootstrap),

    /// Manage warehouses
    #[bpaf(command)]
    Warehouse(#[bpaf(external(warehouse::warehouse_commands))] warehouse::WarehouseCommands),
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command")
    }
}

impl Commands {
    async fn handle(self, client: &Client) -> Result<()> {
        match self {
            Commands::Info => server::info(client).await?,
            Commands::Whoami => server::whoami(client).await?,
            Commands::Bootstrap(args) => args.handle(client).await?,
            Commands::Warehouse(args) => args.handle(client).await?,
        }
        Ok(())
    }
}

/// Print `value` as pretty JSON to stdout.
pub(crate) fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Could not serialize output")?;
    println!("{json}");
    Ok(())
}
