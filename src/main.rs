//! Developer tool for the preferences bridge.
//!
//! ```bash
//! prefs-bridge call /get/all
//! prefs-bridge call /set --args '["theme-name", "dark"]'
//! prefs-bridge --transport script-tag --encoding json-query call /shortcut/get-all
//! prefs-bridge encode /set --args '{"property": "theme-name", "value": "dark"}'
//! prefs-bridge decode 'prefs:///set?%5B%22theme-name%22%2C%22dark%22%5D'
//! ```
//!
//! `call` runs against the in-memory fixture host.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use prefs_bridge::bridge::{Bridge, CallOptions, MemoryDocument};
use prefs_bridge::config::{self, BridgeConfig, EncodingKind, TransportKind};
use prefs_bridge::host::{preferences_router, MockHost};
use prefs_bridge::logging;
use prefs_bridge::protocol::{encoder_for, Args};

#[derive(Debug, Parser)]
#[command(name = "prefs-bridge")]
#[command(about = "Issue, encode and decode preferences bridge requests", long_about = None)]
struct Cli {
    /// Config file (defaults to the per-user config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum)]
    transport: Option<TransportArg>,

    #[arg(long, global = true, value_enum)]
    encoding: Option<EncodingArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Call a resource on the fixture host and print the result
    Call {
        path: String,
        /// JSON object (named) or array (positional) of arguments
        #[arg(long)]
        args: Option<String>,
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Print the bridge traffic of the call to stderr
        #[arg(long)]
        show_traffic: bool,
    },
    /// Print the request URL for a call
    Encode {
        path: String,
        #[arg(long)]
        args: Option<String>,
        #[arg(long, default_value = "__jp1")]
        id: String,
    },
    /// Decode a request URL the way the host does
    Decode { url: String },
    /// List the fixture host's routes
    Routes,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TransportArg {
    ScriptTag,
    Fetch,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncodingArg {
    B64Json,
    JsonQuery,
    ArgsArray,
}

impl From<TransportArg> for TransportKind {
    fn from(arg: TransportArg) -> Self {
        match arg {
            TransportArg::ScriptTag => TransportKind::ScriptTag,
            TransportArg::Fetch => TransportKind::Fetch,
        }
    }
}

impl From<EncodingArg> for EncodingKind {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::B64Json => EncodingKind::B64Json,
            EncodingArg::JsonQuery => EncodingKind::JsonQuery,
            EncodingArg::ArgsArray => EncodingKind::ArgsArray,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let _guard = logging::init();
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Call {
            path,
            args,
            timeout_ms,
            show_traffic,
        } => {
            let args = parse_args(args.as_deref())?;
            let options = CallOptions {
                timeout: timeout_ms.map(Duration::from_millis),
            };
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .context("Failed to start async runtime")?;
            let result = runtime.block_on(run_call(config, &path, args, options));
            if show_traffic {
                for event in logging::get_recent_logs() {
                    eprintln!("{}", event);
                }
            }
            println!("{}", serde_json::to_string_pretty(&result?)?);
        }
        Command::Encode { path, args, id } => {
            let args = parse_args(args.as_deref())?;
            let url = encoder_for(&config).encode(&path, &args, &id)?;
            println!("{}", url);
        }
        Command::Decode { url } => {
            let decoded = encoder_for(&config).decode(&url)?;
            let out = json!({
                "path": decoded.path,
                "args": decoded.args.to_value(),
                "callback": decoded.callback,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::Routes => {
            for path in preferences_router().paths() {
                println!("{}", path);
            }
        }
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> anyhow::Result<BridgeConfig> {
    let path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut config = config::load_config(&path);

    if let Some(transport) = cli.transport {
        config.transport = transport.into();
        // Script tags need a callback id on the wire
        if config.transport == TransportKind::ScriptTag && cli.encoding.is_none() {
            config.encoding = EncodingKind::JsonQuery;
        }
    }
    if let Some(encoding) = cli.encoding {
        config.encoding = encoding.into();
    }
    config.validate().context("Invalid bridge options")?;
    Ok(config)
}

fn parse_args(raw: Option<&str>) -> anyhow::Result<Args> {
    let Some(raw) = raw else {
        return Ok(Args::None);
    };
    let value: Value = serde_json::from_str(raw).context("--args must be JSON")?;
    if !matches!(value, Value::Object(_) | Value::Array(_)) {
        bail!("--args must be a JSON object or array");
    }
    Ok(Args::from(value))
}

async fn run_call(
    config: BridgeConfig,
    path: &str,
    args: Args,
    options: CallOptions,
) -> anyhow::Result<Value> {
    let host = MockHost::new(preferences_router(), &config);
    let transport = config.transport;

    let bridge = match transport {
        TransportKind::Fetch => Bridge::fetch(config, Arc::new(host.clone()))?,
        TransportKind::ScriptTag => {
            let document = Arc::new(MemoryDocument::new());
            document.add_page_script("main.js");
            tokio::spawn(host.clone().serve_scripts(document.requests()));
            Bridge::script_tag(config, document)?
        }
    };
    host.connect(bridge.endpoint());

    logging::log("CLI", &format!("calling {} over {:?}", path, transport));
    match bridge.call_with(path, args, options).await {
        Ok(value) => Ok(value),
        Err(e) => {
            eprintln!("[{}] {}", e.severity().label(), e.user_message());
            Err(e).with_context(|| format!("{} failed", path))
        }
    }
}
