mod config;
mod endpoint;
mod error;
mod exit;
mod http_client;
mod params;
mod response;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::{default_config_path, Config, Overrides, Settings};
use crate::exit::ExitCode;
use crate::http_client::{Client, CONTENT_TYPE_JSON};
use crate::params::RequestParameters;

/// Local configuration and usage problems share the generic failure code.
const EXIT_CONFIG_FAILURE: i32 = 1;

#[derive(Parser, Debug)]
#[command(name = "pasmcli")]
#[command(about = "Box and secret management CLI", long_about = None)]
struct Args {
    /// Service base URL (host[:port][/prefix])
    #[arg(long, env = "PASM_SERVER")]
    server: Option<String>,

    /// API version segment
    #[arg(long)]
    api_version: Option<String>,

    /// CA certificate (PEM or DER) used to verify the server
    #[arg(long, env = "PASM_CA_CERT")]
    ca_cert: Option<PathBuf>,

    /// Auth token
    #[arg(long, env = "PASM_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Header carrying the token (default: Authorization: Bearer ...)
    #[arg(long, env = "PASM_TOKEN_HEADER")]
    token_header: Option<String>,

    /// Load config from this path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save server, CA certificate and token into config
    #[arg(long, default_value_t = false)]
    save_config: bool,

    /// HTTP timeout seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Get Secret metadata
    GetSecretMetadata {
        /// Id or name of the Box where the Secret is
        #[arg(short = 'b', long = "boxid")]
        box_id: String,
        /// Id or name of the Secret to fetch
        #[arg(short = 's', long = "secretid")]
        secret_id: String,
    },

    /// List all box details
    ListBoxes {
        /// List only those Boxes whose name starts with this string
        #[arg(short = 'p', long)]
        prefix: Option<String>,
        /// Conditional expression to list filtered Boxes
        #[arg(short = 'l', long)]
        filters: Option<String>,
        /// Maximum number of items to include in response
        #[arg(short = 'm', long)]
        max_items: Option<i64>,
        /// Box fields to include in the response (repeatable)
        #[arg(short = 'f', long = "field")]
        fields: Vec<String>,
        /// Token from which subsequent Boxes would be listed
        #[arg(short = 'n', long)]
        next_token: Option<String>,
    },

    /// POST an arbitrary JSON object to an operation (escape hatch for new endpoints)
    Request {
        /// Operation name, e.g. GetBox
        operation: String,
        /// Raw JSON object (string) or @/path/to/file.json
        #[arg(long)]
        json: Option<String>,
    },
}

/// Terminal outcome of a subcommand: what to print on failure and which code to exit with.
#[derive(Debug)]
struct CommandFailure {
    exit_code: i32,
    message: String,
    stderr: bool,
}

impl CommandFailure {
    fn new(exit_code: i32, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
            stderr: false,
        }
    }

    /// Local configuration problems, reported on stderr.
    fn config(message: impl Into<String>) -> Self {
        Self {
            stderr: true,
            ..Self::new(EXIT_CONFIG_FAILURE, message)
        }
    }

    fn encoding(err: impl std::fmt::Display) -> Self {
        Self::new(
            ExitCode::EncodingFailure.code(),
            format!("Error building JSON request:  {}", err),
        )
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging
    let lvl = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(lvl)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cfg_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut cfg = Config::load(&cfg_path)?;

    let settings = Settings::merge(
        Overrides {
            server: args.server.clone(),
            api_version: args.api_version.clone(),
            ca_cert: args.ca_cert.clone(),
            token: args.token.clone(),
            token_header: args.token_header.clone(),
            timeout: Duration::from_secs(args.timeout_secs),
        },
        &cfg,
    );

    if args.save_config {
        settings.store_into(&mut cfg);
        cfg.save(&cfg_path)
            .with_context(|| format!("Failed to save config to {:?}", cfg_path))?;
        tracing::info!(path = ?cfg_path, "saved config");
    }

    let outcome = match args.cmd {
        Command::GetSecretMetadata { box_id, secret_id } => {
            run_get_secret_metadata(&settings, box_id, secret_id).await
        }
        Command::ListBoxes {
            prefix,
            filters,
            max_items,
            fields,
            next_token,
        } => run_list_boxes(&settings, prefix, filters, max_items, fields, next_token).await,
        Command::Request { operation, json } => run_request(&settings, &operation, json).await,
    };

    match outcome {
        Ok(ExitCode::Success) => Ok(()),
        Ok(code) => std::process::exit(code.code()),
        Err(f) => {
            if f.stderr {
                eprintln!("{}", f.message);
            } else {
                println!("{}", f.message);
            }
            std::process::exit(f.exit_code);
        }
    }
}

fn list_boxes_params(
    prefix: Option<String>,
    filters: Option<String>,
    max_items: Option<i64>,
    fields: Vec<String>,
    next_token: Option<String>,
) -> RequestParameters {
    let mut params = RequestParameters::new();
    params
        .set_opt("prefix", prefix)
        .set_opt("filters", filters)
        .set_opt("max_items", max_items)
        .set_opt("fields", Some(fields).filter(|f| !f.is_empty()))
        .set_opt("next_token", next_token);
    params
}

async fn run_get_secret_metadata(
    settings: &Settings,
    box_id: String,
    secret_id: String,
) -> std::result::Result<ExitCode, CommandFailure> {
    let mut params = RequestParameters::new();
    params.set("box_id", box_id).set("secret_id", secret_id);
    post_operation(settings, "GetSecretMetadata", &params, "Secret not found").await
}

async fn run_list_boxes(
    settings: &Settings,
    prefix: Option<String>,
    filters: Option<String>,
    max_items: Option<i64>,
    fields: Vec<String>,
    next_token: Option<String>,
) -> std::result::Result<ExitCode, CommandFailure> {
    let params = list_boxes_params(prefix, filters, max_items, fields, next_token);
    post_operation(settings, "ListBoxes", &params, "Boxes not found").await
}

async fn run_request(
    settings: &Settings,
    operation: &str,
    json: Option<String>,
) -> std::result::Result<ExitCode, CommandFailure> {
    let params = match json.as_deref() {
        Some(s) => {
            let v = parse_json_arg(s).map_err(|e| CommandFailure::encoding(format!("{:#}", e)))?;
            RequestParameters::try_from(v).map_err(CommandFailure::encoding)?
        }
        None => RequestParameters::new(),
    };
    post_operation(settings, operation, &params, "Resource not found").await
}

/// Shared path for every subcommand: encode, resolve, POST, print, classify.
async fn post_operation(
    settings: &Settings,
    operation: &str,
    params: &RequestParameters,
    not_found_message: &str,
) -> std::result::Result<ExitCode, CommandFailure> {
    let body = params.encode().map_err(CommandFailure::encoding)?;

    let endpoint = endpoint::resolve(settings, "", &settings.api_version, operation)
        .map_err(|e| CommandFailure::config(e.to_string()))?;

    let client = Client::from_settings(settings);
    let result = client.post(&endpoint, body, CONTENT_TYPE_JSON).await;

    let mut stdout = std::io::stdout().lock();
    exit::respond(&mut stdout, result, not_found_message)
        .map_err(|e| CommandFailure::config(format!("failed to write output: {}", e)))
}

fn parse_json_arg(s: &str) -> Result<serde_json::Value> {
    if let Some(path) = s.strip_prefix('@') {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path))?;
        let v =
            serde_json::from_slice(&bytes).with_context(|| format!("Invalid JSON in {}", path))?;
        return Ok(v);
    }
    let v = serde_json::from_str(s).context("Invalid JSON")?;
    Ok(v)
}
