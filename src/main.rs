use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rescoll::connection::format_api_error;
use rescoll::{Collection, Config, HttpConnection, Params, Session};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Resource collections from JSON service descriptions
#[derive(Parser, Debug)]
#[command(name = "rescoll", version, about, long_about = None)]
struct Args {
    /// Extra directory searched for service descriptions (repeatable)
    #[arg(short = 'd', long = "data-dir", global = true)]
    data_dirs: Vec<PathBuf>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the API versions available for a service
    Versions { service: String },

    /// List the generated operations of a collection
    Describe {
        service: String,
        collection: String,
        /// API version to describe (default: latest)
        #[arg(long)]
        api_version: Option<String>,
    },

    /// Invoke an operation of a collection over HTTP
    Call {
        service: String,
        collection: String,
        operation: String,
        /// Service endpoint URL (default: from config)
        #[arg(short, long)]
        endpoint: Option<String>,
        /// Bearer token (default: from config)
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        api_version: Option<String>,
        /// Operation argument as key=value; values are parsed as JSON when possible
        #[arg(short, long = "param", value_parser = parse_key_value)]
        params: Vec<(String, Value)>,
        /// Identifier value as key=value
        #[arg(short, long = "id", value_parser = parse_key_value)]
        ids: Vec<(String, Value)>,
    },

    /// Save the endpoint used for a service
    SetEndpoint { service: String, endpoint: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("rescoll started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("rescoll").join("rescoll.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".rescoll").join("rescoll.log");
    }
    PathBuf::from("rescoll.log")
}

/// Parse `key=value`, reading the value as JSON and falling back to a string
fn parse_key_value(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let mut config = Config::load();
    config.data_dirs.extend(args.data_dirs.iter().cloned());

    match args.command {
        Command::Versions { service } => {
            let loader = rescoll::ResourceJsonLoader::new(config.effective_data_dirs());
            for version in loader.available_versions(&service)? {
                println!("{}", version);
            }
        }
        Command::Describe {
            service,
            collection,
            api_version,
        } => {
            let session = session_for(&config, &service, api_version.as_deref());
            let class = session.collection(&service, &collection)?;
            let details = class.details();

            println!("{} ({} / {})", class.name(), service, details.resource()?);
            if !class.identifiers().is_empty() {
                let ids: Vec<&str> = class
                    .identifiers()
                    .iter()
                    .map(|id| id.var_name.as_str())
                    .collect();
                println!("identifiers: {}", ids.join(", "));
            }
            for method in class.methods() {
                println!();
                println!("{} -> {}", method.name(), method.connection_method());
                if !method.docs().is_empty() {
                    println!("    {}", method.docs());
                }
                for (name, param) in method.params() {
                    let marker = if param.required { " (required)" } else { "" };
                    let param_type = param.param_type.as_deref().unwrap_or("any");
                    println!("    --param {}=<{}>{}", name, param_type, marker);
                }
            }
        }
        Command::Call {
            service,
            collection,
            operation,
            endpoint,
            token,
            api_version,
            params,
            ids,
        } => {
            let Some(endpoint) = config.effective_endpoint(&service, endpoint.as_deref()) else {
                return Err(anyhow::anyhow!(
                    "No endpoint for '{}'. Use --endpoint or `rescoll set-endpoint`",
                    service
                ));
            };

            let session = session_for(&config, &service, api_version.as_deref());
            let class = session.collection(&service, &collection)?;

            let service_data = class.details().service_data()?;
            let mut conn = HttpConnection::for_description(&endpoint, service_data)?;
            if let Some(token) = token.or_else(|| config.token.clone()) {
                conn = conn.with_token(token);
            }

            let mut handle = Collection::with_identifiers(class, Arc::new(conn), ids);
            let kwargs: Params = params.into_iter().collect();

            match handle.call(&operation, kwargs).await {
                Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                Err(rescoll::Error::Connection(e)) => {
                    tracing::error!("{} {} failed: {:#}", collection, operation, e);
                    return Err(anyhow::anyhow!(format_api_error(&e)));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::SetEndpoint { service, endpoint } => {
            // Validate before persisting
            HttpConnection::new(&endpoint)?;
            let mut stored = Config::load();
            stored.set_endpoint(&service, &endpoint)?;
            println!("{} -> {}", service, endpoint);
        }
    }

    Ok(())
}

fn session_for(config: &Config, service: &str, api_version: Option<&str>) -> Arc<Session> {
    let session = Session::from_config(config);
    match api_version {
        Some(version) => Arc::new(session.with_api_version(service, version)),
        None => Arc::new(session),
    }
}
