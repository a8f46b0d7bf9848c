//! ctfserver - HTTP file server for CTF and red-team exercises.
//!
//! Usage:
//!   ctfserver                    Serve the current directory on 0.0.0.0:8080
//!   ctfserver -r /srv -p 9001    Serve /srv on port 9001
//!   ctfserver tree [PATH]        Print the directory tree and exit
//!   ctfserver --help             Show help
//!
//! Every server flag can also be set through a `CTF_*` environment
//! variable; flags take precedence.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ctfserver_core::{
    DEFAULT_HOST, DEFAULT_LOG_LEVEL, DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_PORT, DEFAULT_ROOT_DIR,
    DEFAULT_UPLOAD_DIR, ServerConfig, TreeConfig,
};
use ctfserver_scan::{TreeBuilder, render_pretty};

#[derive(Parser)]
#[command(
    name = "ctfserver",
    version,
    about = "HTTP file server for CTF and red-team exercises",
    long_about = "ctfserver exposes a directory over HTTP: browse it as a tree, \
                  download files from /files/, and receive uploads into a \
                  separate loot directory."
)]
struct Cli {
    /// Address to bind to
    #[arg(long, env = "CTF_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "CTF_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Directory to serve
    #[arg(short, long = "root", env = "CTF_ROOT_DIR", default_value = DEFAULT_ROOT_DIR)]
    root_dir: PathBuf,

    /// Directory uploads are written to
    #[arg(
        short,
        long = "upload-dir",
        env = "CTF_UPLOAD_DIR",
        default_value = DEFAULT_UPLOAD_DIR
    )]
    upload_dir: PathBuf,

    /// Largest accepted upload, in bytes
    #[arg(long, env = "CTF_MAX_UPLOAD_SIZE", default_value_t = DEFAULT_MAX_UPLOAD_SIZE)]
    max_upload_size: u64,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(short, long, env = "CTF_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,

    /// Log output format
    #[arg(long, env = "CTF_LOG_FORMAT", default_value = "json")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the directory tree and exit
    Tree {
        /// Directory to print (defaults to the served root)
        path: Option<PathBuf>,

        /// Maximum depth to descend
        #[arg(short, long)]
        depth: Option<u32>,

        /// Skip entries starting with a dot
        #[arg(long)]
        no_hidden: bool,

        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            root_dir: self.root_dir.clone(),
            upload_dir: self.upload_dir.clone(),
            max_upload_size: self.max_upload_size,
            log_level: self.log_level.to_lowercase(),
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = cli.server_config();
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Some(Command::Tree {
            path,
            depth,
            no_hidden,
            json,
        }) => {
            let root = path.unwrap_or_else(|| config.root_dir.clone());
            run_tree(root, depth, !no_hidden, json)
        }
        None => {
            init_tracing(&config.log_level, cli.log_format);
            run_server(config)
        }
    }
}

/// Install the global subscriber. `RUST_LOG`, when set, wins over `level`.
fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Serve until SIGINT/SIGTERM.
fn run_server(config: ServerConfig) -> Result<()> {
    let address = config.bind_address();
    ctfserver_http::run(config).with_context(|| format!("Server on {address} failed"))?;
    info!("server stopped");
    Ok(())
}

/// Print a tree once, without starting the server.
fn run_tree(root: PathBuf, max_depth: Option<u32>, include_hidden: bool, json: bool) -> Result<()> {
    let mut config = TreeConfig::new(&root);
    config.max_depth = max_depth;
    config.include_hidden = include_hidden;

    let tree = TreeBuilder::new(config)
        .build()
        .with_context(|| format!("Failed to read {}", root.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tree)?);
    } else {
        print!("{}", render_pretty(&tree));
    }

    Ok(())
}
