mod client;
mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dcprov")]
#[command(about = "Delegated-credential provisioning and boundary transfer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Trigger provisioning on the server and persist the credentials
    Fetch {
        /// Provisioning endpoint URL
        #[arg(long, env = "DCPROV_SERVER_URL", default_value = "http://server:5001/certs")]
        server_url: String,

        /// Request timeout in seconds
        #[arg(long, env = "DCPROV_REQUEST_TIMEOUT_SECS", default_value_t = 120)]
        timeout_secs: u64,

        /// Directory the decoded artifacts are written to
        #[arg(long, env = "DCPROV_CERTS_DIR", default_value = "/certs")]
        out_dir: PathBuf,
    },

    /// Extract the artifact bundle from a container to a local directory
    Pull {
        /// Source container name
        #[arg(long)]
        env: String,

        /// Artifact directory inside the container
        #[arg(long, default_value = "/certs")]
        remote_dir: String,

        /// Local output directory
        #[arg(long, default_value = "./certs_out")]
        out: PathBuf,
    },

    /// Inject a locally stored artifact bundle into a container
    Push {
        /// Destination container name
        #[arg(long)]
        env: String,

        /// Local directory holding the bundle
        #[arg(long, default_value = "./certs_out")]
        from: PathBuf,

        /// Artifact directory inside the container
        #[arg(long, default_value = "/certs")]
        remote_dir: String,
    },

    /// Move the bundle between two containers and verify the destination
    Relay {
        /// Source container name
        #[arg(long)]
        from_env: String,

        /// Destination container name
        #[arg(long)]
        to_env: String,

        /// Artifact directory inside both containers
        #[arg(long, default_value = "/certs")]
        remote_dir: String,

        /// Keep the intermediate copy in this directory
        #[arg(long)]
        scratch: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            server_url,
            timeout_secs,
            out_dir,
        } => commands::fetch::run(&server_url, timeout_secs, &out_dir).await?,
        Commands::Pull {
            env,
            remote_dir,
            out,
        } => commands::transfer::pull(&env, &remote_dir, &out).await?,
        Commands::Push {
            env,
            from,
            remote_dir,
        } => commands::transfer::push(&env, &from, &remote_dir).await?,
        Commands::Relay {
            from_env,
            to_env,
            remote_dir,
            scratch,
        } => commands::transfer::relay(&from_env, &to_env, &remote_dir, scratch).await?,
    }

    Ok(())
}
