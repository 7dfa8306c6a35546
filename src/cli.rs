//! Command-line front end

use clap::{Args, Parser, Subcommand};
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::api::ApiClient;
use crate::config::{config_path, ClientConfig};
use crate::dispatch::Platform;
use crate::error::ConfigError;
use crate::pipeline::RetrievalPipeline;
use crate::upload::{LocalFile, UploadCoordinator};

#[derive(Debug, Parser)]
#[command(name = "dropcode")]
#[command(about = "Send a file to a drop server and fetch it back by identifier")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Args, Clone)]
pub struct GlobalArgs {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Server base URL (overrides config)
    #[arg(long, global = true)]
    pub server: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload a file and print its identifier
    Upload {
        path: PathBuf,

        /// Name reported to the server (default: the file's own name)
        #[arg(long)]
        name: Option<String>,

        /// Media type of the file
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Fetch a file by identifier and hand it to the platform
    Get {
        file_id: String,

        /// gallery, share or generic (default: detected)
        #[arg(long)]
        platform: Option<Platform>,

        /// Where downloads are stored (overrides config)
        #[arg(long)]
        download_dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Config file and environment, then command-line overrides
    pub fn load_config(&self) -> Result<ClientConfig, ConfigError> {
        let mut config = ClientConfig::load(&config_path(self.global.config.as_deref()))?;

        if let Some(server) = &self.global.server {
            config.server_url = server.clone();
            config.server_base()?;
        }
        if let Commands::Get {
            platform,
            download_dir,
            ..
        } = &self.command
        {
            if platform.is_some() {
                config.platform = *platform;
            }
            if let Some(dir) = download_dir {
                config.download_dir = dir.clone();
            }
        }
        Ok(config)
    }
}

/// Run one command; every failure becomes a single `<operation> failed` line.
pub async fn execute(cli: Cli) -> ExitCode {
    let operation = match cli.command {
        Commands::Upload { .. } => "Upload",
        Commands::Get { .. } => "Download",
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("{} failed: {}", operation, message);
            eprintln!("{} failed: {}", operation, message);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = cli.load_config().map_err(|e| e.to_string())?;
    let api = ApiClient::from_config(&config).map_err(|e| e.to_string())?;

    match cli.command {
        Commands::Upload {
            path,
            name,
            content_type,
        } => {
            let mut file = LocalFile::new(path);
            if let Some(name) = name {
                file = file.with_name(name);
            }
            if let Some(content_type) = content_type {
                file = file.with_media_type(content_type);
            }

            let file_id = UploadCoordinator::new(api)
                .upload(&file)
                .await
                .map_err(|e| e.to_string())?;
            println!("{}", file_id);
            println!("{}", file_id.share_message());
        }
        Commands::Get { file_id, .. } => {
            let session = RetrievalPipeline::from_config(api, &config)
                .retrieve(&file_id)
                .await
                .map_err(|e| e.to_string())?;
            if let Some(outcome) = session.outcome {
                println!("{}", outcome.message());
            }
        }
    }
    Ok(())
}
