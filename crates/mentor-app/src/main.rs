//! Mentor application binary - composition root.
//!
//! 1. Parse CLI arguments
//! 2. Initialize tracing
//! 3. Load configuration from TOML and apply its log level
//! 4. Open the chat store and run the requested command

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter};

use mentor_core::error::MentorError;
use mentor_core::MentorConfig;
use mentor_image::ImageSize;

use cli::{CliArgs, Command};
use commands::AskOptions;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Start from the CLI/env level; the config file's level applies once loaded.
    let (filter, filter_handle) = reload::Layer::new(EnvFilter::new(args.resolve_log_level("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_file = args.resolve_config_path();
    let config = if config_file.exists() {
        MentorConfig::load_or_default(&config_file)
    } else {
        tracing::debug!(path = %config_file.display(), "No config file, using defaults");
        MentorConfig::default()
    };

    match EnvFilter::try_new(args.resolve_log_level(&config.general.log_level)) {
        Ok(level) => {
            if let Err(e) = filter_handle.reload(level) {
                tracing::warn!(error = %e, "Failed to apply configured log level");
            }
        }
        Err(e) => tracing::warn!(
            level = %config.general.log_level,
            error = %e,
            "Invalid log level, keeping info"
        ),
    }

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs, config: MentorConfig) -> Result<(), MentorError> {
    config.validate()?;

    let config_path = args.resolve_config_path();
    let data_dir = args.resolve_data_dir().unwrap_or_else(|| config.data_dir());

    match args.command {
        Command::InitConfig { force } => commands::init_config(&config_path, force),
        Command::Chats => commands::list_chats(&commands::open_repository(&data_dir)?),
        Command::New { title } => {
            commands::new_chat(&commands::open_repository(&data_dir)?, title.as_deref())
        }
        Command::Show { chat_id } => {
            commands::show_chat(&commands::open_repository(&data_dir)?, &chat_id)
        }
        Command::Ask {
            chat_id,
            prompt,
            mode,
            grade,
            personality,
            no_image,
        } => {
            let repo = commands::open_repository(&data_dir)?;
            let client = commands::completion_client(&config)?;
            let options = AskOptions {
                mode: mode.into(),
                grade: grade.as_deref(),
                personality: personality.as_deref(),
                with_image: !no_image,
            };
            commands::ask(repo, &config, client, &chat_id, &prompt, options).await
        }
        Command::Retry {
            chat_id,
            mode,
            no_image,
        } => {
            let repo = commands::open_repository(&data_dir)?;
            let client = commands::completion_client(&config)?;
            let options = AskOptions {
                mode: mode.into(),
                grade: None,
                personality: None,
                with_image: !no_image,
            };
            commands::retry(repo, &config, client, &chat_id, options).await
        }
        Command::Complete { prompt } => {
            let client = commands::completion_client(&config)?;
            commands::complete(&config, client.as_ref(), &prompt).await
        }
        Command::Image {
            query,
            width,
            height,
        } => {
            let defaults = ImageSize::from(&config.image);
            let size = ImageSize {
                width: width.unwrap_or(defaults.width),
                height: height.unwrap_or(defaults.height),
            };
            commands::image(&config, &query, size).await
        }
    }
}
