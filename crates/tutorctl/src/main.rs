//! Tutor Control - CLI client for the tutor daemon
//!
//! Submits questions, then polls for the rendered video.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tutor_shared::DEFAULT_SERVER_URL;
use tutorctl::TutordClient;

#[derive(Parser)]
#[command(name = "tutorctl")]
#[command(about = "Tutor - ask a question, get an answer now and a video later", long_about = None)]
#[command(version = tutor_shared::VERSION)]
struct Cli {
    /// Base URL of the tutord server
    #[arg(long, global = true, default_value = DEFAULT_SERVER_URL)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question and wait for its video
    Ask {
        question: String,

        /// Extra context passed to the model
        #[arg(long)]
        context: Option<String>,

        /// Print the answer and task id without waiting for the video
        #[arg(long)]
        no_wait: bool,

        /// Give up after this many status polls
        #[arg(long, default_value_t = 900)]
        max_polls: u32,
    },

    /// Show the status of a task
    Status { task_id: String },

    /// Show daemon and model health
    Health,

    /// List installed models
    Models,

    /// Switch the answering model, downloading it if needed
    SwitchModel { model: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = TutordClient::new(&cli.server)?;

    match cli.command {
        Commands::Ask {
            question,
            context,
            no_wait,
            max_polls,
        } => commands::ask(&client, &question, context.as_deref(), no_wait, max_polls).await,
        Commands::Status { task_id } => commands::status(&client, &task_id).await,
        Commands::Health => commands::health(&client).await,
        Commands::Models => commands::models(&client).await,
        Commands::SwitchModel { model } => commands::switch_model(&client, &model).await,
    }
}
