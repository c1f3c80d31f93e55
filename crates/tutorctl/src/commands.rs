//! Command implementations for tutorctl

use anyhow::{bail, Result};
use owo_colors::OwoColorize;
use std::time::Duration;
use tracing::debug;
use tutor_shared::api::{HealthStatus, StatusResponse};
use tutor_shared::{TaskState, POLL_INTERVAL_SECS};
use tutorctl::{poll_until_terminal, PollOutcome, TutordClient};

pub async fn ask(
    client: &TutordClient,
    question: &str,
    context: Option<&str>,
    no_wait: bool,
    max_polls: u32,
) -> Result<()> {
    let response = client.ask(question, context).await?;

    println!();
    println!("{} {}", "[TOPIC]".cyan(), response.topic);
    println!();
    println!("{}", response.answer);
    println!();
    println!("{} {}", "[TASK]".cyan(), response.task_id);

    if no_wait {
        println!("Check progress with: tutorctl status {}", response.task_id);
        return Ok(());
    }

    println!("{}", response.message.dimmed());
    let task_id = response.task_id.as_str();
    let outcome = poll_until_terminal(
        Duration::from_secs(POLL_INTERVAL_SECS),
        max_polls,
        move || client.status(task_id),
        |view| debug!("task {} still {}", view.task_id, view.status),
    )
    .await?;

    match outcome {
        PollOutcome::Finished(view) => report_terminal(client, &view),
        PollOutcome::GaveUp { last, polls } => bail!(
            "Gave up after {} polls; task {} is still {}",
            polls,
            last.task_id,
            last.status
        ),
    }
}

pub async fn status(client: &TutordClient, task_id: &str) -> Result<()> {
    let view = client.status(task_id).await?;
    if view.status == TaskState::Processing {
        println!("{} {} is still processing", "[PROCESSING]".yellow(), view.task_id);
        return Ok(());
    }
    report_terminal(client, &view)
}

pub async fn health(client: &TutordClient) -> Result<()> {
    let health = client.health().await?;

    let label = match health.status {
        HealthStatus::Healthy => "[HEALTHY]".bright_green().to_string(),
        HealthStatus::Degraded => "[DEGRADED]".yellow().to_string(),
    };
    println!("{}", label);
    println!("  Ollama running:  {}", yes_no(health.ollama_running));
    println!("  Model available: {} ({})", yes_no(health.model_available), health.model);
    println!(
        "  Tasks:           {} processing, {} completed, {} failed",
        health.tasks.processing, health.tasks.completed, health.tasks.failed
    );
    Ok(())
}

pub async fn models(client: &TutordClient) -> Result<()> {
    let models = client.models().await?;
    for model in &models.available_models {
        if *model == models.current_model {
            println!("* {}", model.bright_green());
        } else {
            println!("  {}", model);
        }
    }
    if !models.available_models.contains(&models.current_model) {
        println!("* {} {}", models.current_model, "(not installed)".yellow());
    }
    Ok(())
}

pub async fn switch_model(client: &TutordClient, model: &str) -> Result<()> {
    let response = client.switch_model(model).await?;
    println!("{} {}", "[OK]".bright_green(), response.message);
    Ok(())
}

/// Print a finished task; failures become a non-zero exit
fn report_terminal(client: &TutordClient, view: &StatusResponse) -> Result<()> {
    match view.status {
        TaskState::Completed => {
            let url = view
                .video_url
                .as_deref()
                .map(|location| client.resolve_video_url(location))
                .unwrap_or_else(|| "(no video url)".to_string());
            println!("{} Video ready: {}", "[DONE]".bright_green(), url);
            Ok(())
        }
        TaskState::Failed => bail!(
            "Video generation failed: {}",
            view.error.as_deref().unwrap_or("unknown error")
        ),
        TaskState::Processing => Ok(()),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
