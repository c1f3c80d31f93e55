//! Renderer backed by an external program.
//!
//! The job is written to the program's stdin as JSON. Arguments may use the
//! `{task_id}`, `{topic}` and `{output}` placeholders. A render succeeds when
//! the program exits zero and the output file exists.

use super::{RenderError, RenderJob, Renderer};
use crate::config::RenderConfig;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Longest stderr excerpt kept in a failure reason
const MAX_STDERR_CHARS: usize = 500;

pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }

    fn expand_args(&self, job: &RenderJob) -> Vec<String> {
        let output = job.output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{task_id}", &job.task_id)
                    .replace("{topic}", &job.topic)
                    .replace("{output}", &output)
            })
            .collect()
    }
}

#[async_trait]
impl Renderer for CommandRenderer {
    async fn render(&self, job: &RenderJob) -> Result<PathBuf, RenderError> {
        if let Some(parent) = job.output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.expand_args(job);
        debug!("Spawning renderer: {} {:?}", self.program, args);

        // kill_on_drop: a timed-out render must not leave the child running
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            let payload = serde_json::to_vec(job).map_err(std::io::Error::from)?;
            match stdin.write_all(&payload).await {
                Ok(()) => {}
                // The renderer is free to ignore its stdin
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e.into()),
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr: String = String::from_utf8_lossy(&output.stderr)
                .trim()
                .chars()
                .take(MAX_STDERR_CHARS)
                .collect();
            return Err(RenderError::Exit {
                code: output.status.code(),
                stderr,
            });
        }

        if !tokio::fs::try_exists(&job.output).await.unwrap_or(false) {
            return Err(RenderError::MissingArtifact(job.output.clone()));
        }

        Ok(job.output.clone())
    }
}
