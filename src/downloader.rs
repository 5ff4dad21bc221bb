//! The download worker: spawns yt-dlp for one task, streams progress back
//! to the UI, and honors cooperative cancellation.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::model::{DownloadTask, Quality, WorkerEvent};
use crate::progress::{self, parse_progress_line};

const BINARY: &str = "yt-dlp";

/// Sentinel yt-dlp prints once the finished file is in place.
const TITLE_PREFIX: &str = "done|";

#[derive(Debug, Error)]
pub enum Error {
    #[error("yt-dlp not found on PATH")]
    BinaryMissing(#[from] which::Error),
    #[error("could not start yt-dlp: {0}")]
    Spawn(std::io::Error),
    #[error("lost the yt-dlp output stream: {0}")]
    Stream(std::io::Error),
    #[error("yt-dlp exited with {status}: {detail}")]
    Extractor {
        status: std::process::ExitStatus,
        detail: String,
    },
    #[error("download cancelled")]
    Cancelled,
}

/// Locates the yt-dlp executable on PATH.
pub fn find_ytdlp() -> Result<PathBuf, Error> {
    Ok(which::which(BINARY)?)
}

/// Full argument vector for one task. yt-dlp does all format resolution
/// and muxing; these only state what the preset asks for.
pub fn build_args(task: &DownloadTask) -> Vec<String> {
    let mut args: Vec<String> = [
        "--newline",
        "--no-playlist",
        "--no-warnings",
        "--progress-template",
        progress::TEMPLATE,
    ]
    .map(String::from)
    .to_vec();
    args.push("--print".to_string());
    args.push(format!("after_move:{TITLE_PREFIX}%(title)s"));
    args.push("-f".to_string());
    args.push(task.quality.format_selector());
    match task.quality {
        Quality::Audio => {
            args.extend(
                ["-x", "--audio-format", "mp3", "--audio-quality", "192K"].map(String::from),
            );
        }
        _ => {
            args.extend(["--merge-output-format", "mp4"].map(String::from));
        }
    }
    args.push("-o".to_string());
    args.push(
        task.dest_dir
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .into_owned(),
    );
    args.push(task.url.clone());
    args
}

/// Runs one task through to a terminal event. Exactly one of `Finished`,
/// `Failed` or `Cancelled` is sent before returning; progress and title
/// events may precede it.
pub async fn run(task: DownloadTask, cancel: Arc<AtomicBool>, events: UnboundedSender<WorkerEvent>) {
    let outcome = drive(&task, &cancel, &events).await;
    let _ = events.send(terminal_event(outcome));
}

fn terminal_event(outcome: Result<(), Error>) -> WorkerEvent {
    match outcome {
        Ok(()) => WorkerEvent::Finished,
        Err(Error::Cancelled) => WorkerEvent::Cancelled,
        Err(error) => WorkerEvent::Failed(error.to_string()),
    }
}

async fn drive(
    task: &DownloadTask,
    cancel: &AtomicBool,
    events: &UnboundedSender<WorkerEvent>,
) -> Result<(), Error> {
    let binary = find_ytdlp()?;
    let args = build_args(task);
    debug!(binary = %binary.display(), ?args, "spawning yt-dlp");

    let mut child = Command::new(&binary)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(Error::Spawn)?;

    // Keep the last stderr line around as the failure message.
    let stderr_tail = child.stderr.take().map(|stderr| {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut last = None;
            while let Ok(Some(line)) = lines.next_line().await {
                let line = line.trim().to_string();
                if !line.is_empty() {
                    last = Some(line);
                }
            }
            last
        })
    });

    let Some(stdout) = child.stdout.take() else {
        return Err(Error::Stream(std::io::Error::other("stdout not captured")));
    };
    let mut lines = BufReader::new(stdout).lines();
    loop {
        // The cancel flag is checked once per progress line, the same
        // cadence the progress events arrive at.
        if cancel.load(Ordering::Relaxed) {
            let _ = child.kill().await;
            info!(url = %task.url, "download cancelled, yt-dlp killed");
            return Err(Error::Cancelled);
        }
        match lines.next_line().await {
            Ok(Some(line)) => handle_line(&line, events),
            Ok(None) => break,
            Err(error) => {
                let _ = child.kill().await;
                return Err(Error::Stream(error));
            }
        }
    }

    let status = child.wait().await.map_err(Error::Stream)?;
    let detail = match stderr_tail {
        Some(handle) => handle.await.ok().flatten(),
        None => None,
    };
    if cancel.load(Ordering::Relaxed) {
        return Err(Error::Cancelled);
    }
    if status.success() {
        info!(url = %task.url, "download finished");
        Ok(())
    } else {
        Err(Error::Extractor {
            status,
            detail: detail.unwrap_or_else(|| "no further output".to_string()),
        })
    }
}

fn handle_line(line: &str, events: &UnboundedSender<WorkerEvent>) {
    if let Some(title) = line.strip_prefix(TITLE_PREFIX) {
        let _ = events.send(WorkerEvent::Title(title.trim().to_string()));
    } else if let Some(update) = parse_progress_line(line) {
        let _ = events.send(WorkerEvent::Progress {
            fraction: update.fraction,
            eta: update.eta,
        });
    }
}
