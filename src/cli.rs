// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for capture sessions
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking photos
//! - Recording videos
//! - Driving a capture session interactively
//!
//! Every command runs a real [`CaptureController`] against the virtual camera
//! backend.

use camera_capture::app::state::{CapturedFile, Message};
use camera_capture::backends::camera::MediaBackend;
use camera_capture::backends::virtual_camera::VirtualCameraBackend;
use camera_capture::constants::cli::{PROGRESS_INTERVAL, STREAM_WAIT_TIMEOUT};
use camera_capture::constants::virtual_camera::DEFAULT_CHUNK_INTERVAL;
use camera_capture::storage::{self, DirectorySink};
use camera_capture::{
    ArtifactSink, CameraMode, CaptureController, CaptureResult, Config, Facing, PreviewState,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::io::AsyncBufReadExt;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn build_backend(source: Option<&Path>) -> CliResult<VirtualCameraBackend> {
    let backend = VirtualCameraBackend::new();
    match source {
        Some(path) => Ok(backend.with_image_source(path)?),
        None => Ok(backend),
    }
}

/// Open the session and wait until the preview is live
async fn open_and_wait(controller: &mut CaptureController, mode: CameraMode) -> CliResult<()> {
    controller.open(Some(mode))?;
    tokio::time::timeout(STREAM_WAIT_TIMEOUT, controller.wait_for_stream())
        .await
        .map_err(|_| "Timed out waiting for the camera")??;

    if let Some(stream) = controller.current_stream() {
        println!("Using camera: {}", stream.label());
    }
    Ok(())
}

/// Write a delivered file to `output` (file or directory) or the default folder
fn write_output(file: &CapturedFile, output: Option<PathBuf>, default_dir: &Path) -> CliResult<PathBuf> {
    match output {
        Some(path) if path.is_dir() => Ok(storage::save_file(&path, file)?),
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, &file.data)?;
            Ok(path)
        }
        None => Ok(storage::save_file(default_dir, file)?),
    }
}

/// List all available cameras
pub fn list_cameras(source: Option<&Path>) -> CliResult<()> {
    let backend = build_backend(source)?;
    let cameras = backend.enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({} backend):", backend.name());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        let facing = camera
            .facing
            .map(|f| f.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("  [{}] {} ({}, facing {})", index, camera.name, camera.path, facing);
    }
    println!();

    if let Some(path) = Config::config_path() {
        println!("Config: {}", path.display());
    }
    Ok(())
}

/// Take a photo, confirm it and save it
pub fn take_photo(
    source: Option<&Path>,
    facing: Facing,
    output: Option<PathBuf>,
    open: bool,
) -> CliResult<()> {
    let backend = Arc::new(build_backend(source)?);
    let mut config = Config::load();
    config.default_facing = facing;
    let default_dir = config.save_directory();

    let (file_tx, file_rx) = std::sync::mpsc::channel();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let mut controller = CaptureController::new(backend, config, move |file: CapturedFile| {
            let _ = file_tx.send(file);
        })?;

        open_and_wait(&mut controller, CameraMode::Photo).await?;
        println!("Capturing...");
        controller.capture_still()?;
        if let Some(artifact) = controller.pending_artifact()
            && let Some((width, height)) = artifact.dimensions
        {
            println!("Captured {}x{} ({} bytes)", width, height, artifact.size());
        }
        controller.confirm()?;
        Ok::<_, Box<dyn Error>>(())
    })?;

    let file = file_rx.try_recv().map_err(|_| "No photo was delivered")?;
    let path = write_output(&file, output, &default_dir)?;
    println!("Photo saved: {}", path.display());

    if open {
        open::that(&path)?;
    }
    Ok(())
}

/// Record a clip for `duration` seconds (or until Ctrl+C), confirm it and save it
pub fn record_video(
    source: Option<&Path>,
    facing: Facing,
    duration: u64,
    output: Option<PathBuf>,
    enable_audio: bool,
    open: bool,
) -> CliResult<()> {
    let backend = Arc::new(build_backend(source)?.with_chunk_interval(DEFAULT_CHUNK_INTERVAL));
    let mut config = Config::load();
    config.default_facing = facing;
    config.record_audio = enable_audio;
    let default_dir = config.save_directory();

    println!("Duration: {} seconds", duration);
    if enable_audio {
        println!("Audio: enabled");
    }

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    let (file_tx, file_rx) = std::sync::mpsc::channel();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let mut controller = CaptureController::new(backend, config, move |file: CapturedFile| {
            let _ = file_tx.send(file);
        })?;

        open_and_wait(&mut controller, CameraMode::Video).await?;

        println!();
        println!("Recording... (press Ctrl+C to stop early)");
        controller.start_recording()?;

        let start = Instant::now();
        let target_duration = Duration::from_secs(duration);
        while start.elapsed() < target_duration {
            if stop_flag.load(Ordering::SeqCst) {
                println!();
                println!("Stopping early...");
                break;
            }

            controller.process_pending();

            let elapsed = start.elapsed().as_secs();
            print!(
                "\rRecording: {:02}:{:02} ({} chunks)",
                elapsed / 60,
                elapsed % 60,
                controller.session().recorder.chunk_count()
            );
            std::io::Write::flush(&mut std::io::stdout())?;

            tokio::time::sleep(PROGRESS_INTERVAL).await;
        }
        println!();

        controller.stop_recording()?;
        if let Some(artifact) = controller.pending_artifact() {
            println!(
                "Recorded {} bytes in {} chunks",
                artifact.size(),
                artifact.chunk_count.unwrap_or_default()
            );
        }
        controller.confirm()?;
        Ok::<_, Box<dyn Error>>(())
    })?;

    let file = file_rx.try_recv().map_err(|_| "No clip was delivered")?;
    let path = write_output(&file, output, &default_dir)?;
    println!("Video saved: {}", path.display());

    if open {
        open::that(&path)?;
    }
    Ok(())
}

// =============================================================================
// Interactive session
// =============================================================================

/// Directory sink that reports each saved file on stdout
struct ReportingSink(DirectorySink);

impl ArtifactSink for ReportingSink {
    fn artifact_ready(&mut self, file: CapturedFile) -> CaptureResult<()> {
        self.0.artifact_ready(file)?;
        if let Some(path) = self.0.saved().last() {
            println!("Confirmed: {}", path.display());
        }
        Ok(())
    }
}

/// One line of session input
#[derive(Debug)]
enum SessionCommand {
    Message(Message),
    Status,
    Help,
    Quit,
}

fn parse_mode(word: &str) -> Result<CameraMode, String> {
    match word {
        "photo" => Ok(CameraMode::Photo),
        "video" => Ok(CameraMode::Video),
        other => Err(format!("Unknown mode '{}' (photo, video)", other)),
    }
}

fn parse_command(line: &str) -> Result<Option<SessionCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();

    let parsed = match command {
        "open" => SessionCommand::Message(Message::Open(argument.map(parse_mode).transpose()?)),
        "close" => SessionCommand::Message(Message::Close),
        "flip" => SessionCommand::Message(Message::ToggleFacing),
        "front" => SessionCommand::Message(Message::SetFacing(Facing::Front)),
        "back" => SessionCommand::Message(Message::SetFacing(Facing::Back)),
        "mode" => {
            let mode = argument.ok_or("Usage: mode photo|video")?;
            SessionCommand::Message(Message::SetMode(parse_mode(mode)?))
        }
        "snap" => SessionCommand::Message(Message::CaptureStill),
        "record" => SessionCommand::Message(Message::StartRecording),
        "stop" => SessionCommand::Message(Message::StopRecording),
        "confirm" => SessionCommand::Message(Message::Confirm),
        "retake" => SessionCommand::Message(Message::Retake),
        "save" => SessionCommand::Message(Message::SaveLocally(argument.map(PathBuf::from))),
        "status" => SessionCommand::Status,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" => SessionCommand::Quit,
        other => return Err(format!("Unknown command '{}', try 'help'", other)),
    };
    Ok(Some(parsed))
}

fn print_help() {
    println!("Commands:");
    println!("  open [photo|video]   open the session");
    println!("  close                close the session and release the camera");
    println!("  flip | front | back  change camera");
    println!("  mode photo|video     change capture mode");
    println!("  snap                 take a photo");
    println!("  record | stop        start/stop recording");
    println!("  confirm | retake     accept or discard the capture");
    println!("  save [dir]           save the pending capture without confirming");
    println!("  status | help | quit");
}

fn print_status(controller: &CaptureController) {
    let session = controller.session();
    let preview = match controller.preview_state() {
        PreviewState::Closed => "closed",
        PreviewState::Acquiring => "waiting for camera",
        PreviewState::Live => "live",
        PreviewState::NoPreview => "no camera",
        PreviewState::Review => "reviewing",
    };
    let mut line = format!(
        "[{}] mode {}, {} camera",
        preview, session.mode, session.facing
    );
    if session.is_recording() {
        line.push_str(&format!(
            ", recording {:.1}s ({} chunks)",
            session.recording_state().elapsed().as_secs_f32(),
            session.recorder.chunk_count()
        ));
    }
    if let Some(artifact) = controller.pending_artifact() {
        line.push_str(&format!(
            ", pending {} ({}, {} bytes)",
            artifact.suggested_file_name,
            artifact.mime_type,
            artifact.size()
        ));
    }
    if let Some(error) = &session.last_error {
        line.push_str(&format!(", last error: {}", error));
    }
    println!("{}", line);
}

/// Interactive session driven by stdin lines
pub fn run_session(source: Option<&Path>, output: Option<PathBuf>) -> CliResult<()> {
    let backend = Arc::new(build_backend(source)?.with_chunk_interval(DEFAULT_CHUNK_INTERVAL));
    let config = Config::load();
    let dir = output.unwrap_or_else(|| config.save_directory());
    println!("Confirmed files go to {}", dir.display());
    print_help();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let mut controller =
            CaptureController::new(backend, config, ReportingSink(DirectorySink::new(dir)))?;
        controller.open(None)?;
        print_status(&controller);

        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    match parse_command(&line) {
                        Ok(None) => {}
                        Ok(Some(SessionCommand::Quit)) => break,
                        Ok(Some(SessionCommand::Help)) => print_help(),
                        Ok(Some(SessionCommand::Status)) => print_status(&controller),
                        Ok(Some(SessionCommand::Message(message))) => {
                            if let Err(e) = controller.update(message) {
                                println!("Error: {}", e);
                            }
                            print_status(&controller);
                        }
                        Err(e) => println!("{}", e),
                    }
                }
                Some(message) = controller.next_event() => {
                    let acquisition = matches!(message, Message::StreamAcquired { .. });
                    if let Err(e) = controller.update(message) {
                        println!("Error: {}", e);
                    }
                    if acquisition {
                        print_status(&controller);
                    }
                }
            }
        }

        controller.close();
        Ok::<_, Box<dyn Error>>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_open_with_mode() {
        let parsed = parse_command("open video").expect("parse");
        assert!(matches!(
            parsed,
            Some(SessionCommand::Message(Message::Open(Some(CameraMode::Video))))
        ));
    }

    #[test]
    fn test_parse_blank_line() {
        assert!(matches!(parse_command("   "), Ok(None)));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(parse_command("zoom 2").is_err());
        assert!(parse_command("mode").is_err());
        assert!(parse_command("mode panorama").is_err());
    }

    #[test]
    fn test_parse_save_directory() {
        let parsed = parse_command("save /tmp/out").expect("parse");
        assert!(matches!(
            parsed,
            Some(SessionCommand::Message(Message::SaveLocally(Some(ref dir)))) if dir == Path::new("/tmp/out")
        ));
    }
}
