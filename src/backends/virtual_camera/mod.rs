// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! Software cameras that behave like a platform media subsystem: a front and a
//! back camera plus a microphone, permission prompts that can be refused, and
//! requests that can be held in flight. Used by the CLI when no hardware is
//! wired up and by the tests to observe the stream discipline.
//!
//! # Recording
//!
//! Without a chunk interval a recording produces no data of its own; chunks are
//! whatever the host injects. With an interval the stream emits the WebM EBML
//! magic, then one JPEG-encoded frame per interval, then a final frame when the
//! recording ends. The result is tagged as a clip but is not a playable WebM
//! file.

mod file_source;

pub use file_source::{FrameSource, load_image_as_frame, render_test_pattern};

use crate::backends::camera::types::{
    BackendError, BackendResult, CameraDevice, CameraFrame, ChunkSender, Facing,
    StreamConstraints, TrackKind,
};
use crate::backends::camera::{LiveStream, MediaBackend};
use crate::constants::virtual_camera::{FRAME_HEIGHT, FRAME_WIDTH, WEBM_HEADER};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Counters describing what the backend has handed out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtualCameraStats {
    /// Stream requests issued
    pub requests: usize,
    /// Streams stopped
    pub stops: usize,
    /// Streams currently live
    pub live: usize,
    /// Highest number of simultaneously live streams
    pub max_live: usize,
}

#[derive(Default)]
struct StatsInner {
    requests: AtomicUsize,
    stops: AtomicUsize,
    live: AtomicUsize,
    max_live: AtomicUsize,
    log: Mutex<Vec<StreamConstraints>>,
}

impl StatsInner {
    fn opened(&self) {
        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(live, Ordering::SeqCst);
    }

    fn stopped(&self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Holds stream requests in flight until admitted
///
/// Models a permission prompt the user has not answered yet.
#[derive(Debug, Clone)]
pub struct RequestGate(Arc<Semaphore>);

impl RequestGate {
    /// Let `count` waiting (or future) requests resolve
    pub fn admit(&self, count: usize) {
        self.0.add_permits(count);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Software media backend
pub struct VirtualCameraBackend {
    devices: Vec<CameraDevice>,
    has_microphone: bool,
    source: FrameSource,
    chunk_interval: Option<Duration>,
    permission_denied: AtomicBool,
    gate: Mutex<Option<Arc<Semaphore>>>,
    stats: Arc<StatsInner>,
}

impl VirtualCameraBackend {
    /// Front and back test-pattern cameras with a microphone
    pub fn new() -> Self {
        Self {
            devices: vec![
                CameraDevice {
                    name: "Virtual Front Camera".to_string(),
                    path: "virtual:front".to_string(),
                    facing: Some(Facing::Front),
                },
                CameraDevice {
                    name: "Virtual Back Camera".to_string(),
                    path: "virtual:back".to_string(),
                    facing: Some(Facing::Back),
                },
            ],
            has_microphone: true,
            source: FrameSource::TestPattern {
                width: FRAME_WIDTH,
                height: FRAME_HEIGHT,
            },
            chunk_interval: None,
            permission_denied: AtomicBool::new(false),
            gate: Mutex::new(None),
            stats: Arc::new(StatsInner::default()),
        }
    }

    /// Replace the device list
    pub fn with_devices(mut self, devices: Vec<CameraDevice>) -> Self {
        self.devices = devices;
        self
    }

    /// Remove the microphone, so video requests with audio fail
    pub fn without_microphone(mut self) -> Self {
        self.has_microphone = false;
        self
    }

    /// Use a custom frame source
    pub fn with_source(mut self, source: FrameSource) -> Self {
        self.source = source;
        self
    }

    /// Serve every frame from an image file
    pub fn with_image_source(self, path: &Path) -> BackendResult<Self> {
        let frame = load_image_as_frame(path)?;
        Ok(self.with_source(FrameSource::Still(Arc::new(frame))))
    }

    /// Emit a chunk every `interval` while recording
    pub fn with_chunk_interval(mut self, interval: Duration) -> Self {
        self.chunk_interval = Some(interval);
        self
    }

    /// Refuse (or allow again) every future request
    pub fn deny_permission(&self, denied: bool) {
        self.permission_denied.store(denied, Ordering::SeqCst);
    }

    /// Hold future requests until admitted through the returned gate
    pub fn hold_requests(&self) -> RequestGate {
        let semaphore = Arc::new(Semaphore::new(0));
        *lock(&self.gate) = Some(Arc::clone(&semaphore));
        RequestGate(semaphore)
    }

    /// Stop holding requests; waiting ones resolve immediately
    pub fn open_requests(&self) {
        if let Some(semaphore) = lock(&self.gate).take() {
            semaphore.close();
        }
    }

    pub fn stats(&self) -> VirtualCameraStats {
        VirtualCameraStats {
            requests: self.stats.requests.load(Ordering::SeqCst),
            stops: self.stats.stops.load(Ordering::SeqCst),
            live: self.stats.live.load(Ordering::SeqCst),
            max_live: self.stats.max_live.load(Ordering::SeqCst),
        }
    }

    /// Every request in the order it was issued
    pub fn request_log(&self) -> Vec<StreamConstraints> {
        lock(&self.stats.log).clone()
    }

    fn select_device(&self, constraints: &StreamConstraints) -> BackendResult<CameraDevice> {
        if let Some(device) = self
            .devices
            .iter()
            .find(|d| d.facing == Some(constraints.facing))
        {
            return Ok(device.clone());
        }

        if constraints.exact_facing {
            return Err(BackendError::DeviceNotFound(format!(
                "no {} camera",
                constraints.facing
            )));
        }

        self.devices
            .first()
            .cloned()
            .ok_or_else(|| BackendError::DeviceNotFound("no cameras".to_string()))
    }
}

impl Default for VirtualCameraBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaBackend for VirtualCameraBackend {
    fn name(&self) -> &str {
        "virtual"
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        self.devices.clone()
    }

    fn request_stream(
        &self,
        constraints: StreamConstraints,
    ) -> BoxFuture<'static, BackendResult<Box<dyn LiveStream>>> {
        self.stats.requests.fetch_add(1, Ordering::SeqCst);
        lock(&self.stats.log).push(constraints);

        let gate = lock(&self.gate).clone();
        let denied = self.permission_denied.load(Ordering::SeqCst);
        let device = self.select_device(&constraints);
        let has_microphone = self.has_microphone;
        let source = self.source.clone();
        let chunk_interval = self.chunk_interval;
        let stats = Arc::clone(&self.stats);

        async move {
            if let Some(gate) = gate {
                // A closed gate means requests are no longer held
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }

            if denied {
                return Err(BackendError::PermissionDenied);
            }
            let device = device?;
            if constraints.audio && !has_microphone {
                return Err(BackendError::DeviceNotFound("no microphone".to_string()));
            }

            info!(device = %device.name, audio = constraints.audio, "Virtual stream started");
            stats.opened();

            let stream: Box<dyn LiveStream> = Box::new(VirtualStream {
                label: device.name,
                facing: device.facing.unwrap_or(constraints.facing),
                tracks: constraints.tracks(),
                source,
                sequence: 0,
                live: true,
                chunk_interval,
                recording: None,
                stats,
            });
            Ok(stream)
        }
        .boxed()
    }
}

/// Encoder state of a recording in progress
struct ActiveRecording {
    /// Shared with the timed emitter; taken (set to None) when the recording ends
    sink: Arc<Mutex<Option<ChunkSender>>>,
    emitter: Option<tokio::task::JoinHandle<()>>,
}

struct VirtualStream {
    label: String,
    facing: Facing,
    tracks: Vec<TrackKind>,
    source: FrameSource,
    sequence: u64,
    live: bool,
    chunk_interval: Option<Duration>,
    recording: Option<ActiveRecording>,
    stats: Arc<StatsInner>,
}

impl VirtualStream {
    fn next_frame(&mut self) -> CameraFrame {
        self.sequence += 1;
        self.source.render(self.facing, self.sequence)
    }
}

impl LiveStream for VirtualStream {
    fn label(&self) -> &str {
        &self.label
    }

    fn tracks(&self) -> Vec<TrackKind> {
        self.tracks.clone()
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn grab_frame(&mut self) -> BackendResult<CameraFrame> {
        if !self.live {
            return Err(BackendError::StreamEnded);
        }
        Ok(self.next_frame())
    }

    fn begin_recording(&mut self, sink: ChunkSender) -> BackendResult<()> {
        if !self.live {
            return Err(BackendError::StreamEnded);
        }
        if self.recording.is_some() {
            return Err(BackendError::RecordingInProgress);
        }

        let sink = Arc::new(Mutex::new(Some(sink)));
        let mut emitter = None;

        if let Some(interval) = self.chunk_interval {
            let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
                BackendError::Other("timed recording needs a tokio runtime".to_string())
            })?;

            if let Some(sink) = lock(&sink).as_ref() {
                sink.send(WEBM_HEADER.to_vec());
            }

            let task_sink = Arc::clone(&sink);
            let source = self.source.clone();
            let facing = self.facing;
            let start = self.sequence;
            emitter = Some(runtime.spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.tick().await;
                let mut sequence = start;
                loop {
                    ticker.tick().await;
                    sequence += 1;
                    let chunk = match encode_chunk(&source.render(facing, sequence)) {
                        Ok(chunk) => chunk,
                        Err(e) => {
                            warn!(error = %e, "Virtual encoder failed, stopping emitter");
                            break;
                        }
                    };
                    // Holding the lock while sending keeps this chunk ahead of the
                    // final flush in end_recording
                    let delivered = {
                        let guard = lock(&task_sink);
                        match guard.as_ref() {
                            Some(sink) => sink.send(chunk),
                            None => false,
                        }
                    };
                    if !delivered {
                        break;
                    }
                }
            }));
        }

        debug!(device = %self.label, "Virtual recording started");
        self.recording = Some(ActiveRecording { sink, emitter });
        Ok(())
    }

    fn end_recording(&mut self) -> BackendResult<()> {
        let recording = self
            .recording
            .take()
            .ok_or(BackendError::NoRecordingInProgress)?;

        let sink = lock(&recording.sink).take();
        if let Some(emitter) = recording.emitter {
            emitter.abort();
            if let Some(sink) = sink {
                let frame = self.next_frame();
                let chunk = encode_chunk(&frame)?;
                sink.send(chunk);
            }
        }

        debug!(device = %self.label, "Virtual recording finished");
        Ok(())
    }

    fn stop(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        if let Some(recording) = self.recording.take() {
            lock(&recording.sink).take();
            if let Some(emitter) = recording.emitter {
                emitter.abort();
            }
        }
        self.stats.stopped();
        info!(device = %self.label, "Virtual stream stopped");
    }
}

impl Drop for VirtualStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Small JPEG of a frame, standing in for encoder output
fn encode_chunk(frame: &CameraFrame) -> BackendResult<Vec<u8>> {
    let rgba = image::RgbaImage::from_raw(frame.width, frame.height, frame.data.to_vec())
        .ok_or_else(|| BackendError::Other("frame buffer size mismatch".to_string()))?;
    let thumbnail = image::imageops::thumbnail(&rgba, 160, 90);
    let rgb = image::DynamicImage::ImageRgba8(thumbnail).to_rgb8();

    let mut buffer = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, 60);
    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| BackendError::Other(format!("chunk encoding failed: {}", e)))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prefers_matching_facing() {
        let backend = VirtualCameraBackend::new();
        let stream = backend
            .request_stream(StreamConstraints::new(Facing::Back, false))
            .await
            .expect("stream");
        assert_eq!(stream.label(), "Virtual Back Camera");
        assert_eq!(stream.tracks(), vec![TrackKind::Video]);
    }

    #[tokio::test]
    async fn test_falls_back_unless_exact() {
        let backend = VirtualCameraBackend::new().with_devices(vec![CameraDevice {
            name: "Laptop Camera".to_string(),
            path: "virtual:0".to_string(),
            facing: None,
        }]);

        let stream = backend
            .request_stream(StreamConstraints::new(Facing::Back, false))
            .await
            .expect("fallback stream");
        assert_eq!(stream.label(), "Laptop Camera");

        let mut exact = StreamConstraints::new(Facing::Back, false);
        exact.exact_facing = true;
        let result = backend.request_stream(exact).await;
        assert!(matches!(result, Err(BackendError::DeviceNotFound(_))));
    }

    #[tokio::test]
    async fn test_audio_requires_microphone() {
        let backend = VirtualCameraBackend::new().without_microphone();
        let result = backend
            .request_stream(StreamConstraints::new(Facing::Front, true))
            .await;
        assert!(matches!(result, Err(BackendError::DeviceNotFound(_))));
        assert_eq!(backend.stats().live, 0);
    }

    #[tokio::test]
    async fn test_stop_and_drop_count_once() {
        let backend = VirtualCameraBackend::new();
        let mut stream = backend
            .request_stream(StreamConstraints::new(Facing::Front, false))
            .await
            .expect("stream");
        assert_eq!(backend.stats().live, 1);

        stream.stop();
        assert!(!stream.is_live());
        assert!(matches!(stream.grab_frame(), Err(BackendError::StreamEnded)));
        drop(stream);

        let stats = backend.stats();
        assert_eq!(stats.live, 0);
        assert_eq!(stats.stops, 1);
    }

    #[tokio::test]
    async fn test_gate_holds_request() {
        let backend = VirtualCameraBackend::new();
        let gate = backend.hold_requests();
        let request = tokio::spawn(
            backend.request_stream(StreamConstraints::new(Facing::Front, false)),
        );

        tokio::task::yield_now().await;
        assert!(!request.is_finished());
        assert_eq!(backend.stats().live, 0);

        gate.admit(1);
        let stream = request.await.expect("join").expect("stream");
        assert!(stream.is_live());
    }

    #[tokio::test]
    async fn test_timed_recording_emits_header_then_frames() {
        let backend = VirtualCameraBackend::new().with_chunk_interval(Duration::from_millis(5));
        let mut stream = backend
            .request_stream(StreamConstraints::new(Facing::Front, true))
            .await
            .expect("stream");

        let chunks = Arc::new(Mutex::new(Vec::new()));
        let collected = Arc::clone(&chunks);
        stream
            .begin_recording(ChunkSender::new(move |chunk| {
                lock(&collected).push(chunk);
                true
            }))
            .expect("begin");
        tokio::time::sleep(Duration::from_millis(30)).await;
        stream.end_recording().expect("end");

        let chunks = lock(&chunks);
        assert!(chunks.len() >= 2);
        assert_eq!(chunks[0], WEBM_HEADER.to_vec());
        // Every frame chunk is a JPEG
        for chunk in chunks.iter().skip(1) {
            assert_eq!(&chunk[..2], &[0xFF, 0xD8]);
        }
    }

    #[tokio::test]
    async fn test_end_without_begin_is_rejected() {
        let backend = VirtualCameraBackend::new();
        let mut stream = backend
            .request_stream(StreamConstraints::new(Facing::Front, true))
            .await
            .expect("stream");
        assert!(matches!(
            stream.end_recording(),
            Err(BackendError::NoRecordingInProgress)
        ));
    }
}
