// SPDX-License-Identifier: MPL-2.0

//! Chunk accumulation for a single recording
//!
//! ```text
//! Idle ──start──▶ Recording ──finish──▶ Idle
//!                  │   ▲
//!                  └───┘ append (0..n)
//! ```

use crate::errors::{CaptureError, CaptureResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Identifies one recording; chunks are tagged with it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordingId(u64);

impl RecordingId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        RecordingId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for RecordingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "recording-{}", self.0)
    }
}

/// Recording state machine
#[derive(Debug, Default)]
pub enum RecordingState {
    /// Not recording
    #[default]
    Idle,
    /// Actively recording
    Recording {
        id: RecordingId,
        /// When recording started
        start_time: Instant,
        /// Chunks in arrival order
        chunks: Vec<Vec<u8>>,
    },
}

impl RecordingState {
    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingState::Recording { .. })
    }

    /// Get the elapsed recording duration
    pub fn elapsed(&self) -> Duration {
        match self {
            RecordingState::Idle => Duration::ZERO,
            RecordingState::Recording { start_time, .. } => start_time.elapsed(),
        }
    }
}

/// Bytes of a finished recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedClip {
    /// Every chunk, concatenated in arrival order
    pub data: Vec<u8>,
    pub chunk_count: usize,
    pub duration: Duration,
}

/// Accumulates the encoder's chunks for the active recording
#[derive(Debug, Default)]
pub struct ClipRecorder {
    state: RecordingState,
}

impl ClipRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RecordingState {
        &self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    /// Id of the active recording
    pub fn active_id(&self) -> Option<RecordingId> {
        match &self.state {
            RecordingState::Idle => None,
            RecordingState::Recording { id, .. } => Some(*id),
        }
    }

    /// Number of chunks received so far
    pub fn chunk_count(&self) -> usize {
        match &self.state {
            RecordingState::Idle => 0,
            RecordingState::Recording { chunks, .. } => chunks.len(),
        }
    }

    /// Enter the recording state with an empty chunk list
    pub fn start(&mut self) -> CaptureResult<RecordingId> {
        if self.state.is_recording() {
            return Err(CaptureError::RecordingInProgress);
        }
        let id = RecordingId::next();
        self.state = RecordingState::Recording {
            id,
            start_time: Instant::now(),
            chunks: Vec::new(),
        };
        info!(recording = %id, "Recording started");
        Ok(id)
    }

    /// Append a chunk to the active recording
    pub fn append_chunk(&mut self, data: Vec<u8>) -> CaptureResult<()> {
        match &mut self.state {
            RecordingState::Idle => Err(CaptureError::NoActiveRecording),
            RecordingState::Recording { id, chunks, .. } => {
                debug!(recording = %id, index = chunks.len(), size = data.len(), "Chunk appended");
                chunks.push(data);
                Ok(())
            }
        }
    }

    /// Append a chunk only if it belongs to the active recording
    ///
    /// Returns false when the chunk was dropped.
    pub fn append_for(&mut self, recording: RecordingId, data: Vec<u8>) -> bool {
        if self.active_id() != Some(recording) {
            debug!(recording = %recording, size = data.len(), "Dropping chunk for inactive recording");
            return false;
        }
        self.append_chunk(data).is_ok()
    }

    /// Leave the recording state and join the chunks
    ///
    /// An empty recording is an encoding failure; the recorder is Idle either way.
    pub fn finish(&mut self) -> CaptureResult<RecordedClip> {
        let RecordingState::Recording {
            id,
            start_time,
            chunks,
        } = std::mem::take(&mut self.state)
        else {
            return Err(CaptureError::NoActiveRecording);
        };

        let duration = start_time.elapsed();
        if chunks.is_empty() {
            return Err(CaptureError::Encoding(format!(
                "{} produced no data",
                id
            )));
        }

        let chunk_count = chunks.len();
        let data = chunks.concat();
        info!(
            recording = %id,
            chunks = chunk_count,
            size = data.len(),
            duration_ms = duration.as_millis() as u64,
            "Recording finished"
        );
        Ok(RecordedClip {
            data,
            chunk_count,
            duration,
        })
    }

    /// Drop the active recording and every chunk it collected
    pub fn abort(&mut self) {
        if let RecordingState::Recording { id, chunks, .. } = std::mem::take(&mut self.state) {
            info!(recording = %id, discarded = chunks.len(), "Recording aborted");
        }
    }
}
