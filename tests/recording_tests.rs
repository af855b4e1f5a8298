// SPDX-License-Identifier: MPL-2.0

//! Integration tests for clip recording

use camera_capture::backends::camera::types::StreamConstraints;
use camera_capture::backends::virtual_camera::VirtualCameraBackend;
use camera_capture::constants::virtual_camera::WEBM_HEADER;
use camera_capture::{
    ArtifactKind, CameraMode, CaptureController, CaptureError, CapturedFile, Config,
    DeviceAccessError, Facing, Message, PreviewState,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Delivered = Arc<Mutex<Vec<CapturedFile>>>;

fn controller_with(backend: &Arc<VirtualCameraBackend>, config: Config) -> (CaptureController, Delivered) {
    let delivered: Delivered = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&delivered);
    let controller = CaptureController::new(backend.clone(), config, move |file: CapturedFile| {
        sink.lock().unwrap().push(file);
    })
    .unwrap();
    (controller, delivered)
}

async fn recording_controller(backend: &Arc<VirtualCameraBackend>) -> (CaptureController, Delivered) {
    let (mut controller, delivered) = controller_with(backend, Config::default());
    controller.open(Some(CameraMode::Video)).unwrap();
    controller.wait_for_stream().await.unwrap();
    (controller, delivered)
}

#[tokio::test]
async fn test_three_chunks_make_a_45_byte_clip() {
    let backend = Arc::new(VirtualCameraBackend::new());
    let (mut controller, delivered) = recording_controller(&backend).await;
    assert_eq!(
        backend.request_log(),
        vec![StreamConstraints::new(Facing::Front, true)]
    );

    let recording = controller.start_recording().unwrap();
    assert!(controller.session().is_recording());

    let c1 = vec![1u8; 10];
    let c2 = vec![2u8; 20];
    let c3 = vec![3u8; 15];
    let events = controller.event_sender();
    for chunk in [&c1, &c2, &c3] {
        events
            .send(Message::ChunkAvailable {
                recording,
                data: chunk.clone(),
            })
            .unwrap();
    }

    controller.stop_recording().unwrap();
    assert!(!controller.session().is_recording());
    assert_eq!(controller.preview_state(), PreviewState::Review);

    let artifact = controller.pending_artifact().unwrap();
    assert_eq!(artifact.kind, ArtifactKind::Clip);
    assert_eq!(artifact.mime_type, "video/webm");
    assert_eq!(artifact.size(), 45);
    assert_eq!(artifact.payload, [c1, c2, c3].concat());
    assert_eq!(artifact.chunk_count, Some(3));

    controller.confirm().unwrap();
    let delivered = delivered.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].name, "captured_video.webm");
    assert_eq!(delivered[0].data.len(), 45);
}

#[tokio::test]
async fn test_direct_appends_keep_order() {
    let backend = Arc::new(VirtualCameraBackend::new());
    let (mut controller, _) = recording_controller(&backend).await;

    controller.start_recording().unwrap();
    controller.append_chunk(b"ab".to_vec()).unwrap();
    controller.append_chunk(b"cd".to_vec()).unwrap();
    controller.append_chunk(b"e".to_vec()).unwrap();
    controller.stop_recording().unwrap();

    assert_eq!(controller.pending_artifact().unwrap().payload, b"abcde".to_vec());
}

#[tokio::test]
async fn test_messages_queued_during_stop_run_afterwards() {
    let backend = Arc::new(VirtualCameraBackend::new());
    let (mut controller, _) = recording_controller(&backend).await;
    let events = controller.event_sender();

    let recording = controller.start_recording().unwrap();
    events.send(Message::Retake).unwrap();
    events
        .send(Message::ChunkAvailable {
            recording,
            data: vec![5, 6],
        })
        .unwrap();
    controller.stop_recording().unwrap();

    // The chunk behind the retake still made it into the clip
    assert_eq!(controller.pending_artifact().unwrap().payload, vec![5, 6]);

    assert_eq!(controller.process_pending(), 1);
    assert!(controller.pending_artifact().is_none());
    controller.wait_for_stream().await.unwrap();
    assert_eq!(controller.preview_state(), PreviewState::Live);
}

#[tokio::test]
async fn test_recording_state_machine_rejects_misuse() {
    let backend = Arc::new(VirtualCameraBackend::new());
    let (mut controller, _) = recording_controller(&backend).await;

    assert_eq!(
        controller.stop_recording(),
        Err(CaptureError::NoActiveRecording)
    );
    controller.start_recording().unwrap();
    assert_eq!(
        controller.start_recording(),
        Err(CaptureError::RecordingInProgress)
    );
    assert_eq!(
        controller.update(Message::StartRecording),
        Err(CaptureError::RecordingInProgress)
    );
}

#[tokio::test]
async fn test_recording_requires_video_mode() {
    let backend = Arc::new(VirtualCameraBackend::new());
    let (mut controller, _) = controller_with(&backend, Config::default());
    controller.open(Some(CameraMode::Photo)).unwrap();
    controller.wait_for_stream().await.unwrap();

    assert_eq!(
        controller.start_recording(),
        Err(CaptureError::WrongMode {
            required: CameraMode::Video
        })
    );
    assert!(!controller.session().is_recording());
}

#[tokio::test]
async fn test_chunk_from_previous_recording_is_dropped() {
    let backend = Arc::new(VirtualCameraBackend::new());
    let (mut controller, _) = recording_controller(&backend).await;
    let events = controller.event_sender();

    let first = controller.start_recording().unwrap();
    controller.append_chunk(vec![1]).unwrap();
    controller.stop_recording().unwrap();
    controller.retake().unwrap();
    controller.wait_for_stream().await.unwrap();

    let second = controller.start_recording().unwrap();
    assert_ne!(first, second);
    events
        .send(Message::ChunkAvailable {
            recording: first,
            data: vec![9, 9, 9],
        })
        .unwrap();
    events
        .send(Message::ChunkAvailable {
            recording: second,
            data: vec![7],
        })
        .unwrap();
    controller.stop_recording().unwrap();

    assert_eq!(controller.pending_artifact().unwrap().payload, vec![7]);
}

#[tokio::test]
async fn test_empty_recording_is_an_encoding_error() {
    let backend = Arc::new(VirtualCameraBackend::new());
    let (mut controller, _) = recording_controller(&backend).await;

    controller.start_recording().unwrap();
    assert!(matches!(
        controller.stop_recording(),
        Err(CaptureError::Encoding(_))
    ));
    assert!(!controller.session().is_recording());
    assert!(controller.pending_artifact().is_none());
    assert_eq!(controller.preview_state(), PreviewState::Live);
}

#[tokio::test]
async fn test_close_mid_recording_resets_everything() {
    let backend = Arc::new(VirtualCameraBackend::new());
    let (mut controller, delivered) = recording_controller(&backend).await;

    let recording = controller.start_recording().unwrap();
    controller.append_chunk(vec![1, 2, 3]).unwrap();
    controller.close();

    assert!(!controller.session().is_recording());
    assert!(controller.pending_artifact().is_none());
    assert!(controller.current_stream().is_none());
    assert_eq!(backend.stats().live, 0);

    // Late chunk for the aborted recording goes nowhere
    controller
        .event_sender()
        .send(Message::ChunkAvailable {
            recording,
            data: vec![4],
        })
        .unwrap();
    assert_eq!(controller.process_pending(), 1);
    assert_eq!(controller.session().recorder.chunk_count(), 0);
    assert!(delivered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_facing_change_mid_recording_aborts_it() {
    let backend = Arc::new(VirtualCameraBackend::new());
    let (mut controller, _) = recording_controller(&backend).await;

    controller.start_recording().unwrap();
    controller.append_chunk(vec![1]).unwrap();
    controller.toggle_facing().unwrap();

    assert!(!controller.session().is_recording());
    controller.wait_for_stream().await.unwrap();
    assert_eq!(backend.stats().max_live, 1);
    assert_eq!(
        controller.stop_recording(),
        Err(CaptureError::NoActiveRecording)
    );
}

#[tokio::test]
async fn test_timed_backend_output_is_kept_verbatim() {
    let backend = Arc::new(VirtualCameraBackend::new().with_chunk_interval(Duration::from_millis(5)));
    let (mut controller, _) = recording_controller(&backend).await;

    controller.start_recording().unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    controller.process_pending();
    controller.stop_recording().unwrap();

    let artifact = controller.pending_artifact().unwrap();
    assert!(artifact.payload.starts_with(&WEBM_HEADER));
    // Header, at least the final flush
    assert!(artifact.chunk_count.unwrap() >= 2);
}

#[tokio::test]
async fn test_missing_microphone_is_a_device_error() {
    let backend = Arc::new(VirtualCameraBackend::new().without_microphone());
    let (mut controller, _) = controller_with(&backend, Config::default());

    controller.open(Some(CameraMode::Video)).unwrap();
    assert!(matches!(
        controller.wait_for_stream().await,
        Err(CaptureError::DeviceAccess(DeviceAccessError::NotFound(_)))
    ));
    assert!(controller.session().is_open);
    assert_eq!(controller.preview_state(), PreviewState::NoPreview);
}

#[tokio::test]
async fn test_video_without_audio_when_disabled() {
    let backend = Arc::new(VirtualCameraBackend::new().without_microphone());
    let config = Config {
        record_audio: false,
        ..Config::default()
    };
    let (mut controller, _) = controller_with(&backend, config);

    controller.open(Some(CameraMode::Video)).unwrap();
    controller.wait_for_stream().await.unwrap();
    assert_eq!(
        backend.request_log(),
        vec![StreamConstraints::new(Facing::Front, false)]
    );

    controller.start_recording().unwrap();
    controller.append_chunk(vec![0; 8]).unwrap();
    controller.stop_recording().unwrap();
    assert_eq!(controller.pending_artifact().unwrap().size(), 8);
}
