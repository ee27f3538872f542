mod common;

use {common::*, livevideo::*};

#[test]
fn test_start_before_update_fails_cleanly() {
    let (backend, _sink, registry) = recording_registry(1);
    let id = registry.create("LiveVideoId:0", 0, 0, 0.0).unwrap();

    assert!(matches!(registry.start(id), Err(CameraError::NotInitialized(_))));
    assert!(matches!(registry.pause(id), Err(CameraError::NotInitialized(_))));
    assert!(matches!(registry.stop(id), Err(CameraError::NotInitialized(_))));

    assert_eq!(registry.state(id), Some(ResourceState::Created));
    assert_eq!(backend.counters().opens(), 0);
    assert_eq!(backend.counters().starts(), 0);
}

#[test]
fn test_unknown_id_fails() {
    let (_backend, _sink, registry) = recording_registry(1);
    let id = registry.create("LiveVideoId:0", 0, 0, 0.0).unwrap();
    registry.release(id).unwrap();

    assert!(matches!(registry.start(id), Err(CameraError::UnknownId(_))));
    assert!(matches!(registry.pause(id), Err(CameraError::UnknownId(_))));
    assert!(matches!(registry.stop(id), Err(CameraError::UnknownId(_))));
    assert!(matches!(registry.force_restart(id), Err(CameraError::UnknownId(_))));
}

#[test]
fn test_start_is_idempotent() {
    let (backend, _sink, registry) = recording_registry(1);
    let id = registry.create("LiveVideoId:0", 0, 0, 0.0).unwrap();
    registry.update();

    registry.start(id).unwrap();
    registry.start(id).unwrap();

    assert_eq!(registry.state(id), Some(ResourceState::Started));
    assert_eq!(backend.counters().starts(), 1);
}

#[test]
fn test_pause_and_stop_are_idempotent() {
    let (backend, _sink, registry) = recording_registry(1);
    let id = registry.create("LiveVideoId:0", 0, 0, 0.0).unwrap();
    registry.update();
    registry.start(id).unwrap();

    registry.pause(id).unwrap();
    registry.pause(id).unwrap();
    assert_eq!(registry.state(id), Some(ResourceState::Paused));
    assert_eq!(backend.counters().stops(), 1);

    registry.stop(id).unwrap();
    registry.stop(id).unwrap();
    assert_eq!(registry.state(id), Some(ResourceState::Stopped));
    assert_eq!(backend.counters().stops(), 2);
}

#[test]
fn test_pause_and_stop_on_initialized_are_no_ops() {
    let (backend, _sink, registry) = recording_registry(1);
    let id = registry.create("LiveVideoId:0", 0, 0, 0.0).unwrap();
    registry.update();

    registry.pause(id).unwrap();
    registry.stop(id).unwrap();

    assert_eq!(registry.state(id), Some(ResourceState::Initialized));
    assert_eq!(backend.counters().stops(), 0);
}

#[test]
fn test_restart_after_pause_and_stop() {
    let (backend, _sink, registry) = recording_registry(1);
    let id = registry.create("LiveVideoId:0", 0, 0, 0.0).unwrap();
    registry.update();

    registry.start(id).unwrap();
    registry.pause(id).unwrap();
    registry.start(id).unwrap();
    assert_eq!(registry.state(id), Some(ResourceState::Started));

    registry.stop(id).unwrap();
    registry.start(id).unwrap();
    assert_eq!(registry.state(id), Some(ResourceState::Started));

    assert_eq!(backend.counters().starts(), 3);
    // stopping keeps the device open
    assert_eq!(backend.counters().opens(), 1);
    assert_eq!(backend.counters().closes(), 0);
}

#[test]
fn test_paused_stream_can_be_stopped() {
    let (_backend, _sink, registry) = recording_registry(1);
    let id = registry.create("LiveVideoId:0", 0, 0, 0.0).unwrap();
    registry.update();
    registry.start(id).unwrap();
    registry.pause(id).unwrap();

    registry.stop(id).unwrap();
    assert_eq!(registry.state(id), Some(ResourceState::Stopped));

    // stopped is not re-entered as paused
    registry.pause(id).unwrap();
    assert_eq!(registry.state(id), Some(ResourceState::Stopped));
}

#[test]
fn test_scenario_create_update_start_stop_release() {
    let (backend, sink, registry) = recording_registry(1);

    let id = registry.create("LiveVideoId:0", 1280, 720, 0.0).unwrap();
    assert_eq!(id.as_host(), 0);
    registry.update();
    registry.start(id).unwrap();

    assert_eq!(backend.deliver(0, 7), Some(true));
    assert_eq!(sink.count(id), 1);
    assert_eq!(sink.last(), Some((id, 1280 * 720 * 3 / 2, 7)));

    registry.stop(id).unwrap();
    registry.release(id).unwrap();
    assert!(registry.release(id).is_err());
    assert_eq!(backend.counters().closes(), 1);
}
