use livevideo::*;

#[test]
fn test_registry_config_defaults() {
    let config = RegistryConfig::default();
    assert_eq!(config.max_streams(), 8);
    assert_eq!(config.frame_log_interval(), 300);

    let config = config.with_max_streams(2).with_frame_log_interval(0);
    assert_eq!(config.max_streams(), 2);
    assert_eq!(config.frame_log_interval(), 0);
}

#[test]
fn test_url_parse() {
    let url = LiveVideoUrl::parse("LiveVideoId:12").unwrap();
    assert_eq!(url.index(), 12);
    assert_eq!(url.as_str(), "LiveVideoId:12");
    assert_eq!(url.to_string(), "LiveVideoId:12");

    // leading zeros name the same device and the same url
    let padded = LiveVideoUrl::parse("LiveVideoId:007").unwrap();
    assert_eq!(padded.index(), 7);
    assert_eq!(padded.as_str(), "LiveVideoId:7");
    assert_eq!(padded, LiveVideoUrl::parse("LiveVideoId:7").unwrap());
    assert_eq!(LiveVideoUrl::parse("LiveVideoId:00").unwrap().as_str(), "LiveVideoId:0");
}

#[test]
fn test_url_parse_rejects_malformed() {
    for url in ["LiveVideoId:+1", "LiveVideoId:1.0", "LiveVideoId:0x1", "LiveVideoId:2147483648"] {
        assert!(
            matches!(LiveVideoUrl::parse(url), Err(CameraError::InvalidUrl(_))),
            "{url} should be rejected"
        );
    }
    assert_eq!(
        LiveVideoUrl::parse("LiveVideoId:2147483647").unwrap().index(),
        i32::MAX as usize
    );
}

#[test]
fn test_stream_request_defaults() {
    let request = StreamRequest::new(0, 0, 720, 0.0).unwrap();
    assert_eq!(request.size_or(1280, 480), (1280, 720));
    assert_eq!(request.frequency_or(30.0), 30.0);

    let request = StreamRequest::new(1, 640, 480, 15.0).unwrap();
    assert_eq!(request.size_or(1280, 720), (640, 480));
    assert_eq!(request.frequency_or(30.0), 15.0);

    assert!(StreamRequest::new(0, 0, 0, f32::INFINITY).is_err());
}

#[test]
fn test_synthetic_config_builder() {
    let config = SyntheticConfig::default();
    assert_eq!(config.device_count(), 2);
    assert_eq!((config.width(), config.height()), (1280, 720));
    assert_eq!(config.frequency(), 30.0);
    assert_eq!(config.format(), PixelFormat::Nv21);

    let config = config
        .with_device_count(4)
        .with_size(640, 480)
        .with_frequency(60.0)
        .with_format(PixelFormat::Yuyv)
        .with_horizontal_fov(1.2);
    assert_eq!(config.device_count(), 4);
    assert_eq!((config.width(), config.height()), (640, 480));
    assert_eq!(config.frequency(), 60.0);
    assert_eq!(config.format(), PixelFormat::Yuyv);
    assert_eq!(config.horizontal_fov(), 1.2);
}

#[test]
fn test_synthetic_config_ignores_invalid_frequency() {
    let config = SyntheticConfig::default().with_frequency(f32::NAN);
    assert_eq!(config.frequency(), 30.0);

    let config = config
        .with_frequency(60.0)
        .with_frequency(f32::INFINITY)
        .with_frequency(0.0)
        .with_frequency(-5.0);
    assert_eq!(config.frequency(), 60.0);
}
