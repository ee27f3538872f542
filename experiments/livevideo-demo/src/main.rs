use {
    livevideo::{CameraRegistry, CaptureBackend, FrameView, RegistryConfig, SyntheticBackend, SyntheticConfig},
    std::{
        collections::HashMap,
        sync::{Arc, Mutex},
        time::Duration,
    },
};

const RENDER_HZ: u64 = 60;

/// Per-stream frame counts, as a renderer would consume them.
#[derive(Default)]
struct FrameCounter {
    frames: Mutex<HashMap<i32, (u64, usize)>>,
}

impl FrameCounter {
    fn on_frame(&self, frame: &FrameView<'_>) -> bool {
        let mut frames = self.frames.lock().unwrap_or_else(|e| e.into_inner());
        let entry = frames.entry(frame.id.as_host()).or_default();
        entry.0 += 1;
        entry.1 = frame.size_bytes();
        true
    }

    fn report(&self) {
        let frames = self.frames.lock().unwrap_or_else(|e| e.into_inner());
        let mut ids: Vec<_> = frames.keys().copied().collect();
        ids.sort();
        for id in ids {
            let (count, size) = frames[&id];
            println!("  stream {}: {} frames of {} bytes", id, count, size);
        }
    }
}

fn backend(use_v4l2: bool) -> Arc<dyn CaptureBackend> {
    #[cfg(feature = "v4l2")]
    if use_v4l2 {
        return Arc::new(livevideo::V4l2Backend::default());
    }
    if use_v4l2 {
        log::warn!("built without the v4l2 feature, using synthetic cameras");
    }
    Arc::new(SyntheticBackend::new(SyntheticConfig::default()))
}

/// Drive `update()` at the render rate for `duration`.
async fn render(registry: &CameraRegistry, duration: Duration) {
    let mut tick = tokio::time::interval(Duration::from_millis(1000 / RENDER_HZ));
    let ticks = duration.as_millis() as u64 * RENDER_HZ / 1000;
    for _ in 0..ticks {
        tick.tick().await;
        registry.update();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    base::init_stdout_logger();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let use_v4l2 = args.iter().any(|arg| arg == "--v4l2");
    let seconds = args
        .iter()
        .find_map(|arg| arg.parse::<u64>().ok())
        .unwrap_or(2);
    let phase = Duration::from_secs(seconds);

    let counter = Arc::new(FrameCounter::default());
    let sink = {
        let counter = Arc::clone(&counter);
        move |frame: &FrameView<'_>| counter.on_frame(frame)
    };
    let backend = backend(use_v4l2);
    let devices = backend.device_count();
    let registry = CameraRegistry::new(backend, Arc::new(sink), RegistryConfig::default());

    println!("LiveVideo demo: {} devices", devices);
    let mut ids = Vec::new();
    for index in 0..devices {
        ids.push(registry.create(&format!("LiveVideoId:{index}"), 1280, 720, 30.0)?);
    }

    // the deferred open happens on the render tick
    render(&registry, Duration::from_millis(100)).await;
    for id in &ids {
        if let Err(error) = registry.start(*id) {
            log::error!("cannot start {}: {}", id, error);
        }
    }
    render(&registry, phase).await;
    println!("foreground:");
    counter.report();

    println!("entering background");
    registry.release_all_resources();
    render(&registry, phase / 2).await;

    println!("back in foreground");
    registry.recover_all_resources();
    render(&registry, Duration::from_millis(100)).await;
    for id in &ids {
        if let Err(error) = registry.start(*id) {
            log::error!("cannot restart {}: {}", id, error);
        }
    }
    render(&registry, phase).await;
    println!("after recovery:");
    counter.report();

    for id in ids {
        if let Some(stats) = registry.frame_stats(id) {
            println!("  {}: {:?}", id, stats);
        }
        registry.release(id)?;
    }
    Ok(())
}
