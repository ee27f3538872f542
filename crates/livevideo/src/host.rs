//! Sentinel-returning facade for hosts that speak integers and booleans.
//!
//! Every failure is logged and reported as `-1` or `false`; nothing here panics.

use {crate::*, std::sync::Arc};

/// Host-facing wrapper around a shared `CameraRegistry`.
#[derive(Clone)]
pub struct LiveVideoHost {
    registry: Arc<CameraRegistry>,
}

impl LiveVideoHost {
    pub fn new(registry: Arc<CameraRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<CameraRegistry> {
        &self.registry
    }

    /// Returns the new id, or -1.
    pub fn create(
        &self,
        url: &str,
        preferred_width: i32,
        preferred_height: i32,
        preferred_frequency: f32,
    ) -> i32 {
        let (Ok(width), Ok(height)) = (u32::try_from(preferred_width), u32::try_from(preferred_height)) else {
            log::warn!(
                "create {}: negative preferred size {}x{}",
                url,
                preferred_width,
                preferred_height
            );
            return -1;
        };
        match self.registry.create(url, width, height, preferred_frequency) {
            Ok(id) => id.as_host(),
            Err(error) => {
                log::warn!("create {}: {}", url, error);
                -1
            }
        }
    }

    pub fn start(&self, id: i32) -> bool {
        self.apply("start", id, CameraRegistry::start)
    }

    pub fn pause(&self, id: i32) -> bool {
        self.apply("pause", id, CameraRegistry::pause)
    }

    pub fn stop(&self, id: i32) -> bool {
        self.apply("stop", id, CameraRegistry::stop)
    }

    pub fn release(&self, id: i32) -> bool {
        self.apply("release", id, CameraRegistry::release)
    }

    pub fn force_restart(&self, id: i32) -> bool {
        self.apply("force_restart", id, CameraRegistry::force_restart)
    }

    pub fn update(&self) {
        self.registry.update();
    }

    pub fn release_all_resources(&self) {
        self.registry.release_all_resources();
    }

    pub fn recover_all_resources(&self) {
        self.registry.recover_all_resources();
    }

    fn apply(
        &self,
        operation: &str,
        id: i32,
        f: impl FnOnce(&CameraRegistry, ObjectId) -> Result<(), CameraError>,
    ) -> bool {
        let Some(object_id) = ObjectId::from_raw(id) else {
            log::warn!("{}: invalid id {}", operation, id);
            return false;
        };
        match f(self.registry.as_ref(), object_id) {
            Ok(()) => true,
            Err(error) => {
                log::warn!("{} {}: {}", operation, object_id, error);
                false
            }
        }
    }
}

impl std::fmt::Debug for LiveVideoHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveVideoHost")
            .field("streams", &self.registry.len())
            .finish()
    }
}

/// Adapt a host frame callback taking
/// `(id, buffer, width, height, format, horizontal_fov, size_bytes, timestamp)`.
pub fn sink_fn<F>(callback: F) -> Arc<dyn FrameSink>
where
    F: Fn(i32, &[u8], i32, i32, PixelFormat, f32, i32, f64) -> bool + Send + Sync + 'static,
{
    Arc::new(move |frame: &FrameView<'_>| {
        callback(
            frame.id.as_host(),
            frame.data,
            frame.width as i32,
            frame.height as i32,
            frame.format,
            frame.horizontal_fov,
            frame.size_bytes() as i32,
            frame.timestamp,
        )
    })
}
