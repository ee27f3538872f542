use {
    crate::*,
    image::PixelFormat,
    std::{
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        thread::{self, JoinHandle},
        time::{Duration, Instant},
    },
};

// largest dimension a synthetic device agrees to
const MAX_DIMENSION: u32 = 8192;

const DEFAULT_FREQUENCY: f32 = 30.0;
const MIN_FREQUENCY: f32 = 1.0;
const MAX_FREQUENCY: f32 = 240.0;

/// Configuration of the synthetic test-pattern backend.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    device_count: usize,
    width: u32,
    height: u32,
    frequency: f32,
    format: PixelFormat,
    horizontal_fov: f32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            device_count: 2,
            width: 1280,
            height: 720,
            frequency: DEFAULT_FREQUENCY,
            format: PixelFormat::Nv21,
            horizontal_fov: 60f32.to_radians(),
        }
    }
}

impl SyntheticConfig {
    pub fn with_device_count(mut self, device_count: usize) -> Self {
        self.device_count = device_count;
        self
    }

    /// Set the size used when a request leaves width or height at 0.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the frame rate used when a request leaves the frequency at 0.
    /// Values that are not finite and positive keep the current rate.
    pub fn with_frequency(mut self, frequency: f32) -> Self {
        if frequency.is_finite() && frequency > 0.0 {
            self.frequency = frequency;
        } else {
            log::warn!("synthetic config: ignoring frequency {}", frequency);
        }
        self
    }

    /// Set the pixel format. Compressed formats are not generated and fall back to NV21.
    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_horizontal_fov(mut self, radians: f32) -> Self {
        self.horizontal_fov = radians;
        self
    }

    pub fn device_count(&self) -> usize {
        self.device_count
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn horizontal_fov(&self) -> f32 {
        self.horizontal_fov
    }
}

/// Backend of cameras that generate a flat, frame-counting test pattern.
#[derive(Clone, Debug, Default)]
pub struct SyntheticBackend {
    config: SyntheticConfig,
}

impl SyntheticBackend {
    pub fn new(config: SyntheticConfig) -> Self {
        Self { config }
    }
}

impl CaptureBackend for SyntheticBackend {
    fn device_count(&self) -> usize {
        self.config.device_count
    }

    fn create_device(&self, index: usize) -> Result<Box<dyn CaptureDevice>, CameraError> {
        if index >= self.config.device_count {
            return Err(CameraError::Device(format!("no synthetic camera {index}")));
        }
        Ok(Box::new(SyntheticCamera::new(index, self.config.clone())))
    }
}

struct Worker {
    active: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

pub struct SyntheticCamera {
    index: usize,
    config: SyntheticConfig,
    format: Option<StreamFormat>,
    bridge: Option<SharedBridge>,
    worker: Option<Worker>,
}

impl std::fmt::Debug for SyntheticCamera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntheticCamera")
            .field("index", &self.index)
            .field("format", &self.format)
            .field("bridge", &self.bridge.is_some())
            .field("worker", &self.worker.is_some())
            .finish()
    }
}

impl SyntheticCamera {
    pub fn new(index: usize, config: SyntheticConfig) -> Self {
        Self {
            index,
            config,
            format: None,
            bridge: None,
            worker: None,
        }
    }

    fn spawn_worker(&self, format: StreamFormat, bridge: SharedBridge) -> Result<Worker, CameraError> {
        let active = Arc::new(AtomicBool::new(true));
        let cancel = Arc::new(AtomicBool::new(false));
        let period = Duration::from_secs_f32(1.0 / format.frequency);
        let index = self.index;

        let handle = thread::Builder::new()
            .name(format!("synthetic-camera-{index}"))
            .spawn({
                let active = Arc::clone(&active);
                let cancel = Arc::clone(&cancel);
                move || {
                    // the only allocation of the worker; every frame reuses it
                    let mut pattern = vec![0u8; format.buffer_capacity()];
                    let mut counter = 0u8;
                    let mut deadline = Instant::now();
                    while !cancel.load(Ordering::Relaxed) {
                        if active.load(Ordering::Relaxed) {
                            pattern.fill(counter);
                            counter = counter.wrapping_add(1);
                            bridge
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .deliver(&pattern, base::now_seconds());
                        }
                        deadline += period;
                        let now = Instant::now();
                        if deadline > now {
                            thread::sleep(deadline - now);
                        } else {
                            deadline = now;
                        }
                    }
                    log::debug!("synthetic camera {index}: worker finished");
                }
            })?;

        Ok(Worker {
            active,
            cancel,
            handle,
        })
    }
}

impl CaptureDevice for SyntheticCamera {
    fn open(&mut self, request: &StreamRequest) -> Result<StreamFormat, CameraError> {
        self.close();

        let (mut width, mut height) = request.size_or(self.config.width, self.config.height);
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            log::warn!(
                "synthetic camera {}: cannot produce {}x{}, using {}x{}",
                self.index,
                width,
                height,
                self.config.width,
                self.config.height
            );
            width = self.config.width;
            height = self.config.height;
        }

        let mut format = self.config.format;
        if format.is_compressed() {
            log::warn!("synthetic camera {}: {} not generated, using NV21", self.index, format);
            format = PixelFormat::Nv21;
        }

        let mut desired_frequency = request.frequency_or(self.config.frequency);
        if !desired_frequency.is_finite() {
            desired_frequency = DEFAULT_FREQUENCY;
        }
        let frequency = desired_frequency.clamp(MIN_FREQUENCY, MAX_FREQUENCY);
        if frequency != desired_frequency {
            log::warn!(
                "synthetic camera {}: frequency {} clamped to {}",
                self.index,
                desired_frequency,
                frequency
            );
        }

        let format = StreamFormat {
            width,
            height,
            format,
            frequency,
            horizontal_fov: self.config.horizontal_fov,
        };
        self.format = Some(format);
        Ok(format)
    }

    fn install(&mut self, bridge: SharedBridge) {
        self.bridge = Some(bridge);
    }

    fn start(&mut self) -> Result<(), CameraError> {
        if let Some(worker) = &self.worker {
            if worker.handle.is_finished() {
                return Err(CameraError::Stream(format!(
                    "synthetic camera {}: worker terminated",
                    self.index
                )));
            }
            worker.active.store(true, Ordering::Relaxed);
            return Ok(());
        }
        let format = self
            .format
            .ok_or_else(|| CameraError::Device(format!("synthetic camera {} is not open", self.index)))?;
        let bridge = self
            .bridge
            .clone()
            .ok_or_else(|| CameraError::Device(format!("synthetic camera {} has no bridge", self.index)))?;
        self.worker = Some(self.spawn_worker(format, bridge)?);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        if let Some(worker) = &self.worker {
            worker.active.store(false, Ordering::Relaxed);
        }
        Ok(())
    }

    fn close(&mut self) {
        // signal only; the worker exits on its next tick
        if let Some(worker) = self.worker.take() {
            worker.cancel.store(true, Ordering::Relaxed);
        }
        self.bridge = None;
        self.format = None;
    }
}

impl Drop for SyntheticCamera {
    fn drop(&mut self) {
        self.close();
    }
}
