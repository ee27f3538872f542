use {
    crate::*,
    image::{PixelFormat, fourcc_to_string},
    std::{
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        thread::{self, JoinHandle},
    },
    v4l::{
        Device, Format, FourCC, buffer::Type, io::mmap::Stream as MmapStream,
        io::traits::CaptureStream, video::Capture,
    },
};

#[derive(Debug, Clone)]
pub struct V4l2Config {
    buffer_count: u32,
    format: Option<PixelFormat>,
}

impl Default for V4l2Config {
    fn default() -> Self {
        Self {
            buffer_count: 4,
            format: None,
        }
    }
}

impl V4l2Config {
    /// Set the number of mmap buffers queued with the driver.
    pub fn with_buffer_count(mut self, buffer_count: u32) -> Self {
        self.buffer_count = buffer_count.max(1);
        self
    }

    /// Force a pixel format instead of keeping the device's current one.
    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn buffer_count(&self) -> u32 {
        self.buffer_count
    }

    pub fn format(&self) -> Option<PixelFormat> {
        self.format
    }
}

/// Backend over the V4L2 video nodes of this machine.
///
/// `LiveVideoId:<n>` names the n-th enumerated node.
#[derive(Debug, Clone, Default)]
pub struct V4l2Backend {
    config: V4l2Config,
}

impl V4l2Backend {
    pub fn new(config: V4l2Config) -> Self {
        Self { config }
    }
}

impl CaptureBackend for V4l2Backend {
    fn device_count(&self) -> usize {
        v4l::context::enum_devices().len()
    }

    fn create_device(&self, index: usize) -> Result<Box<dyn CaptureDevice>, CameraError> {
        let node = v4l::context::enum_devices()
            .into_iter()
            .nth(index)
            .ok_or_else(|| CameraError::Device(format!("no video node {index}")))?;
        Ok(Box::new(V4l2Camera::new(node.index(), self.config.clone())))
    }
}

struct Worker {
    active: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

pub(crate) struct V4l2Camera {
    node: usize,
    config: V4l2Config,
    device: Option<Device>,
    bridge: Option<SharedBridge>,
    worker: Option<Worker>,
}

impl V4l2Camera {
    pub fn new(node: usize, config: V4l2Config) -> Self {
        Self {
            node,
            config,
            device: None,
            bridge: None,
            worker: None,
        }
    }

    fn negotiate_format(&self, device: &Device, request: &StreamRequest) -> Result<Format, CameraError> {
        let current = Capture::format(device)?;
        let (width, height) = request.size_or(current.width, current.height);
        let fourcc = match self.config.format {
            Some(format) => FourCC::new(&format.as_fourcc().to_le_bytes()),
            None => current.fourcc,
        };

        // preferences are best-effort; keep the current format if the device refuses
        match Capture::set_format(device, &Format::new(width, height, fourcc)) {
            Ok(actual) => Ok(actual),
            Err(error) => {
                log::warn!(
                    "v4l2 node {}: cannot set {}x{} {}: {}",
                    self.node,
                    width,
                    height,
                    fourcc,
                    error
                );
                Ok(current)
            }
        }
    }

    fn negotiate_frequency(&self, device: &Device, request: &StreamRequest) -> Result<f32, CameraError> {
        let current = Capture::params(device)?;
        let current_frequency =
            current.interval.denominator as f32 / current.interval.numerator.max(1) as f32;
        if request.frequency <= 0.0 {
            return Ok(current_frequency);
        }
        let fps = request.frequency.round().max(1.0) as u32;
        match Capture::set_params(device, &v4l::video::capture::Parameters::with_fps(fps)) {
            Ok(actual) => {
                Ok(actual.interval.denominator as f32 / actual.interval.numerator.max(1) as f32)
            }
            Err(error) => {
                log::warn!("v4l2 node {}: cannot set {} fps: {}", self.node, fps, error);
                Ok(current_frequency)
            }
        }
    }

    fn spawn_worker(&mut self) -> Result<Worker, CameraError> {
        let device = self
            .device
            .take()
            .ok_or_else(|| CameraError::Device(format!("v4l2 node {} is not open", self.node)))?;
        let bridge = self
            .bridge
            .clone()
            .ok_or_else(|| CameraError::Device(format!("v4l2 node {} has no bridge", self.node)))?;

        let active = Arc::new(AtomicBool::new(true));
        let cancel = Arc::new(AtomicBool::new(false));
        let node = self.node;
        let buffer_count = self.config.buffer_count;

        let handle = thread::Builder::new().name(format!("v4l2-node-{node}")).spawn({
            let active = Arc::clone(&active);
            let cancel = Arc::clone(&cancel);
            move || {
                if let Err(error) = capture_loop(&device, buffer_count, &bridge, &active, &cancel) {
                    log::error!("v4l2 node {node}: capture failed: {error}");
                }
                log::debug!("v4l2 node {node}: worker finished");
            }
        })?;

        Ok(Worker {
            active,
            cancel,
            handle,
        })
    }
}

/// Stream mmap buffers into the bridge until cancelled.
fn capture_loop(
    device: &Device,
    buffer_count: u32,
    bridge: &SharedBridge,
    active: &AtomicBool,
    cancel: &AtomicBool,
) -> std::io::Result<()> {
    let mut stream = MmapStream::with_buffers(device, Type::VideoCapture, buffer_count)?;
    while !cancel.load(Ordering::Relaxed) {
        let (data, metadata) = CaptureStream::next(&mut stream)?;
        // dequeue even while paused so the driver keeps its queue moving
        if !active.load(Ordering::Relaxed) {
            continue;
        }
        let used = (metadata.bytesused as usize).min(data.len());
        let timestamp = metadata.timestamp.sec as f64 + metadata.timestamp.usec as f64 * 1e-6;
        bridge
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .deliver(&data[..used], timestamp);
    }
    Ok(())
}

impl CaptureDevice for V4l2Camera {
    fn open(&mut self, request: &StreamRequest) -> Result<StreamFormat, CameraError> {
        self.close();

        let device = Device::new(self.node)?;
        let actual = self.negotiate_format(&device, request)?;
        let format = PixelFormat::from_fourcc(u32::from_le_bytes(actual.fourcc.repr)).ok_or_else(|| {
            CameraError::Device(format!(
                "unsupported pixel format {}",
                fourcc_to_string(u32::from_le_bytes(actual.fourcc.repr))
            ))
        })?;
        let frequency = self.negotiate_frequency(&device, request)?;

        self.device = Some(device);
        Ok(StreamFormat {
            width: actual.width,
            height: actual.height,
            format,
            frequency,
            horizontal_fov: 0.0,
        })
    }

    fn install(&mut self, bridge: SharedBridge) {
        self.bridge = Some(bridge);
    }

    fn start(&mut self) -> Result<(), CameraError> {
        if let Some(worker) = &self.worker {
            if worker.handle.is_finished() {
                return Err(CameraError::Stream(format!(
                    "v4l2 node {}: capture thread terminated",
                    self.node
                )));
            }
            worker.active.store(true, Ordering::Relaxed);
            return Ok(());
        }
        self.worker = Some(self.spawn_worker()?);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        if let Some(worker) = &self.worker {
            worker.active.store(false, Ordering::Relaxed);
        }
        Ok(())
    }

    fn close(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.cancel.store(true, Ordering::Relaxed);
        }
        self.device = None;
        self.bridge = None;
    }
}

impl Drop for V4l2Camera {
    fn drop(&mut self) {
        self.close();
    }
}
