#![allow(dead_code)]

use {
    livevideo::*,
    std::{
        collections::HashSet,
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
            mpsc::{self, Receiver, Sender},
        },
    },
};

/// What the recording backend saw, shared by all of its devices.
#[derive(Default)]
pub struct Counters {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

impl Counters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

// holds an open until the test lets it through
struct OpenGate {
    opening: Sender<()>,
    proceed: Receiver<()>,
}

/// Backend whose devices do nothing but count calls.
///
/// Frames are pushed by the test through `deliver`.
pub struct RecordingBackend {
    device_count: usize,
    width: u32,
    height: u32,
    counters: Arc<Counters>,
    failing: Mutex<HashSet<usize>>,
    bridges: Arc<Mutex<Vec<(usize, SharedBridge)>>>,
    gate: Arc<Mutex<Option<OpenGate>>>,
}

impl RecordingBackend {
    pub fn new(device_count: usize) -> Self {
        Self {
            device_count,
            width: 64,
            height: 48,
            counters: Arc::new(Counters::default()),
            failing: Mutex::new(HashSet::new()),
            bridges: Arc::new(Mutex::new(Vec::new())),
            gate: Arc::new(Mutex::new(None)),
        }
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Make every future open of device `index` fail.
    pub fn fail_opens(&self, index: usize) {
        self.failing.lock().unwrap().insert(index);
    }

    /// Block the next open until the returned sender fires. The receiver
    /// reports that the open has begun.
    pub fn gate_next_open(&self) -> (Receiver<()>, Sender<()>) {
        let (opening_tx, opening_rx) = mpsc::channel();
        let (proceed_tx, proceed_rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some(OpenGate {
            opening: opening_tx,
            proceed: proceed_rx,
        });
        (opening_rx, proceed_tx)
    }

    /// Push one frame of the right size through the most recent bridge of device `index`.
    pub fn deliver(&self, index: usize, fill: u8) -> Option<bool> {
        let bridge = self
            .bridges
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(i, _)| *i == index)
            .map(|(_, bridge)| Arc::clone(bridge))?;
        let mut bridge = bridge.lock().unwrap();
        let format = *bridge.format();
        let frame = vec![fill; format.format.frame_size(format.width, format.height)?];
        Some(bridge.deliver(&frame, 1.5))
    }

    pub fn bridge_count(&self) -> usize {
        self.bridges.lock().unwrap().len()
    }
}

impl CaptureBackend for RecordingBackend {
    fn device_count(&self) -> usize {
        self.device_count
    }

    fn create_device(&self, index: usize) -> Result<Box<dyn CaptureDevice>, CameraError> {
        Ok(Box::new(RecordingDevice {
            index,
            width: self.width,
            height: self.height,
            fail_open: self.failing.lock().unwrap().contains(&index),
            counters: Arc::clone(&self.counters),
            bridges: Arc::clone(&self.bridges),
            gate: self.gate.lock().unwrap().take(),
            open: false,
        }))
    }
}

struct RecordingDevice {
    index: usize,
    width: u32,
    height: u32,
    fail_open: bool,
    counters: Arc<Counters>,
    bridges: Arc<Mutex<Vec<(usize, SharedBridge)>>>,
    gate: Option<OpenGate>,
    open: bool,
}

impl CaptureDevice for RecordingDevice {
    fn open(&mut self, request: &StreamRequest) -> Result<StreamFormat, CameraError> {
        if let Some(gate) = self.gate.take() {
            gate.opening.send(()).unwrap();
            gate.proceed.recv().unwrap();
        }
        if self.fail_open {
            return Err(CameraError::Device(format!("device {} is busy", self.index)));
        }
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        self.open = true;
        let (width, height) = request.size_or(self.width, self.height);
        self.width = width;
        self.height = height;
        Ok(StreamFormat {
            width,
            height,
            format: PixelFormat::Nv21,
            frequency: request.frequency_or(30.0),
            horizontal_fov: 1.0,
        })
    }

    fn install(&mut self, bridge: SharedBridge) {
        self.bridges.lock().unwrap().push((self.index, bridge));
    }

    fn start(&mut self) -> Result<(), CameraError> {
        self.counters.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        self.counters.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Sink counting frames per id.
#[derive(Default)]
pub struct CountingSink {
    frames: Mutex<Vec<(ObjectId, usize, u8)>>,
}

impl CountingSink {
    pub fn count(&self, id: ObjectId) -> usize {
        self.frames.lock().unwrap().iter().filter(|(i, _, _)| *i == id).count()
    }

    pub fn total(&self) -> usize {
        self.frames.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<(ObjectId, usize, u8)> {
        self.frames.lock().unwrap().last().copied()
    }
}

impl FrameSink for CountingSink {
    fn on_frame(&self, frame: &FrameView<'_>) -> bool {
        self.frames
            .lock()
            .unwrap()
            .push((frame.id, frame.size_bytes(), frame.data[0]));
        true
    }
}

pub fn registry_with(backend: &Arc<RecordingBackend>, sink: &Arc<CountingSink>) -> CameraRegistry {
    CameraRegistry::new(
        Arc::clone(backend) as Arc<dyn CaptureBackend>,
        Arc::clone(sink) as Arc<dyn FrameSink>,
        RegistryConfig::default(),
    )
}

pub fn recording_registry(device_count: usize) -> (Arc<RecordingBackend>, Arc<CountingSink>, CameraRegistry) {
    let backend = Arc::new(RecordingBackend::new(device_count));
    let sink = Arc::new(CountingSink::default());
    let registry = registry_with(&backend, &sink);
    (backend, sink, registry)
}
