use {
    crate::{FrameSink, FrameView, ObjectId, StreamFormat},
    std::{
        collections::HashSet,
        sync::{
            Arc, Mutex, RwLock,
            atomic::{AtomicU64, Ordering},
        },
    },
};

/// A bridge shared between its resource and the capture thread feeding it.
pub type SharedBridge = Arc<Mutex<FrameBridge>>;

/// Routing table from resource id to the downstream sink.
///
/// Bridges resolve their id here on every frame instead of going through the
/// resource, so a frame racing a release finds the id gone and is dropped.
pub struct FrameDispatch {
    routes: RwLock<HashSet<ObjectId>>,
    sink: Arc<dyn FrameSink>,
}

impl FrameDispatch {
    pub fn new(sink: Arc<dyn FrameSink>) -> Self {
        Self {
            routes: RwLock::new(HashSet::new()),
            sink,
        }
    }

    pub(crate) fn register(&self, id: ObjectId) {
        self.routes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id);
    }

    pub(crate) fn unregister(&self, id: ObjectId) {
        self.routes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
    }

    pub fn is_routed(&self, id: ObjectId) -> bool {
        self.routes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&id)
    }

    pub fn sink(&self) -> &dyn FrameSink {
        self.sink.as_ref()
    }
}

/// Frame counters of one bridge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Frames handed to the sink.
    pub delivered: u64,
    /// Frames for an id no longer routed (released or suspended).
    pub dropped_unknown: u64,
    /// Frames whose size did not fit the negotiated format.
    pub rejected: u64,
    /// Delivered frames the sink reported as not consumed.
    pub sink_failures: u64,
}

/// Live counters of one bridge, readable without locking the bridge.
#[derive(Debug, Default)]
pub struct BridgeCounters {
    delivered: AtomicU64,
    dropped_unknown: AtomicU64,
    rejected: AtomicU64,
    sink_failures: AtomicU64,
}

impl BridgeCounters {
    pub fn snapshot(&self) -> BridgeStats {
        BridgeStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped_unknown: self.dropped_unknown.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
        }
    }
}

/// Per-stream callback target of the capture thread.
///
/// Owns one buffer, sized once from the negotiated format, into which every
/// frame is copied before being lent to the sink. Nothing is allocated per frame.
pub struct FrameBridge {
    id: ObjectId,
    format: StreamFormat,
    buffer: Vec<u8>,
    dispatch: Arc<FrameDispatch>,
    counters: Arc<BridgeCounters>,
    log_interval: u64,
}

impl FrameBridge {
    pub fn new(
        id: ObjectId,
        format: StreamFormat,
        dispatch: Arc<FrameDispatch>,
        log_interval: u64,
    ) -> Self {
        Self {
            id,
            format,
            buffer: vec![0u8; format.buffer_capacity()],
            dispatch,
            counters: Arc::new(BridgeCounters::default()),
            log_interval,
        }
    }

    pub fn shared(self) -> SharedBridge {
        Arc::new(Mutex::new(self))
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn format(&self) -> &StreamFormat {
        &self.format
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> BridgeStats {
        self.counters.snapshot()
    }

    /// Counters shared with readers that must not wait on the capture thread.
    pub fn counters(&self) -> Arc<BridgeCounters> {
        Arc::clone(&self.counters)
    }

    /// Forward one captured frame to the sink.
    ///
    /// `data` may carry trailing padding; only the negotiated frame size is
    /// forwarded. Returns whether the sink consumed the frame.
    pub fn deliver(&mut self, data: &[u8], timestamp: f64) -> bool {
        let len = match self.format.format.frame_size(self.format.width, self.format.height) {
            Some(expected) if data.len() >= expected => expected,
            None if !data.is_empty() && data.len() <= self.buffer.len() => data.len(),
            _ => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                log::debug!(
                    "bridge {}: rejected {} byte frame for {}x{} {}",
                    self.id,
                    data.len(),
                    self.format.width,
                    self.format.height,
                    self.format.format
                );
                return false;
            }
        };

        if !self.dispatch.is_routed(self.id) {
            self.counters.dropped_unknown.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        self.buffer[..len].copy_from_slice(&data[..len]);
        let frame = FrameView {
            id: self.id,
            data: &self.buffer[..len],
            width: self.format.width,
            height: self.format.height,
            format: self.format.format,
            horizontal_fov: self.format.horizontal_fov,
            timestamp,
        };
        let consumed = self.dispatch.sink().on_frame(&frame);

        let delivered = self.counters.delivered.fetch_add(1, Ordering::Relaxed) + 1;
        if !consumed {
            self.counters.sink_failures.fetch_add(1, Ordering::Relaxed);
            log::debug!("bridge {}: sink did not consume frame at {:.3}", self.id, timestamp);
        }
        if self.log_interval > 0 && delivered % self.log_interval == 0 {
            log::debug!("bridge {}: {:?}", self.id, self.stats());
        }
        consumed
    }
}

impl std::fmt::Debug for FrameBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBridge")
            .field("id", &self.id)
            .field("format", &self.format)
            .field("buffer", &self.buffer.len())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, image::PixelFormat, std::sync::atomic::AtomicUsize};

    fn format(width: u32, height: u32) -> StreamFormat {
        StreamFormat {
            width,
            height,
            format: PixelFormat::Yuyv,
            frequency: 30.0,
            horizontal_fov: 0.5,
        }
    }

    fn routed_bridge(sink: Arc<dyn FrameSink>) -> (Arc<FrameDispatch>, FrameBridge) {
        let dispatch = Arc::new(FrameDispatch::new(sink));
        let id = ObjectId::from_raw(3).unwrap();
        dispatch.register(id);
        let bridge = FrameBridge::new(id, format(4, 2), Arc::clone(&dispatch), 0);
        (dispatch, bridge)
    }

    #[test]
    fn test_deliver_trims_padding() {
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = {
            let seen = Arc::clone(&seen);
            move |frame: &FrameView<'_>| {
                seen.store(frame.size_bytes(), Ordering::SeqCst);
                assert_eq!(frame.id.as_host(), 3);
                assert_eq!(frame.timestamp, 2.0);
                true
            }
        };
        let (_dispatch, mut bridge) = routed_bridge(Arc::new(sink));

        assert!(bridge.deliver(&[9u8; 20], 2.0));
        assert_eq!(seen.load(Ordering::SeqCst), 16);
        assert_eq!(bridge.stats().delivered, 1);
    }

    #[test]
    fn test_short_frame_is_rejected() {
        let (_dispatch, mut bridge) = routed_bridge(Arc::new(|_: &FrameView<'_>| true));

        assert!(!bridge.deliver(&[0u8; 15], 0.0));
        assert!(!bridge.deliver(&[], 0.0));
        assert_eq!(bridge.stats().rejected, 2);
        assert_eq!(bridge.stats().delivered, 0);
    }

    #[test]
    fn test_unregistered_id_is_dropped() {
        let (dispatch, mut bridge) = routed_bridge(Arc::new(|_: &FrameView<'_>| true));
        dispatch.unregister(bridge.id());

        assert!(!bridge.deliver(&[0u8; 16], 0.0));
        assert_eq!(bridge.stats().dropped_unknown, 1);
        assert!(!dispatch.is_routed(bridge.id()));
    }

    #[test]
    fn test_sink_failure_is_counted() {
        let (_dispatch, mut bridge) = routed_bridge(Arc::new(|_: &FrameView<'_>| false));

        assert!(!bridge.deliver(&[0u8; 16], 0.0));
        assert!(!bridge.deliver(&[0u8; 16], 0.0));
        assert_eq!(
            bridge.stats(),
            BridgeStats {
                delivered: 2,
                dropped_unknown: 0,
                rejected: 0,
                sink_failures: 2,
            }
        );
    }

    #[test]
    fn test_buffer_is_sized_once() {
        let (_dispatch, mut bridge) = routed_bridge(Arc::new(|_: &FrameView<'_>| true));
        let capacity = bridge.buffer_capacity();
        let address = bridge.buffer.as_ptr();

        for fill in 0..10u8 {
            bridge.deliver(&[fill; 16], fill as f64);
        }

        assert_eq!(bridge.buffer_capacity(), capacity);
        assert_eq!(bridge.buffer.as_ptr(), address);
    }

    #[test]
    fn test_compressed_frames_pass_up_to_capacity() {
        let dispatch = Arc::new(FrameDispatch::new(Arc::new(|frame: &FrameView<'_>| {
            frame.size_bytes() == 5
        })));
        let id = ObjectId::from_raw(0).unwrap();
        dispatch.register(id);
        let jpeg = StreamFormat {
            format: PixelFormat::Jpeg,
            ..format(4, 2)
        };
        let mut bridge = FrameBridge::new(id, jpeg, dispatch, 0);

        assert!(bridge.deliver(&[0xff; 5], 0.0));
        assert!(!bridge.deliver(&vec![0u8; bridge.buffer_capacity() + 1], 0.0));
        assert_eq!(bridge.stats().rejected, 1);
    }
}
