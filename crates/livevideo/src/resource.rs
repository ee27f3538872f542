use {
    crate::*,
    std::{fmt, sync::Arc},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// Requested; the device is opened by the next `update()`.
    Created,
    /// Device open, not delivering yet.
    Initialized,
    Started,
    Paused,
    /// Delivery halted by `stop()`, or device closed by `release_all_resources()`.
    Stopped,
    /// Terminal; the device handle has been handed off for closing.
    Released,
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// An open device together with the counters of the bridge it feeds.
pub(crate) struct DeviceHandle {
    device: Box<dyn CaptureDevice>,
    counters: Arc<BridgeCounters>,
    format: StreamFormat,
}

impl DeviceHandle {
    /// Create and open the device for `request`, and install a bridge sized
    /// for the negotiated format. Blocking; call without the registry lock.
    pub(crate) fn open(
        id: ObjectId,
        request: &StreamRequest,
        backend: &dyn CaptureBackend,
        dispatch: &Arc<FrameDispatch>,
        log_interval: u64,
    ) -> Result<Self, CameraError> {
        let mut device = backend.create_device(request.index)?;
        let format = match device.open(request) {
            Ok(format) => format,
            Err(error) => {
                device.close();
                return Err(error);
            }
        };
        let bridge = FrameBridge::new(id, format, Arc::clone(dispatch), log_interval);
        let counters = bridge.counters();
        device.install(bridge.shared());
        Ok(Self {
            device,
            counters,
            format,
        })
    }

    /// Close the device. Consumes the handle, so it cannot run twice.
    pub(crate) fn close(mut self) {
        self.device.close();
    }
}

/// One capture stream and its lifecycle.
pub struct CameraResource {
    id: ObjectId,
    url: LiveVideoUrl,
    request: StreamRequest,
    state: ResourceState,
    // claimed by an update() whose device open is in flight
    opening: bool,
    restart_after_open: bool,
    handle: Option<DeviceHandle>,
}

impl fmt::Debug for CameraResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraResource")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("request", &self.request)
            .field("state", &self.state)
            .field("opening", &self.opening)
            .field("handle", &self.handle.as_ref().map(|handle| handle.format))
            .finish()
    }
}

impl CameraResource {
    pub(crate) fn new(id: ObjectId, url: LiveVideoUrl, request: StreamRequest) -> Self {
        Self {
            id,
            url,
            request,
            state: ResourceState::Created,
            opening: false,
            restart_after_open: false,
            handle: None,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn url(&self) -> &LiveVideoUrl {
        &self.url
    }

    pub fn request(&self) -> &StreamRequest {
        &self.request
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn format(&self) -> Option<StreamFormat> {
        self.handle.as_ref().map(|handle| handle.format)
    }

    pub(crate) fn stats(&self) -> Option<BridgeStats> {
        self.handle.as_ref().map(|handle| handle.counters.snapshot())
    }

    /// Waiting for an update() to open it, and not claimed by one yet.
    pub(crate) fn is_pending(&self) -> bool {
        self.state == ResourceState::Created && !self.opening
    }

    /// Claim the deferred open. Returns the request to open with.
    pub(crate) fn claim_open(&mut self) -> Option<StreamRequest> {
        if !self.is_pending() {
            return None;
        }
        self.opening = true;
        Some(self.request)
    }

    /// Give up a claimed open; the resource stays `Created`.
    pub(crate) fn abandon_open(&mut self) {
        self.opening = false;
    }

    /// Attach a freshly opened handle. Hands it back if the resource no longer
    /// expects one, so the caller can close it.
    pub(crate) fn complete_open(&mut self, handle: DeviceHandle) -> Result<(), DeviceHandle> {
        if self.state != ResourceState::Created || !self.opening || self.handle.is_some() {
            return Err(handle);
        }
        self.opening = false;
        self.handle = Some(handle);
        self.state = ResourceState::Initialized;
        Ok(())
    }

    /// Whether the device should start right after the pending open.
    pub(crate) fn take_restart(&mut self) -> bool {
        std::mem::take(&mut self.restart_after_open)
    }

    fn device(&mut self) -> Result<&mut Box<dyn CaptureDevice>, CameraError> {
        match self.handle.as_mut() {
            Some(handle) => Ok(&mut handle.device),
            None => Err(CameraError::NotInitialized(self.id)),
        }
    }

    /// Initialized, Paused or Stopped to Started.
    pub(crate) fn start(&mut self) -> Result<(), CameraError> {
        match self.state {
            ResourceState::Started => Ok(()),
            ResourceState::Initialized | ResourceState::Paused | ResourceState::Stopped => {
                self.device()?.start()?;
                self.state = ResourceState::Started;
                Ok(())
            }
            ResourceState::Created => Err(CameraError::NotInitialized(self.id)),
            ResourceState::Released => Err(CameraError::UnknownId(self.id)),
        }
    }

    /// Started to Paused. A resource that is not delivering is left as it is.
    pub(crate) fn pause(&mut self) -> Result<(), CameraError> {
        match self.state {
            ResourceState::Paused | ResourceState::Initialized | ResourceState::Stopped => Ok(()),
            ResourceState::Started => {
                self.device()?.pause()?;
                self.state = ResourceState::Paused;
                Ok(())
            }
            ResourceState::Created => Err(CameraError::NotInitialized(self.id)),
            ResourceState::Released => Err(CameraError::UnknownId(self.id)),
        }
    }

    /// Started or Paused to Stopped. The device stays open.
    pub(crate) fn stop(&mut self) -> Result<(), CameraError> {
        match self.state {
            ResourceState::Stopped | ResourceState::Initialized => Ok(()),
            ResourceState::Started | ResourceState::Paused => {
                self.device()?.stop()?;
                self.state = ResourceState::Stopped;
                Ok(())
            }
            ResourceState::Created => Err(CameraError::NotInitialized(self.id)),
            ResourceState::Released => Err(CameraError::UnknownId(self.id)),
        }
    }

    /// Take the device away for closing while keeping the entry, as `Stopped`.
    pub(crate) fn suspend(&mut self) -> Option<DeviceHandle> {
        let handle = self.handle.take()?;
        self.state = ResourceState::Stopped;
        Some(handle)
    }

    /// Return to `Created` so the next update() opens the device again.
    ///
    /// Any handle still held is returned for closing.
    pub(crate) fn reset(&mut self, restart_after_open: bool) -> Option<DeviceHandle> {
        self.state = ResourceState::Created;
        self.restart_after_open = restart_after_open;
        self.handle.take()
    }

    /// Terminal transition. Returns the handle, if any, for closing.
    pub(crate) fn release(mut self) -> Option<DeviceHandle> {
        self.state = ResourceState::Released;
        self.opening = false;
        self.handle.take()
    }
}
