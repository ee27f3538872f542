use {
    crate::{resource::DeviceHandle, *},
    std::{
        collections::HashMap,
        sync::{
            Arc, Mutex, MutexGuard,
            atomic::{AtomicBool, Ordering},
        },
    },
};

struct Inner {
    resources: HashMap<ObjectId, CameraResource>,
    urls: HashMap<String, ObjectId>,
    ids: ObjectIdAllocator,
    needs_initialization: bool,
    // between release_all_resources() and recover_all_resources()
    suspended: bool,
    // bumped by every release_all_resources(); opens claimed under an older one are stale
    background_epoch: u64,
}

impl Inner {
    fn remove(&mut self, id: ObjectId) -> Option<CameraResource> {
        let resource = self.resources.remove(&id)?;
        self.urls.remove(resource.url().as_str());
        Some(resource)
    }

    fn any_pending(&self) -> bool {
        self.resources.values().any(CameraResource::is_pending)
    }
}

/// Process-wide collection of camera resources.
///
/// Share it by `Arc`; every operation takes `&self`. One mutex guards the
/// resources, the id allocator and the initialization flag. Device open and
/// close run outside of it.
pub struct CameraRegistry {
    inner: Mutex<Inner>,
    // mirrors Inner::needs_initialization for the update() fast path
    pending: AtomicBool,
    backend: Arc<dyn CaptureBackend>,
    dispatch: Arc<FrameDispatch>,
    config: RegistryConfig,
}

impl CameraRegistry {
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        sink: Arc<dyn FrameSink>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                resources: HashMap::new(),
                urls: HashMap::new(),
                ids: ObjectIdAllocator::new(),
                needs_initialization: false,
                suspended: false,
                background_epoch: 0,
            }),
            pending: AtomicBool::new(false),
            backend,
            dispatch: Arc::new(FrameDispatch::new(sink)),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_needs_initialization(&self, inner: &mut Inner, value: bool) {
        inner.needs_initialization = value;
        self.pending.store(value, Ordering::Release);
    }

    fn close_all(handles: Vec<DeviceHandle>) {
        for handle in handles {
            handle.close();
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn dispatch(&self) -> &Arc<FrameDispatch> {
        &self.dispatch
    }

    /// Request a new stream for `url`.
    ///
    /// The device is not touched here; it is opened by the next `update()`.
    /// Failures leave the registry unchanged and consume no id.
    pub fn create(
        &self,
        url: &str,
        preferred_width: u32,
        preferred_height: u32,
        preferred_frequency: f32,
    ) -> Result<ObjectId, CameraError> {
        let url = LiveVideoUrl::parse(url)?;
        let request = StreamRequest::new(
            url.index(),
            preferred_width,
            preferred_height,
            preferred_frequency,
        )?;

        // enumeration may be slow, keep it out of the lock
        let device_count = self.backend.device_count();
        if url.index() >= device_count {
            return Err(CameraError::InvalidUrl(format!(
                "{url} (only {device_count} devices available)"
            )));
        }

        let mut inner = self.lock();
        if inner.urls.contains_key(url.as_str()) {
            return Err(CameraError::DuplicateUrl(url.to_string()));
        }
        if inner.resources.len() >= self.config.max_streams() {
            return Err(CameraError::TooManyStreams(self.config.max_streams()));
        }
        let id = inner.ids.next().ok_or(CameraError::IdsExhausted)?;

        log::info!(
            "created {} for {} ({}x{} @ {} Hz)",
            id,
            url,
            preferred_width,
            preferred_height,
            preferred_frequency
        );
        inner.urls.insert(url.to_string(), id);
        inner.resources.insert(id, CameraResource::new(id, url, request));
        self.set_needs_initialization(&mut inner, true);
        Ok(id)
    }

    /// Release the stream for good. Its device is closed exactly once; the id
    /// is never valid again.
    pub fn release(&self, id: ObjectId) -> Result<(), CameraError> {
        let resource = {
            let mut inner = self.lock();
            let resource = inner.remove(id).ok_or(CameraError::UnknownId(id))?;
            self.dispatch.unregister(id);
            let pending = inner.any_pending();
            self.set_needs_initialization(&mut inner, pending);
            resource
        };

        log::info!("released {} ({})", id, resource.url());
        if let Some(handle) = resource.release() {
            handle.close();
        }
        Ok(())
    }

    /// Start (or resume) frame delivery. Fails before the deferred open has happened.
    pub fn start(&self, id: ObjectId) -> Result<(), CameraError> {
        let mut inner = self.lock();
        let resource = inner.resources.get_mut(&id).ok_or(CameraError::UnknownId(id))?;
        let before = resource.state();
        resource.start()?;
        if before != ResourceState::Started {
            log::info!("started {} ({})", id, resource.url());
        }
        Ok(())
    }

    pub fn pause(&self, id: ObjectId) -> Result<(), CameraError> {
        let mut inner = self.lock();
        let resource = inner.resources.get_mut(&id).ok_or(CameraError::UnknownId(id))?;
        let before = resource.state();
        resource.pause()?;
        if resource.state() != before {
            log::info!("paused {} ({})", id, resource.url());
        }
        Ok(())
    }

    pub fn stop(&self, id: ObjectId) -> Result<(), CameraError> {
        let mut inner = self.lock();
        let resource = inner.resources.get_mut(&id).ok_or(CameraError::UnknownId(id))?;
        let before = resource.state();
        resource.stop()?;
        if resource.state() != before {
            log::info!("stopped {} ({})", id, resource.url());
        }
        Ok(())
    }

    /// Driving tick: open the devices of every `Created` resource.
    ///
    /// Call regularly from the thread that may talk to the capture platform.
    /// Returns immediately when nothing is waiting.
    pub fn update(&self) {
        if !self.pending.load(Ordering::Acquire) {
            return;
        }

        let (epoch, claims): (u64, Vec<(ObjectId, StreamRequest)>) = {
            let mut inner = self.lock();
            if inner.suspended {
                log::debug!("update: suspended, deferring device open");
                return;
            }
            let epoch = inner.background_epoch;
            let claims: Vec<_> = inner
                .resources
                .values_mut()
                .filter_map(|resource| resource.claim_open().map(|request| (resource.id(), request)))
                .collect();
            self.set_needs_initialization(&mut inner, false);
            (epoch, claims)
        };

        for (id, request) in claims {
            let opened = DeviceHandle::open(
                id,
                &request,
                self.backend.as_ref(),
                &self.dispatch,
                self.config.frame_log_interval(),
            );

            let mut stale = None;
            {
                let mut inner = self.lock();
                let stale_open = inner.suspended || inner.background_epoch != epoch;
                match opened {
                    Ok(handle) => match inner.resources.get_mut(&id) {
                        Some(resource) if stale_open => {
                            // backgrounded while opening; the handle predates the release
                            log::info!("{} was backgrounded while its device was opening", id);
                            resource.abandon_open();
                            stale = Some(handle);
                            self.set_needs_initialization(&mut inner, true);
                        }
                        Some(resource) => match resource.complete_open(handle) {
                            Ok(()) => {
                                self.dispatch.register(id);
                                log::info!("initialized {} ({}): {:?}", id, resource.url(), resource.format());
                                if resource.take_restart() {
                                    if let Err(error) = resource.start() {
                                        log::error!("failed to restart {}: {}", id, error);
                                    }
                                }
                            }
                            Err(handle) => stale = Some(handle),
                        },
                        None => {
                            log::info!("{} was released while its device was opening", id);
                            stale = Some(handle);
                        }
                    },
                    Err(error) => {
                        log::error!("failed to open device for {}: {}", id, error);
                        if let Some(resource) = inner.remove(id) {
                            self.dispatch.unregister(id);
                            // never opened, so there is no handle to close
                            let _ = resource.release();
                        }
                    }
                }
            }
            if let Some(handle) = stale {
                handle.close();
            }
        }
    }

    /// Close every device, e.g. when the application leaves the foreground.
    ///
    /// Entries and their configuration are kept; open resources become `Stopped`.
    pub fn release_all_resources(&self) {
        let handles: Vec<DeviceHandle> = {
            let mut inner = self.lock();
            inner.suspended = true;
            inner.background_epoch += 1;
            inner
                .resources
                .values_mut()
                .filter_map(|resource| {
                    let handle = resource.suspend()?;
                    self.dispatch.unregister(resource.id());
                    Some(handle)
                })
                .collect()
        };
        log::info!("released {} devices", handles.len());
        Self::close_all(handles);
    }

    /// Mark every resource `Created` again; the next `update()` reopens them all.
    pub fn recover_all_resources(&self) {
        let handles: Vec<DeviceHandle> = {
            let mut inner = self.lock();
            inner.suspended = false;
            let handles = inner
                .resources
                .values_mut()
                .filter_map(|resource| {
                    let handle = resource.reset(false)?;
                    self.dispatch.unregister(resource.id());
                    Some(handle)
                })
                .collect();
            let pending = inner.any_pending();
            self.set_needs_initialization(&mut inner, pending);
            log::info!("recovering {} resources", inner.resources.len());
            handles
        };
        Self::close_all(handles);
    }

    /// Reopen and restart a started stream whose device was borrowed by another
    /// component. The id stays the same; the device is back after the next `update()`.
    pub fn force_restart(&self, id: ObjectId) -> Result<(), CameraError> {
        let handle = {
            let mut inner = self.lock();
            let resource = inner.resources.get_mut(&id).ok_or(CameraError::UnknownId(id))?;
            if resource.state() != ResourceState::Started {
                return Err(CameraError::InvalidState(
                    id,
                    format!("cannot restart a {} stream", resource.state()),
                ));
            }
            let handle = resource.reset(true);
            self.dispatch.unregister(id);
            self.set_needs_initialization(&mut inner, true);
            handle
        };
        log::info!("restarting {}", id);
        if let Some(handle) = handle {
            handle.close();
        }
        Ok(())
    }

    pub fn state(&self, id: ObjectId) -> Option<ResourceState> {
        self.lock().resources.get(&id).map(CameraResource::state)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.lock().resources.contains_key(&id)
    }

    /// Id of the live resource for `url`, in any spelling of the same device.
    pub fn id_for_url(&self, url: &str) -> Option<ObjectId> {
        let url = LiveVideoUrl::parse(url).ok()?;
        self.lock().urls.get(url.as_str()).copied()
    }

    /// The format negotiated when the device was opened.
    pub fn stream_format(&self, id: ObjectId) -> Option<StreamFormat> {
        self.lock().resources.get(&id).and_then(CameraResource::format)
    }

    /// Frame counters of the current device. Never waits on a capture thread,
    /// so it may be called from inside a `FrameSink`.
    pub fn frame_stats(&self, id: ObjectId) -> Option<BridgeStats> {
        self.lock().resources.get(&id).and_then(CameraResource::stats)
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        let mut ids: Vec<ObjectId> = self.lock().resources.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.lock().resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn needs_initialization(&self) -> bool {
        self.lock().needs_initialization
    }
}

impl Drop for CameraRegistry {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(|e| e.into_inner());
        inner.urls.clear();
        for (id, resource) in inner.resources.drain() {
            self.dispatch.unregister(id);
            if let Some(handle) = resource.release() {
                handle.close();
            }
        }
    }
}
