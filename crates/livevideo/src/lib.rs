//! Live camera stream registry.
//!
//! Callers request streams by `LiveVideoId:<n>` url from any thread; the
//! devices are opened later by `CameraRegistry::update()` on the driving
//! thread. Capture threads hand every frame to one shared `FrameSink`.

mod bridge;
mod config;
mod error;
mod frame;
mod objectid;
mod registry;
mod resource;

pub mod device;
pub mod host;

pub use bridge::{BridgeCounters, BridgeStats, FrameBridge, FrameDispatch, SharedBridge};
pub use config::{LiveVideoUrl, RegistryConfig, StreamRequest};
pub use device::{
    CaptureBackend, CaptureDevice,
    synthetic::{SyntheticBackend, SyntheticCamera, SyntheticConfig},
};
pub use error::CameraError;
pub use frame::{FrameSink, FrameView, StreamFormat};
pub use host::LiveVideoHost;
pub use image::PixelFormat;
pub use objectid::{ObjectId, ObjectIdAllocator};
pub use registry::CameraRegistry;
pub use resource::{CameraResource, ResourceState};

#[cfg(feature = "v4l2")]
pub use device::v4l2::{V4l2Backend, V4l2Config};
