use crate::*;

/// Platform capture device behind one camera resource.
///
/// `open` and `close` may block and are called without the registry lock held.
/// `start`, `pause` and `stop` are called with the lock held and must only
/// signal the capture thread, never wait on it.
pub trait CaptureDevice: Send {
    fn open(&mut self, request: &StreamRequest) -> Result<StreamFormat, CameraError>; // open the device, return the format that was actually set
    fn install(&mut self, bridge: SharedBridge); // bridge receiving every frame from now on
    fn start(&mut self) -> Result<(), CameraError>; // begin or resume frame delivery
    fn pause(&mut self) -> Result<(), CameraError> {
        self.stop()
    }
    fn stop(&mut self) -> Result<(), CameraError>; // suspend frame delivery, keep the device open
    fn close(&mut self); // release the device, if open
}

/// Enumerates devices and creates handles for them.
pub trait CaptureBackend: Send + Sync {
    fn device_count(&self) -> usize;
    fn create_device(&self, index: usize) -> Result<Box<dyn CaptureDevice>, CameraError>;
}

pub mod synthetic;

#[cfg(feature = "v4l2")]
pub mod v4l2;
