use {crate::ObjectId, image::PixelFormat};

/// The stream configuration a device actually settled on after negotiation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamFormat {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub frequency: f32,
    /// Horizontal field of view in radians, 0 if the device does not know it.
    pub horizontal_fov: f32,
}

impl StreamFormat {
    /// Size of the reusable frame buffer for this stream.
    pub fn buffer_capacity(&self) -> usize {
        self.format.buffer_capacity(self.width, self.height)
    }
}

/// One frame lent to the sink for the duration of a single call.
#[derive(Debug)]
pub struct FrameView<'a> {
    pub id: ObjectId,
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub horizontal_fov: f32,
    pub timestamp: f64,
}

impl FrameView<'_> {
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

/// Downstream consumer of every delivered frame.
///
/// Called from capture threads, concurrently for different streams. The frame
/// data must not be retained past the call. The return value is advisory.
///
/// The stream's bridge stays locked for the duration of the call. Registry
/// operations are safe from inside a sink; waiting on another frame of the
/// same stream is not.
pub trait FrameSink: Send + Sync {
    fn on_frame(&self, frame: &FrameView<'_>) -> bool;
}

impl<F> FrameSink for F
where
    F: Fn(&FrameView<'_>) -> bool + Send + Sync,
{
    fn on_frame(&self, frame: &FrameView<'_>) -> bool {
        self(frame)
    }
}
