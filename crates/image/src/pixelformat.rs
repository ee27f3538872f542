// V4L2 fourcc codes
const FOURCC_RGB565: u32 = u32::from_le_bytes(*b"RGBP");
const FOURCC_NV21: u32 = u32::from_le_bytes(*b"NV21");
const FOURCC_YUYV: u32 = u32::from_le_bytes(*b"YUYV");
const FOURCC_YV12: u32 = u32::from_le_bytes(*b"YV12");
const FOURCC_YU12: u32 = u32::from_le_bytes(*b"YU12");
const FOURCC_RGB3: u32 = u32::from_le_bytes(*b"RGB3");
const FOURCC_AB24: u32 = u32::from_le_bytes(*b"AB24");
const FOURCC_MJPG: u32 = u32::from_le_bytes(*b"MJPG");
const FOURCC_JPEG: u32 = u32::from_le_bytes(*b"JPEG");

// Android ImageFormat / AIMAGE_FORMAT codes
const PLATFORM_RGB_565: i32 = 4;
const PLATFORM_NV21: i32 = 17;
const PLATFORM_YUY2: i32 = 20;
const PLATFORM_YUV_420_888: i32 = 35;
const PLATFORM_FLEX_RGB_888: i32 = 0x29;
const PLATFORM_FLEX_RGBA_8888: i32 = 0x2A;
const PLATFORM_JPEG: i32 = 0x100;
const PLATFORM_YV12: i32 = 0x32315659;

/// Convert a fourcc code to a readable 4-character string.
pub fn fourcc_to_string(fourcc: u32) -> String {
    String::from_utf8_lossy(&fourcc.to_le_bytes()).into_owned()
}

/// Pixel layout of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 16-bit packed RGB, 5:6:5.
    Rgb565,
    /// Y plane followed by an interleaved V/U plane at half resolution.
    Nv21,
    /// Packed 4:2:2, `[Y0, U, Y1, V]`.
    Yuyv,
    /// Y plane, then V plane, then U plane, both chroma planes at half resolution.
    Yv12,
    /// Y plane, then U plane, then V plane (I420).
    Yu12,
    Rgb8,
    Rgba8,
    /// Compressed; frame size varies per frame.
    Jpeg,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 8] = [
        PixelFormat::Rgb565,
        PixelFormat::Nv21,
        PixelFormat::Yuyv,
        PixelFormat::Yv12,
        PixelFormat::Yu12,
        PixelFormat::Rgb8,
        PixelFormat::Rgba8,
        PixelFormat::Jpeg,
    ];

    pub fn from_fourcc(fourcc: u32) -> Option<Self> {
        match fourcc {
            FOURCC_RGB565 => Some(PixelFormat::Rgb565),
            FOURCC_NV21 => Some(PixelFormat::Nv21),
            FOURCC_YUYV => Some(PixelFormat::Yuyv),
            FOURCC_YV12 => Some(PixelFormat::Yv12),
            FOURCC_YU12 => Some(PixelFormat::Yu12),
            FOURCC_RGB3 => Some(PixelFormat::Rgb8),
            FOURCC_AB24 => Some(PixelFormat::Rgba8),
            FOURCC_MJPG | FOURCC_JPEG => Some(PixelFormat::Jpeg),
            _ => None,
        }
    }

    pub fn as_fourcc(&self) -> u32 {
        match self {
            PixelFormat::Rgb565 => FOURCC_RGB565,
            PixelFormat::Nv21 => FOURCC_NV21,
            PixelFormat::Yuyv => FOURCC_YUYV,
            PixelFormat::Yv12 => FOURCC_YV12,
            PixelFormat::Yu12 => FOURCC_YU12,
            PixelFormat::Rgb8 => FOURCC_RGB3,
            PixelFormat::Rgba8 => FOURCC_AB24,
            PixelFormat::Jpeg => FOURCC_MJPG,
        }
    }

    /// Map an Android image format code to a pixel format.
    pub fn from_platform_code(code: i32) -> Option<Self> {
        match code {
            PLATFORM_RGB_565 => Some(PixelFormat::Rgb565),
            PLATFORM_NV21 => Some(PixelFormat::Nv21),
            PLATFORM_YUY2 => Some(PixelFormat::Yuyv),
            PLATFORM_YV12 => Some(PixelFormat::Yv12),
            PLATFORM_YUV_420_888 => Some(PixelFormat::Yu12),
            PLATFORM_FLEX_RGB_888 => Some(PixelFormat::Rgb8),
            PLATFORM_FLEX_RGBA_8888 => Some(PixelFormat::Rgba8),
            PLATFORM_JPEG => Some(PixelFormat::Jpeg),
            _ => None,
        }
    }

    pub fn platform_code(&self) -> i32 {
        match self {
            PixelFormat::Rgb565 => PLATFORM_RGB_565,
            PixelFormat::Nv21 => PLATFORM_NV21,
            PixelFormat::Yuyv => PLATFORM_YUY2,
            PixelFormat::Yv12 => PLATFORM_YV12,
            PixelFormat::Yu12 => PLATFORM_YUV_420_888,
            PixelFormat::Rgb8 => PLATFORM_FLEX_RGB_888,
            PixelFormat::Rgba8 => PLATFORM_FLEX_RGBA_8888,
            PixelFormat::Jpeg => PLATFORM_JPEG,
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, PixelFormat::Jpeg)
    }

    pub fn planes(&self) -> usize {
        match self {
            PixelFormat::Nv21 => 2,
            PixelFormat::Yv12 | PixelFormat::Yu12 => 3,
            _ => 1,
        }
    }

    /// Exact number of bytes of one unpadded frame, `None` for compressed formats.
    pub fn frame_size(&self, width: u32, height: u32) -> Option<usize> {
        let (w, h) = (width as usize, height as usize);
        // chroma planes round up for odd dimensions
        let chroma = w.div_ceil(2) * h.div_ceil(2);
        match self {
            PixelFormat::Rgb565 => Some(w * h * 2),
            PixelFormat::Nv21 | PixelFormat::Yv12 | PixelFormat::Yu12 => Some(w * h + 2 * chroma),
            PixelFormat::Yuyv => Some(w.div_ceil(2) * 4 * h),
            PixelFormat::Rgb8 => Some(w * h * 3),
            PixelFormat::Rgba8 => Some(w * h * 4),
            PixelFormat::Jpeg => None,
        }
    }

    /// Bytes to reserve for one frame: the exact size for raw formats, an
    /// uncompressed RGB upper bound for compressed ones.
    pub fn buffer_capacity(&self, width: u32, height: u32) -> usize {
        self.frame_size(width, height)
            .unwrap_or_else(|| width as usize * height as usize * 3)
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
