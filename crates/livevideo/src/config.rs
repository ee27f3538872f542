use {crate::CameraError, std::fmt};

const URL_PREFIX: &str = "LiveVideoId:";

/// Configuration for the camera registry.
#[derive(Clone, Debug)]
pub struct RegistryConfig {
    max_streams: usize,
    frame_log_interval: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_streams: 8,
            frame_log_interval: 300,
        }
    }
}

impl RegistryConfig {
    /// Set the maximum number of resources the registry holds at once.
    pub fn with_max_streams(mut self, max_streams: usize) -> Self {
        self.max_streams = max_streams;
        self
    }

    /// Log frame counters every `interval` delivered frames, 0 disables.
    pub fn with_frame_log_interval(mut self, interval: u64) -> Self {
        self.frame_log_interval = interval;
        self
    }

    pub fn max_streams(&self) -> usize {
        self.max_streams
    }

    pub fn frame_log_interval(&self) -> u64 {
        self.frame_log_interval
    }
}

/// A parsed `LiveVideoId:<n>` stream url, kept in canonical form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LiveVideoUrl {
    url: String,
    index: usize,
}

impl LiveVideoUrl {
    /// Parse a url of the form `LiveVideoId:<n>`, `<n>` a non-negative decimal integer.
    ///
    /// Leading zeros are accepted and dropped, so every spelling of one device
    /// yields the same url. Whether device `<n>` exists is checked by the
    /// registry, not here.
    pub fn parse(url: &str) -> Result<Self, CameraError> {
        let digits = url
            .strip_prefix(URL_PREFIX)
            .ok_or_else(|| CameraError::InvalidUrl(url.to_string()))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CameraError::InvalidUrl(url.to_string()));
        }
        let index = digits
            .parse::<i32>()
            .map_err(|_| CameraError::InvalidUrl(url.to_string()))?;
        Ok(Self {
            url: format!("{URL_PREFIX}{index}"),
            index: index as usize,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Device index named by the url.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for LiveVideoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// What a caller asks of a device. Zero means "use the device default".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamRequest {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub frequency: f32,
}

impl StreamRequest {
    pub fn new(index: usize, width: u32, height: u32, frequency: f32) -> Result<Self, CameraError> {
        if !frequency.is_finite() || frequency < 0.0 {
            return Err(CameraError::InvalidPreference(format!(
                "frequency must be a finite value >= 0, got {frequency}"
            )));
        }
        Ok(Self {
            index,
            width,
            height,
            frequency,
        })
    }

    /// Resolve the preferred size against a device default, per dimension.
    pub fn size_or(&self, default_width: u32, default_height: u32) -> (u32, u32) {
        (
            if self.width != 0 { self.width } else { default_width },
            if self.height != 0 { self.height } else { default_height },
        )
    }

    pub fn frequency_or(&self, default: f32) -> f32 {
        if self.frequency > 0.0 { self.frequency } else { default }
    }
}
