use {crate::ObjectId, std::fmt};

#[derive(Debug)]
pub enum CameraError {
    /// URL is not `LiveVideoId:<n>` or names a device that does not exist.
    InvalidUrl(String),
    /// Negative or non-finite stream preference.
    InvalidPreference(String),
    /// Another live resource already owns this URL.
    DuplicateUrl(String),
    /// The registry holds its configured maximum of streams.
    TooManyStreams(usize),
    /// The id space available to the host is used up.
    IdsExhausted,
    UnknownId(ObjectId),
    /// The resource holds no device yet (waiting for `update()`, or suspended).
    NotInitialized(ObjectId),
    /// The operation is not allowed in the resource's current state.
    InvalidState(ObjectId, String),
    Device(String),
    Stream(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::InvalidUrl(url) => write!(f, "invalid live video url: {url}"),
            CameraError::InvalidPreference(msg) => write!(f, "invalid preference: {msg}"),
            CameraError::DuplicateUrl(url) => write!(f, "url already in use: {url}"),
            CameraError::TooManyStreams(max) => write!(f, "stream limit of {max} reached"),
            CameraError::IdsExhausted => write!(f, "object ids exhausted"),
            CameraError::UnknownId(id) => write!(f, "unknown resource {id}"),
            CameraError::NotInitialized(id) => write!(f, "resource {id} is not initialized"),
            CameraError::InvalidState(id, msg) => write!(f, "resource {id}: {msg}"),
            CameraError::Device(msg) => write!(f, "device error: {msg}"),
            CameraError::Stream(msg) => write!(f, "stream error: {msg}"),
        }
    }
}

impl std::error::Error for CameraError {}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::Device(err.to_string())
    }
}
