/// Result alias that carries the custom [`SyncFrameError`] type.
pub type Result<T> = std::result::Result<T, SyncFrameError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum SyncFrameError {
    /// Bad sampler or export parameters. Raised at construction only.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The resolved timeline duration was zero, negative or not finite.
    #[error("invalid duration: {0}")]
    InvalidDuration(f64),
    /// A transport call was issued from a phase that does not allow it.
    #[error("cannot {operation} while {from}")]
    InvalidStateTransition {
        from: crate::timeline::Phase,
        operation: &'static str,
    },
    /// A keyframe value that does not fit its property or cannot be parsed.
    #[error("malformed value: {0}")]
    MalformedValue(String),
    /// Lookup of an unknown keyframe.
    #[error("keyframe `{0}` not found")]
    NotFound(String),
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialisation failure.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// FFT planning or processing failure.
    #[error("{0}")]
    Fft(#[from] realfft::FftError),
    /// WAV decoding failure.
    #[error("{0}")]
    Wav(#[from] hound::Error),
}

impl SyncFrameError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub(crate) fn malformed<T: Into<String>>(msg: T) -> Self {
        Self::MalformedValue(msg.into())
    }
}

impl From<&str> for SyncFrameError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for SyncFrameError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
