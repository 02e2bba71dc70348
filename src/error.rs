/// Errors raised by the Telegram platform adapter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested Bot API operation has no implementation in [`ApiMethod`](crate::platform::telegram::ApiMethod).
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// No task is registered for the engine's active mode.
    #[error("no task registered for mode '{0}'")]
    UnknownMode(String),

    /// An update carried a `message` that does not have the expected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// The message `date` cannot be represented as a UTC timestamp.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),

    /// Transport failure talking to the Bot API.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Bot API answered with `ok: false`.
    #[error("telegram api error: {0}")]
    Api(String),

    /// Socket error while serving the webhook endpoint.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
