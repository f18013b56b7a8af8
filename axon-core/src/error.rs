#[derive(Debug, thiserror::Error)]
pub enum AxonError {
    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Memory error: {0}")]
    Memory(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl AxonError {
    /// The canonical error code carried on a failed `AgentResponse`.
    pub fn code(&self) -> &'static str {
        match self {
            AxonError::Timeout(_) => "timeout",
            AxonError::Config(_) => "invalid_request",
            _ => "server_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, AxonError>;
