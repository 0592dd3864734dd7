use thiserror::Error;

/// Transport failures of the probe. Never surfaced by the verifier: they end
/// up in the transcript and as an `Inconclusive` reason.
#[derive(Debug, Error)]
pub enum SmtpVerifyError {
    #[error("cannot resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no socket address for {host}")]
    NoAddress { host: String },
    #[error("connection to {host} failed: {source}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
    #[error("connection closed by peer")]
    Closed,
    #[error("reply exceeds SMTP line limits")]
    ReplyTooLong,
    #[error("deadline exceeded before connecting")]
    DeadlineExceeded,
}

impl SmtpVerifyError {
    pub(crate) fn io(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}
