use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Xml(#[from] quick_xml::DeError),
    /// The underlying transport ended before the current message produced
    /// any data. Distinct from the per-message end of file reported by an
    /// incoming message handle.
    #[error("end of stream")]
    EndOfStream,
    #[error("write on closed message")]
    ClosedPipe,
    #[error("missing <hello> element")]
    MissingHello,
    #[error("missing non-empty <capability> element(s)")]
    MissingCapabilities,
    #[error("no session-id received for client session")]
    SessionIdExpected,
    #[error("session-id received from client peer")]
    SessionIdUnexpected,
    #[error("invalid session-id value")]
    InvalidSessionId,
    #[error("missing session-id value")]
    MissingSessionIdValue,
    #[error("session failed to negotiate framing mode")]
    FramingNegotiation,
}

/// Protocol errors raised by the RFC 6242 framing decoder.
///
/// These are kept apart from [`Error`] so the transport reader can latch
/// one and keep returning it after the valid payload prefix has been
/// drained.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid chunk header")]
    InvalidChunkHeader,
    #[error("invalid chunk size")]
    InvalidChunkSize,
    #[error("chunk-size token too long")]
    ChunkSizeTooLong,
    #[error("chunk size larger than maximum (4294967295)")]
    ChunkSizeTooLarge,
    #[error("end-of-chunks seen prior to chunk")]
    ZeroChunks,
    #[error("unexpected EOF")]
    UnexpectedEof,
}
