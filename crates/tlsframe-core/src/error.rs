/// Errors produced while parsing a TLS frame.
///
/// Every variant except [`ParseError::Incomplete`] means the bytes can never
/// parse, no matter how many more arrive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The structure being read declares more bytes than are present.
    /// `needed` and `available` count from the start of that structure.
    #[error("incomplete frame: need {needed} bytes, have {available}")]
    Incomplete { needed: usize, available: usize },

    /// The record-layer major version is not 3 (SSLv3/TLS).
    #[error("not an SSL/TLS record (major version {major})")]
    NotTls { major: u8 },

    /// A length prefix disagrees with the bytes it frames.
    #[error("{field}: declared length {declared} but {actual} bytes present")]
    LengthMismatch {
        field: &'static str,
        declared: usize,
        actual: usize,
    },

    /// A read or skip runs past the end of an already-bounded region.
    #[error("{field}: runs past the end of its enclosing structure")]
    Overrun { field: &'static str },

    /// A list of 2-byte entries has an odd byte length.
    #[error("{field}: odd byte length {len} for a list of 2-byte entries")]
    OddLength { field: &'static str, len: usize },

    /// The server_name entry is not of type host_name (0).
    #[error("unsupported server name type {0}")]
    UnsupportedNameType(u8),

    /// The host_name bytes are not valid UTF-8.
    #[error("server name is not valid UTF-8")]
    InvalidUtf8,
}

impl ParseError {
    /// True if retrying with more bytes of the same frame may succeed.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete { .. })
    }

    /// True if the frame is invalid and retrying will never succeed.
    pub fn is_malformed(&self) -> bool {
        !self.is_incomplete()
    }
}

/// Three-way outcome of a frame parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameStatus {
    Complete,
    Incomplete,
    Malformed,
}

impl FrameStatus {
    pub fn of(result: &Result<(), ParseError>) -> Self {
        match result {
            Ok(()) => Self::Complete,
            Err(e) if e.is_incomplete() => Self::Incomplete,
            Err(_) => Self::Malformed,
        }
    }
}
