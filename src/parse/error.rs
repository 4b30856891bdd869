//! Error types used to report failure in low-level parsing
//!
//! These errors are raised by [`ByteParser`](super::ByteParser) when a request
//! cannot be satisfied by the remaining input, or when the context-window
//! discipline is violated.

use thiserror::Error;

/// Errors related to consuming bytes and managing context-windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A consume operation would violate either the absolute end-of-buffer
    /// or the current context-window.
    ///
    /// The distinction between absolute overrun and contextual overrun is not
    /// made at this level.
    #[error("not enough data: cannot consume {requested} bytes at offset {offset} (limit {limit})")]
    NotEnoughData {
        offset: usize,
        requested: usize,
        limit: usize,
    },
    /// Opening a window that would extend beyond the narrowest open window,
    /// or beyond the end of the buffer.
    #[error("not enough data: cannot open {request}-byte window with only {bytes_left} bytes left")]
    OpenWouldExceedBuffer { bytes_left: usize, request: usize },
    /// Closing the narrowest open window while unconsumed bytes remain inside it.
    #[error("cannot close context window with {residual} residual bytes")]
    CloseWithResidue { residual: usize },
    /// Closing a window when none are open.
    #[error("no context window to close")]
    CloseWithoutWindow,
    /// A length prefix exceeds the addressable range of this platform.
    #[error("length prefix {0} does not fit into usize")]
    LengthOverflow(u64),
}

/// Type alias for Result with an error type of [`ParseError`]
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Converts a borrowed byte-slice of known length into an owned byte-array
///
/// The caller guarantees that `bytes.len() == N`; any other length is reported
/// as a shortfall.
pub(crate) fn coerce_slice<const N: usize>(bytes: &[u8], offset: usize) -> ParseResult<[u8; N]> {
    <[u8; N]>::try_from(bytes).map_err(|_| ParseError::NotEnoughData {
        offset,
        requested: N,
        limit: offset + bytes.len(),
    })
}
