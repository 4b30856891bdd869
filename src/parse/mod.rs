//! Byte-level parsing with context windows
//!
//! [`ByteParser`] is a non-backtracking cursor over an immutable byte slice.
//! A byte can only be viewed by consuming it (the single exception being
//! [`ByteParser::peek`], used to resolve interface discriminators), and once
//! consumed it cannot be consumed again.
//!
//! # Context-Windows
//!
//! To bound the decoding of length-prefixed payloads, the parser maintains a stack of
//! *context windows*. While a window is open, bytes beyond its upper bound cannot be
//! consumed. A window is lifted by [`ByteParser::enforce_target`], which fails when
//! any byte within the window was left unconsumed.
//!
//! The following properties hold:
//!
//! * A fresh parser has `offset() == 0` and `remainder()` equal to the length of the buffer
//! * `remainder()` is the largest `n` for which `consume(n)` succeeds
//! * immediately after a successful `set_fit(n)`, `remainder() == n`
//! * `enforce_target()` succeeds only when `remainder() == 0` and a window is open

pub mod error;

use error::coerce_slice;
pub use error::{ParseError, ParseResult};

use crate::settings::{LengthPrefix, TypeDenotation};

#[derive(Debug, Clone)]
pub struct ByteParser<'a> {
    buf: &'a [u8],
    offset: usize,
    windows: Vec<usize>,
}

impl<'a> ByteParser<'a> {
    /// Constructs a parser over `buf` with no open context windows.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            windows: Vec::new(),
        }
    }

    /// Number of bytes consumed so far.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    fn limit(&self) -> usize {
        self.windows.last().copied().unwrap_or(self.buf.len())
    }

    /// Number of bytes that can be consumed in the current context.
    #[inline]
    pub fn remainder(&self) -> usize {
        self.limit() - self.offset
    }

    /// The unconsumed bytes of the current context, without consuming them.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.offset..self.limit()]
    }

    /// Bytes consumed since the offset `start`, which must not exceed the current offset.
    #[inline]
    pub fn since(&self, start: usize) -> &'a [u8] {
        &self.buf[start..self.offset]
    }

    /// Attempts to consume and return a slice of length `nbytes`.
    ///
    /// If either the end of the buffer or the current window would be violated,
    /// no bytes are consumed.
    pub fn consume(&mut self, nbytes: usize) -> ParseResult<&'a [u8]> {
        let limit = self.limit();
        match self.offset.checked_add(nbytes) {
            Some(end) if end <= limit => {
                let ret = &self.buf[self.offset..end];
                self.offset = end;
                Ok(ret)
            }
            _ => Err(ParseError::NotEnoughData {
                offset: self.offset,
                requested: nbytes,
                limit,
            }),
        }
    }

    /// Returns the next `nbytes` bytes without consuming them.
    pub fn peek(&self, nbytes: usize) -> ParseResult<&'a [u8]> {
        if nbytes <= self.remainder() {
            Ok(&self.buf[self.offset..self.offset + nbytes])
        } else {
            Err(ParseError::NotEnoughData {
                offset: self.offset,
                requested: nbytes,
                limit: self.limit(),
            })
        }
    }

    /// Consumes `N` bytes and returns them in array-form
    #[inline]
    pub fn consume_arr<const N: usize>(&mut self) -> ParseResult<[u8; N]> {
        let offset = self.offset;
        coerce_slice(self.consume(N)?, offset)
    }

    /// Consumes one byte
    #[inline]
    pub fn take_u8(&mut self) -> ParseResult<u8> {
        Ok(self.consume_arr::<1>()?[0])
    }

    /// Consumes a little-endian length prefix of the given width.
    pub fn take_length(&mut self, prefix: LengthPrefix) -> ParseResult<usize> {
        let raw: u64 = match prefix {
            LengthPrefix::Uint8 => u64::from(self.take_u8()?),
            LengthPrefix::Uint16 => u64::from(u16::from_le_bytes(self.consume_arr()?)),
            LengthPrefix::Uint32 => u64::from(u32::from_le_bytes(self.consume_arr()?)),
            LengthPrefix::Uint64 => u64::from_le_bytes(self.consume_arr()?),
        };
        usize::try_from(raw).map_err(|_| ParseError::LengthOverflow(raw))
    }

    /// Consumes an object type code of the given width.
    pub fn take_code(&mut self, denotation: TypeDenotation) -> ParseResult<u32> {
        Ok(match denotation {
            TypeDenotation::Uint8 => u32::from(self.take_u8()?),
            TypeDenotation::Uint32 => u32::from_le_bytes(self.consume_arr()?),
        })
    }

    /// Reads an object type code of the given width without consuming it.
    pub fn peek_code(&self, denotation: TypeDenotation) -> ParseResult<u32> {
        self.clone().take_code(denotation)
    }

    /// Opens a context-window that permits exactly `n` more bytes to be consumed.
    pub fn set_fit(&mut self, n: usize) -> ParseResult<()> {
        if n > self.remainder() {
            return Err(ParseError::OpenWouldExceedBuffer {
                bytes_left: self.remainder(),
                request: n,
            });
        }
        self.windows.push(self.offset + n);
        Ok(())
    }

    /// Closes the narrowest context-window, failing if it still contains unconsumed bytes.
    pub fn enforce_target(&mut self) -> ParseResult<()> {
        match self.windows.last() {
            None => Err(ParseError::CloseWithoutWindow),
            Some(&tgt) if tgt == self.offset => {
                self.windows.pop();
                Ok(())
            }
            Some(&tgt) => Err(ParseError::CloseWithResidue {
                residual: tgt - self.offset,
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn consume_respects_windows() {
        let bytes = [1u8, 2, 3, 4, 5];
        let mut p = ByteParser::new(&bytes);
        assert_eq!(p.consume(1).unwrap(), &[1]);
        p.set_fit(2).unwrap();
        assert_eq!(p.remainder(), 2);
        assert!(matches!(
            p.consume(3),
            Err(ParseError::NotEnoughData { requested: 3, .. })
        ));
        assert_eq!(p.consume(1).unwrap(), &[2]);
        assert_eq!(
            p.enforce_target(),
            Err(ParseError::CloseWithResidue { residual: 1 })
        );
        p.consume(1).unwrap();
        p.enforce_target().unwrap();
        assert_eq!(p.remainder(), 2);
        assert_eq!(p.since(1), &[2, 3]);
    }

    #[test]
    fn length_prefixes_are_little_endian() {
        let bytes = [0x02, 0x01, 0xff];
        let mut p = ByteParser::new(&bytes);
        assert_eq!(p.take_length(LengthPrefix::Uint16).unwrap(), 0x0102);
        assert_eq!(p.peek(1).unwrap(), &[0xff]);
        assert!(p.peek(2).is_err());
        assert_eq!(p.take_u8().unwrap(), 0xff);
        assert_eq!(p.enforce_target(), Err(ParseError::CloseWithoutWindow));
    }

    #[test]
    fn peeked_code_is_not_consumed() {
        let bytes = [0x2a, 0, 0, 0];
        let mut p = ByteParser::new(&bytes);
        assert_eq!(p.peek_code(TypeDenotation::Uint32).unwrap(), 42);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.take_code(TypeDenotation::Uint8).unwrap(), 42);
        assert!(p.take_code(TypeDenotation::Uint32).is_err());
    }
}
