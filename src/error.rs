//! General error types
//!
//! Every fallible operation in this crate returns [`Result<T>`], whose error type
//! [`Error`] is a layered enumeration over the classes of failure that can occur:
//!
//!   * [`ConfigError`] for mistakes in registry contents or field annotations, which are
//!     expected to be caught at start-up and are never retried.
//!   * [`DataError`] for values or byte-sequences that cannot be transcoded.
//!   * [`LengthError`] for violations of configured length and element-count bounds.
//!   * [`ParseError`] for low-level failures while consuming binary input.
//!   * `Validation` for errors returned verbatim by user-registered validators.
//!
//! Errors raised below a struct field or collection element are wrapped in
//! [`Error::Field`] or [`Error::Element`] as they propagate, so that the final
//! error carries the path to the offending value.

use thiserror::Error;

pub use crate::parse::error::ParseError;
use crate::settings::{LengthPrefix, TypeDenotation};

/// Boxed error type returned by user-supplied validators and self-describing codecs.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Result with an error type of [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Length(#[from] LengthError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("validation failed: {0}")]
    Validation(#[source] BoxError),
    #[error("JSON conversion failed: {0}")]
    Json(#[from] serde_json::Error),
    /// Context wrapper naming the struct field whose transcoding failed
    #[error("failed to {op} field `{field}` of struct `{type_name}`: {source}")]
    Field {
        op: &'static str,
        type_name: &'static str,
        field: &'static str,
        source: Box<Error>,
    },
    /// Context wrapper naming the collection element whose transcoding failed
    #[error("failed to {op} element {index} of `{type_name}`: {source}")]
    Element {
        op: &'static str,
        type_name: &'static str,
        index: usize,
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps `self` as the cause of a failure in field `field` of the struct type `T`.
    pub fn in_field<T: ?Sized>(self, op: &'static str, field: &'static str) -> Self {
        self.in_named_field(op, std::any::type_name::<T>(), field)
    }

    pub(crate) fn in_named_field(
        self,
        op: &'static str,
        type_name: &'static str,
        field: &'static str,
    ) -> Self {
        Self::Field {
            op,
            type_name,
            field,
            source: Box::new(self),
        }
    }

    /// Wraps `self` as the cause of a failure at position `index` of the collection type `T`.
    pub fn in_element<T: ?Sized>(self, op: &'static str, index: usize) -> Self {
        Self::Element {
            op,
            type_name: std::any::type_name::<T>(),
            index,
            source: Box::new(self),
        }
    }

    /// Strips all [`Error::Field`] and [`Error::Element`] wrappers, returning the
    /// error that originally caused the failure.
    #[must_use]
    pub fn root(&self) -> &Error {
        match self {
            Self::Field { source, .. } | Self::Element { source, .. } => source.root(),
            other => other,
        }
    }

    /// Renders the chain of context wrappers as a dotted path, e.g. `outer.items[2].name`.
    ///
    /// Returns an empty string when the error was raised at the top level.
    #[must_use]
    pub fn path(&self) -> String {
        let mut path = String::new();
        let mut cur = self;
        loop {
            match cur {
                Self::Field { field, source, .. } => {
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(field);
                    cur = source;
                }
                Self::Element { index, source, .. } => {
                    path.push_str(&format!("[{index}]"));
                    cur = source;
                }
                _ => return path,
            }
        }
    }

    pub(crate) fn validation(err: BoxError) -> Self {
        Self::Validation(err)
    }
}

/// Errors that indicate an inconsistent registry or invalid field annotations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("type `{type_name}` already has registered type settings")]
    TypeAlreadyRegistered { type_name: &'static str },
    #[error("type `{type_name}` already has a registered {hook} validator")]
    ValidatorAlreadyRegistered {
        type_name: &'static str,
        hook: &'static str,
    },
    #[error("struct `{type_name}` declares position {position} twice (fields `{first}` and `{second}`)")]
    DuplicatePosition {
        type_name: &'static str,
        position: u32,
        first: &'static str,
        second: &'static str,
    },
    #[error("field `{field}` of struct `{type_name}` cannot be optional: {reason}")]
    InvalidOptional {
        type_name: &'static str,
        field: &'static str,
        reason: &'static str,
    },
    #[error("field `{field}` of struct `{type_name}` cannot be inlined: {reason}")]
    InvalidInlined {
        type_name: &'static str,
        field: &'static str,
        reason: &'static str,
    },
    #[error("type `{type_name}` cannot be inlined into a parent struct")]
    NotInlinable { type_name: &'static str },
    #[error("no length prefix type configured for `{type_name}`")]
    MissingLengthPrefix { type_name: &'static str },
    #[error("type `{type_name}` has no object type code configured")]
    MissingObjectType { type_name: &'static str },
    #[error("object code {code} of `{type_name}` does not fit a {denotation:?} type denotation")]
    ObjectCodeOutOfRange {
        type_name: &'static str,
        code: u32,
        denotation: TypeDenotation,
    },
    #[error("interface `{interface}` uses {expected:?} type denotation, but `{type_name}` uses {actual:?}")]
    InterfaceDenotationMismatch {
        interface: &'static str,
        type_name: &'static str,
        expected: TypeDenotation,
        actual: TypeDenotation,
    },
    #[error("interface `{interface}` already has an implementation with object code {code}")]
    DuplicateObjectCode { interface: &'static str, code: u32 },
    #[error("interface `{interface}` has no registered implementations")]
    InterfaceNotRegistered { interface: &'static str },
    #[error("element type `{type_name}` has no type denotation, required by the configured array rules")]
    MissingTypeDenotation { type_name: &'static str },
    #[error("map key type `{type_name}` does not encode to a string-coercible value")]
    UnsupportedMapKey { type_name: &'static str },
}

/// Errors raised by values or inputs that cannot be transcoded
#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid UTF-8 in string: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("invalid boolean encoding 0x{0:02x}")]
    InvalidBool(u8),
    #[error(transparent)]
    InvalidHex(#[from] HexConvError),
    #[error("object code mismatch for `{type_name}`: expected {expected}, found {actual}")]
    ObjectCodeMismatch {
        type_name: &'static str,
        expected: u32,
        actual: u32,
    },
    #[error("type `{type_name}` is not registered as an implementation of interface `{interface}`")]
    UnregisteredInterfaceType {
        interface: &'static str,
        type_name: &'static str,
    },
    #[error("unknown object code {code} for interface `{interface}`")]
    UnknownObjectCode { interface: &'static str, code: u32 },
    #[error("present optional `{type_name}` encodes to zero bytes, which marks an absent value")]
    EmptyOptionalPayload { type_name: &'static str },
    #[error("optional payload declared {expected} bytes but {actual} were consumed")]
    PayloadLengthMismatch { expected: usize, actual: usize },
    #[error("self-describing decoder for `{type_name}` reported {consumed} bytes consumed out of {available}")]
    ConsumedOverflow {
        type_name: &'static str,
        consumed: usize,
        available: usize,
    },
    #[error("length {len} does not fit a {prefix:?} length prefix")]
    LengthPrefixOverflow { prefix: LengthPrefix, len: usize },
    #[error("expected exactly {expected} elements, found {actual}")]
    FixedLength { expected: usize, actual: usize },
    #[error("missing value for non-optional `{type_name}`")]
    NilValue { type_name: &'static str },
    #[error("missing key `{key}`")]
    MissingKey { key: String },
    #[error("expected {expected}, found {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },
    #[error("value `{value}` is out of range for `{type_name}`")]
    NumberOutOfRange {
        type_name: &'static str,
        value: String,
    },
    #[error("element {index} is a duplicate")]
    DuplicateElement { index: usize },
    #[error("element {index} is not in lexical order")]
    LexicalOrder { index: usize },
    #[error("object code {code} must occur at least once")]
    MustOccur { code: u32 },
    #[error("object code {code} occurs more than once")]
    DuplicateType { code: u32 },
    #[error("big integer of {bits} bits does not fit into 256 bits")]
    BigIntOverflow { bits: u64 },
    #[error("timestamp is out of the representable nanosecond range")]
    TimeOutOfRange,
    #[error("self-describing codec of `{type_name}` failed: {source}")]
    Codec {
        type_name: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("`{type_name}` declares {count} elements but only {available} bytes of input are available")]
    ImplausibleCount {
        type_name: &'static str,
        count: usize,
        available: usize,
    },
    #[error("{remaining} trailing bytes after decoding")]
    TrailingBytes { remaining: usize },
}

/// Enumerated error type for failures related to configured bounds
/// on the length of a byte-run or the element-count of a collection.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum LengthError {
    /// Minimum element-count not satisfied
    #[error("minimum elements not reached: {actual} < {min}")]
    TooFew { min: usize, actual: usize },
    /// Maximum element-count exceeded
    #[error("maximum elements exceeded: {actual} > {max}")]
    TooMany { max: usize, actual: usize },
    /// Minimum byte-length not satisfied
    #[error("minimum length not reached: {actual} bytes < {min}")]
    TooShort { min: usize, actual: usize },
    /// Maximum byte-length exceeded
    #[error("maximum length exceeded: {actual} bytes > {max}")]
    TooLong { max: usize, actual: usize },
}

/// Error type representing all possible conditions for invalidity
/// encountered when attempting to parse a string as a series
/// of hex-encoded bytes.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum HexConvError {
    /// Error case for odd-length strings
    #[error("hex-conversion failed on odd-length string `{0}`")]
    OddParity(String),
    /// Error case for strings containing non-hex characters,
    /// i.e. anything not in `[0-9a-fA-F]`.
    #[error("hex-conversion failed on non-hex character in `{0}`")]
    NonHex(String),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn path_follows_wrappers() {
        let err = Error::from(LengthError::TooFew { min: 2, actual: 1 })
            .in_field::<u8>("encode", "items")
            .in_element::<Vec<u8>>("encode", 3)
            .in_field::<u16>("encode", "outer");
        assert_eq!(err.path(), "outer[3].items");
        assert!(matches!(
            err.root(),
            Error::Length(LengthError::TooFew { min: 2, actual: 1 })
        ));
    }

    #[test]
    fn length_messages() {
        let few = LengthError::TooFew { min: 2, actual: 1 };
        let many = LengthError::TooMany { max: 4, actual: 5 };
        assert!(few.to_string().starts_with("minimum elements not reached"));
        assert!(many.to_string().starts_with("maximum elements exceeded"));
    }
}
