//! Per-type and per-field codec configuration
//!
//! [`TypeSettings`] is an immutable, builder-style bundle of optional settings. The
//! settings that apply to a value are obtained by merging, field by field, the
//! call-site override, the field annotation and the registered default for the
//! value's type, with the first non-empty value winning.

use std::collections::BTreeSet;
use std::ops::BitOr;

use crate::conv::target::Target;
use crate::error::{ConfigError, LengthError};

/// Byte-width of a length or element-count prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LengthPrefix {
    Uint8,
    Uint16,
    Uint32,
    Uint64,
}

impl LengthPrefix {
    /// Number of bytes occupied by the prefix on the wire
    pub const fn width(self) -> usize {
        match self {
            Self::Uint8 => 1,
            Self::Uint16 => 2,
            Self::Uint32 => 4,
            Self::Uint64 => 8,
        }
    }

    /// Largest length the prefix can represent
    pub const fn max_len(self) -> u64 {
        match self {
            Self::Uint8 => u8::MAX as u64,
            Self::Uint16 => u16::MAX as u64,
            Self::Uint32 => u32::MAX as u64,
            Self::Uint64 => u64::MAX,
        }
    }

    /// Appends `len` in little-endian form, returning `None` if it does not fit.
    pub(crate) fn write_to<U: Target>(self, len: usize, buf: &mut U) -> Option<usize> {
        let len = u64::try_from(len).ok().filter(|&n| n <= self.max_len())?;
        Some(match self {
            Self::Uint8 => buf.push_one(len as u8),
            Self::Uint16 => buf.push_many((len as u16).to_le_bytes()),
            Self::Uint32 => buf.push_many((len as u32).to_le_bytes()),
            Self::Uint64 => buf.push_many(len.to_le_bytes()),
        })
    }
}

/// Byte-width of an object type code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeDenotation {
    Uint8,
    Uint32,
}

impl TypeDenotation {
    pub const fn width(self) -> usize {
        match self {
            Self::Uint8 => 1,
            Self::Uint32 => 4,
        }
    }

    pub const fn max_code(self) -> u32 {
        match self {
            Self::Uint8 => u8::MAX as u32,
            Self::Uint32 => u32::MAX,
        }
    }

    /// Reads a code of this width from the start of `bytes`, if long enough.
    pub(crate) fn read_code(self, bytes: &[u8]) -> Option<u32> {
        match self {
            Self::Uint8 => bytes.first().map(|&b| u32::from(b)),
            Self::Uint32 => bytes
                .get(..4)
                .and_then(|b| <[u8; 4]>::try_from(b).ok())
                .map(u32::from_le_bytes),
        }
    }
}

/// Discriminator written ahead of a value to identify its concrete type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectType {
    pub code: u32,
    pub denotation: TypeDenotation,
}

impl ObjectType {
    /// One-byte object code
    pub const fn uint8(code: u8) -> Self {
        Self {
            code: code as u32,
            denotation: TypeDenotation::Uint8,
        }
    }

    /// Four-byte object code
    pub const fn uint32(code: u32) -> Self {
        Self {
            code,
            denotation: TypeDenotation::Uint32,
        }
    }

    pub(crate) fn check_range(&self, type_name: &'static str) -> Result<(), ConfigError> {
        if self.code > self.denotation.max_code() {
            return Err(ConfigError::ObjectCodeOutOfRange {
                type_name,
                code: self.code,
                denotation: self.denotation,
            });
        }
        Ok(())
    }

    pub(crate) fn write_to<U: Target>(&self, buf: &mut U) -> usize {
        match self.denotation {
            TypeDenotation::Uint8 => buf.push_one(self.code as u8),
            TypeDenotation::Uint32 => buf.push_many(self.code.to_le_bytes()),
        }
    }
}

/// Bitmask of element-level checks applied to collections under validation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ValidationMode(u8);

impl ValidationMode {
    pub const NONE: Self = Self(0);
    /// No two serialized elements may be identical
    pub const NO_DUPLICATES: Self = Self(1);
    /// Serialized elements must appear in ascending lexical order
    pub const LEXICAL_ORDERING: Self = Self(1 << 1);
    /// No two elements may share an object type code
    pub const AT_MOST_ONE_OF_EACH_TYPE: Self = Self(1 << 2);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for ValidationMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Bounds and element-level constraints for strings, byte-runs and collections.
///
/// `min` and `max` of `0` leave the respective bound unchecked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArrayRules {
    pub min: usize,
    pub max: usize,
    pub must_occur: BTreeSet<u32>,
    pub validation_mode: ValidationMode,
}

impl ArrayRules {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_min(mut self, min: usize) -> Self {
        self.min = min;
        self
    }

    #[must_use]
    pub fn with_max(mut self, max: usize) -> Self {
        self.max = max;
        self
    }

    #[must_use]
    pub fn with_must_occur(mut self, codes: impl IntoIterator<Item = u32>) -> Self {
        self.must_occur.extend(codes);
        self
    }

    #[must_use]
    pub fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.validation_mode = self.validation_mode | mode;
        self
    }

    /// Checks an element count against `[min, max]`.
    pub fn check_bounds(&self, len: usize) -> Result<(), LengthError> {
        if self.min > 0 && len < self.min {
            return Err(LengthError::TooFew {
                min: self.min,
                actual: len,
            });
        }
        if self.max > 0 && len > self.max {
            return Err(LengthError::TooMany {
                max: self.max,
                actual: len,
            });
        }
        Ok(())
    }

    /// Checks a byte-length against `[min, max]`.
    pub fn check_byte_len(&self, len: usize) -> Result<(), LengthError> {
        self.check_bounds(len).map_err(|err| match err {
            LengthError::TooFew { min, actual } => LengthError::TooShort { min, actual },
            LengthError::TooMany { max, actual } => LengthError::TooLong { max, actual },
            other => other,
        })
    }

    /// Whether any check requires the object type code of each element.
    pub(crate) fn needs_codes(&self) -> bool {
        !self.must_occur.is_empty()
            || self
                .validation_mode
                .contains(ValidationMode::AT_MOST_ONE_OF_EACH_TYPE)
    }
}

/// Codec configuration for a type or a field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSettings {
    map_key: Option<String>,
    description: Option<String>,
    object_type: Option<ObjectType>,
    length_prefix: Option<LengthPrefix>,
    lexical_ordering: Option<bool>,
    array_rules: Option<ArrayRules>,
}

impl TypeSettings {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_map_key(mut self, key: impl Into<String>) -> Self {
        self.map_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_object_type(mut self, object_type: ObjectType) -> Self {
        self.object_type = Some(object_type);
        self
    }

    #[must_use]
    pub fn with_length_prefix(mut self, prefix: LengthPrefix) -> Self {
        self.length_prefix = Some(prefix);
        self
    }

    #[must_use]
    pub fn with_lexical_ordering(mut self, enabled: bool) -> Self {
        self.lexical_ordering = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_array_rules(mut self, rules: ArrayRules) -> Self {
        self.array_rules = Some(rules);
        self
    }

    pub fn map_key(&self) -> Option<&str> {
        self.map_key.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn object_type(&self) -> Option<ObjectType> {
        self.object_type
    }

    pub fn length_prefix(&self) -> Option<LengthPrefix> {
        self.length_prefix
    }

    pub fn lexical_ordering(&self) -> bool {
        self.lexical_ordering.unwrap_or(false)
    }

    pub fn array_rules(&self) -> Option<&ArrayRules> {
        self.array_rules.as_ref()
    }

    /// Returns the configured length prefix or a [`ConfigError::MissingLengthPrefix`]
    /// naming `type_name`.
    pub(crate) fn require_length_prefix(
        &self,
        type_name: &'static str,
    ) -> Result<LengthPrefix, ConfigError> {
        self.length_prefix
            .ok_or(ConfigError::MissingLengthPrefix { type_name })
    }

    /// Combines `self` with `other`, field by field; `self` wins wherever it is set.
    #[must_use]
    pub fn merge(&self, other: &TypeSettings) -> TypeSettings {
        TypeSettings {
            map_key: self.map_key.clone().or_else(|| other.map_key.clone()),
            description: self
                .description
                .clone()
                .or_else(|| other.description.clone()),
            object_type: self.object_type.or(other.object_type),
            length_prefix: self.length_prefix.or(other.length_prefix),
            lexical_ordering: self.lexical_ordering.or(other.lexical_ordering),
            array_rules: self
                .array_rules
                .clone()
                .or_else(|| other.array_rules.clone()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn merge_prefers_left() {
        let tag = TypeSettings::new()
            .with_length_prefix(LengthPrefix::Uint8)
            .with_map_key("tagged");
        let registered = TypeSettings::new()
            .with_length_prefix(LengthPrefix::Uint32)
            .with_object_type(ObjectType::uint8(3))
            .with_lexical_ordering(true);
        let merged = tag.merge(&registered);
        assert_eq!(merged.length_prefix(), Some(LengthPrefix::Uint8));
        assert_eq!(merged.map_key(), Some("tagged"));
        assert_eq!(merged.object_type(), Some(ObjectType::uint8(3)));
        assert!(merged.lexical_ordering());
    }

    #[test]
    fn bounds() {
        let rules = ArrayRules::new().with_min(2).with_max(4);
        assert_eq!(
            rules.check_bounds(1),
            Err(LengthError::TooFew { min: 2, actual: 1 })
        );
        assert_eq!(rules.check_bounds(4), Ok(()));
        assert_eq!(
            rules.check_byte_len(5),
            Err(LengthError::TooLong { max: 4, actual: 5 })
        );
        assert_eq!(ArrayRules::new().check_bounds(1_000), Ok(()));
    }

    #[test]
    fn prefix_overflow() {
        let mut buf = Vec::new();
        assert_eq!(LengthPrefix::Uint8.write_to(255, &mut buf), Some(1));
        assert_eq!(LengthPrefix::Uint8.write_to(256, &mut buf), None);
        assert_eq!(LengthPrefix::Uint16.write_to(0x0102, &mut buf), Some(2));
        assert_eq!(buf, vec![0xff, 0x02, 0x01]);
    }

    #[test]
    fn validation_mode_bits() {
        let mode = ValidationMode::NO_DUPLICATES | ValidationMode::LEXICAL_ORDERING;
        assert!(mode.contains(ValidationMode::NO_DUPLICATES));
        assert!(!mode.contains(ValidationMode::AT_MOST_ONE_OF_EACH_TYPE));
        assert!(ValidationMode::NONE.is_empty());
    }
}
