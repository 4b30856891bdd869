//! Sequences, fixed arrays, sets and maps
//!
//! `Vec<u8>` and `[u8; N]` are byte-runs rather than collections of one-byte
//! elements: they are written raw, and appear as hex strings in map form.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use serde_json::Value;

use crate::binary::seq::{decode_elements, decode_entries, encode_element, encode_entry, write_runs, Shape};
use crate::binary::{decode_byte_array, decode_byte_run, encode_byte_array, encode_byte_run};
use crate::conv::{Decode, Encode, Kind};
use crate::error::{DataError, Result};
use crate::map::{self, bytes_from_value, check_byte_len, hex_value};
use crate::parse::ByteParser;
use crate::session::Session;
use crate::settings::TypeSettings;

const fn is_byte(kind: Kind) -> bool {
    matches!(kind, Kind::Uint(8))
}

fn to_bytes<'a, T: Encode + 'a>(items: impl IntoIterator<Item = &'a T>) -> Vec<u8> {
    items.into_iter().filter_map(Encode::as_byte).collect()
}

fn from_bytes<T: Decode>(bytes: &[u8]) -> Vec<T> {
    bytes.iter().copied().filter_map(T::from_byte).collect()
}

fn into_array<T, const N: usize>(items: Vec<T>) -> Result<[T; N]> {
    let actual = items.len();
    items.try_into().map_err(|_| {
        DataError::FixedLength {
            expected: N,
            actual,
        }
        .into()
    })
}

impl<T: Encode> Encode for Vec<T> {
    const KIND: Kind = if is_byte(T::KIND) {
        Kind::Bytes
    } else {
        Kind::Sequence
    };

    fn encode_bin(&self, s: &Session<'_>, ts: &TypeSettings, buf: &mut Vec<u8>) -> Result<()> {
        if is_byte(T::KIND) {
            return encode_byte_run::<Self>(s, ts, &to_bytes(self), buf);
        }
        let runs = self
            .iter()
            .enumerate()
            .map(|(index, elem)| encode_element::<Self, T>(s, index, elem))
            .collect::<Result<Vec<_>>>()?;
        write_runs::<Self, T>(s, ts, Shape::Sequence, runs, buf)
    }

    fn encode_map(&self, s: &Session<'_>, ts: &TypeSettings) -> Result<Value> {
        if is_byte(T::KIND) {
            check_byte_len(s, ts, self.len())?;
            return Ok(hex_value(&to_bytes(self)));
        }
        map::seq::encode_elements::<Self, T>(s, ts, Shape::Sequence, self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode_bin(s: &Session<'_>, ts: &TypeSettings, p: &mut ByteParser<'_>) -> Result<Self> {
        if is_byte(T::KIND) {
            return Ok(from_bytes(decode_byte_run::<Self>(s, ts, p)?));
        }
        let mut out = Vec::new();
        decode_elements::<Self, T>(s, ts, Shape::Sequence, p, |_, elem| {
            out.push(elem);
            Ok(())
        })?;
        Ok(out)
    }

    fn decode_map(s: &Session<'_>, ts: &TypeSettings, v: &Value) -> Result<Self> {
        if is_byte(T::KIND) {
            let bytes = bytes_from_value(v)?;
            check_byte_len(s, ts, bytes.len())?;
            return Ok(from_bytes(&bytes));
        }
        let mut out = Vec::new();
        map::seq::decode_elements::<Self, T>(s, ts, Shape::Sequence, v, |_, elem| {
            out.push(elem);
            Ok(())
        })?;
        Ok(out)
    }

    fn empty_value() -> Option<Self> {
        Some(Vec::new())
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    const KIND: Kind = if is_byte(T::KIND) {
        Kind::ByteArray
    } else {
        Kind::Array
    };

    fn encode_bin(&self, s: &Session<'_>, ts: &TypeSettings, buf: &mut Vec<u8>) -> Result<()> {
        if is_byte(T::KIND) {
            return encode_byte_array(ts, &to_bytes(self), buf);
        }
        let runs = self
            .iter()
            .enumerate()
            .map(|(index, elem)| encode_element::<Self, T>(s, index, elem))
            .collect::<Result<Vec<_>>>()?;
        write_runs::<Self, T>(s, ts, Shape::Array(N), runs, buf)
    }

    fn encode_map(&self, s: &Session<'_>, ts: &TypeSettings) -> Result<Value> {
        if is_byte(T::KIND) {
            return Ok(hex_value(&to_bytes(self)));
        }
        map::seq::encode_elements::<Self, T>(s, ts, Shape::Array(N), self)
    }

    fn is_empty_value(&self) -> bool {
        self.iter().all(Encode::is_empty_value)
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode_bin(s: &Session<'_>, ts: &TypeSettings, p: &mut ByteParser<'_>) -> Result<Self> {
        if is_byte(T::KIND) {
            let bytes = decode_byte_array::<N>(ts, p)?;
            return into_array(from_bytes(&bytes));
        }
        let mut out = Vec::with_capacity(N.min(p.remainder()));
        decode_elements::<Self, T>(s, ts, Shape::Array(N), p, |_, elem| {
            out.push(elem);
            Ok(())
        })?;
        into_array(out)
    }

    fn decode_map(s: &Session<'_>, ts: &TypeSettings, v: &Value) -> Result<Self> {
        if is_byte(T::KIND) {
            return into_array(from_bytes(&bytes_from_value(v)?));
        }
        let mut out = Vec::with_capacity(N);
        map::seq::decode_elements::<Self, T>(s, ts, Shape::Array(N), v, |_, elem| {
            out.push(elem);
            Ok(())
        })?;
        into_array(out)
    }

    fn empty_value() -> Option<Self> {
        let items = (0..N).map(|_| T::empty_value()).collect::<Option<Vec<T>>>()?;
        into_array(items).ok()
    }
}

fn duplicate(index: usize) -> crate::error::Error {
    DataError::DuplicateElement { index }.into()
}

/// Sets are written in ascending order of their serialized elements.
macro_rules! impl_set {
    ($($set:ident<T: $($bound:path),+>);* $(;)?) => {
        $(
            impl<T: Encode $(+ $bound)+> Encode for $set<T> {
                const KIND: Kind = Kind::Set;

                fn encode_bin(&self, s: &Session<'_>, ts: &TypeSettings, buf: &mut Vec<u8>) -> Result<()> {
                    let runs = self
                        .iter()
                        .enumerate()
                        .map(|(index, elem)| encode_element::<Self, T>(s, index, elem))
                        .collect::<Result<Vec<_>>>()?;
                    write_runs::<Self, T>(s, ts, Shape::Set, runs, buf)
                }

                fn encode_map(&self, s: &Session<'_>, ts: &TypeSettings) -> Result<Value> {
                    map::seq::encode_elements::<Self, T>(s, ts, Shape::Set, self)
                }

                fn is_empty_value(&self) -> bool {
                    self.is_empty()
                }
            }

            impl<T: Decode $(+ $bound)+> Decode for $set<T> {
                fn decode_bin(s: &Session<'_>, ts: &TypeSettings, p: &mut ByteParser<'_>) -> Result<Self> {
                    let mut out = $set::new();
                    decode_elements::<Self, T>(s, ts, Shape::Set, p, |index, elem| {
                        if out.insert(elem) { Ok(()) } else { Err(duplicate(index)) }
                    })?;
                    Ok(out)
                }

                fn decode_map(s: &Session<'_>, ts: &TypeSettings, v: &Value) -> Result<Self> {
                    let mut out = $set::new();
                    map::seq::decode_elements::<Self, T>(s, ts, Shape::Set, v, |index, elem| {
                        if out.insert(elem) { Ok(()) } else { Err(duplicate(index)) }
                    })?;
                    Ok(out)
                }

                fn empty_value() -> Option<Self> {
                    Some($set::new())
                }
            }
        )*
    };
}

impl_set! {
    BTreeSet<T: Ord>;
    HashSet<T: Eq, Hash>;
}

/// Maps are written as key-value runs in ascending order.
macro_rules! impl_map {
    ($($map:ident<K: $($bound:path),+>);* $(;)?) => {
        $(
            impl<K: Encode $(+ $bound)+, V: Encode> Encode for $map<K, V> {
                const KIND: Kind = Kind::Map;

                fn encode_bin(&self, s: &Session<'_>, ts: &TypeSettings, buf: &mut Vec<u8>) -> Result<()> {
                    let runs = self
                        .iter()
                        .enumerate()
                        .map(|(index, (key, value))| encode_entry::<Self, K, V>(s, index, key, value))
                        .collect::<Result<Vec<_>>>()?;
                    write_runs::<Self, K>(s, ts, Shape::Map, runs, buf)
                }

                fn encode_map(&self, s: &Session<'_>, ts: &TypeSettings) -> Result<Value> {
                    map::seq::encode_entries::<Self, K, V>(s, ts, self)
                }

                fn is_empty_value(&self) -> bool {
                    self.is_empty()
                }
            }

            impl<K: Decode $(+ $bound)+, V: Decode> Decode for $map<K, V> {
                fn decode_bin(s: &Session<'_>, ts: &TypeSettings, p: &mut ByteParser<'_>) -> Result<Self> {
                    let mut out = $map::new();
                    decode_entries::<Self, K, V>(s, ts, p, |index, key, value| {
                        match out.insert(key, value) {
                            None => Ok(()),
                            Some(_) => Err(duplicate(index)),
                        }
                    })?;
                    Ok(out)
                }

                fn decode_map(s: &Session<'_>, ts: &TypeSettings, v: &Value) -> Result<Self> {
                    let mut out = $map::new();
                    map::seq::decode_entries::<Self, K, V>(s, ts, v, |index, key, value| {
                        match out.insert(key, value) {
                            None => Ok(()),
                            Some(_) => Err(duplicate(index)),
                        }
                    })?;
                    Ok(out)
                }

                fn empty_value() -> Option<Self> {
                    Some($map::new())
                }
            }
        )*
    };
}

impl_map! {
    BTreeMap<K: Ord>;
    HashMap<K: Eq, Hash>;
}

#[cfg(test)]
mod test {
    use std::collections::{BTreeMap, HashSet};

    use crate::api::{Api, Options};
    use crate::context::Context;
    use crate::error::{DataError, Error, LengthError};
    use crate::settings::{ArrayRules, LengthPrefix, TypeSettings, ValidationMode};
    use serde_json::json;

    fn api() -> Api {
        let api = Api::new();
        api.register_type_settings::<Vec<u16>>(
            TypeSettings::new().with_length_prefix(LengthPrefix::Uint8),
        )
        .unwrap();
        api.register_type_settings::<HashSet<u16>>(
            TypeSettings::new().with_length_prefix(LengthPrefix::Uint8),
        )
        .unwrap();
        api.register_type_settings::<BTreeMap<u8, bool>>(
            TypeSettings::new().with_length_prefix(LengthPrefix::Uint16),
        )
        .unwrap();
        api.register_type_settings::<Vec<u8>>(
            TypeSettings::new().with_length_prefix(LengthPrefix::Uint32),
        )
        .unwrap();
        api
    }

    #[test]
    fn sequence_keeps_order() {
        let api = api();
        let ctx = Context::new();
        let bytes = api.encode(&ctx, &vec![2u16, 1], &Options::new()).unwrap();
        assert_eq!(bytes, vec![2, 2, 0, 1, 0]);
        let (back, used) = api
            .decode_value::<Vec<u16>>(&ctx, &bytes, &Options::new())
            .unwrap();
        assert_eq!((back, used), (vec![2, 1], 5));
    }

    #[test]
    fn lexical_ordering_sorts_runs() {
        let api = api();
        let ctx = Context::new();
        let opts = Options::new().with_type_settings(
            TypeSettings::new()
                .with_length_prefix(LengthPrefix::Uint8)
                .with_lexical_ordering(true),
        );
        let bytes = api.encode(&ctx, &vec![0x0102u16, 0x0201], &opts).unwrap();
        assert_eq!(bytes, vec![2, 0x01, 0x02, 0x02, 0x01]);
    }

    #[test]
    fn sets_are_canonical() {
        let api = api();
        let ctx = Context::new();
        let set: HashSet<u16> = [3, 1, 2].into_iter().collect();
        let bytes = api.encode(&ctx, &set, &Options::new()).unwrap();
        assert_eq!(bytes, vec![3, 1, 0, 2, 0, 3, 0]);
        assert!(matches!(
            api.decode_value::<HashSet<u16>>(&ctx, &[2, 1, 0, 1, 0], &Options::new()),
            Err(Error::Data(DataError::DuplicateElement { index: 1 }))
        ));
        assert!(matches!(
            api.decode_value::<HashSet<u16>>(&ctx, &[2, 2, 0, 1, 0], &Options::new()),
            Err(Error::Data(DataError::LexicalOrder { index: 1 }))
        ));
        assert_eq!(
            api.map_encode(&ctx, &set, &Options::new()).unwrap(),
            json!([1, 2, 3])
        );
    }

    #[test]
    fn maps_as_entries() {
        let api = api();
        let ctx = Context::new();
        let map: BTreeMap<u8, bool> = [(9, true), (4, false)].into_iter().collect();
        let bytes = api.encode(&ctx, &map, &Options::new()).unwrap();
        assert_eq!(bytes, vec![2, 0, 4, 0, 9, 1]);
        assert_eq!(
            api.map_encode(&ctx, &map, &Options::new()).unwrap(),
            json!({ "4": false, "9": true })
        );
        let mut back = BTreeMap::new();
        api.json_decode(&ctx, r#"{"9":true,"4":false}"#, &mut back, &Options::new())
            .unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn max_count_checked_before_elements() {
        let api = api();
        let ctx = Context::new();
        let opts = Options::new().with_validation().with_type_settings(
            TypeSettings::new()
                .with_length_prefix(LengthPrefix::Uint8)
                .with_array_rules(ArrayRules::new().with_max(2)),
        );
        // count of 200 with no element bytes behind it
        assert!(matches!(
            api.decode_value::<Vec<u16>>(&ctx, &[200], &opts),
            Err(Error::Length(LengthError::TooMany { max: 2, actual: 200 }))
        ));
    }

    #[test]
    fn zero_width_elements_bounded_by_input() {
        let api = api();
        let ctx = Context::new();
        let opts = Options::new()
            .with_type_settings(TypeSettings::new().with_length_prefix(LengthPrefix::Uint32));
        let units = vec![[0u8; 0]; 3];
        let bytes = api.encode(&ctx, &units, &opts).unwrap();
        assert_eq!(bytes, vec![3, 0, 0, 0]);
        assert_eq!(
            api.decode_value::<Vec<[u8; 0]>>(&ctx, &bytes, &opts).unwrap(),
            (units, 4)
        );
        assert!(matches!(
            api.decode_value::<Vec<[u8; 0]>>(&ctx, &[0xff, 0xff, 0xff, 0x01], &opts),
            Err(Error::Data(DataError::ImplausibleCount {
                count: 0x01ff_ffff,
                available: 4,
                ..
            }))
        ));
    }

    #[test]
    fn duplicates_rejected_under_validation() {
        let api = api();
        let ctx = Context::new();
        let opts = Options::new().with_validation().with_type_settings(
            TypeSettings::new()
                .with_length_prefix(LengthPrefix::Uint8)
                .with_array_rules(
                    ArrayRules::new().with_validation_mode(ValidationMode::NO_DUPLICATES),
                ),
        );
        assert!(matches!(
            api.encode(&ctx, &vec![5u16, 6, 5], &opts),
            Err(Error::Data(DataError::DuplicateElement { index: 2 }))
        ));
        assert!(api.encode(&ctx, &vec![5u16, 6, 5], &Options::new()).is_ok());
    }

    #[test]
    fn byte_forms() {
        let api = api();
        let ctx = Context::new();
        let bytes = api.encode(&ctx, &vec![0xabu8, 0xcd], &Options::new()).unwrap();
        assert_eq!(bytes, vec![2, 0, 0, 0, 0xab, 0xcd]);
        assert_eq!(
            api.map_encode(&ctx, &vec![0xabu8, 0xcd], &Options::new()).unwrap(),
            json!("0xabcd")
        );
        assert_eq!(api.encode(&ctx, &[1u8, 2, 3], &Options::new()).unwrap(), vec![1, 2, 3]);
        let (arr, _) = api
            .decode_value::<[u8; 3]>(&ctx, &[1, 2, 3], &Options::new())
            .unwrap();
        assert_eq!(arr, [1, 2, 3]);
        let mut back = [0u8; 2];
        assert!(matches!(
            api.map_decode(&ctx, &json!("0x010203"), &mut back, &Options::new()),
            Err(Error::Data(DataError::FixedLength { expected: 2, actual: 3 }))
        ));
    }
}
