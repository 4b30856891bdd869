use std::any::type_name;
use std::collections::HashSet;

use serde_json::Value;

use crate::binary::seq::{check_codes, Shape};
use crate::conv::{Decode, Encode};
use crate::error::{ConfigError, DataError, Result};
use crate::map::{expect_array, expect_object, TYPE_KEY};
use crate::session::Session;
use crate::settings::{TypeSettings, ValidationMode};
use crate::OrderedMap;

/// Builds the array of a sequence, fixed array or set.
///
/// Set elements are ordered by their JSON text, so that sets without a stable
/// iteration order still produce deterministic output.
pub fn encode_elements<'e, C, E: Encode + 'e>(
    s: &Session<'_>,
    ts: &TypeSettings,
    shape: Shape,
    items: impl IntoIterator<Item = &'e E>,
) -> Result<Value> {
    let mut values = items
        .into_iter()
        .enumerate()
        .map(|(index, elem)| {
            s.map_encode_nested(elem, None)
                .map_err(|err| err.in_element::<C>("encode", index))
        })
        .collect::<Result<Vec<_>>>()?;
    if shape.is_canonical() {
        let mut keyed = values
            .into_iter()
            .map(|v| serde_json::to_string(&v).map(|text| (text, v)))
            .collect::<Result<Vec<_>, _>>()?;
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        values = keyed.into_iter().map(|(_, v)| v).collect();
    }
    if let Shape::Array(n) = shape {
        if values.len() != n {
            return Err(DataError::FixedLength {
                expected: n,
                actual: values.len(),
            }
            .into());
        }
    }
    check_values(s, ts, &values)?;
    Ok(Value::Array(values))
}

/// Interprets the array of a sequence, fixed array or set, handing each element to
/// `sink` in order.
pub fn decode_elements<C, E: Decode>(
    s: &Session<'_>,
    ts: &TypeSettings,
    shape: Shape,
    v: &Value,
    mut sink: impl FnMut(usize, E) -> Result<()>,
) -> Result<()> {
    let values = expect_array(v)?;
    if let Shape::Array(n) = shape {
        if values.len() != n {
            return Err(DataError::FixedLength {
                expected: n,
                actual: values.len(),
            }
            .into());
        }
    }
    check_values(s, ts, values)?;
    for (index, value) in values.iter().enumerate() {
        let elem = s
            .map_decode_nested::<E>(None, value)
            .map_err(|err| err.in_element::<C>("decode", index))?;
        sink(index, elem)?;
    }
    Ok(())
}

/// String form of a map key.
fn key_string<K>(key: Value) -> Result<String> {
    match key {
        Value::String(text) => Ok(text),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(ConfigError::UnsupportedMapKey {
            type_name: type_name::<K>(),
        }
        .into()),
    }
}

/// Builds the object of a map, with entries sorted by key.
pub fn encode_entries<'e, C, K: Encode + 'e, V: Encode + 'e>(
    s: &Session<'_>,
    ts: &TypeSettings,
    items: impl IntoIterator<Item = (&'e K, &'e V)>,
) -> Result<Value> {
    let mut entries = items
        .into_iter()
        .enumerate()
        .map(|(index, (key, value))| {
            s.map_encode_nested(key, None)
                .and_then(key_string::<K>)
                .and_then(|key| Ok((key, s.map_encode_nested(value, None)?)))
                .map_err(|err| err.in_element::<C>("encode", index))
        })
        .collect::<Result<Vec<_>>>()?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    for (index, pair) in entries.windows(2).enumerate() {
        if pair[0].0 == pair[1].0 {
            return Err(DataError::DuplicateElement { index: index + 1 }.into());
        }
    }
    if s.validation() {
        if let Some(rules) = ts.array_rules() {
            rules.check_bounds(entries.len())?;
        }
    }
    Ok(Value::Object(entries.into_iter().collect::<OrderedMap>()))
}

/// Interprets the object of a map, handing each key and value to `sink`.
pub fn decode_entries<C, K: Decode, V: Decode>(
    s: &Session<'_>,
    ts: &TypeSettings,
    v: &Value,
    mut sink: impl FnMut(usize, K, V) -> Result<()>,
) -> Result<()> {
    let obj = expect_object(v)?;
    if s.validation() {
        if let Some(rules) = ts.array_rules() {
            rules.check_bounds(obj.len())?;
        }
    }
    for (index, (key, value)) in obj.iter().enumerate() {
        let (key, value) = s
            .map_decode_nested::<K>(None, &Value::String(key.clone()))
            .and_then(|key| Ok((key, s.map_decode_nested::<V>(None, value)?)))
            .map_err(|err| err.in_element::<C>("decode", index))?;
        sink(index, key, value)?;
    }
    Ok(())
}

/// Applies count bounds and element-level rules to map-form elements under validation.
fn check_values(s: &Session<'_>, ts: &TypeSettings, values: &[Value]) -> Result<()> {
    if !s.validation() {
        return Ok(());
    }
    let rules = match ts.array_rules() {
        Some(rules) => rules,
        None => return Ok(()),
    };
    rules.check_bounds(values.len())?;
    if rules
        .validation_mode
        .contains(ValidationMode::NO_DUPLICATES)
    {
        let mut seen = HashSet::with_capacity(values.len());
        for (index, value) in values.iter().enumerate() {
            if !seen.insert(serde_json::to_string(value)?) {
                return Err(DataError::DuplicateElement { index }.into());
            }
        }
    }
    if rules.needs_codes() {
        let codes = values.iter().filter_map(|v| {
            v.get(TYPE_KEY)
                .and_then(Value::as_u64)
                .and_then(|code| u32::try_from(code).ok())
        });
        check_codes(rules, codes)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn key_strings() {
        assert_eq!(key_string::<u32>(Value::from(7)).unwrap(), "7");
        assert_eq!(key_string::<String>(Value::from("k")).unwrap(), "k");
        assert!(key_string::<bool>(Value::Bool(true)).is_err());
    }
}
