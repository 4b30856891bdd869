//! Element-wise encoding of collections
//!
//! Every element of a collection (for maps, every key followed by its value) is
//! encoded into its own byte-run. Runs are sorted when canonical ordering applies,
//! checked against the configured [`ArrayRules`] under validation, and written as
//! `[count][runs...]`.

use std::any::type_name;
use std::collections::HashSet;

use crate::binary::write_length;
use crate::conv::{target::Target, Decode, Encode};
use crate::error::{ConfigError, DataError, Result};
use crate::parse::ByteParser;
use crate::session::Session;
use crate::settings::{ArrayRules, TypeDenotation, TypeSettings, ValidationMode};

/// Layout family of a collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Sequence,
    /// Fixed number of elements, counted on the wire only if a prefix is configured
    Array(usize),
    Set,
    Map,
}

impl Shape {
    /// Sets and maps are always written in ascending order of their element runs,
    /// without duplicates.
    pub const fn is_canonical(self) -> bool {
        matches!(self, Shape::Set | Shape::Map)
    }
}

type Denote = fn(&Session<'_>) -> Result<Option<TypeDenotation>>;

/// Encodes one element into its own run, tagging failures with its index.
pub fn encode_element<C, E: Encode>(s: &Session<'_>, index: usize, elem: &E) -> Result<Vec<u8>> {
    let mut run = Vec::new();
    s.encode_nested(elem, None, &mut run)
        .map_err(|err| err.in_element::<C>("encode", index))?;
    Ok(run)
}

/// Encodes a map entry, key then value, into a single run.
pub fn encode_entry<C, K: Encode, V: Encode>(
    s: &Session<'_>,
    index: usize,
    key: &K,
    value: &V,
) -> Result<Vec<u8>> {
    let mut run = Vec::new();
    s.encode_nested(key, None, &mut run)
        .and_then(|()| s.encode_nested(value, None, &mut run))
        .map_err(|err| err.in_element::<C>("encode", index))?;
    Ok(run)
}

/// Writes the element runs of the collection `C`, whose elements are of type `E`.
pub fn write_runs<C, E: Encode>(
    s: &Session<'_>,
    ts: &TypeSettings,
    shape: Shape,
    mut runs: Vec<Vec<u8>>,
    buf: &mut Vec<u8>,
) -> Result<()> {
    if shape.is_canonical() || ts.lexical_ordering() {
        runs.sort();
    }
    if shape.is_canonical() {
        check_strictly_ascending(&runs)?;
    }
    if s.validation() {
        if let Some(rules) = ts.array_rules() {
            rules.check_bounds(runs.len())?;
            check_runs(s, rules, E::type_denotation, type_name::<E>(), &runs)?;
        }
    }
    match shape {
        Shape::Array(n) => {
            if runs.len() != n {
                return Err(DataError::FixedLength {
                    expected: n,
                    actual: runs.len(),
                }
                .into());
            }
            if let Some(prefix) = ts.length_prefix() {
                write_length(prefix, n, buf)?;
            }
        }
        _ => {
            let prefix = ts.require_length_prefix(type_name::<C>())?;
            write_length(prefix, runs.len(), buf)?;
        }
    }
    buf.anticipate(runs.iter().map(Vec::len).sum());
    for run in &runs {
        buf.push_all(run);
    }
    Ok(())
}

/// Reads the element count of the collection `C`.
///
/// Under validation the upper bound is enforced here, before any element is decoded.
pub fn read_count<C>(
    s: &Session<'_>,
    ts: &TypeSettings,
    shape: Shape,
    p: &mut ByteParser<'_>,
) -> Result<usize> {
    let count = match shape {
        Shape::Array(n) => {
            if let Some(prefix) = ts.length_prefix() {
                let declared = p.take_length(prefix)?;
                if declared != n {
                    return Err(DataError::FixedLength {
                        expected: n,
                        actual: declared,
                    }
                    .into());
                }
            }
            n
        }
        _ => p.take_length(ts.require_length_prefix(type_name::<C>())?)?,
    };
    if s.validation() {
        if let Some(rules) = ts.array_rules() {
            if rules.max > 0 && count > rules.max {
                rules.check_bounds(count)?;
            }
        }
    }
    Ok(count)
}

/// Capacity to reserve for `count` decoded elements, never more than the input
/// could possibly hold.
pub fn capacity_hint(count: usize, p: &ByteParser<'_>) -> usize {
    count.min(p.remainder())
}

/// Whether the byte-runs of decoded elements are needed by the checks that follow.
fn keeps_runs(s: &Session<'_>, ts: &TypeSettings, shape: Shape) -> bool {
    shape.is_canonical()
        || (s.validation() && (ts.lexical_ordering() || ts.array_rules().is_some()))
}

/// Bounds a wire count once an element has decoded from zero bytes.
///
/// Such elements put no lower bound on the input consumed per element, so the count
/// may not exceed the number of bytes visible to the parser.
fn check_zero_width<C>(shape: Shape, count: usize, run: &[u8], p: &ByteParser<'_>) -> Result<()> {
    if !run.is_empty() || matches!(shape, Shape::Array(_)) {
        return Ok(());
    }
    let available = p.offset() + p.remainder();
    if count > available {
        return Err(DataError::ImplausibleCount {
            type_name: type_name::<C>(),
            count,
            available,
        }
        .into());
    }
    Ok(())
}

/// Decodes the elements of the collection `C`, handing each one to `sink` in wire order.
pub fn decode_elements<C, E: Decode>(
    s: &Session<'_>,
    ts: &TypeSettings,
    shape: Shape,
    p: &mut ByteParser<'_>,
    mut sink: impl FnMut(usize, E) -> Result<()>,
) -> Result<()> {
    let count = read_count::<C>(s, ts, shape, p)?;
    let keep = keeps_runs(s, ts, shape);
    let mut spans = Vec::with_capacity(if keep { capacity_hint(count, p) } else { 0 });
    for index in 0..count {
        let start = p.offset();
        let elem = s
            .decode_nested::<E>(None, p)
            .map_err(|err| err.in_element::<C>("decode", index))?;
        let run = p.since(start);
        check_zero_width::<C>(shape, count, run, p)?;
        if keep {
            spans.push(run);
        }
        sink(index, elem)?;
    }
    if keep {
        check_decoded::<C, E>(s, ts, shape, &spans)?;
    }
    Ok(())
}

/// Decodes the entries of the map `C`, handing each key and value to `sink` in wire order.
pub fn decode_entries<C, K: Decode, V: Decode>(
    s: &Session<'_>,
    ts: &TypeSettings,
    p: &mut ByteParser<'_>,
    mut sink: impl FnMut(usize, K, V) -> Result<()>,
) -> Result<()> {
    let count = read_count::<C>(s, ts, Shape::Map, p)?;
    let mut spans = Vec::with_capacity(capacity_hint(count, p));
    for index in 0..count {
        let start = p.offset();
        let (key, value) = s
            .decode_nested::<K>(None, p)
            .and_then(|key| Ok((key, s.decode_nested::<V>(None, p)?)))
            .map_err(|err| err.in_element::<C>("decode", index))?;
        let run = p.since(start);
        check_zero_width::<C>(Shape::Map, count, run, p)?;
        spans.push(run);
        sink(index, key, value)?;
    }
    check_decoded::<C, K>(s, ts, Shape::Map, &spans)
}

fn check_decoded<C, E: Encode>(
    s: &Session<'_>,
    ts: &TypeSettings,
    shape: Shape,
    spans: &[&[u8]],
) -> Result<()> {
    if shape.is_canonical() {
        check_strictly_ascending(spans)?;
    } else if ts.lexical_ordering() && s.validation() {
        check_ascending(spans)?;
    }
    if s.validation() {
        if let Some(rules) = ts.array_rules() {
            rules.check_bounds(spans.len())?;
            check_runs(s, rules, E::type_denotation, type_name::<E>(), spans)?;
        }
    }
    Ok(())
}

fn check_ascending<R: AsRef<[u8]>>(runs: &[R]) -> Result<()> {
    for (ix, pair) in runs.windows(2).enumerate() {
        if pair[0].as_ref() > pair[1].as_ref() {
            return Err(DataError::LexicalOrder { index: ix + 1 }.into());
        }
    }
    Ok(())
}

fn check_strictly_ascending<R: AsRef<[u8]>>(runs: &[R]) -> Result<()> {
    for (ix, pair) in runs.windows(2).enumerate() {
        match pair[0].as_ref().cmp(pair[1].as_ref()) {
            std::cmp::Ordering::Less => {}
            std::cmp::Ordering::Equal => {
                return Err(DataError::DuplicateElement { index: ix + 1 }.into())
            }
            std::cmp::Ordering::Greater => {
                return Err(DataError::LexicalOrder { index: ix + 1 }.into())
            }
        }
    }
    Ok(())
}

/// Applies the element-level checks of `rules` to serialized elements.
fn check_runs<R: AsRef<[u8]>>(
    s: &Session<'_>,
    rules: &ArrayRules,
    denote: Denote,
    elem_type: &'static str,
    runs: &[R],
) -> Result<()> {
    let mode = rules.validation_mode;
    if mode.contains(ValidationMode::NO_DUPLICATES) {
        let mut seen = HashSet::with_capacity(runs.len());
        for (index, run) in runs.iter().enumerate() {
            if !seen.insert(run.as_ref()) {
                return Err(DataError::DuplicateElement { index }.into());
            }
        }
    }
    if mode.contains(ValidationMode::LEXICAL_ORDERING) {
        check_ascending(runs)?;
    }
    if !rules.needs_codes() {
        return Ok(());
    }
    let denotation = denote(s)?.ok_or(ConfigError::MissingTypeDenotation {
        type_name: elem_type,
    })?;
    let codes = runs
        .iter()
        .filter_map(|run| denotation.read_code(run.as_ref()));
    check_codes(rules, codes)
}

/// Checks the must-occur and one-of-each-type rules against element object codes.
pub(crate) fn check_codes(rules: &ArrayRules, codes: impl Iterator<Item = u32>) -> Result<()> {
    let unique = rules
        .validation_mode
        .contains(ValidationMode::AT_MOST_ONE_OF_EACH_TYPE);
    let mut seen = HashSet::new();
    for code in codes {
        if !seen.insert(code) && unique {
            return Err(DataError::DuplicateType { code }.into());
        }
    }
    match rules.must_occur.iter().find(|code| !seen.contains(*code)) {
        Some(&code) => Err(DataError::MustOccur { code }.into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;

    #[test]
    fn strict_order() {
        assert!(check_strictly_ascending(&[vec![1], vec![1, 0], vec![2]]).is_ok());
        assert!(matches!(
            check_strictly_ascending(&[vec![1], vec![1]]),
            Err(Error::Data(DataError::DuplicateElement { index: 1 }))
        ));
        assert!(matches!(
            check_strictly_ascending(&[vec![2], vec![1]]),
            Err(Error::Data(DataError::LexicalOrder { index: 1 }))
        ));
    }

    #[test]
    fn code_rules() {
        let rules = ArrayRules::new()
            .with_must_occur([1, 3])
            .with_validation_mode(ValidationMode::AT_MOST_ONE_OF_EACH_TYPE);
        assert!(check_codes(&rules, [3, 1, 2].into_iter()).is_ok());
        assert!(matches!(
            check_codes(&rules, [1, 2].into_iter()),
            Err(Error::Data(DataError::MustOccur { code: 3 }))
        ));
        assert!(matches!(
            check_codes(&rules, [1, 3, 1].into_iter()),
            Err(Error::Data(DataError::DuplicateType { code: 1 }))
        ));
    }
}
