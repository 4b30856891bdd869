//! Timestamps
//!
//! A `DateTime<Utc>` is written as a signed 64-bit count of nanoseconds since the
//! Unix epoch, which covers the years 1677 through 2262. In map form the count is
//! a decimal string.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::conv::{target::Target, Decode, Encode, Kind};
use crate::error::{DataError, Result};
use crate::map::signed_from_value;
use crate::parse::ByteParser;
use crate::session::Session;
use crate::settings::TypeSettings;

fn nanos(t: &DateTime<Utc>) -> Result<i64> {
    t.timestamp_nanos_opt()
        .ok_or_else(|| DataError::TimeOutOfRange.into())
}

impl Encode for DateTime<Utc> {
    const KIND: Kind = Kind::Time;

    fn encode_bin(&self, _: &Session<'_>, _: &TypeSettings, buf: &mut Vec<u8>) -> Result<()> {
        buf.push_many(nanos(self)?.to_le_bytes());
        Ok(())
    }

    fn encode_map(&self, _: &Session<'_>, _: &TypeSettings) -> Result<Value> {
        Ok(Value::String(nanos(self)?.to_string()))
    }
}

impl Decode for DateTime<Utc> {
    fn decode_bin(_: &Session<'_>, _: &TypeSettings, p: &mut ByteParser<'_>) -> Result<Self> {
        Ok(Utc.timestamp_nanos(i64::from_le_bytes(p.consume_arr()?)))
    }

    fn decode_map(_: &Session<'_>, _: &TypeSettings, v: &Value) -> Result<Self> {
        Ok(Utc.timestamp_nanos(signed_from_value::<i64>(v)?))
    }
}
