//! Unsigned big integers as fixed 256-bit words
//!
//! A [`BigUint`] is written as exactly [`WORD_BYTES`] little-endian bytes, padded with
//! zeros. Values needing more than 256 bits cannot be encoded. In map form the value
//! is a `0x`-prefixed lowercase hex string without leading zeros.

use num_bigint::BigUint;
use num_integer::Integer;
use serde_json::Value;

use crate::conv::{target::Target, Decode, Encode, Kind};
use crate::error::{DataError, HexConvError, Result};
use crate::hexstring::strip_prefix;
use crate::map::expect_str;
use crate::parse::ByteParser;
use crate::session::Session;
use crate::settings::TypeSettings;

/// Width of the binary encoding in bytes
pub const WORD_BYTES: usize = 32;

const WORD_BITS: u64 = (WORD_BYTES as u64) * 8;

fn check_width(n: &BigUint) -> Result<()> {
    let bits = n.bits();
    if bits > WORD_BITS {
        return Err(DataError::BigIntOverflow { bits }.into());
    }
    Ok(())
}

impl Encode for BigUint {
    const KIND: Kind = Kind::BigInt;

    fn encode_bin(&self, _: &Session<'_>, _: &TypeSettings, buf: &mut Vec<u8>) -> Result<()> {
        check_width(self)?;
        let mut word = [0u8; WORD_BYTES];
        let used = Integer::div_ceil(&self.bits(), &8) as usize;
        word[..used].copy_from_slice(&self.to_bytes_le()[..used]);
        buf.push_many(word);
        Ok(())
    }

    fn encode_map(&self, _: &Session<'_>, _: &TypeSettings) -> Result<Value> {
        check_width(self)?;
        Ok(Value::String(format!("0x{}", self.to_str_radix(16))))
    }

    fn is_empty_value(&self) -> bool {
        self.bits() == 0
    }
}

impl Decode for BigUint {
    fn decode_bin(_: &Session<'_>, _: &TypeSettings, p: &mut ByteParser<'_>) -> Result<Self> {
        let word = p.consume_arr::<WORD_BYTES>()?;
        Ok(BigUint::from_bytes_le(&word))
    }

    fn decode_map(_: &Session<'_>, _: &TypeSettings, v: &Value) -> Result<Self> {
        let text = expect_str(v)?;
        let digits = strip_prefix(text);
        let n = BigUint::parse_bytes(digits.as_bytes(), 16)
            .ok_or_else(|| DataError::from(HexConvError::NonHex(text.to_owned())))?;
        check_width(&n)?;
        Ok(n)
    }

    fn empty_value() -> Option<Self> {
        Some(BigUint::default())
    }
}

#[cfg(test)]
mod test {
    use num_bigint::BigUint;
    use serde_json::json;

    use super::WORD_BYTES;
    use crate::api::{Api, Options};
    use crate::context::Context;
    use crate::error::{DataError, Error};

    #[test]
    fn fixed_width_words() {
        let api = Api::new();
        let ctx = Context::new();
        let opts = Options::new();
        let n = BigUint::from(0x0102_0304u32);
        let bytes = api.encode(&ctx, &n, &opts).unwrap();
        assert_eq!(bytes.len(), WORD_BYTES);
        assert_eq!(&bytes[..5], &[4, 3, 2, 1, 0]);
        assert_eq!(api.decode_value::<BigUint>(&ctx, &bytes, &opts).unwrap(), (n, 32));

        let zero = api.encode(&ctx, &BigUint::default(), &opts).unwrap();
        assert_eq!(zero, vec![0; WORD_BYTES]);
    }

    #[test]
    fn wider_than_256_bits() {
        let api = Api::new();
        let too_big = BigUint::from(1u8) << 256u32;
        assert!(matches!(
            api.encode(&Context::new(), &too_big, &Options::new()),
            Err(Error::Data(DataError::BigIntOverflow { bits: 257 }))
        ));
        let max = (BigUint::from(1u8) << 256u32) - 1u8;
        assert_eq!(
            api.encode(&Context::new(), &max, &Options::new()).unwrap(),
            vec![0xff; WORD_BYTES]
        );
    }

    #[test]
    fn hex_in_map_form() {
        let api = Api::new();
        let ctx = Context::new();
        let opts = Options::new();
        assert_eq!(api.map_encode(&ctx, &BigUint::default(), &opts).unwrap(), json!("0x0"));
        assert_eq!(
            api.map_encode(&ctx, &BigUint::from(0xabcu32), &opts).unwrap(),
            json!("0xabc")
        );
        let mut n = BigUint::default();
        api.map_decode(&ctx, &json!("0x00ff"), &mut n, &opts).unwrap();
        assert_eq!(n, BigUint::from(255u32));
        assert!(matches!(
            api.map_decode(&ctx, &json!("0xzz"), &mut n, &opts),
            Err(Error::Data(DataError::InvalidHex(_)))
        ));
    }
}
