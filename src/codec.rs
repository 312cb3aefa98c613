//! Text encodings for binary identifiers

use crate::error::{Error, Result};

/// Crockford base-32 without check symbol
///
/// Bits are consumed most significant first; a trailing partial group is
/// padded with zero bits. Output is lower case, input is case-insensitive.
pub mod crockford {
    use super::*;

    const ALPHABET: &[u8; 32] = b"0123456789abcdefghjkmnpqrstvwxyz";

    pub fn encode(input: &[u8]) -> String {
        let mut out = String::with_capacity((input.len() * 8).div_ceil(5));
        let mut acc: u32 = 0;
        let mut bits = 0u32;

        for &byte in input {
            acc = (acc << 8) | byte as u32;
            bits += 8;
            while bits >= 5 {
                bits -= 5;
                out.push(ALPHABET[((acc >> bits) & 0x1f) as usize] as char);
            }
            acc &= (1 << bits) - 1;
        }
        if bits > 0 {
            out.push(ALPHABET[((acc << (5 - bits)) & 0x1f) as usize] as char);
        }
        out
    }

    fn symbol_value(c: char) -> Option<u32> {
        let value = match c.to_ascii_uppercase() {
            'O' => 0,
            'I' | 'L' => 1,
            c @ '0'..='9' => c as u32 - '0' as u32,
            c @ 'A'..='H' => c as u32 - 'A' as u32 + 10,
            'J' => 18,
            'K' => 19,
            'M' => 20,
            'N' => 21,
            c @ 'P'..='T' => c as u32 - 'P' as u32 + 22,
            c @ 'V'..='Z' => c as u32 - 'V' as u32 + 27,
            _ => return None,
        };
        Some(value)
    }

    /// Decode, ignoring `-` separators
    ///
    /// Padding bits must be zero and no symbol may be left over, so every
    /// byte string has exactly one accepted encoding up to case, aliases and
    /// separators.
    pub fn decode(input: &str) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(input.len() * 5 / 8);
        let mut acc: u32 = 0;
        let mut bits = 0u32;

        for c in input.chars().filter(|&c| c != '-') {
            let value = symbol_value(c).ok_or_else(|| {
                Error::InvalidKeyEncoding(format!("invalid character {:?}", c))
            })?;
            acc = (acc << 5) | value;
            bits += 5;
            if bits >= 8 {
                bits -= 8;
                out.push((acc >> bits) as u8);
                acc &= (1 << bits) - 1;
            }
        }

        if bits >= 5 {
            return Err(Error::InvalidKeyEncoding(
                "trailing symbol does not complete a byte".to_string(),
            ));
        }
        if acc != 0 {
            return Err(Error::InvalidKeyEncoding(
                "non-zero padding bits".to_string(),
            ));
        }
        Ok(out)
    }
}

/// Order identifiers
///
/// An order key is 16 bytes holding a little-endian 128-bit integer whose
/// upper 64 bits are the price. The id reverses the bytes before encoding, so
/// ids compare lexicographically in the same order as the keys compare
/// numerically.
pub mod order_id {
    use super::*;

    /// Characters in an encoded order id
    pub const ORDER_ID_LEN: usize = 26;

    pub fn encode(key: &[u8; 16]) -> String {
        let mut reversed = *key;
        reversed.reverse();
        crockford::encode(&reversed)
    }

    pub fn decode(text: &str) -> Result<[u8; 16]> {
        let bytes = crockford::decode(text)?;
        let mut key: [u8; 16] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            Error::InvalidKeyEncoding(format!(
                "order id decodes to {} bytes, expected 16",
                bytes.len()
            ))
        })?;
        key.reverse();
        Ok(key)
    }
}
