//! The IMEI handshake: `u16_be length || ASCII digits[length]`.

use crate::error::ImeiError;
use crate::reader::ByteReader;

pub fn decode_imei(buf: &[u8]) -> Result<String, ImeiError> {
    let mut r = ByteReader::new(buf);
    let length = r.read_u16()? as usize;
    let digits = r.read_bytes(length)?;
    if r.remaining() != 0 {
        return Err(ImeiError::ImeiLengthMismatch {
            expected: length,
            actual: length + r.remaining(),
        });
    }
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(ImeiError::ImeiNotAscii(b));
        }
    }
    // `digits` was just verified to be ASCII digits only.
    Ok(std::str::from_utf8(digits).unwrap().to_owned())
}

pub fn encode_imei(imei: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + imei.len());
    out.extend_from_slice(&(imei.len() as u16).to_be_bytes());
    out.extend_from_slice(imei.as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let imei = "356307042441013";
        let encoded = encode_imei(imei);
        assert_eq!(decode_imei(&encoded).unwrap(), imei);
    }

    #[test]
    fn scenario_a_handshake() {
        let hex = "000F333536333037303432343431303133";
        let bytes = crate::test_support::from_hex(hex);
        assert_eq!(decode_imei(&bytes).unwrap(), "356307042441013");
    }

    #[test]
    fn rejects_non_digit() {
        let mut buf = encode_imei("35630704244101A");
        // encode_imei doesn't validate; corrupt a digit to confirm decode does.
        buf[2] = b'3';
        let last = buf.len() - 1;
        buf[last] = b'!';
        assert_eq!(
            decode_imei(&buf).unwrap_err(),
            ImeiError::ImeiNotAscii(b'!')
        );
    }

    #[test]
    fn rejects_length_mismatch() {
        let mut buf = encode_imei("356307042441013");
        buf.push(0xAA);
        assert_eq!(
            decode_imei(&buf).unwrap_err(),
            ImeiError::ImeiLengthMismatch {
                expected: 15,
                actual: 16
            }
        );
    }

    #[test]
    fn length_prefix_of_zero_decodes_to_empty_string() {
        // decode_imei itself is agnostic to the 15-digit session invariant;
        // that policy lives in the session handshake (see session.rs tests).
        let empty = encode_imei("");
        assert_eq!(decode_imei(&empty).unwrap(), "");
    }
}
