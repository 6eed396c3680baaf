//! Frame decoder/encoder (C4/C9): preamble, length, codec id, record count,
//! the record payload, trailing record-count echo, and CRC trailer.

use crate::crc16::crc16_ibm;
use crate::error::FrameError;
use crate::reader::ByteReader;
use crate::record::{decode_record, encode_record, AvlRecord};

pub const CODEC_8E: u8 = 0x8E;

/// The number of bytes that must be buffered (beyond what's already been
/// peeked as the length prefix) before a frame decode can be attempted.
/// See spec.md §9 Open Question 5 (buffered-read framing).
pub fn frame_total_len(data_length: u32) -> usize {
    // preamble(4) + data_length field(4) + data_length bytes + record_count_trailer is
    // already included in data_length's span... no: data_length covers codec_id +
    // record_count_header + payload + record_count_trailer (CRC excluded, preamble excluded).
    8 + data_length as usize + 4
}

/// Peeks the 4-byte data_length field (offset 4..8) without consuming
/// anything, so the session can decide whether enough bytes are buffered.
pub fn peek_data_length(buf: &[u8]) -> Result<u32, FrameError> {
    let mut r = ByteReader::new(buf);
    r.advance(4)?; // preamble
    Ok(r.read_u32()?)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub records: Vec<AvlRecord>,
    pub crc_ok: bool,
}

/// Decodes exactly one frame from `buf`. `buf` must contain at least
/// `frame_total_len(data_length)` bytes; extra trailing bytes are ignored
/// (the session is expected to slice exactly the right span first).
pub fn decode_frame(buf: &[u8], imei: &str) -> Result<DecodedFrame, FrameError> {
    let mut r = ByteReader::new(buf);

    let preamble = r.read_u32()?;
    if preamble != 0 {
        return Err(FrameError::InvalidPreamble(preamble));
    }

    let data_length = r.read_u32()?;
    let codec_id = r.read_u8()?;
    if codec_id != CODEC_8E {
        return Err(FrameError::UnsupportedCodec(codec_id));
    }

    let record_count_header = r.read_u8()?;
    let mut records = Vec::with_capacity(record_count_header as usize);
    for _ in 0..record_count_header {
        records.push(decode_record(&mut r, imei)?);
    }

    let record_count_trailer = r.read_u8()?;
    if record_count_trailer != record_count_header {
        return Err(FrameError::RecordCountMismatch {
            header: record_count_header,
            trailer: record_count_trailer,
        });
    }

    let crc_field = r.read_u32()?;
    let crc_region = &buf[8..8 + data_length as usize];
    let computed = crc16_ibm(crc_region);
    let crc_ok = computed as u32 == crc_field;

    Ok(DecodedFrame { records, crc_ok })
}

/// Inverse of `decode_frame`, used by the simulator and test harness.
pub fn encode_frame(records: &[AvlRecord]) -> Vec<u8> {
    let mut body = Vec::new();
    body.push(CODEC_8E);
    body.push(records.len() as u8);
    for rec in records {
        encode_record(rec, &mut body);
    }
    body.push(records.len() as u8);

    let data_length = body.len() as u32;

    let mut frame = Vec::with_capacity(8 + body.len() + 4);
    frame.extend_from_slice(&0u32.to_be_bytes());
    frame.extend_from_slice(&data_length.to_be_bytes());
    frame.extend_from_slice(&body);

    let crc = crc16_ibm(&body);
    frame.extend_from_slice(&(crc as u32).to_be_bytes());
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Gps, Priority};
    use crate::test_support::from_hex;

    fn sample_record() -> AvlRecord {
        AvlRecord {
            imei: "356307042441013".to_owned(),
            timestamp_ms: 1_560_166_592_000,
            priority: Priority::High,
            gps: Gps {
                longitude: 0.0,
                latitude: 0.0,
                altitude_m: 0,
                angle_deg: 0,
                satellites: 0,
                speed_kmh: 0,
            },
            event_id: 1,
            io_elements: vec![],
        }
    }

    #[test]
    fn scenario_a_handshake_then_one_record() {
        let hex = concat!(
            "000000000000004A8E010000016B412CEE0001000000000000000000000000",
            "00000000010005000100010100010011001D00010010015E2C880002000B00",
            "0000003544C87A000E000000001DD7E06A00000100002994"
        );
        let bytes = from_hex(hex);
        let frame = decode_frame(&bytes, "356307042441013").unwrap();
        assert_eq!(frame.records.len(), 1);
        let rec = &frame.records[0];
        assert_eq!(rec.timestamp_ms, 1_560_166_592_000);
        assert_eq!(rec.priority, Priority::High);
        assert_eq!(rec.gps.longitude, 0.0);
        assert_eq!(rec.gps.latitude, 0.0);
        assert_eq!(rec.event_id, 1);
        // Decode order follows the wire's stage sequence (1, 2, 4, 8), not
        // numeric id order: id 1 is in stage 1, id 17 in stage 2, id 16 in
        // stage 4, and ids 11/14 are unrecognized composite ids in stage 8.
        let ids: Vec<u16> = rec.io_elements.iter().map(|e| e.element_id).collect();
        assert_eq!(ids, vec![1, 17, 16, 11, 14]);
    }

    #[test]
    fn rejects_bad_preamble() {
        let mut bytes = encode_frame(&[sample_record()]);
        bytes[0] = 0x01;
        assert!(matches!(decode_frame(&bytes, "x"), Err(FrameError::InvalidPreamble(_))));
    }

    #[test]
    fn rejects_unsupported_codec() {
        let mut bytes = encode_frame(&[sample_record()]);
        bytes[8] = 0x08;
        // mutating codec_id also desyncs record decoding for a real frame,
        // but the codec check happens first and fails before that matters.
        assert!(matches!(
            decode_frame(&bytes, "x"),
            Err(FrameError::UnsupportedCodec(0x08))
        ));
    }

    #[test]
    fn zero_records_decodes_to_empty_batch() {
        let bytes = encode_frame(&[]);
        let frame = decode_frame(&bytes, "x").unwrap();
        assert!(frame.records.is_empty());
    }

    #[test]
    fn round_trip_simple_records() {
        let records = vec![sample_record(), sample_record()];
        let encoded = encode_frame(&records);
        let decoded = decode_frame(&encoded, "356307042441013").unwrap();
        assert_eq!(decoded.records, records);
    }

    #[test]
    fn crc_mismatch_is_reported_but_not_rejected() {
        let mut bytes = encode_frame(&[sample_record()]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let frame = decode_frame(&bytes, "356307042441013").unwrap();
        assert!(!frame.crc_ok);
        assert_eq!(frame.records.len(), 1);
    }
}
