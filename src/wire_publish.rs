//! Schema-evolution-friendly binary encoding for the "last point" payload
//! published on `device.lastpoint.{imei}` (spec.md §6.4). Fields are
//! written as `(u8 field_number, u8 wire_type, payload)` tuples, the same
//! shape as the protobuf wire format the original implementation used
//! (`examples/original_source/proto/pb/device.pb.go`), hand-rolled here
//! since the crate does not vendor a protobuf toolchain. Receivers are
//! expected to skip unknown field numbers.

const WT_VARINT: u8 = 0;
const WT_F64: u8 = 1;
const WT_BYTES: u8 = 2;

use crate::record::AvlRecord;

fn put_varint(out: &mut Vec<u8>, field: u8, value: u64) {
    out.push(field);
    out.push(WT_VARINT);
    let mut v = value;
    loop {
        let mut byte = (v & 0x7f) as u8;
        v >>= 7;
        if v != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if v == 0 {
            break;
        }
    }
}

fn put_f64(out: &mut Vec<u8>, field: u8, value: f64) {
    out.push(field);
    out.push(WT_F64);
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_bytes(out: &mut Vec<u8>, field: u8, value: &[u8]) {
    out.push(field);
    out.push(WT_BYTES);
    put_raw_varint(out, value.len() as u64);
    out.extend_from_slice(value);
}

fn zigzag(v: i16) -> u64 {
    ((v as i32) << 1 ^ (v as i32 >> 15)) as u32 as u64
}

fn put_raw_varint(out: &mut Vec<u8>, value: u64) {
    let mut v = value;
    loop {
        let mut byte = (v & 0x7f) as u8;
        v >>= 7;
        if v != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if v == 0 {
            break;
        }
    }
}

/// Encodes the fields a live dashboard needs: imei, timestamp, priority,
/// gps, event id. IO elements are intentionally left out of this payload —
/// the "last point" feed is a lightweight live-tracking signal, not the
/// full analytical record (which goes to `AvlStore::save_batch` instead).
pub fn encode_last_point(rec: &AvlRecord) -> Vec<u8> {
    let mut out = Vec::new();
    put_bytes(&mut out, 1, rec.imei.as_bytes());
    put_varint(&mut out, 2, rec.timestamp_ms);
    put_varint(&mut out, 3, u8::from(rec.priority) as u64);
    put_f64(&mut out, 4, rec.gps.longitude);
    put_f64(&mut out, 5, rec.gps.latitude);
    put_varint(&mut out, 6, zigzag(rec.gps.altitude_m));
    put_varint(&mut out, 7, rec.gps.angle_deg as u64);
    put_varint(&mut out, 8, rec.gps.satellites as u64);
    put_varint(&mut out, 9, rec.gps.speed_kmh as u64);
    put_varint(&mut out, 10, rec.event_id as u64);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Gps, Priority};

    #[test]
    fn encodes_known_field_tags() {
        let rec = AvlRecord {
            imei: "123".to_owned(),
            timestamp_ms: 42,
            priority: Priority::High,
            gps: Gps {
                longitude: 1.5,
                latitude: -2.5,
                altitude_m: 10,
                angle_deg: 90,
                satellites: 7,
                speed_kmh: 30,
            },
            event_id: 5,
            io_elements: vec![],
        };
        let encoded = encode_last_point(&rec);
        assert_eq!(encoded[0], 1);
        assert_eq!(encoded[1], WT_BYTES);
        assert!(!encoded.is_empty());
    }
}
