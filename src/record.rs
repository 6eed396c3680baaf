//! `AvlRecord` decode/encode: timestamp, priority, GPS fix, event id, then
//! the IO table (delegated to `io_table`).

use crate::error::RecordError;
use crate::io_table::{decode_io_table, encode_io_table};
use crate::reader::ByteReader;

/// Sentinel used when an `IoElement` has no meaningful normalization.
pub const UNSCALED: f64 = 1000.0;

const COORD_SCALE: f64 = 1e7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    High,
    Panic,
}

impl TryFrom<u8> for Priority {
    type Error = RecordError;

    fn try_from(v: u8) -> Result<Self, RecordError> {
        match v {
            0 => Ok(Priority::Low),
            1 => Ok(Priority::High),
            2 => Ok(Priority::Panic),
            other => Err(RecordError::InvalidPriority(other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        match p {
            Priority::Low => 0,
            Priority::High => 1,
            Priority::Panic => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gps {
    pub longitude: f64,
    pub latitude: f64,
    pub altitude_m: i16,
    pub angle_deg: u16,
    pub satellites: u8,
    pub speed_kmh: u16,
}

impl Gps {
    /// Per spec.md §3: devices with no fix emit 0/0, which is valid; this
    /// only flags genuinely out-of-range coordinates.
    pub fn is_within_range(&self) -> bool {
        (-180.0..=180.0).contains(&self.longitude) && (-90.0..=90.0).contains(&self.latitude)
    }
}

/// A single decoded telemetry signal.
#[derive(Debug, Clone, PartialEq)]
pub struct IoElement {
    pub element_id: u16,
    pub name: String,
    pub value: f64,
    pub normalized_value: Option<f64>,
    pub color_hex: Option<String>,
    /// The untransformed wire value, for consumers that want the raw
    /// integer signal rather than the scaled/derived one (spec.md §9 Open
    /// Question 3).
    pub raw: i64,
}

impl IoElement {
    pub fn plain(element_id: u16, name: impl Into<String>, value: f64, raw: i64) -> Self {
        IoElement {
            element_id,
            name: name.into(),
            value,
            normalized_value: Some(UNSCALED),
            color_hex: Some(String::new()),
            raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvlRecord {
    pub imei: String,
    pub timestamp_ms: u64,
    pub priority: Priority,
    pub gps: Gps,
    pub event_id: u16,
    pub io_elements: Vec<IoElement>,
}

pub(crate) fn decode_record(r: &mut ByteReader, imei: &str) -> Result<AvlRecord, RecordError> {
    let timestamp_ms = r.read_u64()?;
    let priority = Priority::try_from(r.read_u8()?)?;

    let longitude = r.read_i32()? as f64 / COORD_SCALE;
    let latitude = r.read_i32()? as f64 / COORD_SCALE;
    let altitude_m = r.read_i16()?;
    let angle_deg = r.read_u16()?;
    let satellites = r.read_u8()?;
    let speed_kmh = r.read_u16()?;
    let event_id = r.read_u16()?;

    let io_elements = decode_io_table(r)?;

    Ok(AvlRecord {
        imei: imei.to_owned(),
        timestamp_ms,
        priority,
        gps: Gps {
            longitude,
            latitude,
            altitude_m,
            angle_deg,
            satellites,
            speed_kmh,
        },
        event_id,
        io_elements,
    })
}

pub(crate) fn encode_record(rec: &AvlRecord, out: &mut Vec<u8>) {
    out.extend_from_slice(&rec.timestamp_ms.to_be_bytes());
    out.push(rec.priority.into());
    out.extend_from_slice(&((rec.gps.longitude * COORD_SCALE).round() as i32).to_be_bytes());
    out.extend_from_slice(&((rec.gps.latitude * COORD_SCALE).round() as i32).to_be_bytes());
    out.extend_from_slice(&rec.gps.altitude_m.to_be_bytes());
    out.extend_from_slice(&rec.gps.angle_deg.to_be_bytes());
    out.push(rec.gps.satellites);
    out.extend_from_slice(&rec.gps.speed_kmh.to_be_bytes());
    out.extend_from_slice(&rec.event_id.to_be_bytes());
    encode_io_table(&rec.io_elements, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_rejects_out_of_range() {
        assert_eq!(Priority::try_from(3), Err(RecordError::InvalidPriority(3)));
    }

    #[test]
    fn gps_all_zero_is_in_range() {
        let gps = Gps {
            longitude: 0.0,
            latitude: 0.0,
            altitude_m: 0,
            angle_deg: 0,
            satellites: 0,
            speed_kmh: 0,
        };
        assert!(gps.is_within_range());
    }

    #[test]
    fn negative_coordinates_round_trip_via_two_s_complement() {
        // -122.4194, 37.7749 are well inside the legal range; verifying these
        // decode to negative f64 confirms we aren't doing sign-magnitude.
        let lon_wire = (-122.4194_f64 * COORD_SCALE).round() as i32;
        let lat_wire = (37.7749_f64 * COORD_SCALE).round() as i32;
        assert!(lon_wire < 0);
        let lon_decoded = lon_wire as f64 / COORD_SCALE;
        assert!((lon_decoded - (-122.4194)).abs() < 1e-6);
        let lat_decoded = lat_wire as f64 / COORD_SCALE;
        assert!((lat_decoded - 37.7749).abs() < 1e-6);
    }
}
