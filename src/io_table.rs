//! Four-stage (N1/N2/N4/N8) ID -> value IO table, as described in spec.md
//! §4.6. Stages 1/2/4 are simple named scalars; stage 8 is delegated to the
//! composite expander (`composite.rs`), which can split one wire ID into
//! several named `IoElement`s.

use crate::composite::{compress_composite, expand_composite};
use crate::error::IoTableError;
use crate::reader::ByteReader;
use crate::record::IoElement;

const COMPOSITE_IDS: std::ops::RangeInclusive<u16> = 145..=154;

fn name_for_1byte(id: u16) -> Option<&'static str> {
    Some(match id {
        1 => "DigitalInput1",
        2 => "DigitalInput2",
        21 => "GsmSignal",
        144 => "SdStatus",
        179 => "DigitalOutput1",
        180 => "DigitalOutput2",
        239 => "Ignition",
        247 => "CrashDetection",
        255 => "OverSpeeding",
        _ => return None,
    })
}

fn name_for_2byte(id: u16) -> Option<&'static str> {
    Some(match id {
        9 => "AnalogInput1",
        10 => "AnalogInput2",
        11 => "AnalogInput3",
        66 => "ExternalVoltage",
        67 => "BatteryVoltage",
        70 => "PcbTemperature",
        245 => "AnalogInput4",
        _ => return None,
    })
}

fn lookup_name(id: u16, lookup: fn(u16) -> Option<&'static str>) -> String {
    lookup(id).map(str::to_owned).unwrap_or_else(|| id.to_string())
}

pub(crate) fn decode_io_table(r: &mut ByteReader) -> Result<Vec<IoElement>, IoTableError> {
    let total_count = r.read_u16()?;

    let n1 = r.read_u16()?;
    let mut raw_count = n1;
    let mut elements = Vec::with_capacity(total_count as usize);
    for _ in 0..n1 {
        let id = r.read_u16()?;
        let v = r.read_u8()?;
        elements.push(IoElement::plain(id, lookup_name(id, name_for_1byte), v as f64, v as i64));
    }

    let n2 = r.read_u16()?;
    raw_count += n2;
    for _ in 0..n2 {
        let id = r.read_u16()?;
        let v = r.read_u16()?;
        elements.push(IoElement::plain(id, lookup_name(id, name_for_2byte), v as f64, v as i64));
    }

    let n4 = r.read_u16()?;
    raw_count += n4;
    for _ in 0..n4 {
        let id = r.read_u16()?;
        let v = r.read_u32()?;
        elements.push(IoElement::plain(id, id.to_string(), v as f64, v as i64));
    }

    let n8 = r.read_u16()?;
    raw_count += n8;
    for _ in 0..n8 {
        let id = r.read_u16()?;
        let bytes = r.read_array::<8>()?;
        elements.extend(expand_composite(id, bytes));
    }

    // raw-count invariant must be checked against the pre-expansion count.
    if raw_count != total_count {
        return Err(IoTableError::IoCountMismatch {
            total: total_count,
            summed: raw_count,
        });
    }

    let _nx = r.read_u16()?; // reserved

    Ok(elements)
}

/// Inverse of `decode_io_table`. Elements whose id falls in the composite
/// range (145-154) are expected to appear as a contiguous run sharing that
/// id, the same shape `expand_composite` produces them in; each such run is
/// re-merged by `compress_composite` into a single stage-8 entry rather than
/// bucketed independently by its sub-elements' own `raw` magnitude.
pub(crate) fn encode_io_table(elements: &[IoElement], out: &mut Vec<u8>) {
    let mut stage1 = Vec::new();
    let mut stage2 = Vec::new();
    let mut stage4 = Vec::new();
    let mut stage8 = Vec::new();
    let (mut n1, mut n2, mut n4, mut n8) = (0u16, 0u16, 0u16, 0u16);

    let mut i = 0;
    while i < elements.len() {
        let el = &elements[i];

        if COMPOSITE_IDS.contains(&el.element_id) {
            let id = el.element_id;
            let mut j = i + 1;
            while j < elements.len() && elements[j].element_id == id {
                j += 1;
            }
            let bytes = compress_composite(id, &elements[i..j]);
            n8 += 1;
            stage8.extend_from_slice(&id.to_be_bytes());
            stage8.extend_from_slice(&bytes);
            i = j;
            continue;
        }

        let v = el.raw;
        if (0..=u8::MAX as i64).contains(&v) {
            n1 += 1;
            stage1.extend_from_slice(&el.element_id.to_be_bytes());
            stage1.push(v as u8);
        } else if (0..=u16::MAX as i64).contains(&v) {
            n2 += 1;
            stage2.extend_from_slice(&el.element_id.to_be_bytes());
            stage2.extend_from_slice(&(v as u16).to_be_bytes());
        } else if (0..=u32::MAX as i64).contains(&v) {
            n4 += 1;
            stage4.extend_from_slice(&el.element_id.to_be_bytes());
            stage4.extend_from_slice(&(v as u32).to_be_bytes());
        } else {
            n8 += 1;
            stage8.extend_from_slice(&el.element_id.to_be_bytes());
            stage8.extend_from_slice(&(v as u64).to_be_bytes());
        }
        i += 1;
    }

    let total = n1 + n2 + n4 + n8;
    out.extend_from_slice(&total.to_be_bytes());
    out.extend_from_slice(&n1.to_be_bytes());
    out.extend_from_slice(&stage1);
    out.extend_from_slice(&n2.to_be_bytes());
    out.extend_from_slice(&stage2);
    out.extend_from_slice(&n4.to_be_bytes());
    out.extend_from_slice(&stage4);
    out.extend_from_slice(&n8.to_be_bytes());
    out.extend_from_slice(&stage8);
    out.extend_from_slice(&0u16.to_be_bytes()); // nx, reserved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ByteReader;

    #[test]
    fn decode_reports_count_mismatch() {
        // total_count claims 5 elements but only 1 is actually present
        // across the four stages.
        #[rustfmt::skip]
        let buf = [
            0x00, 0x05, // total_count = 5 (wrong)
            0x00, 0x01, 0x00, 0x01, 0x07, // n1 = 1, (id=1, v=7)
            0x00, 0x00, // n2 = 0
            0x00, 0x00, // n4 = 0
            0x00, 0x00, // n8 = 0
            0x00, 0x00, // nx
        ];
        let mut r = ByteReader::new(&buf);
        let err = decode_io_table(&mut r).unwrap_err();
        assert!(matches!(err, IoTableError::IoCountMismatch { total: 5, summed: 1 }));
    }

    #[test]
    fn known_ids_get_names_unknown_ids_get_decimal_string() {
        assert_eq!(lookup_name(1, name_for_1byte), "DigitalInput1");
        assert_eq!(lookup_name(9999, name_for_1byte), "9999");
    }

    #[test]
    fn round_trips_a_composite_element_group() {
        let plain = IoElement::plain(21, "GsmSignal", 3.0, 3);
        let composite = expand_composite(145, [0x03, 0x84, 0x0F, 0xA0, 0x64, 0x80, 0xB5, 0x02]);
        let mut elements = vec![plain];
        elements.extend(composite);

        let mut encoded = Vec::new();
        encode_io_table(&elements, &mut encoded);

        let mut r = ByteReader::new(&encoded);
        let decoded = decode_io_table(&mut r).unwrap();
        assert_eq!(decoded, elements);
    }
}
