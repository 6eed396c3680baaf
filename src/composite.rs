//! Composite IO expander (C7): splits an 8-byte "stage 8" element into one
//! or more named, scaled `IoElement`s. Wire bytes arrive as `[u8; 8]` in the
//! order they were transmitted; byte 7 of the vendor's documentation (the
//! first transmitted byte) is `bytes[0]` here.
//!
//! Each element ID selects a fixed decoding template. Templates are kept as
//! small pure functions rather than a 2,000-line switch cascade, per the
//! architectural substitution in spec.md §9: a per-ID function is the "table
//! plus interpreter" in data form, just expressed as Rust functions instead
//! of a tuple array, since several fields need bit ranges spanning more than
//! one extractor shape.

use crate::dtc;
use crate::record::IoElement;

fn get_bit(b: u8, pos: u8) -> u8 {
    (b >> pos) & 1
}

fn bits(b: u8, mask: u8, shift: u8) -> u8 {
    (b & mask) >> shift
}

fn el(id: u16, name: &str, value: f64, raw: i64) -> IoElement {
    IoElement::plain(id, name, value, raw)
}

fn el_colored(id: u16, name: &str, value: f64, raw: i64, normalized: f64, color: &str) -> IoElement {
    IoElement {
        element_id: id,
        name: name.to_owned(),
        value,
        normalized_value: Some(normalized),
        color_hex: Some(color.to_owned()),
        raw,
    }
}

pub(crate) fn expand_composite(id: u16, bytes: [u8; 8]) -> Vec<IoElement> {
    match id {
        145 => expand_145(id, bytes),
        146 => expand_146(id, bytes),
        147 => expand_147(id, bytes),
        148 => expand_148(id, bytes),
        149 => expand_149(id, bytes),
        150..=154 => expand_sensor_block(id, bytes),
        _ => vec![el(id, &id.to_string(), 999.0, i64::from_be_bytes(bytes))],
    }
}

fn expand_145(id: u16, b: [u8; 8]) -> Vec<IoElement> {
    let raw_speed = u16::from_be_bytes([b[0], b[1]]);
    let speed = (raw_speed as f64 * 0.05625).min(200.0);
    let rpm = u16::from_be_bytes([b[2], b[3]]);
    let coolant = b[4] as f64 * 0.75 - 48.0;
    let fuel = b[5] as f64 * 0.390625;
    let flags = b[6];
    let gear_shift = bits(flags, 0x18, 3);
    let desired_gear = bits(flags, 0xe0, 5);
    let vehicle_type = b[7];

    vec![
        el_colored(id, "VehicleSpeed", speed, raw_speed as i64, speed / 8189.0, "#a09db2"),
        el_colored(id, "EngineSpeed_RPM", rpm as f64, rpm as i64, rpm as f64 / 8160.0, "#008080"),
        el_colored(
            id,
            "EngineCoolantTemperature",
            coolant,
            b[4] as i64,
            (coolant + 48.0) / (143.5 + 48.0),
            "#065535",
        ),
        el(id, "FuelLevelinTank", fuel, b[5] as i64),
        el_colored(id, "CheckEngine", get_bit(flags, 0) as f64, get_bit(flags, 0) as i64, get_bit(flags, 0) as f64, "#ff80ed"),
        el_colored(
            id,
            "AC-Pressure-1",
            get_bit(flags, 1) as f64,
            get_bit(flags, 1) as i64,
            get_bit(flags, 1) as f64,
            "#198ba3",
        ),
        el_colored(
            id,
            "AC-Pressure-2",
            get_bit(flags, 2) as f64,
            get_bit(flags, 2) as i64,
            get_bit(flags, 2) as f64,
            "#ae0e52",
        ),
        el(id, "GearShiftIndicator", gear_shift as f64, gear_shift as i64),
        el(id, "DesiredGearValue", desired_gear as f64, desired_gear as i64),
        el(id, "VehicleType", vehicle_type as f64, vehicle_type as i64),
    ]
}

fn expand_146(id: u16, b: [u8; 8]) -> Vec<IoElement> {
    let b0 = b[0];
    let immobilizer = b0 & 0x07;
    let brake_pedal = bits(b0, 0x18, 3);
    let clutch_pedal = get_bit(b0, 5);
    let gear_engaged = bits(b0, 0xC0, 6);

    let acc_pedal = b[1] as f64 * 0.39063;
    let throttle = b[2] as f64 * 0.39063;
    let indicated_torque = b[3] as f64 * 0.39063;
    let friction_torque = b[4] as f64 * 0.39063;
    let actual_torque = b[5] as f64 * 0.39063;

    let flags = b[6];
    let names = [
        "CruiseControlOn_Off",
        "SpeedLimiterOn_Off",
        "CruiseControlLamp",
        "EngineFuelCutOff",
        "CatalystHeating",
        "ACCompressorStatus",
        "ConditionMainRelay",
        "Reserve",
    ];
    let mut out = vec![
        el(id, "ConditionImmobilizer", immobilizer as f64, immobilizer as i64),
        el_colored(
            id,
            "BrakePedalStatus",
            brake_pedal as f64,
            brake_pedal as i64,
            (brake_pedal as f64 - 1.0) / 2.0,
            "#7bcf7d",
        ),
        el_colored(id, "ClutchPedalStatus", clutch_pedal as f64, clutch_pedal as i64, clutch_pedal as f64, "#282a36"),
        el_colored(id, "GearEngagedStatus", gear_engaged as f64, gear_engaged as i64, gear_engaged as f64, "#c70d0f"),
        el_colored(id, "ActualAccPedal", acc_pedal, b[1] as i64, acc_pedal / 99.6094, "#006ab5"),
        el_colored(id, "EngineThrottlePosition", throttle, b[2] as i64, throttle / 99.2, "#DFFF00"),
        el_colored(id, "IndicatedEngineTorque", indicated_torque, b[3] as i64, indicated_torque / 99.6094, "#FFBF00"),
        el_colored(id, "EngineFrictionTorque", friction_torque, b[4] as i64, friction_torque / 99.6094, "#FF7F50"),
        el_colored(id, "EngineActualTorque", actual_torque, b[5] as i64, actual_torque / 99.6094, "#DE3163"),
    ];
    for (i, name) in names.iter().enumerate() {
        out.push(el(id, name, get_bit(flags, i as u8) as f64, get_bit(flags, i as u8) as i64));
    }
    let tcu_gear = b[7] & 0x0f;
    out.push(el(id, "TCU_GearShiftPosition", tcu_gear as f64, tcu_gear as i64));
    out
}

fn expand_147(id: u16, b: [u8; 8]) -> Vec<IoElement> {
    let distance = u32::from_be_bytes([b[0], b[1], b[2], b[3]]);
    let virtual_acc_pedal = b[6] as f64 * 0.39063;
    let intake_air_temp = b[7] as f64 * 0.75 - 48.0;
    vec![
        el(id, "distance", distance as f64, distance as i64),
        el_colored(
            id,
            "VirtualAccPedal",
            virtual_acc_pedal,
            b[6] as i64,
            virtual_acc_pedal / 99.2,
            "#FF00FF",
        ),
        el_colored(
            id,
            "IntakeAirTemperature",
            intake_air_temp,
            b[7] as i64,
            (intake_air_temp + 48.0) / (143.5 + 48.0),
            "#000080",
        ),
    ]
}

fn expand_148(id: u16, b: [u8; 8]) -> Vec<IoElement> {
    let desired_speed = u16::from_be_bytes([b[0], b[1]]) as f64 * 0.125;
    let oil_temp_tcu = b[2] as f64 - 40.0;
    let ambient_air_temp = b[3] as f64 * 0.5 - 40.0;
    let abs_dtc = b[6];
    let bcm_dtc_raw = b[7];
    let ems_dtc_raw = u16::from_be_bytes([b[4], b[5]]);
    let (ems_code, ems_desc) = dtc::lookup_ems(ems_dtc_raw);
    let (bcm_code, bcm_desc) = dtc::lookup_bcm(bcm_dtc_raw as u16);
    vec![
        el(id, "DesiredSpeed", desired_speed, u16::from_be_bytes([b[0], b[1]]) as i64),
        el_colored(
            id,
            "OilTemperatureTCU",
            oil_temp_tcu,
            b[2] as i64,
            (oil_temp_tcu + 40.0) / (214.0 + 40.0),
            "#0000FF",
        ),
        el_colored(
            id,
            "AmbientAirTemperature",
            ambient_air_temp,
            b[3] as i64,
            (ambient_air_temp + 40.0) / (86.5 + 40.0),
            "#008080",
        ),
        el_colored(
            id,
            "EMS_DTC",
            ems_dtc_raw as f64,
            ems_dtc_raw as i64,
            1000.0,
            &format!("{ems_code}_{ems_desc}"),
        ),
        el(id, "ABS_DTC", abs_dtc as f64, abs_dtc as i64),
        el_colored(
            id,
            "BCM_DTC",
            bcm_dtc_raw as f64,
            bcm_dtc_raw as i64,
            1000.0,
            &format!("{bcm_code}_{bcm_desc}"),
        ),
    ]
}

fn expand_149(id: u16, b: [u8; 8]) -> Vec<IoElement> {
    let names = [
        "ACU_DTC",
        "ESC_DTC",
        "ICN_DTC",
        "EPS_DTC",
        "CAS_DTC",
        "FCM/FN_DTC",
        "ICU_DTC",
        "Reserve_DTC",
    ];
    names
        .iter()
        .enumerate()
        .map(|(i, name)| el(id, name, b[i] as f64, b[i] as i64))
        .collect()
}

/// IDs 150-154 each carry four u16 "sensor" channel pairs, read raw with no
/// scaling divisor. Each sensor has its own normalization offset (feeding
/// `NormalValue = (value - offset) / 0.7`) and a fixed dashboard color.
fn expand_sensor_block(id: u16, b: [u8; 8]) -> Vec<IoElement> {
    let (first_index, offsets, colors): (u32, [f64; 4], [&str; 4]) = match id {
        150 => (1, [0.0, 1.0, 2.0, 3.0], ["#008000", "#808000", "#800000", "#398112"]),
        151 => (5, [4.0, 5.0, 6.0, 7.0], ["#12815E", "#125781", "#7E1281", "#811241"]),
        152 => (9, [0.0, 1.0, 2.0, 3.0], ["#817C12", "#F4E60E", "#0E99F4", "#F40EED"]),
        153 => (13, [4.0, 5.0, 6.0, 7.0], ["#FF6C00", "#00FF55", "#9B00FF", "#FF008F"]),
        154 => (17, [7.0, 7.0, 7.0, 7.0], ["#51022E", "#02513A", "#512B02", "#A41B9E"]),
        _ => unreachable!(),
    };
    let pairs = [
        u16::from_be_bytes([b[0], b[1]]),
        u16::from_be_bytes([b[2], b[3]]),
        u16::from_be_bytes([b[4], b[5]]),
        u16::from_be_bytes([b[6], b[7]]),
    ];
    pairs
        .iter()
        .enumerate()
        .map(|(i, &raw)| {
            let sensor_num = first_index + i as u32;
            let value = raw as f64;
            el_colored(
                id,
                &format!("Sensor{sensor_num}"),
                value,
                raw as i64,
                (value - offsets[i]) / 0.7,
                colors[i],
            )
        })
        .collect()
}

/// Inverse of `expand_composite` for the known ids (145-154): re-merges the
/// sub-elements a single wire entry was split into back into its original
/// 8 bytes, reading each sub-element's `raw` field in the same order
/// `expand_*` produced them. Used by the io table encoder so
/// `decode(encode(records)) == records` holds for composite elements
/// (spec.md §8 Testable Property 1).
pub(crate) fn compress_composite(id: u16, elements: &[IoElement]) -> [u8; 8] {
    fn raw_at(elements: &[IoElement], i: usize) -> i64 {
        elements.get(i).map(|e| e.raw).unwrap_or(0)
    }

    match id {
        145 => {
            let raw_speed = raw_at(elements, 0) as u16;
            let rpm = raw_at(elements, 1) as u16;
            let coolant = raw_at(elements, 2) as u8;
            let fuel = raw_at(elements, 3) as u8;
            let check_engine = raw_at(elements, 4) as u8 & 1;
            let ac1 = raw_at(elements, 5) as u8 & 1;
            let ac2 = raw_at(elements, 6) as u8 & 1;
            let gear_shift = raw_at(elements, 7) as u8 & 0x3;
            let desired_gear = raw_at(elements, 8) as u8 & 0x7;
            let vehicle_type = raw_at(elements, 9) as u8;
            let flags = check_engine | (ac1 << 1) | (ac2 << 2) | (gear_shift << 3) | (desired_gear << 5);
            let [s0, s1] = raw_speed.to_be_bytes();
            let [r0, r1] = rpm.to_be_bytes();
            [s0, s1, r0, r1, coolant, fuel, flags, vehicle_type]
        }
        146 => {
            let immobilizer = raw_at(elements, 0) as u8 & 0x07;
            let brake_pedal = raw_at(elements, 1) as u8 & 0x03;
            let clutch_pedal = raw_at(elements, 2) as u8 & 0x01;
            let gear_engaged = raw_at(elements, 3) as u8 & 0x03;
            let acc_pedal = raw_at(elements, 4) as u8;
            let throttle = raw_at(elements, 5) as u8;
            let indicated_torque = raw_at(elements, 6) as u8;
            let friction_torque = raw_at(elements, 7) as u8;
            let actual_torque = raw_at(elements, 8) as u8;
            let mut flags = 0u8;
            for i in 0..8 {
                flags |= (raw_at(elements, 9 + i) as u8 & 1) << i;
            }
            let tcu_gear = raw_at(elements, 17) as u8 & 0x0f;
            let b0 = immobilizer | (brake_pedal << 3) | (clutch_pedal << 5) | (gear_engaged << 6);
            [b0, acc_pedal, throttle, indicated_torque, friction_torque, actual_torque, flags, tcu_gear]
        }
        147 => {
            let distance = raw_at(elements, 0) as u32;
            let virtual_acc_pedal = raw_at(elements, 1) as u8;
            let intake_air_temp = raw_at(elements, 2) as u8;
            let [d0, d1, d2, d3] = distance.to_be_bytes();
            [d0, d1, d2, d3, 0, 0, virtual_acc_pedal, intake_air_temp]
        }
        148 => {
            let desired_speed = raw_at(elements, 0) as u16;
            let oil_temp = raw_at(elements, 1) as u8;
            let ambient_air = raw_at(elements, 2) as u8;
            let ems_dtc = raw_at(elements, 3) as u16;
            let abs_dtc = raw_at(elements, 4) as u8;
            let bcm_dtc = raw_at(elements, 5) as u8;
            let [s0, s1] = desired_speed.to_be_bytes();
            let [e0, e1] = ems_dtc.to_be_bytes();
            [s0, s1, oil_temp, ambient_air, e0, e1, abs_dtc, bcm_dtc]
        }
        149 => {
            let mut out = [0u8; 8];
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = raw_at(elements, i) as u8;
            }
            out
        }
        150..=154 => {
            let pairs: Vec<u16> = (0..4).map(|i| raw_at(elements, i) as u16).collect();
            let mut out = [0u8; 8];
            for (i, p) in pairs.iter().enumerate() {
                let bytes = p.to_be_bytes();
                out[i * 2] = bytes[0];
                out[i * 2 + 1] = bytes[1];
            }
            out
        }
        _ => (raw_at(elements, 0) as u64).to_be_bytes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_d_vehicle_speed_composite() {
        let bytes = [0x03, 0x84, 0x0F, 0xA0, 0x64, 0x80, 0x00, 0x00];
        let out = expand_composite(145, bytes);
        // 4 scalar fields + 3 one-bit flags + 2 sub-byte fields + VehicleType
        assert_eq!(out.len(), 10);
        assert_eq!(out[0].name, "VehicleSpeed");
        assert!((out[0].value - 50.625).abs() < 1e-9);
        assert_eq!(out[1].name, "EngineSpeed_RPM");
        assert_eq!(out[1].value, 4000.0);
        assert_eq!(out[2].name, "EngineCoolantTemperature");
        assert_eq!(out[2].value, 27.0);
        assert_eq!(out[3].name, "FuelLevelinTank");
        assert_eq!(out[3].value, 50.0);
        assert_eq!(out[9].name, "VehicleType");
        assert_eq!(out[9].value, 0.0);
    }

    #[test]
    fn vehicle_speed_clamps_at_200() {
        let bytes = [0xFF, 0xFF, 0, 0, 0, 0, 0, 0];
        let out = expand_composite(145, bytes);
        assert_eq!(out[0].value, 200.0);
    }

    #[test]
    fn unknown_composite_id_emits_single_sentinel_element() {
        let out = expand_composite(9999, [0u8; 8]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "9999");
        assert_eq!(out[0].value, 999.0);
        assert_eq!(out[0].raw, 0);
    }

    #[test]
    fn unknown_composite_id_raw_is_the_wire_integer() {
        // Scenario A's fixture (frame.rs) carries an unrecognized composite
        // id=11 with these wire bytes; raw must be the plain be i64, not a
        // hardcoded sentinel.
        let bytes = [0x00, 0x00, 0x00, 0x35, 0x44, 0xC8, 0x7A, 0x00];
        let out = expand_composite(11, bytes);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value, 999.0);
        assert_eq!(out[0].raw, i64::from_be_bytes(bytes));
    }

    #[test]
    fn sensor_block_has_no_divisor_and_carries_normalization() {
        let bytes = [0x00, 0x0A, 0x00, 0x0B, 0x00, 0x0C, 0x00, 0x0D];
        let out = expand_sensor_block(152, bytes);
        assert_eq!(out[0].name, "Sensor9");
        assert_eq!(out[0].value, 10.0);
        assert_eq!(out[0].raw, 10);
        assert!((out[0].normalized_value.unwrap() - (10.0 - 0.0) / 0.7).abs() < 1e-9);
        assert_eq!(out[0].color_hex.as_deref(), Some("#817C12"));
        assert_eq!(out[3].name, "Sensor12");
        assert!((out[3].normalized_value.unwrap() - (13.0 - 3.0) / 0.7).abs() < 1e-9);
    }

    #[test]
    fn compress_inverts_expand_for_each_composite_id() {
        let cases: [(u16, [u8; 8]); 6] = [
            (145, [0x03, 0x84, 0x0F, 0xA0, 0x64, 0x80, 0xB5, 0x02]),
            (146, [0xD3, 0x64, 0x64, 0x64, 0x64, 0x64, 0xAB, 0x07]),
            (147, [0x00, 0x00, 0x01, 0x2C, 0x00, 0x00, 0x64, 0x96]),
            (148, [0x03, 0xE8, 0x32, 0x64, 0x00, 0x05, 0x02, 0x03]),
            (149, [1, 2, 3, 4, 5, 6, 7, 8]),
            (152, [0x00, 0x0A, 0x00, 0x0B, 0x00, 0x0C, 0x00, 0x0D]),
        ];
        for (id, bytes) in cases {
            let elements = expand_composite(id, bytes);
            let rebuilt = compress_composite(id, &elements);
            assert_eq!(rebuilt, bytes, "composite id {id} did not round-trip");
            assert_eq!(expand_composite(id, rebuilt), elements);
        }
    }

    #[test]
    fn bit_extraction_matches_shift_and_mask() {
        for p in 0..8u8 {
            for b in [0x00u8, 0xFF, 0b10101010] {
                assert_eq!(get_bit(b, p), (b >> p) & 1);
            }
        }
    }
}
