//! CRC-16/IBM (aka CRC-16/ARC): init 0xFFFF, poly 0xA001 reflected, no
//! final XOR. Teltonika frames carry this as the trailer checksum.

use crc::{Algorithm, Crc};

const ALGORITHM: Algorithm<u16> = Algorithm {
    width: 16,
    poly: 0x8005,
    init: 0xFFFF,
    refin: true,
    refout: true,
    xorout: 0x0000,
    check: 0xbb3d,
    residue: 0x0000,
};

/// Computes CRC-16/IBM over `data`.
pub fn crc16_ibm(data: &[u8]) -> u16 {
    let crc = Crc::<u16>::new(&ALGORITHM);
    crc.checksum(data)
}
