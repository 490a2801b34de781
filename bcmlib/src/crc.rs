//! Jam-CRC32 checksums.
//!
//! Every checksum field in the tag uses CRC-32/JAMCRC: the standard
//! reflected 0xEDB88320 CRC-32 with the final complement step omitted,
//! which makes it the bitwise complement of an ordinary CRC-32.

/// Checksum a byte slice with CRC-32/JAMCRC.
pub fn jam_crc(data: &[u8]) -> u32 {
    let crc = crc::Crc::<u32>::new(&crc::CRC_32_JAMCRC);
    crc.checksum(data)
}
