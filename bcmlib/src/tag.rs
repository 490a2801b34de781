//! The fixed binary header ("tag") at the front of a firmware image.
//!
//! The tag is always [TAG_LEN] bytes, big-endian, and describes the layout
//! `tag | cfe | rootfs | kernel | dtb | postfix` of the raw image file.

use nom::bytes::complete::take;
use nom::number::complete::be_u32;

use crate::crc::jam_crc;
use crate::signature::Signature;

/// Size of the tag, always the first bytes of an image file.
pub const TAG_LEN: usize = 0x100;

/// Fixed size of the device tree blob region following the kernel.
pub const DTB_LEN: usize = 0x1410;

/// Width of the primary signature field.
pub const SIG1_LEN: usize = 20;

/// Width of the secondary signature field.
pub const SIG2_LEN: usize = 14;

/// Vendor-defined bytes carried through decode, encode and merge without
/// interpretation.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Reserved<const LEN: usize>([u8; LEN]);

impl<const LEN: usize> Reserved<LEN> {
    pub const fn new() -> Self {
        Self([0; LEN])
    }

    pub const fn new_data(data: [u8; LEN]) -> Self {
        Self(data)
    }

    pub const fn data(&self) -> &[u8; LEN] {
        &self.0
    }

    pub fn is_zeroed(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub(crate) fn parse(input: &[u8]) -> nom::IResult<&[u8], Self> {
        let (input, raw) = take(LEN)(input)?;
        let mut data = [0; LEN];
        data.copy_from_slice(raw);
        Ok((input, Self(data)))
    }
}

impl<const LEN: usize> Default for Reserved<LEN> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const LEN: usize> std::fmt::Debug for Reserved<LEN> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        if self.is_zeroed() {
            f.debug_tuple("Reserved").finish()
        } else {
            f.debug_tuple("Reserved").field(&self.0).finish()
        }
    }
}

/// Firmware image tag. All integer fields are big-endian `u32`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Tag {
    /// 0x00 Firmware signature text.
    pub signature1: Signature<SIG1_LEN>,
    /// 0x14 Secondary signature text, operator-overridable on merge.
    pub signature2: Signature<SIG2_LEN>,
    /// 0x22 Chip identifier, not interpreted.
    pub chip_id: Reserved<6>,
    /// 0x28 Board identifier, not interpreted.
    pub board_id: Reserved<16>,
    /// 0x38 Length of cfe + rootfs + kernel + dtb, excluding the postfix.
    pub image_len: u32,
    /// 0x3c Bootloader flash address, not interpreted.
    pub cfe_addr: u32,
    /// 0x40 Bootloader region length.
    pub cfe_len: u32,
    /// 0x44 Root filesystem flash address.
    pub rootfs_addr: u32,
    /// 0x48 Root filesystem region length.
    pub rootfs_len: u32,
    /// 0x4c Kernel flash address, `rootfs_addr + rootfs_len` in a
    /// consistent image.
    pub kernel_addr: u32,
    /// 0x50 Kernel region length.
    pub kernel_len: u32,
    /// 0x54 Vendor info block, not interpreted.
    pub info1: Reserved<84>,
    /// 0xa8 Jam-CRC of the image body (cfe + rootfs + kernel + dtb).
    pub image_crc: u32,
    /// 0xac Jam-CRC of the rootfs region.
    pub rootfs_crc: u32,
    /// 0xb0 Jam-CRC of the kernel region.
    pub kernel_crc: u32,
    /// 0xb4 Jam-CRC of the dtb region. Merge carries it over unchanged.
    pub dtb_crc: u32,
    /// 0xb8 Vendor info block, not interpreted.
    pub info2: Reserved<68>,
    /// 0xfc Jam-CRC of the encoded tag with this field zeroed.
    pub tag_crc: u32,
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum TagError {
    TooShort { len: usize },
}

impl std::error::Error for TagError {}

impl std::fmt::Display for TagError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TagError::TooShort { len } => {
                write!(f, "image tag must be at least {} bytes, found {}", TAG_LEN, len)
            }
        }
    }
}

impl Tag {
    /// Decode a tag from the first [TAG_LEN] bytes of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TagError> {
        if data.len() < TAG_LEN {
            return Err(TagError::TooShort { len: data.len() });
        }

        // the field parsers cannot fail once the length is checked
        match Self::parse(&data[..TAG_LEN]) {
            Ok((_, tag)) => Ok(tag),
            Err(_) => Err(TagError::TooShort { len: data.len() }),
        }
    }

    fn parse(input: &[u8]) -> nom::IResult<&[u8], Self> {
        let (input, signature1) = Signature::parse(input)?;
        let (input, signature2) = Signature::parse(input)?;
        let (input, chip_id) = Reserved::parse(input)?;
        let (input, board_id) = Reserved::parse(input)?;
        let (input, image_len) = be_u32(input)?;
        let (input, cfe_addr) = be_u32(input)?;
        let (input, cfe_len) = be_u32(input)?;
        let (input, rootfs_addr) = be_u32(input)?;
        let (input, rootfs_len) = be_u32(input)?;
        let (input, kernel_addr) = be_u32(input)?;
        let (input, kernel_len) = be_u32(input)?;
        let (input, info1) = Reserved::parse(input)?;
        let (input, image_crc) = be_u32(input)?;
        let (input, rootfs_crc) = be_u32(input)?;
        let (input, kernel_crc) = be_u32(input)?;
        let (input, dtb_crc) = be_u32(input)?;
        let (input, info2) = Reserved::parse(input)?;
        let (input, tag_crc) = be_u32(input)?;

        Ok((
            input,
            Tag {
                signature1,
                signature2,
                chip_id,
                board_id,
                image_len,
                cfe_addr,
                cfe_len,
                rootfs_addr,
                rootfs_len,
                kernel_addr,
                kernel_len,
                info1,
                image_crc,
                rootfs_crc,
                kernel_crc,
                dtb_crc,
                info2,
                tag_crc,
            },
        ))
    }

    /// Encode the tag. Every field is written at its fixed offset; the
    /// result is always exactly [TAG_LEN] bytes.
    pub fn to_bytes(&self) -> [u8; TAG_LEN] {
        let mut buf = [0u8; TAG_LEN];
        let mut out = &mut buf[..];
        out = put(out, self.signature1.as_bytes());
        out = put(out, self.signature2.as_bytes());
        out = put(out, self.chip_id.data());
        out = put(out, self.board_id.data());
        out = put_be_u32(out, self.image_len);
        out = put_be_u32(out, self.cfe_addr);
        out = put_be_u32(out, self.cfe_len);
        out = put_be_u32(out, self.rootfs_addr);
        out = put_be_u32(out, self.rootfs_len);
        out = put_be_u32(out, self.kernel_addr);
        out = put_be_u32(out, self.kernel_len);
        out = put(out, self.info1.data());
        out = put_be_u32(out, self.image_crc);
        out = put_be_u32(out, self.rootfs_crc);
        out = put_be_u32(out, self.kernel_crc);
        out = put_be_u32(out, self.dtb_crc);
        out = put(out, self.info2.data());
        out = put_be_u32(out, self.tag_crc);
        debug_assert!(out.is_empty());
        buf
    }

    /// Recompute `tag_crc` as the Jam-CRC of the encoded tag with the
    /// field itself zeroed. Call after mutating any field, before the tag
    /// is persisted.
    pub fn update_tag_crc(&mut self) {
        self.tag_crc = 0;
        self.tag_crc = jam_crc(&self.to_bytes());
    }

    /// Check the stored `tag_crc` against a recompute.
    pub fn tag_crc_ok(&self) -> bool {
        let mut work = self.clone();
        work.tag_crc = 0;
        jam_crc(&work.to_bytes()) == self.tag_crc
    }
}

fn put<'a>(out: &'a mut [u8], val: &[u8]) -> &'a mut [u8] {
    let (head, rest) = out.split_at_mut(val.len());
    head.copy_from_slice(val);
    rest
}

fn put_be_u32(out: &mut [u8], val: u32) -> &mut [u8] {
    put(out, &val.to_be_bytes())
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln_signature(f, "signature1: ", &self.signature1)?;
        writeln_signature(f, "signature2: ", &self.signature2)?;
        writeln_hex(f, "chip id:    ", self.chip_id.data())?;
        writeln_hex(f, "board id:   ", self.board_id.data())?;
        writeln!(f, "image len:  {:#x} ({} bytes)", self.image_len, self.image_len)?;
        writeln!(f, "cfe addr:   {:#010x}", self.cfe_addr)?;
        writeln!(f, "cfe len:    {:#x} ({} bytes)", self.cfe_len, self.cfe_len)?;
        writeln!(f, "rootfs addr:{:#010x}", self.rootfs_addr)?;
        writeln!(f, "rootfs len: {:#x} ({} bytes)", self.rootfs_len, self.rootfs_len)?;
        writeln!(f, "kernel addr:{:#010x}", self.kernel_addr)?;
        writeln!(f, "kernel len: {:#x} ({} bytes)", self.kernel_len, self.kernel_len)?;
        writeln!(f, "image crc:  {:#010x}", self.image_crc)?;
        writeln!(f, "rootfs crc: {:#010x}", self.rootfs_crc)?;
        writeln!(f, "kernel crc: {:#010x}", self.kernel_crc)?;
        writeln!(f, "dtb crc:    {:#010x}", self.dtb_crc)?;
        write!(f, "tag crc:    {:#010x}", self.tag_crc)
    }
}

fn writeln_signature<const LEN: usize>(
    f: &mut std::fmt::Formatter,
    label: &str,
    sig: &Signature<LEN>,
) -> std::fmt::Result {
    match sig.as_str() {
        Ok(s) => writeln!(f, "{}{:?}", label, s),
        Err(_) => writeln!(f, "{}{:02x?}", label, sig.as_bytes()),
    }
}

fn writeln_hex(f: &mut std::fmt::Formatter, label: &str, bytes: &[u8]) -> std::fmt::Result {
    write!(f, "{}", label)?;
    for b in bytes {
        write!(f, "{:02x}", b)?;
    }
    writeln!(f)
}

#[cfg(test)]
mod test {
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    use crate::crc::jam_crc;

    use super::*;

    impl<const LEN: usize> Arbitrary for Reserved<LEN> {
        fn arbitrary(g: &mut Gen) -> Self {
            let mut data = [0; LEN];
            for b in data.iter_mut() {
                *b = u8::arbitrary(g);
            }
            Reserved::new_data(data)
        }
    }

    impl Arbitrary for Tag {
        fn arbitrary(g: &mut Gen) -> Self {
            Tag {
                signature1: Arbitrary::arbitrary(g),
                signature2: Arbitrary::arbitrary(g),
                chip_id: Arbitrary::arbitrary(g),
                board_id: Arbitrary::arbitrary(g),
                image_len: u32::arbitrary(g),
                cfe_addr: u32::arbitrary(g),
                cfe_len: u32::arbitrary(g),
                rootfs_addr: u32::arbitrary(g),
                rootfs_len: u32::arbitrary(g),
                kernel_addr: u32::arbitrary(g),
                kernel_len: u32::arbitrary(g),
                info1: Arbitrary::arbitrary(g),
                image_crc: u32::arbitrary(g),
                rootfs_crc: u32::arbitrary(g),
                kernel_crc: u32::arbitrary(g),
                dtb_crc: u32::arbitrary(g),
                info2: Arbitrary::arbitrary(g),
                tag_crc: u32::arbitrary(g),
            }
        }
    }

    #[quickcheck]
    fn roundtrip_tag(tag: Tag) -> bool {
        Tag::from_bytes(&tag.to_bytes()) == Ok(tag)
    }

    #[quickcheck]
    fn roundtrip_bytes(data: Vec<u8>) -> bool {
        let mut data = data;
        data.resize(TAG_LEN, 0);
        let tag = Tag::from_bytes(&data).unwrap();
        tag.to_bytes()[..] == data[..]
    }

    #[test]
    fn too_short_rejected() {
        let data = [0u8; TAG_LEN - 1];
        assert_eq!(
            Tag::from_bytes(&data),
            Err(TagError::TooShort { len: TAG_LEN - 1 })
        );
    }

    #[test]
    fn fixed_field_offsets() {
        let mut tag = Tag::from_bytes(&[0u8; TAG_LEN]).unwrap();
        tag.signature1 = Signature::from_str("test").unwrap();
        tag.image_len = 0x11223344;
        tag.cfe_len = 0x55667788;
        tag.rootfs_addr = 0x99aabbcc;
        tag.tag_crc = 0xddeeff00;

        let bytes = tag.to_bytes();
        assert_eq!(&bytes[0x00..0x04], b"test");
        assert_eq!(bytes[0x38..0x3c], 0x11223344u32.to_be_bytes());
        assert_eq!(bytes[0x40..0x44], 0x55667788u32.to_be_bytes());
        assert_eq!(bytes[0x44..0x48], 0x99aabbccu32.to_be_bytes());
        assert_eq!(bytes[0xfc..0x100], 0xddeeff00u32.to_be_bytes());
    }

    #[test]
    fn update_tag_crc_matches_zeroed_encode() {
        let mut tag = Tag::from_bytes(&[0xab; TAG_LEN]).unwrap();
        tag.update_tag_crc();

        let mut zeroed = tag.clone();
        zeroed.tag_crc = 0;
        assert_eq!(tag.tag_crc, jam_crc(&zeroed.to_bytes()));
        assert!(tag.tag_crc_ok());
    }

    #[test]
    fn stale_tag_crc_detected() {
        let mut tag = Tag::from_bytes(&[0u8; TAG_LEN]).unwrap();
        tag.update_tag_crc();
        tag.image_len = 1;
        assert!(!tag.tag_crc_ok());
    }
}
