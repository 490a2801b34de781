//! Locating the regions of an image file from its decoded tag.

use std::ops::Range;

use crate::tag::{Tag, DTB_LEN, TAG_LEN};

/// Byte ranges of each region inside the raw image file.
///
/// The regions are contiguous: tag, cfe, rootfs, kernel, dtb, postfix.
/// Any of cfe/rootfs/kernel may be empty; the postfix runs from the end
/// of the dtb to the end of the file and may be empty too.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ImageLayout {
    pub cfe: Range<usize>,
    pub rootfs: Range<usize>,
    pub kernel: Range<usize>,
    pub dtb: Range<usize>,
    pub postfix: Range<usize>,
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum LayoutError {
    Truncated { described: u64, actual: u64 },
}

impl std::error::Error for LayoutError {}

impl std::fmt::Display for LayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LayoutError::Truncated { described, actual } => write!(
                f,
                "tag describes at least {} bytes, image file has only {}",
                described, actual
            ),
        }
    }
}

impl ImageLayout {
    /// Compute the region ranges for an image of `file_len` bytes.
    pub fn from_tag(tag: &Tag, file_len: usize) -> Result<Self, LayoutError> {
        let described = TAG_LEN as u64
            + tag.cfe_len as u64
            + tag.rootfs_len as u64
            + tag.kernel_len as u64
            + DTB_LEN as u64;
        if described > file_len as u64 {
            return Err(LayoutError::Truncated {
                described,
                actual: file_len as u64,
            });
        }

        let cfe = TAG_LEN..TAG_LEN + tag.cfe_len as usize;
        let rootfs = cfe.end..cfe.end + tag.rootfs_len as usize;
        let kernel = rootfs.end..rootfs.end + tag.kernel_len as usize;
        let dtb = kernel.end..kernel.end + DTB_LEN;
        let postfix = dtb.end..file_len;

        Ok(ImageLayout {
            cfe,
            rootfs,
            kernel,
            dtb,
            postfix,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_tag() -> Tag {
        let mut tag = Tag::from_bytes(&[0u8; TAG_LEN]).unwrap();
        tag.cfe_len = 0x10;
        tag.rootfs_len = 0x100;
        tag.kernel_len = 0x200;
        tag
    }

    #[test]
    fn region_ranges() {
        let tag = sample_tag();
        let file_len = TAG_LEN + 0x10 + 0x100 + 0x200 + DTB_LEN + 5;
        let layout = ImageLayout::from_tag(&tag, file_len).unwrap();

        assert_eq!(layout.cfe, 0x100..0x110);
        assert_eq!(layout.rootfs, 0x110..0x210);
        assert_eq!(layout.kernel, 0x210..0x410);
        assert_eq!(layout.dtb, 0x410..0x410 + DTB_LEN);
        assert_eq!(layout.postfix, 0x410 + DTB_LEN..file_len);
        assert_eq!(layout.postfix.len(), 5);
    }

    #[test]
    fn empty_postfix() {
        let tag = sample_tag();
        let file_len = TAG_LEN + 0x10 + 0x100 + 0x200 + DTB_LEN;
        let layout = ImageLayout::from_tag(&tag, file_len).unwrap();
        assert!(layout.postfix.is_empty());
    }

    #[test]
    fn truncated_file() {
        let tag = sample_tag();
        let file_len = TAG_LEN + 0x10 + 0x100 + 0x200 + DTB_LEN - 1;
        assert_eq!(
            ImageLayout::from_tag(&tag, file_len),
            Err(LayoutError::Truncated {
                described: file_len as u64 + 1,
                actual: file_len as u64,
            })
        );
    }
}
