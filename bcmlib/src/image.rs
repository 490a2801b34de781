//! Whole-image operations: splitting an image into its regions, and
//! rebuilding one around a replacement rootfs and kernel.

use crate::crc::jam_crc;
use crate::layout::{ImageLayout, LayoutError};
use crate::signature::Signature;
use crate::tag::{Tag, TagError, SIG2_LEN, TAG_LEN};

/// A raw firmware image together with its decoded tag.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FirmwareImage {
    data: Vec<u8>,
    tag: Tag,
}

/// Regions extracted by [FirmwareImage::split].
///
/// The cfe region is not extracted; merge always reuses the one from the
/// original image.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SplitRegions {
    pub rootfs: Vec<u8>,
    pub kernel: Vec<u8>,
    pub postfix: Vec<u8>,
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum MergeError {
    Layout(LayoutError),
    Oversize { what: &'static str, len: usize },
}

impl std::error::Error for MergeError {}

impl std::fmt::Display for MergeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MergeError::Layout(e) => e.fmt(f),
            MergeError::Oversize { what, len } => {
                write!(f, "{} is {} bytes, too large for a tag length field", what, len)
            }
        }
    }
}

impl From<LayoutError> for MergeError {
    fn from(e: LayoutError) -> Self {
        MergeError::Layout(e)
    }
}

impl FirmwareImage {
    /// Decode the tag and take ownership of the raw image bytes.
    ///
    /// The stored tag checksum is not verified here; see [Self::check].
    pub fn new(data: Vec<u8>) -> Result<Self, TagError> {
        let tag = Tag::from_bytes(&data)?;
        Ok(Self { data, tag })
    }

    pub fn new_cloned(data: &[u8]) -> Result<Self, TagError> {
        Self::new(data.to_owned())
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Check the stored tag checksum against a recompute.
    pub fn check(&self) -> bool {
        self.tag.tag_crc_ok()
    }

    pub fn layout(&self) -> Result<ImageLayout, LayoutError> {
        ImageLayout::from_tag(&self.tag, self.data.len())
    }

    /// Copy out the rootfs, kernel and postfix regions.
    pub fn split(&self) -> Result<SplitRegions, LayoutError> {
        let layout = self.layout()?;
        Ok(SplitRegions {
            rootfs: self.data[layout.rootfs].to_vec(),
            kernel: self.data[layout.kernel].to_vec(),
            postfix: self.data[layout.postfix].to_vec(),
        })
    }

    /// Rebuild the image with a replacement rootfs and kernel.
    ///
    /// The cfe, dtb and postfix regions are taken from this image, located
    /// with the original tag. Lengths, addresses and checksums are
    /// recomputed and the tag checksum updated; `dtb_crc` keeps its
    /// original value.
    pub fn merge(
        &self,
        rootfs: &[u8],
        kernel: &[u8],
        signature2: Option<Signature<SIG2_LEN>>,
    ) -> Result<FirmwareImage, MergeError> {
        let layout = self.layout()?;
        let cfe = &self.data[layout.cfe.clone()];
        let dtb = &self.data[layout.dtb.clone()];
        let postfix = &self.data[layout.postfix.clone()];

        let mut body = Vec::with_capacity(cfe.len() + rootfs.len() + kernel.len() + dtb.len());
        body.extend_from_slice(cfe);
        body.extend_from_slice(rootfs);
        body.extend_from_slice(kernel);
        body.extend_from_slice(dtb);

        let mut tag = self.tag.clone();
        if let Some(signature2) = signature2 {
            tag.signature2 = signature2;
        }
        tag.image_len = field_len("image body", body.len())?;
        tag.rootfs_len = field_len("rootfs", rootfs.len())?;
        tag.kernel_addr = tag.rootfs_addr.wrapping_add(tag.rootfs_len);
        tag.kernel_len = field_len("kernel", kernel.len())?;
        tag.image_crc = jam_crc(&body);
        tag.rootfs_crc = jam_crc(rootfs);
        tag.kernel_crc = jam_crc(kernel);
        tag.update_tag_crc();

        let mut data = Vec::with_capacity(TAG_LEN + body.len() + postfix.len());
        data.extend_from_slice(&tag.to_bytes());
        data.extend_from_slice(&body);
        data.extend_from_slice(postfix);

        Ok(FirmwareImage { data, tag })
    }
}

fn field_len(what: &'static str, len: usize) -> Result<u32, MergeError> {
    u32::try_from(len).map_err(|_| MergeError::Oversize { what, len })
}

impl std::ops::Deref for FirmwareImage {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
