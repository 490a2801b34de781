//! Editing of Broadcom-style router firmware images: the fixed tag header
//! codec, region layout bookkeeping, and split/merge rebuilds.

pub mod crc;
pub mod layout;
pub mod tag;

mod image;
pub use image::*;

mod signature;
pub use signature::*;
