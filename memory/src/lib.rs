//! Memory objects, images and mapped views.

#![warn(
    missing_debug_implementations,
    missing_copy_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

use kiln_core::{Error, ErrorKind};

mod buffer;
mod image;
mod mapping;
mod memory;
mod storage;
mod util;

pub use crate::{
    buffer::Buffer,
    image::{
        ChannelOrder, ChannelType, Image, ImageDesc, ImageFormat, ImageKind, ImageLayout,
        ImageSide,
    },
    mapping::{MappedRead, MappedView, MappedWrite, Unmapped},
    memory::{MemoryInfo, MemoryKey, MemoryKind, MemoryObject, MemoryTable},
    storage::{HostPointer, StorageClass},
};

/// Check that `size` bytes from `offset` stay within an object of `len` bytes.
pub fn check_range(len: usize, offset: usize, size: usize) -> Result<(), Error> {
    match util::checked_range(offset, size) {
        Some(range) if util::is_sub_range(0..len, &range) => Ok(()),
        _ => Err(Error::new(
            ErrorKind::InvalidValue,
            format!(
                "Range of {} bytes at {} exceeds object of {} bytes",
                size, offset, len
            ),
        )),
    }
}

/// Check fill pattern and range.
/// Pattern size must be a power of two up to 128 bytes,
/// offset and size must be its multiples.
pub fn check_fill(
    len: usize,
    pattern: usize,
    offset: usize,
    size: usize,
) -> Result<(), Error> {
    if !util::is_power_of_two(pattern) || pattern > 128 {
        return Err(Error::new(
            ErrorKind::InvalidValue,
            format!("Pattern of {} bytes is not supported", pattern),
        ));
    }
    if offset % pattern != 0 || size % pattern != 0 {
        return Err(Error::new(
            ErrorKind::InvalidValue,
            format!(
                "Offset {} and size {} must be multiples of pattern size {}",
                offset, size, pattern
            ),
        ));
    }
    check_range(len, offset, size)
}

/// Check that memory object size is acceptable for the device.
pub fn check_size(size: usize, max_alloc: u64) -> Result<(), Error> {
    if size == 0 || size as u64 > max_alloc {
        return Err(Error::new(
            ErrorKind::InvalidBufferSize,
            format!("Size {} is outside of (0, {}]", size, max_alloc),
        ));
    }
    Ok(())
}
