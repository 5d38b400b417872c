//! Contains functions for casting between plain values and bytes.
use std::{mem, ptr, slice};

/// Types that can be safely built from any bit pattern of their size.
///
/// # Safety
///
/// Implementor must have no padding, no invalid bit patterns and no references.
pub unsafe trait Pod: Copy + Send + Sync + 'static {}

macro_rules! impl_pod {
    ($($t:ty),*) => {
        $(
            unsafe impl Pod for $t {}
            unsafe impl Pod for [$t; 2] {}
            unsafe impl Pod for [$t; 3] {}
            unsafe impl Pod for [$t; 4] {}
        )*
    };
}

impl_pod!(u8, i8, u16, i16, u32, i32, u64, i64, usize, isize, f32, f64);

/// Cast slice of some plain type into slice of bytes.
pub fn cast_slice<T: Pod>(slice: &[T]) -> &[u8] {
    let len = mem::size_of::<T>() * slice.len();
    unsafe { slice::from_raw_parts(slice.as_ptr() as *const u8, len) }
}

/// Cast vec of some plain type into vec of bytes.
pub fn cast_vec<T: Pod>(vec: &[T]) -> Vec<u8> {
    cast_slice(vec).to_vec()
}

/// Collect bytes into values of plain type.
/// Trailing bytes that do not form a whole value are ignored.
pub fn collect_pod<T: Pod>(bytes: &[u8]) -> Vec<T> {
    bytes
        .chunks_exact(mem::size_of::<T>())
        .map(read_pod::<T>)
        .collect()
}

/// Read plain value from the beginning of `bytes`.
///
/// # Panics
///
/// Panics if `bytes` is shorter than `T`.
pub fn read_pod<T: Pod>(bytes: &[u8]) -> T {
    assert!(bytes.len() >= mem::size_of::<T>());
    unsafe { ptr::read_unaligned(bytes.as_ptr() as *const T) }
}

/// Write plain value at the beginning of `bytes`.
///
/// # Panics
///
/// Panics if `bytes` is shorter than `T`.
pub fn write_pod<T: Pod>(bytes: &mut [u8], value: T) {
    assert!(bytes.len() >= mem::size_of::<T>());
    unsafe { ptr::write_unaligned(bytes.as_mut_ptr() as *mut T, value) }
}
