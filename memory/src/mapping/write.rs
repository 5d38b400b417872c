use {
    parking_lot::RwLockWriteGuard,
    std::ops::{Deref, DerefMut, Range},
};

/// Host write access to a mapped view.
/// Writes become device-visible once the view is unmapped.
#[derive(Debug)]
pub struct MappedWrite<'a> {
    pub(super) guard: RwLockWriteGuard<'a, Vec<u8>>,
    pub(super) range: Range<usize>,
}

impl<'a> MappedWrite<'a> {
    /// Write data at the beginning of the view.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` is greater than the view.
    pub fn write(&mut self, data: &[u8]) {
        let slice = &mut **self;
        assert!(data.len() <= slice.len());
        slice[..data.len()].copy_from_slice(data);
    }
}

impl<'a> Deref for MappedWrite<'a> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.guard[self.range.clone()]
    }
}

impl<'a> DerefMut for MappedWrite<'a> {
    fn deref_mut(&mut self) -> &mut [u8] {
        let range = self.range.clone();
        &mut self.guard[range]
    }
}
