use {
    parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    std::{fmt, sync::Arc},
};

/// Shared, lockable host byte region.
///
/// Host memory that commands read from or write into after the enqueue call returns.
/// Clones refer to the same bytes.
#[derive(Clone, Default)]
pub struct HostRegion {
    bytes: Arc<RwLock<Vec<u8>>>,
}

impl fmt::Debug for HostRegion {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("HostRegion")
            .field("addr", &self.addr())
            .field("len", &self.len())
            .finish()
    }
}

impl HostRegion {
    /// Allocate zero-filled region.
    pub fn new(len: usize) -> Self {
        HostRegion::from_vec(vec![0; len])
    }

    /// Wrap bytes.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        HostRegion {
            bytes: Arc::new(RwLock::new(bytes)),
        }
    }

    /// Copy bytes into new region.
    pub fn from_slice(bytes: &[u8]) -> Self {
        HostRegion::from_vec(bytes.to_vec())
    }

    /// Size of the region in bytes.
    pub fn len(&self) -> usize {
        self.bytes.read().len()
    }

    /// Check if region is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock region for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.bytes.read()
    }

    /// Lock region for writing.
    /// Commands address the region by offsets computed at enqueue time,
    /// so it must not shrink while they are in flight.
    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.bytes.write()
    }

    /// Copy region content.
    pub fn to_vec(&self) -> Vec<u8> {
        self.read().clone()
    }

    /// Check if both handles refer to the same bytes.
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }

    /// Stable address of the region used to order lock acquisition.
    pub fn addr(&self) -> usize {
        &*self.bytes as *const RwLock<Vec<u8>> as usize
    }
}
