use kiln_core::{AccessMode, HostRegion, MemoryDesc, MemoryInit, MemoryLocation};

/// Memory object of the host backend.
/// Storage is always a host region, aliased ones included.
#[derive(Debug)]
pub struct HostMemory {
    region: HostRegion,
    size: usize,
    access: AccessMode,
    location: MemoryLocation,
}

impl HostMemory {
    pub(crate) fn new(desc: &MemoryDesc, init: MemoryInit<'_>) -> Self {
        let size = desc.size as usize;
        let region = match init {
            MemoryInit::None => HostRegion::new(size),
            MemoryInit::Copy(bytes) => HostRegion::from_slice(&bytes[..size]),
            MemoryInit::Alias(region) => region,
        };
        HostMemory {
            region,
            size,
            access: desc.access,
            location: desc.location,
        }
    }

    /// Storage.
    pub fn region(&self) -> &HostRegion {
        &self.region
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Kernel access.
    pub fn access(&self) -> AccessMode {
        self.access
    }

    /// Storage location.
    pub fn location(&self) -> MemoryLocation {
        self.location
    }
}
