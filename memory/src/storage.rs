use kiln_core::{
    backend::{Backend, MemoryDesc, MemoryInit, RawContext},
    AccessMode, Error, ErrorKind, HostRegion, MemoryLocation,
};

/// Storage of a memory object.
///
/// Crosses storage location with the relationship to a host region.
#[derive(Clone, Debug)]
pub enum StorageClass {
    /// Device storage, content unspecified.
    DeviceAllocated,

    /// Host storage accessible by the device, content unspecified.
    HostAllocated,

    /// Device uses the host region itself for the lifetime of the object.
    HostPointerBacked(HostRegion),

    /// Device storage initialized from the host region at creation.
    HostPointerBackedCopy(HostRegion),

    /// Host storage initialized from the host region at creation.
    HostAllocatedCopy(HostRegion),
}

impl Default for StorageClass {
    fn default() -> Self {
        StorageClass::DeviceAllocated
    }
}

/// Relationship between memory object and a host region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub enum HostPointer {
    /// No host region involved.
    None,

    /// Host region was copied at creation.
    Copy,

    /// Host region is the storage.
    Alias,
}

impl StorageClass {
    /// Where storage lives.
    pub fn location(&self) -> MemoryLocation {
        match self {
            StorageClass::DeviceAllocated | StorageClass::HostPointerBackedCopy(_) => {
                MemoryLocation::Device
            }
            StorageClass::HostAllocated
            | StorageClass::HostPointerBacked(_)
            | StorageClass::HostAllocatedCopy(_) => MemoryLocation::Host,
        }
    }

    /// Relationship with host region.
    pub fn host_pointer(&self) -> HostPointer {
        match self {
            StorageClass::DeviceAllocated | StorageClass::HostAllocated => HostPointer::None,
            StorageClass::HostPointerBacked(_) => HostPointer::Alias,
            StorageClass::HostPointerBackedCopy(_) | StorageClass::HostAllocatedCopy(_) => {
                HostPointer::Copy
            }
        }
    }

    /// Host region the object was created with.
    pub fn host_region(&self) -> Option<&HostRegion> {
        match self {
            StorageClass::DeviceAllocated | StorageClass::HostAllocated => None,
            StorageClass::HostPointerBacked(region)
            | StorageClass::HostPointerBackedCopy(region)
            | StorageClass::HostAllocatedCopy(region) => Some(region),
        }
    }

    /// Create raw memory object of `size` bytes with this storage.
    pub fn create<B: Backend>(
        &self,
        context: &B::Context,
        size: usize,
        access: AccessMode,
    ) -> Result<B::Memory, Error> {
        if let Some(region) = self.host_region() {
            if region.len() < size {
                return Err(Error::new(
                    ErrorKind::InvalidHostPtr,
                    format!(
                        "Host region of {} bytes can't back {} bytes",
                        region.len(),
                        size
                    ),
                ));
            }
        }

        let desc = MemoryDesc {
            size: size as u64,
            access,
            location: self.location(),
        };

        match self {
            StorageClass::DeviceAllocated | StorageClass::HostAllocated => {
                context.create_memory(&desc, MemoryInit::None)
            }
            StorageClass::HostPointerBacked(region) => {
                context.create_memory(&desc, MemoryInit::Alias(region.clone()))
            }
            StorageClass::HostPointerBackedCopy(region) | StorageClass::HostAllocatedCopy(region) => {
                let bytes = region.read();
                context.create_memory(&desc, MemoryInit::Copy(&bytes[..size]))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn storage_axes() {
        let region = HostRegion::new(16);
        let cases = [
            (StorageClass::DeviceAllocated, MemoryLocation::Device, HostPointer::None),
            (StorageClass::HostAllocated, MemoryLocation::Host, HostPointer::None),
            (
                StorageClass::HostPointerBacked(region.clone()),
                MemoryLocation::Host,
                HostPointer::Alias,
            ),
            (
                StorageClass::HostPointerBackedCopy(region.clone()),
                MemoryLocation::Device,
                HostPointer::Copy,
            ),
            (
                StorageClass::HostAllocatedCopy(region.clone()),
                MemoryLocation::Host,
                HostPointer::Copy,
            ),
        ];

        for (storage, location, pointer) in cases.iter() {
            assert_eq!(storage.location(), *location);
            assert_eq!(storage.host_pointer(), *pointer);
            assert_eq!(storage.host_region().is_some(), *pointer != HostPointer::None);
        }
    }
}
