use {
    crate::{
        image::{ImageFormat, ImageLayout},
        storage::{HostPointer, StorageClass},
    },
    kiln_core::{AccessMode, Backend, Error, ErrorKind, MemoryLocation},
    slotmap::{new_key_type, SlotMap},
    std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

new_key_type! {
    /// Key of the memory object in its context's table.
    pub struct MemoryKey;
}

/// What the memory object holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryKind {
    /// Linear bytes.
    Buffer,

    /// Structured elements.
    Image {
        /// Element format.
        format: ImageFormat,
        /// Byte layout.
        layout: ImageLayout,
    },
}

/// Snapshot of memory object attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryInfo {
    /// Size in bytes.
    pub size: usize,

    /// Kernel access.
    pub access: AccessMode,

    /// Storage location.
    pub location: MemoryLocation,

    /// Relationship with host region.
    pub host_pointer: HostPointer,

    /// Number of outstanding mapped views.
    pub map_count: usize,

    /// Buffer or image.
    pub kind: MemoryKind,
}

/// Memory object record owned by the context.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct MemoryObject<B: Backend> {
    raw: Arc<B::Memory>,
    size: usize,
    access: AccessMode,
    storage: StorageClass,
    kind: MemoryKind,
    maps: Arc<AtomicUsize>,
}

impl<B> MemoryObject<B>
where
    B: Backend,
{
    /// Wrap raw memory.
    pub fn new(
        raw: B::Memory,
        size: usize,
        access: AccessMode,
        storage: StorageClass,
        kind: MemoryKind,
    ) -> Self {
        MemoryObject {
            raw: Arc::new(raw),
            size,
            access,
            storage,
            kind,
            maps: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Raw memory shared with in-flight commands.
    pub fn raw(&self) -> &Arc<B::Memory> {
        &self.raw
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Kernel access.
    pub fn access(&self) -> AccessMode {
        self.access
    }

    /// Storage.
    pub fn storage(&self) -> &StorageClass {
        &self.storage
    }

    /// Buffer or image.
    pub fn kind(&self) -> MemoryKind {
        self.kind
    }

    /// Counter of outstanding mapped views.
    pub fn maps(&self) -> &Arc<AtomicUsize> {
        &self.maps
    }

    /// Snapshot of attributes.
    pub fn info(&self) -> MemoryInfo {
        MemoryInfo {
            size: self.size,
            access: self.access,
            location: self.storage.location(),
            host_pointer: self.storage.host_pointer(),
            map_count: self.maps.load(Ordering::Acquire),
            kind: self.kind,
        }
    }

    /// Image layout, `InvalidMemObject` for buffers.
    pub fn image(&self) -> Result<(ImageFormat, ImageLayout), Error> {
        match self.kind {
            MemoryKind::Image { format, layout } => Ok((format, layout)),
            MemoryKind::Buffer => Err(Error::new(
                ErrorKind::InvalidMemObject,
                "Buffer used where image is expected",
            )),
        }
    }

    /// `InvalidMemObject` for images.
    pub fn buffer(&self) -> Result<&Self, Error> {
        match self.kind {
            MemoryKind::Buffer => Ok(self),
            MemoryKind::Image { .. } => Err(Error::new(
                ErrorKind::InvalidMemObject,
                "Image used where buffer is expected",
            )),
        }
    }
}

/// Generational table of memory objects.
/// Released keys stay invalid forever.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""), Default(bound = ""))]
pub struct MemoryTable<B: Backend> {
    objects: SlotMap<MemoryKey, MemoryObject<B>>,
}

impl<B> MemoryTable<B>
where
    B: Backend,
{
    /// Create empty table.
    pub fn new() -> Self {
        MemoryTable {
            objects: SlotMap::with_key(),
        }
    }

    /// Insert record.
    pub fn insert(&mut self, object: MemoryObject<B>) -> MemoryKey {
        self.objects.insert(object)
    }

    /// Get record.
    pub fn get(&self, key: MemoryKey) -> Result<&MemoryObject<B>, Error> {
        self.objects.get(key).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidMemObject,
                format!("Memory object {:?} is released", key),
            )
        })
    }

    /// Remove record.
    /// Fails with `InvalidOperation` while mapped views are outstanding.
    pub fn remove(&mut self, key: MemoryKey) -> Result<MemoryObject<B>, Error> {
        let maps = self.get(key)?.maps.load(Ordering::Acquire);
        if maps > 0 {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                format!("Memory object {:?} has {} mapped views", key, maps),
            ));
        }
        self.objects.remove(key).ok_or_else(|| ErrorKind::InvalidMemObject.into())
    }

    /// Drop all records.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if table is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
