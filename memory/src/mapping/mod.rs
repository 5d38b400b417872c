mod range;
mod write;

use {
    crate::memory::{MemoryKey, MemoryObject},
    kiln_core::{Backend, ContextId, Error, ErrorKind, MapIntent, Mapping},
    parking_lot::RwLockReadGuard,
    relevant::Relevant,
    std::{
        ops::{Deref, Range},
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
    },
};

pub(crate) use self::range::mapped_sub_range;
pub use self::write::MappedWrite;

/// Host window onto bytes of a memory object.
///
/// Valid between the map call that created it and the unmap call that consumes it.
/// For non-blocking maps content is valid once the map event completes.
/// Dropping a view without unmapping it is reported and keeps the object mapped.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct MappedView<B: Backend> {
    memory: Arc<B::Memory>,
    key: MemoryKey,
    context: ContextId,
    mapping: Mapping,
    offset: usize,
    size: usize,
    intent: MapIntent,
    row_pitch: usize,
    slice_pitch: usize,
    #[derivative(Debug = "ignore")]
    maps: Arc<AtomicUsize>,
    relevant: Relevant,
}

kiln_core::context_owned!(MappedView<B> @ |view: &Self| view.context);

/// Everything the unmap command needs.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Unmapped<B: Backend> {
    /// Mapped object.
    pub memory: Arc<B::Memory>,

    /// Key of the mapped object.
    pub key: MemoryKey,

    /// Host window.
    pub mapping: Mapping,

    /// First mapped byte of the object.
    pub offset: usize,

    /// Number of mapped bytes.
    pub size: usize,

    /// Access the view was created for.
    pub intent: MapIntent,
}

impl<B> MappedView<B>
where
    B: Backend,
{
    /// Create view over `size` bytes of the object from `offset`.
    /// The object counts the view as outstanding until it is unmapped.
    pub fn new(
        object: &MemoryObject<B>,
        key: MemoryKey,
        context: ContextId,
        mapping: Mapping,
        offset: usize,
        size: usize,
        intent: MapIntent,
    ) -> Self {
        object.maps().fetch_add(1, Ordering::AcqRel);
        MappedView {
            memory: object.raw().clone(),
            key,
            context,
            mapping,
            offset,
            size,
            intent,
            row_pitch: size,
            slice_pitch: size,
            maps: object.maps().clone(),
            relevant: Relevant,
        }
    }

    /// Set pitches of image views.
    pub fn with_pitches(mut self, row_pitch: usize, slice_pitch: usize) -> Self {
        self.row_pitch = row_pitch;
        self.slice_pitch = slice_pitch;
        self
    }

    /// Key of the mapped object.
    pub fn key(&self) -> MemoryKey {
        self.key
    }

    /// First mapped byte of the object.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of mapped bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Access the view was created for.
    pub fn intent(&self) -> MapIntent {
        self.intent
    }

    /// Bytes between rows for image views, view size for buffers.
    pub fn row_pitch(&self) -> usize {
        self.row_pitch
    }

    /// Bytes between slices for image views, view size for buffers.
    pub fn slice_pitch(&self) -> usize {
        self.slice_pitch
    }

    fn window(&self) -> Range<usize> {
        self.mapping.offset..self.mapping.offset + self.size
    }

    /// Lock whole view for reading.
    pub fn read(&self) -> MappedRead<'_> {
        MappedRead {
            guard: self.mapping.region.read(),
            range: self.window(),
        }
    }

    /// Lock part of the view for reading.
    /// `range` is relative to the view start.
    pub fn read_range(&self, range: Range<usize>) -> Result<MappedRead<'_>, Error> {
        let range = mapped_sub_range(self.window(), range.clone()).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidValue,
                format!("Range {:?} is out of view of {} bytes", range, self.size),
            )
        })?;
        Ok(MappedRead {
            guard: self.mapping.region.read(),
            range,
        })
    }

    /// Lock whole view for writing.
    /// Fails with `InvalidOperation` for views mapped for reading.
    pub fn write(&mut self) -> Result<MappedWrite<'_>, Error> {
        if self.intent != MapIntent::Write {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                "View is mapped for reading",
            ));
        }
        Ok(MappedWrite {
            guard: self.mapping.region.write(),
            range: self.window(),
        })
    }

    /// Copy view content.
    pub fn to_vec(&self) -> Vec<u8> {
        self.read().to_vec()
    }

    /// End the view.
    /// The object stops counting it as outstanding.
    pub fn into_unmapped(self) -> Unmapped<B> {
        self.maps.fetch_sub(1, Ordering::AcqRel);
        self.relevant.dispose();
        Unmapped {
            memory: self.memory,
            key: self.key,
            mapping: self.mapping,
            offset: self.offset,
            size: self.size,
            intent: self.intent,
        }
    }
}

/// Host read access to a mapped view.
#[derive(Debug)]
pub struct MappedRead<'a> {
    guard: RwLockReadGuard<'a, Vec<u8>>,
    range: Range<usize>,
}

impl<'a> Deref for MappedRead<'a> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.guard[self.range.clone()]
    }
}
