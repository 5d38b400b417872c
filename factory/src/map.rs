//! Mapping and unmapping.

use {
    crate::queue::{settle, CommandQueue},
    kiln_command::Event,
    kiln_core::{Backend, Command, CommandType, Error, ErrorKind, MapIntent},
    kiln_memory::{check_range, Buffer, Image, MappedView},
    thread_profiler::profile_scope,
};

impl<B> CommandQueue<B>
where
    B: Backend,
{
    /// Map `size` bytes of the buffer from `offset`.
    ///
    /// Blocking maps return a view that is valid for `intent` right away.
    /// Otherwise the view is valid once the returned event completes.
    /// The view must be passed to `unmap`.
    pub fn map_buffer(
        &self,
        buffer: &Buffer,
        blocking: bool,
        intent: MapIntent,
        offset: usize,
        size: usize,
        waits: &[Event<B>],
    ) -> Result<(MappedView<B>, Event<B>), Error> {
        profile_scope!("map_buffer");

        if size == 0 {
            return Err(Error::new(ErrorKind::InvalidValue, "Mapping of zero bytes"));
        }

        let queue = self.queue()?;
        let (memory, len) = self.buffer_memory(buffer)?;
        check_range(len, offset, size)?;

        let (event, mapping) =
            queue.map(CommandType::MapBuffer, &memory, offset, size, intent, waits)?;
        let event = settle(event, blocking)?;

        let view = self.context().with_memory(buffer, |object| {
            Ok(MappedView::new(
                object,
                buffer.key(),
                self.context_id(),
                mapping,
                offset,
                size,
                intent,
            ))
        })?;
        log::trace!("Mapped {} bytes at {} of {:?}", size, offset, buffer.key());
        Ok((view, event))
    }

    /// Map image region.
    ///
    /// The view covers bytes from the first to the last element of the region
    /// and reports the image's row and slice pitch.
    pub fn map_image(
        &self,
        image: &Image,
        blocking: bool,
        intent: MapIntent,
        origin: [usize; 3],
        region: [usize; 3],
        waits: &[Event<B>],
    ) -> Result<(MappedView<B>, Event<B>), Error> {
        profile_scope!("map_image");

        let queue = self.queue()?;
        let (memory, _, layout) = self.image_memory(image)?;
        let side = layout.side(origin, region)?;
        let rect = side.to(&side);
        let span = rect
            .src_span()
            .ok_or_else(|| Error::new(ErrorKind::InvalidValue, "Image region overflows"))?;
        let (offset, size) = (span.start, span.end - span.start);

        let (event, mapping) =
            queue.map(CommandType::MapImage, &memory, offset, size, intent, waits)?;
        let event = settle(event, blocking)?;

        let view = self.context().with_memory(image, |object| {
            Ok(MappedView::new(
                object,
                image.key(),
                self.context_id(),
                mapping,
                offset,
                size,
                intent,
            )
            .with_pitches(layout.row_pitch, layout.slice_pitch))
        })?;
        log::trace!("Mapped region {:?} at {:?} of {:?}", region, origin, image.key());
        Ok((view, event))
    }

    /// End the mapping.
    ///
    /// For write mappings the host writes are visible to commands
    /// ordered after the returned event.
    ///
    /// # Panics
    ///
    /// Panics if the view was mapped through another context.
    pub fn unmap(&self, view: MappedView<B>, waits: &[Event<B>]) -> Result<Event<B>, Error> {
        profile_scope!("unmap");

        view.assert_context_owner(self.context_id());
        let unmapped = view.into_unmapped();
        log::trace!(
            "Unmapping {} bytes at {} of {:?}",
            unmapped.size,
            unmapped.offset,
            unmapped.key
        );

        self.enqueue(
            CommandType::UnmapMemObject,
            Command::Unmap {
                memory: unmapped.memory,
                mapping: unmapped.mapping,
                offset: unmapped.offset,
                size: unmapped.size,
                intent: unmapped.intent,
            },
            waits,
            false,
        )
    }
}
