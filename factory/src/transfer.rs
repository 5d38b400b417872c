//! Buffer transfers.

use {
    crate::queue::CommandQueue,
    kiln_command::Event,
    kiln_core::{Backend, Command, CommandType, Error, ErrorKind, HostRegion, Rect},
    kiln_memory::{check_fill, check_range, Buffer},
    smallvec::SmallVec,
    thread_profiler::profile_scope,
};

fn overlap(rect: &Rect) -> Result<(), Error> {
    if rect.overlaps() {
        Err(Error::new(
            ErrorKind::MemCopyOverlap,
            format!(
                "Source {:?} and destination {:?} overlap",
                rect.src_span(),
                rect.dst_span()
            ),
        ))
    } else {
        Ok(())
    }
}

/// Check rect against both sides and normalize its pitches.
pub(crate) fn checked_rect(rect: &Rect, src_len: usize, dst_len: usize) -> Result<Rect, Error> {
    let rect = rect.normalized();
    rect.check_bounds(src_len, dst_len)?;
    Ok(rect)
}

impl<B> CommandQueue<B>
where
    B: Backend,
{
    /// Copy `size` bytes between buffers.
    /// Ranges within one buffer must not overlap.
    pub fn copy_buffer(
        &self,
        src: &Buffer,
        dst: &Buffer,
        src_offset: usize,
        dst_offset: usize,
        size: usize,
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        profile_scope!("copy_buffer");

        let (src_memory, src_len) = self.buffer_memory(src)?;
        let (dst_memory, dst_len) = self.buffer_memory(dst)?;
        check_range(src_len, src_offset, size)?;
        check_range(dst_len, dst_offset, size)?;

        let rect = Rect::linear(src_offset, dst_offset, size);
        if src.key() == dst.key() {
            overlap(&rect)?;
        }

        self.enqueue(
            CommandType::CopyBuffer,
            Command::Copy {
                src: src_memory,
                dst: dst_memory,
                rect,
            },
            waits,
            false,
        )
    }

    /// Read `dst.len()` bytes from `offset`, blocking until they are in `dst`.
    pub fn read_buffer(
        &self,
        buffer: &Buffer,
        offset: usize,
        dst: &mut [u8],
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        let staging = HostRegion::new(dst.len());
        let event = self.read_buffer_async(buffer, offset, dst.len(), &staging, 0, waits)?;
        let event = crate::queue::settle(event, true)?;
        dst.copy_from_slice(&staging.read());
        Ok(event)
    }

    /// Read `size` bytes from `offset` into `dst` at `dst_offset`.
    /// `dst` holds the bytes once the returned event completes.
    pub fn read_buffer_async(
        &self,
        buffer: &Buffer,
        offset: usize,
        size: usize,
        dst: &HostRegion,
        dst_offset: usize,
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        profile_scope!("read_buffer");

        let (memory, len) = self.buffer_memory(buffer)?;
        check_range(len, offset, size)?;
        check_range(dst.len(), dst_offset, size)?;

        self.enqueue(
            CommandType::ReadBuffer,
            Command::Read {
                src: memory,
                dst: dst.clone(),
                rect: Rect::linear(offset, dst_offset, size),
            },
            waits,
            false,
        )
    }

    /// Write `src` at `offset`.
    /// Bytes are captured at admission, so `src` can be reused right away.
    pub fn write_buffer(
        &self,
        buffer: &Buffer,
        offset: usize,
        src: &[u8],
        blocking: bool,
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        let staging = HostRegion::from_slice(src);
        self.write_buffer_from(buffer, offset, &staging, 0, src.len(), blocking, waits)
    }

    /// Write `size` bytes of `src` from `src_offset` at `offset`.
    /// `src` is read when the command runs.
    pub fn write_buffer_from(
        &self,
        buffer: &Buffer,
        offset: usize,
        src: &HostRegion,
        src_offset: usize,
        size: usize,
        blocking: bool,
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        profile_scope!("write_buffer");

        let (memory, len) = self.buffer_memory(buffer)?;
        check_range(len, offset, size)?;
        check_range(src.len(), src_offset, size)?;

        self.enqueue(
            CommandType::WriteBuffer,
            Command::Write {
                src: src.clone(),
                dst: memory,
                rect: Rect::linear(src_offset, offset, size),
            },
            waits,
            blocking,
        )
    }

    /// Copy rectangle between buffers.
    /// Zero pitches of `rect` mean tightly packed.
    pub fn copy_buffer_rect(
        &self,
        src: &Buffer,
        dst: &Buffer,
        rect: &Rect,
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        profile_scope!("copy_buffer_rect");

        let (src_memory, src_len) = self.buffer_memory(src)?;
        let (dst_memory, dst_len) = self.buffer_memory(dst)?;
        let rect = checked_rect(rect, src_len, dst_len)?;
        if src.key() == dst.key() {
            overlap(&rect)?;
        }

        self.enqueue(
            CommandType::CopyBufferRect,
            Command::Copy {
                src: src_memory,
                dst: dst_memory,
                rect,
            },
            waits,
            false,
        )
    }

    /// Read rectangle of the buffer into host bytes, blocking.
    /// Source side of `rect` addresses the buffer, destination side addresses `dst`.
    pub fn read_buffer_rect(
        &self,
        buffer: &Buffer,
        rect: &Rect,
        dst: &mut [u8],
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        let staging = HostRegion::from_slice(dst);
        let event = self.read_buffer_rect_async(buffer, rect, &staging, waits)?;
        let event = crate::queue::settle(event, true)?;
        dst.copy_from_slice(&staging.read());
        Ok(event)
    }

    /// Read rectangle of the buffer into `dst`.
    /// Source side of `rect` addresses the buffer, destination side addresses `dst`.
    pub fn read_buffer_rect_async(
        &self,
        buffer: &Buffer,
        rect: &Rect,
        dst: &HostRegion,
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        profile_scope!("read_buffer_rect");

        let (memory, len) = self.buffer_memory(buffer)?;
        let rect = checked_rect(rect, len, dst.len())?;

        self.enqueue(
            CommandType::ReadBufferRect,
            Command::Read {
                src: memory,
                dst: dst.clone(),
                rect,
            },
            waits,
            false,
        )
    }

    /// Write rectangle of host bytes into the buffer.
    /// Source side of `rect` addresses `src`, destination side addresses the buffer.
    /// Bytes are captured at admission.
    pub fn write_buffer_rect(
        &self,
        buffer: &Buffer,
        rect: &Rect,
        src: &[u8],
        blocking: bool,
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        profile_scope!("write_buffer_rect");

        let (memory, len) = self.buffer_memory(buffer)?;
        let rect = checked_rect(rect, src.len(), len)?;

        self.enqueue(
            CommandType::WriteBufferRect,
            Command::Write {
                src: HostRegion::from_slice(src),
                dst: memory,
                rect,
            },
            waits,
            blocking,
        )
    }

    /// Repeat `pattern` over `size` bytes from `offset`.
    /// Pattern size must be a power of two up to 128 bytes dividing `offset` and `size`.
    pub fn fill_buffer(
        &self,
        buffer: &Buffer,
        pattern: &[u8],
        offset: usize,
        size: usize,
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        profile_scope!("fill_buffer");

        let (memory, len) = self.buffer_memory(buffer)?;
        check_fill(len, pattern.len(), offset, size)?;

        self.enqueue(
            CommandType::FillBuffer,
            Command::Fill {
                dst: memory,
                pattern: SmallVec::from_slice(pattern),
                offset,
                size,
            },
            waits,
            false,
        )
    }
}
