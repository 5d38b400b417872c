//! Image transfers.
//!
//! Origins and regions are in elements, host pitches in bytes.
//! Zero host pitches mean tightly packed rows and slices.

use {
    crate::{
        queue::{settle, CommandQueue},
        transfer::checked_rect,
    },
    kiln_command::Event,
    kiln_core::{Backend, Command, CommandType, Error, ErrorKind, HostRegion},
    kiln_memory::{Buffer, Image},
    thread_profiler::profile_scope,
};

impl<B> CommandQueue<B>
where
    B: Backend,
{
    /// Read image region into host bytes, blocking.
    pub fn read_image(
        &self,
        image: &Image,
        origin: [usize; 3],
        region: [usize; 3],
        row_pitch: usize,
        slice_pitch: usize,
        dst: &mut [u8],
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        let staging = HostRegion::from_slice(dst);
        let event =
            self.read_image_async(image, origin, region, row_pitch, slice_pitch, &staging, waits)?;
        let event = settle(event, true)?;
        dst.copy_from_slice(&staging.read());
        Ok(event)
    }

    /// Read image region into `dst`.
    pub fn read_image_async(
        &self,
        image: &Image,
        origin: [usize; 3],
        region: [usize; 3],
        row_pitch: usize,
        slice_pitch: usize,
        dst: &HostRegion,
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        profile_scope!("read_image");

        let (memory, _, layout) = self.image_memory(image)?;
        let side = layout.side(origin, region)?;
        let rect = checked_rect(
            &side.to(&side.packed(0, row_pitch, slice_pitch)),
            layout.size,
            dst.len(),
        )?;

        self.enqueue(
            CommandType::ReadImage,
            Command::Read {
                src: memory,
                dst: dst.clone(),
                rect,
            },
            waits,
            false,
        )
    }

    /// Write host bytes into image region.
    /// Bytes are captured at admission.
    pub fn write_image(
        &self,
        image: &Image,
        origin: [usize; 3],
        region: [usize; 3],
        row_pitch: usize,
        slice_pitch: usize,
        src: &[u8],
        blocking: bool,
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        profile_scope!("write_image");

        let (memory, _, layout) = self.image_memory(image)?;
        let side = layout.side(origin, region)?;
        let rect = checked_rect(
            &side.packed(0, row_pitch, slice_pitch).to(&side),
            src.len(),
            layout.size,
        )?;

        self.enqueue(
            CommandType::WriteImage,
            Command::Write {
                src: HostRegion::from_slice(src),
                dst: memory,
                rect,
            },
            waits,
            blocking,
        )
    }

    /// Copy region between images of the same format.
    pub fn copy_image(
        &self,
        src: &Image,
        dst: &Image,
        src_origin: [usize; 3],
        dst_origin: [usize; 3],
        region: [usize; 3],
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        profile_scope!("copy_image");

        let (src_memory, src_format, src_layout) = self.image_memory(src)?;
        let (dst_memory, dst_format, dst_layout) = self.image_memory(dst)?;
        if src_format != dst_format {
            return Err(Error::new(
                ErrorKind::ImageFormatMismatch,
                format!("Copy from {:?} into {:?}", src_format, dst_format),
            ));
        }

        let src_side = src_layout.side(src_origin, region)?;
        let dst_side = dst_layout.side(dst_origin, region)?;
        let rect = checked_rect(&src_side.to(&dst_side), src_layout.size, dst_layout.size)?;

        if src.key() == dst.key() {
            let disjoint = (0..3).any(|dim| {
                src_origin[dim] + region[dim] <= dst_origin[dim]
                    || dst_origin[dim] + region[dim] <= src_origin[dim]
            });
            if !disjoint {
                return Err(Error::new(
                    ErrorKind::MemCopyOverlap,
                    format!(
                        "Regions {:?} at {:?} and {:?} overlap",
                        region, src_origin, dst_origin
                    ),
                ));
            }
        }

        self.enqueue(
            CommandType::CopyImage,
            Command::Copy {
                src: src_memory,
                dst: dst_memory,
                rect,
            },
            waits,
            false,
        )
    }

    /// Copy image region into the buffer, tightly packed from `dst_offset`.
    pub fn copy_image_to_buffer(
        &self,
        src: &Image,
        dst: &Buffer,
        src_origin: [usize; 3],
        region: [usize; 3],
        dst_offset: usize,
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        profile_scope!("copy_image_to_buffer");

        let (src_memory, _, layout) = self.image_memory(src)?;
        let (dst_memory, dst_len) = self.buffer_memory(dst)?;
        let side = layout.side(src_origin, region)?;
        let rect = checked_rect(&side.to(&side.packed(dst_offset, 0, 0)), layout.size, dst_len)?;

        self.enqueue(
            CommandType::CopyImageToBuffer,
            Command::Copy {
                src: src_memory,
                dst: dst_memory,
                rect,
            },
            waits,
            false,
        )
    }

    /// Copy tightly packed bytes of the buffer from `src_offset` into image region.
    pub fn copy_buffer_to_image(
        &self,
        src: &Buffer,
        dst: &Image,
        src_offset: usize,
        dst_origin: [usize; 3],
        region: [usize; 3],
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        profile_scope!("copy_buffer_to_image");

        let (src_memory, src_len) = self.buffer_memory(src)?;
        let (dst_memory, _, layout) = self.image_memory(dst)?;
        let side = layout.side(dst_origin, region)?;
        let rect = checked_rect(&side.packed(src_offset, 0, 0).to(&side), src_len, layout.size)?;

        self.enqueue(
            CommandType::CopyBufferToImage,
            Command::Copy {
                src: src_memory,
                dst: dst_memory,
                rect,
            },
            waits,
            false,
        )
    }
}
