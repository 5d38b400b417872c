//! Byte addressing of rectangular transfers.

use {
    crate::error::{Error, ErrorKind},
    std::ops::Range,
};

/// Rectangular transfer between two byte spaces.
///
/// Byte `(x, y, z)` of the region lives at
/// `(origin.z + z) * slice_pitch + (origin.y + y) * row_pitch + origin.x + x`
/// on each side. All values are in bytes.
/// Zero pitches mean "tightly packed" and are resolved by `normalized`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Origin in the source.
    pub src_origin: [usize; 3],

    /// Distance between source rows.
    pub src_row_pitch: usize,

    /// Distance between source slices.
    pub src_slice_pitch: usize,

    /// Origin in the destination.
    pub dst_origin: [usize; 3],

    /// Distance between destination rows.
    pub dst_row_pitch: usize,

    /// Distance between destination slices.
    pub dst_slice_pitch: usize,

    /// Width in bytes, height in rows and depth in slices.
    pub region: [usize; 3],
}

fn locate(origin: [usize; 3], row: usize, slice: usize, at: [usize; 3]) -> Option<usize> {
    (origin[2].checked_add(at[2])?)
        .checked_mul(slice)?
        .checked_add((origin[1].checked_add(at[1])?).checked_mul(row)?)?
        .checked_add(origin[0].checked_add(at[0])?)
}

impl Rect {
    /// Contiguous transfer of `size` bytes.
    pub fn linear(src_offset: usize, dst_offset: usize, size: usize) -> Self {
        Rect {
            src_origin: [src_offset, 0, 0],
            src_row_pitch: size,
            src_slice_pitch: size,
            dst_origin: [dst_offset, 0, 0],
            dst_row_pitch: size,
            dst_slice_pitch: size,
            region: [size, 1, 1],
        }
    }

    /// Transfer of a 2-D region with `region = (width, height, 1)`.
    pub fn planar(
        src_origin: [usize; 2],
        src_row_pitch: usize,
        dst_origin: [usize; 2],
        dst_row_pitch: usize,
        width: usize,
        height: usize,
    ) -> Self {
        Rect {
            src_origin: [src_origin[0], src_origin[1], 0],
            src_row_pitch,
            src_slice_pitch: 0,
            dst_origin: [dst_origin[0], dst_origin[1], 0],
            dst_row_pitch,
            dst_slice_pitch: 0,
            region: [width, height, 1],
        }
        .normalized()
    }

    /// Resolve zero pitches into tightly packed ones.
    pub fn normalized(mut self) -> Self {
        if self.src_row_pitch == 0 {
            self.src_row_pitch = self.region[0];
        }
        if self.src_slice_pitch == 0 {
            self.src_slice_pitch = self.src_row_pitch.saturating_mul(self.region[1]);
        }
        if self.dst_row_pitch == 0 {
            self.dst_row_pitch = self.region[0];
        }
        if self.dst_slice_pitch == 0 {
            self.dst_slice_pitch = self.dst_row_pitch.saturating_mul(self.region[1]);
        }
        self
    }

    /// Check if the rect transfers no bytes.
    pub fn is_empty(&self) -> bool {
        self.region.iter().any(|&extent| extent == 0)
    }

    /// Number of bytes transferred.
    pub fn bytes(&self) -> Result<usize, Error> {
        self.region[0]
            .checked_mul(self.region[1])
            .and_then(|plane| plane.checked_mul(self.region[2]))
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidValue,
                    format!("Region {:?} is larger than the address space", self.region),
                )
            })
    }

    /// Check that pitches can hold the region.
    /// Expects normalized rect.
    pub fn validate(&self) -> Result<(), Error> {
        if self.is_empty() {
            return Ok(());
        }
        self.bytes()?;

        let check = |row: usize, slice: usize, side: &str| {
            if row < self.region[0] {
                return Err(Error::new(
                    ErrorKind::InvalidValue,
                    format!("{} row pitch {} is less than region width {}", side, row, self.region[0]),
                ));
            }
            if self.region[2] > 1 && slice < row.saturating_mul(self.region[1]) {
                return Err(Error::new(
                    ErrorKind::InvalidValue,
                    format!("{} slice pitch {} can't hold {} rows", side, slice, self.region[1]),
                ));
            }
            Ok(())
        };

        check(self.src_row_pitch, self.src_slice_pitch, "Source")?;
        check(self.dst_row_pitch, self.dst_slice_pitch, "Destination")?;
        Ok(())
    }

    /// Offset of region byte `at` in the source.
    pub fn src_offset(&self, at: [usize; 3]) -> Option<usize> {
        locate(self.src_origin, self.src_row_pitch, self.src_slice_pitch, at)
    }

    /// Offset of region byte `at` in the destination.
    pub fn dst_offset(&self, at: [usize; 3]) -> Option<usize> {
        locate(self.dst_origin, self.dst_row_pitch, self.dst_slice_pitch, at)
    }

    fn last(&self) -> [usize; 3] {
        [self.region[0] - 1, self.region[1] - 1, self.region[2] - 1]
    }

    /// Range of source bytes from the first to the last one addressed.
    /// `None` if addressing overflows.
    pub fn src_span(&self) -> Option<Range<usize>> {
        let start = self.src_offset([0; 3])?;
        if self.is_empty() {
            return Some(start..start);
        }
        Some(start..self.src_offset(self.last())?.checked_add(1)?)
    }

    /// Range of destination bytes from the first to the last one addressed.
    /// `None` if addressing overflows.
    pub fn dst_span(&self) -> Option<Range<usize>> {
        let start = self.dst_offset([0; 3])?;
        if self.is_empty() {
            return Some(start..start);
        }
        Some(start..self.dst_offset(self.last())?.checked_add(1)?)
    }

    /// Check that both sides stay within their objects.
    pub fn check_bounds(&self, src_len: usize, dst_len: usize) -> Result<(), Error> {
        self.validate()?;
        if self.is_empty() {
            return Ok(());
        }

        match self.src_span() {
            Some(span) if span.end <= src_len => {}
            _ => {
                return Err(Error::new(
                    ErrorKind::InvalidValue,
                    format!("Region addresses source bytes beyond {}", src_len),
                ))
            }
        }

        match self.dst_span() {
            Some(span) if span.end <= dst_len => {}
            _ => {
                return Err(Error::new(
                    ErrorKind::InvalidValue,
                    format!("Region addresses destination bytes beyond {}", dst_len),
                ))
            }
        }

        Ok(())
    }

    /// Iterate over rows of the region.
    /// Yields source and destination offsets of each row start.
    /// Row length is `region[0]`.
    /// Expects rect that passed `check_bounds`.
    pub fn rows(&self) -> impl Iterator<Item = (usize, usize)> {
        let rect = *self;
        let (width, height, depth) = (rect.region[0], rect.region[1], rect.region[2]);
        let rows = if width == 0 { 0 } else { height * depth };
        (0..rows).map(move |index| {
            let at = [0, index % height, index / height];
            (
                locate(rect.src_origin, rect.src_row_pitch, rect.src_slice_pitch, at).unwrap_or(0),
                locate(rect.dst_origin, rect.dst_row_pitch, rect.dst_slice_pitch, at).unwrap_or(0),
            )
        })
    }

    /// Check if source and destination bytes intersect
    /// when both sides address the same object.
    /// Expects rect that passed `check_bounds`.
    pub fn overlaps(&self) -> bool {
        if self.is_empty() {
            return false;
        }

        match (self.src_span(), self.dst_span()) {
            (Some(src), Some(dst)) if src.end <= dst.start || dst.end <= src.start => return false,
            _ => {}
        }

        let width = self.region[0];
        let dst_rows: Vec<usize> = self.rows().map(|(_, dst)| dst).collect();

        // Destination rows are sorted and disjoint since pitches hold the region.
        self.rows().any(|(src, _)| {
            let end = src + width;
            let after = dst_rows.partition_point(|&start| start < end);
            after > 0 && dst_rows[after - 1] + width > src
        })
    }
}
