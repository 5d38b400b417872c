//! Image formats and layouts.

use {
    crate::memory::MemoryKey,
    kiln_core::{ContextId, DeviceInfo, Error, ErrorKind, Rect},
};

/// Channels stored in each image element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum ChannelOrder {
    R,
    A,
    Rg,
    Ra,
    Rgb,
    Rgba,
    Bgra,
    Argb,
    Intensity,
    Luminance,
}

impl ChannelOrder {
    /// Number of channels.
    pub fn channels(&self) -> usize {
        match self {
            ChannelOrder::R | ChannelOrder::A | ChannelOrder::Intensity | ChannelOrder::Luminance => 1,
            ChannelOrder::Rg | ChannelOrder::Ra => 2,
            ChannelOrder::Rgb => 3,
            ChannelOrder::Rgba | ChannelOrder::Bgra | ChannelOrder::Argb => 4,
        }
    }
}

/// Representation of each channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum ChannelType {
    SnormInt8,
    SnormInt16,
    UnormInt8,
    UnormInt16,
    UnormShort565,
    UnormShort555,
    UnormInt101010,
    SignedInt8,
    SignedInt16,
    SignedInt32,
    UnsignedInt8,
    UnsignedInt16,
    UnsignedInt32,
    HalfFloat,
    Float,
}

impl ChannelType {
    /// Check if whole element is packed into one value.
    pub fn is_packed(&self) -> bool {
        match self {
            ChannelType::UnormShort565
            | ChannelType::UnormShort555
            | ChannelType::UnormInt101010 => true,
            _ => false,
        }
    }

    /// Size of a channel in bytes, or of the whole element for packed types.
    pub fn size(&self) -> usize {
        match self {
            ChannelType::SnormInt8
            | ChannelType::UnormInt8
            | ChannelType::SignedInt8
            | ChannelType::UnsignedInt8 => 1,
            ChannelType::SnormInt16
            | ChannelType::UnormInt16
            | ChannelType::SignedInt16
            | ChannelType::UnsignedInt16
            | ChannelType::HalfFloat
            | ChannelType::UnormShort565
            | ChannelType::UnormShort555 => 2,
            ChannelType::SignedInt32
            | ChannelType::UnsignedInt32
            | ChannelType::Float
            | ChannelType::UnormInt101010 => 4,
        }
    }

    fn is_normalized_or_float(&self) -> bool {
        match self {
            ChannelType::UnormInt8
            | ChannelType::UnormInt16
            | ChannelType::SnormInt8
            | ChannelType::SnormInt16
            | ChannelType::HalfFloat
            | ChannelType::Float => true,
            _ => false,
        }
    }
}

/// Image element format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageFormat {
    /// Channels.
    pub order: ChannelOrder,

    /// Channel representation.
    pub channel_type: ChannelType,
}

impl ImageFormat {
    /// Create format.
    pub fn new(order: ChannelOrder, channel_type: ChannelType) -> Self {
        ImageFormat {
            order,
            channel_type,
        }
    }

    /// Size of an element in bytes.
    /// Fails for combinations devices can't represent.
    pub fn element_size(&self) -> Result<usize, Error> {
        let supported = match self.order {
            ChannelOrder::Rgb => self.channel_type.is_packed(),
            _ if self.channel_type.is_packed() => false,
            ChannelOrder::Intensity | ChannelOrder::Luminance => {
                self.channel_type.is_normalized_or_float()
            }
            ChannelOrder::Bgra | ChannelOrder::Argb => self.channel_type.size() == 1,
            _ => true,
        };

        if !supported {
            return Err(Error::new(
                ErrorKind::ImageFormatNotSupported,
                format!("{:?}", self),
            ));
        }

        if self.channel_type.is_packed() {
            Ok(self.channel_type.size())
        } else {
            Ok(self.channel_type.size() * self.order.channels())
        }
    }
}

/// Dimensionality of the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub enum ImageKind {
    /// Row of elements.
    D1,

    /// Plane of elements.
    D2,

    /// Volume of elements.
    D3,
}

/// Image extent and host layout.
///
/// Pitches describe layout of the host region the image is created with.
/// Zero pitches mean tightly packed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageDesc {
    /// Dimensionality.
    pub kind: ImageKind,

    /// Width in elements.
    pub width: usize,

    /// Height in elements, 1 for 1-D images.
    pub height: usize,

    /// Depth in elements, 1 for 1-D and 2-D images.
    pub depth: usize,

    /// Bytes between rows.
    pub row_pitch: usize,

    /// Bytes between slices of 3-D images.
    pub slice_pitch: usize,
}

impl ImageDesc {
    /// 1-D image.
    pub fn d1(width: usize) -> Self {
        ImageDesc {
            kind: ImageKind::D1,
            width,
            height: 1,
            depth: 1,
            row_pitch: 0,
            slice_pitch: 0,
        }
    }

    /// 2-D image.
    pub fn d2(width: usize, height: usize) -> Self {
        ImageDesc {
            kind: ImageKind::D2,
            height,
            ..ImageDesc::d1(width)
        }
    }

    /// 3-D image.
    pub fn d3(width: usize, height: usize, depth: usize) -> Self {
        ImageDesc {
            kind: ImageKind::D3,
            depth,
            ..ImageDesc::d2(width, height)
        }
    }

    /// Set host pitches.
    pub fn with_pitches(mut self, row_pitch: usize, slice_pitch: usize) -> Self {
        self.row_pitch = row_pitch;
        self.slice_pitch = slice_pitch;
        self
    }

    /// Extent in elements.
    pub fn extent(&self) -> [usize; 3] {
        [self.width, self.height, self.depth]
    }

    /// Resolve byte layout of the image storage.
    /// Pitches are allowed only for images created over a host region.
    pub fn layout(
        &self,
        format: ImageFormat,
        device: &DeviceInfo,
        host_region: bool,
    ) -> Result<ImageLayout, Error> {
        if !device.image_support {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                format!("Device {} doesn't support images", device.name),
            ));
        }

        let element_size = format.element_size()?;

        let invalid = |message: String| Err(Error::new(ErrorKind::InvalidImageSize, message));

        if self.extent().iter().any(|&extent| extent == 0) {
            return invalid(format!("Image extent {:?} is empty", self.extent()));
        }

        let fits = match self.kind {
            ImageKind::D1 => {
                self.height == 1 && self.depth == 1 && self.width <= device.image2d_max_size[0]
            }
            ImageKind::D2 => {
                self.depth == 1
                    && self.width <= device.image2d_max_size[0]
                    && self.height <= device.image2d_max_size[1]
            }
            ImageKind::D3 => {
                self.width <= device.image3d_max_size[0]
                    && self.height <= device.image3d_max_size[1]
                    && self.depth <= device.image3d_max_size[2]
            }
        };
        if !fits {
            return invalid(format!(
                "{:?} image of extent {:?} exceeds device limits",
                self.kind,
                self.extent()
            ));
        }

        if !host_region && (self.row_pitch != 0 || self.slice_pitch != 0) {
            return invalid("Pitches require a host region".into());
        }

        let tight_row = self.width * element_size;
        let row_pitch = match self.row_pitch {
            0 => tight_row,
            pitch if pitch < tight_row || pitch % element_size != 0 => {
                return invalid(format!("Row pitch {} is invalid", pitch));
            }
            pitch => pitch,
        };

        let tight_slice = row_pitch * self.height;
        let slice_pitch = match (self.kind, self.slice_pitch) {
            (_, 0) => tight_slice,
            (ImageKind::D3, pitch) if pitch >= tight_slice && pitch % row_pitch == 0 => pitch,
            (_, pitch) => {
                return invalid(format!("Slice pitch {} is invalid", pitch));
            }
        };

        let size = match self.kind {
            ImageKind::D1 => row_pitch,
            ImageKind::D2 => row_pitch * self.height,
            ImageKind::D3 => slice_pitch * self.depth,
        };

        Ok(ImageLayout {
            kind: self.kind,
            extent: self.extent(),
            element_size,
            row_pitch,
            slice_pitch,
            size,
        })
    }
}

/// Resolved byte layout of the image storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageLayout {
    /// Dimensionality.
    pub kind: ImageKind,

    /// Extent in elements.
    pub extent: [usize; 3],

    /// Bytes per element.
    pub element_size: usize,

    /// Bytes between rows.
    pub row_pitch: usize,

    /// Bytes between slices.
    pub slice_pitch: usize,

    /// Storage size in bytes.
    pub size: usize,
}

/// One side of an image transfer in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageSide {
    /// Origin in bytes, rows and slices.
    pub origin: [usize; 3],

    /// Bytes between rows.
    pub row_pitch: usize,

    /// Bytes between slices.
    pub slice_pitch: usize,

    /// Width in bytes, height in rows and depth in slices.
    pub region: [usize; 3],
}

impl ImageLayout {
    /// Convert element origin and region into byte addressing.
    pub fn side(&self, origin: [usize; 3], region: [usize; 3]) -> Result<ImageSide, Error> {
        let invalid = |message: String| Err(Error::new(ErrorKind::InvalidValue, message));

        if region.iter().any(|&extent| extent == 0) {
            return invalid(format!("Image region {:?} is empty", region));
        }

        let unused = match self.kind {
            ImageKind::D1 => 1,
            ImageKind::D2 => 2,
            ImageKind::D3 => 3,
        };
        for dim in unused..3 {
            if origin[dim] != 0 || region[dim] != 1 {
                return invalid(format!(
                    "{:?} image can't be addressed in dimension {}",
                    self.kind, dim
                ));
            }
        }

        for dim in 0..3 {
            match origin[dim].checked_add(region[dim]) {
                Some(end) if end <= self.extent[dim] => {}
                _ => {
                    return invalid(format!(
                        "Region {:?} at {:?} exceeds image extent {:?}",
                        region, origin, self.extent
                    ));
                }
            }
        }

        Ok(ImageSide {
            origin: [origin[0] * self.element_size, origin[1], origin[2]],
            row_pitch: self.row_pitch,
            slice_pitch: self.slice_pitch,
            region: [region[0] * self.element_size, region[1], region[2]],
        })
    }
}

impl ImageSide {
    /// Transfer from this side into another.
    pub fn to(&self, dst: &ImageSide) -> Rect {
        Rect {
            src_origin: self.origin,
            src_row_pitch: self.row_pitch,
            src_slice_pitch: self.slice_pitch,
            dst_origin: dst.origin,
            dst_row_pitch: dst.row_pitch,
            dst_slice_pitch: dst.slice_pitch,
            region: self.region,
        }
    }

    /// Tightly packed side of the same region at byte `offset`.
    /// Zero pitches are resolved to tight ones.
    pub fn packed(&self, offset: usize, row_pitch: usize, slice_pitch: usize) -> ImageSide {
        let row_pitch = if row_pitch == 0 { self.region[0] } else { row_pitch };
        let slice_pitch = if slice_pitch == 0 {
            row_pitch * self.region[1]
        } else {
            slice_pitch
        };
        ImageSide {
            origin: [offset, 0, 0],
            row_pitch,
            slice_pitch,
            region: self.region,
        }
    }
}

/// Image handle.
/// Valid until released through its context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Image {
    key: MemoryKey,
    context: ContextId,
}

kiln_core::context_owned!(Image @ |image: &Image| image.context);

impl Image {
    /// Wrap table key.
    pub fn new(key: MemoryKey, context: ContextId) -> Self {
        Image { key, context }
    }

    /// Table key.
    pub fn key(&self) -> MemoryKey {
        self.key
    }
}
