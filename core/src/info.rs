//! Plain enumerations and capability records shared by the driver seam and the wrappers.

/// Identifies the operation that produced an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum CommandType {
    NdRangeKernel,
    ReadBuffer,
    WriteBuffer,
    CopyBuffer,
    ReadImage,
    WriteImage,
    CopyImage,
    CopyImageToBuffer,
    CopyBufferToImage,
    MapBuffer,
    MapImage,
    UnmapMemObject,
    Marker,
    ReadBufferRect,
    WriteBufferRect,
    CopyBufferRect,
    User,
    Barrier,
    FillBuffer,
}

impl CommandType {
    /// Driver code of the command type.
    pub fn code(&self) -> u32 {
        match *self {
            CommandType::NdRangeKernel => 0x11F0,
            CommandType::ReadBuffer => 0x11F3,
            CommandType::WriteBuffer => 0x11F4,
            CommandType::CopyBuffer => 0x11F5,
            CommandType::ReadImage => 0x11F6,
            CommandType::WriteImage => 0x11F7,
            CommandType::CopyImage => 0x11F8,
            CommandType::CopyImageToBuffer => 0x11F9,
            CommandType::CopyBufferToImage => 0x11FA,
            CommandType::MapBuffer => 0x11FB,
            CommandType::MapImage => 0x11FC,
            CommandType::UnmapMemObject => 0x11FD,
            CommandType::Marker => 0x11FE,
            CommandType::ReadBufferRect => 0x1201,
            CommandType::WriteBufferRect => 0x1202,
            CommandType::CopyBufferRect => 0x1203,
            CommandType::User => 0x1204,
            CommandType::Barrier => 0x1205,
            CommandType::FillBuffer => 0x1207,
        }
    }
}

/// How kernels may access a memory object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessMode {
    /// Kernels may read and write.
    ReadWrite,

    /// Kernels may only read.
    ReadOnly,

    /// Kernels may only write.
    WriteOnly,
}

impl Default for AccessMode {
    fn default() -> Self {
        AccessMode::ReadWrite
    }
}

impl AccessMode {
    /// Check if device may read the object.
    pub fn device_readable(&self) -> bool {
        *self != AccessMode::WriteOnly
    }

    /// Check if device may write the object.
    pub fn device_writable(&self) -> bool {
        *self != AccessMode::ReadOnly
    }
}

/// What host code is going to do with a mapped view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub enum MapIntent {
    /// Host reads the view.
    Read,

    /// Host writes the view. Writes become device-visible on unmap.
    Write,
}

/// Where the storage of a memory object lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub enum MemoryLocation {
    /// Storage is owned by the device.
    Device,

    /// Storage is host memory accessible by the device.
    Host,
}

bitflags::bitflags! {
    /// Command queue properties.
    #[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
    pub struct QueueProperties: u32 {
        /// Commands may execute in any order allowed by their wait lists.
        const OUT_OF_ORDER_EXEC_MODE = 0x1;

        /// Events produced on the queue carry timestamps.
        const PROFILING_ENABLE = 0x2;
    }
}

impl Default for QueueProperties {
    fn default() -> Self {
        QueueProperties::empty()
    }
}

/// Kind of the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum DeviceType {
    Cpu,
    Gpu,
    Accelerator,
    Custom,
}

/// Capability record of the device.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceInfo {
    /// Device name.
    pub name: String,

    /// Vendor name.
    pub vendor: String,

    /// Device kind.
    pub device_type: DeviceType,

    /// Number of parallel compute units.
    pub compute_units: u32,

    /// Maximum size of single memory object in bytes.
    pub max_mem_alloc_size: u64,

    /// Size of global memory in bytes.
    pub global_mem_size: u64,

    /// Size of local memory per work group in bytes.
    pub local_mem_size: u64,

    /// Maximum number of work items in a work group.
    pub max_work_group_size: usize,

    /// Maximum number of work items per dimension of a work group.
    pub max_work_item_sizes: [usize; 3],

    /// Preferred multiple of work group size.
    pub preferred_work_group_size_multiple: usize,

    /// Device supports images.
    pub image_support: bool,

    /// Maximum width and height of 1-D and 2-D images.
    pub image2d_max_size: [usize; 2],

    /// Maximum width, height and depth of 3-D images.
    pub image3d_max_size: [usize; 3],

    /// Resolution of the profiling timer in nanoseconds.
    pub profiling_timer_resolution: u64,
}

/// Device timestamps of the command in nanoseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ProfilingInfo {
    /// Command was admitted to the queue.
    pub queued: u64,

    /// Command was submitted to the device.
    pub submitted: u64,

    /// Command started execution.
    pub start: u64,

    /// Command finished execution.
    pub end: u64,
}

/// Per-device properties of a kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct KernelWorkGroupInfo {
    /// Maximum work group size the kernel can be executed with.
    pub work_group_size: usize,

    /// Preferred multiple of work group size.
    pub preferred_work_group_size_multiple: usize,

    /// Local memory used by the kernel, including local arguments.
    pub local_mem_size: u64,

    /// Private memory used by each work item.
    pub private_mem_size: u64,

    /// Work group size required by the kernel, or zeros.
    pub compile_work_group_size: [usize; 3],
}
