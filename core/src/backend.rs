//! Driver seam.
//!
//! A backend is a driver that accepts commands and hands back completion tokens.
//! Everything above this module only orders enqueue calls and observes completion.

use {
    crate::{
        error::{BuildError, Error, ErrorKind},
        info::{
            AccessMode, CommandType, DeviceInfo, KernelWorkGroupInfo, MapIntent, MemoryLocation,
            ProfilingInfo, QueueProperties,
        },
        range::NdRange,
        rect::Rect,
        region::HostRegion,
        status::CommandExecutionStatus,
    },
    smallvec::SmallVec,
    std::{fmt::Debug, sync::Arc},
};

/// Out-of-band error reported by the driver for a context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextError {
    /// Decoded status.
    pub kind: ErrorKind,

    /// Driver's description.
    pub message: String,
}

/// Sink for context-scoped driver errors.
pub type ContextNotify = Arc<dyn Fn(ContextError) + Send + Sync>;

/// Hook the driver calls once the event becomes terminal.
pub type TerminalHook = Box<dyn FnOnce(CommandExecutionStatus) + Send>;

/// Driver implementation.
pub trait Backend: Debug + Sized + Send + Sync + 'static {
    /// Enumerated device.
    type PhysicalDevice: RawPhysicalDevice;

    /// Driver context.
    type Context: RawContext<Self>;

    /// Driver queue.
    type Queue: RawQueue<Self>;

    /// Driver memory object.
    type Memory: Debug + Send + Sync + 'static;

    /// Driver completion token.
    type Event: RawEvent;

    /// Built program.
    type Program: RawProgram<Self>;

    /// Kernel of the built program.
    type Kernel: RawKernel<Self>;

    /// Name of the backend.
    fn name() -> &'static str;

    /// Enumerate available devices.
    fn enumerate() -> Result<Vec<Self::PhysicalDevice>, Error>;

    /// Create context over devices.
    /// `notify` receives errors not tied to any command.
    fn create_context(
        devices: Vec<Self::PhysicalDevice>,
        notify: ContextNotify,
    ) -> Result<Self::Context, Error>;
}

/// Enumerated device.
pub trait RawPhysicalDevice: Clone + Debug + Send + Sync + 'static {
    /// Capability record.
    fn info(&self) -> &DeviceInfo;
}

/// Storage request for new memory object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryDesc {
    /// Size in bytes.
    pub size: u64,

    /// Kernel access.
    pub access: AccessMode,

    /// Storage location.
    pub location: MemoryLocation,
}

/// Initial content of new memory object.
#[derive(Debug)]
pub enum MemoryInit<'a> {
    /// Content is unspecified.
    None,

    /// Copy bytes at creation.
    Copy(&'a [u8]),

    /// Use host region as the storage for the lifetime of the object.
    Alias(HostRegion),
}

/// Driver context.
pub trait RawContext<B: Backend>: Debug + Send + Sync + 'static {
    /// Allocate memory object.
    fn create_memory(&self, desc: &MemoryDesc, init: MemoryInit<'_>) -> Result<B::Memory, Error>;

    /// Create queue on the device with specified index within the context.
    fn create_queue(&self, device: usize, properties: QueueProperties) -> Result<B::Queue, Error>;

    /// Create event that host code completes.
    fn create_user_event(&self) -> Result<B::Event, Error>;

    /// Build program for devices with specified indices within the context.
    fn build_program(
        &self,
        devices: &[usize],
        source: &str,
        options: &str,
    ) -> Result<B::Program, BuildError>;
}

/// Host window of a mapping.
/// Mapped bytes start at `offset` within `region`.
#[derive(Clone, Debug)]
pub struct Mapping {
    /// Region the host accesses.
    pub region: HostRegion,

    /// Offset of the first mapped byte.
    pub offset: usize,
}

/// Kernel argument as seen by the driver.
#[derive(Debug)]
pub enum KernelArgValue<B: Backend> {
    /// Memory object.
    Memory(Arc<B::Memory>),

    /// Value passed by copy.
    Bytes(SmallVec<[u8; 16]>),

    /// Local memory of specified size allocated per work group.
    Local(usize),
}

impl<B> Clone for KernelArgValue<B>
where
    B: Backend,
{
    fn clone(&self) -> Self {
        match self {
            KernelArgValue::Memory(memory) => KernelArgValue::Memory(memory.clone()),
            KernelArgValue::Bytes(bytes) => KernelArgValue::Bytes(bytes.clone()),
            KernelArgValue::Local(size) => KernelArgValue::Local(*size),
        }
    }
}

/// Command language of the driver.
/// Memory is kept alive by the command until it finishes executing.
#[derive(Debug)]
pub enum Command<B: Backend> {
    /// Copy between memory objects.
    Copy {
        /// Source object.
        src: Arc<B::Memory>,
        /// Destination object.
        dst: Arc<B::Memory>,
        /// Byte addressing.
        rect: Rect,
    },

    /// Copy from memory object into host region.
    Read {
        /// Source object.
        src: Arc<B::Memory>,
        /// Destination region.
        dst: HostRegion,
        /// Byte addressing.
        rect: Rect,
    },

    /// Copy from host region into memory object.
    Write {
        /// Source region.
        src: HostRegion,
        /// Destination object.
        dst: Arc<B::Memory>,
        /// Byte addressing.
        rect: Rect,
    },

    /// Repeat pattern over a range.
    Fill {
        /// Destination object.
        dst: Arc<B::Memory>,
        /// Pattern bytes.
        pattern: SmallVec<[u8; 16]>,
        /// First byte.
        offset: usize,
        /// Number of bytes, multiple of pattern size.
        size: usize,
    },

    /// Release mapping, making host writes device-visible.
    Unmap {
        /// Mapped object.
        memory: Arc<B::Memory>,
        /// Mapping returned by `RawQueue::map`.
        mapping: Mapping,
        /// First mapped byte of the object.
        offset: usize,
        /// Number of mapped bytes.
        size: usize,
        /// Access the mapping was created for.
        intent: MapIntent,
    },

    /// Run kernel over index space.
    Dispatch {
        /// Kernel to run.
        kernel: Arc<B::Kernel>,
        /// Arguments in positional order.
        args: Vec<KernelArgValue<B>>,
        /// Index space with resolved local size.
        range: NdRange,
    },

    /// Completes after its wait list.
    /// Empty wait list means everything previously enqueued.
    Marker,

    /// Like marker, and orders every later command after it.
    Barrier,
}

/// Driver queue.
pub trait RawQueue<B: Backend>: Debug + Send + Sync + 'static {
    /// Admit command.
    /// It will not start before every event in `waits` completes.
    fn submit(
        &self,
        command_type: CommandType,
        command: Command<B>,
        waits: &[B::Event],
    ) -> Result<B::Event, Error>;

    /// Admit mapping of `size` bytes from `offset`.
    /// Mapping content is valid for the intent once returned event completes.
    fn map(
        &self,
        command_type: CommandType,
        memory: &Arc<B::Memory>,
        offset: usize,
        size: usize,
        intent: MapIntent,
        waits: &[B::Event],
    ) -> Result<(B::Event, Mapping), Error>;

    /// Push admitted commands toward the device.
    fn flush(&self) -> Result<(), Error>;

    /// Block until every admitted command is terminal.
    fn finish(&self) -> Result<(), Error>;
}

/// Driver completion token.
/// Clones refer to the same token.
pub trait RawEvent: Clone + Debug + Send + Sync + 'static {
    /// Type of the command.
    fn command_type(&self) -> CommandType;

    /// Current status.
    fn status(&self) -> CommandExecutionStatus;

    /// Block until terminal.
    fn wait(&self) -> CommandExecutionStatus;

    /// Device timestamps.
    fn profiling(&self) -> Result<ProfilingInfo, Error>;

    /// Register hook called once with the terminal status.
    /// Called immediately if the event is already terminal.
    fn on_terminal(&self, hook: TerminalHook);

    /// Set terminal status of the user event.
    fn set_user_status(&self, status: CommandExecutionStatus) -> Result<(), Error>;
}

/// Built program.
pub trait RawProgram<B: Backend>: Debug + Send + Sync + 'static {
    /// Names of kernels in the program.
    fn kernel_names(&self) -> Vec<String>;

    /// Build log for the device with specified index within the context.
    fn build_log(&self, device: usize) -> String;

    /// Create kernel object.
    fn create_kernel(&self, name: &str) -> Result<B::Kernel, Error>;
}

/// Kernel object.
pub trait RawKernel<B: Backend>: Debug + Send + Sync + 'static {
    /// Kernel function name.
    fn name(&self) -> &str;

    /// Number of arguments.
    fn num_args(&self) -> usize;

    /// Properties of the kernel on the device.
    /// Local memory of arguments is not included.
    fn work_group_info(&self, device: &B::PhysicalDevice) -> KernelWorkGroupInfo;
}
