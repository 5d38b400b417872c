//! Kiln's top level crate.
//! Reexports all others.
//!
//! A `Platform` enumerates devices of a backend.
//! A `Context` over some of them owns memory objects, queues and programs.
//! A `CommandQueue` admits commands, each producing an `Event`
//! that later commands can wait on.
//!
//! `Kiln::init` covers the common case of one context over every device of a backend
//! with a queue on the first one.

#![warn(
    missing_debug_implementations,
    missing_copy_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

mod init;

pub use crate::init::Kiln;

#[doc(inline)]
pub use kiln_core as core;

#[doc(inline)]
pub use kiln_memory as memory;

#[doc(inline)]
pub use kiln_command as command;

#[doc(inline)]
pub use kiln_factory as factory;

#[cfg(feature = "host")]
#[doc(inline)]
pub use kiln_host as host;

pub use {
    kiln_command::{wait_for_events, Event, UserEvent},
    kiln_core::{
        AccessMode, CommandExecutionStatus, CommandType, DeviceInfo, Error, ErrorKind,
        HostRegion, MapIntent, MemoryLocation, NdRange, ProfilingInfo, QueueProperties, Rect,
    },
    kiln_factory::{CommandQueue, Config, Context, Device, Kernel, KernelArg, Platform, Program},
    kiln_memory::{
        Buffer, ChannelOrder, ChannelType, Image, ImageDesc, ImageFormat, MappedView,
        StorageClass,
    },
};

#[cfg(feature = "host")]
pub use kiln_host::Host;
