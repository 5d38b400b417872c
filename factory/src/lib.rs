//! Higher-level kiln interface.
//!
//! `Platform` enumerates devices of a backend, `Context` allocates memory objects
//! and queues over them and `CommandQueue` admits commands.

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

mod config;
mod context;
mod dispatch;
mod image;
mod map;
mod platform;
mod program;
mod queue;
mod transfer;

pub use crate::{
    config::Config,
    context::{Context, MemoryHandle},
    platform::{Device, Platform},
    program::{Kernel, KernelArg, Program},
    queue::{CommandQueue, QueueKey},
};
