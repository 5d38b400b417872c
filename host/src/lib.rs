//! Software backend for kiln.
//!
//! Devices are plain host memory. Each queue runs its commands on worker threads,
//! one for in-order queues and a pool for out-of-order ones.
//! Kernels are host functions registered with `register_kernel`
//! and programs list the kernels they contain by name.

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
mod device;
mod event;
mod exec;
mod kernel;
mod memory;
mod queue;

pub use crate::{
    config::{default_device, HostConfig},
    context::HostContext,
    device::HostPhysicalDevice,
    event::HostEvent,
    kernel::{register_kernel, BuildOptions, HostKernel, HostProgram, KernelArgs, KernelFn, WorkItem},
    memory::HostMemory,
    queue::HostQueue,
};

use kiln_core::{Backend, ContextNotify, Error, ErrorKind};

/// Host backend.
#[derive(Clone, Copy, Debug)]
pub enum Host {}

impl Backend for Host {
    type PhysicalDevice = HostPhysicalDevice;
    type Context = HostContext;
    type Queue = HostQueue;
    type Memory = HostMemory;
    type Event = HostEvent;
    type Program = HostProgram;
    type Kernel = HostKernel;

    fn name() -> &'static str {
        "host"
    }

    fn enumerate() -> Result<Vec<HostPhysicalDevice>, Error> {
        let config = HostConfig::current();
        if config.devices.is_empty() {
            return Err(Error::new(
                ErrorKind::DeviceNotFound,
                "Host backend is configured without devices",
            ));
        }
        log::debug!("Host backend enumerated {} devices", config.devices.len());
        Ok(config
            .devices
            .into_iter()
            .map(HostPhysicalDevice::new)
            .collect())
    }

    fn create_context(
        devices: Vec<HostPhysicalDevice>,
        notify: ContextNotify,
    ) -> Result<HostContext, Error> {
        HostContext::new(devices, notify)
    }
}
