use {
    crate::{
        device::HostPhysicalDevice, event::HostEvent, kernel::HostProgram, memory::HostMemory,
        queue::HostQueue, Host,
    },
    kiln_core::{
        BuildError, ContextNotify, Error, ErrorKind, MemoryDesc, MemoryInit, QueueProperties,
        RawContext, RawPhysicalDevice,
    },
    std::fmt,
};

/// Context of the host backend.
pub struct HostContext {
    devices: Vec<HostPhysicalDevice>,
    notify: ContextNotify,
}

impl fmt::Debug for HostContext {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("HostContext")
            .field("devices", &self.devices)
            .finish()
    }
}

impl HostContext {
    pub(crate) fn new(
        devices: Vec<HostPhysicalDevice>,
        notify: ContextNotify,
    ) -> Result<Self, Error> {
        if devices.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidValue,
                "Context requires at least one device",
            ));
        }
        Ok(HostContext { devices, notify })
    }

    fn device(&self, index: usize) -> Result<&HostPhysicalDevice, Error> {
        self.devices.get(index).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidDevice,
                format!("Context has {} devices, {} requested", self.devices.len(), index),
            )
        })
    }
}

impl RawContext<Host> for HostContext {
    fn create_memory(&self, desc: &MemoryDesc, init: MemoryInit<'_>) -> Result<HostMemory, Error> {
        let total = self
            .devices
            .iter()
            .map(|device| device.info().global_mem_size)
            .min()
            .unwrap_or(0);
        if desc.size > total {
            return Err(Error::new(
                ErrorKind::MemObjectAllocationFailure,
                format!("{} bytes exceed global memory of {}", desc.size, total),
            ));
        }
        if let MemoryInit::Copy(bytes) = &init {
            if (bytes.len() as u64) < desc.size {
                return Err(Error::new(
                    ErrorKind::InvalidHostPtr,
                    format!("{} bytes given to initialize {}", bytes.len(), desc.size),
                ));
            }
        }
        Ok(HostMemory::new(desc, init))
    }

    fn create_queue(
        &self,
        device: usize,
        properties: QueueProperties,
    ) -> Result<HostQueue, Error> {
        let clock = self.device(device)?.clock();
        HostQueue::new(device, properties, clock, self.notify.clone())
    }

    fn create_user_event(&self) -> Result<HostEvent, Error> {
        Ok(HostEvent::user(self.device(0)?.clock()))
    }

    fn build_program(
        &self,
        devices: &[usize],
        source: &str,
        options: &str,
    ) -> Result<HostProgram, BuildError> {
        for &device in devices {
            self.device(device)?;
        }
        let program = HostProgram::build(source, options)?;
        log::trace!("Program built for devices {:?}", devices);
        Ok(program)
    }
}
