//! Kernel dispatch.

use {
    crate::{program::Kernel, queue::CommandQueue},
    kiln_command::Event,
    kiln_core::{Backend, Command, CommandType, Error, ErrorKind, NdRange},
    thread_profiler::profile_scope,
};

impl<B> CommandQueue<B>
where
    B: Backend,
{
    /// Run kernel over N-dimensional index space.
    ///
    /// `offset` and `local` must have the dimensionality of `global`.
    /// Without `local` the work-group size is picked from device and kernel limits.
    /// Arguments bound at the time of the call are used.
    pub fn enqueue_nd_range(
        &self,
        kernel: &Kernel<B>,
        offset: Option<&[usize]>,
        global: &[usize],
        local: Option<&[usize]>,
        waits: &[Event<B>],
    ) -> Result<Event<B>, Error> {
        profile_scope!("enqueue_nd_range");

        if kernel.context().id() != self.context().id() {
            return Err(Error::new(
                ErrorKind::InvalidContext,
                format!("Kernel `{}` belongs to another context", kernel.name()),
            ));
        }

        let device_index = self.device()?;
        if !kernel.built_for(device_index) {
            return Err(Error::new(
                ErrorKind::InvalidProgramExecutable,
                format!(
                    "Kernel `{}` is not built for device {}",
                    kernel.name(),
                    device_index
                ),
            ));
        }

        let args = kernel.bound_args()?;
        let device = self.context().device(device_index)?;
        let info = kernel.work_group_info(device_index)?;

        if info.local_mem_size > device.info().local_mem_size {
            return Err(Error::new(
                ErrorKind::OutOfResources,
                format!(
                    "Kernel `{}` needs {} bytes of local memory, device has {}",
                    kernel.name(),
                    info.local_mem_size,
                    device.info().local_mem_size
                ),
            ));
        }

        let range = NdRange::new(offset, global, local)?.fit(device.info(), info.work_group_size)?;
        log::trace!("Dispatch `{}` over {:?}", kernel.name(), range);

        self.enqueue(
            CommandType::NdRangeKernel,
            Command::Dispatch {
                kernel: kernel.raw().clone(),
                args,
                range,
            },
            waits,
            false,
        )
    }

    /// Run kernel as a single work item.
    pub fn enqueue_task(&self, kernel: &Kernel<B>, waits: &[Event<B>]) -> Result<Event<B>, Error> {
        self.enqueue_nd_range(kernel, None, &[1], Some(&[1]), waits)
    }
}
