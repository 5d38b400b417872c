use {
    crate::context::{Context, MemoryHandle},
    kiln_core::{
        cast_slice, Backend, Error, ErrorKind, KernelArgValue, KernelWorkGroupInfo, Pod,
        RawKernel, RawProgram,
    },
    kiln_memory::{Buffer, Image},
    parking_lot::Mutex,
    smallvec::SmallVec,
    std::sync::Arc,
};

/// Program built for devices of a context.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Program<B: Backend> {
    raw: Arc<B::Program>,
    devices: Vec<usize>,
    context: Context<B>,
}

impl<B> Program<B>
where
    B: Backend,
{
    pub(crate) fn new(raw: B::Program, devices: Vec<usize>, context: Context<B>) -> Self {
        Program {
            raw: Arc::new(raw),
            devices,
            context,
        }
    }

    /// Indices of devices the program was built for.
    pub fn devices(&self) -> &[usize] {
        &self.devices
    }

    /// Names of kernels in the program.
    pub fn kernel_names(&self) -> Result<Vec<String>, Error> {
        self.context.check()?;
        Ok(self.raw.kernel_names())
    }

    /// Build log for the device with specified index within the context.
    pub fn build_log(&self, device: usize) -> Result<String, Error> {
        self.context.check()?;
        if !self.devices.contains(&device) {
            return Err(Error::new(
                ErrorKind::InvalidDevice,
                format!("Program is not built for device {}", device),
            ));
        }
        Ok(self.raw.build_log(device))
    }

    /// Create kernel object.
    pub fn create_kernel(&self, name: &str) -> Result<Kernel<B>, Error> {
        self.context.check()?;
        let raw = self.raw.create_kernel(name)?;
        let args = (0..raw.num_args()).map(|_| None).collect();
        log::debug!("Kernel `{}` created", name);
        Ok(Kernel {
            raw: Arc::new(raw),
            devices: self.devices.clone(),
            context: self.context.clone(),
            args: Mutex::new(args),
        })
    }
}

/// Kernel argument.
#[derive(Clone, Copy, Debug)]
pub enum KernelArg<'a> {
    /// Buffer object.
    Buffer(&'a Buffer),

    /// Image object.
    Image(&'a Image),

    /// Bytes passed by copy.
    Scalar(&'a [u8]),

    /// Local memory of specified size allocated per work group.
    Local(usize),
}

/// Kernel with its positional arguments.
///
/// Arguments are captured by `enqueue_nd_range`,
/// so they can be changed right after the dispatch is admitted.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Kernel<B: Backend> {
    raw: Arc<B::Kernel>,
    devices: Vec<usize>,
    context: Context<B>,
    args: Mutex<Vec<Option<KernelArgValue<B>>>>,
}

impl<B> Kernel<B>
where
    B: Backend,
{
    /// Kernel function name.
    pub fn name(&self) -> &str {
        self.raw.name()
    }

    /// Number of arguments.
    pub fn num_args(&self) -> usize {
        self.raw.num_args()
    }

    /// Context of the kernel.
    pub fn context(&self) -> &Context<B> {
        &self.context
    }

    pub(crate) fn raw(&self) -> &Arc<B::Kernel> {
        &self.raw
    }

    fn memory(&self, handle: &impl MemoryHandle) -> Result<KernelArgValue<B>, Error> {
        self.context
            .with_memory(handle, |object| Ok(KernelArgValue::Memory(object.raw().clone())))
    }

    /// Bind argument at `index`.
    pub fn set_arg(&self, index: usize, arg: KernelArg<'_>) -> Result<(), Error> {
        self.context.check()?;
        let mut args = self.args.lock();
        if index >= args.len() {
            return Err(Error::new(
                ErrorKind::InvalidArgIndex,
                format!("Kernel `{}` has {} arguments", self.name(), args.len()),
            ));
        }

        let value = match arg {
            KernelArg::Buffer(buffer) => {
                self.context.with_memory(buffer, |object| object.buffer().map(drop))?;
                self.memory(buffer)?
            }
            KernelArg::Image(image) => {
                self.context.with_memory(image, |object| object.image().map(drop))?;
                self.memory(image)?
            }
            KernelArg::Scalar(bytes) if bytes.is_empty() => {
                return Err(Error::new(ErrorKind::InvalidArgSize, "Empty scalar argument"));
            }
            KernelArg::Scalar(bytes) => KernelArgValue::Bytes(SmallVec::from_slice(bytes)),
            KernelArg::Local(0) => {
                return Err(Error::new(
                    ErrorKind::InvalidArgSize,
                    "Local argument of zero bytes",
                ));
            }
            KernelArg::Local(size) => KernelArgValue::Local(size),
        };

        args[index] = Some(value);
        Ok(())
    }

    /// Bind value passed by copy.
    pub fn set_arg_scalar<T: Pod>(&self, index: usize, value: T) -> Result<(), Error> {
        self.set_arg(index, KernelArg::Scalar(cast_slice(&[value])))
    }

    /// Bound arguments in positional order.
    /// Fails with `InvalidKernelArgs` if any is unset.
    pub(crate) fn bound_args(&self) -> Result<Vec<KernelArgValue<B>>, Error> {
        self.args
            .lock()
            .iter()
            .enumerate()
            .map(|(index, arg)| {
                arg.clone().ok_or_else(|| {
                    Error::new(
                        ErrorKind::InvalidKernelArgs,
                        format!("Argument {} of kernel `{}` is not set", index, self.name()),
                    )
                })
            })
            .collect()
    }

    /// Local memory of bound `Local` arguments.
    pub fn local_args_size(&self) -> u64 {
        self.args
            .lock()
            .iter()
            .map(|arg| match arg {
                Some(KernelArgValue::Local(size)) => *size as u64,
                _ => 0,
            })
            .sum()
    }

    /// Properties of the kernel on the device with specified index within the context.
    /// Local memory includes bound `Local` arguments.
    pub fn work_group_info(&self, device: usize) -> Result<KernelWorkGroupInfo, Error> {
        self.context.check()?;
        if !self.devices.contains(&device) {
            return Err(Error::new(
                ErrorKind::InvalidDevice,
                format!("Kernel `{}` is not built for device {}", self.name(), device),
            ));
        }
        let mut info = self.raw.work_group_info(self.context.device(device)?.raw());
        info.local_mem_size += self.local_args_size();
        Ok(info)
    }

    pub(crate) fn built_for(&self, device: usize) -> bool {
        self.devices.contains(&device)
    }
}
