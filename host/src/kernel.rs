//! Kernel library, programs and the work-item view of kernel arguments.

use {
    crate::{device::HostPhysicalDevice, memory::HostMemory, Host},
    kiln_core::{
        read_pod, write_pod, BuildError, Error, ErrorKind, KernelArgValue, KernelWorkGroupInfo,
        Pod, RawKernel, RawPhysicalDevice, RawProgram,
    },
    parking_lot::RwLock,
    std::{collections::HashMap, fmt, mem::size_of, ops::Range, sync::Arc},
};

/// Host function run for every work item.
pub type KernelFn = Arc<dyn Fn(&WorkItem, &mut KernelArgs<'_>) -> Result<(), ErrorKind> + Send + Sync>;

#[derive(Clone)]
struct Entry {
    arity: usize,
    function: KernelFn,
}

impl fmt::Debug for Entry {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Entry").field("arity", &self.arity).finish()
    }
}

lazy_static::lazy_static! {
    static ref LIBRARY: RwLock<HashMap<String, Entry>> = RwLock::new(HashMap::new());
}

/// Make kernel `name` with `arity` arguments available to programs built afterwards.
/// Replaces kernel registered under the same name.
pub fn register_kernel<F>(name: &str, arity: usize, function: F)
where
    F: Fn(&WorkItem, &mut KernelArgs<'_>) -> Result<(), ErrorKind> + Send + Sync + 'static,
{
    log::debug!("Kernel `{}` with {} arguments registered", name, arity);
    LIBRARY.write().insert(
        name.to_owned(),
        Entry {
            arity,
            function: Arc::new(function),
        },
    );
}

/// Ids of one work item.
/// Queries for dimensions beyond the dispatch return 0 for ids and offsets and 1 for sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkItem {
    pub(crate) dims: usize,
    pub(crate) global_id: [usize; 3],
    pub(crate) local_id: [usize; 3],
    pub(crate) group_id: [usize; 3],
    pub(crate) global_size: [usize; 3],
    pub(crate) local_size: [usize; 3],
    pub(crate) num_groups: [usize; 3],
    pub(crate) global_offset: [usize; 3],
}

fn pick(values: &[usize; 3], dim: usize, fill: usize) -> usize {
    if dim < 3 {
        values[dim]
    } else {
        fill
    }
}

#[allow(missing_docs)]
impl WorkItem {
    pub fn work_dim(&self) -> usize {
        self.dims
    }

    pub fn global_id(&self, dim: usize) -> usize {
        pick(&self.global_id, dim, 0)
    }

    pub fn local_id(&self, dim: usize) -> usize {
        pick(&self.local_id, dim, 0)
    }

    pub fn group_id(&self, dim: usize) -> usize {
        pick(&self.group_id, dim, 0)
    }

    pub fn global_size(&self, dim: usize) -> usize {
        pick(&self.global_size, dim, 1)
    }

    pub fn local_size(&self, dim: usize) -> usize {
        pick(&self.local_size, dim, 1)
    }

    pub fn num_groups(&self, dim: usize) -> usize {
        pick(&self.num_groups, dim, 1)
    }

    pub fn global_offset(&self, dim: usize) -> usize {
        pick(&self.global_offset, dim, 0)
    }

    /// Row-major index of the work item within the global range, offset excluded.
    pub fn global_linear_id(&self) -> usize {
        let id = |dim: usize| self.global_id[dim] - self.global_offset[dim];
        (id(2) * self.global_size[1] + id(1)) * self.global_size[0] + id(0)
    }
}

/// Arguments as seen by a running kernel.
///
/// Memory arguments are accessed element-wise.
/// Out-of-range access fails with `OutOfResources`.
#[derive(Debug)]
pub struct KernelArgs<'a> {
    args: &'a [KernelArgValue<Host>],
    locals: Vec<Vec<u8>>,
}

fn element_range<T>(element: usize, len: usize) -> Result<Range<usize>, ErrorKind> {
    let start = element.checked_mul(size_of::<T>()).ok_or(ErrorKind::OutOfResources)?;
    let end = start.checked_add(size_of::<T>()).ok_or(ErrorKind::OutOfResources)?;
    if end > len {
        Err(ErrorKind::OutOfResources)
    } else {
        Ok(start..end)
    }
}

impl<'a> KernelArgs<'a> {
    pub(crate) fn new(args: &'a [KernelArgValue<Host>]) -> Self {
        let locals = args
            .iter()
            .map(|arg| match arg {
                KernelArgValue::Local(size) => vec![0; *size],
                _ => Vec::new(),
            })
            .collect();
        KernelArgs { args, locals }
    }

    /// Zero local memory for the next work group.
    pub(crate) fn reset_locals(&mut self) {
        for local in &mut self.locals {
            for byte in local.iter_mut() {
                *byte = 0;
            }
        }
    }

    fn arg(&self, index: usize) -> Result<&'a KernelArgValue<Host>, ErrorKind> {
        self.args.get(index).ok_or(ErrorKind::InvalidArgIndex)
    }

    fn memory(&self, index: usize) -> Result<Option<&'a HostMemory>, ErrorKind> {
        match self.arg(index)? {
            KernelArgValue::Memory(memory) => Ok(Some(&**memory)),
            KernelArgValue::Local(_) => Ok(None),
            KernelArgValue::Bytes(_) => Err(ErrorKind::InvalidArgValue),
        }
    }

    /// Number of `T` elements in memory or local argument.
    pub fn len<T: Pod>(&self, index: usize) -> Result<usize, ErrorKind> {
        let bytes = match self.memory(index)? {
            Some(memory) => memory.size(),
            None => self.locals[index].len(),
        };
        Ok(bytes / size_of::<T>())
    }

    /// Read element of memory or local argument.
    pub fn load<T: Pod>(&self, index: usize, element: usize) -> Result<T, ErrorKind> {
        match self.memory(index)? {
            Some(memory) => {
                if !memory.access().device_readable() {
                    return Err(ErrorKind::InvalidOperation);
                }
                let range = element_range::<T>(element, memory.size())?;
                let bytes = memory.region().read();
                let bytes = bytes.get(range).ok_or(ErrorKind::OutOfResources)?;
                Ok(read_pod(bytes))
            }
            None => {
                let local = &self.locals[index];
                let range = element_range::<T>(element, local.len())?;
                Ok(read_pod(&local[range]))
            }
        }
    }

    /// Write element of memory or local argument.
    pub fn store<T: Pod>(&mut self, index: usize, element: usize, value: T) -> Result<(), ErrorKind> {
        match self.memory(index)? {
            Some(memory) => {
                if !memory.access().device_writable() {
                    return Err(ErrorKind::InvalidOperation);
                }
                let range = element_range::<T>(element, memory.size())?;
                let mut bytes = memory.region().write();
                let bytes = bytes.get_mut(range).ok_or(ErrorKind::OutOfResources)?;
                write_pod(bytes, value);
                Ok(())
            }
            None => {
                let local = &mut self.locals[index];
                let range = element_range::<T>(element, local.len())?;
                write_pod(&mut local[range], value);
                Ok(())
            }
        }
    }

    /// Value of by-copy argument.
    pub fn scalar<T: Pod>(&self, index: usize) -> Result<T, ErrorKind> {
        match self.arg(index)? {
            KernelArgValue::Bytes(bytes) if bytes.len() == size_of::<T>() => Ok(read_pod(bytes)),
            KernelArgValue::Bytes(_) => Err(ErrorKind::InvalidArgSize),
            _ => Err(ErrorKind::InvalidArgValue),
        }
    }
}

/// Parsed build options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// `-D NAME[=VALUE]` definitions.
    pub defines: Vec<(String, Option<String>)>,

    /// `-I dir` include directories.
    pub includes: Vec<String>,

    /// `-cl-*` flags.
    pub flags: Vec<String>,

    /// `-w` was given.
    pub suppress_warnings: bool,

    /// `-Werror` was given.
    pub warnings_as_errors: bool,
}

impl BuildOptions {
    /// Parse option string.
    pub fn parse(options: &str) -> Result<Self, Error> {
        let mut parsed = BuildOptions::default();
        let mut tokens = options.split_whitespace();

        let invalid = |message: String| Error::new(ErrorKind::InvalidBuildOptions, message);

        while let Some(token) = tokens.next() {
            match token {
                "-w" => parsed.suppress_warnings = true,
                "-Werror" => parsed.warnings_as_errors = true,
                "-D" | "-I" => {
                    let value = tokens
                        .next()
                        .ok_or_else(|| invalid(format!("`{}` requires a value", token)))?;
                    parsed.push(&token[..2], value);
                }
                token if token.starts_with("-D") || token.starts_with("-I") => {
                    parsed.push(&token[..2], &token[2..]);
                }
                token if token.starts_with("-cl-") => parsed.flags.push(token.to_owned()),
                token => return Err(invalid(format!("Unknown option `{}`", token))),
            }
        }

        Ok(parsed)
    }

    fn push(&mut self, option: &str, value: &str) {
        if option == "-I" {
            self.includes.push(value.to_owned());
            return;
        }
        let mut split = value.splitn(2, '=');
        let name = split.next().unwrap_or_default().to_owned();
        self.defines.push((name, split.next().map(str::to_owned)));
    }
}

/// Program of the host backend.
/// Source lists kernel names separated by whitespace or `;`.
#[derive(Debug)]
pub struct HostProgram {
    kernels: Vec<(String, Entry)>,
    options: BuildOptions,
    log: String,
}

impl HostProgram {
    pub(crate) fn build(source: &str, options: &str) -> Result<Self, BuildError> {
        let options = BuildOptions::parse(options)?;

        let library = LIBRARY.read();
        let mut kernels = Vec::new();
        let mut log = String::new();
        let mut failed = false;

        for (line, text) in source.lines().enumerate() {
            for name in text
                .split(|c: char| c.is_whitespace() || c == ';')
                .filter(|name| !name.is_empty())
            {
                match library.get(name) {
                    Some(entry) => {
                        log.push_str(&format!(
                            "{}: kernel `{}` with {} arguments\n",
                            line + 1,
                            name,
                            entry.arity
                        ));
                        kernels.push((name.to_owned(), entry.clone()));
                    }
                    None => {
                        failed = true;
                        log.push_str(&format!("{}: error: unknown kernel `{}`\n", line + 1, name));
                    }
                }
            }
        }

        if failed {
            return Err(BuildError {
                error: Error::new(ErrorKind::BuildProgramFailure, "Unknown kernels in source"),
                log,
            });
        }

        if kernels.is_empty() {
            return Err(Error::new(ErrorKind::InvalidValue, "Program source names no kernels").into());
        }

        Ok(HostProgram {
            kernels,
            options,
            log,
        })
    }

    /// Parsed build options.
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }
}

impl RawProgram<Host> for HostProgram {
    fn kernel_names(&self) -> Vec<String> {
        self.kernels.iter().map(|(name, _)| name.clone()).collect()
    }

    fn build_log(&self, _device: usize) -> String {
        self.log.clone()
    }

    fn create_kernel(&self, name: &str) -> Result<HostKernel, Error> {
        self.kernels
            .iter()
            .find(|(kernel, _)| kernel == name)
            .map(|(name, entry)| HostKernel {
                name: name.clone(),
                entry: entry.clone(),
            })
            .ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidKernelName,
                    format!("Program has no kernel `{}`", name),
                )
            })
    }
}

/// Kernel of the host backend.
#[derive(Debug)]
pub struct HostKernel {
    name: String,
    entry: Entry,
}

impl HostKernel {
    pub(crate) fn function(&self) -> &KernelFn {
        &self.entry.function
    }
}

impl RawKernel<Host> for HostKernel {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_args(&self) -> usize {
        self.entry.arity
    }

    fn work_group_info(&self, device: &HostPhysicalDevice) -> KernelWorkGroupInfo {
        let info = device.info();
        KernelWorkGroupInfo {
            work_group_size: info.max_work_group_size,
            preferred_work_group_size_multiple: info.preferred_work_group_size_multiple,
            local_mem_size: 0,
            private_mem_size: 0,
            compile_work_group_size: [0; 3],
        }
    }
}
