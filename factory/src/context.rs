use {
    crate::{
        config::Config,
        platform::Device,
        program::Program,
        queue::{CommandQueue, QueueKey},
    },
    kiln_command::{Notifier, Queue, QueueId, UserEvent},
    kiln_core::{
        AccessMode, Backend, BuildError, ContextError, ContextId, ContextToken, Error, ErrorKind,
        QueueProperties, RawContext, RawPhysicalDevice,
    },
    kiln_memory::{
        check_size, Buffer, Image, ImageDesc, ImageFormat, ImageLayout, MemoryInfo, MemoryKey,
        MemoryKind, MemoryObject, MemoryTable, StorageClass,
    },
    parking_lot::RwLock,
    slotmap::SlotMap,
    std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    thread_profiler::profile_scope,
};

/// Handle of a memory object.
pub trait MemoryHandle: Copy {
    /// Key in the context's memory table.
    fn memory_key(&self) -> MemoryKey;

    /// Context that created the object.
    fn owner(&self) -> ContextId;
}

impl MemoryHandle for Buffer {
    fn memory_key(&self) -> MemoryKey {
        self.key()
    }

    fn owner(&self) -> ContextId {
        self.context_id()
    }
}

impl MemoryHandle for Image {
    fn memory_key(&self) -> MemoryKey {
        self.key()
    }

    fn owner(&self) -> ContextId {
        self.context_id()
    }
}

#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
struct Shared<B: Backend> {
    token: ContextToken,
    config: Config,
    devices: Vec<Device<B>>,
    raw: B::Context,
    memory: RwLock<MemoryTable<B>>,
    queues: RwLock<SlotMap<QueueKey, Arc<Queue<B>>>>,
    notifier: Notifier,
    next_queue: AtomicU32,
}

/// Allocation namespace over a set of devices.
///
/// Owns memory objects and queues created through it.
/// Handles are generational keys into the context's tables,
/// so released objects are rejected instead of dangling.
/// Clones refer to the same context.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct Context<B: Backend> {
    shared: Arc<Shared<B>>,
}

#[allow(unused)]
fn context_is_send_sync<B: Backend>() {
    fn is_send_sync<T: Send + Sync>() {}
    is_send_sync::<Context<B>>();
}

impl<B> Context<B>
where
    B: Backend,
{
    /// Create context over devices.
    /// Out-of-band driver errors are logged.
    pub fn new(devices: &[Device<B>], config: Config) -> Result<Self, Error> {
        let label = config.label.clone();
        Self::create(devices, config, move |error: ContextError| {
            log::error!("Context `{}` error: {} {}", label, error.kind, error.message);
        })
    }

    /// Create context over devices.
    /// `callback` receives out-of-band driver errors on the notifier thread.
    pub fn with_error_callback<F>(
        devices: &[Device<B>],
        config: Config,
        callback: F,
    ) -> Result<Self, Error>
    where
        F: Fn(ContextError) + Send + Sync + 'static,
    {
        Self::create(devices, config, callback)
    }

    fn create<F>(devices: &[Device<B>], config: Config, callback: F) -> Result<Self, Error>
    where
        F: Fn(ContextError) + Send + Sync + 'static,
    {
        profile_scope!("create_context");

        let first = devices.first().ok_or_else(|| {
            Error::new(ErrorKind::InvalidValue, "Context requires at least one device")
        })?;
        if devices
            .iter()
            .any(|device| device.id().platform != first.id().platform)
        {
            return Err(Error::new(
                ErrorKind::InvalidDevice,
                "Devices of a context must come from one platform",
            ));
        }

        let notifier = Notifier::new(&config.notifier_thread)?;
        let callback = Arc::new(callback);
        let notify = {
            let notifier = notifier.clone();
            Arc::new(move |error: ContextError| {
                let callback = callback.clone();
                notifier.post(move || callback(error));
            })
        };

        let raw = B::create_context(
            devices.iter().map(|device| device.raw().clone()).collect(),
            notify,
        )?;

        let token = ContextToken::new();
        log::debug!(
            "Context `{}` {:?} created over {} devices of backend `{}`",
            config.label,
            token.id(),
            devices.len(),
            B::name()
        );

        Ok(Context {
            shared: Arc::new(Shared {
                token,
                config,
                devices: devices.to_vec(),
                raw,
                memory: RwLock::new(MemoryTable::new()),
                queues: RwLock::new(SlotMap::with_key()),
                notifier,
                next_queue: AtomicU32::new(0),
            }),
        })
    }

    /// Id of the context.
    pub fn id(&self) -> ContextId {
        self.shared.token.id()
    }

    /// Liveness token shared with objects of the context.
    pub fn token(&self) -> &ContextToken {
        &self.shared.token
    }

    /// Fail with `InvalidContext` if released.
    pub fn check(&self) -> Result<(), Error> {
        self.shared.token.check()
    }

    /// Context configuration.
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Devices of the context.
    pub fn devices(&self) -> &[Device<B>] {
        &self.shared.devices
    }

    /// Device with specified index within the context.
    pub fn device(&self, index: usize) -> Result<&Device<B>, Error> {
        self.shared.devices.get(index).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidDevice,
                format!(
                    "Context has {} devices, {} requested",
                    self.shared.devices.len(),
                    index
                ),
            )
        })
    }

    /// Raw context.
    pub fn raw(&self) -> &B::Context {
        &self.shared.raw
    }

    /// Largest allocation every device of the context accepts.
    pub fn max_mem_alloc_size(&self) -> u64 {
        self.shared
            .devices
            .iter()
            .map(|device| device.info().max_mem_alloc_size)
            .min()
            .unwrap_or(0)
    }

    fn create_memory(
        &self,
        size: usize,
        access: AccessMode,
        storage: StorageClass,
        kind: MemoryKind,
    ) -> Result<MemoryKey, Error> {
        self.check()?;
        let raw = storage.create::<B>(&self.shared.raw, size, access)?;
        let object = MemoryObject::new(raw, size, access, storage, kind);
        let key = self.shared.memory.write().insert(object);
        log::debug!(
            "Memory object {:?} of {} bytes created in context {:?}",
            key,
            size,
            self.id()
        );
        Ok(key)
    }

    /// Create buffer of `size` bytes.
    pub fn create_buffer(
        &self,
        size: usize,
        access: AccessMode,
        storage: StorageClass,
    ) -> Result<Buffer, Error> {
        profile_scope!("create_buffer");
        check_size(size, self.max_mem_alloc_size())?;
        let key = self.create_memory(size, access, storage, MemoryKind::Buffer)?;
        Ok(Buffer::new(key, self.id()))
    }

    /// Create image.
    /// Pitches of `desc` describe the host region of `storage` and require one.
    pub fn create_image(
        &self,
        format: ImageFormat,
        desc: &ImageDesc,
        access: AccessMode,
        storage: StorageClass,
    ) -> Result<Image, Error> {
        profile_scope!("create_image");
        self.check()?;

        let host_region = storage.host_region().is_some();
        let mut layout = None;
        for device in &self.shared.devices {
            layout = Some(desc.layout(format, device.info(), host_region)?);
        }
        let layout = layout.ok_or(ErrorKind::InvalidContext)?;

        if layout.size as u64 > self.max_mem_alloc_size() {
            return Err(Error::new(
                ErrorKind::InvalidImageSize,
                format!(
                    "Image of {} bytes exceeds max allocation of {}",
                    layout.size,
                    self.max_mem_alloc_size()
                ),
            ));
        }

        let key = self.create_memory(
            layout.size,
            access,
            storage,
            MemoryKind::Image { format, layout },
        )?;
        Ok(Image::new(key, self.id()))
    }

    fn owned(&self, handle: &impl MemoryHandle) -> Result<MemoryKey, Error> {
        self.check()?;
        if handle.owner() != self.id() {
            return Err(Error::new(
                ErrorKind::InvalidMemObject,
                format!(
                    "Memory object of context {:?} used with context {:?}",
                    handle.owner(),
                    self.id()
                ),
            ));
        }
        Ok(handle.memory_key())
    }

    /// Run `f` on the record of the memory object.
    pub fn with_memory<R>(
        &self,
        handle: &impl MemoryHandle,
        f: impl FnOnce(&MemoryObject<B>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let key = self.owned(handle)?;
        let memory = self.shared.memory.read();
        f(memory.get(key)?)
    }

    /// Attributes of the memory object.
    pub fn memory_info(&self, handle: &impl MemoryHandle) -> Result<MemoryInfo, Error> {
        self.with_memory(handle, |object| Ok(object.info()))
    }

    /// Format and layout of the image.
    pub fn image_layout(&self, image: &Image) -> Result<(ImageFormat, ImageLayout), Error> {
        self.with_memory(image, MemoryObject::image)
    }

    fn release_memory(&self, key: MemoryKey) -> Result<(), Error> {
        self.shared.memory.write().remove(key)?;
        log::debug!("Memory object {:?} released", key);
        Ok(())
    }

    /// Release buffer.
    /// Commands in flight keep the storage alive until they finish.
    pub fn release_buffer(&self, buffer: Buffer) -> Result<(), Error> {
        self.with_memory(&buffer, |object| object.buffer().map(drop))?;
        self.release_memory(buffer.key())
    }

    /// Release image.
    /// Commands in flight keep the storage alive until they finish.
    pub fn release_image(&self, image: Image) -> Result<(), Error> {
        self.with_memory(&image, |object| object.image().map(drop))?;
        self.release_memory(image.key())
    }

    /// Create queue on device with specified index within the context.
    pub fn create_queue(
        &self,
        device: usize,
        properties: QueueProperties,
    ) -> Result<CommandQueue<B>, Error> {
        profile_scope!("create_queue");
        self.check()?;
        self.device(device)?;

        let raw = self.shared.raw.create_queue(device, properties)?;
        let id = QueueId {
            context: self.id(),
            index: self.shared.next_queue.fetch_add(1, Ordering::Relaxed),
        };
        let queue = Queue::new(
            raw,
            id,
            device,
            properties,
            self.shared.token.clone(),
            self.shared.notifier.clone(),
        );
        let key = self.shared.queues.write().insert(Arc::new(queue));
        log::debug!("Queue {:?} created with {:?}", id, properties);
        Ok(CommandQueue::new(key, self.clone()))
    }

    /// Create queue on device with specified index using configured properties.
    pub fn create_default_queue(&self, device: usize) -> Result<CommandQueue<B>, Error> {
        self.create_queue(device, self.shared.config.queue_properties)
    }

    pub(crate) fn queue(&self, key: QueueKey) -> Result<Arc<Queue<B>>, Error> {
        self.check()?;
        self.shared.queues.read().get(key).cloned().ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidCommandQueue,
                format!("Queue {:?} is released", key),
            )
        })
    }

    pub(crate) fn release_queue(&self, key: QueueKey) -> Result<Arc<Queue<B>>, Error> {
        self.check()?;
        let queue = self.shared.queues.write().remove(key).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidCommandQueue,
                format!("Queue {:?} is already released", key),
            )
        })?;
        log::debug!("Queue {:?} released", queue.id());
        Ok(queue)
    }

    /// Create event completed by host code.
    pub fn create_user_event(&self) -> Result<UserEvent<B>, Error> {
        self.check()?;
        let raw = self.shared.raw.create_user_event()?;
        Ok(UserEvent::new(
            raw,
            self.shared.token.clone(),
            self.shared.notifier.clone(),
        ))
    }

    /// Build program for every device of the context.
    pub fn build_program(&self, source: &str, options: &str) -> Result<Program<B>, BuildError> {
        let devices: Vec<usize> = (0..self.shared.devices.len()).collect();
        self.build_program_for(&devices, source, options)
    }

    /// Build program for devices with specified indices within the context.
    pub fn build_program_for(
        &self,
        devices: &[usize],
        source: &str,
        options: &str,
    ) -> Result<Program<B>, BuildError> {
        profile_scope!("build_program");
        self.check()?;
        if devices.is_empty() {
            return Err(Error::new(ErrorKind::InvalidValue, "Device list is empty").into());
        }
        for &device in devices {
            self.device(device)?;
        }

        match self.shared.raw.build_program(devices, source, options) {
            Ok(raw) => {
                log::debug!("Program built for devices {:?}", devices);
                Ok(Program::new(raw, devices.to_vec(), self.clone()))
            }
            Err(error) => {
                log::debug!("Program build failed: {}", error);
                Err(error)
            }
        }
    }

    /// Release the context.
    ///
    /// Every object created under it becomes invalid.
    /// Commands in flight still run to completion.
    /// Releasing twice fails with `InvalidContext`.
    pub fn release(&self) -> Result<(), Error> {
        if !self.shared.token.release() {
            return Err(Error::new(
                ErrorKind::InvalidContext,
                format!("Context {:?} is already released", self.id()),
            ));
        }

        self.shared.queues.write().clear();
        self.shared.memory.write().clear();
        log::debug!("Context `{}` {:?} released", self.shared.config.label, self.id());
        Ok(())
    }
}
