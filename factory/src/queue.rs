use {
    crate::context::Context,
    kiln_command::{Event, Queue, QueueId, Submission},
    kiln_core::{
        Backend, Command, CommandExecutionStatus, CommandType, ContextId, Error, QueueProperties,
    },
    kiln_memory::{Buffer, Image, ImageFormat, ImageLayout},
    slotmap::new_key_type,
    std::sync::Arc,
    thread_profiler::profile_scope,
};

new_key_type! {
    /// Key of the queue in its context's table.
    pub struct QueueKey;
}

/// Command queue on one device of a context.
///
/// Every enqueue method checks its arguments, admits the command after `waits`
/// and returns the event of the command.
/// Dropping the event doesn't cancel anything.
/// Failures of such commands surface only through `finish`.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct CommandQueue<B: Backend> {
    key: QueueKey,
    context: Context<B>,
}

impl<B> CommandQueue<B>
where
    B: Backend,
{
    pub(crate) fn new(key: QueueKey, context: Context<B>) -> Self {
        CommandQueue { key, context }
    }

    pub(crate) fn queue(&self) -> Result<Arc<Queue<B>>, Error> {
        self.context.queue(self.key)
    }

    /// Context of the queue.
    pub fn context(&self) -> &Context<B> {
        &self.context
    }

    /// Id of the queue.
    pub fn id(&self) -> Result<QueueId, Error> {
        Ok(self.queue()?.id())
    }

    /// Index of the device within the context.
    pub fn device(&self) -> Result<usize, Error> {
        Ok(self.queue()?.device())
    }

    /// Queue properties.
    pub fn properties(&self) -> Result<QueueProperties, Error> {
        Ok(self.queue()?.properties())
    }

    /// Admit command and block until it completes if `blocking`.
    pub(crate) fn enqueue(
        &self,
        command_type: CommandType,
        command: Command<B>,
        waits: &[Event<B>],
        blocking: bool,
    ) -> Result<Event<B>, Error> {
        let queue = self.queue()?;
        let event = queue.submit(Submission::new(command_type, command).wait(waits))?;
        settle(event, blocking)
    }

    /// Command that completes after `waits`,
    /// or after everything enqueued before if `waits` is empty.
    pub fn enqueue_marker(&self, waits: &[Event<B>]) -> Result<Event<B>, Error> {
        self.enqueue(CommandType::Marker, Command::Marker, waits, false)
    }

    /// Marker that also orders every later command after it.
    pub fn enqueue_barrier(&self, waits: &[Event<B>]) -> Result<Event<B>, Error> {
        self.enqueue(CommandType::Barrier, Command::Barrier, waits, false)
    }

    /// Push admitted commands toward the device.
    pub fn flush(&self) -> Result<(), Error> {
        self.queue()?.flush()
    }

    /// Block until every admitted command is terminal.
    /// Fails with the first error among commands admitted since the previous call.
    pub fn finish(&self) -> Result<(), Error> {
        profile_scope!("finish");
        self.queue()?.finish()
    }

    /// Release the queue.
    /// Admitted commands still run, later calls fail with `InvalidCommandQueue`.
    pub fn release(&self) -> Result<(), Error> {
        self.context.release_queue(self.key).map(drop)
    }

    pub(crate) fn context_id(&self) -> ContextId {
        self.context.id()
    }

    /// Storage and size of the buffer.
    pub(crate) fn buffer_memory(&self, buffer: &Buffer) -> Result<(Arc<B::Memory>, usize), Error> {
        self.context.with_memory(buffer, |object| {
            let object = object.buffer()?;
            Ok((object.raw().clone(), object.size()))
        })
    }

    /// Storage, format and layout of the image.
    pub(crate) fn image_memory(
        &self,
        image: &Image,
    ) -> Result<(Arc<B::Memory>, ImageFormat, ImageLayout), Error> {
        self.context.with_memory(image, |object| {
            let (format, layout) = object.image()?;
            Ok((object.raw().clone(), format, layout))
        })
    }
}

/// Wait for blocking commands and turn their failures into errors.
pub(crate) fn settle<B: Backend>(event: Event<B>, blocking: bool) -> Result<Event<B>, Error> {
    if blocking {
        profile_scope!("blocking_wait");
        if let CommandExecutionStatus::Error(kind) = event.wait()? {
            return Err(Error::new(
                kind,
                format!("Blocking {:?} failed", event.command_type()),
            ));
        }
    }
    Ok(event)
}
