use {
    crate::notifier::Notifier,
    kiln_core::{
        Backend, CommandExecutionStatus, CommandType, ContextToken, Error, ErrorKind,
        ProfilingInfo, RawEvent,
    },
    std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
struct Inner<B: Backend> {
    raw: B::Event,
    context: ContextToken,
    #[derivative(Debug = "ignore")]
    notifier: Notifier,
    callback: AtomicBool,
}

/// Completion token of an admitted command.
///
/// Clones refer to the same token.
/// Every query fails with `InvalidContext` once the owning context is released.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct Event<B: Backend> {
    inner: Arc<Inner<B>>,
}

kiln_core::context_owned!(Event<B> @ |event: &Self| event.inner.context.id());

impl<B> Event<B>
where
    B: Backend,
{
    /// Wrap raw event.
    pub fn new(raw: B::Event, context: ContextToken, notifier: Notifier) -> Self {
        Event {
            inner: Arc::new(Inner {
                raw,
                context,
                notifier,
                callback: AtomicBool::new(false),
            }),
        }
    }

    /// Raw event.
    pub fn raw(&self) -> &B::Event {
        &self.inner.raw
    }

    /// Liveness of the owning context.
    pub fn context(&self) -> &ContextToken {
        &self.inner.context
    }

    /// Type of the command that produced this event.
    pub fn command_type(&self) -> CommandType {
        self.inner.raw.command_type()
    }

    /// Current status.
    pub fn status(&self) -> Result<CommandExecutionStatus, Error> {
        self.inner.context.check()?;
        Ok(self.inner.raw.status())
    }

    /// Block until the command is terminal.
    /// Returns terminal status, errors of the command are not turned into `Err`.
    pub fn wait(&self) -> Result<CommandExecutionStatus, Error> {
        self.inner.context.check()?;
        Ok(self.inner.raw.wait())
    }

    /// Device timestamps.
    /// Available once complete if the queue has profiling enabled.
    pub fn profiling(&self) -> Result<ProfilingInfo, Error> {
        self.inner.context.check()?;
        self.inner.raw.profiling()
    }

    /// Register callback called once the event is terminal.
    ///
    /// Callback runs on the context notifier thread, never inline.
    /// Only one callback per event can be registered.
    pub fn set_callback<F>(&self, callback: F) -> Result<(), Error>
    where
        F: FnOnce(&Event<B>, CommandExecutionStatus) + Send + 'static,
    {
        self.inner.context.check()?;
        if self.inner.callback.swap(true, Ordering::AcqRel) {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                "Event already has a callback",
            ));
        }

        let event = self.clone();
        let notifier = self.inner.notifier.clone();
        self.inner.raw.on_terminal(Box::new(move |status| {
            notifier.post(move || callback(&event, status));
        }));
        Ok(())
    }

    /// Check if both handles refer to the same event.
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Event completed by host code.
///
/// Injects host conditions into the dependency graph.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct UserEvent<B: Backend> {
    event: Event<B>,
}

impl<B> UserEvent<B>
where
    B: Backend,
{
    /// Wrap raw user event.
    pub fn new(raw: B::Event, context: ContextToken, notifier: Notifier) -> Self {
        UserEvent {
            event: Event::new(raw, context, notifier),
        }
    }

    /// Event to use in wait lists.
    pub fn event(&self) -> &Event<B> {
        &self.event
    }

    /// Set terminal status.
    /// Only `Complete` and errors are accepted, and only once.
    pub fn set_status(&self, status: CommandExecutionStatus) -> Result<(), Error> {
        self.event.context().check()?;
        if !status.is_terminal() {
            return Err(Error::new(
                ErrorKind::InvalidValue,
                format!("User event can't be set to {:?}", status),
            ));
        }
        log::trace!("User event set to {:?}", status);
        self.event.raw().set_user_status(status)
    }

    /// Mark complete.
    pub fn complete(&self) -> Result<(), Error> {
        self.set_status(CommandExecutionStatus::Complete)
    }

    /// Mark failed.
    pub fn fail(&self, kind: ErrorKind) -> Result<(), Error> {
        self.set_status(CommandExecutionStatus::Error(kind))
    }
}

impl<B> From<UserEvent<B>> for Event<B>
where
    B: Backend,
{
    fn from(user: UserEvent<B>) -> Self {
        user.event
    }
}

/// Block until every event is terminal.
///
/// Doesn't fail because some command failed: reports terminal status of each event.
/// Events must belong to one live context.
pub fn wait_for_events<B: Backend>(events: &[Event<B>]) -> Result<Vec<CommandExecutionStatus>, Error> {
    let first = events.first().ok_or_else(|| {
        Error::new(ErrorKind::InvalidValue, "Wait list is empty")
    })?;

    for event in events {
        event.context().check()?;
        if event.context_id() != first.context_id() {
            return Err(Error::new(
                ErrorKind::InvalidContext,
                "Events belong to different contexts",
            ));
        }
    }

    events.iter().map(Event::wait).collect()
}
