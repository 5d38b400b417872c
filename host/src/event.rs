use {
    crate::device::nanos_since,
    kiln_core::{
        CommandExecutionStatus, CommandType, Error, ErrorKind, ProfilingInfo, RawEvent,
        TerminalHook,
    },
    parking_lot::{Condvar, Mutex},
    std::{fmt, sync::Arc, time::Instant},
};

struct State {
    status: CommandExecutionStatus,
    settled: bool,
    hooks: Vec<TerminalHook>,
    times: ProfilingInfo,
}

struct Shared {
    command_type: CommandType,
    user: bool,
    profiling: bool,
    clock: Instant,
    state: Mutex<State>,
    settled: Condvar,
}

/// Completion token of the host backend.
///
/// Terminal hooks run on the thread that made the event terminal,
/// before threads blocked in `wait` are released.
#[derive(Clone)]
pub struct HostEvent {
    shared: Arc<Shared>,
}

impl fmt::Debug for HostEvent {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("HostEvent")
            .field("command_type", &self.shared.command_type)
            .field("status", &self.status())
            .finish()
    }
}

impl HostEvent {
    pub(crate) fn new(command_type: CommandType, profiling: bool, clock: Instant) -> Self {
        HostEvent::with_status(
            command_type,
            CommandExecutionStatus::Queued,
            false,
            profiling,
            clock,
        )
    }

    pub(crate) fn user(clock: Instant) -> Self {
        HostEvent::with_status(
            CommandType::User,
            CommandExecutionStatus::Submitted,
            true,
            false,
            clock,
        )
    }

    fn with_status(
        command_type: CommandType,
        status: CommandExecutionStatus,
        user: bool,
        profiling: bool,
        clock: Instant,
    ) -> Self {
        let now = nanos_since(clock);
        HostEvent {
            shared: Arc::new(Shared {
                command_type,
                user,
                profiling,
                clock,
                state: Mutex::new(State {
                    status,
                    settled: false,
                    hooks: Vec::new(),
                    times: ProfilingInfo {
                        queued: now,
                        ..ProfilingInfo::default()
                    },
                }),
                settled: Condvar::new(),
            }),
        }
    }

    /// Move to `status`.
    /// Returns `false` if transition is not allowed.
    pub(crate) fn advance(&self, status: CommandExecutionStatus) -> bool {
        let hooks = {
            let mut state = self.shared.state.lock();
            if !state.status.can_advance_to(status) {
                return false;
            }

            let now = nanos_since(self.shared.clock);
            match status {
                CommandExecutionStatus::Queued => {}
                CommandExecutionStatus::Submitted => state.times.submitted = now,
                CommandExecutionStatus::Running => state.times.start = now,
                CommandExecutionStatus::Complete | CommandExecutionStatus::Error(_) => {
                    state.times.end = now
                }
            }
            state.status = status;

            if !status.is_terminal() {
                return true;
            }
            std::mem::replace(&mut state.hooks, Vec::new())
        };

        for hook in hooks {
            hook(status);
        }

        self.shared.state.lock().settled = true;
        self.shared.settled.notify_all();
        true
    }

    /// Move to `status` that must be reachable.
    pub(crate) fn advance_checked(&self, status: CommandExecutionStatus) {
        let advanced = self.advance(status);
        kiln_core::kiln_slow_assert!(
            advanced,
            "Event of {:?} can't move to {:?}",
            self.shared.command_type,
            status
        );
        let _ = advanced;
    }
}

impl RawEvent for HostEvent {
    fn command_type(&self) -> CommandType {
        self.shared.command_type
    }

    fn status(&self) -> CommandExecutionStatus {
        self.shared.state.lock().status
    }

    fn wait(&self) -> CommandExecutionStatus {
        let mut state = self.shared.state.lock();
        while !state.settled {
            self.shared.settled.wait(&mut state);
        }
        state.status
    }

    fn profiling(&self) -> Result<ProfilingInfo, Error> {
        let state = self.shared.state.lock();
        if !self.shared.profiling || !state.status.is_complete() {
            return Err(Error::new(
                ErrorKind::ProfilingInfoNotAvailable,
                format!("{:?} event is {:?}", self.shared.command_type, state.status),
            ));
        }
        Ok(state.times)
    }

    fn on_terminal(&self, hook: TerminalHook) {
        let status = {
            let mut state = self.shared.state.lock();
            if !state.status.is_terminal() {
                state.hooks.push(hook);
                return;
            }
            state.status
        };
        hook(status);
    }

    fn set_user_status(&self, status: CommandExecutionStatus) -> Result<(), Error> {
        if !self.shared.user {
            return Err(Error::new(
                ErrorKind::InvalidEvent,
                format!("{:?} event is not a user event", self.shared.command_type),
            ));
        }
        if !status.is_terminal() || !self.advance(status) {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                "User event status can be set once to a terminal value",
            ));
        }
        Ok(())
    }
}
