use crate::error::ErrorKind;

/// Execution status of the command an event tracks.
///
/// Advances monotonically `Queued -> Submitted -> Running -> Complete`
/// or jumps to a terminal `Error` from any non-terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandExecutionStatus {
    /// Command is admitted to the queue.
    Queued,

    /// Command is submitted to the device.
    Submitted,

    /// Command is executing.
    Running,

    /// Command has finished successfully.
    Complete,

    /// Command has terminated abnormally.
    Error(ErrorKind),
}

impl CommandExecutionStatus {
    /// Driver status code.
    pub fn code(&self) -> i32 {
        match *self {
            CommandExecutionStatus::Complete => 0,
            CommandExecutionStatus::Running => 1,
            CommandExecutionStatus::Submitted => 2,
            CommandExecutionStatus::Queued => 3,
            CommandExecutionStatus::Error(kind) => kind.code(),
        }
    }

    /// Decode driver status code.
    /// Unknown positive codes are treated as `Queued`.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => CommandExecutionStatus::Complete,
            1 => CommandExecutionStatus::Running,
            2 => CommandExecutionStatus::Submitted,
            code => match ErrorKind::from_code(code) {
                Some(kind) => CommandExecutionStatus::Error(kind),
                None => CommandExecutionStatus::Queued,
            },
        }
    }

    /// Position in the state machine.
    /// Both terminal states share the highest rank.
    pub fn rank(&self) -> u8 {
        match *self {
            CommandExecutionStatus::Queued => 0,
            CommandExecutionStatus::Submitted => 1,
            CommandExecutionStatus::Running => 2,
            CommandExecutionStatus::Complete | CommandExecutionStatus::Error(_) => 3,
        }
    }

    /// Check if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        self.rank() == 3
    }

    /// Check if command has finished successfully.
    pub fn is_complete(&self) -> bool {
        *self == CommandExecutionStatus::Complete
    }

    /// Get error if command has terminated abnormally.
    pub fn error(&self) -> Option<ErrorKind> {
        match *self {
            CommandExecutionStatus::Error(kind) => Some(kind),
            _ => None,
        }
    }

    /// Check if transition into `next` is allowed.
    pub fn can_advance_to(&self, next: Self) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}
