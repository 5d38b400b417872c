use {
    crate::event::Event,
    kiln_core::{Backend, Command, CommandType, ContextToken, Error, ErrorKind},
    smallvec::SmallVec,
};

/// Command with its wait list.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Submission<'a, B: Backend> {
    /// Type reported by the produced event.
    pub command_type: CommandType,

    /// Driver command.
    pub command: Command<B>,

    /// Events that must complete before the command starts.
    pub waits: &'a [Event<B>],
}

impl<'a, B> Submission<'a, B>
where
    B: Backend,
{
    /// Submission with empty wait list.
    pub fn new(command_type: CommandType, command: Command<B>) -> Self {
        Submission {
            command_type,
            command,
            waits: &[],
        }
    }

    /// Set wait list.
    pub fn wait(self, waits: &'a [Event<B>]) -> Self {
        Submission { waits, ..self }
    }
}

/// Raw events of the wait list.
/// Every event must belong to the live context `context`.
pub fn raw_waits<B: Backend>(
    waits: &[Event<B>],
    context: &ContextToken,
) -> Result<SmallVec<[B::Event; 8]>, Error> {
    waits
        .iter()
        .map(|event| {
            event.context().check()?;
            if event.context_id() != context.id() {
                return Err(Error::new(
                    ErrorKind::InvalidContext,
                    format!(
                        "Event of context {:?} used with context {:?}",
                        event.context_id(),
                        context.id()
                    ),
                ));
            }
            Ok(event.raw().clone())
        })
        .collect()
}
