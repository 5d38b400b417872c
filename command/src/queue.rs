use {
    crate::{
        event::Event,
        notifier::Notifier,
        submission::{raw_waits, Submission},
    },
    kiln_core::{
        Backend, CommandExecutionStatus, CommandType, ContextId, ContextToken, Error, MapIntent,
        Mapping, QueueProperties, RawEvent, RawQueue,
    },
    parking_lot::Mutex,
    std::sync::Arc,
    thread_profiler::profile_scope,
};

/// Queue id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueId {
    /// Context the queue belongs to.
    pub context: ContextId,

    /// Index of the queue within the context.
    pub index: u32,
}

/// Queue wrapper.
///
/// Tracks admitted commands until the next `finish`
/// so that failures of commands without kept events are still reported there.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Queue<B: Backend> {
    raw: B::Queue,
    id: QueueId,
    device: usize,
    properties: QueueProperties,
    context: ContextToken,
    #[derivative(Debug = "ignore")]
    notifier: Notifier,
    /// Next epoch. Held while the raw queue admits a command.
    next_epoch: Mutex<u64>,
    #[derivative(Debug = "ignore")]
    pending: Mutex<Vec<(u64, Event<B>)>>,
}

impl<B> Queue<B>
where
    B: Backend,
{
    /// Wrap raw queue.
    pub fn new(
        raw: B::Queue,
        id: QueueId,
        device: usize,
        properties: QueueProperties,
        context: ContextToken,
        notifier: Notifier,
    ) -> Self {
        Queue {
            raw,
            id,
            device,
            properties,
            context,
            notifier,
            next_epoch: Mutex::new(0),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Id of the queue.
    pub fn id(&self) -> QueueId {
        self.id
    }

    /// Index of the device within the context.
    pub fn device(&self) -> usize {
        self.device
    }

    /// Queue properties.
    pub fn properties(&self) -> QueueProperties {
        self.properties
    }

    /// Returns next queue epoch.
    pub fn next_epoch(&self) -> u64 {
        *self.next_epoch.lock()
    }

    /// Raw queue.
    pub fn raw(&self) -> &B::Queue {
        &self.raw
    }

    /// Run `admit` against the raw queue and stamp the admitted command
    /// with the next epoch, so epochs follow admission order.
    fn admit<T>(
        &self,
        admit: impl FnOnce(&B::Queue) -> Result<(B::Event, T), Error>,
    ) -> Result<(Event<B>, T), Error> {
        let mut next_epoch = self.next_epoch.lock();
        let (raw, extra) = admit(&self.raw)?;
        let epoch = *next_epoch;
        *next_epoch += 1;
        Ok((self.track(epoch, raw), extra))
    }

    fn track(&self, epoch: u64, raw: B::Event) -> Event<B> {
        let event = Event::new(raw, self.context.clone(), self.notifier.clone());
        log::trace!(
            "Admitted {:?} at epoch {} of queue {:?}",
            event.command_type(),
            epoch,
            self.id
        );

        let mut pending = self.pending.lock();
        pending.retain(|(_, event)| !event.raw().status().is_complete());
        pending.push((epoch, event.clone()));
        event
    }

    /// Admit command.
    pub fn submit(&self, submission: Submission<'_, B>) -> Result<Event<B>, Error> {
        profile_scope!("submit");
        self.context.check()?;
        let waits = raw_waits(submission.waits, &self.context)?;
        let (event, ()) = self.admit(|raw| {
            let event = raw.submit(submission.command_type, submission.command, &waits)?;
            Ok((event, ()))
        })?;
        Ok(event)
    }

    /// Admit mapping.
    pub fn map(
        &self,
        command_type: CommandType,
        memory: &Arc<B::Memory>,
        offset: usize,
        size: usize,
        intent: MapIntent,
        waits: &[Event<B>],
    ) -> Result<(Event<B>, Mapping), Error> {
        profile_scope!("map");
        self.context.check()?;
        let waits = raw_waits(waits, &self.context)?;
        self.admit(|raw| raw.map(command_type, memory, offset, size, intent, &waits))
    }

    /// Push admitted commands toward the device.
    pub fn flush(&self) -> Result<(), Error> {
        self.context.check()?;
        self.raw.flush()
    }

    /// Block until every admitted command is terminal.
    /// Returns the first failure among commands admitted since the previous call.
    pub fn finish(&self) -> Result<(), Error> {
        profile_scope!("finish");
        self.context.check()?;
        self.raw.finish()?;

        let pending = std::mem::replace(&mut *self.pending.lock(), Vec::new());
        let failed = pending
            .iter()
            .filter_map(|(epoch, event)| match event.raw().wait() {
                CommandExecutionStatus::Error(kind) => Some((*epoch, event.command_type(), kind)),
                _ => None,
            })
            .min_by_key(|(epoch, _, _)| *epoch);

        match failed {
            Some((epoch, command_type, kind)) => Err(Error::new(
                kind,
                format!("{:?} admitted at epoch {} failed", command_type, epoch),
            )),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::event::UserEvent,
        kiln_core::{Command, RawContext},
        kiln_host::Host,
        std::{sync::mpsc, thread, time::Duration},
    };

    #[test]
    fn epochs_follow_admission_order() {
        let context = Host::create_context(Host::enumerate().unwrap(), Arc::new(|_| {})).unwrap();
        let token = ContextToken::new();
        let notifier = Notifier::new("kiln-test-notifier").unwrap();
        let queue = Arc::new(Queue::<Host>::new(
            context.create_queue(0, QueueProperties::empty()).unwrap(),
            QueueId {
                context: token.id(),
                index: 0,
            },
            0,
            QueueProperties::empty(),
            token.clone(),
            notifier.clone(),
        ));

        // Nothing runs before the gate opens, so every command is still pending below.
        let gate = UserEvent::<Host>::new(
            context.create_user_event().unwrap(),
            token.clone(),
            notifier.clone(),
        );
        let waits = [gate.event().clone()];
        queue
            .submit(Submission::new(CommandType::Marker, Command::Marker).wait(&waits))
            .unwrap();

        let (tx, rx) = mpsc::channel();
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let queue = queue.clone();
                let tx = tx.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        let event = queue
                            .submit(Submission::new(CommandType::Marker, Command::Marker))
                            .unwrap();
                        let tx = tx.clone();
                        event
                            .set_callback(move |event, _| tx.send(event.clone()).unwrap())
                            .unwrap();
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        let mut admitted = queue.pending.lock().clone();
        admitted.sort_by_key(|(epoch, _)| *epoch);
        assert_eq!(admitted.len(), 201);
        assert_eq!(queue.next_epoch(), 201);

        gate.complete().unwrap();

        // In-order execution reports completions in the order the driver admitted them.
        for (_, expected) in &admitted[1..] {
            let completed = rx.recv_timeout(Duration::from_secs(10)).unwrap();
            assert!(completed.same(expected));
        }
        queue.finish().unwrap();
    }
}
