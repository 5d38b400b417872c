//! Dependency-counting scheduler.
//!
//! Each admitted command becomes a node counting its unfinished dependencies.
//! Terminal hooks of dependencies count it down, and the last one pushes it
//! into the ready channel drained by the queue's worker threads.
//! Once the queue is dropped its parked nodes let go of the channel so the
//! workers can exit, and a node released after that runs on its own thread.

use {
    crate::{config::HostConfig, event::HostEvent, exec::execute, memory::HostMemory, Host},
    crossbeam_channel::{Receiver, Sender},
    kiln_core::{
        Command, CommandExecutionStatus, CommandType, ContextError, ContextNotify, Error,
        ErrorKind, HostRegion, MapIntent, Mapping, MemoryLocation, QueueProperties, RawEvent,
        RawQueue, Rect,
    },
    parking_lot::Mutex,
    std::{
        fmt,
        panic::{catch_unwind, AssertUnwindSafe},
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Arc, Weak,
        },
        thread,
        time::Instant,
    },
    thread_profiler::profile_scope,
};

struct Node {
    event: HostEvent,
    command: Mutex<Option<Command<Host>>>,
    remaining: AtomicUsize,
    failed: AtomicBool,
    sender: Mutex<Option<Sender<Arc<Node>>>>,
    notify: ContextNotify,
}

impl Node {
    /// Count down one dependency.
    fn release(self: &Arc<Self>, failed: bool) {
        if failed {
            self.failed.store(true, Ordering::Release);
        }
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.event.advance_checked(CommandExecutionStatus::Submitted);
            let sender = self.sender.lock().take();
            match sender {
                Some(sender) => {
                    if let Err(err) = sender.send(self.clone()) {
                        err.0.detach();
                    }
                }
                None => self.clone().detach(),
            }
        }
    }

    fn is_parked(&self) -> bool {
        self.remaining.load(Ordering::Acquire) > 0
    }

    /// Run on a dedicated thread once the queue's workers are gone.
    fn detach(self: Arc<Self>) {
        log::trace!(
            "{:?} is released after its queue, running detached",
            self.event.command_type()
        );
        let node = self.clone();
        let spawned = thread::Builder::new()
            .name("kiln-host-detached".to_owned())
            .spawn(move || run(&node));

        if let Err(err) = spawned {
            log::error!(
                "Failed to run {:?} after its queue was released: {}",
                self.event.command_type(),
                err
            );
            self.command.lock().take();
            self.event
                .advance_checked(CommandExecutionStatus::Error(ErrorKind::OutOfResources));
        }
    }
}

#[derive(Default)]
struct Order {
    last: Option<HostEvent>,
    barrier: Option<HostEvent>,
    pending: Vec<HostEvent>,
    parked: Vec<Weak<Node>>,
}

/// Queue of the host backend.
pub struct HostQueue {
    device: usize,
    properties: QueueProperties,
    clock: Instant,
    sender: Sender<Arc<Node>>,
    notify: ContextNotify,
    order: Mutex<Order>,
}

impl fmt::Debug for HostQueue {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("HostQueue")
            .field("device", &self.device)
            .field("properties", &self.properties)
            .finish()
    }
}

impl HostQueue {
    pub(crate) fn new(
        device: usize,
        properties: QueueProperties,
        clock: Instant,
        notify: ContextNotify,
    ) -> Result<Self, Error> {
        let workers = if properties.contains(QueueProperties::OUT_OF_ORDER_EXEC_MODE) {
            HostConfig::current().workers.max(1)
        } else {
            1
        };

        let (sender, receiver) = crossbeam_channel::unbounded();
        for index in 0..workers {
            let receiver = receiver.clone();
            thread::Builder::new()
                .name(format!("kiln-host-{}-{}", device, index))
                .spawn(move || work(receiver))
                .map_err(|err| {
                    Error::new(
                        ErrorKind::OutOfHostMemory,
                        format!("Failed to spawn queue worker: {}", err),
                    )
                })?;
        }

        log::debug!(
            "Host queue on device {} created with {} workers",
            device,
            workers
        );

        Ok(HostQueue {
            device,
            properties,
            clock,
            sender,
            notify,
            order: Mutex::new(Order::default()),
        })
    }

    /// Index of the device within the context.
    pub fn device(&self) -> usize {
        self.device
    }

    fn admit(
        &self,
        command_type: CommandType,
        command: Option<Command<Host>>,
        waits: &[HostEvent],
    ) -> HostEvent {
        profile_scope!("admit");

        let event = HostEvent::new(
            command_type,
            self.properties.contains(QueueProperties::PROFILING_ENABLE),
            self.clock,
        );

        let node = Arc::new(Node {
            event: event.clone(),
            command: Mutex::new(command),
            remaining: AtomicUsize::new(1),
            failed: AtomicBool::new(false),
            sender: Mutex::new(Some(self.sender.clone())),
            notify: self.notify.clone(),
        });

        let implicit: Vec<HostEvent> = {
            let mut order = self.order.lock();
            order.pending.retain(|event| !event.status().is_terminal());
            order
                .parked
                .retain(|node| node.upgrade().map_or(false, |node| node.is_parked()));
            order.parked.push(Arc::downgrade(&node));

            let everything = waits.is_empty()
                && (command_type == CommandType::Marker || command_type == CommandType::Barrier);

            let implicit = if everything {
                order.pending.clone()
            } else if self
                .properties
                .contains(QueueProperties::OUT_OF_ORDER_EXEC_MODE)
            {
                order.barrier.iter().cloned().collect()
            } else {
                order.last.iter().cloned().collect()
            };

            if command_type == CommandType::Barrier {
                order.barrier = Some(event.clone());
            }
            order.last = Some(event.clone());
            order.pending.push(event.clone());
            implicit
        };

        node.remaining
            .fetch_add(implicit.len() + waits.len(), Ordering::AcqRel);

        // Ordering after earlier commands doesn't inherit their failures.
        for dependency in implicit {
            let node = node.clone();
            dependency.on_terminal(Box::new(move |_| node.release(false)));
        }
        for dependency in waits {
            let node = node.clone();
            dependency.on_terminal(Box::new(move |status| node.release(!status.is_complete())));
        }
        node.release(false);

        event
    }
}

fn work(receiver: Receiver<Arc<Node>>) {
    for node in receiver {
        run(&node);
    }
    log::trace!("Host queue worker exits");
}

fn run(node: &Node) {
    profile_scope!("host_command");

    if node.failed.load(Ordering::Acquire) {
        node.command.lock().take();
        node.event
            .advance_checked(CommandExecutionStatus::Error(
                ErrorKind::ExecStatusErrorForEventsInWaitList,
            ));
        return;
    }

    node.event.advance_checked(CommandExecutionStatus::Running);
    let command = node.command.lock().take();

    let result = catch_unwind(AssertUnwindSafe(|| match &command {
        Some(command) => execute(command),
        None => Ok(()),
    }));
    drop(command);

    let status = match result {
        Ok(Ok(())) => CommandExecutionStatus::Complete,
        Ok(Err(kind)) => {
            log::debug!("{:?} failed with {}", node.event.command_type(), kind);
            CommandExecutionStatus::Error(kind)
        }
        Err(_) => {
            log::error!("{:?} panicked", node.event.command_type());
            (node.notify)(ContextError {
                kind: ErrorKind::OutOfResources,
                message: format!("{:?} panicked on a queue worker", node.event.command_type()),
            });
            CommandExecutionStatus::Error(ErrorKind::OutOfResources)
        }
    };
    node.event.advance_checked(status);
}

impl Drop for HostQueue {
    fn drop(&mut self) {
        let parked = std::mem::replace(&mut self.order.get_mut().parked, Vec::new());
        for node in parked.iter().filter_map(Weak::upgrade) {
            node.sender.lock().take();
        }
    }
}

impl RawQueue<Host> for HostQueue {
    fn submit(
        &self,
        command_type: CommandType,
        command: Command<Host>,
        waits: &[HostEvent],
    ) -> Result<HostEvent, Error> {
        let command = match command {
            Command::Marker | Command::Barrier => None,
            command => Some(command),
        };
        Ok(self.admit(command_type, command, waits))
    }

    fn map(
        &self,
        command_type: CommandType,
        memory: &Arc<HostMemory>,
        offset: usize,
        size: usize,
        _intent: MapIntent,
        waits: &[HostEvent],
    ) -> Result<(HostEvent, Mapping), Error> {
        match memory.location() {
            MemoryLocation::Host => {
                let event = self.admit(command_type, None, waits);
                let mapping = Mapping {
                    region: memory.region().clone(),
                    offset,
                };
                Ok((event, mapping))
            }
            MemoryLocation::Device => {
                let staging = HostRegion::new(size);
                let command = Command::Read {
                    src: memory.clone(),
                    dst: staging.clone(),
                    rect: Rect::linear(offset, 0, size),
                };
                let event = self.admit(command_type, Some(command), waits);
                let mapping = Mapping {
                    region: staging,
                    offset: 0,
                };
                Ok((event, mapping))
            }
        }
    }

    fn flush(&self) -> Result<(), Error> {
        // Nodes are handed to workers as soon as their dependencies finish.
        Ok(())
    }

    fn finish(&self) -> Result<(), Error> {
        profile_scope!("finish");

        // Commands admitted meanwhile stay pending for later markers and barriers.
        let pending = self.order.lock().pending.clone();
        for event in &pending {
            event.wait();
        }
        self.order
            .lock()
            .pending
            .retain(|event| !event.status().is_terminal());
        Ok(())
    }
}
