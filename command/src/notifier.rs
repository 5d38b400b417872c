use {
    crossbeam_channel::{unbounded, Sender},
    kiln_core::{Error, ErrorKind},
    std::{
        any::Any,
        fmt,
        panic::{catch_unwind, AssertUnwindSafe},
        thread,
    },
};

type Job = Box<dyn FnOnce() + Send>;

/// Delivers callbacks on a dedicated thread.
///
/// Jobs run one at a time in posting order.
/// The thread exits once every handle is dropped and the queue is drained.
#[derive(Clone)]
pub struct Notifier {
    sender: Sender<Job>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Notifier")
            .field("pending", &self.sender.len())
            .finish()
    }
}

fn describe(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}

impl Notifier {
    /// Spawn notifier thread.
    pub fn new(name: &str) -> Result<Self, Error> {
        let (sender, receiver) = unbounded::<Job>();

        thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                for job in receiver {
                    if let Err(panic) = catch_unwind(AssertUnwindSafe(job)) {
                        log::error!("Callback panicked: {}", describe(&*panic));
                    }
                }
                log::trace!("Notifier thread exits");
            })
            .map_err(|err| {
                Error::new(
                    ErrorKind::OutOfHostMemory,
                    format!("Failed to spawn notifier thread: {}", err),
                )
            })?;

        Ok(Notifier { sender })
    }

    /// Queue job for delivery.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) {
        if self.sender.send(Box::new(job)).is_err() {
            log::warn!("Notifier thread is gone, callback dropped");
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{sync::mpsc, time::Duration};

    #[test]
    fn delivers_in_order_on_other_thread() {
        let notifier = Notifier::new("test-notifier").unwrap();
        let (tx, rx) = mpsc::channel();
        let caller = thread::current().id();

        for index in 0..4 {
            let tx = tx.clone();
            notifier.post(move || {
                tx.send((index, thread::current().id())).unwrap();
            });
        }

        for expected in 0..4 {
            let (index, id) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(index, expected);
            assert_ne!(id, caller);
        }
    }

    #[test]
    fn survives_panicking_job() {
        let notifier = Notifier::new("test-notifier").unwrap();
        let (tx, rx) = mpsc::channel();
        notifier.post(|| panic!("boom"));
        notifier.post(move || tx.send(()).unwrap());
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }
}
