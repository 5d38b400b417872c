//! Events, callback delivery and queue submission.

#![warn(
    missing_debug_implementations,
    missing_copy_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications
)]

mod event;
mod notifier;
mod queue;
mod submission;

pub use crate::{
    event::{wait_for_events, Event, UserEvent},
    notifier::Notifier,
    queue::{Queue, QueueId},
    submission::{raw_waits, Submission},
};
