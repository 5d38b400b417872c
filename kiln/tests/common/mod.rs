#![allow(dead_code)]

use kiln::{Config, Host, Kiln, QueueProperties};

pub fn init() -> Kiln<Host> {
    let _ = env_logger::builder().is_test(true).try_init();
    Kiln::init(Config::labeled("kiln-test")).unwrap()
}

pub fn init_with(properties: QueueProperties) -> Kiln<Host> {
    let _ = env_logger::builder().is_test(true).try_init();
    Kiln::init(Config::labeled("kiln-test").with_queue_properties(properties)).unwrap()
}

/// In-order and out-of-order queue properties.
pub const MODES: [QueueProperties; 2] = [
    QueueProperties::empty(),
    QueueProperties::OUT_OF_ORDER_EXEC_MODE,
];
