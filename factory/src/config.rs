use kiln_core::QueueProperties;

/// Context configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Label used in logs.
    pub label: String,

    /// Properties of queues created with `Context::create_default_queue`.
    pub queue_properties: QueueProperties,

    /// Name of the thread delivering event callbacks and context errors.
    pub notifier_thread: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            label: "kiln".into(),
            queue_properties: QueueProperties::empty(),
            notifier_thread: "kiln-notifier".into(),
        }
    }
}

impl Config {
    /// Config with specified label.
    pub fn labeled(label: impl Into<String>) -> Self {
        Config {
            label: label.into(),
            ..Config::default()
        }
    }

    /// Set default queue properties.
    pub fn with_queue_properties(mut self, properties: QueueProperties) -> Self {
        self.queue_properties = properties;
        self
    }
}
