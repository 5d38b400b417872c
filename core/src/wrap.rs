use {
    crate::error::{Error, ErrorKind},
    std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

fn next_id(counter: &AtomicUsize, what: &str) -> u32 {
    let id = counter.fetch_add(1, Ordering::Relaxed);
    assert!(
        id < usize::max_value() && (id as u64) < u32::max_value() as u64,
        "Too many {} created",
        what,
    );
    id as u32
}

/// Id of one enumeration of a backend's devices.
/// Refreshing the platform table produces a new id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct PlatformId {
    /// Unique id.
    pub id: u32,
}

impl PlatformId {
    /// Create new platform id.
    pub fn new() -> Self {
        static PLATFORM_ID: AtomicUsize = AtomicUsize::new(0);
        let id = next_id(&PLATFORM_ID, "platforms");

        if id == 0 {
            crate::kiln_with_slow_safety_checks!(
                log::info!("Slow safety checks are enabled! You can disable them in production by enabling the 'no-slow-safety-checks' feature!");
            );
        }

        PlatformId { id }
    }
}

/// Id of the device within a platform enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceId {
    /// Index of the device in enumeration order.
    pub index: u32,

    /// Enumeration that produced the device.
    pub platform: PlatformId,
}

impl DeviceId {
    /// Create new device id.
    pub fn new(index: usize, platform: PlatformId) -> Self {
        assert!((index as u64) < u32::max_value() as u64, "Too many devices");
        DeviceId {
            index: index as u32,
            platform,
        }
    }
}

/// Id of the context.
/// Every object created under a context carries it for validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId {
    /// Unique id.
    pub id: u32,
}

impl ContextId {
    /// Create new context id.
    pub fn new() -> Self {
        static CONTEXT_ID: AtomicUsize = AtomicUsize::new(0);
        ContextId {
            id: next_id(&CONTEXT_ID, "contexts"),
        }
    }
}

/// Liveness of the context, shared by every object created under it.
#[derive(Clone, Debug)]
pub struct ContextToken {
    id: ContextId,
    released: Arc<AtomicBool>,
}

impl ContextToken {
    /// Create token for new context.
    pub fn new() -> Self {
        ContextToken {
            id: ContextId::new(),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Id of the context.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Check if context was released.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Mark context released.
    /// Returns `false` if it already was.
    pub fn release(&self) -> bool {
        !self.released.swap(true, Ordering::AcqRel)
    }

    /// Fail with `InvalidContext` if context was released.
    pub fn check(&self) -> Result<(), Error> {
        if self.is_released() {
            Err(Error::new(
                ErrorKind::InvalidContext,
                format!("Context {} is released", self.id.id),
            ))
        } else {
            Ok(())
        }
    }
}

/// Implement ownership checks for a type that stores the id of its context.
#[macro_export]
macro_rules! context_owned {
    ($type:ident<B> @ $getter:expr) => {
        #[allow(unused_qualifications)]
        impl<B> $type<B>
        where
            B: $crate::Backend,
        {
            /// Get id of the context that owns this object.
            pub fn context_id(&self) -> $crate::ContextId {
                ($getter)(self)
            }

            /// Assert specified context is owner.
            pub fn assert_context_owner(&self, context: $crate::ContextId) {
                $crate::kiln_slow_assert_eq!(
                    self.context_id(),
                    context,
                    "Object used with a context that does not own it"
                );
            }
        }
    };

    ($type:ident @ $getter:expr) => {
        #[allow(unused_qualifications)]
        impl $type {
            /// Get id of the context that owns this object.
            pub fn context_id(&self) -> $crate::ContextId {
                ($getter)(self)
            }

            /// Assert specified context is owner.
            pub fn assert_context_owner(&self, context: $crate::ContextId) {
                $crate::kiln_slow_assert_eq!(
                    self.context_id(),
                    context,
                    "Object used with a context that does not own it"
                );
            }
        }
    };
}
