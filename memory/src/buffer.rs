use {crate::memory::MemoryKey, kiln_core::ContextId};

/// Buffer handle.
/// Valid until released through its context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Buffer {
    key: MemoryKey,
    context: ContextId,
}

kiln_core::context_owned!(Buffer @ |buffer: &Buffer| buffer.context);

impl Buffer {
    /// Wrap table key.
    pub fn new(key: MemoryKey, context: ContextId) -> Self {
        Buffer { key, context }
    }

    /// Table key.
    pub fn key(&self) -> MemoryKey {
        self.key
    }
}
