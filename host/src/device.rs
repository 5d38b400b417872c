use {
    kiln_core::{DeviceInfo, RawPhysicalDevice},
    std::{sync::Arc, time::Instant},
};

/// Host device.
/// Timestamps are nanoseconds since enumeration.
#[derive(Clone, Debug)]
pub struct HostPhysicalDevice {
    info: Arc<DeviceInfo>,
    clock: Instant,
}

impl HostPhysicalDevice {
    pub(crate) fn new(info: DeviceInfo) -> Self {
        HostPhysicalDevice {
            info: Arc::new(info),
            clock: Instant::now(),
        }
    }

    pub(crate) fn clock(&self) -> Instant {
        self.clock
    }
}

impl RawPhysicalDevice for HostPhysicalDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }
}

pub(crate) fn nanos_since(clock: Instant) -> u64 {
    let elapsed = clock.elapsed();
    elapsed.as_secs() * 1_000_000_000 + u64::from(elapsed.subsec_nanos())
}
