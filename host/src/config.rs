use {
    kiln_core::{DeviceInfo, DeviceType},
    parking_lot::RwLock,
};

/// Devices the host backend enumerates and how it runs them.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-1", derive(serde::Serialize, serde::Deserialize))]
pub struct HostConfig {
    /// Capability records of enumerated devices.
    pub devices: Vec<DeviceInfo>,

    /// Worker threads of each out-of-order queue.
    pub workers: usize,
}

/// Capability record of the default host device.
pub fn default_device() -> DeviceInfo {
    DeviceInfo {
        name: "Kiln Host Device".into(),
        vendor: "kiln".into(),
        device_type: DeviceType::Cpu,
        compute_units: 4,
        max_mem_alloc_size: 64 << 20,
        global_mem_size: 256 << 20,
        local_mem_size: 32 << 10,
        max_work_group_size: 256,
        max_work_item_sizes: [256, 256, 256],
        preferred_work_group_size_multiple: 8,
        image_support: true,
        image2d_max_size: [8192, 8192],
        image3d_max_size: [2048, 2048, 2048],
        profiling_timer_resolution: 1,
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            devices: vec![default_device()],
            workers: 4,
        }
    }
}

lazy_static::lazy_static! {
    static ref CONFIG: RwLock<HostConfig> = RwLock::new(HostConfig::default());
}

impl HostConfig {
    /// Configuration used by the next enumeration.
    pub fn current() -> HostConfig {
        CONFIG.read().clone()
    }

    /// Replace configuration.
    /// Devices enumerated before keep their records.
    pub fn install(config: HostConfig) {
        log::debug!("Host backend configured with {} devices", config.devices.len());
        *CONFIG.write() = config;
    }
}
