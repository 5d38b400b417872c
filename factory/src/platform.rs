use {
    kiln_core::{Backend, DeviceId, DeviceInfo, Error, PlatformId, RawPhysicalDevice},
    parking_lot::RwLock,
    std::{
        any::{Any, TypeId},
        collections::HashMap,
        sync::Arc,
    },
};

lazy_static::lazy_static! {
    static ref PLATFORMS: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>> =
        RwLock::new(HashMap::new());
}

/// Enumerated device of a platform.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct Device<B: Backend> {
    raw: B::PhysicalDevice,
    id: DeviceId,
}

impl<B> Device<B>
where
    B: Backend,
{
    /// Id of the device.
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Capability record.
    pub fn info(&self) -> &DeviceInfo {
        self.raw.info()
    }

    /// Raw device.
    pub fn raw(&self) -> &B::PhysicalDevice {
        &self.raw
    }
}

/// Devices of one backend.
///
/// Enumerated once and cached process-wide until `refresh` or `teardown`.
/// Contexts keep the devices they were created with.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Platform<B: Backend> {
    id: PlatformId,
    devices: Vec<Device<B>>,
}

impl<B> Platform<B>
where
    B: Backend,
{
    fn enumerate() -> Result<Arc<Self>, Error> {
        let id = PlatformId::new();
        let devices: Vec<_> = B::enumerate()?
            .into_iter()
            .enumerate()
            .map(|(index, raw)| Device {
                raw,
                id: DeviceId::new(index, id),
            })
            .collect();

        log::debug!(
            "Platform {:?} of backend `{}` enumerated: {:#?}",
            id,
            B::name(),
            devices.iter().map(Device::info).map(|info| &info.name).collect::<Vec<_>>()
        );

        Ok(Arc::new(Platform { id, devices }))
    }

    fn cached() -> Option<Arc<Self>> {
        PLATFORMS
            .read()
            .get(&TypeId::of::<B>())
            .cloned()
            .and_then(|any| any.downcast::<Self>().ok())
    }

    /// Cached platform, enumerating on first use.
    pub fn get() -> Result<Arc<Self>, Error> {
        if let Some(platform) = Self::cached() {
            return Ok(platform);
        }

        let mut platforms = PLATFORMS.write();
        if let Some(platform) = platforms
            .get(&TypeId::of::<B>())
            .cloned()
            .and_then(|any| any.downcast::<Self>().ok())
        {
            return Ok(platform);
        }

        let platform = Self::enumerate()?;
        platforms.insert(TypeId::of::<B>(), platform.clone());
        Ok(platform)
    }

    /// Enumerate again and replace cached platform.
    pub fn refresh() -> Result<Arc<Self>, Error> {
        let platform = Self::enumerate()?;
        PLATFORMS.write().insert(TypeId::of::<B>(), platform.clone());
        Ok(platform)
    }

    /// Forget cached platform.
    /// Returns `false` if nothing was cached.
    pub fn teardown() -> bool {
        let removed = PLATFORMS.write().remove(&TypeId::of::<B>()).is_some();
        if removed {
            log::debug!("Platform of backend `{}` torn down", B::name());
        }
        removed
    }

    /// Id of the platform.
    pub fn id(&self) -> PlatformId {
        self.id
    }

    /// Enumerated devices.
    pub fn devices(&self) -> &[Device<B>] {
        &self.devices
    }
}
