use {
    kiln_core::{Backend, Error},
    kiln_factory::{CommandQueue, Config, Context, Platform},
    std::sync::Arc,
    thread_profiler::profile_scope,
};

/// Initialized kiln instance.
/// Create with `Kiln::init`.
///
/// Everything here can be constructed manually
/// when the context should span only some devices.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Kiln<B: Backend> {
    /// Platform the devices come from.
    pub platform: Arc<Platform<B>>,

    /// Context over every device of the platform.
    pub context: Context<B>,

    /// Queue on the first device, created with configured properties.
    pub queue: CommandQueue<B>,
}

impl<B> Kiln<B>
where
    B: Backend,
{
    /// Enumerate the backend, create context over all its devices
    /// and a queue on the first one.
    pub fn init(config: Config) -> Result<Self, Error> {
        profile_scope!("kiln_init");

        let platform = Platform::<B>::get()?;
        log::info!(
            "Initializing kiln with backend `{}` over {} devices",
            B::name(),
            platform.devices().len()
        );

        let context = Context::new(platform.devices(), config)?;
        let queue = context.create_default_queue(0)?;

        Ok(Kiln {
            platform,
            context,
            queue,
        })
    }
}
