//! Initialization and lifecycle management for umbra.

use crate::{Result, ShadowOptions};

/// Initializes umbra with default options.
///
/// This must be called before any other umbra function. It also installs
/// `env_logger` if no logger is set yet.
///
/// # Errors
///
/// Returns an error if umbra has already been initialized.
pub fn init() -> Result<()> {
    let _ = env_logger::try_init();
    umbra_core::state::init_context()?;
    log::info!("umbra initialized");
    Ok(())
}

/// Returns whether umbra has been initialized.
#[must_use]
pub fn is_initialized() -> bool {
    umbra_core::state::is_initialized()
}

/// Shuts down umbra, dropping every structure, light and cached volume.
///
/// [`init()`] may be called again afterwards.
pub fn shutdown() {
    umbra_core::state::shutdown_context();
    log::info!("umbra shut down");
}

/// Returns a copy of the current options.
pub fn options() -> Result<ShadowOptions> {
    umbra_core::with_context(|ctx| ctx.options.clone())
}

/// Replaces the options. Renderers pick them up on their next frame.
pub fn set_options(options: ShadowOptions) -> Result<()> {
    umbra_core::with_context_mut(|ctx| ctx.options = options)
}
