//! Global state management for umbra.

use std::sync::{OnceLock, RwLock};

use glam::Vec3;

use crate::cache::ShadowCache;
use crate::error::{Result, UmbraError};
use crate::options::ShadowOptions;
use crate::registry::Registry;

/// Global context singleton.
static CONTEXT: OnceLock<RwLock<Context>> = OnceLock::new();

/// The global context containing all scene state.
#[derive(Default)]
pub struct Context {
    /// Whether umbra has been initialized.
    pub initialized: bool,

    /// Structures and lights.
    pub registry: Registry,

    /// Edge sets and volumes of the registered occluders.
    pub cache: ShadowCache,

    /// Global options.
    pub options: ShadowOptions,
}

impl Context {
    /// World-space bounding box of every enabled structure.
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        self.registry
            .iter()
            .filter(|(_, structure)| structure.is_enabled())
            .filter_map(|(_, structure)| structure.bounding_box())
            .reduce(|(min_a, max_a), (min_b, max_b)| (min_a.min(min_b), max_a.max(max_b)))
    }

    /// Representative length scale of the scene.
    pub fn length_scale(&self) -> f32 {
        self.bounding_box()
            .map_or(1.0, |(min, max)| (max - min).length().max(f32::EPSILON))
    }

    fn reset(&mut self) {
        self.registry.clear();
        self.cache.clear();
        self.options = ShadowOptions::default();
    }
}

/// Initializes the global context.
///
/// Fails if the context is already initialized. Initializing again after
/// [`shutdown_context`] starts from an empty scene.
pub fn init_context() -> Result<()> {
    let lock = CONTEXT.get_or_init(|| RwLock::new(Context::default()));
    let mut ctx = lock
        .write()
        .map_err(|_| UmbraError::Other("context lock poisoned".to_string()))?;
    if ctx.initialized {
        return Err(UmbraError::AlreadyInitialized);
    }
    ctx.reset();
    ctx.initialized = true;
    Ok(())
}

/// Returns whether the context has been initialized.
pub fn is_initialized() -> bool {
    CONTEXT
        .get()
        .and_then(|lock| lock.read().ok())
        .is_some_and(|ctx| ctx.initialized)
}

/// Access the global context for reading.
///
/// Fails if umbra has not been initialized.
pub fn with_context<F, R>(f: F) -> Result<R>
where
    F: FnOnce(&Context) -> R,
{
    let lock = CONTEXT.get().ok_or(UmbraError::NotInitialized)?;
    let guard = lock
        .read()
        .map_err(|_| UmbraError::Other("context lock poisoned".to_string()))?;
    if !guard.initialized {
        return Err(UmbraError::NotInitialized);
    }
    Ok(f(&guard))
}

/// Access the global context for writing.
///
/// Fails if umbra has not been initialized.
pub fn with_context_mut<F, R>(f: F) -> Result<R>
where
    F: FnOnce(&mut Context) -> R,
{
    let lock = CONTEXT.get().ok_or(UmbraError::NotInitialized)?;
    let mut guard = lock
        .write()
        .map_err(|_| UmbraError::Other("context lock poisoned".to_string()))?;
    if !guard.initialized {
        return Err(UmbraError::NotInitialized);
    }
    Ok(f(&mut guard))
}

/// Shuts down the global context, dropping every structure, light and
/// cached volume.
pub fn shutdown_context() {
    if let Some(lock) = CONTEXT.get() {
        if let Ok(mut ctx) = lock.write() {
            ctx.initialized = false;
            ctx.reset();
        }
    }
}
