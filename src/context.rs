//! Application-wide configuration context.
//!
//! The context resolves configuration exactly once and hands every
//! collaborator a [`ConfigHandle`] to the same [`ConfigService`]. Later
//! initialization calls return the existing handle; if they carry new input it
//! is ignored with a warning. [`ConfigContext::reset`] clears the slot for
//! test isolation.
//!
//! ```
//! use strata::env::MockEnv;
//! use strata::schema::{integer, object};
//! use strata::{ConfigContext, Input, Resolver, Value};
//!
//! let schema = object([("basic", object([("listenPort", integer().default(3000))]).default(Value::table()))]);
//! let context = ConfigContext::new(Resolver::new(schema));
//! let env = MockEnv::new();
//!
//! let first = context.initialize_with_env(&env, None).unwrap();
//! let second = context
//!     .initialize_with_env(&env, Some(Input::partial().set("basic.listenPort", 1).build()))
//!     .unwrap();
//!
//! assert!(first.ptr_eq(&second));
//! assert_eq!(second.read().get("basic.listenPort"), Some(&Value::Integer(3000)));
//! ```

use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::env::{ConfigEnv, RealEnv};
use crate::error::ConfigErrors;
use crate::resolver::Resolver;
use crate::service::ConfigService;
use crate::sources::Input;

/// Shared handle to the process configuration.
///
/// Reads take a shared lock; `set` calls go through [`ConfigHandle::write`].
#[derive(Debug, Clone)]
pub struct ConfigHandle(Arc<RwLock<ConfigService>>);

impl ConfigHandle {
    pub fn new(service: ConfigService) -> Self {
        Self(Arc::new(RwLock::new(service)))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, ConfigService> {
        self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, ConfigService> {
        self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether both handles point at the same configuration.
    pub fn ptr_eq(&self, other: &ConfigHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Initialize-once owner of the configuration handle.
#[derive(Debug)]
pub struct ConfigContext {
    resolver: Resolver,
    slot: Mutex<Option<ConfigHandle>>,
}

impl ConfigContext {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            slot: Mutex::new(None),
        }
    }

    /// Resolve against the real environment on first call.
    pub fn initialize(&self, input: Option<Input>) -> Result<ConfigHandle, ConfigErrors> {
        self.initialize_with_env(&RealEnv::new(), input)
    }

    /// Resolve on first call; afterwards return the same handle.
    ///
    /// A failed resolution leaves the context uninitialized, so a later call
    /// may retry.
    pub fn initialize_with_env(
        &self,
        env: &dyn ConfigEnv,
        input: Option<Input>,
    ) -> Result<ConfigHandle, ConfigErrors> {
        let mut slot = self.lock();

        if let Some(handle) = slot.as_ref() {
            if input.is_some() {
                warn!("configuration already initialized; ignoring new input");
            } else {
                debug!("configuration already initialized");
            }
            return Ok(handle.clone());
        }

        let resolved = self.resolver.resolve_with_env(env, input)?;
        let handle = ConfigHandle::new(resolved.into_service());
        *slot = Some(handle.clone());
        info!("configuration initialized");
        Ok(handle)
    }

    /// The handle, if initialized.
    pub fn handle(&self) -> Option<ConfigHandle> {
        self.lock().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    /// Drop the current configuration so the next call re-resolves.
    ///
    /// Handles already given out keep pointing at the old configuration.
    pub fn reset(&self) {
        *self.lock() = None;
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    fn lock(&self) -> MutexGuard<'_, Option<ConfigHandle>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MockEnv;
    use crate::schema::{integer, object, string};
    use crate::value::Value;

    fn context() -> ConfigContext {
        let schema = object([
            ("name", string()),
            ("port", integer().default(3000).coerce()),
        ]);
        ConfigContext::new(Resolver::new(schema).env_prefix("XNTHA"))
    }

    fn input(name: &str) -> Option<Input> {
        Some(Input::partial().set("name", name).build())
    }

    #[test]
    fn test_first_initialization_wins() {
        let ctx = context();
        let env = MockEnv::new();
        assert!(!ctx.is_initialized());

        let first = ctx.initialize_with_env(&env, input("first")).unwrap();
        let second = ctx.initialize_with_env(&env, input("second")).unwrap();

        assert!(first.ptr_eq(&second));
        assert_eq!(second.read().get("name"), Some(&Value::from("first")));
        assert!(ctx.handle().map(|h| h.ptr_eq(&first)).unwrap_or(false));
    }

    #[test]
    fn test_failed_initialization_can_retry() {
        let ctx = context();
        let env = MockEnv::new();

        assert!(ctx.initialize_with_env(&env, None).is_err());
        assert!(!ctx.is_initialized());

        assert!(ctx.initialize_with_env(&env, input("ok")).is_ok());
        assert!(ctx.is_initialized());
    }

    #[test]
    fn test_reset_allows_reinitialization() {
        let ctx = context();
        let env = MockEnv::new();
        let first = ctx.initialize_with_env(&env, input("first")).unwrap();

        ctx.reset();
        assert!(ctx.handle().is_none());

        let second = ctx.initialize_with_env(&env, input("second")).unwrap();
        assert!(!first.ptr_eq(&second));
        assert_eq!(second.read().get("name"), Some(&Value::from("second")));
        assert_eq!(first.read().get("name"), Some(&Value::from("first")));
    }

    #[test]
    fn test_writes_are_shared() {
        let ctx = context();
        let handle = ctx.initialize_with_env(&MockEnv::new(), input("app")).unwrap();
        handle.write().set("port", 9090, true).unwrap();

        let other = ctx.handle().unwrap();
        assert_eq!(other.read().get("port"), Some(&Value::Integer(9090)));
    }
}
