use std::{collections::BTreeMap, fmt};

use tracing::debug;

use crate::{
    context::Context,
    error::{RuntimeError, RuntimeResult},
};

/// Per-frame game logic driven by the runtime after every engine has ticked.
pub trait Logic {
    /// Runs once when the module is added.
    fn startup(&mut self, _ctx: &Context) {}

    fn tick(&mut self, ctx: &Context, dt: f32);

    /// Runs once when the module is removed or the runtime shuts down.
    fn shutdown(&mut self, _ctx: &Context) {}
}

type Factory = Box<dyn Fn() -> Box<dyn Logic>>;

/// Stable keys mapped to [`Logic`] factories, filled by explicit registration at startup.
#[derive(Default)]
pub struct ModuleRegistry {
    factories: BTreeMap<String, Factory>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// [`RuntimeError::DuplicateModule`] when `key` is taken.
    pub fn register<L, F>(&mut self, key: impl Into<String>, factory: F) -> RuntimeResult<()>
    where
        L: Logic + 'static,
        F: Fn() -> L + 'static,
    {
        let key = key.into();
        if self.factories.contains_key(&key) {
            return Err(RuntimeError::DuplicateModule(key));
        }
        debug!(module = %key, "logic module registered");
        self.factories
            .insert(key, Box::new(move || Box::new(factory()) as Box<dyn Logic>));
        Ok(())
    }

    /// Builds a fresh instance of the module registered under `key`.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::UnknownModule`] when nothing is registered under `key`.
    pub fn create(&self, key: &str) -> RuntimeResult<Box<dyn Logic>> {
        self.factories
            .get(key)
            .map(|factory| factory())
            .ok_or_else(|| RuntimeError::UnknownModule(key.to_owned()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("keys", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
