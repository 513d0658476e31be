//! Decoder registry
//!
//! Maps section names to decoder factories. The registry itself holds no
//! decoder instances; [`DecoderRegistry::instantiate`] builds a fresh
//! [`DecoderSet`] for every scrape.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{BlockDeviceIo, FilesystemUsage, SubsystemDecoder};
use crate::error::{DecoderError, DecoderResult};

/// Builds one decoder instance
pub type DecoderFactory =
    Arc<dyn Fn() -> DecoderResult<Box<dyn SubsystemDecoder>> + Send + Sync>;

/// Process-wide table of decoder factories, keyed by section name
#[derive(Clone, Default)]
pub struct DecoderRegistry {
    factories: BTreeMap<String, DecoderFactory>,
}

impl std::fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("subsystems", &self.subsystems().collect::<Vec<_>>())
            .finish()
    }
}

impl DecoderRegistry {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `df` and `diskstat` decoders
    #[must_use]
    pub fn builtin() -> Self {
        Self::new()
            .with(super::df::SUBSYSTEM, FilesystemUsage::factory)
            .with(super::diskstat::SUBSYSTEM, BlockDeviceIo::factory)
    }

    /// Registers a factory, replacing any previous one for `subsystem`
    pub fn register<F>(&mut self, subsystem: impl Into<String>, factory: F)
    where
        F: Fn() -> DecoderResult<Box<dyn SubsystemDecoder>> + Send + Sync + 'static,
    {
        let subsystem = subsystem.into();
        tracing::debug!(subsystem = %subsystem, "Registered decoder");
        self.factories.insert(subsystem, Arc::new(factory));
    }

    /// Builder form of [`register`](Self::register)
    #[must_use]
    pub fn with<F>(mut self, subsystem: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> DecoderResult<Box<dyn SubsystemDecoder>> + Send + Sync + 'static,
    {
        self.register(subsystem, factory);
        self
    }

    /// Registered section names in sorted order
    pub fn subsystems(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Returns true if a factory is registered for `subsystem`
    #[must_use]
    pub fn contains(&self, subsystem: &str) -> bool {
        self.factories.contains_key(subsystem)
    }

    /// Number of registered factories
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Runs every factory once.
    ///
    /// A failing factory is logged and left out of the set; the other
    /// decoders are unaffected.
    #[must_use]
    pub fn instantiate(&self) -> DecoderSet {
        let mut set = DecoderSet::default();
        for (name, factory) in &self.factories {
            match factory() {
                Ok(decoder) => {
                    set.decoders.insert(name.clone(), Arc::from(decoder));
                }
                Err(e) => {
                    tracing::error!(subsystem = %name, error = %e, "Decoder factory failed");
                    set.failed.push((name.clone(), e));
                }
            }
        }
        set
    }
}

/// Decoder instances for a single scrape
#[derive(Default)]
pub struct DecoderSet {
    decoders: BTreeMap<String, Arc<dyn SubsystemDecoder>>,
    failed: Vec<(String, DecoderError)>,
}

impl DecoderSet {
    /// Returns the decoder registered for `subsystem`
    #[must_use]
    pub fn get(&self, subsystem: &str) -> Option<Arc<dyn SubsystemDecoder>> {
        self.decoders.get(subsystem).cloned()
    }

    /// Returns true if a decoder was built for `subsystem`
    #[must_use]
    pub fn contains(&self, subsystem: &str) -> bool {
        self.decoders.contains_key(subsystem)
    }

    /// Decoders with the name they were registered under
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn SubsystemDecoder>)> {
        self.decoders.iter().map(|(name, d)| (name.as_str(), d))
    }

    /// Number of decoders that were built
    #[must_use]
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Returns true if no decoder was built
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Factories that failed, with their errors
    #[must_use]
    pub fn failed(&self) -> &[(String, DecoderError)] {
        &self.failed
    }
}
