//! Registry for facility providers.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{FacilityKind, ProviderMeta};
use crate::ports::{FacilityPort, PortError};

/// Provider bundle for a single facility kind.
pub struct ProviderPlugin {
    /// Static metadata describing the provider.
    pub meta: ProviderMeta,
    /// Implementation performing the lookups.
    pub port: Arc<dyn FacilityPort>,
}

impl ProviderPlugin {
    /// Bundle a port with its own metadata.
    #[must_use]
    pub fn new(port: Arc<dyn FacilityPort>) -> Self {
        Self {
            meta: port.meta().clone(),
            port,
        }
    }
}

/// Registry that resolves providers by facility kind.
pub struct ProviderRegistry {
    plugins: HashMap<FacilityKind, ProviderPlugin>,
}

impl ProviderRegistry {
    /// Build a registry from the provided plugin list.
    ///
    /// A later plugin for the same kind replaces an earlier one.
    #[must_use]
    pub fn new(plugins: Vec<ProviderPlugin>) -> Self {
        let plugins_map = plugins
            .into_iter()
            .map(|plugin| (plugin.meta.kind, plugin))
            .collect();
        Self {
            plugins: plugins_map,
        }
    }

    /// Metadata for all registered providers.
    pub fn providers_iter(&self) -> impl Iterator<Item = &ProviderMeta> {
        self.plugins.values().map(|plugin| &plugin.meta)
    }

    /// Look up the provider for the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::UnsupportedKind`] when no provider is registered.
    pub fn plugin(&self, kind: FacilityKind) -> Result<&ProviderPlugin, PortError> {
        self.plugins.get(&kind).ok_or(PortError::UnsupportedKind)
    }
}
