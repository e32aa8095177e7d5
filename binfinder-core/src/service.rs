//! High-level facade combining all facility providers.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::geo::{RankedFacility, rank_by_distance};
use crate::model::{Facility, FacilityKind, FacilityQuery};
use crate::plugin::ProviderRegistry;
use crate::ports::PortError;

/// Public entry point for facility lookups.
pub struct FacilityService {
    registry: Arc<ProviderRegistry>,
    timeout: Duration,
}

impl FacilityService {
    /// Create a new service bound to the provided registry.
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Facility kinds that have a registered provider.
    #[must_use]
    pub fn kinds(&self) -> Vec<FacilityKind> {
        self.registry
            .providers_iter()
            .map(|meta| meta.kind)
            .collect()
    }

    /// Query the provider for `kind`, bounded by the service timeout.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the kind is unsupported or the provider call fails.
    /// An elapsed timeout is reported as [`PortError::ProviderUnavailable`].
    pub async fn find(
        &self,
        kind: FacilityKind,
        query: &FacilityQuery,
    ) -> Result<Vec<Facility>, PortError> {
        let plugin = self.registry.plugin(kind)?;
        debug!(
            provider = %plugin.meta.name,
            radius_m = query.radius_meters,
            limit = query.limit,
            "querying facility provider"
        );

        let facilities = tokio::time::timeout(self.timeout, plugin.port.find(query))
            .await
            .map_err(|_elapsed| {
                warn!(provider = %plugin.meta.name, "provider call timed out");
                PortError::ProviderUnavailable(format!(
                    "{} did not answer within {:?}",
                    plugin.meta.name, self.timeout
                ))
            })??;

        debug!(provider = %plugin.meta.name, count = facilities.len(), "provider answered");
        Ok(facilities)
    }

    /// Find facilities and return the `top_n` nearest to the query origin.
    ///
    /// An empty vector means nothing was found within the radius.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the kind is unsupported or the provider call fails.
    pub async fn nearest(
        &self,
        kind: FacilityKind,
        query: &FacilityQuery,
        top_n: usize,
    ) -> Result<Vec<RankedFacility>, PortError> {
        let facilities = self.find(kind, query).await?;
        let mut ranked = rank_by_distance(query.coordinate, facilities);
        ranked.truncate(top_n.max(1));
        Ok(ranked)
    }
}
