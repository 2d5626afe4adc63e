//! High-level service facade combining all council providers.

use std::sync::Arc;

use crate::model::{CouncilId, ResolvedAddress, ResultSet};
use crate::plugin::PluginRegistry;
use crate::ports::{AddressQuery, PortError};

/// Public entry point for resolving addresses and bin collections.
pub struct BinService {
    registry: Arc<PluginRegistry>,
}

impl BinService {
    /// Create a new service bound to the provided registry.
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    /// List all available councils and their display names.
    #[must_use]
    pub fn councils(&self) -> Vec<(CouncilId, String)> {
        self.registry
            .councils()
            .into_iter()
            .map(|meta| (meta.id, meta.name))
            .collect()
    }

    /// Resolve the address token for a postcode and house number.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the input is invalid, the council is
    /// unsupported, no address matches, or the provider call fails.
    pub async fn resolve_address(
        &self,
        council: &CouncilId,
        postcode: Option<&str>,
        house_number: Option<&str>,
    ) -> Result<ResolvedAddress, PortError> {
        let query = AddressQuery::new(postcode, house_number)?;
        let plugin = self.registry.plugin(council)?;
        plugin.resolve_address(&query).await
    }

    /// Load the collection schedule for a postcode and house number.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] if the input is invalid, the council is
    /// unsupported, no address matches, or a provider request fails.
    pub async fn bins_for(
        &self,
        council: &CouncilId,
        postcode: Option<&str>,
        house_number: Option<&str>,
    ) -> Result<ResultSet, PortError> {
        let plugin = self.registry.plugin(council)?;
        plugin.fetch_bins(postcode, house_number).await
    }
}
