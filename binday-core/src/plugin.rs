//! Registry for all council plugins and their ports.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::model::{CouncilId, CouncilMeta, ResolvedAddress, ResultSet};
use crate::ports::{AddressPort, AddressQuery, PortError, SchedulePort};

/// Collection of ports implementing a provider for a single council.
pub struct CouncilPlugin {
    /// Static metadata describing the council.
    pub meta: CouncilMeta,
    /// Implementation for resolving addresses.
    pub address_port: Arc<dyn AddressPort>,
    /// Implementation for fetching collection schedules.
    pub schedule_port: Arc<dyn SchedulePort>,
}

impl CouncilPlugin {
    /// Resolve the query's address, failing when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::AddressNotFound`] when no address matches, or the
    /// provider's error when the lookup request fails.
    pub async fn resolve_address(
        &self,
        query: &AddressQuery,
    ) -> Result<ResolvedAddress, PortError> {
        let Some(address) = self.address_port.resolve(query).await? else {
            warn!(
                council = %self.meta.id,
                postcode = %query.postcode,
                house_number = %query.house_number,
                "no matching address"
            );
            return Err(query.not_found());
        };

        debug!(council = %self.meta.id, uprn = address.uprn(), "resolved address");
        Ok(address)
    }

    /// Validate the input, resolve the address, then fetch its collections.
    ///
    /// The schedule request is only made once the address is known.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidInput`] without touching the network when the
    /// input is rejected, [`PortError::AddressNotFound`] when the house number is
    /// not at the postcode, or the provider's error when a request fails.
    pub async fn fetch_bins(
        &self,
        postcode: Option<&str>,
        house_number: Option<&str>,
    ) -> Result<ResultSet, PortError> {
        let query = AddressQuery::new(postcode, house_number)?;
        let address = self.resolve_address(&query).await?;
        let bins = self.schedule_port.schedule(&address).await?;

        debug!(council = %self.meta.id, collections = bins.len(), "fetched collections");
        Ok(bins)
    }
}

/// Registry that resolves plugins by council identifier.
pub struct PluginRegistry {
    plugins: HashMap<CouncilId, CouncilPlugin>,
}

impl PluginRegistry {
    /// Build a registry from the provided plugin list.
    #[must_use]
    pub fn new(plugins: Vec<CouncilPlugin>) -> Self {
        let plugins_map = plugins
            .into_iter()
            .map(|plugin| (plugin.meta.id.clone(), plugin))
            .collect();
        Self {
            plugins: plugins_map,
        }
    }

    /// Return metadata for all registered councils, sorted by id.
    #[must_use]
    pub fn councils(&self) -> Vec<CouncilMeta> {
        let mut councils: Vec<CouncilMeta> = self
            .plugins
            .values()
            .map(|plugin| plugin.meta.clone())
            .collect();
        councils.sort_by(|left, right| left.id.0.cmp(&right.id.0));
        councils
    }

    /// Look up a plugin for the given council.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::UnsupportedCouncil`] when no plugin is registered.
    pub fn plugin(&self, council: &CouncilId) -> Result<&CouncilPlugin, PortError> {
        self.plugins
            .get(council)
            .ok_or_else(|| PortError::UnsupportedCouncil(council.clone()))
    }
}
