// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use civireg_binder::ResidentLookup;
use civireg_core::RegistryError;
use civireg_model::{Resident, ResidentId};
use civireg_registry::Registry;
use std::sync::Arc;

/// Bridges the synchronous registry into the binder's async lookup port.
/// Directory reads are short single-row or LIKE queries, so they run on a
/// blocking worker rather than holding the async executor.
pub struct RegistryDirectory {
    registry: Arc<Registry>,
}

impl RegistryDirectory {
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ResidentLookup for RegistryDirectory {
    async fn search(&self, term: &str) -> Result<Vec<Resident>, RegistryError> {
        let registry = self.registry.clone();
        let term = term.to_string();
        tokio::task::spawn_blocking(move || registry.search_residents(&term))
            .await
            .map_err(|err| RegistryError::storage(err.to_string()))?
    }

    async fn get_by_id(&self, id: &ResidentId) -> Result<Resident, RegistryError> {
        let registry = self.registry.clone();
        let id = id.clone();
        tokio::task::spawn_blocking(move || registry.get_resident(&id))
            .await
            .map_err(|err| RegistryError::storage(err.to_string()))?
    }
}
