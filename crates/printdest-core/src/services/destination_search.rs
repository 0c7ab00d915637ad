//! UI-facing driver that turns user gestures into store operations.

use std::sync::Arc;

use tracing::debug;

use crate::domain::{Destination, DestinationId};
use crate::ports::StoreError;
use crate::settings::SelectionPolicy;

use super::destination_store::{DestinationStore, SelectionOutcome};

/// Destination search controller.
///
/// Holds no state of its own; every call goes through the shared store.
#[derive(Clone)]
pub struct DestinationSearch {
    store: Arc<DestinationStore>,
}

impl DestinationSearch {
    pub const fn new(store: Arc<DestinationStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<DestinationStore> {
        &self.store
    }

    /// Feed a discovered destination list to the store.
    pub async fn update_destinations(&self, destinations: Vec<Destination>) {
        self.store.update_destinations(destinations).await;
    }

    /// The user picked a destination from the list.
    pub async fn handle_destination_select(&self, destination: Destination) -> SelectionOutcome {
        self.store.select_destination(destination).await
    }

    /// The user picked a destination that needs configuring first.
    pub async fn handle_configure_destination(&self, destination: Destination) -> SelectionOutcome {
        self.store.configure_destination(destination).await
    }

    /// Activate a known destination by id, picking the flow it needs.
    ///
    /// Under the gated policy, destinations that require setup and have no
    /// capabilities go through the configure flow.
    pub async fn activate(&self, id: &DestinationId) -> Result<SelectionOutcome, StoreError> {
        let destination = self
            .store
            .destination(id)
            .await
            .ok_or_else(|| StoreError::UnknownDestination(id.clone()))?;

        let needs_setup = self.store.policy() == SelectionPolicy::Gated
            && destination.requires_setup()
            && !destination.has_capabilities();
        debug!(
            target: "printdest.store",
            destination_id = %id,
            needs_setup,
            "Activating destination"
        );

        let outcome = if needs_setup {
            self.handle_configure_destination(destination).await
        } else {
            self.handle_destination_select(destination).await
        };
        Ok(outcome)
    }
}
