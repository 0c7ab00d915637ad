//! `simulate` command handler.
//!
//! Replays a scenario against a [`ScriptedTransport`], collecting every
//! store event emitted along the way.

use std::sync::Arc;

use printdest_core::{
    Destination, DestinationId, DestinationStore, FetchDecision, SelectionOutcome,
    SelectionPolicy, StoreError, StoreEvent, TransportEvent,
};
use printdest_runtime::{PrintSession, ScriptedTransport, transport_channel};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::error::CliError;
use crate::scenario::{Action, Scenario};

/// Result of one replayed action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRecord {
    pub action: Action,
    pub result: String,
    /// Store events emitted while the action settled.
    pub events: Vec<StoreEvent>,
}

/// Everything a simulation produced.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub policy: SelectionPolicy,
    pub actions: Vec<ActionRecord>,
    pub selected: Option<Destination>,
    pub fetch_calls: usize,
    pub setup_calls: usize,
}

impl SimulationReport {
    /// All events in emission order.
    pub fn events(&self) -> impl Iterator<Item = &StoreEvent> {
        self.actions.iter().flat_map(|record| record.events.iter())
    }

    /// Human-readable rendering.
    pub fn render(&self) -> String {
        let mut out = format!("policy: {}\n", self.policy.as_str());
        for record in &self.actions {
            let target = record
                .action
                .destination_id()
                .map(|id| format!(" {id}"))
                .unwrap_or_default();
            out.push_str(&format!(
                "> {}{target}: {}\n",
                record.action.name(),
                record.result
            ));
            for event in &record.events {
                out.push_str(&format!(
                    "  event {} {}\n",
                    event.event_name(),
                    event.destination_id()
                ));
            }
        }
        match &self.selected {
            Some(destination) => out.push_str(&format!(
                "selected: {} ({})\n",
                destination.id(),
                destination.display_name()
            )),
            None => out.push_str("selected: none\n"),
        }
        out.push_str(&format!(
            "transport: {} fetch call(s), {} setup call(s)\n",
            self.fetch_calls, self.setup_calls
        ));
        out
    }
}

fn describe(outcome: &SelectionOutcome) -> String {
    match outcome {
        SelectionOutcome::Selected(_) => "selected".to_string(),
        SelectionOutcome::AwaitingCapabilities(_) => "selected, awaiting capabilities".to_string(),
        SelectionOutcome::NotSelected(failure) => format!("not selected ({failure})"),
        SelectionOutcome::Discarded(_) => "discarded".to_string(),
    }
}

/// Wait until the pump has consumed every queued transport event.
async fn settle(events: &mpsc::Sender<TransportEvent>) {
    loop {
        tokio::task::yield_now().await;
        if events.capacity() == events.max_capacity() {
            // One more turn for an event taken off the queue but not yet applied.
            tokio::task::yield_now().await;
            if events.capacity() == events.max_capacity() {
                break;
            }
        }
    }
}

fn drain(rx: &mut broadcast::Receiver<StoreEvent>) -> Vec<StoreEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "Event subscriber lagged, events were dropped");
            }
            Err(_) => break,
        }
    }
    events
}

async fn known(store: &DestinationStore, id: &DestinationId) -> Result<Destination, StoreError> {
    store
        .destination(id)
        .await
        .ok_or_else(|| StoreError::UnknownDestination(id.clone()))
}

async fn apply(session: &PrintSession, action: &Action) -> Result<String, StoreError> {
    let store = session.store();
    let search = session.search();

    let result = match action {
        Action::Select { id } => {
            describe(&search.handle_destination_select(known(store, id).await?).await)
        }
        Action::Configure { id } => {
            describe(&search.handle_configure_destination(known(store, id).await?).await)
        }
        Action::Activate { id } => describe(&search.activate(id).await?),
        Action::Remove { id } => {
            store.remove_destination(id).await?;
            "removed".to_string()
        }
        Action::RequestCapabilities { id } => match store.request_capabilities(id).await? {
            FetchDecision::Issue => "fetch started".to_string(),
            FetchDecision::Coalesced => "fetch already pending".to_string(),
        },
        Action::Discover => {
            store.start_discovery();
            "discovery started".to_string()
        }
    };
    Ok(result)
}

/// Replay a scenario.
///
/// `policy` overrides the policy from the scenario settings.
pub async fn run(
    scenario: Scenario,
    policy: Option<SelectionPolicy>,
) -> Result<SimulationReport, CliError> {
    let mut settings = scenario.settings;
    if policy.is_some() {
        settings.selection_policy = policy;
    }

    let (tx, rx) = transport_channel(&settings);
    let transport = Arc::new(
        ScriptedTransport::new(tx.clone()).with_discovery(scenario.destinations.clone()),
    );
    for (id, reply) in scenario.capabilities {
        transport.script_fetch(id, reply.into());
    }
    for (id, reply) in scenario.setup {
        transport.script_setup(id, reply.into());
    }

    let session = PrintSession::start(&settings, transport.clone(), rx)?;
    let mut events = session.subscribe();
    session
        .search()
        .update_destinations(scenario.destinations)
        .await;

    let mut actions = Vec::with_capacity(scenario.actions.len());
    for action in scenario.actions {
        debug!(action = action.name(), "Replaying action");
        let result = apply(&session, &action).await?;
        settle(&tx).await;
        actions.push(ActionRecord {
            events: drain(&mut events),
            action,
            result,
        });
    }

    let report = SimulationReport {
        policy: session.store().policy(),
        actions,
        selected: session.store().selected_destination().await,
        fetch_calls: transport.fetch_calls().len(),
        setup_calls: transport.setup_calls().len(),
    };
    session.shutdown().await?;
    Ok(report)
}
