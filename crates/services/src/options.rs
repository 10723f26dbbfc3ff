//! Option lists for select fields, one slot per channel (field name).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, warn};

use admin_core::model::SelectOption;
use api::{ApiClient, ApiError};

use crate::catalog::OptionSource;
use crate::notify::{Notification, Notifier};
use crate::sequence::SequenceGate;

/// Endpoint and parent value an option list was requested for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OptionKey {
    pub endpoint: String,
    pub parent: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    /// The fetch failed; the channel now holds an empty list.
    Failed,
    Superseded,
}

#[derive(Default)]
struct Slot {
    key: Option<OptionKey>,
    options: Vec<SelectOption>,
    authoritative: bool,
}

/// Shared within one page; never across pages.
#[derive(Clone)]
pub struct OptionCache {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    gates: Arc<Mutex<HashMap<String, Arc<SequenceGate>>>>,
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl OptionCache {
    #[must_use]
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            gates: Arc::new(Mutex::new(HashMap::new())),
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub fn options(&self, channel: &str) -> Vec<SelectOption> {
        self.slots()
            .get(channel)
            .map(|slot| slot.options.clone())
            .unwrap_or_default()
    }

    /// `false` while a fetch for the channel is in flight and the shown
    /// options are the previous ones.
    #[must_use]
    pub fn is_authoritative(&self, channel: &str) -> bool {
        self.slots()
            .get(channel)
            .is_none_or(|slot| slot.authoritative)
    }

    #[must_use]
    pub fn key(&self, channel: &str) -> Option<OptionKey> {
        self.slots().get(channel).and_then(|slot| slot.key.clone())
    }

    /// Empty the channel and drop any fetch still in flight for it.
    pub fn clear(&self, channel: &str) {
        self.gate(channel).issue();
        let mut slots = self.slots();
        let slot = slots.entry(channel.to_string()).or_default();
        slot.key = None;
        slot.options.clear();
        slot.authoritative = true;
    }

    /// Fetch the options for `channel` from `source`.
    ///
    /// Previous options stay visible, marked non-authoritative, until the
    /// fetch lands. A failure leaves the channel empty and notifies; it is
    /// not returned as an error.
    pub async fn load(
        &self,
        channel: &str,
        source: &OptionSource,
        parent: Option<u64>,
    ) -> LoadOutcome {
        let key = OptionKey {
            endpoint: source.path(parent),
            parent,
        };
        let gate = self.gate(channel);
        let ticket = gate.issue();
        {
            let mut slots = self.slots();
            let slot = slots.entry(channel.to_string()).or_default();
            slot.key = Some(key.clone());
            slot.authoritative = false;
        }
        debug!(channel, endpoint = %key.endpoint, seq = ticket.value(), "fetching options");

        let result = match self.api.fetch_collection::<Value>(&key.endpoint).await {
            Ok(rows) => source.kind.project(rows),
            Err(err) => Err(err),
        };

        let applied = gate.settle(ticket, || {
            let mut slots = self.slots();
            let slot = slots.entry(channel.to_string()).or_default();
            slot.authoritative = true;
            match result {
                Ok(options) => {
                    let count = options.len();
                    slot.options = options;
                    Ok(count)
                }
                Err(err) => {
                    slot.options.clear();
                    Err(err)
                }
            }
        });

        match applied {
            None => {
                debug!(channel, seq = ticket.value(), "dropping stale options");
                LoadOutcome::Superseded
            }
            Some(Ok(count)) => LoadOutcome::Loaded(count),
            Some(Err(err)) => {
                self.report(channel, &err);
                LoadOutcome::Failed
            }
        }
    }

    fn report(&self, channel: &str, err: &ApiError) {
        warn!(channel, error = %err, "option fetch failed");
        self.notifier.notify(Notification::error(err.user_message()));
    }

    fn gate(&self, channel: &str) -> Arc<SequenceGate> {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gates.entry(channel.to_string()).or_default())
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
