//! The provider-backed target calendar.

pub mod protocol;
pub mod provider;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::EventCatalog;
use crate::error::CalMergeResult;
use crate::event::{EventRef, NewEvent, TargetEvent};
use crate::remote::protocol::{CreateEvent, DeleteEvent, ListEvents};
use crate::remote::provider::Provider;
use crate::window::SyncWindow;

/// Provider-specific parameters, passed through untouched.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RemoteConfig(pub HashMap<String, toml::Value>);

impl From<&RemoteConfig> for serde_json::Map<String, serde_json::Value> {
    fn from(config: &RemoteConfig) -> Self {
        config
            .0
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
            .collect()
    }
}

/// The `[target]` table: which provider holds the target calendar, plus its
/// parameters.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Remote {
    pub provider: Provider,
    #[serde(flatten)]
    pub config: RemoteConfig,
}

impl Remote {
    pub fn new(provider: Provider, config: RemoteConfig) -> Self {
        Remote { provider, config }
    }

    fn remote_config(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::from(&self.config)
    }
}

impl EventCatalog for Remote {
    async fn events(&self, window: &SyncWindow) -> CalMergeResult<Vec<TargetEvent>> {
        let events = self
            .provider
            .call(ListEvents {
                remote_config: self.remote_config(),
                from: window.from_rfc3339(),
                to: window.to_rfc3339(),
            })
            .await?;

        // Providers may round the range outward
        Ok(events
            .into_iter()
            .map(TargetEvent::from)
            .filter(|e| window.contains(e.start))
            .collect())
    }

    async fn create_event(&self, event: &NewEvent) -> CalMergeResult<()> {
        self.provider
            .call(CreateEvent {
                remote_config: self.remote_config(),
                event: event.clone(),
            })
            .await?;
        Ok(())
    }

    async fn delete_event(&self, reference: &EventRef) -> CalMergeResult<()> {
        self.provider
            .call(DeleteEvent {
                remote_config: self.remote_config(),
                event_id: reference.0.clone(),
            })
            .await
    }
}
