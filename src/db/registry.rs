//! Connection registry
//!
//! Owns the mapping-store connection and every target connection opened during a run.
//! Targets are opened on first use and reused for the same (host, database) key.

use crate::db::store::{Connector, TargetKey, TargetStore, MappingStore};
use crate::error::Result;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, info};

pub struct ConnectionRegistry<C: Connector> {
    connector: C,
    mapping: C::Mapping,
    targets: HashMap<TargetKey, C::Target>,
}

impl<C: Connector> ConnectionRegistry<C> {
    /// Connect to the mapping store. Failure here is fatal for the run.
    pub async fn open(connector: C) -> Result<Self> {
        let mapping = connector.connect_mapping().await?;
        Ok(Self {
            connector,
            mapping,
            targets: HashMap::new(),
        })
    }

    pub fn mapping(&mut self) -> &mut C::Mapping {
        &mut self.mapping
    }

    /// Cached connection for `host`/`database`, opening it on first use.
    pub async fn target(&mut self, host: &str, database: &str) -> Result<&mut C::Target> {
        match self.targets.entry(TargetKey::new(host, database)) {
            Entry::Occupied(entry) => {
                debug!("Reusing connection to {}", entry.key());
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                info!("Connecting to target database {}", entry.key());
                let target = self.connector.connect_target(entry.key()).await?;
                Ok(entry.insert(target))
            }
        }
    }

    pub fn open_targets(&self) -> usize {
        self.targets.len()
    }

    /// Close every connection. Called once at shutdown.
    pub async fn close(mut self) {
        for (key, target) in self.targets.iter_mut() {
            debug!("Closing connection to {}", key);
            target.close().await;
        }
        self.mapping.close().await;
    }
}
