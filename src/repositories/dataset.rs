use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use super::{InMemoryStore, TraceabilityReader, TraceabilityStore};
use crate::errors::ServiceError;
use crate::models::{AuditEntry, CultivationLot, Logistics, Transformation};

/// On-disk JSON snapshot of a store, audit trail included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub lots: Vec<CultivationLot>,
    #[serde(default)]
    pub transformations: Vec<Transformation>,
    #[serde(default)]
    pub logistics: Vec<Logistics>,
    #[serde(default)]
    pub audit: Vec<AuditEntry>,
}

impl Dataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let dataset: Dataset = serde_json::from_str(&raw)?;
        info!(
            path = %path.display(),
            lots = dataset.lots.len(),
            transformations = dataset.transformations.len(),
            logistics = dataset.logistics.len(),
            audit_entries = dataset.audit.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Like [`Dataset::load`], but a missing file yields an empty dataset.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "Dataset file not found; starting empty");
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ServiceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let rendered = serde_json::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        info!(path = %path.display(), "Dataset saved");
        Ok(())
    }

    /// Loads every record into a fresh store, going through the store's
    /// uniqueness and link checks, then replays the audit trail.
    pub fn into_store(self) -> Result<InMemoryStore, ServiceError> {
        let store = InMemoryStore::new();
        for lot in self.lots {
            store.insert_lot(lot)?;
        }
        for transformation in self.transformations {
            store.insert_transformation(transformation)?;
        }
        for logistics in self.logistics {
            store.insert_logistics(logistics)?;
        }
        for entry in self.audit {
            store.record_audit(entry)?;
        }
        Ok(store)
    }

    pub fn from_store(store: &InMemoryStore) -> Result<Self, ServiceError> {
        Ok(Self {
            lots: store.list_lots()?,
            transformations: store.all_transformations(),
            logistics: store.all_logistics(),
            audit: store.all_audit(),
        })
    }
}
