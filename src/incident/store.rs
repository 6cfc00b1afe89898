//! Incident storage.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use super::model::{Incident, IncidentUpdate, NewIncident, Status};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IncidentError {
    #[error("❌ Incident {0} not found")]
    NotFound(String),

    #[error("❌ Incident {0} is already resolved")]
    AlreadyResolved(String),
}

/// Backing store for incidents. Implementations must be safe to share
/// across request handlers.
pub trait IncidentStore: Send + Sync {
    fn create(&self, incident: NewIncident) -> Incident;

    fn get(&self, id: &str) -> Option<Incident>;

    /// Append a timeline update to an active incident.
    fn add_update(&self, id: &str, update: IncidentUpdate) -> Result<Incident, IncidentError>;

    /// Mark an active incident resolved at `resolved_at` (epoch seconds).
    fn resolve(&self, id: &str, resolved_at: u64) -> Result<Incident, IncidentError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local store. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct InMemoryIncidentStore {
    inner: Arc<DashMap<String, Incident>>,
}

impl InMemoryIncidentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_active<F>(&self, id: &str, apply: F) -> Result<Incident, IncidentError>
    where
        F: FnOnce(&mut Incident),
    {
        let mut entry = self
            .inner
            .get_mut(id)
            .ok_or_else(|| IncidentError::NotFound(id.to_string()))?;
        if !entry.is_active() {
            return Err(IncidentError::AlreadyResolved(id.to_string()));
        }
        apply(entry.value_mut());
        Ok(entry.value().clone())
    }
}

impl IncidentStore for InMemoryIncidentStore {
    fn create(&self, new: NewIncident) -> Incident {
        let incident = Incident {
            id: Uuid::new_v4().to_string(),
            page_on_call: new.severity.pages_on_call(),
            title: new.title,
            severity: new.severity,
            status: Status::Active,
            commander: new.commander,
            channel_id: new.channel_id,
            started_at: new.started_at,
            resolved_at: None,
            updates: Vec::new(),
        };
        self.inner.insert(incident.id.clone(), incident.clone());
        incident
    }

    fn get(&self, id: &str) -> Option<Incident> {
        self.inner.get(id).map(|entry| entry.value().clone())
    }

    fn add_update(&self, id: &str, update: IncidentUpdate) -> Result<Incident, IncidentError> {
        self.with_active(id, |incident| incident.updates.push(update))
    }

    fn resolve(&self, id: &str, resolved_at: u64) -> Result<Incident, IncidentError> {
        self.with_active(id, |incident| {
            incident.status = Status::Resolved;
            incident.resolved_at = Some(resolved_at);
        })
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
