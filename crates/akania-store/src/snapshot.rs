use chrono::{DateTime, Utc};
use serde_json::Value;

use akania_core::error::Result;
use akania_core::store::ProfileStore;

/// Read-only view of every stored profile at one point in time. Callers
/// hold it explicitly and call [`ProfileSnapshot::refresh`] when they want
/// newer data.
#[derive(Debug, Clone)]
pub struct ProfileSnapshot {
    profiles: Vec<Value>,
    loaded_at: DateTime<Utc>,
}

impl ProfileSnapshot {
    pub async fn load(store: &dyn ProfileStore) -> Result<Self> {
        Ok(Self {
            profiles: store.load_all().await?,
            loaded_at: Utc::now(),
        })
    }

    pub async fn refresh(&self, store: &dyn ProfileStore) -> Result<Self> {
        Self::load(store).await
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn profiles(&self) -> &[Value] {
        &self.profiles
    }

    /// Case-insensitive lookup by `company_name`.
    pub fn find(&self, company_name: &str) -> Option<&Value> {
        let wanted = company_name.trim().to_lowercase();
        self.profiles.iter().find(|p| {
            p.get("company_name")
                .and_then(Value::as_str)
                .is_some_and(|n| n.trim().to_lowercase() == wanted)
        })
    }
}
