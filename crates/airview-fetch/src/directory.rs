use std::collections::HashMap;

use async_trait::async_trait;
use tracing::warn;

use crate::ports::{AliasResolver, Endpoint, LookupPurpose, ResolveError};

#[derive(Debug, Clone)]
struct DirectoryRecord {
    transfer: Endpoint,
    mail: Option<Endpoint>,
}

/// Fixed alias table, typically loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    records: HashMap<String, DirectoryRecord>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias`. Without a mail endpoint, mail lookups answer with the
    /// transfer endpoint. A repeated alias replaces the earlier entry.
    pub fn insert(&mut self, alias: impl Into<String>, transfer: Endpoint, mail: Option<Endpoint>) {
        let alias = alias.into();
        if self.records.contains_key(&alias) {
            warn!(alias = %alias, "replacing existing directory entry");
        }
        self.records.insert(alias, DirectoryRecord { transfer, mail });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl AliasResolver for StaticDirectory {
    async fn resolve(
        &self,
        alias: &str,
        purpose: LookupPurpose,
    ) -> Result<Endpoint, ResolveError> {
        let record = self
            .records
            .get(alias)
            .ok_or_else(|| ResolveError::UnknownAlias(alias.to_string()))?;

        let endpoint = match purpose {
            LookupPurpose::Transfer => &record.transfer,
            LookupPurpose::Mail => record.mail.as_ref().unwrap_or(&record.transfer),
        };
        Ok(endpoint.clone())
    }
}
