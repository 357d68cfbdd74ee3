use std::collections::HashMap;

use serde::Deserialize;

use crate::errors::CredentialError;
use crate::utils::constants::TOKEN_FILE_SUFFIX;

/// Entry descriptor handed over by the front-end, both keys optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct EntryDescriptor {
    pub name: Option<String>,
    /// whitespace-delimited, e.g. "condor ce.example.org ce.example.org:9619"
    pub gatekeeper: Option<String>,
}

impl EntryDescriptor {
    pub fn new(name: Option<String>, gatekeeper: Option<String>) -> Self {
        Self { name, gatekeeper }
    }
}

impl From<&HashMap<String, String>> for EntryDescriptor {
    fn from(map: &HashMap<String, String>) -> Self {
        Self {
            name: map.get("name").cloned(),
            gatekeeper: map.get("gatekeeper").cloned(),
        }
    }
}

/// Resolved request for one `(group, entry)` cache slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub group: String,
    pub entry_name: String,
    pub gatekeeper_address: Option<String>,
    pub subject_seed: Option<String>,
}

impl TokenRequest {
    /// Build a request; rejects names that would escape the cache directory.
    pub fn new(group: &str, entry: &EntryDescriptor) -> Result<Self, CredentialError> {
        let entry_name = entry
            .name
            .as_deref()
            .ok_or_else(|| CredentialError::InvalidCacheKey("entry has no name".to_string()))?;
        validate_key_component("group", group)?;
        validate_key_component("entry name", entry_name)?;

        Ok(Self {
            group: group.to_owned(),
            entry_name: entry_name.to_owned(),
            gatekeeper_address: entry.gatekeeper.to_owned(),
            subject_seed: entry.name.to_owned(),
        })
    }

    /// Last whitespace-separated part of the gatekeeper address.
    pub fn audience(&self) -> Option<String> {
        self.gatekeeper_address
            .as_deref()
            .and_then(|gk| gk.split_whitespace().last())
            .map(str::to_owned)
    }

    pub fn subject(&self, prefix: &str) -> Option<String> {
        self.subject_seed
            .as_ref()
            .map(|seed| format!("{}{}", prefix, seed))
    }

    pub fn cache_key(&self) -> String {
        format!("{}.{}", self.group, self.entry_name)
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.cache_key(), TOKEN_FILE_SUFFIX)
    }
}

fn validate_key_component(kind: &str, value: &str) -> Result<(), CredentialError> {
    if value.is_empty() {
        return Err(CredentialError::InvalidCacheKey(format!("{} is empty", kind)));
    }
    if let Some(c) = value
        .chars()
        .find(|c| *c == '/' || *c == '\\' || c.is_control())
    {
        return Err(CredentialError::InvalidCacheKey(format!(
            "{} '{}' contains forbidden character {:?}",
            kind,
            value.escape_default(),
            c
        )));
    }
    Ok(())
}
