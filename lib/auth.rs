use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Read,
    Write,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }

    /// Scopes that satisfy a requirement. Write keys may also read.
    pub fn satisfied_by(self) -> &'static [Scope] {
        match self {
            Self::Read => &[Scope::Read, Scope::Write],
            Self::Write => &[Scope::Write],
        }
    }
}

pub(crate) fn parse_scope_list(raw: &str) -> Result<Vec<Scope>, String> {
    let mut scopes = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let scope = match part.to_ascii_lowercase().as_str() {
            "read" => Scope::Read,
            "write" => Scope::Write,
            other => return Err(format!("unknown scope `{other}`")),
        };
        if !scopes.contains(&scope) {
            scopes.push(scope);
        }
    }
    if scopes.is_empty() {
        return Err("empty scope list".to_string());
    }
    Ok(scopes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// Opaque allow/deny decision for a presented key.
pub trait CapabilityCheck: Send + Sync {
    fn check(&self, api_key: &str, required: Scope) -> Access;
}

impl<T> CapabilityCheck for Arc<T>
where
    T: CapabilityCheck + ?Sized,
{
    fn check(&self, api_key: &str, required: Scope) -> Access {
        (**self).check(api_key, required)
    }
}

/// Keys configured through `LES_STATS_API_KEYS`.
#[derive(Debug, Clone, Default)]
pub struct StaticKeys {
    keys: HashMap<String, Vec<Scope>>,
}

impl StaticKeys {
    pub fn new(keys: HashMap<String, Vec<Scope>>) -> Self {
        Self { keys }
    }
}

impl CapabilityCheck for StaticKeys {
    fn check(&self, api_key: &str, required: Scope) -> Access {
        let Some(granted) = self.keys.get(api_key) else {
            return Access::Deny;
        };
        if required
            .satisfied_by()
            .iter()
            .any(|scope| granted.contains(scope))
        {
            Access::Allow
        } else {
            Access::Deny
        }
    }
}
