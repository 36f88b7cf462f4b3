//! Domain types shared across the Zion supervisor crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable integer identity of a sandbox slot, always in `[0, N)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(u32);

impl SlotId {
    /// Wrap a raw slot index.
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// The raw slot index.
    pub fn index(&self) -> u32 {
        self.0
    }

    /// The slot's derived name, e.g. `zion_3`.
    pub fn name(&self) -> SlotName {
        SlotName(format!("zion_{}", self.0))
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The coordination-store-visible name of a slot, e.g. `zion_3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotName(String);

impl SlotName {
    /// Wrap a raw slot name string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the numeric slot id out of a name of the form `zion_<i>`.
    ///
    /// Returns `None` if the name doesn't carry the `zion_` prefix or the
    /// suffix isn't a valid `u32`.
    pub fn parse_slot_id(&self) -> Option<SlotId> {
        self.0
            .strip_prefix("zion_")
            .and_then(|s| s.parse::<u32>().ok())
            .map(SlotId::new)
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SlotName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SlotName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The name of a user function, used as the `workers:<function>` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionName(String);

impl FunctionName {
    /// Wrap a raw function name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The coordination-store key for this function's worker set, e.g.
    /// `workers:my-function`.
    pub fn workers_key(&self) -> String {
        format!("workers:{}", self.0)
    }

    /// Recover a function name from a `workers:<function>` coordination-store
    /// key. Returns `None` if the key doesn't carry the `workers:` prefix.
    pub fn from_workers_key(key: &str) -> Option<Self> {
        key.strip_prefix("workers:").map(|s| Self(s.to_string()))
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for FunctionName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FunctionName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Sidecar metadata read for a function's cached tarball, mirroring the
/// `Function-Memory` / `Function-Timeout` / `Function-Main` object headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionMetadata {
    /// Memory limit in MiB.
    pub memory_mib: u64,
    /// Execution timeout in seconds.
    pub timeout_secs: u64,
    /// Entry point identifier passed to the in-sandbox agent.
    pub main_class: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_id_name_roundtrip() {
        let id = SlotId::new(3);
        let name = id.name();
        assert_eq!(name.as_str(), "zion_3");
        assert_eq!(name.parse_slot_id(), Some(id));
    }

    #[test]
    fn slot_name_rejects_bad_prefix() {
        let name = SlotName::new("not_a_slot");
        assert_eq!(name.parse_slot_id(), None);
    }

    #[test]
    fn function_workers_key_roundtrip() {
        let f = FunctionName::new("hello-world");
        assert_eq!(f.workers_key(), "workers:hello-world");
        assert_eq!(
            FunctionName::from_workers_key("workers:hello-world"),
            Some(f)
        );
        assert_eq!(FunctionName::from_workers_key("available_dockers"), None);
    }
}
