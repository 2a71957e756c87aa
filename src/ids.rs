//! Node and tab identifiers.
//!
//! Ids are opaque strings built from a millisecond timestamp and a monotonic
//! per-session counter, so they never collide within a session and never
//! collide with ids of a restored snapshot taken in an earlier session.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }
    };
}

string_id!(
    /// Identifier of a leaf or split node.
    NodeId
);

string_id!(
    /// Identifier of a tab. Unique across the whole tree.
    TabId
);

/// Session-scoped id source.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_node(&mut self, kind: &str) -> NodeId {
        NodeId(self.next_raw(kind))
    }

    pub fn next_tab(&mut self) -> TabId {
        TabId(self.next_raw("tab"))
    }

    fn next_raw(&mut self, prefix: &str) -> String {
        self.counter = self.counter.wrapping_add(1);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        format!("{prefix}-{millis}-{}", self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_unique() {
        let mut ids = IdGenerator::new();
        let mut seen = HashSet::new();
        for _ in 0..1_000 {
            assert!(seen.insert(ids.next_node("leaf").to_string()));
            assert!(seen.insert(ids.next_tab().to_string()));
        }
    }

    #[test]
    fn ids_carry_their_prefix() {
        let mut ids = IdGenerator::new();
        assert!(ids.next_node("split").as_str().starts_with("split-"));
        assert!(ids.next_tab().as_str().starts_with("tab-"));
    }
}
