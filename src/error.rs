//! Error types shared across the crate.
//!
//! Invalid references inside the reducer are not errors; they turn actions
//! into no-ops. These enums cover the boundaries where a caller needs a reason:
//! restoring a persisted tree, parsing keybindings, capability failures and
//! configuration loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::ids::{NodeId, TabId};

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("root node {0} is missing")]
    MissingRoot(NodeId),
    #[error("node stored under {key} reports id {id}")]
    IdMismatch { key: NodeId, id: NodeId },
    #[error("node {0} is referenced but not defined")]
    MissingNode(NodeId),
    #[error("node {0} is reachable more than once")]
    SharedNode(NodeId),
    #[error("node {0} is not reachable from the root")]
    Orphan(NodeId),
    #[error("split {id} has {children} children but {sizes} sizes")]
    SizeMismatch {
        id: NodeId,
        children: usize,
        sizes: usize,
    },
    #[error("split {id} has {children} children; at least 2 are required")]
    Degenerate { id: NodeId, children: usize },
    #[error("split {id} sizes sum to {sum}")]
    Unnormalized { id: NodeId, sum: f64 },
    #[error("split {id} has a ratio below the minimum ({ratio})")]
    RatioTooSmall { id: NodeId, ratio: f64 },
    #[error("tab {0} appears more than once")]
    DuplicateTab(TabId),
    #[error("leaf {leaf} marks {tab} active but does not hold it")]
    DanglingActiveTab { leaf: NodeId, tab: TabId },
    #[error("active leaf {0} is not a leaf of the tree")]
    DanglingActiveLeaf(NodeId),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeybindingError {
    #[error("keybinding is empty")]
    Empty,
    #[error("keybinding `{0}` has more than two chords")]
    TooManyChords(String),
    #[error("chord `{0}` has no key")]
    MissingKey(String),
    #[error("chord `{chord}` has unknown modifier `{modifier}`")]
    UnknownModifier { chord: String, modifier: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FocusError {
    #[error("focus target is detached")]
    Detached,
    #[error("focus target rejected focus: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}
