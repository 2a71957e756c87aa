//! Split-pane and tab layout engine.
//!
//! The core is an immutable [`tree::LayoutTree`] advanced by a pure reducer,
//! a [`store::LayoutStore`] that owns the current snapshot and acts as the
//! dispatch sink, a chord-aware [`commands::CommandRegistry`], a
//! [`drag::DragDropManager`] for docking tabs, and a [`focus::FocusRegistry`].
//! [`workspace::Workspace`] ties them together for a host; the `view` and
//! `event_loop` modules are the terminal host shipped with the binary.

pub mod commands;
pub mod config;
pub mod drag;
pub mod error;
pub mod event_loop;
pub mod focus;
pub mod ids;
pub mod keybindings;
pub mod store;
pub mod theme;
pub mod tracing_sub;
pub mod tree;
pub mod view;
pub mod workspace;
