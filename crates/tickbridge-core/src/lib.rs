//! # Tickbridge Core Library
//!
//! This library provides the core logic for tickbridge, a bridge between
//! the TickTick task service and local automation. It polls the TickTick
//! open API, compares successive snapshots of projects and tasks, and
//! turns the difference into semantic change events that observers can
//! react to. Task mutations flow the other way through a validated
//! command forwarder.
//!
//! ## Architecture
//!
//! - **Snapshot model**: an immutable per-cycle view of all remote
//!   projects and their tasks
//! - **Differ**: a pure comparison of two snapshots into an ordered
//!   event list
//! - **Poll engine**: a timer-driven fetch/diff/adopt loop that owns the
//!   previous snapshot and the bridge's health state
//! - **Command forwarder**: create/update/complete/delete calls plus an
//!   out-of-band refresh request after each successful mutation
//! - **OAuth**: desktop authorization-code flow with keyring-backed
//!   token storage
//!
//! ## Key Components
//!
//! - [`PollEngine`]: fetch/diff/adopt state machine
//! - [`CommandForwarder`]: validated task mutations
//! - [`TickTickClient`]: REST client for the open API
//! - [`EventSink`]: trait for observers of snapshot changes

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod ticktick;

pub use config::BridgeConfig;
pub use engine::commands::CommandForwarder;
pub use engine::diff::diff_snapshots;
pub use engine::poll::{EngineStatus, PollEngine, PollOptions, RefreshHandle};
pub use error::{ApiError, ConfigError, CoreError, OAuthError, ValidationError};
pub use events::{EventSink, TaskEvent};
pub use ticktick::api::TickTickClient;
pub use ticktick::model::{Priority, Project, Snapshot, Task};
