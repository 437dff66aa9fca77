//! gitshim - a git-client façade over a pluggable git engine
//!
//! gitshim exposes the operation set of a conventional git client (status,
//! log, branches, remotes, tags, commit, fetch/pull/push, config) while
//! delegating every piece of version-control work to an [`engine::Engine`].
//! Code written against the client interface runs unchanged over the
//! libgit2-backed [`git::Git`] engine or the in-memory mock.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`client`] - The façade: repository handle, operations, result shapes
//! - [`engine`] - The delegate engine contract and an in-memory mock
//! - [`git`] - Engine implementation over libgit2
//! - [`core`] - Strong types, status and merge classifiers, configuration
//!
//! # Correctness Invariants
//!
//! 1. Status and merge classification are pure functions of the engine's
//!    status matrix and merge report
//! 2. Unsupported operations fail before the engine is called
//! 3. Engine errors reach callers unchanged
//! 4. Batch operations run one item at a time and isolate failures
//!
//! # Logging
//!
//! Operations emit `tracing` events. The library never installs a
//! subscriber; applications choose one.

pub mod client;
pub mod core;
pub mod engine;
pub mod git;
