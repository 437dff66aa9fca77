//! git
//!
//! The libgit2-backed engine.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to libgit2. No other module should
//! import `git2`. Everything above this layer talks to the [`Engine`]
//! trait, so the façade behaves the same over [`Git`] and the in-memory
//! mock.
//!
//! # Responsibilities
//!
//! - Repository discovery, initialization, and cloning
//! - Index updates and commits
//! - Branch, tag, remote, and config management
//! - Status matrix computation
//! - Merges (fast-forward and three-way) and transport
//!
//! # Invariants
//!
//! - libgit2 failures surface as [`EngineError`] categories
//! - Blocking libgit2 calls never run on the async executor threads
//!
//! # Example
//!
//! ```ignore
//! use gitshim::engine::Engine;
//! use gitshim::git::Git;
//! use std::path::Path;
//!
//! let git = Git::new();
//! let root = git.find_root(Path::new(".")).await?;
//! let branch = git.current_branch(&root).await?;
//! ```
//!
//! [`Engine`]: crate::engine::Engine
//! [`EngineError`]: crate::engine::EngineError

mod interface;

pub use interface::Git;
