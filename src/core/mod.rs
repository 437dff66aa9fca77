//! core
//!
//! Core domain types, classifiers, and configuration for gitshim.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid, BranchName, RefName, Identity
//! - [`status`] - Status matrix rows and the status classifier
//! - [`merge`] - Merge reports and the merge outcome classifier
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Classification is a closed table with an explicit fallthrough
//! - Nothing here touches a repository

pub mod config;
pub mod merge;
pub mod status;
pub mod types;
