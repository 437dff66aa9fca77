//! engine
//!
//! The delegate engine the façade translates to.
//!
//! # Architecture
//!
//! The façade in [`crate::client`] never performs version-control work
//! itself. Object storage, refs, merges, status computation, and transport
//! all live behind the [`Engine`] trait:
//!
//! - [`crate::git::Git`] - engine backed by libgit2
//! - [`mock::MockEngine`] - in-memory engine for tests
//!
//! # Invariants
//!
//! - Engines are stateless with respect to the working directory; it is
//!   passed to every primitive
//! - Engine errors reach callers unchanged

pub mod mock;
mod traits;

pub use traits::{
    AnnotatedTagRequest, CloneRequest, CommitInfo, CommitRequest, Credentials, Engine,
    EngineError, FetchReport, FetchRequest, InitRequest, LogRequest, MergeRequest, PullRequest,
    PushReport, PushRequest, RefUpdate, RemoteInfo,
};
