//! client::callback
//!
//! Completion-callback adapter.
//!
//! Every façade operation returns a future. Callers written against a
//! callback-style interface wrap that future with [`with_callback`]: the
//! callback sees the outcome (error first, or the value) and the same
//! outcome is still returned to the awaiting caller.
//!
//! # Example
//!
//! ```
//! use gitshim::client::{callback::with_callback, GitClient};
//! use gitshim::engine::mock::MockEngine;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let client = GitClient::new("/repo", Arc::new(MockEngine::with_repo("main")));
//!
//! let mut seen = None;
//! let status = with_callback(client.status(), |outcome| {
//!     seen = outcome.ok().map(|s| s.current.clone());
//! })
//! .await;
//!
//! assert!(status.is_ok());
//! assert_eq!(seen.as_deref(), Some("main"));
//! # });
//! ```

use std::future::Future;

use super::error::ClientError;

/// Await `operation`, hand its outcome to `callback`, then return it.
pub async fn with_callback<T, F, C>(operation: F, callback: C) -> Result<T, ClientError>
where
    F: Future<Output = Result<T, ClientError>>,
    C: FnOnce(Result<&T, &ClientError>),
{
    let outcome = operation.await;
    callback(outcome.as_ref());
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::error::UnsupportedError;
    use crate::client::unsupported::UnsupportedOperation;

    #[tokio::test]
    async fn callback_sees_value() {
        let mut got = 0;
        let out = with_callback(async { Ok::<_, ClientError>(7) }, |r| {
            got = *r.unwrap();
        })
        .await;
        assert_eq!(got, 7);
        assert_eq!(out, Ok(7));
    }

    #[tokio::test]
    async fn callback_sees_error_first() {
        let mut failed = false;
        let out: Result<(), _> = with_callback(
            async { Err(UnsupportedError::operation(UnsupportedOperation::Rebase).into()) },
            |r| failed = r.is_err(),
        )
        .await;
        assert!(failed);
        assert!(out.unwrap_err().is_unsupported());
    }
}
