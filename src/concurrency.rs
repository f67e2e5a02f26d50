//! Keeps the async HTTP runtime responsive while a session call runs its
//! Monte Carlo equity work. `SessionManager` is plain synchronous code behind
//! a `parking_lot::Mutex`; running it directly on an axum handler would tie
//! up that worker thread for the whole equity sample. `run_blocking` hands
//! the call to Tokio's blocking thread pool instead, the same role a
//! dedicated executor plays in front of synchronous session code.

use tokio::task::JoinError;

/// Runs a synchronous closure on Tokio's blocking thread pool and returns its
/// result, turning a panicked or cancelled task into an `anyhow::Error`
/// instead of propagating a bare `JoinError`.
pub async fn run_blocking<F, T>(func: F) -> Result<T, JoinError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(func).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_the_closure_and_returns_its_value() {
        let result = run_blocking(|| 2 + 2).await.unwrap();
        assert_eq!(result, 4);
    }
}
