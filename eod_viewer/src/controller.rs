//! Request lifecycle controller.
//!
//! One controller per UI session. Every valid [`Controller::submit`] mints a
//! fresh [`RequestToken`], aborts whatever request was in flight, and spawns
//! the retrieval call on the Tokio runtime. Finished calls come back through
//! an internal channel and are applied by [`Controller::on_result`], which
//! ignores anything not carrying the active token.
//!
//! Aborting the superseded task is only an optimisation. The token check is
//! what guarantees that the visible result belongs to the most recently
//! submitted query: a transport that ignores the abort and answers late is
//! still discarded.
//!
//! Typical driving loop:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use eod_viewer::controller::Controller;
//! # async fn run(provider: Arc<dyn eod_client::providers::EodProvider>) {
//! let mut controller = Controller::new(provider);
//! controller.submit("aapl, msft");
//! controller.settle().await;
//! println!("{:?}", controller.state().phase());
//! # }
//! ```

use std::sync::Arc;

use eod_client::{
    models::EodResponse,
    providers::{EodProvider, ProviderError},
};
use tokio::{
    sync::mpsc,
    task::{JoinError, JoinHandle},
};
use tracing::{debug, info, warn};

use crate::{
    query::SymbolQuery,
    state::{FetchState, RequestToken},
};

/// Reason shown when a request ends without a usable error description.
pub const GENERIC_FAILURE: &str = "Failed to fetch stock data. Please try again.";

/// Result of one retrieval call.
pub type Outcome = Result<EodResponse, ProviderError>;

/// A finished retrieval, tagged with the token it was issued under.
#[derive(Debug)]
pub struct Completion {
    /// Token the request was issued under.
    pub token: RequestToken,
    /// What the provider returned.
    pub outcome: Outcome,
}

/// What [`Controller::on_result`] did with a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Records replaced, phase is `Success`.
    Succeeded,
    /// Phase is `Failed`, records untouched.
    Failed,
    /// Token was superseded; nothing changed.
    Stale,
}

struct InFlight {
    token: RequestToken,
    handle: JoinHandle<()>,
}

enum Event {
    Completed(Option<Completion>),
    Finished(Result<(), JoinError>),
}

/// Owns the [`FetchState`] for one session and serialises submissions into a
/// single authoritative request.
pub struct Controller {
    provider: Arc<dyn EodProvider>,
    state: FetchState,
    last_token: u64,
    in_flight: Option<InFlight>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl Controller {
    /// New controller in the `Idle` phase.
    pub fn new(provider: Arc<dyn EodProvider>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            provider,
            state: FetchState::default(),
            last_token: 0,
            in_flight: None,
            completions_tx,
            completions_rx,
        }
    }

    /// Read-only view of the lifecycle state.
    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// True while the active request has not completed.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Handle one user submission.
    ///
    /// Blank input moves the state to `Failed` with
    /// `"at least one ticker symbol required"` and returns `None`; it neither
    /// issues nor cancels a request and leaves displayed records alone.
    ///
    /// Otherwise the input is normalised, any in-flight request is aborted,
    /// the state enters `Loading` under a new token, and the retrieval call
    /// is spawned. Returns that token.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&mut self, raw: &str) -> Option<RequestToken> {
        let query = match SymbolQuery::parse(raw) {
            Ok(query) => query,
            Err(err) => {
                warn!(input = raw, error = %err, "submission rejected");
                self.state.reject(err.to_string());
                return None;
            }
        };

        if let Some(previous) = self.in_flight.take() {
            debug!(token = %previous.token, "aborting superseded request");
            previous.handle.abort();
        }

        self.last_token += 1;
        let token = RequestToken(self.last_token);
        let symbols = query.into_string();
        self.state.begin(symbols.clone(), token);
        info!(token = %token, query = %symbols, "request issued");

        let provider = Arc::clone(&self.provider);
        let tx = self.completions_tx.clone();
        let handle = tokio::spawn(async move {
            let outcome = provider.fetch_eod(&symbols).await;
            // The receiver lives as long as the controller; a send error only
            // means the session is gone.
            let _ = tx.send(Completion { token, outcome });
        });
        self.in_flight = Some(InFlight { token, handle });

        Some(token)
    }

    /// Apply a completed request.
    ///
    /// A token other than the active one is discarded without touching state,
    /// which covers every completion of a superseded request, cancelled or
    /// not. For the active token, `Ok` replaces the records and `Err` moves
    /// to `Failed` keeping the previous records. A cancellation reported for
    /// the active token was not caused by a newer submission, so it fails
    /// the request with [`GENERIC_FAILURE`] rather than leaving it `Loading`.
    pub fn on_result(&mut self, token: RequestToken, outcome: Outcome) -> Applied {
        if self.state.active_token() != Some(token) {
            debug!(token = %token, "discarding stale completion");
            return Applied::Stale;
        }
        if self.in_flight.as_ref().is_some_and(|f| f.token == token) {
            self.in_flight = None;
        }

        match outcome {
            Ok(response) => {
                info!(token = %token, records = response.data.len(), "request succeeded");
                self.state.succeed(response);
                Applied::Succeeded
            }
            Err(err) if err.is_cancelled() => {
                warn!(token = %token, "active request cancelled by the transport");
                self.state.fail(GENERIC_FAILURE.to_string());
                Applied::Failed
            }
            Err(err) => {
                warn!(token = %token, error = ?err, "request failed");
                self.state.fail(err.to_string());
                Applied::Failed
            }
        }
    }

    /// Wait for the next completion from any issued request and apply it.
    ///
    /// Pends forever when nothing is in flight, so use it inside a
    /// `tokio::select!` alongside the input source.
    pub async fn next_completion(&mut self) -> Option<(RequestToken, Applied)> {
        let completion = self.completions_rx.recv().await?;
        let applied = self.on_result(completion.token, completion.outcome);
        Some((completion.token, applied))
    }

    /// Apply completions until the active request is done.
    ///
    /// Stale completions that arrive in the meantime are discarded. A
    /// request task that dies without reporting (panicking provider) moves
    /// the state to `Failed` with [`GENERIC_FAILURE`].
    pub async fn settle(&mut self) {
        loop {
            let event = {
                let Some(in_flight) = self.in_flight.as_mut() else {
                    return;
                };
                tokio::select! {
                    biased;
                    completion = self.completions_rx.recv() => Event::Completed(completion),
                    joined = &mut in_flight.handle => Event::Finished(joined),
                }
            };

            match event {
                Event::Completed(Some(completion)) => {
                    self.on_result(completion.token, completion.outcome);
                }
                Event::Completed(None) => return,
                Event::Finished(joined) => self.on_task_finished(joined),
            }
        }
    }

    fn on_task_finished(&mut self, joined: Result<(), JoinError>) {
        // The task may have reported between the two polls above.
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.on_result(completion.token, completion.outcome);
        }

        let Some(in_flight) = self.in_flight.take() else {
            return;
        };
        warn!(
            token = %in_flight.token,
            error = ?joined.err(),
            "request task ended without a result"
        );
        if self.state.active_token() == Some(in_flight.token) {
            self.state.fail(GENERIC_FAILURE.to_string());
        }
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
        }
    }
}
