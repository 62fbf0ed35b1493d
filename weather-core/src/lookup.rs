//! Lookup state machine.
//!
//! [`ViewState`] is a sequential reducer: every search is tagged with a
//! [`RequestId`] and only the newest one may settle the phase, so a slow
//! response can never overwrite a newer search. [`Lookup`] drives it against a
//! [`WeatherProvider`] on the tokio runtime.

use std::{fmt, sync::Arc};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{LookupError, WeatherProvider, WeatherReport, WeatherRequest};

/// Shown for every failure other than a provider-side "not found".
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred while fetching weather data.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mutually exclusive UI phase. Weather details only exist in `Ready`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready(WeatherReport),
    NotFound,
    Error { message: String },
}

impl Phase {
    pub fn is_loading(&self) -> bool {
        matches!(self, Phase::Loading)
    }

    pub fn report(&self) -> Option<&WeatherReport> {
        match self {
            Phase::Ready(report) => Some(report),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Phase::Error { message } => Some(message.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum Action {
    /// The search box content changed.
    QueryChanged(String),
    /// Search for the current query (Enter, button, or initial mount).
    Submit,
    /// A provider call finished.
    Resolved {
        id: RequestId,
        outcome: Result<WeatherReport, LookupError>,
    },
}

/// What the caller has to do after a reduction.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    /// State changed; re-render.
    Updated,
    /// Issue exactly one provider call for `request`, tagged with `id`.
    Fetch {
        id: RequestId,
        request: WeatherRequest,
    },
    /// A superseded response was dropped; nothing changed.
    Discarded,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    query: String,
    phase: Phase,
    pending: Option<RequestId>,
    next_id: u64,
}

impl ViewState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The newest in-flight request, if any.
    pub fn pending(&self) -> Option<RequestId> {
        self.pending
    }

    pub fn reduce(&mut self, action: Action) -> Reaction {
        match action {
            Action::QueryChanged(text) => {
                self.query = text;
                Reaction::Updated
            }
            Action::Submit => {
                let (id, request) = self.submit();
                Reaction::Fetch { id, request }
            }
            Action::Resolved { id, outcome } => {
                if self.resolve(id, outcome) {
                    Reaction::Updated
                } else {
                    Reaction::Discarded
                }
            }
        }
    }

    /// Starts a new search from any phase. Supersedes whatever is in flight.
    pub fn submit(&mut self) -> (RequestId, WeatherRequest) {
        self.next_id += 1;
        let id = RequestId(self.next_id);

        self.pending = Some(id);
        self.phase = Phase::Loading;

        (id, WeatherRequest::new(self.query.clone()))
    }

    /// Settles the phase if `id` is the newest pending request.
    ///
    /// Returns `false` when the response was stale and ignored.
    pub fn resolve(&mut self, id: RequestId, outcome: Result<WeatherReport, LookupError>) -> bool {
        if self.pending != Some(id) {
            debug!(request = %id, pending = ?self.pending, "Discarding stale weather response");
            return false;
        }
        self.pending = None;

        self.phase = match outcome {
            Ok(report) => Phase::Ready(report),
            Err(err) if err.is_not_found() => {
                debug!(request = %id, error = %err, "City not found");
                Phase::NotFound
            }
            Err(err) => {
                warn!(request = %id, error = %err, "Weather lookup failed");
                Phase::Error {
                    message: GENERIC_ERROR_MESSAGE.to_string(),
                }
            }
        };

        true
    }
}

type Settled = (RequestId, Result<WeatherReport, LookupError>);

/// Runs lookups against a provider and feeds the results through [`ViewState`].
///
/// Superseded calls are left to finish; their results are discarded.
#[derive(Debug)]
pub struct Lookup {
    state: ViewState,
    provider: Arc<dyn WeatherProvider>,
    tx: mpsc::UnboundedSender<Settled>,
    rx: mpsc::UnboundedReceiver<Settled>,
}

impl Lookup {
    pub fn new(provider: Arc<dyn WeatherProvider>, query: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: ViewState::new(query),
            provider,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn phase(&self) -> &Phase {
        self.state.phase()
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.state.reduce(Action::QueryChanged(text.into()));
    }

    /// Moves to `Loading` and spawns exactly one provider call.
    pub fn submit(&mut self) -> RequestId {
        let (id, request) = self.state.submit();
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let call = tokio::spawn(async move {
                provider.current_weather(&request).await
            });

            // A panicking provider still has to settle its request.
            let outcome = match call.await {
                Ok(outcome) => outcome,
                Err(err) => Err(LookupError::Transport(format!("provider task failed: {err}"))),
            };

            if tx.send((id, outcome)).is_err() {
                debug!(request = %id, "Lookup dropped before response arrived");
            }
        });

        id
    }

    /// Waits for the next provider call to finish and applies it.
    pub async fn settle_next(&mut self) -> Reaction {
        // `self.tx` keeps the channel open, so `recv` only waits.
        match self.rx.recv().await {
            Some((id, outcome)) => self.state.reduce(Action::Resolved { id, outcome }),
            None => Reaction::Discarded,
        }
    }

    /// Waits until the newest request has settled the phase.
    pub async fn settle(&mut self) -> &Phase {
        while self.state.pending().is_some() {
            self.settle_next().await;
        }
        self.state.phase()
    }

    /// Searches for `city` and returns the terminal phase.
    pub async fn lookup(&mut self, city: impl Into<String>) -> &Phase {
        self.set_query(city);
        self.submit();
        self.settle().await
    }
}
