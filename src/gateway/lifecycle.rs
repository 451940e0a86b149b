//! Per-request state machine.
//!
//! ```text
//! Received → Matched → Authorized → Mapped → Dispatched → Translated → Sent
//!    │          │           │          │          │
//!    ▼          ▼           ▼          ▼          ▼
//! NotFound  Unauthorized  Rejected  MappingError  DispatchFailed / BadGateway
//! ```
//!
//! Each request owns its machine; nothing outlives the request.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Received,
    Matched,
    Authorized,
    Mapped,
    Dispatched,
    Translated,
    Sent,
    NotFound,
    Unauthorized,
    Rejected,
    MappingError,
    DispatchFailed,
    BadGateway,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestState::Sent
                | RequestState::NotFound
                | RequestState::Unauthorized
                | RequestState::Rejected
                | RequestState::MappingError
                | RequestState::DispatchFailed
                | RequestState::BadGateway
        )
    }

    pub fn can_transition(self, next: RequestState) -> bool {
        use RequestState::*;
        matches!(
            (self, next),
            (Received, Matched | NotFound)
                | (Matched, Authorized | Unauthorized | Rejected)
                | (Authorized, Mapped | MappingError | Rejected)
                | (Mapped, Dispatched | MappingError | Rejected)
                | (Dispatched, Translated | DispatchFailed | BadGateway)
                | (Translated, Sent)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestState::Received => "received",
            RequestState::Matched => "matched",
            RequestState::Authorized => "authorized",
            RequestState::Mapped => "mapped",
            RequestState::Dispatched => "dispatched",
            RequestState::Translated => "translated",
            RequestState::Sent => "sent",
            RequestState::NotFound => "not_found",
            RequestState::Unauthorized => "unauthorized",
            RequestState::Rejected => "rejected",
            RequestState::MappingError => "mapping_error",
            RequestState::DispatchFailed => "dispatch_failed",
            RequestState::BadGateway => "bad_gateway",
        }
    }
}

/// Tracks one request's progress.
#[derive(Debug)]
pub struct RequestLifecycle {
    request_id: String,
    state: RequestState,
    started: Instant,
}

impl RequestLifecycle {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            state: RequestState::Received,
            started: Instant::now(),
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Move to `next`. Illegal transitions are logged and ignored.
    pub fn advance(&mut self, next: RequestState) -> bool {
        if !self.state.can_transition(next) {
            tracing::error!(
                request_id = %self.request_id,
                from = self.state.as_str(),
                to = next.as_str(),
                "Illegal request state transition"
            );
            return false;
        }
        tracing::trace!(
            request_id = %self.request_id,
            from = self.state.as_str(),
            to = next.as_str(),
            "Request state"
        );
        self.state = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_reaches_sent() {
        let mut lifecycle = RequestLifecycle::new("r-1");
        for next in [
            RequestState::Matched,
            RequestState::Authorized,
            RequestState::Mapped,
            RequestState::Dispatched,
            RequestState::Translated,
            RequestState::Sent,
        ] {
            assert!(lifecycle.advance(next), "{:?}", next);
        }
        assert!(lifecycle.state().is_terminal());
    }

    #[test]
    fn test_illegal_transitions_are_ignored() {
        let mut lifecycle = RequestLifecycle::new("r-2");
        assert!(!lifecycle.advance(RequestState::Dispatched));
        assert_eq!(lifecycle.state(), RequestState::Received);

        assert!(lifecycle.advance(RequestState::NotFound));
        assert!(!lifecycle.advance(RequestState::Matched));
        assert_eq!(lifecycle.state(), RequestState::NotFound);
    }

    #[test]
    fn test_errors_only_from_their_stage() {
        assert!(RequestState::Matched.can_transition(RequestState::Unauthorized));
        assert!(!RequestState::Mapped.can_transition(RequestState::Unauthorized));
        assert!(RequestState::Dispatched.can_transition(RequestState::BadGateway));
        assert!(!RequestState::Received.can_transition(RequestState::DispatchFailed));
    }
}
