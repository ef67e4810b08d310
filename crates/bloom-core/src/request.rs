//! Resource request state machine
//!
//! A [`ResourceRequest`] tracks one logical resource need: an ordered list
//! of candidate sources, a cursor pointing at the next untried candidate,
//! and the request state. It is only ever advanced one step at a time by
//! the fallback loader.

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Opaque identifier naming one candidate location for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle state of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    /// Candidates remain and no outcome has been reached yet
    Pending,
    /// A candidate produced the resource
    Succeeded,
    /// Every candidate failed; the fallback continuation runs
    ExhaustedFallback,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestState::Pending)
    }
}

/// One attempt to load a named external resource from ordered candidates
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    candidates: Vec<SourceId>,
    cursor: usize,
    state: RequestState,
}

impl ResourceRequest {
    /// Create a pending request positioned at the first candidate
    pub fn new(candidates: Vec<SourceId>) -> Self {
        Self {
            candidates,
            cursor: 0,
            state: RequestState::Pending,
        }
    }

    pub fn candidates(&self) -> &[SourceId] {
        &self.candidates
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// The candidate to try next, if the request is still pending
    pub fn current(&self) -> Option<&SourceId> {
        if self.state.is_terminal() {
            return None;
        }
        self.candidates.get(self.cursor)
    }

    /// Number of candidates not yet tried
    pub fn remaining(&self) -> usize {
        self.candidates.len() - self.cursor
    }

    /// Move straight to exhaustion when there is nothing to try.
    ///
    /// Returns `true` if the request was exhausted by this call.
    pub fn exhaust_if_empty(&mut self) -> bool {
        if self.state == RequestState::Pending && self.candidates.is_empty() {
            self.state = RequestState::ExhaustedFallback;
            return true;
        }
        false
    }

    /// The current candidate produced the resource
    pub fn record_success(&mut self) -> Result<RequestState, RequestError> {
        self.ensure_pending()?;
        self.state = RequestState::Succeeded;
        Ok(self.state)
    }

    /// The current candidate failed; advance to the next one or exhaust
    pub fn record_failure(&mut self) -> Result<RequestState, RequestError> {
        self.ensure_pending()?;
        if self.cursor < self.candidates.len() {
            self.cursor += 1;
        }
        if self.cursor >= self.candidates.len() {
            self.state = RequestState::ExhaustedFallback;
        }
        Ok(self.state)
    }

    fn ensure_pending(&self) -> Result<(), RequestError> {
        if self.state.is_terminal() {
            return Err(RequestError::AlreadyTerminal(self.state));
        }
        Ok(())
    }
}
