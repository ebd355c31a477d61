// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    Idle,
    Pending { request_id: u64 },
    Succeeded,
    Failed,
}

/// What came back from the text service. A fallback still carries display
/// text; it only tells the slot to settle as failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Answer(String),
    Fallback(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Self::Answer(text) | Self::Fallback(text) => text,
        }
    }
}

/// One in-flight request at most. The busy flag is `Pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSlot {
    phase: RequestPhase,
    response: String,
    next_request_id: u64,
}

impl Default for RequestSlot {
    fn default() -> Self {
        Self {
            phase: RequestPhase::Idle,
            response: String::new(),
            next_request_id: 0,
        }
    }
}

impl RequestSlot {
    pub fn phase(&self) -> RequestPhase {
        self.phase
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, RequestPhase::Pending { .. })
    }

    pub fn pending_request_id(&self) -> Option<u64> {
        match self.phase {
            RequestPhase::Pending { request_id } => Some(request_id),
            _ => None,
        }
    }

    /// Moves to pending and returns the new request id, or `None` when a
    /// request is already in flight.
    pub fn begin(&mut self) -> Option<u64> {
        if self.is_busy() {
            return None;
        }
        self.next_request_id = self.next_request_id.saturating_add(1);
        if self.next_request_id == 0 {
            self.next_request_id = 1;
        }
        self.response.clear();
        self.phase = RequestPhase::Pending {
            request_id: self.next_request_id,
        };
        Some(self.next_request_id)
    }

    /// Settles the pending request. Replies for any other id are dropped and
    /// reported as `false`.
    pub fn finish(&mut self, request_id: u64, reply: Reply) -> bool {
        if self.pending_request_id() != Some(request_id) {
            return false;
        }
        let (phase, text) = match reply {
            Reply::Answer(text) => (RequestPhase::Succeeded, text),
            Reply::Fallback(text) => (RequestPhase::Failed, text),
        };
        self.phase = phase;
        self.response = text;
        true
    }

    /// Back to idle, keeping the last response on screen.
    pub fn reset(&mut self) {
        if !self.is_busy() {
            self.phase = RequestPhase::Idle;
        }
    }
}
