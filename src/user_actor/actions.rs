use chrono::{DateTime, Utc};

/// Custom actions for User entities.
#[derive(Debug, Clone)]
pub enum UserAction {
    /// Credits loyalty points; returns the new balance.
    AwardPoints(u64),
    /// Records an account-level chat ban. Blocking an already blocked user keeps
    /// the first reason and time.
    BlockChat { reason: String, at: DateTime<Utc> },
    UnblockChat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserActionResult {
    Points(u64),
    /// Whether the call changed the block state.
    ChatBlockChanged(bool),
}
