//! Chat/support message screening: per-user rate limiting, spam rules, and the
//! account-level block after repeated violations.

pub mod rate_limiter;
pub mod spam_detector;
pub mod sweeper;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::app_system::ChatGuardSettings;
use crate::clients::UserClient;
use crate::user_actor::UserError;

pub use rate_limiter::{RateDecision, SlidingWindowLimiter};
pub use spam_detector::{normalize, SpamDetector, SpamReason};
pub use sweeper::spawn_sweeper;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatVerdict {
    Accepted,
    RateLimited { retry_after: Duration },
    Spam { reason: SpamReason, violations: u32 },
    /// Chat is blocked on the account, either already or because of this message.
    AccountBlocked { reason: String },
}

impl ChatVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ChatVerdict::Accepted)
    }
}

#[derive(Debug, Clone, Copy)]
struct Violations {
    count: u32,
    last_at: Instant,
}

/// Screening state for the chat hub. One instance is owned by the running
/// system and shared behind an `Arc`.
pub struct ChatGuard {
    limiter: SlidingWindowLimiter,
    spam: SpamDetector,
    violations: Mutex<HashMap<String, Violations>>,
    violations_before_block: u32,
    violation_ttl: Duration,
    users: UserClient,
}

impl ChatGuard {
    pub fn new(settings: &ChatGuardSettings, users: UserClient) -> Result<Self, regex::Error> {
        Ok(Self {
            limiter: SlidingWindowLimiter::new(settings.max_messages, settings.window(), settings.block()),
            spam: SpamDetector::new(settings)?,
            violations: Mutex::new(HashMap::new()),
            violations_before_block: settings.violations_before_block,
            violation_ttl: settings.violation_ttl(),
            users,
        })
    }

    pub async fn screen_message(&self, user_id: &str, text: &str) -> Result<ChatVerdict, UserError> {
        self.screen_message_at(user_id, text, Instant::now()).await
    }

    #[instrument(skip(self, text, now), fields(len = text.len()))]
    pub async fn screen_message_at(&self, user_id: &str, text: &str, now: Instant) -> Result<ChatVerdict, UserError> {
        let user = self
            .users
            .get_user(user_id.to_string())
            .await?
            .ok_or_else(|| UserError::NotFound(user_id.to_string()))?;
        if let Some(block) = &user.chat_block {
            return Ok(ChatVerdict::AccountBlocked { reason: block.reason.clone() });
        }

        match self.limiter.check(user_id, now).await {
            RateDecision::Allowed => {}
            RateDecision::Limited { retry_after } => {
                warn!(retry_after_secs = retry_after.as_secs(), "Rate limit exceeded");
                return Ok(ChatVerdict::RateLimited { retry_after });
            }
            RateDecision::Blocked { retry_after } => return Ok(ChatVerdict::RateLimited { retry_after }),
        }

        let Some(reason) = self.spam.inspect(user_id, text, now).await else {
            return Ok(ChatVerdict::Accepted);
        };
        let violations = {
            let mut counts = self.violations.lock().await;
            let entry = counts.entry(user_id.to_string()).or_insert(Violations { count: 0, last_at: now });
            entry.count += 1;
            entry.last_at = now;
            entry.count
        };
        warn!(%reason, violations, "Spam detected");

        if violations < self.violations_before_block {
            return Ok(ChatVerdict::Spam { reason, violations });
        }
        let block_reason = format!("Spam: {}", reason);
        self.users.block_chat(user_id.to_string(), block_reason.clone(), Utc::now()).await?;
        self.violations.lock().await.remove(user_id);
        info!("Chat blocked on account");
        Ok(ChatVerdict::AccountBlocked { reason: block_reason })
    }

    /// Evicts idle per-user state. Returns the number of entries removed.
    pub async fn sweep(&self, now: Instant) -> usize {
        let forgotten = {
            let mut counts = self.violations.lock().await;
            let before = counts.len();
            counts.retain(|_, v| now.saturating_duration_since(v.last_at) < self.violation_ttl);
            before - counts.len()
        };
        self.limiter.sweep(now).await + self.spam.sweep(now).await + forgotten
    }

    pub async fn violations(&self, user_id: &str) -> u32 {
        self.violations.lock().await.get(user_id).map_or(0, |v| v.count)
    }
}
