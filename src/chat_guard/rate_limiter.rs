use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Window {
    sent: VecDeque<Instant>,
    blocked_until: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// This message went over the limit and started a block.
    Limited { retry_after: Duration },
    /// A block from an earlier message is still running.
    Blocked { retry_after: Duration },
}

/// Sliding-window limiter keyed by user id. Going over the limit blocks the
/// user for a fixed time and clears the window.
pub struct SlidingWindowLimiter {
    max_messages: usize,
    window: Duration,
    block: Duration,
    users: Mutex<HashMap<String, Window>>,
}

impl SlidingWindowLimiter {
    pub fn new(max_messages: usize, window: Duration, block: Duration) -> Self {
        Self {
            max_messages,
            window,
            block,
            users: Mutex::new(HashMap::new()),
        }
    }

    pub async fn check(&self, user_id: &str, now: Instant) -> RateDecision {
        let mut users = self.users.lock().await;
        let state = users.entry(user_id.to_string()).or_default();

        if let Some(until) = state.blocked_until {
            if now < until {
                return RateDecision::Blocked { retry_after: until - now };
            }
            state.blocked_until = None;
        }

        while state.sent.front().is_some_and(|t| now.duration_since(*t) >= self.window) {
            state.sent.pop_front();
        }
        if state.sent.len() >= self.max_messages {
            state.sent.clear();
            state.blocked_until = Some(now + self.block);
            return RateDecision::Limited { retry_after: self.block };
        }
        state.sent.push_back(now);
        RateDecision::Allowed
    }

    /// Drops users with no recent messages and no running block. Returns how
    /// many were removed.
    pub async fn sweep(&self, now: Instant) -> usize {
        let mut users = self.users.lock().await;
        let before = users.len();
        users.retain(|_, w| {
            let blocked = w.blocked_until.is_some_and(|until| now < until);
            let recent = w.sent.back().is_some_and(|t| now.duration_since(*t) < self.window);
            blocked || recent
        });
        before - users.len()
    }

    pub async fn tracked_users(&self) -> usize {
        self.users.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(5, Duration::from_secs(60), Duration::from_secs(30))
    }

    #[tokio::test]
    async fn sixth_message_in_a_minute_blocks_for_thirty_seconds() {
        let limiter = limiter();
        let start = Instant::now();
        for i in 0..5 {
            assert_eq!(limiter.check("u1", start + Duration::from_secs(i)).await, RateDecision::Allowed);
        }
        let sixth = start + Duration::from_secs(10);
        assert_eq!(
            limiter.check("u1", sixth).await,
            RateDecision::Limited { retry_after: Duration::from_secs(30) }
        );
        assert_eq!(
            limiter.check("u1", sixth + Duration::from_secs(29)).await,
            RateDecision::Blocked { retry_after: Duration::from_secs(1) }
        );
        // Block over, window cleared.
        let after = sixth + Duration::from_secs(30);
        for i in 0..5 {
            assert_eq!(limiter.check("u1", after + Duration::from_millis(i)).await, RateDecision::Allowed);
        }
    }

    #[tokio::test]
    async fn old_messages_leave_the_window() {
        let limiter = limiter();
        let start = Instant::now();
        for i in 0..5 {
            limiter.check("u1", start + Duration::from_secs(i)).await;
        }
        assert_eq!(limiter.check("u1", start + Duration::from_secs(60)).await, RateDecision::Allowed);
        assert_eq!(limiter.check("u2", start).await, RateDecision::Allowed);
    }

    #[tokio::test]
    async fn sweep_keeps_active_and_blocked_users() {
        let limiter = SlidingWindowLimiter::new(1, Duration::from_secs(60), Duration::from_secs(300));
        let start = Instant::now();
        limiter.check("quiet", start).await;
        limiter.check("spammer", start).await;
        limiter.check("spammer", start).await;
        assert_eq!(limiter.sweep(start + Duration::from_secs(120)).await, 1);
        assert_eq!(limiter.tracked_users().await, 1);
    }
}
