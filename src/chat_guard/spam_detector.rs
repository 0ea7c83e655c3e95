use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};

use regex::Regex;
use tokio::sync::Mutex;

use crate::app_system::ChatGuardSettings;

const LINK_PATTERN: &str =
    r"(?i)(?:https?://|www\.)\S+|\b[a-z0-9][a-z0-9-]*\.(?:com|net|org|vn|io|info|biz|xyz|top|me)\b";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpamReason {
    Duplicate { count: usize },
    Blacklisted(String),
    TooManyLinks(usize),
}

impl fmt::Display for SpamReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpamReason::Duplicate { count } => write!(f, "same message sent {} times", count),
            SpamReason::Blacklisted(word) => write!(f, "blacklisted keyword '{}'", word),
            SpamReason::TooManyLinks(n) => write!(f, "{} links in one message", n),
        }
    }
}

/// Trimmed, lower-cased text used for duplicate detection.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

pub struct SpamDetector {
    duplicate_threshold: usize,
    duplicate_window: Duration,
    max_links: usize,
    links: Regex,
    blacklist: Option<Regex>,
    recent: Mutex<HashMap<String, VecDeque<(String, Instant)>>>,
}

impl SpamDetector {
    pub fn new(settings: &ChatGuardSettings) -> Result<Self, regex::Error> {
        let words: Vec<String> = settings
            .blacklist
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect();
        let blacklist = if words.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(r"(?i)(?:{})", words.join("|")))?)
        };
        Ok(Self {
            duplicate_threshold: settings.duplicate_threshold,
            duplicate_window: settings.duplicate_window(),
            max_links: settings.max_links,
            links: Regex::new(LINK_PATTERN)?,
            blacklist,
            recent: Mutex::new(HashMap::new()),
        })
    }

    pub fn count_links(&self, text: &str) -> usize {
        self.links.find_iter(text).count()
    }

    /// Records the message and reports the first rule it breaks, if any.
    pub async fn inspect(&self, user_id: &str, text: &str, now: Instant) -> Option<SpamReason> {
        let normalized = normalize(text);
        let count = {
            let mut recent = self.recent.lock().await;
            let history = recent.entry(user_id.to_string()).or_default();
            while history.front().is_some_and(|(_, t)| now.duration_since(*t) >= self.duplicate_window) {
                history.pop_front();
            }
            history.push_back((normalized.clone(), now));
            history.iter().filter(|(m, _)| *m == normalized).count()
        };

        if count >= self.duplicate_threshold {
            return Some(SpamReason::Duplicate { count });
        }
        if let Some(word) = self.blacklist.as_ref().and_then(|re| re.find(&normalized)) {
            return Some(SpamReason::Blacklisted(word.as_str().to_string()));
        }
        let links = self.count_links(text);
        if links > self.max_links {
            return Some(SpamReason::TooManyLinks(links));
        }
        None
    }

    pub async fn sweep(&self, now: Instant) -> usize {
        let mut recent = self.recent.lock().await;
        let before = recent.len();
        recent.retain(|_, h| h.back().is_some_and(|(_, t)| now.duration_since(*t) < self.duplicate_window));
        before - recent.len()
    }
}
