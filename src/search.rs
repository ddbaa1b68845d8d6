//! Search controller primitives: query classification, suggestion matching,
//! random batch sampling and the debounce timer.
//!
//! Time is measured on the reducer's tick clock (milliseconds since start),
//! which keeps every timer here deterministic.

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEBOUNCE_MS: u64 = 300;
/// Delay before suggestions hide after the search box loses focus.
pub const BLUR_GRACE_MS: u64 = 200;
pub const MIN_LOOKUP_LEN: usize = 3;
pub const MAX_SUGGESTIONS: usize = 5;
pub const ROSTER_SIZE: u16 = 151;
pub const RANDOM_BATCH_SIZE: usize = 3;

/// A request that replaces the grid contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridRequest {
    RandomBatch,
    Lookup(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchIntent {
    /// Empty box: show a fresh random batch.
    RandomBatch,
    /// One or two characters: suggestions only.
    SuggestOnly,
    /// Three or more characters: suggestions plus a lookup of the exact text.
    Lookup(String),
}

impl SearchIntent {
    pub fn request(self) -> Option<GridRequest> {
        match self {
            SearchIntent::RandomBatch => Some(GridRequest::RandomBatch),
            SearchIntent::SuggestOnly => None,
            SearchIntent::Lookup(query) => Some(GridRequest::Lookup(query)),
        }
    }
}

pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn classify(raw: &str) -> SearchIntent {
    let query = normalize_query(raw);
    match query.chars().count() {
        0 => SearchIntent::RandomBatch,
        len if len < MIN_LOOKUP_LEN => SearchIntent::SuggestOnly,
        _ => SearchIntent::Lookup(query),
    }
}

/// Roster names containing `raw` case-insensitively, in roster order, at most
/// `limit` of them.
pub fn suggest(roster: &[String], raw: &str, limit: usize) -> Vec<String> {
    let query = normalize_query(raw);
    if query.is_empty() {
        return Vec::new();
    }
    roster
        .iter()
        .filter(|name| name.to_lowercase().contains(&query))
        .take(limit)
        .cloned()
        .collect()
}

/// Capitalizes the first letter, leaving the rest untouched.
pub fn display_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `count` distinct ids drawn from `1..=max`.
pub fn random_ids<R: Rng + ?Sized>(rng: &mut R, count: usize, max: u16) -> Vec<u16> {
    let length = max as usize;
    rand::seq::index::sample(rng, length, count.min(length))
        .into_iter()
        .map(|index| index as u16 + 1)
        .collect()
}

/// A single pending task that fires once `delay_ms` pass without being
/// rescheduled. Scheduling replaces whatever was pending.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Debouncer<T> {
    delay_ms: u64,
    pending: Option<Scheduled<T>>,
    scheduled_count: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Scheduled<T> {
    due_at: u64,
    task: T,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
            scheduled_count: 0,
        }
    }

    /// Replaces any pending task and restarts the timer from `now`.
    pub fn schedule(&mut self, now: u64, task: T) {
        self.scheduled_count += 1;
        self.pending = Some(Scheduled {
            due_at: now.saturating_add(self.delay_ms),
            task,
        });
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|scheduled| scheduled.task)
    }

    /// Takes the pending task without waiting for its deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.cancel()
    }

    /// Takes the pending task if its deadline has passed.
    pub fn poll(&mut self, now: u64) -> Option<T> {
        if self.due_at().is_some_and(|due_at| due_at <= now) {
            self.cancel()
        } else {
            None
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn due_at(&self) -> Option<u64> {
        self.pending.as_ref().map(|scheduled| scheduled.due_at)
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|scheduled| &scheduled.task)
    }

    /// How many times `schedule` has been called.
    pub fn scheduled_count(&self) -> u64 {
        self.scheduled_count
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEBOUNCE_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn roster() -> Vec<String> {
        [
            "bulbasaur",
            "pikachu",
            "raichu",
            "pidgey",
            "pidgeotto",
            "pidgeot",
            "pinsir",
            "slowpoke",
            "poliwag",
        ]
        .iter()
        .map(|name| name.to_string())
        .collect()
    }

    #[test]
    fn test_classify_by_length() {
        assert_eq!(classify(""), SearchIntent::RandomBatch);
        assert_eq!(classify("   "), SearchIntent::RandomBatch);
        assert_eq!(classify("p"), SearchIntent::SuggestOnly);
        assert_eq!(classify("pi"), SearchIntent::SuggestOnly);
        assert_eq!(classify(" PIK "), SearchIntent::Lookup("pik".into()));
    }

    #[test]
    fn test_suggestions_are_capped_and_ordered() {
        let found = suggest(&roster(), "pi", MAX_SUGGESTIONS);
        assert_eq!(
            found,
            vec!["pikachu", "pidgey", "pidgeotto", "pidgeot", "pinsir"]
        );
    }

    #[test]
    fn test_suggestions_match_case_insensitively() {
        let found = suggest(&roster(), "CHU", MAX_SUGGESTIONS);
        assert_eq!(found, vec!["pikachu", "raichu"]);
        for name in &found {
            assert!(name.contains("chu"));
        }
    }

    #[test]
    fn test_empty_query_has_no_suggestions() {
        assert!(suggest(&roster(), "", MAX_SUGGESTIONS).is_empty());
        assert!(suggest(&roster(), "zzz", MAX_SUGGESTIONS).is_empty());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("pikachu"), "Pikachu");
        assert_eq!(display_name("mr-mime"), "Mr-mime");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn test_random_ids_are_distinct_and_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut ids = random_ids(&mut rng, 3, ROSTER_SIZE);
            assert_eq!(ids.len(), 3);
            assert!(ids.iter().all(|id| (1..=ROSTER_SIZE).contains(id)));
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), 3);
        }
    }

    #[test]
    fn test_random_ids_never_exceed_roster() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut ids = random_ids(&mut rng, 500, 10);
        ids.sort_unstable();
        assert_eq!(ids, (1..=10).collect::<Vec<u16>>());
    }

    #[test]
    fn test_debouncer_fires_once_after_quiet_period() {
        let mut debounce = Debouncer::new(300);
        debounce.schedule(0, "p");
        debounce.schedule(100, "pi");
        debounce.schedule(250, "pik");

        assert_eq!(debounce.poll(500), None);
        assert_eq!(debounce.poll(550), Some("pik"));
        assert_eq!(debounce.poll(10_000), None);
        assert!(!debounce.is_pending());
    }

    #[test]
    fn test_debouncer_cancel_and_flush() {
        let mut debounce = Debouncer::new(300);
        debounce.schedule(0, 1);
        assert_eq!(debounce.cancel(), Some(1));
        assert_eq!(debounce.poll(1_000), None);

        debounce.schedule(0, 2);
        assert_eq!(debounce.flush(), Some(2));
        assert_eq!(debounce.scheduled_count(), 2);
    }
}
