use std::sync::atomic::{AtomicU64, Ordering};

/// Issues order ids of the form `{prefix}{unix_millis}`.
///
/// The numeric part never repeats within one generator: when two requests land
/// in the same millisecond (or the clock steps back) the last issued value is
/// bumped by one. Ids are not coordinated across processes.
#[derive(Debug)]
pub struct OrderIdGenerator {
    prefix: String,
    last_issued: AtomicU64,
}

impl OrderIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last_issued: AtomicU64::new(0),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn next_id(&self) -> String {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        let issued = self.next_value(now);
        format!("{}{}", self.prefix, issued)
    }

    fn next_value(&self, now: u64) -> u64 {
        let previous = self
            .last_issued
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}
