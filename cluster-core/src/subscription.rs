//! Pause/resume bookkeeping at topic and partition granularity.
//!
//! Consulted on every fetch (`is_paused`), so reads are a plain hash lookup
//! with no locking of their own — callers that share a `SubscriptionState`
//! across tasks wrap it in a `Mutex`/`RwLock` themselves, same as
//! `BrokerPool` wraps its own maps.

use std::collections::{HashMap, HashSet};

use crate::error::ClusterError;

#[derive(Debug, Default, Clone)]
struct TopicSubscription {
    partitions: HashSet<i32>,
    all: bool,
}

/// One entry of a `pause`/`resume` call. `partitions: None` means "the
/// whole topic".
#[derive(Debug, Clone)]
pub struct PauseEntry {
    pub topic: String,
    pub partitions: Option<Vec<i32>>,
}

impl PauseEntry {
    pub fn topic(topic: impl Into<String>) -> Self {
        PauseEntry {
            topic: topic.into(),
            partitions: None,
        }
    }

    pub fn partitions(topic: impl Into<String>, partitions: Vec<i32>) -> Self {
        PauseEntry {
            topic: topic.into(),
            partitions: Some(partitions),
        }
    }
}

/// A snapshot entry returned by [`SubscriptionState::paused`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PausedTopic {
    pub topic: String,
    pub partitions: Vec<i32>,
    pub all: bool,
}

/// Tracks which topics and partitions the consumer has paused.
///
/// Invariant: whenever `all` is true for a topic, that topic's `partitions`
/// set is empty. Transitioning out of `all` requires clearing `all` first —
/// `resume` with a specific partition list on an `all`-paused topic is
/// rejected rather than silently guessed at, because the set of originally
/// subscribed partitions isn't tracked here (see DESIGN.md).
#[derive(Debug, Default)]
pub struct SubscriptionState {
    topics: HashMap<String, TopicSubscription>,
}

impl SubscriptionState {
    pub fn new() -> Self {
        SubscriptionState {
            topics: HashMap::new(),
        }
    }

    pub fn pause(&mut self, entries: impl IntoIterator<Item = PauseEntry>) {
        for entry in entries {
            let state = self.topics.entry(entry.topic).or_default();
            match entry.partitions {
                Some(partitions) => {
                    state.partitions.extend(partitions);
                }
                None => {
                    state.all = true;
                    state.partitions.clear();
                }
            }
        }
    }

    /// Returns `Err(ClusterError::NonRetriable(_))` the moment it hits an
    /// entry that tries to selectively resume a topic currently paused via
    /// `all`. Entries processed before the offending one still take effect
    /// (matches the per-entry, no-rollback semantics of the original).
    pub fn resume(&mut self, entries: impl IntoIterator<Item = PauseEntry>) -> Result<(), ClusterError> {
        for entry in entries {
            let Some(state) = self.topics.get_mut(&entry.topic) else {
                continue;
            };
            match entry.partitions {
                Some(partitions) => {
                    if state.all {
                        return Err(ClusterError::NonRetriable(format!(
                            "cannot selectively resume partitions of `{}`: the topic is paused via a full-topic pause and its originally-subscribed partitions are not tracked",
                            entry.topic
                        )));
                    }
                    for partition in partitions {
                        state.partitions.remove(&partition);
                    }
                }
                None => {
                    state.all = false;
                    state.partitions.clear();
                }
            }
        }
        Ok(())
    }

    pub fn paused(&self) -> Vec<PausedTopic> {
        self.topics
            .iter()
            .map(|(topic, state)| PausedTopic {
                topic: topic.clone(),
                partitions: state.partitions.iter().copied().collect(),
                all: state.all,
            })
            .collect()
    }

    pub fn is_paused(&self, topic: &str, partition: i32) -> bool {
        match self.topics.get(topic) {
            Some(state) => state.all || state.partitions.contains(&partition),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_then_resume_specific_partitions_round_trips() {
        let mut subs = SubscriptionState::new();
        subs.pause([PauseEntry::partitions("t", vec![1, 2])]);
        assert!(subs.is_paused("t", 1));
        assert!(subs.is_paused("t", 2));

        subs.resume([PauseEntry::partitions("t", vec![1, 2])]).unwrap();
        let paused = subs.paused();
        assert_eq!(paused.len(), 1);
        assert_eq!(paused[0].topic, "t");
        assert!(paused[0].partitions.is_empty());
        assert!(!paused[0].all);
        assert!(!subs.is_paused("t", 1));
    }

    #[test]
    fn selective_resume_after_pause_all_is_non_retriable() {
        let mut subs = SubscriptionState::new();
        subs.pause([PauseEntry::topic("t")]);
        let err = subs.resume([PauseEntry::partitions("t", vec![0])]).unwrap_err();
        assert!(matches!(err, ClusterError::NonRetriable(_)));
        // The rejected resume must not have changed the pause state.
        assert!(subs.is_paused("t", 0));
    }

    #[test]
    fn full_topic_resume_clears_all() {
        let mut subs = SubscriptionState::new();
        subs.pause([PauseEntry::topic("t")]);
        subs.resume([PauseEntry::topic("t")]).unwrap();
        assert!(!subs.is_paused("t", 5));
    }

    #[test]
    fn resuming_an_untouched_topic_is_a_no_op() {
        let mut subs = SubscriptionState::new();
        subs.resume([PauseEntry::partitions("never-paused", vec![0])])
            .unwrap();
        assert!(!subs.is_paused("never-paused", 0));
    }
}
