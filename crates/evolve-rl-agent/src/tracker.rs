//! Episode buffers for batched episodic learners

use evolve_rl_core::{Action, RLError, Result, State, Trajectory};

/// Buffers `(state, action, reward)` trajectories for the last `N` episodes
#[derive(Debug, Clone)]
pub struct EpisodeTracker {
    /// One trajectory slot per episode in the batch
    episodes: Vec<Trajectory>,
    /// Episodes completed since the last wipe
    completed: usize,
    /// Steps recorded in the current episode
    t: usize,
}

impl EpisodeTracker {
    /// Create a tracker that signals after `n` episodes
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(RLError::Config(
                "episode tracker needs at least one episode per batch".to_string(),
            ));
        }
        Ok(Self {
            episodes: vec![Trajectory::new(); n],
            completed: 0,
            t: 0,
        })
    }

    /// Append a step to the current episode
    pub fn update(&mut self, state: &State, action: Action, reward: f64) -> Result<()> {
        self.current()?.push(state.clone(), action, reward);
        self.t += 1;
        Ok(())
    }

    /// Append the final step of the current episode.
    ///
    /// Returns `true` once `N` episodes have completed since the last wipe.
    pub fn last_update(&mut self, state: &State, action: Action, reward: f64) -> Result<bool> {
        self.current()?.push(state.clone(), action, reward);
        self.completed += 1;
        self.t = 0;
        Ok(self.completed == self.capacity())
    }

    /// Empty every slot and zero both counters
    pub fn wipe(&mut self) {
        self.episodes.iter_mut().for_each(Trajectory::clear);
        self.completed = 0;
        self.t = 0;
    }

    /// Completed episodes of the current batch, in order
    #[must_use]
    pub fn episodes(&self) -> &[Trajectory] {
        &self.episodes[..self.completed]
    }

    /// Episodes completed since the last wipe
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Steps recorded in the current episode
    #[must_use]
    pub fn steps_in_episode(&self) -> usize {
        self.t
    }

    /// Batch size `N`
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.episodes.len()
    }

    /// Check whether every slot is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.episodes.iter().all(Trajectory::is_empty)
    }

    fn current(&mut self) -> Result<&mut Trajectory> {
        let completed = self.completed;
        self.episodes.get_mut(completed).ok_or_else(|| {
            RLError::Protocol(format!(
                "episode tracker already holds a full batch of {completed} episodes"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn s(i: usize) -> State {
        State::one_hot(i, 8).unwrap()
    }

    #[test]
    fn test_zero_batch_rejected() {
        assert!(EpisodeTracker::new(0).is_err());
    }

    #[test]
    fn test_update_does_not_complete_episode() {
        let mut tracker = EpisodeTracker::new(2).unwrap();
        tracker.update(&s(0), 1, 0.5).unwrap();
        tracker.update(&s(1), 0, 0.0).unwrap();

        assert_eq!(tracker.completed(), 0);
        assert_eq!(tracker.steps_in_episode(), 2);
        assert!(tracker.episodes().is_empty());
    }

    #[test]
    fn test_batch_ready_and_wipe() {
        let mut tracker = EpisodeTracker::new(2).unwrap();
        tracker.update(&s(0), 1, 0.0).unwrap();
        assert!(!tracker.last_update(&s(1), 2, 1.0).unwrap());
        assert_eq!(tracker.steps_in_episode(), 0);
        assert_eq!(tracker.episodes().len(), 1);
        assert_eq!(tracker.episodes()[0].len(), 2);

        assert!(tracker.last_update(&s(2), 3, -1.0).unwrap());
        assert_eq!(tracker.episodes().len(), 2);
        assert_eq!(tracker.episodes()[1].len(), 1);

        tracker.wipe();
        assert_eq!(tracker.completed(), 0);
        assert_eq!(tracker.steps_in_episode(), 0);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_overflow_without_wipe_is_protocol_error() {
        let mut tracker = EpisodeTracker::new(1).unwrap();
        assert!(tracker.last_update(&s(0), 0, 0.0).unwrap());
        assert!(matches!(
            tracker.update(&s(0), 0, 0.0),
            Err(RLError::Protocol(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_ready_exactly_at_n(
            n in 1usize..8,
            lengths in proptest::collection::vec(0usize..6, 1..8),
        ) {
            let mut tracker = EpisodeTracker::new(n).unwrap();
            let mut since_wipe = 0;

            for len in lengths.iter().cycle().take(3 * n) {
                for t in 0..*len {
                    tracker.update(&s(t % 8), 0, 1.0).unwrap();
                }
                let ready = tracker.last_update(&s(0), 0, 1.0).unwrap();
                since_wipe += 1;

                prop_assert_eq!(ready, since_wipe == n);
                prop_assert!(tracker.episodes().len() <= n);

                if ready {
                    tracker.wipe();
                    since_wipe = 0;
                    prop_assert_eq!(tracker.completed(), 0);
                    prop_assert!(tracker.is_empty());
                }
            }
        }
    }
}
