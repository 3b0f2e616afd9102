//! Queue navigation - the one place next/previous indices are worked out.

use super::QueueMode;
use rand::Rng;

/// What `next`/`previous` asks the state machine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Move focus to this index and play.
    Focus(usize),
    /// Keep the focus and restart it from zero.
    Replay,
    /// Nothing to advance to; stop playing.
    Stop,
    /// Leave everything as it is.
    Stay,
}

pub struct QueueNavigator {
    queue_len: usize,
    current_idx: Option<usize>,
    mode: QueueMode,
}

impl QueueNavigator {
    pub fn new(queue_len: usize, current_idx: Option<usize>, mode: QueueMode) -> Self {
        Self {
            queue_len,
            current_idx: current_idx.filter(|&idx| idx < queue_len),
            mode,
        }
    }

    pub fn next<R: Rng + ?Sized>(&self, rng: &mut R) -> Step {
        let Some(current) = self.current_idx else {
            return Step::Stay;
        };

        match self.mode {
            QueueMode::Single => Step::Replay,
            QueueMode::Shuffle => {
                if self.queue_len < 2 {
                    return Step::Stay;
                }
                // Draw from the other len-1 slots, skipping over the current one
                let pick = rng.gen_range(0..self.queue_len - 1);
                Step::Focus(if pick >= current { pick + 1 } else { pick })
            }
            QueueMode::Loop => {
                let next = (current + 1) % self.queue_len;
                if next == current {
                    Step::Stop
                } else {
                    Step::Focus(next)
                }
            }
        }
    }

    /// Previous never wraps, whatever the mode.
    pub fn previous(&self) -> Step {
        match self.current_idx {
            Some(current) if current > 0 => Step::Focus(current - 1),
            _ => Step::Stay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_loop_wraps() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(QueueNavigator::new(3, Some(0), QueueMode::Loop).next(&mut rng), Step::Focus(1));
        assert_eq!(QueueNavigator::new(3, Some(2), QueueMode::Loop).next(&mut rng), Step::Focus(0));
    }

    #[test]
    fn test_loop_single_item_stops() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(QueueNavigator::new(1, Some(0), QueueMode::Loop).next(&mut rng), Step::Stop);
    }

    #[test]
    fn test_single_replays() {
        let mut rng = StdRng::seed_from_u64(1);
        for len in 1..5 {
            let navigator = QueueNavigator::new(len, Some(0), QueueMode::Single);
            assert_eq!(navigator.next(&mut rng), Step::Replay);
        }
    }

    #[test]
    fn test_shuffle_never_repeats_current_and_covers_others() {
        let mut rng = StdRng::seed_from_u64(7);
        let nav = QueueNavigator::new(4, Some(2), QueueMode::Shuffle);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            match nav.next(&mut rng) {
                Step::Focus(idx) => {
                    assert_ne!(idx, 2);
                    assert!(idx < 4);
                    seen.insert(idx);
                }
                other => panic!("unexpected step {:?}", other),
            }
        }
        assert_eq!(seen, HashSet::from([0, 1, 3]));
    }

    #[test]
    fn test_shuffle_single_item_stays() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(QueueNavigator::new(1, Some(0), QueueMode::Shuffle).next(&mut rng), Step::Stay);
    }

    #[test]
    fn test_no_focus_stays() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(QueueNavigator::new(3, None, QueueMode::Loop).next(&mut rng), Step::Stay);
        assert_eq!(QueueNavigator::new(3, Some(9), QueueMode::Loop).next(&mut rng), Step::Stay);
        assert_eq!(QueueNavigator::new(3, None, QueueMode::Loop).previous(), Step::Stay);
    }

    #[test]
    fn test_previous_does_not_wrap() {
        assert_eq!(QueueNavigator::new(3, Some(0), QueueMode::Loop).previous(), Step::Stay);
        assert_eq!(QueueNavigator::new(3, Some(2), QueueMode::Shuffle).previous(), Step::Focus(1));
    }
}
