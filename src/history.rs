// src/history.rs - Bounded newest-first angle buffer
use std::collections::VecDeque;

/// Smallest depth that still holds the previous extreme next to the current one
pub const MIN_HISTORY_DEPTH: usize = 2;
pub const DEFAULT_HISTORY_DEPTH: usize = 10;

#[derive(Debug, Clone)]
pub struct AngleHistory {
    samples: VecDeque<f64>,
    depth: usize,
}

impl AngleHistory {
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(MIN_HISTORY_DEPTH);
        Self {
            samples: VecDeque::with_capacity(depth),
            depth,
        }
    }

    pub fn push(&mut self, angle: f64) {
        self.samples.push_front(angle);
        if self.samples.len() > self.depth {
            self.samples.pop_back();
        }
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<f64> {
        self.samples.front().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for AngleHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        let mut history = AngleHistory::default();
        assert_eq!(history.latest(), None);

        history.push(175.0);
        history.push(85.0);
        assert_eq!(history.latest(), Some(85.0));
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![85.0, 175.0]);
    }

    #[test]
    fn test_depth_is_capped() {
        let mut history = AngleHistory::new(3);
        for angle in [10.0, 20.0, 30.0, 40.0, 50.0] {
            history.push(angle);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![50.0, 40.0, 30.0]);
    }

    #[test]
    fn test_depth_floor() {
        let history = AngleHistory::new(0);
        assert_eq!(history.depth(), MIN_HISTORY_DEPTH);
    }
}
