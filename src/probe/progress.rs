// src/probe/progress.rs
// =============================================================================
// Progress reporting for long probe runs.
//
// After each completed task the tracker computes floor(processed/total*100)
// and reports once every time that crosses a new multiple of 2%.
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub processed: usize,
    pub total: usize,
    pub percent: usize,
}

/// Receives progress updates from the scheduler
pub trait ProgressObserver {
    fn on_progress(&mut self, update: ProgressUpdate);
}

impl<F: FnMut(ProgressUpdate)> ProgressObserver for F {
    fn on_progress(&mut self, update: ProgressUpdate) {
        self(update)
    }
}

#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    processed: usize,
    next_threshold: usize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
            next_threshold: 0,
        }
    }

    /// Counts one completed task; returns an update when a new threshold
    /// was reached
    pub fn advance(&mut self) -> Option<ProgressUpdate> {
        self.processed += 1;
        if self.total == 0 {
            return None;
        }

        let percent = self.processed * 100 / self.total;
        if percent < self.next_threshold {
            return None;
        }

        // Skip every threshold this jump already covered
        self.next_threshold = percent - percent % 2 + 2;

        Some(ProgressUpdate {
            processed: self.processed,
            total: self.total,
            percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_runs_report_every_task() {
        let mut tracker = ProgressTracker::new(4);
        let percents: Vec<usize> = (0..4).filter_map(|_| tracker.advance()).map(|u| u.percent).collect();
        assert_eq!(percents, vec![25, 50, 75, 100]);
    }

    #[test]
    fn test_large_runs_report_each_threshold_once() {
        let mut tracker = ProgressTracker::new(1000);
        let updates: Vec<ProgressUpdate> = (0..1000).filter_map(|_| tracker.advance()).collect();

        // 0%, 2%, 4%, ... 100%
        assert_eq!(updates.len(), 51);
        assert_eq!(updates.first().map(|u| u.percent), Some(0));
        assert_eq!(updates.last().map(|u| (u.processed, u.percent)), Some((1000, 100)));
        assert!(updates.windows(2).all(|w| w[0].percent < w[1].percent));
    }

    #[test]
    fn test_closure_is_an_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |u: ProgressUpdate| seen.push(u.percent);
            observer.on_progress(ProgressUpdate {
                processed: 1,
                total: 2,
                percent: 50,
            });
        }
        assert_eq!(seen, vec![50]);
    }
}
