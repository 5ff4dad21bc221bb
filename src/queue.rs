//! FIFO queue of pending downloads, with the single-active-download flag.

use std::collections::VecDeque;

use crate::model::DownloadTask;

/// Tasks leave in arrival order; `take_next` hands one out only while no
/// download is running, so at most one task is ever active.
#[derive(Debug, Default)]
pub struct DownloadQueue {
    pending: VecDeque<DownloadTask>,
    active: bool,
}

impl DownloadQueue {
    pub fn push(&mut self, task: DownloadTask) {
        self.pending.push_back(task);
    }

    /// Next task to run, if any and if nothing is active. Marks the queue
    /// busy until [`finish_active`](Self::finish_active).
    pub fn take_next(&mut self) -> Option<DownloadTask> {
        if self.active {
            return None;
        }
        let task = self.pending.pop_front()?;
        self.active = true;
        Some(task)
    }

    /// Called when the active download reaches a terminal state,
    /// whatever the outcome.
    pub fn finish_active(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drops everything that has not started yet.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Quality;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn task(n: usize) -> DownloadTask {
        DownloadTask {
            url: format!("https://youtu.be/{n}"),
            quality: Quality::P720,
            dest_dir: PathBuf::from("/tmp"),
        }
    }

    #[test]
    fn n_queued_tasks_run_as_n_sequential_attempts() {
        let mut queue = DownloadQueue::default();
        for n in 0..5 {
            queue.push(task(n));
        }

        let mut attempts = Vec::new();
        while let Some(next) = queue.take_next() {
            attempts.push(next.url);
            // nothing else can start while this one runs
            assert!(queue.take_next().is_none());
            queue.finish_active();
        }

        let expected: Vec<String> = (0..5).map(|n| format!("https://youtu.be/{n}")).collect();
        assert_eq!(attempts, expected);
        assert_eq!(queue.pending_len(), 0);
    }

    #[test]
    fn take_next_marks_the_queue_busy() {
        let mut queue = DownloadQueue::default();
        queue.push(task(0));
        assert!(!queue.is_active());
        assert!(queue.take_next().is_some());
        assert!(queue.is_active());
        queue.finish_active();
        assert!(!queue.is_active());
    }

    #[test]
    fn clear_pending_keeps_the_active_task() {
        let mut queue = DownloadQueue::default();
        queue.push(task(0));
        queue.push(task(1));
        let _running = queue.take_next().unwrap();
        queue.clear_pending();
        assert!(queue.is_active());
        assert_eq!(queue.pending_len(), 0);
        queue.finish_active();
        assert!(queue.take_next().is_none());
    }
}
