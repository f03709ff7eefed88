//! Post-trigger sample counting.

/// Counts post-trigger samples and reports when the window is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureWindow {
    pre_n: usize,
    post_n: usize,
    count: usize,
}

impl CaptureWindow {
    /// Window of `pre_n` resident plus `post_n` fresh samples.
    pub fn new(pre_n: usize, post_n: usize) -> Self {
        Self {
            pre_n,
            post_n,
            count: 0,
        }
    }

    /// Start counting from zero.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Count one post-trigger sample. Saturates at `post_n`.
    pub fn record(&mut self) {
        if self.count < self.post_n {
            self.count += 1;
        }
    }

    /// Post-trigger samples counted so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// True once `post_n` samples have been counted.
    pub fn is_complete(&self) -> bool {
        is_complete(self.count, self.post_n)
    }

    /// Samples per channel in a complete window.
    pub fn len(&self) -> usize {
        self.pre_n + self.post_n
    }

    /// True for a window of zero samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row of the completed window holding the trigger sample.
    pub fn trigger_row(&self) -> usize {
        self.pre_n
    }
}

/// Completion rule.
pub fn is_complete(count: usize, post_n: usize) -> bool {
    count >= post_n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_after_post_n_samples() {
        let mut window = CaptureWindow::new(6, 4);
        assert_eq!(window.len(), 10);
        assert_eq!(window.trigger_row(), 6);
        for _ in 0..3 {
            window.record();
            assert!(!window.is_complete());
        }
        window.record();
        assert!(window.is_complete());
        window.record();
        assert_eq!(window.count(), 4);

        window.reset();
        assert!(!window.is_complete());
    }

    #[test]
    fn completion_rule() {
        assert!(!is_complete(0, 1));
        assert!(is_complete(1, 1));
        assert!(is_complete(5, 4));
    }
}
