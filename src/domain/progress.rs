use log::info;

/// Track progress of tournament loading
pub struct LoadProgress {
    total: usize,
    loaded: usize,
    skipped: usize,
}

impl LoadProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            loaded: 0,
            skipped: 0,
        }
    }

    pub fn increment_loaded(&mut self) {
        self.loaded += 1;
        self.log_progress();
    }

    pub fn increment_skipped(&mut self) {
        self.skipped += 1;
        self.log_progress();
    }

    pub fn current_count(&self) -> usize {
        self.loaded + self.skipped
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn log_progress(&self) {
        let current = self.current_count();
        if should_log(current, self.total) {
            info!(
                "  → Progress: {}/{} ({} loaded, {} skipped)",
                current, self.total, self.loaded, self.skipped
            );
        }
    }
}

fn should_log(current: usize, total: usize) -> bool {
    is_milestone(current) || is_complete(current, total)
}

fn is_milestone(count: usize) -> bool {
    count % 100 == 0
}

fn is_complete(current: usize, total: usize) -> bool {
    current == total
}
