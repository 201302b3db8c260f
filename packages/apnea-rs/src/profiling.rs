//! Wall-time logging for the load pipeline

use std::time::{Duration, Instant};

/// Logs how long a stage took over `recordings` recordings when dropped
pub struct ProfileScope {
    stage: &'static str,
    recordings: usize,
    start: Instant,
}

impl ProfileScope {
    pub fn new(stage: &'static str, recordings: usize) -> Self {
        Self {
            stage,
            recordings,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Mean wall time per recording; zero for an empty stage
    pub fn per_recording(&self) -> Duration {
        match u32::try_from(self.recordings) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.elapsed() / n,
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        log::info!(
            "[PROFILE] stage={} recordings={} elapsed_ms={:.3} per_recording_ms={:.3}",
            self.stage,
            self.recordings,
            self.elapsed().as_secs_f64() * 1000.0,
            self.per_recording().as_secs_f64() * 1000.0
        );
    }
}

/// Time the rest of the enclosing block
#[macro_export]
macro_rules! profile_scope {
    ($stage:expr, $recordings:expr) => {
        let _profile_scope = $crate::profiling::ProfileScope::new($stage, $recordings);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_recording_of_empty_stage_is_zero() {
        let scope = ProfileScope::new("load", 0);
        assert_eq!(scope.per_recording(), Duration::ZERO);
    }

    #[test]
    fn test_per_recording_does_not_exceed_elapsed() {
        let scope = ProfileScope::new("load", 4);
        std::thread::sleep(Duration::from_millis(2));
        assert!(scope.per_recording() <= scope.elapsed());
        assert!(scope.elapsed() >= Duration::from_millis(2));
    }
}
