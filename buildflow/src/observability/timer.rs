use std::time::Instant;

/// Measures the wall-clock duration of one step action.
#[derive(Debug)]
pub struct StepTimer {
    start: Instant,
    name: String,
}

impl StepTimer {
    /// Starts a new timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in whole milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Returns the name of what is being timed.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stops the timer and returns the duration in milliseconds.
    #[must_use]
    pub fn finish(self) -> u64 {
        self.elapsed_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_measures() {
        let timer = StepTimer::start("compile");
        std::thread::sleep(std::time::Duration::from_millis(5));

        assert_eq!(timer.name(), "compile");
        assert!(timer.finish() >= 5);
    }
}
