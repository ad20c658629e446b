use crate::domain::LogLevel;

/// Global minimum-severity filter applied before anything is queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityGate {
    threshold: LogLevel,
}

impl SeverityGate {
    pub fn new(threshold: LogLevel) -> Self {
        Self { threshold }
    }

    #[inline]
    pub fn admit(&self, level: LogLevel) -> bool {
        level >= self.threshold
    }

    pub fn threshold(&self) -> LogLevel {
        self.threshold
    }
}

impl Default for SeverityGate {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}
