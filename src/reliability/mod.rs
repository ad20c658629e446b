pub mod clock;
pub mod failure_reporter;

pub use clock::{Clock, ManualClock, SystemClock};
pub use failure_reporter::FailureReporter;
