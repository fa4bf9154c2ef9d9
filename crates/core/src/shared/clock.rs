use std::time::Instant;

use chrono::{DateTime, Local};

/// A point in time as seen by the session: a monotonic instant for
/// interval arithmetic and a wall-clock stamp for naming and logging.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timestamp {
    pub instant: Instant,
    pub wall: DateTime<Local>,
}

/// Time source for the tick loop.
pub trait Clock: Send {
    fn now(&self) -> Timestamp;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp {
            instant: Instant::now(),
            wall: Local::now(),
        }
    }
}
