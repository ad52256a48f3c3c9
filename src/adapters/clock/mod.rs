// Clock adapter - Local wall-clock time

use chrono::{Local, NaiveDateTime};

use crate::ports::ClockPort;

/// Reads the local wall clock
#[derive(Debug, Default, Clone)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone)]
pub struct FixedClock(pub NaiveDateTime);

impl ClockPort for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
