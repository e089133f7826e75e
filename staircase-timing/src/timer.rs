use std::time::{Duration, Instant};

/// Monotonic clock used for reaction times and inter-trial pauses
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    fn now(&self) -> Self::Timestamp;
    fn elapsed(&self, ts: Self::Timestamp) -> Duration;
    fn sleep(&self, d: Duration);
}

/// Nanosecond timestamps relative to timer creation
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    start: Instant,
}

impl Timer for HighPrecisionTimer {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }

    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(not(target_os = "linux"))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC, EINTR, TIMER_ABSTIME};

        let mut deadline = timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `deadline` is a valid, writable timespec.
        unsafe {
            libc::clock_gettime(CLOCK_MONOTONIC, &mut deadline);
        }
        let total_nsec = deadline.tv_nsec as u64 + duration.subsec_nanos() as u64;
        deadline.tv_sec +=
            duration.as_secs() as libc::time_t + (total_nsec / 1_000_000_000) as libc::time_t;
        deadline.tv_nsec = (total_nsec % 1_000_000_000) as libc::c_long;

        // Absolute deadline so a signal interruption resumes without drift.
        loop {
            // SAFETY: `deadline` outlives the call; the remainder pointer may be null
            // for absolute sleeps.
            let rc = unsafe {
                clock_nanosleep(CLOCK_MONOTONIC, TIMER_ABSTIME, &deadline, std::ptr::null_mut())
            };
            if rc != EINTR {
                break;
            }
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}
