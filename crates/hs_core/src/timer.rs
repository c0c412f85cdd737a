//! Cooperative timer scheduler.
//!
//! Timers never run code themselves. Each timer carries a small payload value;
//! `advance()` returns the payloads of every timer that fired during the step,
//! and the owning scene dispatches them. Entities that start a repeating timer
//! keep the returned `TimerHandle` and `remove()` it when they deactivate, so a
//! timer can never fire against an entity that is gone.
//!
//! Timing is integer microseconds, matching the fixed-step clock.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
pub struct TimerConfig {
    pub delay_us: u64,
    pub repeat: bool,
    pub start_paused: bool,
}

impl TimerConfig {
    pub fn once_ms(delay_ms: u64) -> Self {
        Self {
            delay_us: delay_ms * 1000,
            repeat: false,
            start_paused: false,
        }
    }

    pub fn repeating_ms(delay_ms: u64) -> Self {
        Self {
            delay_us: delay_ms * 1000,
            repeat: true,
            start_paused: false,
        }
    }

    pub fn paused(mut self) -> Self {
        self.start_paused = true;
        self
    }
}

#[derive(Debug)]
struct TimerEntry<E> {
    handle: TimerHandle,
    delay_us: u64,
    elapsed_us: u64,
    repeat: bool,
    paused: bool,
    done: bool,
    payload: E,
}

#[derive(Debug)]
pub struct TimerScheduler<E> {
    timers: Vec<TimerEntry<E>>,
    next_id: u64,
}

impl<E: Copy> TimerScheduler<E> {
    pub fn new() -> Self {
        Self {
            timers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn add(&mut self, config: TimerConfig, payload: E) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.timers.push(TimerEntry {
            handle,
            // A zero delay would fire every step forever; clamp to one microsecond.
            delay_us: config.delay_us.max(1),
            elapsed_us: 0,
            repeat: config.repeat,
            paused: config.start_paused,
            done: false,
            payload,
        });
        handle
    }

    /// Returns false when the handle no longer refers to a live timer.
    pub fn set_paused(&mut self, handle: TimerHandle, paused: bool) -> bool {
        match self.timers.iter_mut().find(|t| t.handle == handle) {
            Some(timer) => {
                timer.paused = paused;
                true
            }
            None => false,
        }
    }

    pub fn is_paused(&self, handle: TimerHandle) -> Option<bool> {
        self.timers
            .iter()
            .find(|t| t.handle == handle)
            .map(|t| t.paused)
    }

    pub fn remove(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.handle != handle);
        self.timers.len() != before
    }

    pub fn contains(&self, handle: TimerHandle) -> bool {
        self.timers.iter().any(|t| t.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Advance every unpaused timer by `dt_us`. A timer fires at most once per
    /// call; a repeating timer carries the overshoot into its next period and a
    /// one-shot timer is dropped after firing. Payloads come back in creation
    /// order.
    pub fn advance(&mut self, dt_us: u64) -> Vec<E> {
        let mut fired = Vec::new();
        for timer in self.timers.iter_mut().filter(|t| !t.paused) {
            timer.elapsed_us += dt_us;
            if timer.elapsed_us >= timer.delay_us {
                fired.push(timer.payload);
                if timer.repeat {
                    timer.elapsed_us = (timer.elapsed_us - timer.delay_us).min(timer.delay_us.saturating_sub(1));
                } else {
                    timer.done = true;
                }
            }
        }
        self.timers.retain(|t| !t.done);
        fired
    }
}

impl<E: Copy> Default for TimerScheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}
