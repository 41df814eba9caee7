//! Render scheduling.
//!
//! Geometry and structural changes render on the next poll. Text content
//! edits are debounced: each edit pushes the deadline out by the debounce
//! window, so a burst of keystrokes renders once after the typing stops.
//! Quick mode (automation) bypasses the debounce, either until switched
//! off or, when entered through [`RenderScheduler::quick_mode_once`], only
//! until the next render is polled.
//!
//! Time is passed in by the caller, which keeps the scheduler deterministic
//! under test and independent of any particular event loop.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RenderScheduler {
    debounce: Duration,
    /// A render is due on the next poll.
    immediate: bool,
    /// Debounced text render deadline.
    deadline: Option<Instant>,
    quick_mode: bool,
    /// Leave quick mode once the next render has been polled.
    quick_once: bool,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl RenderScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            immediate: false,
            deadline: None,
            quick_mode: false,
            quick_once: false,
        }
    }

    /// Request a render after the debounce window, restarting any pending
    /// window.
    pub fn schedule_text_render(&mut self, now: Instant) {
        if self.quick_mode {
            self.render_now();
            return;
        }
        self.deadline = Some(now + self.debounce);
        log::trace!("text render deferred {:?}", self.debounce);
    }

    /// Request a render on the next poll. Supersedes a pending debounced
    /// render, since that render would show the same state.
    pub fn render_now(&mut self) {
        self.immediate = true;
        self.deadline = None;
    }

    pub fn set_quick_mode(&mut self, enabled: bool) {
        self.quick_mode = enabled;
        self.quick_once = false;
        if enabled && self.deadline.is_some() {
            self.render_now();
        }
    }

    /// Quick mode until the next render is polled. A no-op when quick mode
    /// is already on.
    pub fn quick_mode_once(&mut self) {
        if self.quick_mode {
            return;
        }
        self.set_quick_mode(true);
        self.quick_once = true;
    }

    pub fn quick_mode(&self) -> bool {
        self.quick_mode
    }

    /// Whether a render is due at `now`. Consumes the request when it is.
    pub fn poll(&mut self, now: Instant) -> bool {
        let due = if self.immediate {
            self.immediate = false;
            true
        } else {
            match self.deadline {
                Some(deadline) if deadline <= now => {
                    self.deadline = None;
                    true
                }
                _ => false,
            }
        };
        if due && self.quick_once {
            self.quick_once = false;
            self.quick_mode = false;
            log::trace!("quick mode off after render");
        }
        due
    }

    /// When the next render falls due, if one is pending. An immediate
    /// request is due at `now`.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        if self.immediate {
            Some(now)
        } else {
            self.deadline
        }
    }
}
