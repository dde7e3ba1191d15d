//! Repaint scheduling against the display's frame events
//!
//! Redraw requests are coalesced through the event loop: at most one idle
//! redraw and one idle damage-refresh are in flight at any time. The
//! `constant_redraw` and `output_inhibit` counters are reference-counted
//! booleans with paired increment/decrement; the raw counts are never
//! exposed.

use std::cell::RefCell;
use std::rc::Rc;

use crate::event_loop::{EventLoop, IdleSource};
use crate::output::Output;
use crate::render::damage::DamageTracker;

#[derive(Debug, Default)]
struct SchedulerState {
    idle_redraw: Option<IdleSource>,
    idle_damage: Option<IdleSource>,
    constant_redraw: u32,
    output_inhibit: u32,
}

pub(crate) struct FrameScheduler {
    output: Rc<dyn Output>,
    event_loop: Rc<dyn EventLoop>,
    state: Rc<RefCell<SchedulerState>>,
}

impl FrameScheduler {
    pub fn new(output: Rc<dyn Output>, event_loop: Rc<dyn EventLoop>) -> Self {
        FrameScheduler {
            output,
            event_loop,
            state: Rc::new(RefCell::new(SchedulerState::default())),
        }
    }

    /// Request a frame once the event loop goes idle
    ///
    /// Multiple calls before the idle callback ran collapse into one.
    pub fn schedule_redraw(&self) {
        let mut state = self.state.borrow_mut();
        if state.idle_redraw.is_some() {
            return;
        }

        let shared = self.state.clone();
        let output = self.output.clone();
        let source = self.event_loop.add_idle(Box::new(move || {
            shared.borrow_mut().idle_redraw = None;
            output.schedule_frame();
        }));
        state.idle_redraw = Some(source);
    }

    /// Request a frame right away
    pub fn schedule_repaint(&self) {
        self.output.schedule_frame();
    }

    /// Damage the whole output once the event loop goes idle
    pub fn schedule_idle_damage(&self, damage: DamageTracker) {
        let mut state = self.state.borrow_mut();
        if state.idle_damage.is_some() {
            return;
        }

        let shared = self.state.clone();
        let source = self.event_loop.add_idle(Box::new(move || {
            shared.borrow_mut().idle_damage = None;
            damage.damage_whole();
        }));
        state.idle_damage = Some(source);
    }

    /// Reference-count continuous redrawing
    ///
    /// While at least one caller enabled it, every finished frame schedules
    /// the next one.
    pub fn auto_redraw(&self, enable: bool) {
        let schedule = {
            let mut state = self.state.borrow_mut();
            if enable {
                state.constant_redraw += 1;
                state.constant_redraw == 1
            } else {
                state.constant_redraw = state.constant_redraw.saturating_sub(1);
                false
            }
        };

        if schedule {
            self.schedule_redraw();
        }
    }

    /// Whether continuous redrawing is currently requested
    pub fn constant_redraw(&self) -> bool {
        self.state.borrow().constant_redraw > 0
    }

    /// Reference-count rendering inhibition
    ///
    /// Returns `true` when the last inhibitor was just released.
    pub fn add_inhibit(&self, inhibit: bool) -> bool {
        let mut state = self.state.borrow_mut();
        if inhibit {
            state.output_inhibit += 1;
            false
        } else {
            let was = state.output_inhibit;
            state.output_inhibit = was.saturating_sub(1);
            was == 1
        }
    }

    /// Whether rendering is currently inhibited
    pub fn inhibited(&self) -> bool {
        self.state.borrow().output_inhibit > 0
    }

    /// Whether an idle redraw is queued but has not run yet
    pub fn is_redraw_pending(&self) -> bool {
        self.state.borrow().idle_redraw.is_some()
    }

    /// Cancel all queued idle callbacks
    pub fn cancel_idles(&self) {
        let mut state = self.state.borrow_mut();
        if let Some(source) = state.idle_redraw.take() {
            self.event_loop.remove(source);
        }
        if let Some(source) = state.idle_damage.take() {
            self.event_loop.remove(source);
        }
    }
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("output", &self.output.name())
            .field("state", &self.state.borrow())
            .finish_non_exhaustive()
    }
}
