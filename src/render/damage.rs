//! Frame damage accumulation for a single output
//!
//! Damage arrives in output pixel coordinates with the origin at the current
//! workspace; rectangles may extend past the output bounds when they target
//! other workspaces of the grid. Everything inside the output bounds is also
//! mirrored to the display's own damage manager, which hands it back at
//! [`make_current`](DamageTracker::make_current) together with whatever it
//! tracked across buffer ages.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::output::{Output, OutputGone};
use crate::renderer::RuntimeFlags;
use crate::utils::{Monotonic, Physical, Point, Rectangle, Region, Time, Workspace};

#[derive(Debug, Default)]
pub(crate) struct DamageState {
    /// Damage accumulated since the last `make_current`, workspace-space
    frame_damage: Region,
    /// What `make_current` handed out for the frame currently in flight
    current_frame: Region,
    destroyed: bool,
}

/// Damage accumulator for a single output
#[derive(Clone)]
pub(crate) struct DamageTracker {
    output: Rc<dyn Output>,
    state: Rc<RefCell<DamageState>>,
    flags: RuntimeFlags,
}

impl DamageTracker {
    pub fn new(output: Rc<dyn Output>, flags: RuntimeFlags) -> Self {
        DamageTracker {
            output,
            state: Rc::new(RefCell::new(DamageState::default())),
            flags,
        }
    }

    /// The rectangle covering the whole output, in output pixels
    pub fn output_box(&self) -> Rectangle<i32, Physical> {
        Rectangle::from_size(self.output.size())
    }

    /// Accumulate a damaged rectangle and ask the display for a frame
    pub fn damage_box(&self, rect: Rectangle<i32, Physical>) {
        {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.frame_damage.unite_rect(rect);
        }
        self.output.add_box(rect);
        self.output.schedule_frame();
    }

    /// Accumulate a damaged region; `None` damages the whole output
    pub fn damage_region(&self, region: Option<&Region>) {
        let Some(region) = region else {
            self.damage_whole();
            return;
        };

        {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.frame_damage.unite(region);
        }
        self.output.add(region);
        self.output.schedule_frame();
    }

    /// Damage the whole output
    pub fn damage_whole(&self) {
        self.damage_box(self.output_box());
    }

    /// Make the display current and collect the damage for this frame
    ///
    /// On success `damage` holds the union of the display's tracked damage
    /// and the accumulated frame damage clipped to the output bounds; the
    /// output-sized rectangle is then subtracted from the accumulator so it
    /// does not re-accumulate across frames.
    pub fn make_current(&self, damage: &mut Region) -> Result<bool, OutputGone> {
        let needs_swap = self.output.make_current(damage)?;

        let output_box = self.output_box();
        let mut state = self.state.borrow_mut();

        let mut clipped = state.frame_damage.clone();
        clipped.intersect_rect(output_box);
        damage.unite(&clipped);

        if self.flags.contains(RuntimeFlags::NO_DAMAGE_TRACK) {
            damage.unite_rect(output_box);
        }

        state.frame_damage.subtract_rect(output_box);
        state.current_frame = damage.clone();

        trace!(?damage, needs_swap, "made output current");
        Ok(needs_swap)
    }

    /// Present `swap_damage` and forget all damage for the finished frame
    pub fn swap_buffers(&self, time: Time<Monotonic>, swap_damage: &Region) {
        self.output.swap_buffers(time, swap_damage);
        let mut state = self.state.borrow_mut();
        state.frame_damage.clear();
        state.current_frame.clear();
    }

    /// The damage falling on the workspace `ws`, in workspace-local
    /// coordinates
    ///
    /// Given the current workspace `(cx, cy)` and the output size `(sw, sh)`,
    /// this intersects the frame damage with the rectangle
    /// `((vx - cx) * sw, (vy - cy) * sh, sw, sh)` and translates the result
    /// by `((cx - vx) * sw, (cy - vy) * sh)`.
    pub fn get_ws_damage(&self, ws: Point<i32, Workspace>, current: Point<i32, Workspace>) -> Region {
        let size = self.output.size();
        let ws_box: Rectangle<i32, Physical> =
            Rectangle::new(((ws.x - current.x) * size.w, (ws.y - current.y) * size.h).into(), size);

        let state = self.state.borrow();
        let mut damage = state.frame_damage.clone();
        damage.unite(&state.current_frame);
        damage.intersect_rect(ws_box);
        damage.translate(((current.x - ws.x) * size.w, (current.y - ws.y) * size.h).into());
        damage
    }

    /// Whether any damage is pending for the frame in flight
    #[cfg(test)]
    pub fn has_frame_damage(&self) -> bool {
        let state = self.state.borrow();
        !state.frame_damage.is_empty() || !state.current_frame.is_empty()
    }

    /// Stop accepting damage; used once the output is gone
    pub fn set_destroyed(&self) {
        self.state.borrow_mut().destroyed = true;
    }

    #[cfg(test)]
    pub fn frame_damage(&self) -> Region {
        self.state.borrow().frame_damage.clone()
    }
}

impl std::fmt::Debug for DamageTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DamageTracker")
            .field("output", &self.output.name())
            .field("state", &self.state.borrow())
            .finish_non_exhaustive()
    }
}
