//! Contract towards the physical display
//!
//! An [`Output`] hands the render manager everything it needs to know about
//! one display: its mode, the damage the display server tracked between
//! buffer swaps, and a way to ask for the next frame event. The display and
//! its damage manager are owned by the display server; the render manager
//! only talks to them through this trait.

use crate::utils::{Logical, Monotonic, Physical, Rectangle, Region, Size, Time, Transform};

/// Error returned when the display behind an [`Output`] can no longer be
/// rendered to
#[derive(Debug, thiserror::Error)]
#[error("Output has no frame to render to")]
pub struct OutputGone;

/// A handle to a single physical display and its damage manager
pub trait Output {
    /// A human-readable identifier for logging
    fn name(&self) -> &str;

    /// Size of the display in raw pixels, before the transform is applied
    fn size(&self) -> Size<i32, Physical>;

    /// The integer scale factor of the display
    fn scale(&self) -> i32;

    /// The transform applied when scanning out
    fn transform(&self) -> Transform;

    /// The pixel resolution after applying the transform
    fn transformed_resolution(&self) -> Size<i32, Physical> {
        self.transform().transform_size(self.size())
    }

    /// The logical geometry of this output with its origin at the top-left
    fn relative_geometry(&self) -> Rectangle<i32, Logical> {
        Rectangle::from_size(self.transformed_resolution()).to_logical(self.scale())
    }

    /// Ask the display to deliver a frame event when it is ready for a new
    /// buffer
    fn schedule_frame(&self);

    /// Report a damaged rectangle to the display's damage manager
    fn add_box(&self, rect: Rectangle<i32, Physical>);

    /// Report a damaged region to the display's damage manager
    fn add(&self, region: &Region) {
        for &rect in region.rects() {
            self.add_box(rect);
        }
    }

    /// Make the display current for rendering
    ///
    /// On success, `damage` is extended with the damage the display tracked
    /// since the last swap and the returned flag tells whether the display
    /// needs a buffer swap at all.
    fn make_current(&self, damage: &mut Region) -> Result<bool, OutputGone>;

    /// Swap buffers, presenting `damage` at time `time`
    fn swap_buffers(&self, time: Time<Monotonic>, damage: &Region);
}
