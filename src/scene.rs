//! Contracts towards the compositor's scene graph
//!
//! The render manager does not own views or surfaces; it consumes them
//! through the traits in this module. One [`Compositor`] implementation is
//! injected per manager and stands in for the workspace grid, the view
//! stacking order and the input manager's software cursors and drag icons.

use std::rc::Rc;

use crate::renderer::{RenderTarget, Renderer};
use crate::utils::{Monotonic, Physical, Point, Rectangle, Region, Size, Time, Workspace};

bitflags::bitflags! {
    /// The scene layers a view can live on
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Layers: u32 {
        /// Wallpapers and other background views
        const BACKGROUND = 1 << 0;
        /// Views stacked just above the background (docks)
        const BOTTOM = 1 << 1;
        /// Regular application views
        const WORKSPACE = 1 << 2;
        /// Panels and bars stacked above applications
        const TOP = 1 << 3;
        /// Views that escape normal stacking entirely (lock screens, menus)
        const UNMANAGED = 1 << 4;

        /// The layers below regular applications
        const BELOW = Self::BACKGROUND.bits() | Self::BOTTOM.bits();
        /// The layer holding regular applications
        const MIDDLE = Self::WORKSPACE.bits();
        /// The layers above regular applications
        const ABOVE = Self::TOP.bits() | Self::UNMANAGED.bits();

        /// Every layer
        const ALL = Self::BELOW.bits() | Self::MIDDLE.bits() | Self::ABOVE.bits();
    }
}

/// The role a view plays in the desktop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewRole {
    /// An ordinary application window, positioned in workspace coordinates
    Toplevel,
    /// A view not managed by the workspace grid
    Unmanaged,
    /// A shell component (panel, background); its coordinates are already
    /// output-local and do not move with the workspace
    DesktopEnvironment,
}

/// A single rendered surface of a view
///
/// Views are made of one or more surfaces (the main surface plus
/// subsurfaces); each knows how to draw itself and how to report the region
/// it covers with opaque pixels.
pub trait Surface<R: Renderer> {
    /// Whether this surface currently has contents
    fn is_mapped(&self) -> bool;

    /// The extent of this surface, relative to the position it is iterated at
    fn output_geometry(&self) -> Rectangle<i32, Physical>;

    /// The overall opacity applied when drawing this surface
    fn alpha(&self) -> f32;

    /// Remove this surface's opaque region, positioned at `at`, from `damage`
    fn subtract_opaque(&self, damage: &mut Region, at: Point<i32, Physical>);

    /// Draw this surface at `at` into `target`, limited to `damage`
    ///
    /// `damage` is expressed in the same coordinate space as `at`.
    fn draw(
        &self,
        renderer: &mut R,
        target: &RenderTarget,
        at: Point<i32, Physical>,
        damage: &Region,
    ) -> Result<(), R::Error>;

    /// Notify the surface's client that it contributed to a presented frame
    fn send_frame_done(&self, time: Time<Monotonic>);
}

/// A view (window) in the scene graph
pub trait View<R: Renderer> {
    /// Whether the view currently has contents of its own
    ///
    /// An unmapped view may still be rendered from a snapshot kept alive by a
    /// plugin (e.g. for a close animation).
    fn is_mapped(&self) -> bool;

    /// Whether the view should be rendered at all
    fn is_visible(&self) -> bool;

    /// Whether a transformer is attached, forcing snapshot rendering
    fn has_transformer(&self) -> bool;

    /// The role of this view
    fn role(&self) -> ViewRole;

    /// The bounding box of the view and all its surfaces
    fn bounding_box(&self) -> Rectangle<i32, Physical>;

    /// Iterate all mapped surfaces of this view in front-to-back order
    ///
    /// The callback receives each surface together with its position in
    /// view-local coordinates.
    fn for_each_surface(&self, f: &mut dyn FnMut(Rc<dyn Surface<R>>, Point<i32, Physical>));

    /// Draw the view as a single snapshot into `target`, limited to `damage`
    ///
    /// Used when the view is transformed or kept alive unmapped; the damage
    /// covers at most [`bounding_box`](View::bounding_box).
    fn draw(&self, renderer: &mut R, target: &RenderTarget, damage: &Region) -> Result<(), R::Error>;

    /// Notify all surfaces of this view that they contributed to a frame
    fn send_frame_done(&self, time: Time<Monotonic>) {
        self.for_each_surface(&mut |surface, _| surface.send_frame_done(time));
    }
}

/// The injected compositor collaborator
///
/// Carries the workspace grid, the per-workspace view stacking and the input
/// manager bits the render manager needs. All methods are called from the
/// single compositor thread.
pub trait Compositor<R: Renderer> {
    /// Dimensions of the virtual workspace grid, fixed for the lifetime of
    /// the manager
    fn grid_size(&self) -> Size<i32, Workspace>;

    /// The currently visible workspace
    fn current_workspace(&self) -> Point<i32, Workspace>;

    /// All views on the given workspace and layers, front-to-back
    ///
    /// View and surface positions are expressed relative to the currently
    /// visible workspace's viewport; views pinned to another workspace of
    /// the grid appear shifted by whole output sizes.
    fn views_on_workspace(&self, ws: Point<i32, Workspace>, layers: Layers) -> Vec<Rc<dyn View<R>>>;

    /// Visit every view on the given layers, regardless of workspace
    fn for_each_view(&self, layers: Layers, f: &mut dyn FnMut(&dyn View<R>));

    /// The currently active drag icons, if a drag is in progress
    fn drag_icons(&self) -> Vec<Rc<dyn View<R>>> {
        Vec::new()
    }

    /// Temporarily make this manager's output the owner of all drag icons
    fn attach_drag_icons(&self) {}

    /// Undo [`attach_drag_icons`](Compositor::attach_drag_icons)
    fn detach_drag_icons(&self) {}

    /// Render the software cursors into `target`, limited to `damage`
    fn render_cursors(
        &self,
        renderer: &mut R,
        target: &RenderTarget,
        damage: &Region,
    ) -> Result<(), R::Error> {
        let _ = (renderer, target, damage);
        Ok(())
    }
}
