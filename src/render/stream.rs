//! Workspace streams
//!
//! A stream snapshots one virtual workspace into its cached framebuffer,
//! repainting only the damaged parts. Visibility is resolved front-to-back:
//! opaque surfaces cull the damage reaching surfaces behind them, and the
//! surviving records are then drawn back-to-front.

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::trace;

use crate::output::Output;
use crate::renderer::{Color32F, RenderBuffer, RenderTarget, Renderer};
use crate::scene::{Compositor, Layers, Surface, View, ViewRole};
use crate::utils::signaling::Signal;
use crate::utils::{Physical, Point, Rectangle, Region, Scale, Workspace};

use super::damage::DamageTracker;

/// Alpha threshold above which a surface is treated as fully opaque
const OPAQUE_ALPHA: f32 = 0.999;

/// The per-workspace rendering pipeline and its cached framebuffer
#[derive(Debug)]
pub struct WorkspaceStream {
    /// The workspace this stream renders
    pub ws: Point<i32, Workspace>,
    /// The cached framebuffer holding the workspace contents
    pub buffer: RenderBuffer,
    /// Whether the stream is currently live
    pub running: bool,
    /// The most recently requested render scale
    ///
    /// Scaled stream rendering is experimental and currently disabled; the
    /// scale is recorded but does not affect rendering.
    pub scale: Scale<f64>,
}

impl WorkspaceStream {
    pub(crate) fn new(ws: Point<i32, Workspace>) -> Self {
        WorkspaceStream {
            ws,
            buffer: RenderBuffer::new(),
            running: false,
            scale: Scale { x: 1.0, y: 1.0 },
        }
    }
}

/// Payload of the stream pre/post render signals
///
/// Listeners of the pre signal may extend `damage` to force additional
/// repainting of the workspace.
#[derive(Debug, Clone)]
pub struct StreamSignal {
    /// The workspace being rendered
    pub ws: Point<i32, Workspace>,
    /// The damage about to be repainted, in workspace-local coordinates
    pub damage: Rc<RefCell<Region>>,
    /// The stream's framebuffer
    pub target: RenderTarget,
}

/// Everything a stream operation needs from the render manager
pub(crate) struct StreamCtx<'a, R: Renderer> {
    pub renderer: &'a mut R,
    pub output: &'a Rc<dyn Output>,
    pub core: &'a Rc<dyn Compositor<R>>,
    pub damage: &'a DamageTracker,
    pub pre_signal: &'a Signal<StreamSignal>,
    pub post_signal: &'a Signal<StreamSignal>,
    pub custom_renderer_active: bool,
    /// Render destination override
    ///
    /// `paint()` points the current workspace's stream at the manager's
    /// target framebuffer; plugin-driven updates leave this unset and render
    /// into the stream's own cached buffer.
    pub target: Option<RenderTarget>,
}

/// A surface (or snapshotted view) that survived occlusion culling
enum Record<R: Renderer> {
    Surface {
        surface: Rc<dyn Surface<R>>,
        at: Point<i32, Physical>,
        damage: Region,
    },
    Snapshot {
        view: Rc<dyn View<R>>,
        damage: Region,
    },
}

/// Mark the stream live and render it fully
pub(crate) fn start<R: Renderer>(
    stream: &mut WorkspaceStream,
    ctx: StreamCtx<'_, R>,
) -> Result<(), R::Error> {
    stream.running = true;
    stream.scale = Scale { x: 1.0, y: 1.0 };

    // Force a full repaint of the workspace
    let current = ctx.core.current_workspace();
    let size = ctx.output.size();
    let ws_box: Rectangle<i32, Physical> = Rectangle::new(
        (
            (stream.ws.x - current.x) * size.w,
            (stream.ws.y - current.y) * size.h,
        )
            .into(),
        size,
    );
    ctx.damage.damage_box(ws_box);

    update(stream, ctx, Scale { x: 1.0, y: 1.0 })
}

/// Mark the stream dormant; its framebuffer stays cached
pub(crate) fn stop(stream: &mut WorkspaceStream) {
    stream.running = false;
}

/// Repaint the damaged parts of the stream's workspace
#[profiling::function]
pub(crate) fn update<R: Renderer>(
    stream: &mut WorkspaceStream,
    ctx: StreamCtx<'_, R>,
    scale: Scale<f64>,
) -> Result<(), R::Error> {
    let current = ctx.core.current_workspace();
    let geometry = ctx
        .output
        .relative_geometry()
        .to_physical(ctx.output.scale());
    // Views are positioned relative to the current viewport; this maps them
    // into the workspace-local space the stream framebuffer uses. Zero for
    // the current workspace.
    let ws_offset: Point<i32, Physical> = Point::new(
        geometry.loc.x + (current.x - stream.ws.x) * geometry.size.w,
        geometry.loc.y + (current.y - stream.ws.y) * geometry.size.h,
    );

    let mut ws_damage = ctx.damage.get_ws_damage(stream.ws, current);

    if scale != stream.scale {
        // Scaled rendering is disabled; only remember the request.
        stream.scale = scale;
    }

    if ws_damage.is_empty() {
        return Ok(());
    }

    let target = match ctx.target {
        Some(target) => target,
        None => {
            stream.buffer.allocate(ctx.renderer, ctx.output.size())?;
            super::target_for(ctx.output.as_ref(), stream.buffer.fb(), stream.buffer.tex())
        }
    };

    let shared_damage = Rc::new(RefCell::new(ws_damage));
    ctx.pre_signal.emit(StreamSignal {
        ws: stream.ws,
        damage: shared_damage.clone(),
        target,
    });
    let mut ws_damage = std::mem::take(&mut *shared_damage.borrow_mut());

    let mut views: Vec<Rc<dyn View<R>>> = Vec::new();
    if !ctx.custom_renderer_active {
        // Drag icons belong to this output while its workspace renders; they
        // stack above everything else.
        ctx.core.attach_drag_icons();
        views.extend(ctx.core.drag_icons());
    }
    views.extend(ctx.core.views_on_workspace(stream.ws, Layers::ALL));

    // Front-to-back: build the list of damaged records, letting opaque
    // surfaces cull the damage reaching whatever is behind them.
    let mut records: SmallVec<[Record<R>; 8]> = SmallVec::new();
    for view in views {
        if ws_damage.is_empty() {
            // Everything behind is fully occluded
            break;
        }
        if !view.is_visible() {
            continue;
        }

        // Shell views are positioned in output-local coordinates already
        let offset = if view.role() == ViewRole::DesktopEnvironment {
            Point::default()
        } else {
            ws_offset
        };

        if view.has_transformer() || !view.is_mapped() {
            // Transformed and snapshot-kept views render as a single quad
            let mut bbox = view.bounding_box();
            bbox.loc += offset;

            let mut damage = ws_damage.clone();
            damage.intersect_rect(bbox);
            if !damage.is_empty() {
                records.push(Record::Snapshot { view, damage });
            }
        } else {
            view.for_each_surface(&mut |surface, position| {
                if ws_damage.is_empty() || !surface.is_mapped() {
                    return;
                }

                let at = position + offset;
                let mut geometry = surface.output_geometry();
                geometry.loc += at;

                let mut damage = ws_damage.clone();
                damage.intersect_rect(geometry);
                if !damage.is_empty() {
                    records.push(Record::Surface {
                        surface: surface.clone(),
                        at,
                        damage,
                    });
                }

                if surface.alpha() >= OPAQUE_ALPHA {
                    surface.subtract_opaque(&mut ws_damage, at);
                }
            });
        }
    }

    trace!(
        ws = ?stream.ws,
        records = records.len(),
        damage = ?ws_damage,
        "rendering workspace stream"
    );

    ctx.renderer.render_begin(&target);
    let result = (|| {
        // Only the area no opaque record will overpaint needs clearing
        ctx.renderer.clear(Color32F::BLACK, ws_damage.rects())?;

        // Draw back-to-front
        for record in records.iter().rev() {
            match record {
                Record::Surface { surface, at, damage } => {
                    surface.draw(ctx.renderer, &target, *at, damage)?
                }
                Record::Snapshot { view, damage } => view.draw(ctx.renderer, &target, damage)?,
            }
        }
        Ok(())
    })();
    ctx.renderer.render_end();

    ctx.post_signal.emit(StreamSignal {
        ws: stream.ws,
        damage: shared_damage,
        target,
    });

    if !ctx.custom_renderer_active {
        ctx.core.detach_drag_icons();
    }

    result
}
