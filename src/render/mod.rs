//! The per-output render manager
//!
//! A [`RenderManager`] ties the pieces of the rendering pipeline together:
//! the damage accumulator, the workspace stream grid, the effect hook
//! registry, the post-effect chain and the frame scheduler. The embedding
//! compositor creates one manager per output and calls
//! [`paint`](RenderManager::paint) from the display's frame event.
//!
//! The stages of a frame are fixed: pre effects → scene (workspace stream or
//! custom renderer) → overlay effects → software cursors → post-effect chain
//! → buffer swap → post effects.

use std::fmt;
use std::rc::Rc;

use tracing::{error, info_span, trace};

use crate::event_loop::EventLoop;
use crate::output::Output;
use crate::renderer::{Color32F, RenderTarget, Renderer, RuntimeFlags};
use crate::scene::{Compositor, Layers};
use crate::utils::hook::Hook;
use crate::utils::signaling::Signal;
use crate::utils::{Clock, HookId, Monotonic, Point, Rectangle, Region, Scale, Size, Workspace};

mod damage;
mod effects;
mod post;
mod scheduler;
mod stream;


pub use effects::{EffectPhase, Effects};
pub use post::PostEffects;
pub use stream::{StreamSignal, WorkspaceStream};

use damage::DamageTracker;
use scheduler::FrameScheduler;

/// Payload of the signal emitted when rendering resumes after the last
/// inhibitor was released
#[derive(Debug, Clone, Copy)]
pub struct StartRendering;

/// Errors thrown by [`RenderManager::paint`]
#[derive(thiserror::Error)]
pub enum Error<E: std::error::Error> {
    /// The provided [`Renderer`] returned an error
    #[error(transparent)]
    Rendering(E),
}

impl<E: std::error::Error> fmt::Debug for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Rendering(err) => fmt::Debug::fmt(err, f),
        }
    }
}

/// A cloneable handle for reporting damage to a [`RenderManager`]
///
/// Effect hooks and plugins hold one of these to report damage at any time,
/// including while a frame is in flight. Damage reported after the manager
/// shut down is silently dropped.
#[derive(Debug, Clone)]
pub struct DamageHandle {
    tracker: DamageTracker,
}

impl DamageHandle {
    /// Damage a single rectangle, in output pixels
    pub fn damage_box(&self, rect: Rectangle<i32, crate::utils::Physical>) {
        self.tracker.damage_box(rect);
    }

    /// Damage a region; `None` damages the whole output
    pub fn damage_region(&self, region: Option<&Region>) {
        self.tracker.damage_region(region);
    }

    /// Damage the whole output
    pub fn damage_whole(&self) {
        self.tracker.damage_whole();
    }
}

type CustomRenderer<R> = dyn FnMut(&mut R, &RenderTarget);

/// The render manager of a single output
pub struct RenderManager<R: Renderer> {
    output: Rc<dyn Output>,
    core: Rc<dyn Compositor<R>>,
    damage: DamageTracker,
    scheduler: FrameScheduler,
    effects: Effects<R>,
    post: PostEffects<R>,
    streams: Vec<WorkspaceStream>,
    grid: Size<i32, Workspace>,
    current_stream: Option<usize>,
    renderer_hook: Option<Hook<CustomRenderer<R>>>,
    stream_pre: Signal<StreamSignal>,
    stream_post: Signal<StreamSignal>,
    start_rendering: Signal<StartRendering>,
    frame_damage: Region,
    flags: RuntimeFlags,
    clock: Clock<Monotonic>,
    span: tracing::Span,
}

/// The target framebuffer descriptor for the given ids on `output`
pub(crate) fn target_for(output: &dyn Output, fb: u32, tex: u32) -> RenderTarget {
    RenderTarget {
        fb,
        tex,
        geometry: output.relative_geometry(),
        transform: output.transform(),
        viewport: output.size(),
    }
}

impl<R: Renderer> RenderManager<R> {
    /// Create a render manager for `output`
    ///
    /// The workspace stream grid is sized once from
    /// [`Compositor::grid_size`] and lives for the manager's lifetime.
    pub fn new(
        output: Rc<dyn Output>,
        core: Rc<dyn Compositor<R>>,
        event_loop: Rc<dyn EventLoop>,
        flags: RuntimeFlags,
    ) -> Self {
        let grid = core.grid_size();
        let mut streams = Vec::with_capacity((grid.w * grid.h).max(0) as usize);
        for x in 0..grid.w {
            for y in 0..grid.h {
                streams.push(WorkspaceStream::new(Point::new(x, y)));
            }
        }

        let span = info_span!("render_manager", output = %output.name());
        RenderManager {
            damage: DamageTracker::new(output.clone(), flags),
            scheduler: FrameScheduler::new(output.clone(), event_loop),
            effects: Effects::new(),
            post: PostEffects::new(),
            streams,
            grid,
            current_stream: None,
            renderer_hook: None,
            stream_pre: Signal::new(),
            stream_post: Signal::new(),
            start_rendering: Signal::new(),
            frame_damage: Region::new(),
            flags,
            clock: Clock::new(),
            span,
            output,
            core,
        }
    }

    /*
     * Damage
     */

    /// Damage a single rectangle, in output pixels
    pub fn damage_box(&self, rect: Rectangle<i32, crate::utils::Physical>) {
        self.damage.damage_box(rect);
    }

    /// Damage a region; `None` damages the whole output
    pub fn damage_region(&self, region: Option<&Region>) {
        self.damage.damage_region(region);
    }

    /// Damage the whole output
    pub fn damage_whole(&self) {
        self.damage.damage_whole();
    }

    /// A handle for reporting damage without access to the manager
    pub fn damage_handle(&self) -> DamageHandle {
        DamageHandle {
            tracker: self.damage.clone(),
        }
    }

    /*
     * Hooks
     */

    /// Register an effect hook; see [`Effects::add`]
    pub fn add_effect<F: FnMut(&mut R, &RenderTarget) + 'static>(
        &self,
        phase: EffectPhase,
        f: F,
    ) -> HookId {
        self.effects.add(phase, f)
    }

    /// Unregister an effect hook; see [`Effects::remove`]
    pub fn rem_effect(&self, phase: EffectPhase, id: HookId) {
        self.effects.remove(phase, id);
    }

    /// The shared effect registry
    pub fn effects(&self) -> Effects<R> {
        self.effects.clone()
    }

    /// Append a post-effect pass to the chain
    ///
    /// The whole output is damaged so the chain runs on the next frame.
    pub fn add_post<F>(&self, renderer: &mut R, f: F) -> Result<HookId, Error<R::Error>>
    where
        F: FnMut(&mut R, &crate::renderer::RenderBuffer, &RenderTarget) + 'static,
    {
        let id = self
            .post
            .add(renderer, self.output.size(), f)
            .map_err(Error::Rendering)?;
        self.damage.damage_whole();
        Ok(id)
    }

    /// Mark a post-effect pass for removal at the next frame boundary
    pub fn rem_post(&self, id: HookId) {
        self.post.remove(id);
        // Schedule a frame so the pending removal is applied
        self.damage.damage_whole();
    }

    /// The shared post-effect chain
    pub fn post_effects(&self) -> PostEffects<R> {
        self.post.clone()
    }

    /// Install a custom full-frame renderer replacing the workspace-stream
    /// scene path
    ///
    /// Overlay and post stages and software cursors still run; the scene is
    /// whatever the hook draws into the target framebuffer.
    pub fn set_renderer<F: FnMut(&mut R, &RenderTarget) + 'static>(&mut self, f: F) -> HookId {
        let hook = Hook::new(Rc::new(std::cell::RefCell::new(f)) as Rc<std::cell::RefCell<CustomRenderer<R>>>);
        let id = hook.id();
        self.renderer_hook = Some(hook);
        self.damage.damage_whole();
        id
    }

    /// Remove the custom renderer and schedule a full repaint of the scene
    pub fn reset_renderer(&mut self) {
        self.renderer_hook = None;
        self.scheduler.schedule_idle_damage(self.damage.clone());
    }

    /*
     * Scheduling
     */

    /// Request a frame once the event loop goes idle
    pub fn schedule_redraw(&self) {
        self.scheduler.schedule_redraw();
    }

    /// Request a frame right away
    pub fn schedule_repaint(&self) {
        self.scheduler.schedule_repaint();
    }

    /// Reference-count continuous redrawing
    pub fn auto_redraw(&self, enable: bool) {
        self.scheduler.auto_redraw(enable);
    }

    /// Reference-count rendering inhibition
    ///
    /// While inhibited the display is cleared to black each frame. Releasing
    /// the last inhibitor damages the whole output and emits the
    /// start-rendering signal.
    pub fn add_inhibit(&self, inhibit: bool) {
        if self.scheduler.add_inhibit(inhibit) {
            self.damage.damage_whole();
            self.start_rendering.emit(StartRendering);
        }
    }

    /// Whether an idle redraw is queued but has not run yet
    pub fn is_redraw_pending(&self) -> bool {
        self.scheduler.is_redraw_pending()
    }

    /*
     * Signals
     */

    /// Emitted before a workspace stream renders; listeners may extend the
    /// damage
    pub fn stream_pre_signal(&self) -> &Signal<StreamSignal> {
        &self.stream_pre
    }

    /// Emitted after a workspace stream rendered
    pub fn stream_post_signal(&self) -> &Signal<StreamSignal> {
        &self.stream_post
    }

    /// Emitted when the last render inhibitor was released
    pub fn start_rendering_signal(&self) -> &Signal<StartRendering> {
        &self.start_rendering
    }

    /*
     * Introspection
     */

    /// The descriptor of the framebuffer the scene is currently rendered
    /// into
    ///
    /// This is the display framebuffer unless post-effects are active.
    pub fn get_target_framebuffer(&self) -> RenderTarget {
        let (fb, tex) = self.post.default_ids();
        target_for(self.output.as_ref(), fb, tex)
    }

    /// The stream of the given workspace, if it is inside the grid
    pub fn stream(&self, ws: Point<i32, Workspace>) -> Option<&WorkspaceStream> {
        self.stream_index(ws).map(|index| &self.streams[index])
    }

    fn stream_index(&self, ws: Point<i32, Workspace>) -> Option<usize> {
        if ws.x < 0 || ws.y < 0 || ws.x >= self.grid.w || ws.y >= self.grid.h {
            return None;
        }
        Some((ws.x * self.grid.h + ws.y) as usize)
    }

    /*
     * Workspace streams
     */

    /// Start the stream of workspace `ws`: mark it live, damage the whole
    /// workspace and render it
    pub fn workspace_stream_start(
        &mut self,
        renderer: &mut R,
        ws: Point<i32, Workspace>,
    ) -> Result<(), Error<R::Error>> {
        let Some(index) = self.stream_index(ws) else {
            error!(ws = ?ws, "workspace outside the stream grid");
            return Ok(());
        };
        let custom = self.renderer_hook.is_some();
        stream::start(
            &mut self.streams[index],
            stream::StreamCtx {
                renderer,
                output: &self.output,
                core: &self.core,
                damage: &self.damage,
                pre_signal: &self.stream_pre,
                post_signal: &self.stream_post,
                custom_renderer_active: custom,
                target: None,
            },
        )
        .map_err(Error::Rendering)
    }

    /// Repaint the damaged parts of workspace `ws` into its stream buffer
    ///
    /// The scale arguments are recorded but do not affect rendering yet;
    /// scaled streams are experimental.
    pub fn workspace_stream_update(
        &mut self,
        renderer: &mut R,
        ws: Point<i32, Workspace>,
        scale: Scale<f64>,
    ) -> Result<(), Error<R::Error>> {
        let Some(index) = self.stream_index(ws) else {
            error!(ws = ?ws, "workspace outside the stream grid");
            return Ok(());
        };
        let custom = self.renderer_hook.is_some();
        stream::update(
            &mut self.streams[index],
            stream::StreamCtx {
                renderer,
                output: &self.output,
                core: &self.core,
                damage: &self.damage,
                pre_signal: &self.stream_pre,
                post_signal: &self.stream_post,
                custom_renderer_active: custom,
                target: None,
            },
            scale,
        )
        .map_err(Error::Rendering)
    }

    /// Mark the stream of workspace `ws` dormant
    ///
    /// Its framebuffer stays cached until the manager shuts down.
    pub fn workspace_stream_stop(&mut self, ws: Point<i32, Workspace>) {
        if let Some(index) = self.stream_index(ws) {
            stream::stop(&mut self.streams[index]);
        }
    }

    /*
     * Painting
     */

    /// Produce one frame; call on the output's frame event
    #[profiling::function]
    pub fn paint(&mut self, renderer: &mut R) -> Result<(), Error<R::Error>> {
        let span = self.span.clone();
        let _guard = span.enter();

        let start = self.clock.now();
        trace!("frame");

        if self.post.cleanup(renderer) {
            self.damage.damage_whole();
        }

        // About to be repopulated by make_current
        self.frame_damage.clear();

        let target = self.get_target_framebuffer();
        self.effects.run(EffectPhase::Pre, renderer, &target);

        let mut frame_damage = std::mem::take(&mut self.frame_damage);
        let needs_swap = match self.damage.make_current(&mut frame_damage) {
            Ok(needs_swap) => needs_swap,
            Err(_) => {
                // Aborted frame; the next frame event retries
                self.frame_damage = frame_damage;
                return Ok(());
            }
        };

        if !needs_swap && !self.scheduler.constant_redraw() {
            trace!("nothing to draw");
            self.frame_damage = frame_damage;
            let target = self.get_target_framebuffer();
            self.effects.run(EffectPhase::Post, renderer, &target);
            return Ok(());
        }

        renderer.bind_output().map_err(Error::Rendering)?;
        let result = self.render_frame(renderer, &mut frame_damage);
        renderer.unbind_output();

        frame_damage.clear();
        self.frame_damage = frame_damage;

        let swap_damage = result.map_err(Error::Rendering)?;
        self.damage.swap_buffers(start, &swap_damage);

        self.post_paint(renderer);
        Ok(())
    }

    /// The scene, overlay, cursor and post-effect stages of a frame
    fn render_frame(&mut self, renderer: &mut R, frame_damage: &mut Region) -> Result<Region, R::Error> {
        self.post.ensure_default(renderer, self.output.size())?;

        let output_box = self.damage.output_box();
        let mut swap_damage = Region::new();

        if self.flags.contains(RuntimeFlags::DAMAGE_DEBUG) {
            // Visual indicator: everything yellow stayed undamaged
            swap_damage.unite_rect(output_box);
            let target = self.get_target_framebuffer();
            renderer.render_begin(&target);
            let cleared = renderer.clear(Color32F::new(1.0, 1.0, 0.0, 1.0), &[output_box]);
            renderer.render_end();
            cleared?;
        }

        if let Some(hook) = self.renderer_hook.clone() {
            let target = self.get_target_framebuffer();
            (&mut *hook.cb.borrow_mut())(renderer, &target);
            // TODO: extend the renderer contract so custom renderers can
            // report the region they actually repainted
            swap_damage.clear();
            swap_damage.unite_rect(output_box);
        } else {
            frame_damage.intersect_rect(output_box);
            if !frame_damage.is_empty() {
                swap_damage.unite(frame_damage);

                // The current workspace renders straight into the manager's
                // target framebuffer; the stream's cached buffer only backs
                // plugin-driven updates.
                let target = self.get_target_framebuffer();
                let current = self.core.current_workspace();
                match self.stream_index(current) {
                    Some(index) if self.current_stream != Some(index) => {
                        if let Some(old) = self.current_stream {
                            stream::stop(&mut self.streams[old]);
                        }
                        self.current_stream = Some(index);
                        stream::start(
                            &mut self.streams[index],
                            stream::StreamCtx {
                                renderer,
                                output: &self.output,
                                core: &self.core,
                                damage: &self.damage,
                                pre_signal: &self.stream_pre,
                                post_signal: &self.stream_post,
                                custom_renderer_active: false,
                                target: Some(target),
                            },
                        )?;
                    }
                    Some(index) => {
                        stream::update(
                            &mut self.streams[index],
                            stream::StreamCtx {
                                renderer,
                                output: &self.output,
                                core: &self.core,
                                damage: &self.damage,
                                pre_signal: &self.stream_pre,
                                post_signal: &self.stream_post,
                                custom_renderer_active: false,
                                target: Some(target),
                            },
                            Scale { x: 1.0, y: 1.0 },
                        )?;
                    }
                    None => {
                        error!(current = ?current, "current workspace outside the stream grid");
                    }
                }
            }
        }

        let target = self.get_target_framebuffer();
        self.effects.run(EffectPhase::Overlay, renderer, &target);

        if self.post.has_effects() {
            // The post chain is not damage-aware
            swap_damage.clear();
            swap_damage.unite_rect(output_box);
        }

        self.core.render_cursors(renderer, &target, &swap_damage)?;

        if self.post.has_effects() {
            self.post.run_chain(renderer, self.output.as_ref())?;
        }

        if self.scheduler.inhibited() {
            // Hide all contents while inhibited
            let display = target_for(self.output.as_ref(), 0, 0);
            renderer.render_begin(&display);
            let cleared = renderer.clear(Color32F::BLACK, &[output_box]);
            renderer.render_end();
            cleared?;
        }

        Ok(swap_damage)
    }

    /// Work following the buffer swap: deferred chain cleanup, post effects,
    /// continuous redraw and frame-done delivery
    fn post_paint(&mut self, renderer: &mut R) {
        if self.post.cleanup(renderer) {
            self.damage.damage_whole();
        }

        let target = self.get_target_framebuffer();
        self.effects.run(EffectPhase::Post, renderer, &target);

        if self.scheduler.constant_redraw() {
            self.scheduler.schedule_redraw();
        }

        let now = self.clock.now();
        if self.renderer_hook.is_some() {
            // A custom renderer may present any view
            self.core.for_each_view(Layers::ALL, &mut |view| {
                if view.is_mapped() {
                    view.send_frame_done(now);
                }
            });
        } else {
            let current = self.core.current_workspace();
            for view in self.core.views_on_workspace(current, Layers::MIDDLE) {
                if view.is_mapped() {
                    view.send_frame_done(now);
                }
            }
            self.core.for_each_view(Layers::BELOW | Layers::ABOVE, &mut |view| {
                view.send_frame_done(now);
            });
        }
    }

    /*
     * Teardown
     */

    /// Release all GPU resources and stop accepting damage
    ///
    /// Call with the output's context still usable, before dropping the
    /// manager. Any damage reported afterwards is silently dropped.
    pub fn shutdown(&mut self, renderer: &mut R) {
        self.scheduler.cancel_idles();

        match renderer.bind_output() {
            Ok(()) => {
                for stream in &mut self.streams {
                    stream.buffer.release(renderer);
                }
                self.post.release_buffers(renderer);
                renderer.unbind_output();
            }
            Err(err) => {
                error!("failed to bind output for teardown: {}", err);
            }
        }

        self.damage.set_destroyed();
    }
}

impl<R: Renderer> fmt::Debug for RenderManager<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderManager")
            .field("output", &self.output.name())
            .field("grid", &self.grid)
            .field("current_stream", &self.current_stream)
            .field("custom_renderer", &self.renderer_hook.is_some())
            .field("post", &self.post)
            .finish_non_exhaustive()
    }
}
