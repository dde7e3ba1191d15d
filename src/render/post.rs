//! Chain of full-screen post-effect passes
//!
//! The scene is rendered into the chain's default buffer; every hook then
//! reads the previous buffer and writes to its own, with the final hook
//! writing straight to the display. The terminal slot of the chain is always
//! [`BufferSlot::Display`]: adding a hook promotes the previous terminal to
//! an owned offscreen buffer, removing the last hook demotes the new
//! terminal back.
//!
//! Removal is deferred to frame boundaries via a `to_remove` flag so the
//! chain stays stable while a frame is in flight.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{error, trace};

use crate::output::Output;
use crate::renderer::{BufferSlot, RenderBuffer, RenderTarget, Renderer};
use crate::utils::hook::Hook;
use crate::utils::{HookId, Physical, Size};

/// A post-effect pass: reads `source`, writes into `target`
type PostCallback<R> = dyn FnMut(&mut R, &RenderBuffer, &RenderTarget);

struct PostEntry<R: Renderer> {
    hook: Hook<PostCallback<R>>,
    buffer: BufferSlot,
    to_remove: bool,
}

struct PostState<R: Renderer> {
    /// The scene's render destination; owned iff the chain is non-empty
    default_buffer: BufferSlot,
    entries: Vec<PostEntry<R>>,
}

/// Shared handle to the post-effect chain of one render manager
///
/// Cloning shares the chain, so hooks may add and remove passes while a
/// frame is in flight; removals take effect at the next frame boundary.
pub struct PostEffects<R: Renderer> {
    state: Rc<RefCell<PostState<R>>>,
}

impl<R: Renderer> PostEffects<R> {
    pub(crate) fn new() -> Self {
        PostEffects {
            state: Rc::new(RefCell::new(PostState {
                default_buffer: BufferSlot::Display,
                entries: Vec::new(),
            })),
        }
    }

    /// Append a post-effect pass to the chain
    ///
    /// The previous terminal buffer (the default buffer for the first hook)
    /// is allocated at `size`; the new hook becomes the terminal pass
    /// writing to the display. Requires the output's GPU context to be
    /// usable; the allocation runs inside a bound context.
    pub fn add<F>(&self, renderer: &mut R, size: Size<i32, Physical>, f: F) -> Result<HookId, R::Error>
    where
        F: FnMut(&mut R, &RenderBuffer, &RenderTarget) + 'static,
    {
        renderer.bind_output()?;
        let result = self.add_bound(renderer, size, f);
        renderer.unbind_output();
        result
    }

    fn add_bound<F>(&self, renderer: &mut R, size: Size<i32, Physical>, f: F) -> Result<HookId, R::Error>
    where
        F: FnMut(&mut R, &RenderBuffer, &RenderTarget) + 'static,
    {
        let mut state = self.state.borrow_mut();

        // Promote the previous terminal slot to an owned buffer.
        let mut buffer = RenderBuffer::new();
        buffer.allocate(renderer, size)?;
        if let Some(entry) = state.entries.last_mut() {
            debug_assert!(entry.buffer.is_display());
            entry.buffer = BufferSlot::Owned(buffer);
        } else {
            debug_assert!(state.default_buffer.is_display());
            state.default_buffer = BufferSlot::Owned(buffer);
        }

        let hook = Hook::new(Rc::new(RefCell::new(f)) as Rc<RefCell<PostCallback<R>>>);
        let id = hook.id();
        state.entries.push(PostEntry {
            hook,
            buffer: BufferSlot::Display,
            to_remove: false,
        });

        trace!(passes = state.entries.len(), "added post-effect pass");
        Ok(id)
    }

    /// Mark a pass for removal at the next frame boundary
    ///
    /// Removing an unknown id is a no-op.
    pub fn remove(&self, id: HookId) {
        for entry in self.state.borrow_mut().entries.iter_mut() {
            if entry.hook.id() == id {
                entry.to_remove = true;
            }
        }
    }

    /// Apply pending removals; returns whether the chain changed
    ///
    /// Binds the output context itself when buffers have to be freed.
    pub(crate) fn cleanup(&self, renderer: &mut R) -> bool {
        if !self.state.borrow().entries.iter().any(|entry| entry.to_remove) {
            return false;
        }

        if let Err(err) = renderer.bind_output() {
            error!("failed to bind output for post-effect cleanup: {}", err);
            return false;
        }

        {
            let mut state = self.state.borrow_mut();
            let mut entries = std::mem::take(&mut state.entries);
            entries.retain_mut(|entry| {
                if entry.to_remove {
                    entry.buffer.release(renderer);
                    false
                } else {
                    true
                }
            });
            state.entries = entries;

            // Restore the terminal invariant: the last pass draws to the
            // display again.
            match state.entries.last_mut() {
                Some(entry) => entry.buffer.release(renderer),
                None => state.default_buffer.release(renderer),
            }
        }

        renderer.unbind_output();
        true
    }

    /// Whether any pass is registered
    pub fn has_effects(&self) -> bool {
        !self.state.borrow().entries.is_empty()
    }

    /// Ensure the default buffer matches the output size
    ///
    /// A no-op while the chain is empty (the scene then draws straight to
    /// the display).
    pub(crate) fn ensure_default(&self, renderer: &mut R, size: Size<i32, Physical>) -> Result<(), R::Error> {
        let mut state = self.state.borrow_mut();
        if let BufferSlot::Owned(ref mut buffer) = state.default_buffer {
            buffer.allocate(renderer, size)?;
        }
        Ok(())
    }

    /// The id pair of the scene's render destination
    pub(crate) fn default_ids(&self) -> (u32, u32) {
        self.state.borrow().default_buffer.ids()
    }

    /// Execute the chain: `default -> post[0].buffer -> ... -> display`
    pub(crate) fn run_chain(&self, renderer: &mut R, output: &dyn Output) -> Result<(), R::Error> {
        let size = output.size();
        let (count, mut source) = {
            let state = self.state.borrow();
            let Some(&source) = state.default_buffer.as_owned() else {
                error!("post-effect chain executed without a default buffer");
                return Ok(());
            };
            (state.entries.len(), source)
        };

        for index in 0..count {
            // Reallocate the pass's buffer to the current output size and
            // copy out what the hook needs, so no borrow is held while it
            // runs and it may mutate the chain.
            let pass = {
                let mut state = self.state.borrow_mut();
                match state.entries.get_mut(index) {
                    Some(entry) => {
                        if let BufferSlot::Owned(ref mut buffer) = entry.buffer {
                            buffer.allocate(renderer, size)?;
                        }
                        Some((entry.hook.clone(), entry.buffer))
                    }
                    None => None,
                }
            };
            let Some((hook, destination)) = pass else {
                break;
            };

            let (fb, tex) = destination.ids();
            let target = super::target_for(output, fb, tex);
            trace!(pass = index, from = source.fb(), to = fb, "post-effect pass");
            (&mut *hook.cb.borrow_mut())(renderer, &source, &target);

            if let BufferSlot::Owned(buffer) = destination {
                source = buffer;
            }
        }

        Ok(())
    }

    /// Free every owned buffer of the chain
    pub(crate) fn release_buffers(&self, renderer: &mut R) {
        let mut state = self.state.borrow_mut();
        state.default_buffer.release(renderer);
        for entry in state.entries.iter_mut() {
            entry.buffer.release(renderer);
        }
    }

    /// Check the terminal invariant: the last slot (and the default buffer
    /// for an empty chain) is the display sentinel
    #[cfg(test)]
    pub(crate) fn terminal_is_display(&self) -> bool {
        let state = self.state.borrow();
        match state.entries.last() {
            Some(entry) => entry.buffer.is_display(),
            None => state.default_buffer.is_display(),
        }
    }
}

impl<R: Renderer> Clone for PostEffects<R> {
    fn clone(&self) -> Self {
        PostEffects {
            state: self.state.clone(),
        }
    }
}

impl<R: Renderer> fmt::Debug for PostEffects<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("PostEffects")
            .field("default_buffer", &state.default_buffer)
            .field("passes", &state.entries.len())
            .finish()
    }
}
