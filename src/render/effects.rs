//! Per-frame effect hooks
//!
//! Effects are argument-light callbacks invoked at fixed points of every
//! frame. The registry is a shared handle: hooks hold a clone and may
//! register or unregister effects while a phase is being delivered, which is
//! why invocation always iterates a snapshot of the phase list.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::renderer::{RenderTarget, Renderer};
use crate::utils::hook::Hook;
use crate::utils::HookId;

/// The point within a frame at which an effect hook runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectPhase {
    /// Before any scene rendering, right after the last frame finished
    Pre,
    /// After the scene was rendered, before software cursors
    Overlay,
    /// After the buffer swap
    Post,
}

impl EffectPhase {
    fn index(self) -> usize {
        match self {
            EffectPhase::Pre => 0,
            EffectPhase::Overlay => 1,
            EffectPhase::Post => 2,
        }
    }
}

type EffectCallback<R> = dyn FnMut(&mut R, &RenderTarget);

/// Shared registry of effect hooks, one list per [`EffectPhase`]
///
/// Cloning shares the underlying lists, so plugins can keep a handle and
/// mutate the registry at any time, including from within a running hook.
pub struct Effects<R: Renderer> {
    phases: Rc<[RefCell<Vec<Hook<EffectCallback<R>>>>; 3]>,
}

impl<R: Renderer> Effects<R> {
    pub(crate) fn new() -> Self {
        Effects {
            phases: Rc::new([
                RefCell::new(Vec::new()),
                RefCell::new(Vec::new()),
                RefCell::new(Vec::new()),
            ]),
        }
    }

    /// Register an effect hook for the given phase
    ///
    /// The hook receives the renderer and the manager's current target
    /// framebuffer. Hooks of one phase run in registration order;
    /// registering the same closure twice creates two independent hooks.
    pub fn add<F: FnMut(&mut R, &RenderTarget) + 'static>(&self, phase: EffectPhase, f: F) -> HookId {
        let hook = Hook::new(Rc::new(RefCell::new(f)) as Rc<RefCell<EffectCallback<R>>>);
        let id = hook.id();
        self.phases[phase.index()].borrow_mut().push(hook);
        id
    }

    /// Unregister an effect hook
    ///
    /// Removing an unknown id is a no-op.
    pub fn remove(&self, phase: EffectPhase, id: HookId) {
        self.phases[phase.index()]
            .borrow_mut()
            .retain(|hook| hook.id() != id);
    }

    /// Run all hooks of the given phase
    pub(crate) fn run(&self, phase: EffectPhase, renderer: &mut R, target: &RenderTarget) {
        // Snapshot the list so hooks can add/remove effects without
        // invalidating the traversal; mutations only affect later phases.
        let hooks = self.phases[phase.index()].borrow().clone();
        for hook in hooks {
            (&mut *hook.cb.borrow_mut())(renderer, target);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self, phase: EffectPhase) -> usize {
        self.phases[phase.index()].borrow().len()
    }
}

impl<R: Renderer> Clone for Effects<R> {
    fn clone(&self) -> Self {
        Effects {
            phases: self.phases.clone(),
        }
    }
}

impl<R: Renderer> fmt::Debug for Effects<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effects")
            .field("pre", &self.phases[0].borrow().len())
            .field("overlay", &self.phases[1].borrow().len())
            .field("post", &self.phases[2].borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::test::DummyRenderer;
    use crate::utils::Rectangle;

    use std::cell::Cell;

    fn target() -> RenderTarget {
        RenderTarget {
            fb: 0,
            tex: 0,
            geometry: Rectangle::from_size((800, 600).into()),
            transform: Default::default(),
            viewport: (800, 600).into(),
        }
    }

    #[test]
    fn effects_run_in_registration_order() {
        let effects = Effects::<DummyRenderer>::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let order = order.clone();
            effects.add(EffectPhase::Pre, move |_, _| order.borrow_mut().push(tag));
        }

        let mut renderer = DummyRenderer::default();
        effects.run(EffectPhase::Pre, &mut renderer, &target());

        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn removal_of_unknown_hook_is_noop() {
        let effects = Effects::<DummyRenderer>::new();
        let id = effects.add(EffectPhase::Overlay, |_, _| {});
        effects.remove(EffectPhase::Overlay, id);
        effects.remove(EffectPhase::Overlay, id);
        assert_eq!(effects.len(EffectPhase::Overlay), 0);
    }

    #[test]
    fn mutation_during_run_does_not_affect_current_phase() {
        let effects = Effects::<DummyRenderer>::new();
        let count = Rc::new(Cell::new(0u32));

        let registry = effects.clone();
        let count2 = count.clone();
        effects.add(EffectPhase::Pre, move |_, _| {
            let count3 = count2.clone();
            registry.add(EffectPhase::Pre, move |_, _| count3.set(count3.get() + 1));
        });

        let mut renderer = DummyRenderer::default();
        effects.run(EffectPhase::Pre, &mut renderer, &target());
        // The hook added mid-iteration must not run during this delivery
        assert_eq!(count.get(), 0);

        effects.run(EffectPhase::Pre, &mut renderer, &target());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn hook_can_remove_itself_mid_run() {
        let effects = Effects::<DummyRenderer>::new();
        let runs = Rc::new(Cell::new(0u32));

        let registry = effects.clone();
        let runs2 = runs.clone();
        let id = Rc::new(Cell::new(None));
        let id2 = id.clone();
        let hook = effects.add(EffectPhase::Post, move |_, _| {
            runs2.set(runs2.get() + 1);
            registry.remove(EffectPhase::Post, id2.get().unwrap());
        });
        id.set(Some(hook));

        let mut renderer = DummyRenderer::default();
        effects.run(EffectPhase::Post, &mut renderer, &target());
        effects.run(EffectPhase::Post, &mut renderer, &target());

        assert_eq!(runs.get(), 1);
    }
}
