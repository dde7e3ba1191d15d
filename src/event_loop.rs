//! Contract towards the display server's event loop
//!
//! The render manager defers some work (redraw requests, full-damage
//! refreshes) until the event loop is idle. [`EventLoop`] is the small slice
//! of loop functionality it needs for that; [`LoopIdles`] implements it on
//! top of a [`calloop::LoopHandle`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use calloop::{Idle, LoopHandle};

/// Token identifying a queued idle callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdleSource(usize);

impl IdleSource {
    /// Mint a fresh, unique token
    ///
    /// Called by [`EventLoop`] implementations when queueing a callback.
    pub fn new() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        IdleSource(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdleSource {
    fn default() -> Self {
        Self::new()
    }
}

/// The event-loop functionality consumed by the render manager
///
/// Implementations must *queue* the callback: it runs once the loop is idle,
/// never from within `add_idle` itself.
pub trait EventLoop {
    /// Queue `callback` to run once the event loop goes idle
    fn add_idle(&self, callback: Box<dyn FnOnce()>) -> IdleSource;

    /// Cancel a queued idle callback
    ///
    /// Removing a callback that already ran is a no-op.
    fn remove(&self, source: IdleSource);
}

/// [`EventLoop`] implementation over a [`calloop::LoopHandle`]
pub struct LoopIdles<D: 'static> {
    handle: LoopHandle<'static, D>,
    queued: Rc<RefCell<HashMap<IdleSource, Idle<'static>>>>,
}

impl<D: 'static> LoopIdles<D> {
    /// Wrap a calloop handle
    pub fn new(handle: LoopHandle<'static, D>) -> Self {
        LoopIdles {
            handle,
            queued: Rc::new(RefCell::new(HashMap::new())),
        }
    }
}

impl<D: 'static> EventLoop for LoopIdles<D> {
    fn add_idle(&self, callback: Box<dyn FnOnce()>) -> IdleSource {
        let source = IdleSource::new();
        let queued = Rc::downgrade(&self.queued);
        let idle = self.handle.insert_idle(move |_| {
            if let Some(queued) = queued.upgrade() {
                queued.borrow_mut().remove(&source);
            }
            callback();
        });
        self.queued.borrow_mut().insert(source, idle);
        source
    }

    fn remove(&self, source: IdleSource) {
        if let Some(idle) = self.queued.borrow_mut().remove(&source) {
            idle.cancel();
        }
    }
}

impl<D: 'static> fmt::Debug for LoopIdles<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopIdles")
            .field("queued", &self.queued.borrow().len())
            .finish_non_exhaustive()
    }
}
