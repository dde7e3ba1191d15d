//! A synchronous, single-threaded signaling mechanism
//!
//! [`Signal`] lets modules listen for events generated elsewhere without the
//! emitter knowing its listeners. Emission is synchronous: every registered
//! callback runs before [`Signal::emit`] returns, with two exceptions that
//! keep re-entrancy well-defined:
//!
//! - a callback registered while a signal is being delivered does not see the
//!   signal currently in flight
//! - a signal emitted from within a callback is queued and delivered after the
//!   current one has reached all listeners

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::utils::hook::{Hook, HookId};

/// A signal for events of type `S`
///
/// Cloning shares the underlying listener list with `Rc` semantics.
pub struct Signal<S> {
    inner: Rc<SignalInner<S>>,
}

struct SignalInner<S> {
    callbacks: RefCell<Vec<Hook<dyn FnMut(&S)>>>,
    pending: RefCell<VecDeque<S>>,
    dispatching: Cell<bool>,
}

impl<S> Signal<S> {
    /// Create a new signal with no listeners
    pub fn new() -> Signal<S> {
        Signal {
            inner: Rc::new(SignalInner {
                callbacks: RefCell::new(Vec::new()),
                pending: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
            }),
        }
    }

    /// Register a new callback on this signal
    ///
    /// The returned [`HookId`] is the only way to unregister the callback
    /// again; it does not need to be kept alive for the callback to stay
    /// registered.
    pub fn register<F: FnMut(&S) + 'static>(&self, f: F) -> HookId {
        let hook = Hook::new(Rc::new(RefCell::new(f)) as Rc<RefCell<dyn FnMut(&S)>>);
        let id = hook.id();
        self.inner.callbacks.borrow_mut().push(hook);
        id
    }

    /// Unregister a previously registered callback
    ///
    /// Unregistering an unknown id is a no-op.
    pub fn unregister(&self, id: HookId) {
        self.inner.callbacks.borrow_mut().retain(|hook| hook.id() != id);
    }

    /// Deliver `event` to all currently registered callbacks
    pub fn emit(&self, event: S) {
        self.inner.pending.borrow_mut().push_back(event);

        // If a dispatch is already running further up the stack it will
        // drain the queue, including the event just pushed.
        if self.inner.dispatching.get() {
            return;
        }

        self.inner.dispatching.set(true);
        loop {
            let next = self.inner.pending.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };

            // Snapshot the listener list so callbacks may register and
            // unregister while the event is delivered.
            let listeners = self.inner.callbacks.borrow().clone();
            for listener in listeners {
                (&mut *listener.cb.borrow_mut())(&event);
            }
        }
        self.inner.dispatching.set(false);
    }
}

impl<S> Default for Signal<S> {
    fn default() -> Self {
        Signal::new()
    }
}

impl<S> Clone for Signal<S> {
    fn clone(&self) -> Signal<S> {
        Signal {
            inner: self.inner.clone(),
        }
    }
}

impl<S> fmt::Debug for Signal<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.inner.callbacks.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn basic_signal() {
        let signal = Signal::<u32>::new();

        let fired = Rc::new(Cell::new(false));
        let fired2 = fired.clone();

        let _id = signal.register(move |_| fired2.set(true));

        signal.emit(0);

        assert!(fired.get());
    }

    #[test]
    fn unregister_callback() {
        let signal = Signal::<u32>::new();

        let count = Rc::new(Cell::new(0u32));
        let count2 = count.clone();
        let id = signal.register(move |_| count2.set(count2.get() + 1));

        signal.emit(42);
        signal.unregister(id);
        signal.emit(41);

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn emit_from_callback_is_deferred() {
        let signal = Signal::<u32>::new();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen2 = seen.clone();
        let nested = signal.clone();
        let _id = signal.register(move |&value| {
            seen2.borrow_mut().push(value);
            if value == 0 {
                nested.emit(42);
            }
        });

        signal.emit(0);

        assert_eq!(*seen.borrow(), vec![0, 42]);
    }

    #[test]
    fn register_from_callback_misses_current_event() {
        let signal = Signal::<u32>::new();

        let count = Rc::new(Cell::new(0u32));
        let count2 = count.clone();
        let nested = signal.clone();
        let _id = signal.register(move |&value| {
            if value == 0 {
                let count3 = count2.clone();
                nested.register(move |_| count3.set(count3.get() + 1));
            }
        });

        signal.emit(0);
        assert_eq!(count.get(), 0);

        signal.emit(1);
        assert_eq!(count.get(), 1);
    }
}
