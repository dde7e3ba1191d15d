use std::cell::RefCell;
use std::rc::Rc;

crate::utils::ids::id_gen!(hooks_id);

/// Unique hook identifier used to unregister effect/post-effect hooks
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct HookId(usize);

impl HookId {
    pub(crate) fn next() -> Self {
        HookId(hooks_id::next())
    }
}

/// Tracks the lifetime of an id, so it can be returned to the generator
#[derive(Debug)]
struct HookStorage {
    id: HookId,
}

impl Drop for HookStorage {
    fn drop(&mut self) {
        hooks_id::remove(self.id.0);
    }
}

/// A registered callback, paired with the id it was registered under
///
/// Cloning a [`Hook`] clones the handle, not the callback, which makes
/// snapshots of hook lists cheap.
pub(crate) struct Hook<T: ?Sized> {
    storage: Rc<HookStorage>,
    pub cb: Rc<RefCell<T>>,
}

impl<T: ?Sized> Hook<T> {
    pub fn new(cb: Rc<RefCell<T>>) -> Self {
        Self {
            storage: Rc::new(HookStorage { id: HookId::next() }),
            cb,
        }
    }

    pub fn id(&self) -> HookId {
        self.storage.id
    }
}

impl<T: ?Sized> std::fmt::Debug for Hook<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hook")
            .field("id", &self.storage.id)
            .finish_non_exhaustive()
    }
}

impl<T: ?Sized> Clone for Hook<T> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            cb: self.cb.clone(),
        }
    }
}
