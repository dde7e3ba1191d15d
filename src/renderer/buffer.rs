use tracing::error;

use crate::renderer::Renderer;
use crate::utils::{Physical, Size};

/// A GPU color texture and framebuffer object pair
///
/// Invariant: `fb == 0 && tex == 0` iff the buffer is unallocated. Allocation
/// and release go through the [`Renderer`] and must happen with the output's
/// context bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderBuffer {
    fb: u32,
    tex: u32,
    size: Size<i32, Physical>,
}

impl RenderBuffer {
    /// A new, unallocated buffer
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// The framebuffer object id, `0` while unallocated
    #[inline]
    pub fn fb(&self) -> u32 {
        self.fb
    }

    /// The color texture id, `0` while unallocated
    #[inline]
    pub fn tex(&self) -> u32 {
        self.tex
    }

    /// The current size of the allocation
    #[inline]
    pub fn size(&self) -> Size<i32, Physical> {
        self.size
    }

    /// Whether the buffer currently holds an allocation
    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.fb != 0 || self.tex != 0
    }

    /// Ensure the buffer is allocated with the given size
    ///
    /// Idempotent for an identical size; reallocates on change. Returns
    /// whether the underlying storage changed.
    pub fn allocate<R: Renderer>(
        &mut self,
        renderer: &mut R,
        size: Size<i32, Physical>,
    ) -> Result<bool, R::Error> {
        if self.is_allocated() && self.size == size {
            return Ok(false);
        }

        if self.is_allocated() {
            renderer.resize_buffer(self.fb, self.tex, size)?;
        } else {
            let (fb, tex) = renderer.create_buffer(size)?;
            if fb == 0 && tex == 0 {
                error!("renderer produced the reserved (0, 0) buffer ids");
            }
            self.fb = fb;
            self.tex = tex;
        }

        self.size = size;
        Ok(true)
    }

    /// Free the allocation, returning the buffer to the unallocated state
    pub fn release<R: Renderer>(&mut self, renderer: &mut R) {
        if self.is_allocated() {
            renderer.destroy_buffer(self.fb, self.tex);
        }
        *self = Default::default();
    }

    /// Forget the allocation without freeing it
    ///
    /// Used when ownership of the underlying GPU objects is transferred
    /// elsewhere.
    pub fn reset(&mut self) {
        *self = Default::default();
    }
}

/// A render destination: either an owned offscreen buffer or the display
///
/// The display's framebuffer is identified by the reserved id pair `(0, 0)`;
/// it is a sentinel, not an allocation, and must never be freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferSlot {
    /// An offscreen buffer owned by this slot
    Owned(RenderBuffer),
    /// The display's own framebuffer
    Display,
}

impl BufferSlot {
    /// The id pair of this slot
    #[inline]
    pub fn ids(&self) -> (u32, u32) {
        match self {
            BufferSlot::Owned(buffer) => (buffer.fb(), buffer.tex()),
            BufferSlot::Display => (0, 0),
        }
    }

    /// Whether this slot is the display sentinel
    #[inline]
    pub fn is_display(&self) -> bool {
        matches!(self, BufferSlot::Display)
    }

    /// The owned buffer, if any
    #[inline]
    pub fn as_owned(&self) -> Option<&RenderBuffer> {
        match self {
            BufferSlot::Owned(buffer) => Some(buffer),
            BufferSlot::Display => None,
        }
    }

    /// Release an owned allocation and demote this slot to the display
    /// sentinel
    pub fn release<R: Renderer>(&mut self, renderer: &mut R) {
        if let BufferSlot::Owned(ref mut buffer) = self {
            buffer.release(renderer);
        }
        *self = BufferSlot::Display;
    }
}

impl Default for BufferSlot {
    #[inline]
    fn default() -> Self {
        BufferSlot::Display
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::test::{DummyRenderer, RenderOp};

    #[test]
    fn allocate_is_idempotent_for_same_size() {
        let mut renderer = DummyRenderer::default();
        let mut buffer = RenderBuffer::new();

        assert!(buffer.allocate(&mut renderer, (800, 600).into()).unwrap());
        let ids = (buffer.fb(), buffer.tex());
        assert!(buffer.is_allocated());

        assert!(!buffer.allocate(&mut renderer, (800, 600).into()).unwrap());
        assert_eq!(ids, (buffer.fb(), buffer.tex()));
        assert_eq!(
            renderer
                .ops
                .iter()
                .filter(|op| matches!(op, RenderOp::CreateBuffer { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn allocate_resizes_on_size_change() {
        let mut renderer = DummyRenderer::default();
        let mut buffer = RenderBuffer::new();

        buffer.allocate(&mut renderer, (800, 600).into()).unwrap();
        assert!(buffer.allocate(&mut renderer, (1024, 768).into()).unwrap());
        assert_eq!(buffer.size(), (1024, 768).into());
        assert!(renderer
            .ops
            .iter()
            .any(|op| matches!(op, RenderOp::ResizeBuffer { .. })));
    }

    #[test]
    fn release_returns_to_unallocated() {
        let mut renderer = DummyRenderer::default();
        let mut buffer = RenderBuffer::new();

        buffer.allocate(&mut renderer, (16, 16).into()).unwrap();
        buffer.release(&mut renderer);

        assert!(!buffer.is_allocated());
        assert_eq!((buffer.fb(), buffer.tex()), (0, 0));
        assert!(renderer
            .ops
            .iter()
            .any(|op| matches!(op, RenderOp::DestroyBuffer { .. })));
    }

    #[test]
    fn reset_forgets_without_freeing() {
        let mut renderer = DummyRenderer::default();
        let mut buffer = RenderBuffer::new();

        buffer.allocate(&mut renderer, (16, 16).into()).unwrap();
        buffer.reset();

        assert!(!buffer.is_allocated());
        assert!(!renderer
            .ops
            .iter()
            .any(|op| matches!(op, RenderOp::DestroyBuffer { .. })));
    }

    #[test]
    fn display_slot_release_never_frees() {
        let mut renderer = DummyRenderer::default();
        let mut slot = BufferSlot::Display;
        slot.release(&mut renderer);

        assert!(slot.is_display());
        assert!(renderer.ops.is_empty());
    }
}
