#![allow(missing_docs)]

//! A [`Renderer`] implementation without a GPU behind it, recording every
//! operation it is asked to perform. Useful for testing render orchestration
//! logic downstream; this crate's own test suite is built on it.

use crate::renderer::{Color32F, RenderTarget, Renderer};
use crate::utils::{Physical, Rectangle, Size};

/// One recorded renderer operation
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOp {
    BindOutput,
    UnbindOutput,
    RenderBegin {
        target: RenderTarget,
    },
    RenderEnd,
    CreateBuffer {
        fb: u32,
        tex: u32,
        size: Size<i32, Physical>,
    },
    ResizeBuffer {
        fb: u32,
        size: Size<i32, Physical>,
    },
    DestroyBuffer {
        fb: u32,
    },
    Clear {
        color: Color32F,
        at: Vec<Rectangle<i32, Physical>>,
    },
    /// Recorded by test scene-graph implementations via
    /// [`DummyRenderer::draw`]
    Draw {
        label: String,
        damage: Vec<Rectangle<i32, Physical>>,
    },
}

/// A renderer that records operations instead of executing them
#[derive(Debug, Default)]
pub struct DummyRenderer {
    /// Every operation issued so far, in order
    pub ops: Vec<RenderOp>,
    next_id: u32,
    bound: u32,
    in_pass: bool,
}

/// Error returned by the [`DummyRenderer`]
///
/// The dummy renderer never fails; this type exists to satisfy the
/// [`Renderer`] contract.
#[derive(thiserror::Error, Debug)]
#[error("dummy renderer error")]
pub struct DummyError;

impl DummyRenderer {
    /// Record a draw call, used by test surfaces from their `draw`
    /// implementations
    pub fn draw(&mut self, label: impl Into<String>, damage: &[Rectangle<i32, Physical>]) {
        assert!(self.in_pass, "draw outside of render_begin/render_end");
        self.ops.push(RenderOp::Draw {
            label: label.into(),
            damage: damage.to_vec(),
        });
    }

    /// The labels of all recorded draw calls, in order
    pub fn draw_order(&self) -> Vec<String> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RenderOp::Draw { label, .. } => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forget all recorded operations
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }
}

impl Renderer for DummyRenderer {
    type Error = DummyError;

    fn bind_output(&mut self) -> Result<(), Self::Error> {
        self.bound += 1;
        self.ops.push(RenderOp::BindOutput);
        Ok(())
    }

    fn unbind_output(&mut self) {
        assert!(self.bound > 0, "output not bound");
        self.bound -= 1;
        self.ops.push(RenderOp::UnbindOutput);
    }

    fn render_begin(&mut self, target: &RenderTarget) {
        assert!(!self.in_pass, "nested render pass");
        self.in_pass = true;
        self.ops.push(RenderOp::RenderBegin { target: *target });
    }

    fn render_end(&mut self) {
        assert!(self.in_pass, "render_end without render_begin");
        self.in_pass = false;
        self.ops.push(RenderOp::RenderEnd);
    }

    fn create_buffer(&mut self, size: Size<i32, Physical>) -> Result<(u32, u32), Self::Error> {
        self.next_id += 1;
        let fb = self.next_id;
        self.next_id += 1;
        let tex = self.next_id;
        self.ops.push(RenderOp::CreateBuffer { fb, tex, size });
        Ok((fb, tex))
    }

    fn resize_buffer(&mut self, fb: u32, _tex: u32, size: Size<i32, Physical>) -> Result<(), Self::Error> {
        self.ops.push(RenderOp::ResizeBuffer { fb, size });
        Ok(())
    }

    fn destroy_buffer(&mut self, fb: u32, _tex: u32) {
        self.ops.push(RenderOp::DestroyBuffer { fb });
    }

    fn clear(&mut self, color: Color32F, at: &[Rectangle<i32, Physical>]) -> Result<(), Self::Error> {
        assert!(self.in_pass, "clear outside of render_begin/render_end");
        self.ops.push(RenderOp::Clear {
            color,
            at: at.to_vec(),
        });
        Ok(())
    }
}
