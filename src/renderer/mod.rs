//! Rendering contract and GPU resource descriptors
//!
//! The render manager issues all its GPU work through the [`Renderer`] trait:
//! binding the output's context, allocating the color-texture/framebuffer
//! pairs behind [`RenderBuffer`]s and clearing damage rectangles. Scene
//! content itself is drawn by the scene graph (see
//! [`Surface::draw`](crate::scene::Surface::draw)); post-effect and overlay
//! hooks receive the same `&mut R` and issue whatever passes they like.

use std::fmt;
use std::ops::Mul;

use cgmath::Matrix4;

use crate::utils::{Logical, Physical, Rectangle, Size, Transform};

mod buffer;
pub use buffer::{BufferSlot, RenderBuffer};

#[cfg(any(test, feature = "renderer_test"))]
pub mod test;

/// A four-component color representing pre-multiplied RGBA color values
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color32F([f32; 4]);

impl Color32F {
    /// Initialize a new [`Color32F`]
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    /// Transparent color
    pub const TRANSPARENT: Color32F = Color32F::new(0.0, 0.0, 0.0, 0.0);

    /// Solid black color
    pub const BLACK: Color32F = Color32F::new(0f32, 0f32, 0f32, 1f32);

    /// Red color component
    #[inline]
    pub fn r(&self) -> f32 {
        self.0[0]
    }

    /// Green color component
    #[inline]
    pub fn g(&self) -> f32 {
        self.0[1]
    }

    /// Blue color component
    #[inline]
    pub fn b(&self) -> f32 {
        self.0[2]
    }

    /// Alpha color component
    #[inline]
    pub fn a(&self) -> f32 {
        self.0[3]
    }

    /// Color components
    #[inline]
    pub fn components(self) -> [f32; 4] {
        self.0
    }
}

impl From<[f32; 4]> for Color32F {
    #[inline]
    fn from(value: [f32; 4]) -> Self {
        Self(value)
    }
}

impl Mul<f32> for Color32F {
    type Output = Color32F;

    #[inline]
    fn mul(self, rhs: f32) -> Self::Output {
        Self::new(self.r() * rhs, self.g() * rhs, self.b() * rhs, self.a() * rhs)
    }
}

bitflags::bitflags! {
    /// Runtime flags read from the environment
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RuntimeFlags: u32 {
        /// Force full-output damage every frame
        const NO_DAMAGE_TRACK = 1 << 0;
        /// Fill the backbuffer with yellow before drawing, making the
        /// damaged area of each frame visible
        const DAMAGE_DEBUG = 1 << 1;
    }
}

impl RuntimeFlags {
    /// Read the flags from `REPAINT_NO_DAMAGE_TRACK` and
    /// `REPAINT_DAMAGE_DEBUG`
    pub fn from_env() -> Self {
        let mut flags = RuntimeFlags::empty();
        if std::env::var("REPAINT_NO_DAMAGE_TRACK")
            .map(|x| x == "1")
            .unwrap_or(false)
        {
            flags |= RuntimeFlags::NO_DAMAGE_TRACK;
        }
        if std::env::var("REPAINT_DAMAGE_DEBUG")
            .map(|x| x == "1")
            .unwrap_or(false)
        {
            flags |= RuntimeFlags::DAMAGE_DEBUG;
        }
        flags
    }
}

/// Descriptor of a framebuffer to render into
///
/// Carries everything a draw call needs to position itself on the output:
/// the output-local geometry, the output transform and the raw pixel
/// viewport, together with the GL-style object ids. An id pair of `(0, 0)`
/// denotes the display's own framebuffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    /// Framebuffer object id; `0` is the display framebuffer
    pub fb: u32,
    /// Color texture id backing `fb`; `0` for the display framebuffer
    pub tex: u32,
    /// Logical geometry of the output this target belongs to
    pub geometry: Rectangle<i32, Logical>,
    /// Transform of the output
    pub transform: Transform,
    /// Size of the framebuffer in raw pixels
    pub viewport: Size<i32, Physical>,
}

impl RenderTarget {
    /// The projection matrix for drawing into this target
    #[inline]
    pub fn matrix(&self) -> Matrix4<f32> {
        self.transform.matrix()
    }

    /// Whether this target is the display's own framebuffer
    #[inline]
    pub fn is_display(&self) -> bool {
        self.fb == 0 && self.tex == 0
    }
}

/// Abstraction of the GPU context of one output
///
/// Buffer ids minted by [`create_buffer`](Renderer::create_buffer) must be
/// non-zero; `(0, 0)` is reserved for the display framebuffer. All methods
/// taking buffer ids are only called between
/// [`bind_output`](Renderer::bind_output) and
/// [`unbind_output`](Renderer::unbind_output).
pub trait Renderer: fmt::Debug {
    /// Error type returned by the rendering operations of this renderer
    type Error: std::error::Error;

    /// Make the output's GPU context current
    ///
    /// Binds may nest (hooks can trigger allocations mid-frame); every bind
    /// is paired with exactly one [`unbind_output`](Renderer::unbind_output).
    fn bind_output(&mut self) -> Result<(), Self::Error>;

    /// Release the output's GPU context
    fn unbind_output(&mut self);

    /// Start issuing draw calls against `target`
    fn render_begin(&mut self, target: &RenderTarget);

    /// Finish the current render pass
    fn render_end(&mut self);

    /// Allocate a color texture and framebuffer object of the given size
    fn create_buffer(&mut self, size: Size<i32, Physical>) -> Result<(u32, u32), Self::Error>;

    /// Resize an existing texture/framebuffer pair
    fn resize_buffer(&mut self, fb: u32, tex: u32, size: Size<i32, Physical>) -> Result<(), Self::Error>;

    /// Free a texture/framebuffer pair
    fn destroy_buffer(&mut self, fb: u32, tex: u32);

    /// Clear the current render pass target with a single color
    ///
    /// `at` limits the clear to a set of rectangles, which allows partially
    /// clearing the target for damaged rendering.
    fn clear(&mut self, color: Color32F, at: &[Rectangle<i32, Physical>]) -> Result<(), Self::Error>;
}
