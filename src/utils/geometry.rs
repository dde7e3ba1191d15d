//! Geometry primitives for damage and layout arithmetic
//!
//! Every quantity in the rendering pipeline lives in one of a few coordinate
//! spaces: output pixels ([`Physical`]), scale-independent layout
//! coordinates ([`Logical`]) or cells of the virtual workspace grid
//! ([`Workspace`]). The space is tracked as a type parameter so damage in
//! output pixels cannot silently mix with grid coordinates.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Sub};

use cgmath::Matrix4;

/// Type-level marker for the logical coordinate space
#[derive(Debug)]
pub struct Logical;

/// Type-level marker for the physical (output pixel) coordinate space
#[derive(Debug)]
pub struct Physical;

/// Type-level marker for the virtual workspace grid
#[derive(Debug)]
pub struct Workspace;

/// Numeric type usable as a coordinate
pub trait Coordinate:
    Sized + Add<Self, Output = Self> + Sub<Self, Output = Self> + PartialOrd + Default + Copy + fmt::Debug
{
    /// The zero coordinate
    const ZERO: Self;
    /// Multiply by a scale factor
    fn upscale(self, scale: Self) -> Self;
    /// Divide by a scale factor
    fn downscale(self, scale: Self) -> Self;
    /// Whether the coordinate is zero or positive
    fn non_negative(self) -> bool;
    /// The smaller of the two coordinates
    fn min(self, other: Self) -> Self {
        if self < other {
            self
        } else {
            other
        }
    }
    /// The larger of the two coordinates
    fn max(self, other: Self) -> Self {
        if self > other {
            self
        } else {
            other
        }
    }
    /// Addition clamped at the numeric bounds
    fn saturating_add(self, other: Self) -> Self;
    /// Subtraction clamped at the numeric bounds
    fn saturating_sub(self, other: Self) -> Self;
    /// Multiplication clamped at the numeric bounds
    fn saturating_mul(self, other: Self) -> Self;
}

impl Coordinate for i32 {
    const ZERO: i32 = 0;

    #[inline]
    fn upscale(self, scale: Self) -> Self {
        self.saturating_mul(scale)
    }

    #[inline]
    fn downscale(self, scale: Self) -> Self {
        self / scale
    }

    #[inline]
    fn non_negative(self) -> bool {
        self >= 0
    }

    #[inline]
    fn saturating_add(self, other: Self) -> Self {
        i32::saturating_add(self, other)
    }

    #[inline]
    fn saturating_sub(self, other: Self) -> Self {
        i32::saturating_sub(self, other)
    }

    #[inline]
    fn saturating_mul(self, other: Self) -> Self {
        i32::saturating_mul(self, other)
    }
}

impl Coordinate for f64 {
    const ZERO: f64 = 0.0;

    #[inline]
    fn upscale(self, scale: Self) -> Self {
        self * scale
    }

    #[inline]
    fn downscale(self, scale: Self) -> Self {
        self / scale
    }

    #[inline]
    fn non_negative(self) -> bool {
        self >= 0.0
    }

    #[inline]
    fn saturating_add(self, other: Self) -> Self {
        self + other
    }

    #[inline]
    fn saturating_sub(self, other: Self) -> Self {
        self - other
    }

    #[inline]
    fn saturating_mul(self, other: Self) -> Self {
        self * other
    }
}

/*
 * Scale
 */

/// A rendering scale, possibly different per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale<N: Coordinate> {
    /// The scale on the x axis
    pub x: N,
    /// The scale on the y axis
    pub y: N,
}

impl<N: Coordinate> From<N> for Scale<N> {
    #[inline]
    fn from(scale: N) -> Self {
        Scale { x: scale, y: scale }
    }
}

impl<N: Coordinate> From<(N, N)> for Scale<N> {
    #[inline]
    fn from((x, y): (N, N)) -> Self {
        Scale { x, y }
    }
}

/*
 * Point
 */

/// A location in one of the coordinate spaces
///
/// Arithmetic on points saturates instead of overflowing.
#[repr(C)]
pub struct Point<N, Kind> {
    /// horizontal coordinate
    pub x: N,
    /// vertical coordinate
    pub y: N,
    _kind: PhantomData<Kind>,
}

impl<N: Coordinate, Kind> Point<N, Kind> {
    /// A point at the given coordinates
    #[inline]
    pub fn new(x: N, y: N) -> Self {
        Point {
            x,
            y,
            _kind: PhantomData,
        }
    }

    /// Reinterpret this point as a [`Size`]
    ///
    /// Debug-asserts that both coordinates are non-negative.
    #[inline]
    pub fn to_size(self) -> Size<N, Kind> {
        debug_assert!(
            self.x.non_negative() && self.y.non_negative(),
            "Attempting to create a `Size` of negative size: {:?}",
            (self.x, self.y)
        );
        Size {
            w: self.x,
            h: self.y,
            _kind: PhantomData,
        }
    }
}

impl<N: Coordinate, Kind> From<(N, N)> for Point<N, Kind> {
    #[inline]
    fn from((x, y): (N, N)) -> Self {
        Point::new(x, y)
    }
}

impl<N: Coordinate, Kind> Add for Point<N, Kind> {
    type Output = Point<N, Kind>;

    #[inline]
    fn add(self, other: Point<N, Kind>) -> Point<N, Kind> {
        Point::new(self.x.saturating_add(other.x), self.y.saturating_add(other.y))
    }
}

impl<N: Coordinate, Kind> AddAssign for Point<N, Kind> {
    #[inline]
    fn add_assign(&mut self, rhs: Point<N, Kind>) {
        *self = *self + rhs;
    }
}

impl<N: Coordinate, Kind> Sub for Point<N, Kind> {
    type Output = Point<N, Kind>;

    #[inline]
    fn sub(self, other: Point<N, Kind>) -> Point<N, Kind> {
        Point::new(self.x.saturating_sub(other.x), self.y.saturating_sub(other.y))
    }
}

impl<N: fmt::Debug, Kind> fmt::Debug for Point<N, Kind> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Point")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

impl<N: Clone, Kind> Clone for Point<N, Kind> {
    #[inline]
    fn clone(&self) -> Self {
        Point {
            x: self.x.clone(),
            y: self.y.clone(),
            _kind: PhantomData,
        }
    }
}

impl<N: Copy, Kind> Copy for Point<N, Kind> {}

impl<N: PartialEq, Kind> PartialEq for Point<N, Kind> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl<N: Eq, Kind> Eq for Point<N, Kind> {}

impl<N: Default, Kind> Default for Point<N, Kind> {
    #[inline]
    fn default() -> Self {
        Point {
            x: N::default(),
            y: N::default(),
            _kind: PhantomData,
        }
    }
}

/*
 * Size
 */

/// A two-dimensional extent
///
/// Constructors debug-assert that both dimensions are non-negative; writing
/// to the fields directly can break that.
#[repr(C)]
pub struct Size<N, Kind> {
    /// width
    pub w: N,
    /// height
    pub h: N,
    _kind: PhantomData<Kind>,
}

impl<N: Coordinate, Kind> Size<N, Kind> {
    /// A size with the given dimensions
    #[inline]
    pub fn new(w: N, h: N) -> Self {
        debug_assert!(
            w.non_negative() && h.non_negative(),
            "Attempting to create a `Size` of negative size: {:?}",
            (w, h)
        );
        Size {
            w,
            h,
            _kind: PhantomData,
        }
    }

    /// Whether this size spans no pixels on at least one axis
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.w > N::ZERO && self.h > N::ZERO)
    }
}

impl<N: Coordinate, Kind> From<(N, N)> for Size<N, Kind> {
    #[inline]
    fn from((w, h): (N, N)) -> Self {
        Size::new(w, h)
    }
}

impl<N: fmt::Debug, Kind> fmt::Debug for Size<N, Kind> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Size")
            .field("w", &self.w)
            .field("h", &self.h)
            .finish()
    }
}

impl<N: Clone, Kind> Clone for Size<N, Kind> {
    #[inline]
    fn clone(&self) -> Self {
        Size {
            w: self.w.clone(),
            h: self.h.clone(),
            _kind: PhantomData,
        }
    }
}

impl<N: Copy, Kind> Copy for Size<N, Kind> {}

impl<N: PartialEq, Kind> PartialEq for Size<N, Kind> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.w == other.w && self.h == other.h
    }
}

impl<N: Eq, Kind> Eq for Size<N, Kind> {}

impl<N: Default, Kind> Default for Size<N, Kind> {
    #[inline]
    fn default() -> Self {
        Size {
            w: N::default(),
            h: N::default(),
            _kind: PhantomData,
        }
    }
}

/*
 * Rectangle
 */

/// An axis-aligned rectangle, defined by its top-left corner and its size
///
/// Arithmetic on rectangles saturates instead of overflowing.
#[repr(C)]
pub struct Rectangle<N, Kind> {
    /// Location of the top-left corner
    pub loc: Point<N, Kind>,
    /// Extent towards the bottom-right
    pub size: Size<N, Kind>,
}

impl<N: Coordinate, Kind> Rectangle<N, Kind> {
    /// A rectangle from its top-left corner and size
    #[inline]
    pub fn new(loc: Point<N, Kind>, size: Size<N, Kind>) -> Self {
        Rectangle { loc, size }
    }

    /// A rectangle of the given size with its top-left corner at the origin
    #[inline]
    pub fn from_size(size: Size<N, Kind>) -> Self {
        Rectangle {
            loc: Point::default(),
            size,
        }
    }

    /// A rectangle spanning the two given corners
    #[inline]
    pub fn from_extremities(
        topleft: impl Into<Point<N, Kind>>,
        bottomright: impl Into<Point<N, Kind>>,
    ) -> Self {
        let topleft = topleft.into();
        let bottomright = bottomright.into();
        Rectangle {
            loc: topleft,
            size: (bottomright - topleft).to_size(),
        }
    }

    /// Whether this rectangle covers no pixels
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size.is_empty()
    }

    /// Whether `point` lies within this rectangle
    ///
    /// The left and top edges are inclusive, the right and bottom edges are
    /// not.
    #[inline]
    pub fn contains<P: Into<Point<N, Kind>>>(self, point: P) -> bool {
        let p: Point<N, Kind> = point.into();
        (p.x >= self.loc.x)
            && (p.x < self.loc.x.saturating_add(self.size.w))
            && (p.y >= self.loc.y)
            && (p.y < self.loc.y.saturating_add(self.size.h))
    }

    /// Whether `rect` lies entirely within this rectangle
    ///
    /// A rectangle contains itself.
    #[inline]
    pub fn contains_rect<R: Into<Rectangle<N, Kind>>>(self, rect: R) -> bool {
        let r: Rectangle<N, Kind> = rect.into();
        r.loc.x >= self.loc.x
            && r.loc.y >= self.loc.y
            && r.loc.x.saturating_add(r.size.w) <= self.loc.x.saturating_add(self.size.w)
            && r.loc.y.saturating_add(r.size.h) <= self.loc.y.saturating_add(self.size.h)
    }

    /// Whether the two rectangles share any pixel
    ///
    /// Exclusive: rectangles that merely touch along an edge do not overlap.
    #[inline]
    pub fn overlaps(self, other: impl Into<Rectangle<N, Kind>>) -> bool {
        let other = other.into();

        self.loc.x < other.loc.x.saturating_add(other.size.w)
            && other.loc.x < self.loc.x.saturating_add(self.size.w)
            && self.loc.y < other.loc.y.saturating_add(other.size.h)
            && other.loc.y < self.loc.y.saturating_add(self.size.h)
    }

    /// The rectangle covered by both `self` and `other`, if they overlap
    #[inline]
    pub fn intersection(self, other: impl Into<Rectangle<N, Kind>>) -> Option<Self> {
        let other = other.into();
        if !self.overlaps(other) {
            return None;
        }
        Some(Rectangle::from_extremities(
            (self.loc.x.max(other.loc.x), self.loc.y.max(other.loc.y)),
            (
                (self.loc.x.saturating_add(self.size.w)).min(other.loc.x.saturating_add(other.size.w)),
                (self.loc.y.saturating_add(self.size.h)).min(other.loc.y.saturating_add(other.size.h)),
            ),
        ))
    }

    /// The smallest rectangle containing both `self` and `other`
    #[inline]
    pub fn merge(self, other: Self) -> Self {
        Rectangle::from_extremities(
            (self.loc.x.min(other.loc.x), self.loc.y.min(other.loc.y)),
            (
                (self.loc.x.saturating_add(self.size.w)).max(other.loc.x.saturating_add(other.size.w)),
                (self.loc.y.saturating_add(self.size.h)).max(other.loc.y.saturating_add(other.size.h)),
            ),
        )
    }

    /// The parts of this rectangle not covered by `other`
    ///
    /// Non-overlapping rectangles return `self` unchanged; full coverage
    /// returns nothing; partial coverage returns up to 4 pieces.
    pub fn subtract_rect(self, other: Self) -> Vec<Self> {
        self.subtract_rects([other])
    }

    /// The parts of this rectangle not covered by any of `others`
    pub fn subtract_rects(self, others: impl IntoIterator<Item = Self>) -> Vec<Self> {
        let mut remaining = Vec::with_capacity(4);
        remaining.push(self);
        Self::subtract_rects_many_in_place(remaining, others)
    }

    /// Remove every rectangle of `others` from every rectangle of `rects`
    ///
    /// The result reuses the `rects` allocation. Pieces produced by a split
    /// are disjoint from the subtracted rectangle, so each is cut at most
    /// once per entry of `others`.
    pub fn subtract_rects_many_in_place(
        mut rects: Vec<Self>,
        others: impl IntoIterator<Item = Self>,
    ) -> Vec<Self> {
        for hole in others {
            if rects.is_empty() {
                break;
            }

            // Only the rectangles present before this hole need cutting; the
            // pieces pushed below can not overlap it.
            let mut unchecked = rects.len();
            let mut index = 0usize;

            while unchecked > 0 {
                unchecked -= 1;

                let Some(overlap) = rects[index].intersection(hole) else {
                    index += 1;
                    continue;
                };

                let piece = rects.remove(index);
                if hole.contains_rect(piece) {
                    continue;
                }

                let piece_right = piece.loc.x.saturating_add(piece.size.w);
                let piece_bottom = piece.loc.y.saturating_add(piece.size.h);
                let overlap_right = overlap.loc.x.saturating_add(overlap.size.w);
                let overlap_bottom = overlap.loc.y.saturating_add(overlap.size.h);

                // What survives: full-width strips above and below the
                // overlap, and the leftovers at its own height.
                let above = Rectangle::new(
                    piece.loc,
                    (piece.size.w, overlap.loc.y.saturating_sub(piece.loc.y)).into(),
                );
                let below = Rectangle::new(
                    (piece.loc.x, overlap_bottom).into(),
                    (piece.size.w, piece_bottom.saturating_sub(overlap_bottom)).into(),
                );
                let left = Rectangle::new(
                    (piece.loc.x, overlap.loc.y).into(),
                    (overlap.loc.x.saturating_sub(piece.loc.x), overlap.size.h).into(),
                );
                let right = Rectangle::new(
                    (overlap_right, overlap.loc.y).into(),
                    (piece_right.saturating_sub(overlap_right), overlap.size.h).into(),
                );

                for survivor in [above, left, right, below] {
                    if !survivor.is_empty() {
                        rects.push(survivor);
                    }
                }
            }
        }

        rects
    }
}

impl<N: Coordinate> Rectangle<N, Logical> {
    /// This rectangle in output pixels at the given scale
    #[inline]
    pub fn to_physical(self, scale: impl Into<Scale<N>>) -> Rectangle<N, Physical> {
        let scale = scale.into();
        Rectangle {
            loc: Point::new(self.loc.x.upscale(scale.x), self.loc.y.upscale(scale.y)),
            size: Size::new(self.size.w.upscale(scale.x), self.size.h.upscale(scale.y)),
        }
    }
}

impl<N: Coordinate> Rectangle<N, Physical> {
    /// This rectangle in logical coordinates at the given scale
    #[inline]
    pub fn to_logical(self, scale: impl Into<Scale<N>>) -> Rectangle<N, Logical> {
        let scale = scale.into();
        Rectangle {
            loc: Point::new(self.loc.x.downscale(scale.x), self.loc.y.downscale(scale.y)),
            size: Size::new(self.size.w.downscale(scale.x), self.size.h.downscale(scale.y)),
        }
    }
}

impl<N: fmt::Debug, Kind> fmt::Debug for Rectangle<N, Kind> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rectangle")
            .field("x", &self.loc.x)
            .field("y", &self.loc.y)
            .field("width", &self.size.w)
            .field("height", &self.size.h)
            .finish()
    }
}

impl<N: Clone, Kind> Clone for Rectangle<N, Kind> {
    #[inline]
    fn clone(&self) -> Self {
        Rectangle {
            loc: self.loc.clone(),
            size: self.size.clone(),
        }
    }
}

impl<N: Copy, Kind> Copy for Rectangle<N, Kind> {}

impl<N: PartialEq, Kind> PartialEq for Rectangle<N, Kind> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.loc == other.loc && self.size == other.size
    }
}

impl<N: Eq, Kind> Eq for Rectangle<N, Kind> {}

impl<N: Default, Kind> Default for Rectangle<N, Kind> {
    #[inline]
    fn default() -> Self {
        Rectangle {
            loc: Default::default(),
            size: Default::default(),
        }
    }
}

/// The orientation a display scans out with
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum Transform {
    /// No rotation or flipping
    #[default]
    Normal,
    /// Rotated by 90 degrees
    _90,
    /// Rotated by 180 degrees
    _180,
    /// Rotated by 270 degrees
    _270,
    /// Flipped around the vertical axis
    Flipped,
    /// Flipped, then rotated by 90 degrees
    Flipped90,
    /// Flipped, then rotated by 180 degrees
    Flipped180,
    /// Flipped, then rotated by 270 degrees
    Flipped270,
}

impl Transform {
    /// The transform undoing this one
    ///
    /// Maps quarter turns onto three-quarter turns and vice versa; flips and
    /// half turns are their own inverse.
    #[inline]
    pub fn invert(&self) -> Transform {
        match self {
            Transform::Normal => Transform::Normal,
            Transform::Flipped => Transform::Flipped,
            Transform::_90 => Transform::_270,
            Transform::_180 => Transform::_180,
            Transform::_270 => Transform::_90,
            Transform::Flipped90 => Transform::Flipped270,
            Transform::Flipped180 => Transform::Flipped180,
            Transform::Flipped270 => Transform::Flipped90,
        }
    }

    /// The size of an area after applying this transform
    ///
    /// Quarter and three-quarter turns swap width and height.
    pub fn transform_size<N: Coordinate, Kind>(&self, size: Size<N, Kind>) -> Size<N, Kind> {
        if *self == Transform::_90
            || *self == Transform::_270
            || *self == Transform::Flipped90
            || *self == Transform::Flipped270
        {
            Size::new(size.h, size.w)
        } else {
            size
        }
    }

    /// Where `rect` lands when an area of size `area` is transformed
    pub fn transform_rect_in<N: Coordinate, Kind>(
        &self,
        rect: Rectangle<N, Kind>,
        area: &Size<N, Kind>,
    ) -> Rectangle<N, Kind> {
        let size = self.transform_size(rect.size);

        let loc = match *self {
            Transform::Normal => rect.loc,
            Transform::_90 => (area.h - rect.loc.y - rect.size.h, rect.loc.x).into(),
            Transform::_180 => (
                area.w - rect.loc.x - rect.size.w,
                area.h - rect.loc.y - rect.size.h,
            )
                .into(),
            Transform::_270 => (rect.loc.y, area.w - rect.loc.x - rect.size.w).into(),
            Transform::Flipped => (area.w - rect.loc.x - rect.size.w, rect.loc.y).into(),
            Transform::Flipped90 => (
                area.h - rect.loc.y - rect.size.h,
                area.w - rect.loc.x - rect.size.w,
            )
                .into(),
            Transform::Flipped180 => (rect.loc.x, area.h - rect.loc.y - rect.size.h).into(),
            Transform::Flipped270 => (rect.loc.y, rect.loc.x).into(),
        };

        Rectangle::new(loc, size)
    }

    /// A projection matrix to apply this transform
    #[rustfmt::skip]
    pub fn matrix(&self) -> Matrix4<f32> {
        match self {
            Transform::Normal => Matrix4::new(
                1.0, 0.0, 0.0, 0.0,
                0.0, 1.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ),
            Transform::_90 => Matrix4::new(
                0.0, -1.0, 0.0, 0.0,
                1.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ),
            Transform::_180 => Matrix4::new(
                -1.0, 0.0, 0.0, 0.0,
                0.0, -1.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ),
            Transform::_270 => Matrix4::new(
                0.0, 1.0, 0.0, 0.0,
                -1.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ),
            Transform::Flipped => Matrix4::new(
                -1.0, 0.0, 0.0, 0.0,
                0.0, 1.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ),
            Transform::Flipped90 => Matrix4::new(
                0.0, 1.0, 0.0, 0.0,
                1.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ),
            Transform::Flipped180 => Matrix4::new(
                1.0, 0.0, 0.0, 0.0,
                0.0, -1.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ),
            Transform::Flipped270 => Matrix4::new(
                0.0, -1.0, 0.0, 0.0,
                -1.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Physical, Point, Rectangle, Size, Transform};

    fn output() -> Size<i32, Physical> {
        (1920, 1080).into()
    }

    fn output_box() -> Rectangle<i32, Physical> {
        Rectangle::from_size(output())
    }

    #[test]
    fn rotated_output_swaps_resolution() {
        assert_eq!(Transform::_90.transform_size(output()), (1080, 1920).into());
        assert_eq!(Transform::Flipped270.transform_size(output()), (1080, 1920).into());
        assert_eq!(Transform::Flipped180.transform_size(output()), output());
    }

    #[test]
    fn damage_rect_maps_onto_rotated_output() {
        // A damage rect near the top-left of a landscape output ends up near
        // the top-right corner when scanned out rotated by a quarter turn.
        let damage = Rectangle::<i32, Physical>::new((10, 20).into(), (200, 100).into());
        let mapped = Transform::_90.transform_rect_in(damage, &output());
        assert_eq!(mapped, Rectangle::new((960, 10).into(), (100, 200).into()));
    }

    #[test]
    fn inverse_transform_round_trips_damage() {
        let damage = Rectangle::<i32, Physical>::new((300, 40).into(), (640, 480).into());
        let transform = Transform::_90;

        let on_display = transform.transform_rect_in(damage, &output());
        let back = transform
            .invert()
            .transform_rect_in(on_display, &transform.transform_size(output()));
        assert_eq!(back, damage);
    }

    #[test]
    fn window_inside_the_output_is_contained() {
        let window = Rectangle::new((100, 100).into(), (800, 600).into());
        assert!(output_box().contains_rect(window));
        assert!(window.contains_rect(window));
    }

    #[test]
    fn window_spilling_off_the_output_is_not_contained() {
        let spilling = Rectangle::new((1500, 800).into(), (800, 600).into());
        assert!(!output_box().contains_rect(spilling));
        assert!(output_box().overlaps(spilling));
        assert_eq!(
            output_box().intersection(spilling),
            Some(Rectangle::new((1500, 800).into(), (420, 280).into()))
        );
    }

    #[test]
    fn neighbouring_workspace_boxes_only_touch() {
        // Workspaces tile side by side in damage space; a touching edge must
        // not count as overlap or damage would leak between workspaces.
        let right = Rectangle::<i32, Physical>::new((1920, 0).into(), (1920, 1080).into());
        assert!(!output_box().overlaps(right));
        assert!(output_box().intersection(right).is_none());
    }

    #[test]
    fn occluding_window_splits_damage_around_it() {
        let window = Rectangle::new((660, 340).into(), (600, 400).into());
        let remaining = output_box().subtract_rect(window);

        assert_eq!(remaining.len(), 4);
        let area: i32 = remaining.iter().map(|rect| rect.size.w * rect.size.h).sum();
        assert_eq!(area, 1920 * 1080 - 600 * 400);
        assert!(remaining.iter().all(|rect| !rect.overlaps(window)));
        assert!(remaining.iter().all(|rect| output_box().contains_rect(*rect)));
    }

    #[test]
    fn fullscreen_window_occludes_everything() {
        // Window decoration shadows commonly extend past the output edges
        let fullscreen = Rectangle::new((-8, -8).into(), (1936, 1096).into());
        assert!(output_box().subtract_rect(fullscreen).is_empty());
    }

    #[test]
    fn panel_strip_subtraction_keeps_the_rest() {
        let panel = Rectangle::new((0, 0).into(), (1920, 32).into());
        let remaining = output_box().subtract_rect(panel);
        assert_eq!(
            remaining,
            vec![Rectangle::new((0, 32).into(), (1920, 1048).into())]
        );
    }

    #[test]
    fn subtracting_two_windows_cuts_each_piece_once() {
        let left_window = Rectangle::new((0, 0).into(), (960, 1080).into());
        let right_window = Rectangle::new((960, 0).into(), (960, 540).into());

        let remaining = output_box().subtract_rects([left_window, right_window]);
        assert_eq!(
            remaining,
            vec![Rectangle::new((960, 540).into(), (960, 540).into())]
        );
    }

    #[test]
    fn point_arithmetic_saturates() {
        let near_max = Point::<i32, Physical>::new(i32::MAX - 10, 0);
        let moved = near_max + Point::new(100, 100);
        assert_eq!(moved, Point::new(i32::MAX, 100));
    }
}
