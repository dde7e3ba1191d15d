//! Pixman-style region arithmetic over sets of integer rectangles
//!
//! A [`Region`] is a union of axis-aligned rectangles in some coordinate
//! space. The stored rectangles are kept pairwise disjoint, so enumerating
//! them never visits a pixel twice and the covered area is the plain sum of
//! the rectangle areas.

use std::fmt;

use crate::utils::{Physical, Point, Rectangle};

/// A set of pixels, represented as a union of disjoint rectangles
pub struct Region<Kind = Physical> {
    rects: Vec<Rectangle<i32, Kind>>,
}

impl<Kind> Region<Kind> {
    /// Create a new empty [`Region`]
    #[inline]
    pub fn new() -> Self {
        Region { rects: Vec::new() }
    }

    /// Create a [`Region`] covering a single rectangle
    #[inline]
    pub fn from_rect(rect: Rectangle<i32, Kind>) -> Self {
        let mut region = Region::new();
        region.unite_rect(rect);
        region
    }

    /// The rectangles making up this region
    ///
    /// The rectangles are pairwise disjoint, in unspecified order.
    #[inline]
    pub fn rects(&self) -> &[Rectangle<i32, Kind>] {
        &self.rects
    }

    /// Whether this region covers no pixels
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Remove all pixels from this region
    #[inline]
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// The number of pixels covered by this region
    pub fn area(&self) -> usize {
        self.rects
            .iter()
            .fold(0usize, |acc, rect| acc + (rect.size.w * rect.size.h) as usize)
    }

    /// The bounding box of this region
    pub fn extents(&self) -> Rectangle<i32, Kind> {
        let mut rects = self.rects.iter();
        let Some(&first) = rects.next() else {
            return Rectangle::default();
        };
        rects.fold(first, |acc, &rect| acc.merge(rect))
    }

    /// Add the pixels of `rect` to this region
    pub fn unite_rect(&mut self, rect: Rectangle<i32, Kind>) {
        if rect.is_empty() {
            return;
        }

        // Keep the stored rectangles disjoint by only inserting the parts
        // not already covered.
        let missing = rect.subtract_rects(self.rects.iter().copied());
        self.rects.extend(missing);
    }

    /// Add the pixels of `other` to this region
    pub fn unite(&mut self, other: &Region<Kind>) {
        for &rect in other.rects() {
            self.unite_rect(rect);
        }
    }

    /// Intersect this region with `rect`
    pub fn intersect_rect(&mut self, rect: Rectangle<i32, Kind>) {
        self.rects = self
            .rects
            .iter()
            .filter_map(|r| r.intersection(rect))
            .collect();
    }

    /// Intersect this region with `other`
    pub fn intersect(&mut self, other: &Region<Kind>) {
        self.rects = self
            .rects
            .iter()
            .flat_map(|r| other.rects().iter().filter_map(move |o| r.intersection(*o)))
            .collect();
    }

    /// Remove the pixels of `rect` from this region
    pub fn subtract_rect(&mut self, rect: Rectangle<i32, Kind>) {
        let rects = std::mem::take(&mut self.rects);
        self.rects = Rectangle::subtract_rects_many_in_place(rects, [rect]);
    }

    /// Remove the pixels of `other` from this region
    pub fn subtract(&mut self, other: &Region<Kind>) {
        let rects = std::mem::take(&mut self.rects);
        self.rects = Rectangle::subtract_rects_many_in_place(rects, other.rects().iter().copied());
    }

    /// Move every rectangle of this region by `offset`
    pub fn translate(&mut self, offset: Point<i32, Kind>) {
        for rect in &mut self.rects {
            rect.loc += offset;
        }
    }

    /// Whether `point` is covered by this region
    pub fn contains(&self, point: Point<i32, Kind>) -> bool {
        self.rects.iter().any(|rect| rect.contains(point))
    }

    /// Verify the internal invariants: no empty and no overlapping rectangles
    pub fn selfcheck(&self) -> bool {
        if self.rects.iter().any(|rect| rect.is_empty()) {
            return false;
        }

        self.rects
            .iter()
            .enumerate()
            .all(|(i, rect)| !self.rects[i + 1..].iter().any(|other| rect.overlaps(*other)))
    }
}

impl<Kind> Default for Region<Kind> {
    #[inline]
    fn default() -> Self {
        Region::new()
    }
}

impl<Kind> Clone for Region<Kind> {
    #[inline]
    fn clone(&self) -> Self {
        Region {
            rects: self.rects.clone(),
        }
    }
}

impl<Kind> From<Rectangle<i32, Kind>> for Region<Kind> {
    #[inline]
    fn from(rect: Rectangle<i32, Kind>) -> Self {
        Region::from_rect(rect)
    }
}

impl<Kind> fmt::Debug for Region<Kind> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rects.iter()).finish()
    }
}

/// Two regions are equal when they cover exactly the same pixels, regardless
/// of how those pixels are split into rectangles.
impl<Kind> PartialEq for Region<Kind> {
    fn eq(&self, other: &Self) -> bool {
        let mut left = self.clone();
        left.subtract(other);
        if !left.is_empty() {
            return false;
        }

        let mut right = other.clone();
        right.subtract(self);
        right.is_empty()
    }
}

impl<Kind> Eq for Region<Kind> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rectangle<i32, Physical> {
        Rectangle::new((x, y).into(), (w, h).into())
    }

    #[test]
    fn unite_is_idempotent() {
        let mut region = Region::new();
        region.unite_rect(rect(5, 5, 10, 10));
        let once = region.clone();
        region.unite_rect(rect(5, 5, 10, 10));

        assert_eq!(region, once);
        assert_eq!(region.area(), 100);
        assert!(region.selfcheck());
    }

    #[test]
    fn unite_overlapping_stays_disjoint() {
        let mut region = Region::new();
        region.unite_rect(rect(0, 0, 10, 10));
        region.unite_rect(rect(5, 5, 10, 10));

        assert!(region.selfcheck());
        assert_eq!(region.area(), 175);
        assert_eq!(region.extents(), rect(0, 0, 15, 15));
    }

    #[test]
    fn unite_empty_rect_is_noop() {
        let mut region = Region::<Physical>::new();
        region.unite_rect(rect(10, 10, 0, 5));
        assert!(region.is_empty());
    }

    #[test]
    fn subtract_center() {
        let mut region = Region::from_rect(rect(0, 0, 100, 100));
        region.subtract_rect(rect(25, 25, 50, 50));

        assert!(region.selfcheck());
        assert_eq!(region.area(), 100 * 100 - 50 * 50);
        assert!(!region.contains((50, 50).into()));
        assert!(region.contains((10, 10).into()));
    }

    #[test]
    fn subtract_everything() {
        let mut region = Region::from_rect(rect(0, 0, 100, 100));
        region.subtract_rect(rect(-10, -10, 200, 200));
        assert!(region.is_empty());
    }

    #[test]
    fn intersect_disjoint_is_empty() {
        let mut region = Region::from_rect(rect(0, 0, 10, 10));
        region.intersect_rect(rect(20, 20, 10, 10));
        assert!(region.is_empty());
    }

    #[test]
    fn intersect_regions() {
        let mut left = Region::from_rect(rect(0, 0, 20, 20));
        left.unite_rect(rect(40, 0, 20, 20));

        let right = Region::from_rect(rect(10, 0, 40, 20));

        left.intersect(&right);
        assert!(left.selfcheck());

        let mut expected = Region::from_rect(rect(10, 0, 10, 20));
        expected.unite_rect(rect(40, 0, 10, 20));
        assert_eq!(left, expected);
    }

    #[test]
    fn translate_moves_pixels() {
        let mut region = Region::from_rect(rect(0, 0, 10, 10));
        region.translate((-5, 20).into());
        assert_eq!(region, Region::from_rect(rect(-5, 20, 10, 10)));
    }

    #[test]
    fn equality_ignores_splits() {
        let mut split = Region::new();
        split.unite_rect(rect(0, 0, 50, 100));
        split.unite_rect(rect(50, 0, 50, 100));

        assert_eq!(split, Region::from_rect(rect(0, 0, 100, 100)));
        assert_ne!(split, Region::from_rect(rect(0, 0, 100, 99)));
    }
}
