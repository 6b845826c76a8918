// Copyright 2026 the dwg2svg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The WCS → SVG viewport transform and the explicit "are we inside a block
//! definition" frame, as a value rather than a mutable `in_block_definition`
//! boolean threaded through file-scope state.

use peniko::kurbo::{Affine, Point};

/// The computed drawing extents, in WCS, with the derived viewport size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Minimum X over every renderable entity.
    pub xmin: f64,
    /// Minimum Y over every renderable entity.
    pub ymin: f64,
    /// Maximum X over every renderable entity.
    pub xmax: f64,
    /// Maximum Y over every renderable entity.
    pub ymax: f64,
}

impl Viewport {
    /// `page_width`, guaranteed to be a finite, strictly positive number.
    pub fn page_width(&self) -> f64 {
        let w = self.xmax - self.xmin;
        if w.is_finite() && w > 0.0 {
            w
        } else {
            100.0
        }
    }

    /// `page_height`, guaranteed to be a finite, strictly positive number.
    pub fn page_height(&self) -> f64 {
        let h = self.ymax - self.ymin;
        if h.is_finite() && h > 0.0 {
            h
        } else {
            100.0
        }
    }

    /// Project a WCS point into SVG user space (translate by `(xmin, ymin)`,
    /// flip Y).
    pub fn project(&self, p: Point) -> Point {
        Point::new(p.x - self.xmin, self.page_height() - (p.y - self.ymin))
    }

    /// The viewport-flip affine, equivalent to [`Self::project`] but usable
    /// for composing with further transforms (e.g. INSERT's matrix).
    pub fn affine(&self) -> Affine {
        // y' = page_height - y + ymin = -y + (page_height + ymin)
        Affine::new([
            1.0,
            0.0,
            0.0,
            -1.0,
            -self.xmin,
            self.page_height() + self.ymin,
        ])
    }
}

/// Whether the current emission context is inside a block definition (raw
/// coordinates, no viewport transform) or out in a space (viewport-projected
/// coordinates). Explicit alternative to the source's mutable boolean flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// Top-level paper/model space: the viewport transform applies.
    Viewport,
    /// Inside a `<symbol>`/block definition body: coordinates are emitted
    /// raw, untransformed; the `<use>` site supplies the transform.
    Raw,
}

impl Frame {
    /// Project a WCS point according to this frame.
    pub fn project(&self, viewport: &Viewport, p: Point) -> Point {
        match self {
            Self::Viewport => viewport.project(p),
            Self::Raw => p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp() -> Viewport {
        Viewport {
            xmin: -1.0,
            ymin: 0.0,
            xmax: 9.0,
            ymax: 10.0,
        }
    }

    #[test]
    fn project_translates_and_flips_y() {
        let v = vp();
        let p = v.project(Point::new(0.0, 10.0));
        assert!((p.x - 1.0).abs() < 1e-9);
        assert!((p.y - 0.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_extents_default_to_100() {
        let v = Viewport {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 0.0,
            ymax: f64::NAN,
        };
        assert_eq!(v.page_width(), 100.0);
        assert_eq!(v.page_height(), 100.0);
    }

    #[test]
    fn raw_frame_is_identity() {
        let v = vp();
        let p = Point::new(3.0, 4.0);
        assert_eq!(Frame::Raw.project(&v, p), p);
    }
}
