// Copyright 2026 the dwg2svg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! RAY / XLINE emitter: slab-test clip against the model extents box.

use std::io::{self, Write};

use peniko::kurbo::Point;

use super::util::{point_finite, stroke_style, write_xy};
use super::RenderCtx;
use crate::color;
use crate::model::XLine;

/// Intersect the parametric line `p + t*d` with the `[lo, hi]` slab on one
/// axis, narrowing `(tmin, tmax)`. Returns `false` if the line is parallel to
/// the slab and outside it (no intersection possible on this axis).
fn clip_slab(p: f64, d: f64, lo: f64, hi: f64, tmin: &mut f64, tmax: &mut f64) -> bool {
    if d == 0.0 {
        return p >= lo && p <= hi;
    }
    let (t1, t2) = ((lo - p) / d, (hi - p) / d);
    let (t_near, t_far) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
    *tmin = tmin.max(t_near);
    *tmax = tmax.min(t_far);
    true
}

pub(super) fn xline(ctx: &mut RenderCtx<'_>, w: &mut impl Write, e: &XLine) -> io::Result<()> {
    if !e.point.is_finite() || !e.direction.is_finite() {
        return Ok(());
    }
    if e.direction.x == 0.0 && e.direction.y == 0.0 {
        return Ok(());
    }

    let mut tmin = if e.is_ray { 0.0 } else { f64::NEG_INFINITY };
    let mut tmax = f64::INFINITY;

    let vp = ctx.viewport;
    if !clip_slab(e.point.x, e.direction.x, vp.xmin, vp.xmax, &mut tmin, &mut tmax) {
        return Ok(());
    }
    if !clip_slab(e.point.y, e.direction.y, vp.ymin, vp.ymax, &mut tmin, &mut tmax) {
        return Ok(());
    }
    if tmin > tmax || !tmin.is_finite() || !tmax.is_finite() {
        return Ok(());
    }

    let start = Point::new(e.point.x + tmin * e.direction.x, e.point.y + tmin * e.direction.y);
    let end = Point::new(e.point.x + tmax * e.direction.x, e.point.y + tmax * e.direction.y);
    if !point_finite(start) || !point_finite(end) {
        return Ok(());
    }
    let start = ctx.project(start);
    let end = ctx.project(end);

    let color = color::resolve_for_layer(ctx.model, &e.common.color, e.common.layer);
    let lw = super::util::lineweight_px(ctx.model, e.common.lineweight, e.common.layer);
    let index = ctx.next_index();
    write!(w, "<path id=\"dwg-object-{index}\" d=\"M ")?;
    write_xy(w, start)?;
    write!(w, " L ")?;
    write_xy(w, end)?;
    writeln!(w, "\" style=\"{}\" />", stroke_style(&color, lw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Point3, Vec3};
    use crate::model::{ColorSpec, DwgModel, EntityCommon};
    use crate::transform::{Frame, Viewport};

    fn common() -> EntityCommon {
        EntityCommon {
            layer: None,
            color: ColorSpec::BY_LAYER,
            lineweight: -1,
            invisible: false,
        }
    }

    fn vp() -> Viewport {
        Viewport {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 10.0,
            ymax: 10.0,
        }
    }

    #[test]
    fn unbounded_xline_clips_to_extents_box() {
        let model = DwgModel::default();
        let viewport = vp();
        let mut ctx = RenderCtx::new(&model, &viewport, Frame::Viewport);
        let mut out = Vec::new();
        let e = XLine {
            common: common(),
            point: Point3::new(5.0, 5.0, 0.0),
            direction: Vec3::new(1.0, 0.0, 0.0),
            is_ray: false,
        };
        xline(&mut ctx, &mut out, &e).unwrap();
        let s = String::from_utf8(out).unwrap();
        // x spans the full [0,10] box; y stays 5, flipped to page_height-5=5.
        assert!(s.contains("0.000000,5.000000"));
        assert!(s.contains("10.000000,5.000000"));
    }

    #[test]
    fn ray_is_bounded_at_its_own_point() {
        let model = DwgModel::default();
        let viewport = vp();
        let mut ctx = RenderCtx::new(&model, &viewport, Frame::Viewport);
        let mut out = Vec::new();
        let e = XLine {
            common: common(),
            point: Point3::new(5.0, 5.0, 0.0),
            direction: Vec3::new(-1.0, 0.0, 0.0),
            is_ray: true,
        };
        xline(&mut ctx, &mut out, &e).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("5.000000,5.000000"));
        assert!(s.contains("0.000000,5.000000"));
    }

    #[test]
    fn line_entirely_outside_extents_is_skipped() {
        let model = DwgModel::default();
        let viewport = vp();
        let mut ctx = RenderCtx::new(&model, &viewport, Frame::Viewport);
        let mut out = Vec::new();
        let e = XLine {
            common: common(),
            point: Point3::new(5.0, 20.0, 0.0),
            direction: Vec3::new(1.0, 0.0, 0.0),
            is_ray: false,
        };
        xline(&mut ctx, &mut out, &e).unwrap();
        assert!(out.is_empty());
    }
}
