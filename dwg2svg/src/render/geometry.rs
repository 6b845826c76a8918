// Copyright 2026 the dwg2svg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! LINE, POINT, CIRCLE, ARC, SOLID, 3DFACE, POLYLINE_2D, LWPOLYLINE emitters,
//! and the shared bulge→arc conversion used by polylines and HATCH.

use std::io::{self, Write};

use peniko::kurbo::Point;

use super::util::{point_finite, stroke_style, write_xy};
use super::RenderCtx;
use crate::color;
use crate::geom::ocs2_to_wcs;
use crate::model::{Arc, Circle, Ellipse, Face3d, Line, LwPolyline, PointEntity, Polyline2d, Solid};

/// Append the path-data command for one polyline/hatch segment from
/// already-projected `p1` (current pen position, implicit) to `p2`, applying
/// the bulge→arc conversion when `bulge != 0`.
pub(super) fn write_bulge_segment(w: &mut impl Write, p1: Point, p2: Point, bulge: f64) -> io::Result<()> {
    if bulge == 0.0 {
        write!(w, " L ")?;
        write_xy(w, p2)?;
        return Ok(());
    }
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let chord = dx.hypot(dy);
    let sagitta = bulge.abs() * chord / 2.0;
    let radius = if sagitta == 0.0 {
        0.0
    } else {
        (chord * chord / 4.0 + sagitta * sagitta) / (2.0 * sagitta)
    };
    let large_arc = i32::from(bulge.abs() > 1.0);
    let sweep = i32::from(bulge > 0.0);
    write!(w, " A {radius:.6},{radius:.6} 0 {large_arc},{sweep} ")?;
    write_xy(w, p2)
}

pub(super) fn line(ctx: &mut RenderCtx<'_>, w: &mut impl Write, e: &Line) -> io::Result<()> {
    let p1 = ocs2_to_wcs(e.extrusion, e.start.x, e.start.y).to_point();
    let p2 = ocs2_to_wcs(e.extrusion, e.end.x, e.end.y).to_point();
    if !point_finite(p1) || !point_finite(p2) {
        return Ok(());
    }
    let p1 = ctx.project(p1);
    let p2 = ctx.project(p2);
    let color = color::resolve_for_layer(ctx.model, &e.common.color, e.common.layer);
    let lw = super::util::lineweight_px(ctx.model, e.common.lineweight, e.common.layer);

    let index = ctx.next_index();
    write!(
        w,
        "<path id=\"dwg-object-{index}\" d=\"M "
    )?;
    write_xy(w, p1)?;
    write!(w, " L ")?;
    write_xy(w, p2)?;
    writeln!(w, "\" style=\"{}\" />", stroke_style(&color, lw))
}

pub(super) fn point(ctx: &mut RenderCtx<'_>, w: &mut impl Write, e: &PointEntity) -> io::Result<()> {
    let p = ocs2_to_wcs(e.extrusion, e.position.x, e.position.y).to_point();
    if !point_finite(p) {
        return Ok(());
    }
    let p = ctx.project(p);
    let color = color::resolve_for_layer(ctx.model, &e.common.color, e.common.layer);
    let lw = super::util::lineweight_px(ctx.model, e.common.lineweight, e.common.layer);
    let index = ctx.next_index();
    writeln!(
        w,
        "<circle id=\"dwg-object-{index}\" cx=\"{:.6}\" cy=\"{:.6}\" r=\"0.1\" style=\"{}\" />",
        p.x,
        p.y,
        stroke_style(&color, lw)
    )
}

pub(super) fn circle(ctx: &mut RenderCtx<'_>, w: &mut impl Write, e: &Circle) -> io::Result<()> {
    if !e.radius.is_finite() || e.radius <= 0.0 {
        return Ok(());
    }
    let center = ocs2_to_wcs(e.extrusion, e.center.x, e.center.y).to_point();
    if !point_finite(center) {
        return Ok(());
    }
    let center = ctx.project(center);
    let color = color::resolve_for_layer(ctx.model, &e.common.color, e.common.layer);
    let lw = super::util::lineweight_px(ctx.model, e.common.lineweight, e.common.layer);
    let index = ctx.next_index();
    writeln!(
        w,
        "<circle id=\"dwg-object-{index}\" cx=\"{:.6}\" cy=\"{:.6}\" r=\"{:.6}\" style=\"{}\" />",
        center.x,
        center.y,
        e.radius,
        stroke_style(&color, lw)
    )
}

pub(super) fn arc(ctx: &mut RenderCtx<'_>, w: &mut impl Write, e: &Arc) -> io::Result<()> {
    if !e.radius.is_finite()
        || e.radius <= 0.0
        || !e.start_angle.is_finite()
        || !e.end_angle.is_finite()
    {
        return Ok(());
    }
    let start = ocs2_to_wcs(
        e.extrusion,
        e.center.x + e.radius * e.start_angle.cos(),
        e.center.y + e.radius * e.start_angle.sin(),
    )
    .to_point();
    let end = ocs2_to_wcs(
        e.extrusion,
        e.center.x + e.radius * e.end_angle.cos(),
        e.center.y + e.radius * e.end_angle.sin(),
    )
    .to_point();
    if !point_finite(start) || !point_finite(end) {
        return Ok(());
    }
    let mut sweep = e.end_angle - e.start_angle;
    while sweep < 0.0 {
        sweep += std::f64::consts::TAU;
    }
    let large_arc = i32::from(sweep >= std::f64::consts::PI);

    let start = ctx.project(start);
    let end = ctx.project(end);
    let color = color::resolve_for_layer(ctx.model, &e.common.color, e.common.layer);
    let lw = super::util::lineweight_px(ctx.model, e.common.lineweight, e.common.layer);

    let index = ctx.next_index();
    write!(w, "<path id=\"dwg-object-{index}\" d=\"M ")?;
    write_xy(w, start)?;
    write!(w, " A {:.6},{:.6} 0 {large_arc},0 ", e.radius, e.radius)?;
    write_xy(w, end)?;
    writeln!(w, "\" style=\"{}\" />", stroke_style(&color, lw))
}

/// ELLIPSE: always a full `<ellipse>`, matching the source's known gap of
/// not carving out the `start_angle`/`end_angle` sub-arc (see DESIGN.md).
pub(super) fn ellipse(ctx: &mut RenderCtx<'_>, w: &mut impl Write, e: &Ellipse) -> io::Result<()> {
    let rx = e.sm_axis.length();
    if !rx.is_finite() || rx <= 0.0 || !e.axis_ratio.is_finite() {
        return Ok(());
    }
    let ry = rx * e.axis_ratio;
    let center = e.center.to_point();
    if !point_finite(center) {
        return Ok(());
    }
    // The viewport's Y-flip negates the visual rotation sense.
    let theta_deg = -e.sm_axis.y.atan2(e.sm_axis.x).to_degrees();
    let center = ctx.project(center);
    let color = color::resolve_for_layer(ctx.model, &e.common.color, e.common.layer);
    let lw = super::util::lineweight_px(ctx.model, e.common.lineweight, e.common.layer);
    let index = ctx.next_index();
    writeln!(
        w,
        "<ellipse id=\"dwg-object-{index}\" cx=\"{:.6}\" cy=\"{:.6}\" rx=\"{:.6}\" ry=\"{:.6}\" transform=\"rotate({:.6} {:.6} {:.6})\" style=\"{}\" />",
        center.x,
        center.y,
        rx,
        ry,
        theta_deg,
        center.x,
        center.y,
        stroke_style(&color, lw)
    )
}

/// Corner emission order for SOLID/3DFACE: DWG stores corners `1,2,3,4` with
/// `3`/`4` diagonal rather than sequential, so drawing order is `1,2,4,3`.
const CORNER_ORDER: [usize; 4] = [0, 1, 3, 2];

pub(super) fn solid(ctx: &mut RenderCtx<'_>, w: &mut impl Write, e: &Solid) -> io::Result<()> {
    let pts: Vec<Point> = CORNER_ORDER
        .iter()
        .map(|&i| {
            let c = e.corners[i];
            ocs2_to_wcs(e.extrusion, c.x, c.y).to_point()
        })
        .collect();
    if pts.iter().any(|p| !point_finite(*p)) {
        return Ok(());
    }
    let color = color::resolve_for_layer(ctx.model, &e.common.color, e.common.layer);
    let lw = super::util::lineweight_px(ctx.model, e.common.lineweight, e.common.layer);
    let index = ctx.next_index();
    write!(w, "<path id=\"dwg-object-{index}\" d=\"M ")?;
    for (i, p) in pts.iter().enumerate() {
        let p = ctx.project(*p);
        if i == 0 {
            write_xy(w, p)?;
        } else {
            write!(w, " L ")?;
            write_xy(w, p)?;
        }
    }
    writeln!(w, " Z\" style=\"{}\" />", stroke_style(&color, lw))
}

pub(super) fn face3d(ctx: &mut RenderCtx<'_>, w: &mut impl Write, e: &Face3d) -> io::Result<()> {
    let pts: Vec<Point> = CORNER_ORDER.iter().map(|&i| e.corners[i].to_point()).collect();
    if pts.iter().any(|p| !point_finite(*p)) {
        return Ok(());
    }
    // `CORNER_ORDER[k]` is storage corner for drawing-order position `k`; the
    // edge from drawing position `k` to `k+1` corresponds to storage edge
    // `CORNER_ORDER[k]` (DWG edge bit `i` joins storage corners `i`,`i+1`
    // cyclically in drawing order 1,2,4,3 — see model.rs's `Face3d` docs).
    let edge_invisible = |k: usize| e.invis_flags & (1 << CORNER_ORDER[k]) != 0;

    let color = color::resolve_for_layer(ctx.model, &e.common.color, e.common.layer);
    let lw = super::util::lineweight_px(ctx.model, e.common.lineweight, e.common.layer);
    let index = ctx.next_index();
    write!(w, "<path id=\"dwg-object-{index}\" d=\"M ")?;
    write_xy(w, ctx.project(pts[0]))?;
    for k in 0..4 {
        let next = ctx.project(pts[(k + 1) % 4]);
        if edge_invisible(k) {
            write!(w, " M ")?;
        } else {
            write!(w, " L ")?;
        }
        write_xy(w, next)?;
    }
    writeln!(w, "\" style=\"{}\" />", stroke_style(&color, lw))
}

pub(super) fn polyline2d(ctx: &mut RenderCtx<'_>, w: &mut impl Write, e: &Polyline2d) -> io::Result<()> {
    let color = color::resolve_for_layer(ctx.model, &e.common.color, e.common.layer);
    let lw = super::util::lineweight_px(ctx.model, e.common.lineweight, e.common.layer);
    let index = ctx.next_index();
    write!(w, "<path id=\"dwg-object-{index}\" d=\"")?;

    let mut started = false;
    for v in &e.vertices {
        if v.flags & 16 != 0 {
            continue;
        }
        let p = ocs2_to_wcs(e.extrusion, v.location.x, v.location.y).to_point();
        if !point_finite(p) {
            continue;
        }
        let p = ctx.project(p);
        if !started {
            write!(w, "M ")?;
            write_xy(w, p)?;
            started = true;
        } else {
            write!(w, " L ")?;
            write_xy(w, p)?;
        }
    }
    if started && e.closed {
        write!(w, " Z")?;
    }
    writeln!(w, "\" style=\"{}\" />", stroke_style(&color, lw))
}

pub(super) fn lwpolyline(ctx: &mut RenderCtx<'_>, w: &mut impl Write, e: &LwPolyline) -> io::Result<()> {
    let color = color::resolve_for_layer(ctx.model, &e.common.color, e.common.layer);
    let lw = super::util::lineweight_px(ctx.model, e.common.lineweight, e.common.layer);
    let index = ctx.next_index();
    write!(w, "<path id=\"dwg-object-{index}\" d=\"")?;

    let projected: Vec<(Point, f64)> = e
        .vertices
        .iter()
        .filter_map(|v| {
            let p = ocs2_to_wcs(e.extrusion, v.point.x, v.point.y).to_point();
            point_finite(p).then(|| (ctx.project(p), v.bulge))
        })
        .collect();

    if let Some(&(first, _)) = projected.first() {
        write!(w, "M ")?;
        write_xy(w, first)?;
        for pair in projected.windows(2) {
            let (p1, bulge) = pair[0];
            let (p2, _) = pair[1];
            write_bulge_segment(w, p1, p2, bulge)?;
        }
        if e.closed {
            if let (Some(&(last, bulge)), Some(&(first, _))) = (projected.last(), projected.first()) {
                write_bulge_segment(w, last, first, bulge)?;
            }
        }
    }
    writeln!(w, "\" style=\"{}\" />", stroke_style(&color, lw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Vec3;
    use crate::model::{ColorSpec, DwgModel, EntityCommon};
    use crate::transform::{Frame, Viewport};

    fn ctx(model: &DwgModel, vp: &Viewport) -> RenderCtx<'_> {
        RenderCtx::new(model, vp, Frame::Viewport)
    }

    fn common() -> EntityCommon {
        EntityCommon {
            layer: None,
            color: ColorSpec::BY_LAYER,
            lineweight: -1,
            invisible: false,
        }
    }

    #[test]
    fn line_emits_expected_path() {
        let model = DwgModel::default();
        let vp = Viewport {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 10.0,
            ymax: 10.0,
        };
        let mut c = ctx(&model, &vp);
        let mut out = Vec::new();
        let e = Line {
            common: common(),
            start: crate::geom::Point3::new(0.0, 0.0, 0.0),
            end: crate::geom::Point3::new(10.0, 10.0, 0.0),
            extrusion: Vec3::Z_AXIS,
        };
        line(&mut c, &mut out, &e).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("M 0.000000,10.000000 L 10.000000,0.000000"));
        assert!(s.contains("stroke-width:0.10px"));
    }

    #[test]
    fn zero_radius_circle_is_skipped() {
        let model = DwgModel::default();
        let vp = Viewport {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 10.0,
            ymax: 10.0,
        };
        let mut c = ctx(&model, &vp);
        let mut out = Vec::new();
        let e = Circle {
            common: common(),
            center: crate::geom::Point3::new(0.0, 0.0, 0.0),
            radius: 0.0,
            extrusion: Vec3::Z_AXIS,
        };
        circle(&mut c, &mut out, &e).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn bulge_arc_matches_formula() {
        let mut out = Vec::new();
        write_bulge_segment(&mut out, Point::new(0.0, 0.0), Point::new(2.0, 0.0), 1.0).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.starts_with(" A "));
        assert!(s.contains(" 1,1 "));
    }
}
