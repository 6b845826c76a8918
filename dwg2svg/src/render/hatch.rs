// Copyright 2026 the dwg2svg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! HATCH emitter.
//!
//! HATCH boundary points are already WCS (the adapter resolves them at load
//! time rather than carrying a per-entity extrusion), so unlike every other
//! geometry emitter this one does not call [`crate::geom::ocs2_to_wcs`].

use std::io::{self, Write};

use peniko::kurbo::Point;

use super::geometry::write_bulge_segment;
use super::util::{point_finite, stroke_style, write_xy};
use super::RenderCtx;
use crate::color;
use crate::model::{Hatch, HatchPath, HatchPolylinePath, HatchSegment};

fn write_polyline_path(ctx: &mut RenderCtx<'_>, w: &mut impl Write, p: &HatchPolylinePath) -> io::Result<()> {
    let projected: Vec<Point> = p
        .points
        .iter()
        .filter_map(|&pt| point_finite(pt).then(|| ctx.project(pt)))
        .collect();
    let Some(&first) = projected.first() else {
        return Ok(());
    };
    write!(w, "M ")?;
    write_xy(w, first)?;
    let bulges = &p.bulges;
    for (i, pair) in projected.windows(2).enumerate() {
        let bulge = bulges.get(i).copied().unwrap_or(0.0);
        write_bulge_segment(w, pair[0], pair[1], bulge)?;
    }
    if p.closed {
        let bulge = bulges.get(projected.len() - 1).copied().unwrap_or(0.0);
        if bulge == 0.0 {
            write!(w, " Z")?;
        } else if let (Some(&last), Some(&first)) = (projected.last(), projected.first()) {
            write_bulge_segment(w, last, first, bulge)?;
        }
    }
    Ok(())
}

/// Emit endpoints-and-sweep for a circular/elliptical arc segment. `rx`/`ry`
/// are the ellipse radii (equal for a circular arc), `rotation_deg` the
/// `x-axis-rotation` parameter.
#[allow(clippy::too_many_arguments)]
fn write_arc_endpoints(
    ctx: &mut RenderCtx<'_>,
    w: &mut impl Write,
    center: Point,
    rx: f64,
    ry: f64,
    rotation_deg: f64,
    start_angle: f64,
    end_angle: f64,
    is_ccw: bool,
    first: &mut bool,
) -> io::Result<()> {
    if !point_finite(center) || !rx.is_finite() || rx <= 0.0 || !ry.is_finite() || ry <= 0.0 {
        return Ok(());
    }
    let raw_start = Point::new(center.x + rx * start_angle.cos(), center.y + ry * start_angle.sin());
    let raw_end = Point::new(center.x + rx * end_angle.cos(), center.y + ry * end_angle.sin());
    if !point_finite(raw_start) || !point_finite(raw_end) {
        return Ok(());
    }
    let start = ctx.project(raw_start);
    let end = ctx.project(raw_end);
    let large_arc = i32::from((end_angle - start_angle).abs() > std::f64::consts::PI);
    let sweep = i32::from(is_ccw);
    if *first {
        write!(w, "M ")?;
        write_xy(w, start)?;
        *first = false;
    } else {
        write!(w, " L ")?;
        write_xy(w, start)?;
    }
    write!(w, " A {rx:.6},{ry:.6} {rotation_deg:.6} {large_arc},{sweep} ")?;
    write_xy(w, end)
}

fn write_segments(ctx: &mut RenderCtx<'_>, w: &mut impl Write, segments: &[HatchSegment]) -> io::Result<()> {
    let mut first = true;
    for seg in segments {
        match seg {
            HatchSegment::Line { start, end } => {
                if !point_finite(*start) || !point_finite(*end) {
                    continue;
                }
                let start = ctx.project(*start);
                let end = ctx.project(*end);
                if first {
                    write!(w, "M ")?;
                    write_xy(w, start)?;
                    first = false;
                } else {
                    write!(w, " L ")?;
                    write_xy(w, start)?;
                }
                write!(w, " L ")?;
                write_xy(w, end)?;
            }
            HatchSegment::CircularArc {
                center,
                radius,
                start_angle,
                end_angle,
                is_ccw,
            } => {
                write_arc_endpoints(
                    ctx, w, *center, *radius, *radius, 0.0, *start_angle, *end_angle, *is_ccw, &mut first,
                )?;
            }
            HatchSegment::EllipticalArc {
                center,
                endpoint,
                minor_major_ratio,
                start_angle,
                end_angle,
                is_ccw,
            } => {
                let rx = endpoint.hypot();
                let ry = rx * minor_major_ratio;
                let rotation_deg = endpoint.y.atan2(endpoint.x).to_degrees();
                write_arc_endpoints(
                    ctx, w, *center, rx, ry, rotation_deg, *start_angle, *end_angle, *is_ccw, &mut first,
                )?;
            }
            HatchSegment::Spline {
                control_points,
                fit_points,
            } => {
                let points = if control_points.is_empty() { fit_points } else { control_points };
                for &p in points {
                    if !point_finite(p) {
                        continue;
                    }
                    let p = ctx.project(p);
                    if first {
                        write!(w, "M ")?;
                        write_xy(w, p)?;
                        first = false;
                    } else {
                        write!(w, " L ")?;
                        write_xy(w, p)?;
                    }
                }
            }
        }
    }
    if !first {
        write!(w, " Z")?;
    }
    Ok(())
}

pub(super) fn hatch(ctx: &mut RenderCtx<'_>, w: &mut impl Write, e: &Hatch) -> io::Result<()> {
    let color = color::resolve_for_layer(ctx.model, &e.common.color, e.common.layer);
    let lw = super::util::lineweight_px(ctx.model, e.common.lineweight, e.common.layer);

    if e.solid_fill {
        let index = ctx.next_index();
        write!(w, "<path id=\"dwg-object-{index}\" d=\"")?;
        for path in &e.paths {
            match path {
                HatchPath::Polyline(p) => write_polyline_path(ctx, w, p)?,
                HatchPath::Segments(segs) => write_segments(ctx, w, segs)?,
            }
            write!(w, " ")?;
        }
        writeln!(w, "\" style=\"fill:{color};stroke:none;fill-rule:evenodd\" />")
    } else {
        for path in &e.paths {
            let index = ctx.next_index();
            write!(w, "<path id=\"dwg-object-{index}\" d=\"")?;
            match path {
                HatchPath::Polyline(p) => write_polyline_path(ctx, w, p)?,
                HatchPath::Segments(segs) => write_segments(ctx, w, segs)?,
            }
            writeln!(w, "\" style=\"{}\" />", stroke_style(&color, lw))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn solid_fill_polyline_hatch_emits_single_path() {
        let model = DwgModel::default();
        let viewport = vp();
        let mut ctx = RenderCtx::new(&model, &viewport, Frame::Viewport);
        let mut out = Vec::new();
        let e = Hatch {
            common: common(),
            paths: vec![HatchPath::Polyline(HatchPolylinePath {
                points: vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(5.0, 5.0)],
                bulges: vec![0.0, 0.0, 0.0],
                closed: true,
            })],
            solid_fill: true,
        };
        hatch(&mut ctx, &mut out, &e).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert_eq!(s.matches("<path").count(), 1);
        assert!(s.contains("fill-rule:evenodd"));
    }

    #[test]
    fn non_solid_hatch_emits_one_path_per_boundary() {
        let model = DwgModel::default();
        let viewport = vp();
        let mut ctx = RenderCtx::new(&model, &viewport, Frame::Viewport);
        let mut out = Vec::new();
        let e = Hatch {
            common: common(),
            paths: vec![
                HatchPath::Segments(vec![HatchSegment::Line {
                    start: Point::new(0.0, 0.0),
                    end: Point::new(1.0, 0.0),
                }]),
                HatchPath::Segments(vec![HatchSegment::Line {
                    start: Point::new(2.0, 2.0),
                    end: Point::new(3.0, 2.0),
                }]),
            ],
            solid_fill: false,
        };
        hatch(&mut ctx, &mut out, &e).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert_eq!(s.matches("<path").count(), 2);
        assert!(s.contains("fill:none"));
    }
}
