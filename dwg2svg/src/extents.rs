// Copyright 2026 the dwg2svg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The extents (bounding-box) collector.
//!
//! Mirrors the entity renderer's dispatch but only accumulates a conservative
//! axis-aligned bounding box; INSERT recursion is guarded by a visited-set so
//! a self-referencing or mutually-recursive block graph cannot blow the stack.

use std::collections::HashSet;

use peniko::kurbo::Point;

use crate::geom::{ocs2_to_wcs, Point3};
use crate::model::{BlockRef, DwgModel, Entity, HatchPath, HatchSegment};
use crate::transform::Viewport;

/// An accumulating, possibly-empty axis-aligned bounding box.
#[derive(Debug, Clone, Copy)]
pub struct Extents {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
    initialized: bool,
}

impl Default for Extents {
    fn default() -> Self {
        Self {
            xmin: f64::INFINITY,
            ymin: f64::INFINITY,
            xmax: f64::NEG_INFINITY,
            ymax: f64::NEG_INFINITY,
            initialized: false,
        }
    }
}

impl Extents {
    /// Add a single point, ignoring it if either coordinate is non-finite.
    pub fn add_point(&mut self, p: Point) {
        if !p.x.is_finite() || !p.y.is_finite() {
            return;
        }
        self.xmin = self.xmin.min(p.x);
        self.ymin = self.ymin.min(p.y);
        self.xmax = self.xmax.max(p.x);
        self.ymax = self.ymax.max(p.y);
        self.initialized = true;
    }

    /// Add a square centered at `center` with half-extent `radius` in both
    /// axes (the conservative bound used for circles, arcs, and ellipses).
    pub fn add_square(&mut self, center: Point, radius: f64) {
        if !radius.is_finite() || radius < 0.0 {
            return;
        }
        self.add_point(Point::new(center.x - radius, center.y - radius));
        self.add_point(Point::new(center.x + radius, center.y + radius));
    }

    /// Merge another [`Extents`] into this one.
    pub fn merge(&mut self, other: &Self) {
        if !other.initialized {
            return;
        }
        self.xmin = self.xmin.min(other.xmin);
        self.ymin = self.ymin.min(other.ymin);
        self.xmax = self.xmax.max(other.xmax);
        self.ymax = self.ymax.max(other.ymax);
        self.initialized = true;
    }

    /// Whether at least one finite point has been added.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The four AABB corners, `[min, (max.x, min.y), max, (min.x, max.y)]`.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.xmin, self.ymin),
            Point::new(self.xmax, self.ymin),
            Point::new(self.xmax, self.ymax),
            Point::new(self.xmin, self.ymax),
        ]
    }

    fn into_viewport(self) -> Option<Viewport> {
        self.initialized.then_some(Viewport {
            xmin: self.xmin,
            ymin: self.ymin,
            xmax: self.xmax,
            ymax: self.ymax,
        })
    }
}

/// Compute the viewport for rendering, following the fallback chain: paper
/// space (unless `mspace_only`), then model space, then the model's own
/// stored extents, then a default 100×100 box.
pub fn compute(model: &DwgModel, mspace_only: bool) -> Viewport {
    let mut e = Extents::default();

    if !mspace_only {
        if let Some(r) = model.paper_space() {
            let mut visited = HashSet::new();
            e.merge(&block_extents(model, r, &mut visited));
        }
    }
    if !e.is_initialized() {
        if let Some(r) = model.model_space() {
            let mut visited = HashSet::new();
            e.merge(&block_extents(model, r, &mut visited));
        }
    }
    if !e.is_initialized() {
        if let Some((lo, hi)) = model.stored_extents {
            e.add_point(lo.to_point());
            e.add_point(hi.to_point());
        }
    }

    e.into_viewport().unwrap_or(Viewport {
        xmin: 0.0,
        ymin: 0.0,
        xmax: 100.0,
        ymax: 100.0,
    })
}

/// Compute the (raw-coordinate) extents of a single block's owned entities.
pub fn block_extents(model: &DwgModel, block: BlockRef, visited: &mut HashSet<BlockRef>) -> Extents {
    let mut e = Extents::default();
    let Some(header) = model.block(block) else {
        return e;
    };
    for entity in &header.entities {
        if !entity.common().is_renderable(model) {
            continue;
        }
        e.merge(&entity_extents(model, entity, visited));
    }
    e
}

fn entity_extents(model: &DwgModel, entity: &Entity, visited: &mut HashSet<BlockRef>) -> Extents {
    let mut e = Extents::default();
    match entity {
        Entity::Line(line) => {
            e.add_point(ocs_pt(line.extrusion, line.start));
            e.add_point(ocs_pt(line.extrusion, line.end));
        }
        Entity::Point(p) => {
            e.add_point(ocs_pt(p.extrusion, p.position));
        }
        Entity::Solid(s) => {
            for c in s.corners {
                e.add_point(ocs2(s.extrusion, c.x, c.y));
            }
        }
        Entity::Face3d(f) => {
            for c in f.corners {
                e.add_point(c.to_point());
            }
        }
        Entity::Polyline2d(pl) => {
            for v in &pl.vertices {
                if v.flags & 16 != 0 {
                    continue;
                }
                e.add_point(ocs2(pl.extrusion, v.location.x, v.location.y));
            }
        }
        Entity::LwPolyline(pl) => {
            for v in &pl.vertices {
                e.add_point(ocs2(pl.extrusion, v.point.x, v.point.y));
            }
        }
        Entity::Circle(c) => {
            let center = ocs_pt(c.extrusion, c.center);
            e.add_square(center, c.radius);
        }
        Entity::Arc(a) => {
            let center = ocs_pt(a.extrusion, a.center);
            e.add_square(center, a.radius);
        }
        Entity::Ellipse(el) => {
            let rx = el.sm_axis.length();
            let ry = rx * el.axis_ratio;
            e.add_square(el.center.to_point(), rx.max(ry));
        }
        Entity::Text(t) => {
            text_extents(&mut e, t.body.insertion, t.body.height);
        }
        Entity::Attdef(a) => {
            text_extents(&mut e, a.body.insertion, a.body.height);
        }
        Entity::Hatch(h) => {
            for path in &h.paths {
                hatch_path_extents(&mut e, path);
            }
        }
        Entity::Image(img) => {
            let (w, h) = img.image_size;
            let p0 = img.pt0;
            let u = img.uvec;
            let v = img.vvec;
            let corner = |du: f64, dv: f64| Point3 {
                x: p0.x + u.x * du + v.x * dv,
                y: p0.y + u.y * du + v.y * dv,
                z: p0.z + u.z * du + v.z * dv,
            };
            e.add_point(corner(0.0, 0.0).to_point());
            e.add_point(corner(w, 0.0).to_point());
            e.add_point(corner(w, h).to_point());
            e.add_point(corner(0.0, h).to_point());
        }
        Entity::XLine(_) => {
            // Unbounded/semi-bounded; cannot contribute to the box that
            // determines its own clip region.
        }
        Entity::Insert(ins) => {
            insert_extents(&mut e, model, ins, visited);
        }
    }
    e
}

fn ocs_pt(extrusion: crate::geom::Vec3, p: Point3) -> Point {
    ocs2_to_wcs(extrusion, p.x, p.y).to_point()
}

fn ocs2(extrusion: crate::geom::Vec3, x: f64, y: f64) -> Point {
    ocs2_to_wcs(extrusion, x, y).to_point()
}

fn text_extents(e: &mut Extents, insertion: Point, height: f64) {
    e.add_point(insertion);
    if height.is_finite() {
        e.add_point(Point::new(insertion.x + 5.0 * height, insertion.y + height));
    }
}

fn hatch_path_extents(e: &mut Extents, path: &HatchPath) {
    match path {
        HatchPath::Polyline(p) => {
            for pt in &p.points {
                e.add_point(*pt);
            }
        }
        HatchPath::Segments(segs) => {
            for seg in segs {
                match seg {
                    HatchSegment::Line { start, end } => {
                        e.add_point(*start);
                        e.add_point(*end);
                    }
                    HatchSegment::CircularArc { center, radius, .. } => {
                        e.add_square(*center, *radius);
                    }
                    HatchSegment::EllipticalArc {
                        center,
                        endpoint,
                        minor_major_ratio,
                        ..
                    } => {
                        let rx = endpoint.hypot();
                        let ry = rx * minor_major_ratio;
                        e.add_square(*center, rx.max(ry));
                    }
                    HatchSegment::Spline {
                        control_points,
                        fit_points,
                    } => {
                        let pts = if control_points.is_empty() {
                            fit_points
                        } else {
                            control_points
                        };
                        for pt in pts {
                            e.add_point(*pt);
                        }
                    }
                }
            }
        }
    }
}

fn insert_extents(e: &mut Extents, model: &DwgModel, ins: &crate::model::Insert, visited: &mut HashSet<BlockRef>) {
    let Some(block_ref) = ins.block else {
        return;
    };
    if !visited.insert(block_ref) {
        return;
    }
    let Some(header) = model.block(block_ref) else {
        visited.remove(&block_ref);
        return;
    };
    let inner = block_extents(model, block_ref, visited);
    visited.remove(&block_ref);
    if !inner.is_initialized() {
        return;
    }

    let insertion = ocs2_to_wcs(ins.extrusion, ins.ins_pt.x, ins.ins_pt.y).to_point();
    let base = header.base_pt;
    let (sin_r, cos_r) = ins.rotation.sin_cos();
    for c in inner.corners() {
        let (dx, dy) = (c.x - base.x, c.y - base.y);
        let (sx, sy) = (dx * ins.scale.x, dy * ins.scale.y);
        let rx = sx * cos_r - sy * sin_r;
        let ry = sx * sin_r + sy * cos_r;
        e.add_point(Point::new(insertion.x + rx, insertion.y + ry));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockHeader, ColorSpec, DwgModel, EntityCommon, Line};

    fn line(start: (f64, f64), end: (f64, f64)) -> Entity {
        Entity::Line(Line {
            common: EntityCommon {
                layer: None,
                color: ColorSpec::BY_LAYER,
                lineweight: -1,
                invisible: false,
            },
            start: Point3::new(start.0, start.1, 0.0),
            end: Point3::new(end.0, end.1, 0.0),
            extrusion: crate::geom::Vec3::Z_AXIS,
        })
    }

    #[test]
    fn empty_model_falls_back_to_default() {
        let model = DwgModel::default();
        let vp = compute(&model, false);
        assert_eq!(vp.page_width(), 100.0);
        assert_eq!(vp.page_height(), 100.0);
    }

    #[test]
    fn model_space_line_sets_extents() {
        let mut model = DwgModel::default();
        model.blocks.push(BlockHeader {
            name: "*Model_Space".to_owned(),
            entities: vec![line((0.0, 0.0), (10.0, 10.0))],
            ..Default::default()
        });
        model.model_space = Some(BlockRef(0));
        let vp = compute(&model, true);
        assert_eq!((vp.xmin, vp.ymin, vp.xmax, vp.ymax), (0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn self_referencing_insert_does_not_recurse_forever() {
        let mut model = DwgModel::default();
        model.blocks.push(BlockHeader {
            name: "SELF".to_owned(),
            entities: vec![],
            ..Default::default()
        });
        let insert = crate::model::Insert {
            common: EntityCommon::default(),
            ins_pt: Point::new(0.0, 0.0),
            scale: crate::geom::Vec3::new(1.0, 1.0, 1.0),
            rotation: 0.0,
            extrusion: crate::geom::Vec3::Z_AXIS,
            block: Some(BlockRef(0)),
        };
        model.blocks[0].entities.push(Entity::Insert(insert));
        model.model_space = Some(BlockRef(0));
        // Must return rather than overflow the stack.
        let _ = compute(&model, true);
    }
}
