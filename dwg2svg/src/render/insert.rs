// Copyright 2026 the dwg2svg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! INSERT emitter: a `<use>` referencing the block's `<defs>` symbol.
//!
//! The transform is computed by composing the insert's own local affine
//! (`S · (p − B) rotated by R + I`) with the *outer*
//! transform of the current emission [`Frame`]: the viewport flip/translate
//! when emitting directly into paper/model space, or the identity when this
//! INSERT itself sits inside another block definition (`Frame::Raw`). Since
//! any block's `<defs>` content receives its single, ultimate Y-flip from
//! whichever top-level `<use>` eventually references it — no matter how
//! deeply nested — composing against the *current* frame's outer transform
//! rather than always assuming the viewport gives the correct, un-doubled
//! result for block-within-block instancing.

use std::io::{self, Write};

use peniko::kurbo::Affine;

use super::util::point_finite;
use super::RenderCtx;
use crate::geom::ocs2_to_wcs;
use crate::model::Insert;
use crate::transform::Frame;

/// Angles smaller than this are treated as `R ≈ 0`.
const ROTATION_EPSILON: f64 = 1e-9;

pub(super) fn insert(ctx: &mut RenderCtx<'_>, w: &mut impl Write, e: &Insert) -> io::Result<()> {
    let Some(block_ref) = e.block else {
        return writeln!(w, "<!-- WRONG INSERT(unresolved block reference) -->");
    };
    let Some(header) = ctx.model.block(block_ref) else {
        return writeln!(w, "<!-- WRONG INSERT(missing block header) -->");
    };
    if !e.rotation.is_finite() || !e.scale.x.is_finite() || !e.scale.y.is_finite() {
        return Ok(());
    }
    let insertion = ocs2_to_wcs(e.extrusion, e.ins_pt.x, e.ins_pt.y).to_point();
    if !point_finite(insertion) {
        return Ok(());
    }
    let base = header.base_pt.to_point();
    if !point_finite(base) {
        return Ok(());
    }

    let insert_affine = Affine::translate(insertion.to_vec2())
        * Affine::rotate(e.rotation)
        * Affine::scale_non_uniform(e.scale.x, e.scale.y)
        * Affine::translate(-base.to_vec2());

    let outer = match ctx.frame {
        Frame::Viewport => ctx.viewport.affine(),
        Frame::Raw => Affine::IDENTITY,
    };
    let composed = outer * insert_affine;
    let [a, b, c, d, tx, ty] = composed.as_coeffs();

    let index = ctx.next_index();
    if e.rotation.abs() < ROTATION_EPSILON {
        writeln!(
            w,
            "<use id=\"dwg-object-{index}\" transform=\"matrix({a:.6} {b:.6} {c:.6} {d:.6} {tx:.6} {ty:.6})\" xlink:href=\"#symbol-{}\" />",
            header.absolute_ref
        )
    } else {
        let flipped = matches!(ctx.frame, Frame::Viewport);
        let theta_deg = if flipped { -e.rotation.to_degrees() } else { e.rotation.to_degrees() };
        let sy = if flipped { -e.scale.y } else { e.scale.y };
        writeln!(
            w,
            "<use id=\"dwg-object-{index}\" transform=\"translate({tx:.6} {ty:.6}) rotate({theta_deg:.6}) scale({:.6} {sy:.6})\" xlink:href=\"#symbol-{}\" />",
            e.scale.x,
            header.absolute_ref
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Point3, Vec3};
    use crate::model::{BlockHeader, ColorSpec, DwgModel, EntityCommon};
    use crate::transform::Viewport;
    use peniko::kurbo::Point;

    fn common() -> EntityCommon {
        EntityCommon {
            layer: None,
            color: ColorSpec::BY_LAYER,
            lineweight: -1,
            invisible: false,
        }
    }

    #[test]
    fn zero_rotation_emits_matrix_matching_literal_example() {
        let mut model = DwgModel::default();
        model.blocks.push(BlockHeader {
            name: "MY_BLOCK".to_owned(),
            base_pt: Point3::new(0.0, 0.0, 0.0),
            absolute_ref: 0x1234,
            entities: vec![],
        });
        let vp = Viewport {
            xmin: -1.0,
            ymin: 0.0,
            xmax: 9.0,
            ymax: 10.0,
        };
        let mut ctx = RenderCtx::new(&model, &vp, crate::transform::Frame::Viewport);
        let mut out = Vec::new();
        let e = Insert {
            common: common(),
            ins_pt: Point::new(10.0, 10.0),
            scale: Vec3::new(2.0, 2.0, 2.0),
            rotation: 0.0,
            extrusion: Vec3::Z_AXIS,
            block: Some(crate::model::BlockRef(0)),
        };
        insert(&mut ctx, &mut out, &e).unwrap();
        let s = String::from_utf8(out).unwrap();
        // tx = 10 - 2*0 - (-1) = 11, ty = page_height(10) - 10 + 2*0 + 0 = 0
        assert!(s.contains("matrix(2.000000 0.000000 0.000000 -2.000000 11.000000 0.000000)"));
        assert!(s.contains("#symbol-4660"));
    }

    #[test]
    fn missing_block_emits_comment() {
        let model = DwgModel::default();
        let vp = Viewport {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 10.0,
            ymax: 10.0,
        };
        let mut ctx = RenderCtx::new(&model, &vp, crate::transform::Frame::Viewport);
        let mut out = Vec::new();
        let e = Insert {
            common: common(),
            ins_pt: Point::new(0.0, 0.0),
            scale: Vec3::new(1.0, 1.0, 1.0),
            rotation: 0.0,
            extrusion: Vec3::Z_AXIS,
            block: None,
        };
        insert(&mut ctx, &mut out, &e).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.starts_with("<!-- WRONG INSERT"));
    }
}
