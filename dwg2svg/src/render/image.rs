// Copyright 2026 the dwg2svg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! IMAGE emitter.

use std::io::{self, Write};

use super::util::point_finite;
use super::RenderCtx;
use crate::model::Image;

pub(super) fn image(ctx: &mut RenderCtx<'_>, w: &mut impl Write, e: &Image) -> io::Result<()> {
    if !e.pt0.is_finite() || !e.uvec.is_finite() || !e.vvec.is_finite() {
        return Ok(());
    }
    let (width, height) = e.image_size;
    if !width.is_finite() || width <= 0.0 || !height.is_finite() || height <= 0.0 {
        return Ok(());
    }
    let Some(imagedef) = e.imagedef.and_then(|r| ctx.model.imagedef(r)) else {
        return writeln!(w, "<!-- WRONG IMAGE(missing imagedef) -->");
    };

    // `pt0` is the lower-left corner; SVG `<image>` is positioned from the
    // upper-left, so shift by the full-height `vvec`.
    let upper_left = crate::geom::Point3::new(
        e.pt0.x + e.vvec.x * height,
        e.pt0.y + e.vvec.y * height,
        e.pt0.z + e.vvec.z * height,
    )
    .to_point();
    if !point_finite(upper_left) {
        return Ok(());
    }
    let p = ctx.project(upper_left);

    let index = ctx.next_index();
    writeln!(
        w,
        "<image id=\"dwg-object-{index}\" width=\"{width:.6}\" height=\"{height:.6}\" \
         transform=\"matrix({:.6} {:.6} {:.6} {:.6} {:.6} {:.6})\" preserveAspectRatio=\"none\" href=\"{}\" />",
        e.uvec.x,
        -e.uvec.y,
        -e.vvec.x,
        e.vvec.y,
        p.x,
        p.y,
        imagedef.file_path,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Point3, Vec3};
    use crate::model::{ColorSpec, DwgModel, EntityCommon, ImageDef, ImageDefRef};
    use crate::transform::{Frame, Viewport};

    fn common() -> EntityCommon {
        EntityCommon {
            layer: None,
            color: ColorSpec::BY_LAYER,
            lineweight: -1,
            invisible: false,
        }
    }

    #[test]
    fn well_formed_image_emits_transform_and_href() {
        let mut model = DwgModel::default();
        model.imagedefs.push(ImageDef {
            file_path: "raster.png".to_owned(),
        });
        let vp = Viewport {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 10.0,
            ymax: 10.0,
        };
        let mut ctx = RenderCtx::new(&model, &vp, Frame::Viewport);
        let mut out = Vec::new();
        let e = Image {
            common: common(),
            pt0: Point3::new(0.0, 0.0, 0.0),
            uvec: Vec3::new(1.0, 0.0, 0.0),
            vvec: Vec3::new(0.0, 1.0, 0.0),
            image_size: (100.0, 50.0),
            imagedef: Some(ImageDefRef(0)),
        };
        image(&mut ctx, &mut out, &e).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("href=\"raster.png\""));
        assert!(s.contains("preserveAspectRatio=\"none\""));
        assert!(s.contains("width=\"100.000000\" height=\"50.000000\""));
    }

    #[test]
    fn missing_imagedef_emits_comment() {
        let model = DwgModel::default();
        let vp = Viewport {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 10.0,
            ymax: 10.0,
        };
        let mut ctx = RenderCtx::new(&model, &vp, Frame::Viewport);
        let mut out = Vec::new();
        let e = Image {
            common: common(),
            pt0: Point3::new(0.0, 0.0, 0.0),
            uvec: Vec3::new(1.0, 0.0, 0.0),
            vvec: Vec3::new(0.0, 1.0, 0.0),
            image_size: (100.0, 50.0),
            imagedef: None,
        };
        image(&mut ctx, &mut out, &e).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.starts_with("<!-- WRONG IMAGE"));
    }
}
