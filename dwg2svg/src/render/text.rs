// Copyright 2026 the dwg2svg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! TEXT / ATTDEF emitters.

use std::io::{self, Write};

use peniko::kurbo::Point;

use super::util::{escape_xml, point_finite};
use super::RenderCtx;
use crate::font;
use crate::geom::ocs2_to_wcs;
use crate::model::{Attdef, HAlign, Text, TextBody, VAlign};

fn halign_anchor(h: HAlign) -> &'static str {
    match h {
        1 | 4 => "middle",
        2 => "end",
        _ => "start",
    }
}

fn valign_baseline(v: VAlign) -> &'static str {
    match v {
        1 => "text-after-edge",
        2 => "central",
        3 => "text-before-edge",
        _ => "auto",
    }
}

/// Shared TEXT/ATTDEF emission; `rotation` is `0` for TEXT (the body's own
/// `rotation` field is only honored for ATTDEF).
fn write_body(ctx: &mut RenderCtx<'_>, w: &mut impl Write, body: &TextBody, rotation: f64) -> io::Result<()> {
    if !body.height.is_finite() || body.height <= 0.0 || !rotation.is_finite() {
        return Ok(());
    }
    let use_alignment_point = body.halign != 0 || body.valign != 0;
    let raw = if use_alignment_point {
        body.alignment_point.unwrap_or(body.insertion)
    } else {
        body.insertion
    };
    let p = ocs2_to_wcs(body.extrusion, raw.x, raw.y).to_point();
    if !point_finite(p) {
        return Ok(());
    }
    let p = ctx.project(p);

    let style = body.style.and_then(|r| ctx.model.style(r));
    let font_file = style.map_or("", |s| s.font_file.as_str());
    let resolved = font::resolve(font_file);
    let font_size = resolved.font_size(body.height);

    let width_factor = body
        .width_factor
        .or_else(|| style.map(|s| s.width_factor))
        .unwrap_or(1.0);
    if !width_factor.is_finite() || width_factor == 0.0 {
        return Ok(());
    }

    let x = if width_factor != 1.0 { p.x / width_factor } else { p.x };

    let mut transform = String::new();
    if rotation != 0.0 {
        let theta_deg = -rotation.to_degrees();
        transform.push_str(&format!("rotate({theta_deg:.6} {x:.6} {:.6})", p.y));
    }
    if width_factor != 1.0 {
        if !transform.is_empty() {
            transform.push(' ');
        }
        transform.push_str(&format!("scale({width_factor:.6},1)"));
    }

    let index = ctx.next_index();
    write!(
        w,
        "<text id=\"dwg-object-{index}\" x=\"{x:.6}\" y=\"{:.6}\" font-family=\"{}\" font-size=\"{font_size:.6}\" text-anchor=\"{}\" dominant-baseline=\"{}\"",
        p.y,
        resolved.family,
        halign_anchor(body.halign),
        valign_baseline(body.valign),
    )?;
    if !transform.is_empty() {
        write!(w, " transform=\"{transform}\"")?;
    }
    writeln!(w, ">{}</text>", escape_xml(&body.value))
}

pub(super) fn text(ctx: &mut RenderCtx<'_>, w: &mut impl Write, e: &Text) -> io::Result<()> {
    write_body(ctx, w, &e.body, 0.0)
}

pub(super) fn attdef(ctx: &mut RenderCtx<'_>, w: &mut impl Write, e: &Attdef) -> io::Result<()> {
    write_body(ctx, w, &e.body, e.body.rotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColorSpec, DwgModel, EntityCommon, Style, StyleRef};
    use crate::transform::{Frame, Viewport};

    fn common() -> EntityCommon {
        EntityCommon {
            layer: None,
            color: ColorSpec::BY_LAYER,
            lineweight: -1,
            invisible: false,
        }
    }

    fn body(insertion: Point, height: f64, halign: HAlign) -> TextBody {
        TextBody {
            insertion,
            alignment_point: None,
            height,
            width_factor: None,
            rotation: 0.0,
            halign,
            valign: 0,
            style: Some(StyleRef(0)),
            extrusion: crate::geom::Vec3::Z_AXIS,
            value: "HELLO".to_owned(),
        }
    }

    #[test]
    fn arial_text_matches_expected_font_size() {
        let mut model = DwgModel::default();
        model.styles.push(Style {
            name: "STANDARD".to_owned(),
            font_file: "arial.ttf".to_owned(),
            width_factor: 1.0,
        });
        let vp = Viewport {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 10.0,
            ymax: 10.0,
        };
        let mut ctx = RenderCtx::new(&model, &vp, Frame::Viewport);
        let mut out = Vec::new();
        let e = Text {
            common: common(),
            body: body(Point::new(0.0, 0.0), 2.5, 1),
        };
        text(&mut ctx, &mut out, &e).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("font-family=\"Arial\""));
        assert!(s.contains("font-size=\"3.491620\""));
        assert!(s.contains("text-anchor=\"middle\""));
        assert!(s.contains(">HELLO</text>"));
    }

    #[test]
    fn zero_height_is_skipped() {
        let model = DwgModel::default();
        let vp = Viewport {
            xmin: 0.0,
            ymin: 0.0,
            xmax: 10.0,
            ymax: 10.0,
        };
        let mut ctx = RenderCtx::new(&model, &vp, Frame::Viewport);
        let mut out = Vec::new();
        let e = Text {
            common: common(),
            body: body(Point::new(0.0, 0.0), 0.0, 0),
        };
        text(&mut ctx, &mut out, &e).unwrap();
        assert!(out.is_empty());
    }
}
