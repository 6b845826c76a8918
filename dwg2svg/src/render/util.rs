// Copyright 2026 the dwg2svg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared formatting and lineweight helpers used by every entity emitter.

use std::io::{self, Write};

use peniko::kurbo::Point;

use crate::model::{lineweight_mm, DwgModel, LayerRef};

/// Format a coordinate the way every `d="..."`/attribute value in the
/// output does: six digits after the decimal point.
pub fn f(x: f64) -> String {
    format!("{x:.6}")
}

/// Write `"{x:.6},{y:.6}"`, the path-data point format.
pub fn write_xy(w: &mut impl Write, p: Point) -> io::Result<()> {
    write!(w, "{:.6},{:.6}", p.x, p.y)
}

/// `true` if every coordinate of `p` is finite.
pub fn point_finite(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Resolve an entity's own lineweight code against its layer, to a stroke
/// width in CSS pixels.
///
/// `-1` (ByLayer) defers to the layer's own lineweight; anything `<= 0`
/// thereafter (default/ByBlock/negative) becomes the minimum stroke, `0.1px`;
/// otherwise the decoded millimeter value is used directly as the pixel
/// width, floored at `0.1`.
pub fn lineweight_px(model: &DwgModel, lineweight: i16, layer: Option<LayerRef>) -> f64 {
    let resolved = if lineweight == -1 {
        layer
            .and_then(|r| model.layer(r))
            .map_or(-1, |l| l.lineweight)
    } else {
        lineweight
    };
    if resolved <= 0 {
        0.1
    } else {
        lineweight_mm(resolved).max(0.1)
    }
}

/// The common `style="fill:none;stroke:<color>;stroke-width:<lw>px"` value
/// shared by every stroke-only emitter (LINE, ARC, CIRCLE outline, ...).
pub fn stroke_style(color: &str, lineweight_px: f64) -> String {
    format!("fill:none;stroke:{color};stroke-width:{lineweight_px:.2}px")
}

/// Escape a string for inclusion as SVG element text content / attribute
/// value (the five XML predefined entities).
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColorSpec;

    #[test]
    fn negative_lineweight_is_point_one() {
        let model = DwgModel::default();
        assert_eq!(lineweight_px(&model, -3, None), 0.1);
    }

    #[test]
    fn bylayer_defers_to_layer() {
        let mut model = DwgModel::default();
        model.layers.push(crate::model::Layer {
            name: "0".into(),
            off: false,
            frozen: false,
            color: ColorSpec::BY_LAYER,
            lineweight: 25,
        });
        let px = lineweight_px(&model, -1, Some(LayerRef(0)));
        assert!((px - 0.25).abs() < 1e-9);
    }

    #[test]
    fn escapes_reserved_characters() {
        assert_eq!(escape_xml("<A & B>"), "&lt;A &amp; B&gt;");
    }
}
