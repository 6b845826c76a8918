// Copyright 2026 the dwg2svg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DWG color specifier → SVG color string resolution.

use crate::aci_palette::ACI_PALETTE;
use crate::model::{ColorSpec, DwgModel, Layer};

/// The seven canonical ACI names, 1-indexed (`ACI_NAMES[0]` is index 1).
const ACI_NAMES: [&str; 7] = ["red", "yellow", "green", "cyan", "blue", "magenta", "white"];

/// Resolve a color specifier to an SVG color string.
///
/// `layer` is the entity's owning layer, consulted for `ByLayer` resolution;
/// pass `None` when the entity has no resolvable layer (resolves to `black`,
/// same as an unresolvable `ByBlock`).
pub fn resolve(color: &ColorSpec, layer: Option<&Layer>) -> String {
    // ByLayer: defer to the layer's own color.
    if color.index == 256 {
        // A color flagged 256 with the 0xC3 top byte actually encodes an ACI
        // index in its low byte (a quirk some writers use instead of setting
        // `index` directly).
        if (color.rgb >> 24) & 0xff == 0xc3 {
            return resolve_aci(i32::from((color.rgb & 0xff) as u8));
        }
        return match layer {
            Some(layer) => resolve(&layer.color, None),
            None => "black".to_owned(),
        };
    }

    // True RGB: bit 0x80 set, bit 0x40 (color-name) clear.
    if color.flag & 0x80 != 0 && color.flag & 0x40 == 0 {
        return format_rgb(color.rgb & 0x00ff_ffff);
    }

    resolve_aci(color.index)
}

fn resolve_aci(index: i32) -> String {
    match index {
        1..=7 => ACI_NAMES[(index - 1) as usize].to_owned(),
        8..=255 => format_rgb(ACI_PALETTE[index as usize]),
        _ => "black".to_owned(),
    }
}

fn format_rgb(rgb: u32) -> String {
    format!("#{rgb:06x}")
}

/// Resolve the color of an entity given the model it lives in.
pub fn resolve_for_layer(model: &DwgModel, color: &ColorSpec, layer: Option<crate::model::LayerRef>) -> String {
    resolve(color, layer.and_then(|r| model.layer(r)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_aci_colors() {
        assert_eq!(resolve_aci(1), "red");
        assert_eq!(resolve_aci(7), "white");
    }

    #[test]
    fn indexed_aci_uses_palette() {
        let rgb = ACI_PALETTE[8];
        assert_eq!(resolve_aci(8), format_rgb(rgb));
    }

    #[test]
    fn true_rgb_bit_set() {
        let c = ColorSpec {
            index: 0,
            rgb: 0x00ff_8040,
            flag: 0x80,
        };
        assert_eq!(resolve(&c, None), "#ff8040");
    }

    #[test]
    fn byblock_default_is_black() {
        let c = ColorSpec::BY_BLOCK;
        assert_eq!(resolve(&c, None), "black");
    }

    #[test]
    fn bylayer_resolves_through_layer() {
        let layer = Layer {
            name: "0".to_owned(),
            off: false,
            frozen: false,
            color: ColorSpec {
                index: 3,
                rgb: 0,
                flag: 0,
            },
            lineweight: -1,
        };
        assert_eq!(resolve(&ColorSpec::BY_LAYER, Some(&layer)), "green");
    }

    #[test]
    fn layer_encoded_aci_quirk() {
        let c = ColorSpec {
            index: 256,
            rgb: 0xc300_0003,
            flag: 0,
        };
        assert_eq!(resolve(&c, None), "green");
    }
}
