// Copyright 2026 the dwg2svg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Converts an already-parsed [`dxf::Drawing`] into this crate's own
//! [`DwgModel`]. No flattening of block/INSERT structure happens here: the
//! renderer understands `<defs>`/`<use>` instancing natively, so blocks stay
//! intact as owned entity lists rather than being baked into parent geometry
//! at load time.
//!
//! References between entities and layers/styles/blocks are resolved once,
//! here, into the model's flat-indexed `*Ref` types, so the renderer never
//! needs a name lookup at render time.

use std::collections::HashMap;
use std::path::Path;

use dxf::entities::EntityType;
use dxf::Drawing;

use crate::error::{Error, Result};
use crate::geom::{Point3, Vec3};
use crate::model::{
    Arc, Attdef, BlockHeader, BlockRef, Circle, ColorSpec, DwgModel, Ellipse, Entity, EntityCommon, Face3d, Hatch,
    HatchPath, HatchPolylinePath, HatchSegment, Image, ImageDef, ImageDefRef, Insert, Layer, LayerRef, Line,
    LwPolyline, LwVertex, PointEntity, Polyline2d, Solid, Style, StyleRef, Text, TextBody, Vertex2d, XLine,
};

fn p3(p: &dxf::Point) -> Point3 {
    Point3::new(p.x, p.y, p.z)
}

fn v3(v: &dxf::Vector) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn convert_color(color: &dxf::Color, color_24_bit: u32) -> ColorSpec {
    if color.is_by_layer() {
        return ColorSpec::BY_LAYER;
    }
    if color.is_by_block() {
        return ColorSpec::BY_BLOCK;
    }
    if color.is_by_entity() {
        // `index` must not be `256` here: that value means ByLayer to
        // `color::resolve`, which returns before ever checking the true-color
        // flag, silently dropping the 24-bit value.
        return ColorSpec {
            index: 0,
            rgb: color_24_bit & 0x00ff_ffff,
            flag: 0x80,
        };
    }
    match color.index() {
        Some(idx) => ColorSpec {
            index: i32::from(idx),
            rgb: 0,
            flag: 0,
        },
        None => ColorSpec::default(),
    }
}

fn convert_common(common: &dxf::entities::EntityCommon, layers: &HashMap<String, LayerRef>) -> EntityCommon {
    EntityCommon {
        layer: layers.get(&common.layer).copied(),
        color: convert_color(&common.color, common.color_24_bit),
        lineweight: common.lineweight_enum_value,
        invisible: !common.is_visible,
    }
}

/// Convert a single DXF entity, resolving its block/style/imagedef references
/// against the already-built name/handle→ref tables. Returns `None` for
/// entity kinds this crate doesn't render, which are skipped silently rather
/// than surfaced as an error.
fn convert_entity(
    e: &dxf::entities::Entity,
    layers: &HashMap<String, LayerRef>,
    styles: &HashMap<String, StyleRef>,
    blocks: &HashMap<String, BlockRef>,
    imagedefs_by_handle: &HashMap<u64, ImageDefRef>,
) -> Option<Entity> {
    let common = convert_common(&e.common, layers);
    Some(match e.specific {
        EntityType::Line(ref l) => Entity::Line(Line {
            common,
            start: p3(&l.p1),
            end: p3(&l.p2),
            extrusion: v3(&l.extrusion_direction),
        }),
        EntityType::Circle(ref c) => Entity::Circle(Circle {
            common,
            center: p3(&c.center),
            radius: c.radius,
            extrusion: v3(&c.normal),
        }),
        EntityType::Arc(ref a) => Entity::Arc(Arc {
            common,
            center: p3(&a.center),
            radius: a.radius,
            start_angle: a.start_angle.to_radians(),
            end_angle: a.end_angle.to_radians(),
            extrusion: v3(&a.normal),
        }),
        EntityType::Ellipse(ref el) => Entity::Ellipse(Ellipse {
            common,
            center: p3(&el.center),
            sm_axis: v3(&el.major_axis),
            axis_ratio: el.minor_axis_ratio,
            start_angle: el.start_parameter,
            end_angle: el.end_parameter,
        }),
        EntityType::ModelPoint(ref pt) => Entity::Point(PointEntity {
            common,
            position: p3(&pt.location),
            extrusion: v3(&pt.normal),
        }),
        EntityType::Solid(ref s) => Entity::Solid(Solid {
            common,
            corners: [
                p3(&s.first_corner).to_point(),
                p3(&s.second_corner).to_point(),
                p3(&s.third_corner).to_point(),
                p3(&s.fourth_corner).to_point(),
            ],
            extrusion: v3(&s.normal),
        }),
        EntityType::Face3D(ref f) => Entity::Face3d(Face3d {
            common,
            corners: [p3(&f.first_corner), p3(&f.second_corner), p3(&f.third_corner), p3(&f.fourth_corner)],
            #[allow(clippy::cast_sign_loss, reason = "group code 70 is a small non-negative bitmask in practice")]
            invis_flags: f.invisible_edge as u8,
        }),
        EntityType::Polyline(ref pl) => {
            if pl.is_polyface_mesh() || pl.is_3d_polygon_mesh() {
                return None;
            }
            Entity::Polyline2d(Polyline2d {
                common,
                vertices: pl
                    .vertices()
                    .map(|v| Vertex2d {
                        location: p3(&v.location).to_point(),
                        #[allow(clippy::cast_sign_loss, reason = "group code 70 is a small non-negative bitmask in practice")]
                        flags: v.flags as u32,
                    })
                    .collect(),
                closed: pl.is_closed(),
                extrusion: v3(&pl.normal),
            })
        }
        EntityType::LwPolyline(ref lwp) => Entity::LwPolyline(LwPolyline {
            common,
            vertices: lwp
                .vertices
                .iter()
                .map(|v| LwVertex {
                    point: peniko::kurbo::Point::new(v.x, v.y),
                    bulge: v.bulge,
                })
                .collect(),
            closed: lwp.is_closed(),
            extrusion: v3(&lwp.extrusion_direction),
        }),
        EntityType::Hatch(ref h) => Entity::Hatch(Hatch {
            common,
            paths: h
                .boundary_paths
                .iter()
                .map(|p| convert_hatch_path(p))
                .collect(),
            solid_fill: h.is_solid,
        }),
        EntityType::Text(ref t) => Entity::Text(Text {
            common,
            body: TextBody {
                insertion: peniko::kurbo::Point::new(t.location.x, t.location.y),
                alignment_point: (t.second_alignment_point.x != 0.0 || t.second_alignment_point.y != 0.0)
                    .then(|| peniko::kurbo::Point::new(t.second_alignment_point.x, t.second_alignment_point.y)),
                height: t.text_height,
                width_factor: Some(t.relative_x_scale_factor).filter(|f| *f > 0.0),
                rotation: t.rotation.to_radians(),
                halign: t.horizontal_text_justification as i16,
                valign: t.vertical_text_justification as i16,
                style: styles.get(&t.text_style_name).copied(),
                extrusion: v3(&t.normal),
                value: t.value.clone(),
            },
        }),
        EntityType::Attdef(ref a) => Entity::Attdef(Attdef {
            common,
            body: TextBody {
                insertion: peniko::kurbo::Point::new(a.location.x, a.location.y),
                alignment_point: None,
                height: a.text_height,
                width_factor: Some(a.relative_x_scale_factor).filter(|f| *f > 0.0),
                rotation: a.rotation.to_radians(),
                halign: a.horizontal_text_justification as i16,
                valign: a.vertical_text_justification as i16,
                style: styles.get(&a.text_style_name).copied(),
                extrusion: v3(&a.normal),
                value: a.value.clone(),
            },
            tag: a.tag.clone(),
        }),
        EntityType::Insert(ref ins) => Entity::Insert(Insert {
            common,
            ins_pt: peniko::kurbo::Point::new(ins.location.x, ins.location.y),
            scale: Vec3::new(ins.x_scale_factor, ins.y_scale_factor, ins.z_scale_factor),
            rotation: ins.rotation.to_radians(),
            extrusion: v3(&ins.extrusion_direction),
            block: blocks.get(&ins.name).copied(),
        }),
        EntityType::Image(ref img) => Entity::Image(Image {
            common,
            pt0: p3(&img.location),
            uvec: {
                let u = v3(&img.u_vector);
                let w = img.image_size.x.max(1.0);
                Vec3::new(u.x / w, u.y / w, u.z / w)
            },
            vvec: {
                let v = v3(&img.v_vector);
                let h = img.image_size.y.max(1.0);
                Vec3::new(v.x / h, v.y / h, v.z / h)
            },
            image_size: (img.image_size.x, img.image_size.y),
            imagedef: imagedefs_by_handle.get(&img.image_def_handle.0).copied(),
        }),
        EntityType::Ray(ref r) => Entity::XLine(XLine {
            common,
            point: p3(&r.location),
            direction: v3(&r.unit_direction_vector),
            is_ray: true,
        }),
        EntityType::XLine(ref x) => Entity::XLine(XLine {
            common,
            point: p3(&x.first_point),
            direction: v3(&x.unit_direction_vector),
            is_ray: false,
        }),
        _ => return None,
    })
}

fn convert_hatch_path(p: &dxf::entities::HatchBoundaryPathData) -> HatchPath {
    use dxf::entities::HatchBoundaryPathEdge;

    if p.is_polyline {
        return HatchPath::Polyline(HatchPolylinePath {
            points: p.polyline_points.iter().map(|v| peniko::kurbo::Point::new(v.x, v.y)).collect(),
            bulges: p.polyline_points.iter().map(|v| v.bulge).collect(),
            closed: p.is_closed,
        });
    }
    let segments = p
        .edges
        .iter()
        .map(|edge| match edge {
            HatchBoundaryPathEdge::Line(l) => HatchSegment::Line {
                start: peniko::kurbo::Point::new(l.start_point.x, l.start_point.y),
                end: peniko::kurbo::Point::new(l.end_point.x, l.end_point.y),
            },
            HatchBoundaryPathEdge::CircularArc(a) => HatchSegment::CircularArc {
                center: peniko::kurbo::Point::new(a.center.x, a.center.y),
                radius: a.radius,
                start_angle: a.start_angle.to_radians(),
                end_angle: a.end_angle.to_radians(),
                is_ccw: a.is_counterclockwise,
            },
            HatchBoundaryPathEdge::EllipticalArc(a) => HatchSegment::EllipticalArc {
                center: peniko::kurbo::Point::new(a.center.x, a.center.y),
                endpoint: peniko::kurbo::Vec2::new(a.end_point.x, a.end_point.y),
                minor_major_ratio: a.minor_major_ratio,
                start_angle: a.start_angle.to_radians(),
                end_angle: a.end_angle.to_radians(),
                is_ccw: a.is_counterclockwise,
            },
            HatchBoundaryPathEdge::Spline(s) => HatchSegment::Spline {
                control_points: s.control_points.iter().map(|v| peniko::kurbo::Point::new(v.x, v.y)).collect(),
                fit_points: s.fit_points.iter().map(|v| peniko::kurbo::Point::new(v.x, v.y)).collect(),
            },
        })
        .collect();
    HatchPath::Segments(segments)
}

/// Build a [`DwgModel`] from an already-parsed [`dxf::Drawing`].
///
/// Every layer, style, block, and imagedef is converted once up front so
/// that entity conversion can resolve references by simple map lookup rather
/// than re-scanning tables. A drawing with zero entities and zero tables
/// converts to an empty-but-valid `DwgModel`, never panics.
fn convert(drawing: &Drawing) -> DwgModel {
    let layers: HashMap<String, LayerRef> = drawing
        .layers()
        .enumerate()
        .map(|(i, l)| (l.name.clone(), LayerRef(i)))
        .collect();
    let model_layers = {
        let mut v: Vec<_> = drawing.layers().collect();
        v.sort_by_key(|l| layers[&l.name].0);
        v.into_iter()
            .map(|l| Layer {
                name: l.name.clone(),
                off: !l.is_layer_on,
                frozen: l.is_frozen,
                color: convert_color(&l.color, 0),
                lineweight: l.line_weight.raw_value(),
            })
            .collect()
    };

    let styles: HashMap<String, StyleRef> = drawing
        .styles()
        .enumerate()
        .map(|(i, s)| (s.name.clone(), StyleRef(i)))
        .collect();
    let model_styles = {
        let mut v: Vec<_> = drawing.styles().collect();
        v.sort_by_key(|s| styles[&s.name].0);
        v.into_iter()
            .map(|s| Style {
                name: s.name.clone(),
                font_file: s.primary_font_file_name.clone(),
                width_factor: s.width_factor,
            })
            .collect()
    };

    let blocks: HashMap<String, BlockRef> = drawing
        .blocks()
        .enumerate()
        .map(|(i, b)| (b.name.clone(), BlockRef(i)))
        .collect();

    let mut imagedefs: Vec<ImageDef> = Vec::new();
    let mut imagedefs_by_handle: HashMap<u64, ImageDefRef> = HashMap::new();
    for o in drawing.objects() {
        if let dxf::objects::ObjectType::ImageDefinition(ref def) = o.specific {
            imagedefs_by_handle.insert(o.common.handle.0, ImageDefRef(imagedefs.len()));
            imagedefs.push(ImageDef {
                file_path: def.file_path.clone(),
            });
        }
    }

    let mut model_blocks: Vec<BlockHeader> = drawing
        .blocks()
        .map(|b| BlockHeader {
            name: b.name.clone(),
            base_pt: p3(&b.base_point),
            entities: Vec::new(),
            absolute_ref: b.handle.0,
        })
        .collect();
    for (i, b) in drawing.blocks().enumerate() {
        model_blocks[i].entities = b
            .entities
            .iter()
            .filter_map(|e| convert_entity(e, &layers, &styles, &blocks, &imagedefs_by_handle))
            .collect();
    }

    let model_space = model_blocks
        .iter()
        .position(|b| b.name.eq_ignore_ascii_case("*model_space"))
        .map(BlockRef);
    let paper_space = model_blocks
        .iter()
        .position(|b| b.name.to_ascii_lowercase().starts_with("*paper_space"))
        .map(BlockRef);

    let header = &drawing.header;
    let stored_extents = {
        let lo = p3(&header.minimum_drawing_extents);
        let hi = p3(&header.maximum_drawing_extents);
        let nonzero_extent = (hi.x - lo.x).abs() > f64::EPSILON
            || (hi.y - lo.y).abs() > f64::EPSILON
            || (hi.z - lo.z).abs() > f64::EPSILON;
        (lo.is_finite() && hi.is_finite() && nonzero_extent).then_some((lo, hi))
    };

    DwgModel {
        blocks: model_blocks,
        layers: model_layers,
        styles: model_styles,
        imagedefs,
        paper_space,
        model_space,
        stored_extents,
    }
}

/// Load a drawing from `path` and convert it to a [`DwgModel`].
pub fn load(path: impl AsRef<Path>) -> Result<DwgModel> {
    let path = path.as_ref();
    let drawing = Drawing::load_file(path).map_err(Error::InvalidDrawing)?;
    Ok(convert(&drawing))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_drawing_converts_without_panicking() {
        let drawing = Drawing::new();
        let model = convert(&drawing);
        assert!(model.blocks.is_empty() || model.blocks.iter().all(|b| b.entities.is_empty()));
        assert!(model.layers.is_empty());
    }
}
