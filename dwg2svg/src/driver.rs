// Copyright 2026 the dwg2svg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The top-level driver: extents → prologue → space body → block defs →
//! closing tag, plus the file-writing entry point.
//!
//! The per-document `dwg-object-<n>` index counter must stay unique across
//! the whole document, so a single [`render::RenderCtx`] is threaded through
//! both the primary space body and every `<defs>` block; no index is ever
//! reused across the two.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::DwgModel;
use crate::render::{self, RenderCtx};
use crate::transform::{Frame, Viewport};
use crate::{dxf_adapter, extents};

fn write_prologue(w: &mut impl Write, viewport: &Viewport) -> io::Result<()> {
    writeln!(w, "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>")?;
    writeln!(
        w,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
         version=\"1.1\" baseProfile=\"basic\" data-gen-vers=\"dwg2svg {}\" width=\"100%\" height=\"100%\" \
         viewBox=\"0 0 {:.6} {:.6}\">",
        env!("CARGO_PKG_VERSION"),
        viewport.page_width(),
        viewport.page_height(),
    )
}

/// Render every owned entity of `block` (in owner order) through `ctx`,
/// writing into `w`. Does nothing if `block` does not resolve.
fn render_block_body(ctx: &mut RenderCtx<'_>, w: &mut impl Write, block: crate::model::BlockRef) -> io::Result<()> {
    let Some(header) = ctx.model.block(block) else {
        return Ok(());
    };
    for entity in &header.entities {
        render::render_entity(ctx, w, entity)?;
    }
    Ok(())
}

/// Render the primary space body (paper space, falling back to model space
/// if paper space yields no output) followed by `<defs>`, into `w`. Assumes
/// the prologue has already been written.
fn render_document_body<W: Write>(model: &DwgModel, viewport: &Viewport, mspace_only: bool, w: &mut W) -> io::Result<()> {
    let mut ctx = RenderCtx::new(model, viewport, Frame::Viewport);

    let mut primary = Vec::new();
    if !mspace_only {
        if let Some(r) = model.paper_space() {
            render_block_body(&mut ctx, &mut primary, r)?;
        }
    }
    if primary.is_empty() {
        if let Some(r) = model.model_space() {
            render_block_body(&mut ctx, &mut primary, r)?;
        }
    }
    w.write_all(&primary)?;

    writeln!(w, "<defs>")?;
    for i in 0..model.blocks.len() {
        // Re-borrow by index each iteration rather than holding a `&BlockHeader`
        // across the `render_entity` calls below, which also need `&mut ctx`.
        let Some(header) = model.blocks.get(i) else {
            continue;
        };
        if !header.is_symbol_eligible() {
            continue;
        }
        writeln!(w, "<g id=\"symbol-{}\">", header.absolute_ref)?;
        let previous = ctx.enter_frame(Frame::Raw);
        for entity in &header.entities {
            render::render_entity(&mut ctx, w, entity)?;
        }
        ctx.enter_frame(previous);
        writeln!(w, "</g>")?;
    }
    writeln!(w, "</defs>")
}

/// Render `model` to a complete SVG document, writing into `w`.
///
/// Returns [`Error::NoRenderableSpace`] if the model has neither a
/// model-space nor a paper-space block to draw from — an empty-but-present
/// space (zero entities) is not an error and renders as an empty `<g>` body.
pub fn render<W: Write>(model: &DwgModel, mspace_only: bool, w: &mut W) -> Result<()> {
    if model.paper_space().is_none() && model.model_space().is_none() {
        return Err(Error::NoRenderableSpace);
    }
    let viewport = extents::compute(model, mspace_only);
    write_prologue(w, &viewport).map_err(Error::Write)?;
    render_document_body(model, &viewport, mspace_only, w).map_err(Error::Write)?;
    writeln!(w, "</svg>").map_err(Error::Write)
}

/// Render `model` to an in-memory `String`.
pub fn data_to_svg(model: &DwgModel, mspace_only: bool) -> Result<String> {
    let mut buf = Vec::new();
    render(model, mspace_only, &mut buf)?;
    String::from_utf8(buf).map_err(|e| Error::Write(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Load `path` with the bundled `dxf` adapter and render it to a `String`.
pub fn to_svg(path: impl AsRef<Path>, mspace_only: bool) -> Result<String> {
    let path = path.as_ref();
    let model = dxf_adapter::load(path)?;
    data_to_svg(&model, mspace_only)
}

/// Load `dwg_path`, render it, and write the result to `svg_path`.
///
/// Writes to a sibling temporary file and renames it into place on success,
/// so a failure (I/O error, disk full) never leaves a partial file at
/// `svg_path`.
pub fn write_svg(dwg_path: impl AsRef<Path>, svg_path: impl AsRef<Path>, mspace_only: bool) -> Result<()> {
    let dwg_path = dwg_path.as_ref();
    let svg_path = svg_path.as_ref();
    let model = dxf_adapter::load(dwg_path)?;
    let svg = data_to_svg(&model, mspace_only)?;

    let tmp_path = tmp_sibling(svg_path);
    fs::write(&tmp_path, svg.as_bytes()).map_err(|e| Error::io(tmp_path.clone(), e))?;
    fs::rename(&tmp_path, svg_path).map_err(|e| Error::io(svg_path.to_path_buf(), e))
}

fn tmp_sibling(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "output.svg".into());
    name.push(".dwg2svg.tmp");
    match path.parent() {
        Some(parent) => parent.join(name),
        None => std::path::PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockHeader, BlockRef};

    #[test]
    fn empty_model_space_renders_valid_empty_svg() {
        let mut model = DwgModel::default();
        model.blocks.push(BlockHeader {
            name: "*Model_Space".to_owned(),
            ..Default::default()
        });
        model.model_space = Some(BlockRef(0));
        let svg = data_to_svg(&model, false).unwrap();
        assert!(svg.contains("viewBox=\"0 0 100.000000 100.000000\""));
        assert!(svg.contains("<defs>"));
        assert!(svg.ends_with("</svg>\n"));
    }

    #[test]
    fn model_with_no_spaces_is_an_error() {
        let model = DwgModel::default();
        assert!(matches!(data_to_svg(&model, false), Err(Error::NoRenderableSpace)));
    }

    #[test]
    fn paper_space_with_no_entities_falls_back_to_model_space() {
        let mut model = DwgModel::default();
        model.blocks.push(BlockHeader {
            name: "*Paper_Space".to_owned(),
            ..Default::default()
        });
        model.blocks.push(BlockHeader {
            name: "*Model_Space".to_owned(),
            entities: vec![crate::model::Entity::Line(crate::model::Line {
                common: crate::model::EntityCommon::default(),
                start: crate::geom::Point3::new(0.0, 0.0, 0.0),
                end: crate::geom::Point3::new(10.0, 10.0, 0.0),
                extrusion: crate::geom::Vec3::Z_AXIS,
            })],
            ..Default::default()
        });
        model.paper_space = Some(BlockRef(0));
        model.model_space = Some(BlockRef(1));
        let svg = data_to_svg(&model, false).unwrap();
        assert!(svg.contains("dwg-object-0"));
    }
}
