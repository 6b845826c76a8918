// Copyright 2026 the dwg2svg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The entity renderer: one emitter per entity kind, dispatched through the
//! [`Entity`] sum type so every new variant is a compile error here until
//! it's handled.

mod geometry;
mod hatch;
mod image;
mod insert;
mod text;
mod util;
mod xline;

use std::io::{self, Write};
use std::mem;

use peniko::kurbo::Point;

use crate::model::{DwgModel, Entity};
use crate::transform::{Frame, Viewport};

/// Per-rendering-call state: the model being read, the computed viewport,
/// the current coordinate frame, and the running `dwg-object-<n>` id
/// counter. An explicit value threaded through the call tree rather than
/// file-scope mutable globals (a writer callback, an `in_block_definition`
/// boolean, the currently open block's base point), so concurrent rendering
/// of independent documents needs no synchronization.
#[derive(Debug)]
pub struct RenderCtx<'a> {
    /// The model being rendered.
    pub model: &'a DwgModel,
    /// The computed viewport (translate/flip parameters).
    pub viewport: &'a Viewport,
    /// Current coordinate frame (viewport-projected or raw/in-block).
    pub frame: Frame,
    next_index: u64,
}

impl<'a> RenderCtx<'a> {
    /// Start a fresh rendering pass over `model` at the given viewport,
    /// beginning in [`Frame::Viewport`].
    pub fn new(model: &'a DwgModel, viewport: &'a Viewport, frame: Frame) -> Self {
        Self {
            model,
            viewport,
            frame,
            next_index: 0,
        }
    }

    /// Allocate the next `dwg-object-<n>` index.
    pub fn next_index(&mut self) -> u64 {
        let i = self.next_index;
        self.next_index += 1;
        i
    }

    /// Project a WCS point through the current frame.
    pub fn project(&self, p: Point) -> Point {
        self.frame.project(self.viewport, p)
    }

    /// Swap in a new frame, returning the previous one so the caller can
    /// restore it after emitting a block's interior.
    pub fn enter_frame(&mut self, frame: Frame) -> Frame {
        mem::replace(&mut self.frame, frame)
    }
}

/// Render a single entity, or nothing if it is invisible, on a hidden layer,
/// or carries a non-finite attribute.
pub fn render_entity<W: Write>(ctx: &mut RenderCtx<'_>, w: &mut W, entity: &Entity) -> io::Result<()> {
    if !entity.common().is_renderable(ctx.model) {
        return Ok(());
    }
    match entity {
        Entity::Line(e) => geometry::line(ctx, w, e),
        Entity::Circle(e) => geometry::circle(ctx, w, e),
        Entity::Arc(e) => geometry::arc(ctx, w, e),
        Entity::Ellipse(e) => geometry::ellipse(ctx, w, e),
        Entity::Point(e) => geometry::point(ctx, w, e),
        Entity::Solid(e) => geometry::solid(ctx, w, e),
        Entity::Face3d(e) => geometry::face3d(ctx, w, e),
        Entity::Polyline2d(e) => geometry::polyline2d(ctx, w, e),
        Entity::LwPolyline(e) => geometry::lwpolyline(ctx, w, e),
        Entity::Hatch(e) => hatch::hatch(ctx, w, e),
        Entity::Text(e) => text::text(ctx, w, e),
        Entity::Attdef(e) => text::attdef(ctx, w, e),
        Entity::Insert(e) => insert::insert(ctx, w, e),
        Entity::Image(e) => image::image(ctx, w, e),
        Entity::XLine(e) => xline::xline(ctx, w, e),
    }
}
