// Copyright 2026 the dwg2svg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The crate's error taxonomy.

use std::io;
use std::path::PathBuf;

/// Everything that can go wrong loading a drawing or writing an SVG.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Reading or writing a file failed.
    #[error("I/O error on {path}")]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The `dxf` crate rejected the input file as malformed.
    #[error("could not parse drawing file")]
    InvalidDrawing(#[source] dxf::DxfError),

    /// The drawing has neither a model-space block nor any paper-space
    /// layout to render, so there is nothing to emit.
    #[error("drawing has no renderable space (no MODEL_SPACE or PAPER_SPACE block)")]
    NoRenderableSpace,

    /// Writing the rendered SVG into the caller's sink failed.
    #[error("failed writing SVG output")]
    Write(#[source] io::Error),
}

impl Error {
    /// Wrap an I/O error with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the crate's public API.
pub type Result<T> = std::result::Result<T, Error>;
