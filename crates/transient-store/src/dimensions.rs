// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Header-only image inspection.  Pixel data is never decoded.

use std::io::Cursor;

use image::ImageReader;
use tracing::debug;

/// Width and height read from the image header, if the format is recognised.
pub fn image_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?;
    match reader.into_dimensions() {
        Ok(dimensions) => Some(dimensions),
        Err(err) => {
            debug!(%err, "could not read image dimensions");
            None
        }
    }
}
