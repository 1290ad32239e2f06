// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Declarative image transform parameters.
//
// No pixels are touched locally.  A `TransformSpec` is rendered into an ordered
// parameter list that the object store folds into a delivery URL; the provider
// performs the actual work.  PDF "compression" is the `quality` parameter
// applied to a raw object and nothing more.

use serde::{Deserialize, Serialize};

/// Rectangular crop in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crop {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Target size; a missing side keeps the aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resize {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Output quality hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Auto,
    Level(u8),
}

/// Set of transforms to request from the provider, applied in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSpec {
    pub crop: Option<Crop>,
    pub resize: Option<Resize>,
    /// Clockwise degrees.
    pub rotate: Option<i32>,
    pub brightness: Option<i32>,
    pub contrast: Option<i32>,
    pub quality: Option<Quality>,
    /// Output format extension, e.g. `webp`.
    pub format: Option<String>,
}

impl TransformSpec {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Transform used for PDF compression: a quality hint and nothing else.
    pub fn compress(quality: Quality) -> Self {
        Self {
            quality: Some(quality),
            ..Default::default()
        }
    }

    /// Render into ordered `(name, value)` pairs.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(crop) = self.crop {
            params.push((
                "crop",
                format!("{},{},{},{}", crop.x, crop.y, crop.width, crop.height),
            ));
        }
        if let Some(resize) = self.resize {
            let side = |v: Option<u32>| v.map(|n| n.to_string()).unwrap_or_default();
            params.push(("resize", format!("{}x{}", side(resize.width), side(resize.height))));
        }
        if let Some(degrees) = self.rotate {
            params.push(("rotate", degrees.to_string()));
        }
        if let Some(level) = self.brightness {
            params.push(("brightness", level.to_string()));
        }
        if let Some(level) = self.contrast {
            params.push(("contrast", level.to_string()));
        }
        if let Some(quality) = self.quality {
            let value = match quality {
                Quality::Auto => "auto".to_string(),
                Quality::Level(n) => n.to_string(),
            };
            params.push(("quality", value));
        }
        if let Some(format) = self.format.as_deref() {
            params.push(("format", format.to_ascii_lowercase()));
        }
        params
    }

    /// Render as a `name=value&...` query string.
    pub fn to_query(&self) -> String {
        self.to_params()
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_follow_field_order() {
        let spec = TransformSpec {
            crop: Some(Crop {
                x: 10,
                y: 20,
                width: 300,
                height: 200,
            }),
            resize: Some(Resize {
                width: Some(150),
                height: None,
            }),
            rotate: Some(90),
            format: Some("WEBP".into()),
            ..Default::default()
        };
        assert_eq!(
            spec.to_query(),
            "crop=10,20,300,200&resize=150x&rotate=90&format=webp"
        );
    }

    #[test]
    fn compress_is_quality_only() {
        let spec = TransformSpec::compress(Quality::Level(60));
        assert_eq!(spec.to_params(), vec![("quality", "60".to_string())]);
        assert!(TransformSpec::default().is_empty());
        assert_eq!(TransformSpec::default().to_query(), "");
    }
}
