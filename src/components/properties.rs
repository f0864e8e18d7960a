// ============================================================================
// TOOL PARAMETERS - every user-adjustable tool setting, owned by ToolManager
// ============================================================================

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::color::{alpha_to_byte, byte_to_alpha, hex_to_rgba, rgba_to_hex, with_alpha};
use crate::error::Result;
use crate::geometry::MagnetAnchor;
use crate::ops::shapes::ShapeBehavior;
use crate::ops::text::TextAlignment;

/// Brush stroke textures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrushTexture {
    /// Round stroke with a soft halo.
    #[default]
    Texture1,
    /// Offset square stamps joined by a bevelled polyline.
    Texture2,
    /// Triple square stamps.
    Texture3,
    /// Very light round stamps that build up where they overlap.
    Texture4,
    /// Offset butt stamps.
    Texture5,
}

/// Settings shared by all tools.
///
/// Colours are always lowercase `#rrggbbaa` and each float alpha mirrors its
/// colour's alpha byte. Use the setters to keep the two in step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolParameters {
    pub primary_color: String,
    pub secondary_color: String,
    pub primary_alpha: f32,
    pub secondary_alpha: f32,
    pub line_width: f32,
    pub point_radius: f32,
    pub shape_behavior: ShapeBehavior,
    pub brush_texture: BrushTexture,
    pub polygon_sides: u32,
    pub feather_line_height: u32,
    pub feather_angle: f32,
    pub spray_diameter: f32,
    pub spray_interval: u32,
    pub spray_dot_diameter: f32,
    pub stamp_angle: f32,
    pub stamp_scale: f32,
    pub selection_angle: f32,
    pub tolerance: f32,
    pub grid_size: f32,
    pub magnetism: bool,
    pub magnet_anchor: MagnetAnchor,
    pub font_family: String,
    pub font_size: f32,
    pub bold: bool,
    pub italic: bool,
    pub alignment: TextAlignment,
}

impl Default for ToolParameters {
    fn default() -> Self {
        Self {
            primary_color: "#000000ff".to_string(),
            secondary_color: "#000000ff".to_string(),
            primary_alpha: 1.0,
            secondary_alpha: 1.0,
            line_width: 1.0,
            point_radius: 1.0,
            shape_behavior: ShapeBehavior::OutlineOnly,
            brush_texture: BrushTexture::Texture1,
            polygon_sides: 3,
            feather_line_height: 1,
            feather_angle: 0.0,
            spray_diameter: 5.0,
            spray_interval: 10,
            spray_dot_diameter: 1.0,
            stamp_angle: 0.0,
            stamp_scale: 1.0,
            selection_angle: 0.0,
            tolerance: 0.0,
            grid_size: 20.0,
            magnetism: false,
            magnet_anchor: MagnetAnchor::TopLeft,
            font_family: "Arial".to_string(),
            font_size: 26.0,
            bold: false,
            italic: false,
            alignment: TextAlignment::Left,
        }
    }
}

impl ToolParameters {
    /// Load a (possibly partial) JSON parameter file over the defaults.
    ///
    /// Colours are validated and normalized, alphas re-derived from them.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let mut params: ToolParameters = serde_json::from_str(text)?;
        let primary = params.primary_color.clone();
        let secondary = params.secondary_color.clone();
        params.set_primary_color(&primary)?;
        params.set_secondary_color(&secondary)?;
        params.polygon_sides = params.polygon_sides.max(3);
        params.tolerance = params.tolerance.clamp(0.0, 100.0);
        Ok(params)
    }

    /// Set the primary colour from hex; the float alpha follows its alpha byte.
    /// A malformed colour is rejected and nothing changes.
    pub fn set_primary_color(&mut self, hex: &str) -> Result<()> {
        let c = hex_to_rgba(hex)?;
        self.primary_color = rgba_to_hex(c);
        self.primary_alpha = byte_to_alpha(c[3]);
        Ok(())
    }

    pub fn set_secondary_color(&mut self, hex: &str) -> Result<()> {
        let c = hex_to_rgba(hex)?;
        self.secondary_color = rgba_to_hex(c);
        self.secondary_alpha = byte_to_alpha(c[3]);
        Ok(())
    }

    /// Set the primary alpha; the hex alpha byte is rewritten to match.
    pub fn set_primary_alpha(&mut self, alpha: f32) -> Result<()> {
        let alpha = alpha.clamp(0.0, 1.0);
        self.primary_color = with_alpha(&self.primary_color, alpha)?;
        self.primary_alpha = byte_to_alpha(alpha_to_byte(alpha));
        Ok(())
    }

    pub fn set_secondary_alpha(&mut self, alpha: f32) -> Result<()> {
        let alpha = alpha.clamp(0.0, 1.0);
        self.secondary_color = with_alpha(&self.secondary_color, alpha)?;
        self.secondary_alpha = byte_to_alpha(alpha_to_byte(alpha));
        Ok(())
    }

    pub fn set_polygon_sides(&mut self, sides: u32) {
        self.polygon_sides = sides.max(3);
    }

    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.tolerance = tolerance.clamp(0.0, 100.0);
    }

    pub fn primary_rgba(&self) -> Result<image::Rgba<u8>> {
        hex_to_rgba(&self.primary_color)
    }

    pub fn secondary_rgba(&self) -> Result<image::Rgba<u8>> {
        hex_to_rgba(&self.secondary_color)
    }
}
