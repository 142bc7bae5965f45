//! Editor overlays composited over the main render: reference grid,
//! selection highlight, transform gizmo.

use super::gizmo::TransformGizmo;
use super::pick::SelectionBox;

/// Editor color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    /// Clear color and alpha for the render surface.
    pub fn background(&self) -> ([f32; 3], f32) {
        match self {
            Theme::Dark => ([0.0, 0.0, 0.0], 0.0),
            Theme::Light => ([0.667, 0.667, 0.667], 1.0),
        }
    }

    /// Fine and coarse grid line colors.
    pub fn grid_colors(&self) -> ([f32; 3], [f32; 3]) {
        match self {
            Theme::Dark => ([0.333, 0.333, 0.333], [0.533, 0.533, 0.533]),
            Theme::Light => ([0.6, 0.6, 0.6], [0.467, 0.467, 0.467]),
        }
    }
}

/// Two-tier reference grid on the ground plane: one tick per unit plus
/// one tick every five units.
#[derive(Debug, Clone, Copy)]
pub struct GridOverlay {
    pub size: f32,
    pub divisions_fine: u32,
    pub divisions_coarse: u32,
    pub color_fine: [f32; 3],
    pub color_coarse: [f32; 3],
}

impl GridOverlay {
    pub fn for_theme(theme: Theme) -> Self {
        let (fine, coarse) = theme.grid_colors();
        Self {
            size: 30.0,
            divisions_fine: 30,
            divisions_coarse: 6,
            color_fine: fine,
            color_coarse: coarse,
        }
    }
}

/// One overlay layer handed to the renderer after the main pass, drawn
/// without clearing so layers composite.
pub enum OverlayLayer<'a> {
    Grid(&'a GridOverlay),
    SelectionBox(&'a SelectionBox),
    Gizmo(&'a TransformGizmo),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn themes_differ_in_background_alpha() {
        let (_, dark_alpha) = Theme::Dark.background();
        let (_, light_alpha) = Theme::Light.background();
        assert_eq!(dark_alpha, 0.0);
        assert_eq!(light_alpha, 1.0);
    }

    #[test]
    fn grid_keeps_the_two_tick_tiers() {
        let grid = GridOverlay::for_theme(Theme::Dark);
        assert_eq!(grid.size, 30.0);
        assert_eq!(grid.divisions_fine, 30);
        assert_eq!(grid.divisions_coarse, 6);
    }
}
