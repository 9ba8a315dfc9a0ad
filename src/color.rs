use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.70, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Species colours
// ---------------------------------------------------------------------------

/// Maps the element symbols of one scene to distinct colours.
#[derive(Debug, Clone, Default)]
pub struct SpeciesColors {
    mapping: BTreeMap<String, Color32>,
}

impl SpeciesColors {
    pub fn new(species: &BTreeSet<&str>) -> Self {
        let mapping = species
            .iter()
            .zip(generate_palette(species.len()))
            .map(|(s, c)| (s.to_string(), c))
            .collect();
        SpeciesColors { mapping }
    }

    pub fn color_for(&self, species: &str) -> Color32 {
        self.mapping.get(species).copied().unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_is_distinct() {
        let palette = generate_palette(4);
        assert_eq!(palette.len(), 4);
        for (i, a) in palette.iter().enumerate() {
            for b in &palette[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn test_species_colors() {
        let species: BTreeSet<&str> = ["Cu", "O", "Y"].into_iter().collect();
        let colors = SpeciesColors::new(&species);
        assert_ne!(colors.color_for("Cu"), colors.color_for("O"));
        assert_eq!(colors.color_for("Xx"), Color32::GRAY);
    }
}
