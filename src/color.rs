use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Lighten, Srgb};

use crate::data::model::MeasurementTable;

// ---------------------------------------------------------------------------
// Categorical palette
// ---------------------------------------------------------------------------

/// The ten-colour categorical set (Plotly / D3 "category10").
pub const CATEGORY10: [Color32; 10] = [
    Color32::from_rgb(0x1f, 0x77, 0xb4),
    Color32::from_rgb(0xff, 0x7f, 0x0e),
    Color32::from_rgb(0x2c, 0xa0, 0x2c),
    Color32::from_rgb(0xd6, 0x27, 0x28),
    Color32::from_rgb(0x94, 0x67, 0xbd),
    Color32::from_rgb(0x8c, 0x56, 0x4b),
    Color32::from_rgb(0xe3, 0x77, 0xc2),
    Color32::from_rgb(0x7f, 0x7f, 0x7f),
    Color32::from_rgb(0xbc, 0xbd, 0x22),
    Color32::from_rgb(0x17, 0xbe, 0xcf),
];

/// Lightness added per full pass through the palette.
const CYCLE_LIGHTEN: f32 = 0.18;
/// Passes after which lightening starts over.
const MAX_CYCLES: usize = 4;

/// Colour for the `index`-th category.
///
/// Index `i` takes palette entry `i % 10`; every later pass through the
/// palette (`i / 10`) lightens that entry in HSL space, wrapping after
/// [`MAX_CYCLES`] passes.
pub fn categorical_color(index: usize) -> Color32 {
    let base = CATEGORY10[index % CATEGORY10.len()];
    let cycle = (index / CATEGORY10.len()) % MAX_CYCLES;
    if cycle == 0 {
        return base;
    }

    let rgb = Srgb::new(base.r(), base.g(), base.b()).into_format::<f32>();
    let hsl: Hsl = rgb.into_color();
    let lighter: Srgb = hsl.lighten_fixed(CYCLE_LIGHTEN * cycle as f32).into_color();
    let out = lighter.into_format::<u8>();
    Color32::from_rgb(out.red, out.green, out.blue)
}

// ---------------------------------------------------------------------------
// Color mapping: compound → Color32
// ---------------------------------------------------------------------------

/// Maps every compound of a loaded table to a fixed colour.
///
/// The colour index is the compound's dictionary code, so the mapping
/// depends only on the table: every filter and every screen sees the same
/// colour for the same compound.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn for_compounds(table: &MeasurementTable) -> Self {
        let mapping = table
            .compound
            .categories()
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), categorical_color(i)))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given compound.
    pub fn color_for(&self, compound: &str) -> Color32 {
        self.mapping
            .get(compound)
            .copied()
            .unwrap_or(self.default_color)
    }
}
