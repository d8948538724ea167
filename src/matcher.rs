//! Nearest-palette-entry selection in RGB space.

use crate::error::AccentError;
use crate::palette::{PaletteEntry, Rgb};

/// Squared Euclidean distance between two colors.
///
/// Only relative ordering is needed, so the square root is skipped.
pub fn squared_distance(a: Rgb, b: Rgb) -> u32 {
    let dr = i32::from(a.r) - i32::from(b.r);
    let dg = i32::from(a.g) - i32::from(b.g);
    let db = i32::from(a.b) - i32::from(b.b);
    (dr * dr + dg * dg + db * db) as u32
}

/// Return the name of the palette entry closest to `sample`.
///
/// Ties go to the entry listed first.
pub fn closest_accent(sample: Rgb, palette: &[PaletteEntry]) -> Result<&str, AccentError> {
    let mut best: Option<(&PaletteEntry, u32)> = None;
    for entry in palette {
        let d = squared_distance(sample, entry.rgb);
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((entry, d));
        }
    }

    let (entry, distance) = best.ok_or_else(|| {
        AccentError::Configuration(format!("cannot match {sample}: palette is empty"))
    })?;
    tracing::debug!(%sample, accent = %entry.name, distance, "closest accent");
    Ok(&entry.name)
}
