use serde::{Deserialize, Serialize};

/// Tunable knobs of the edit pipeline.
///
/// The match tolerances and the default transform are empirical values
/// carried over from observed production behavior; they are configuration,
/// not guaranteed-correct contracts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditOptions {
    /// Tight position match, in inches. Used for id-less element matching
    /// and for binding an image edit to an existing picture node.
    pub tight_tolerance: f64,
    /// Loose position match fallback, in inches.
    pub loose_tolerance: f64,
    /// Nominal slide canvas, in inches (standard 10 x 7.5).
    pub slide_width: f64,
    pub slide_height: f64,
    /// Substitute extent for elements without a resolvable transform.
    pub default_extent: f64,
    /// Placeholder grid shape for empty/malformed table input.
    pub placeholder_rows: usize,
    pub placeholder_cols: usize,
    /// Fallback extent for table insertion when the edit carries none.
    pub table_width: f64,
    pub table_row_height: f64,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            tight_tolerance: 0.1,
            loose_tolerance: 1.0,
            slide_width: 10.0,
            slide_height: 7.5,
            default_extent: 1.0,
            placeholder_rows: 5,
            placeholder_cols: 5,
            table_width: 5.0,
            table_row_height: 0.5,
        }
    }
}

impl EditOptions {
    pub fn new() -> Self {
        Self::default()
    }
}
