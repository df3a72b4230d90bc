//! Printing model light curves.

use std::fmt::Write as _;

use deblib_core::light_curve::{LightCurve, COLUMN_NAMES, COMMENT_PREFIX};

/// Whitespace-separated columns under a `#` header, the engine's own layout.
pub fn table(model: &LightCurve) -> String {
    let mut out = format!("{COMMENT_PREFIX} {:>12}  {:>12}\n", COLUMN_NAMES[0], COLUMN_NAMES[1]);
    for point in model.points() {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "  {:>12.8}  {:>12.8}", point.phase, point.delta_mag);
    }
    out
}

/// The model as pretty-printed JSON.
pub fn json(model: &LightCurve) -> serde_json::Result<String> {
    serde_json::to_string_pretty(model)
}
