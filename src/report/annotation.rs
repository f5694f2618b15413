//! Inline "Last Updated" annotation

use crate::freshness::resolver::Resolution;

pub const WARNING_GLYPH: &str = "⚠️";

/// Short label for a plugin row.
/// Returns None when the registry had nothing to report.
pub fn annotate(resolution: &Resolution) -> Option<String> {
    let timestamp = resolution.raw_timestamp.as_deref()?;

    if resolution.is_stale() {
        Some(format!("{} Last Updated: {}", WARNING_GLYPH, timestamp))
    } else {
        Some(format!("Last Updated: {}", timestamp))
    }
}
