//! Rendering of an [`Inspection`] for the console.
//!
//! # Submodules
//!
//! - `text` - the sectioned human-readable report
//! - `summary` - a one-row table

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::{InspectError, Inspection};

mod summary;
mod text;

pub use summary::render_summary;
pub use text::render_text;

/// Timestamp layout used in reports.
pub const DATE_FORMAT: &str = "%a %b %d %H:%M:%S UTC %Y";

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Summary,
}

/// Renders `inspection` in `format`. `show_chain` only affects text output;
/// JSON always carries the chain.
pub fn render(
    inspection: &Inspection,
    format: OutputFormat,
    show_chain: bool,
) -> Result<String, InspectError> {
    match format {
        OutputFormat::Text => Ok(render_text(inspection, show_chain)),
        OutputFormat::Json => render_json(inspection),
        OutputFormat::Summary => Ok(render_summary(inspection)),
    }
}

fn render_json(inspection: &Inspection) -> Result<String, InspectError> {
    serde_json::to_string_pretty(inspection)
        .map_err(|e| InspectError::from(format!("could not serialize report: {}", e)))
}
