use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use crate::Inspection;

/// Renders a one-row table of the key facts.
pub fn render_summary(inspection: &Inspection) -> String {
    let cert = &inspection.certificate;
    let validation = &inspection.validation;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Host",
            "Common Name",
            "Issued By",
            "Expires",
            "Days Left",
            "Status",
            "Hostname",
        ]);
    table.add_row(vec![
        inspection.target.to_string(),
        cert.common_name.to_string(),
        cert.issuer_common_name.to_string(),
        cert.validity.not_after.format("%Y-%m-%d").to_string(),
        validation.days_remaining.to_string(),
        validation.status().to_string(),
        if validation.hostname_matches {
            "Verified".to_string()
        } else {
            "Mismatch".to_string()
        },
    ]);

    table.to_string()
}
