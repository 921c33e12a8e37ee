use crate::extract::SubjectAltNames;
use crate::Inspection;

use super::DATE_FORMAT;

/// Renders the sectioned report: connection summary, certificate info,
/// SANs, validation results, then the chain when `show_chain` is set.
pub fn render_text(inspection: &Inspection, show_chain: bool) -> String {
    let cert = &inspection.certificate;
    let validation = &inspection.validation;
    let mut output = String::new();

    output.push_str(&format!(
        "Successfully retrieved {} certificates.\n",
        inspection.chain.len()
    ));

    output.push_str("\n[Certificate Info]\n");
    output.push_str(&format!("Host: {}\n", inspection.target));
    output.push_str(&format!("Subject: {}\n", cert.subject));
    output.push_str(&format!("Issuer: {}\n", cert.issuer));
    output.push_str(&format!("Common Name (CN): {}\n", cert.common_name));
    output.push_str(&format!(
        "Valid From: {}\n",
        cert.validity.not_before.format(DATE_FORMAT)
    ));
    output.push_str(&format!(
        "Valid To:   {}\n",
        cert.validity.not_after.format(DATE_FORMAT)
    ));
    output.push_str(&format!("Fingerprint (SHA-256): {}\n", cert.fingerprint));

    output.push_str("\n[Subject Alternative Names]\n");
    match &cert.sans {
        SubjectAltNames::Present(entries)
            if !entries.is_empty() || !cert.san_diagnostics.is_empty() =>
        {
            for san in entries {
                output.push_str(&format!("{}\n", san));
            }
            for diagnostic in &cert.san_diagnostics {
                output.push_str(&format!("Error parsing SAN: {}\n", diagnostic.message));
            }
        }
        _ => output.push_str("None found\n"),
    }

    output.push_str("\n[Validation Results]\n");
    if validation.expired {
        output.push_str("❌ Certificate has expired.\n");
    } else if validation.not_yet_valid {
        output.push_str("❌ Certificate not yet valid.\n");
    } else {
        output.push_str("✅ Certificate is currently valid.\n");
    }
    if validation.hostname_matches {
        output.push_str("✅ Hostname verified.\n");
    } else {
        output.push_str("❌ Hostname does not match certificate.\n");
    }

    if show_chain {
        output.push_str("\n[Certificate Chain]\n");
        for (i, entry) in inspection.chain.iter().enumerate() {
            output.push_str(&format!("#{} Subject: {}\n", i, entry.subject));
            output.push_str(&format!("   Issuer: {}\n", entry.issuer));
            match entry.not_after {
                Some(not_after) => output.push_str(&format!(
                    "   Valid To: {}\n",
                    not_after.format(DATE_FORMAT)
                )),
                None => output.push_str("   Valid To: unknown\n"),
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dn::CommonName;
    use crate::extract::{SanDiagnostic, SubjectAltName};
    use crate::report::tests::sample;
    use crate::ChainEntry;

    #[test]
    fn test_full_report_layout() {
        let inspection = sample(SubjectAltNames::Present(vec![
            SubjectAltName::dns("example.com"),
            SubjectAltName::dns("*.example.com"),
            SubjectAltName::ip("192.0.2.1"),
            SubjectAltName::other(6, "https://example.com/"),
        ]));

        let expected = format!(
            "Successfully retrieved 2 certificates.

[Certificate Info]
Host: example.com:443
Subject: CN=example.com,O=Example Org,C=US
Issuer: CN=Example CA,O=Example Org,C=US
Common Name (CN): example.com
Valid From: Mon Jan 01 00:00:00 UTC 2024
Valid To:   Tue Dec 31 23:59:59 UTC 2024
Fingerprint (SHA-256): {}

[Subject Alternative Names]
DNS: example.com
DNS: *.example.com
IP: 192.0.2.1
Type 6: https://example.com/

[Validation Results]
✅ Certificate is currently valid.
✅ Hostname verified.
",
            inspection.certificate.fingerprint
        );

        assert_eq!(render_text(&inspection, false), expected);
    }

    #[test]
    fn test_absent_and_empty_sans_read_none_found() {
        for sans in [SubjectAltNames::Absent, SubjectAltNames::Present(Vec::new())] {
            let report = render_text(&sample(sans), false);
            assert!(report.contains("[Subject Alternative Names]\nNone found\n"));
        }
    }

    #[test]
    fn test_san_diagnostics_are_listed() {
        let mut inspection = sample(SubjectAltNames::Present(vec![SubjectAltName::dns(
            "api.example.com",
        )]));
        inspection.certificate.san_diagnostics.push(SanDiagnostic {
            position: 0,
            message: "IP address is 5 bytes long, expected 4 or 16".to_string(),
        });

        let report = render_text(&inspection, false);
        assert!(report.contains(concat!(
            "DNS: api.example.com\n",
            "Error parsing SAN: IP address is 5 bytes long, expected 4 or 16\n"
        )));
    }

    #[test]
    fn test_failed_validation_lines() {
        let mut inspection = sample(SubjectAltNames::Absent);
        inspection.certificate.common_name = CommonName::NotFound;
        inspection.validation.expired = true;
        inspection.validation.not_yet_valid = true;
        inspection.validation.hostname_matches = false;

        let report = render_text(&inspection, false);
        assert!(report.contains("Common Name (CN): Not Found\n"));
        assert!(report.contains("❌ Certificate has expired.\n"));
        assert!(!report.contains("not yet valid"));
        assert!(report.contains("❌ Hostname does not match certificate.\n"));

        inspection.validation.expired = false;
        let report = render_text(&inspection, false);
        assert!(report.contains("❌ Certificate not yet valid.\n"));
    }

    #[test]
    fn test_chain_section() {
        let inspection = sample(SubjectAltNames::Absent);

        let without = render_text(&inspection, false);
        assert!(!without.contains("[Certificate Chain]"));

        let with = render_text(&inspection, true);
        let chain = with.split("[Certificate Chain]\n").nth(1).unwrap();
        assert!(
            with.find("[Validation Results]").unwrap() < with.find("[Certificate Chain]").unwrap()
        );
        assert!(chain.starts_with("#0 Subject: CN=example.com,O=Example Org,C=US\n"));
        assert!(chain.contains("#1 Subject: CN=Example CA,O=Example Org,C=US\n"));
        assert!(chain.contains("   Issuer: CN=Example Root,O=Example Org,C=US\n"));
    }

    #[test]
    fn test_chain_entry_without_expiry() {
        let mut inspection = sample(SubjectAltNames::Absent);
        inspection.chain[1] = ChainEntry {
            subject: ChainEntry::UNREADABLE.to_string(),
            issuer: ChainEntry::UNREADABLE.to_string(),
            not_after: None,
        };

        let report = render_text(&inspection, true);
        assert!(report.ends_with(concat!(
            "#1 Subject: Error parsing certificate\n",
            "   Issuer: Error parsing certificate\n",
            "   Valid To: unknown\n"
        )));
    }
}
