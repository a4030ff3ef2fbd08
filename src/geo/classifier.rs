//! ISP name classification.
//!
//! Maps free-text ISP/organization strings from geolocation providers to a
//! cleaner display name, preferring a fixed table of known Uzbek providers.

/// Known providers and the lowercase keywords that identify them.
///
/// Declaration order is the tie-break: the first entry whose keyword is a
/// substring of the input wins.
const KNOWN_ISPS: &[(&str, &[&str])] = &[
    ("UZTELECOM", &["uztelecom", "uztelekom", "ucell"]),
    ("Perfectum Mobile", &["perfectum", "beeline"]),
    ("UZDIGITAL", &["uzdigital", "mobiuz"]),
    ("Turon Telecom", &["turon", "turontelecom"]),
    ("Sarkor Telecom", &["sarkor"]),
    ("Sharq Telecom", &["sharq"]),
    ("Eastnet", &["eastnet"]),
    ("Unitel", &["unitel"]),
    ("Stream Telecom", &["stream"]),
    ("Universal Mobile", &["universal", "umobile"]),
];

/// Legal suffixes stripped by the generic cleanup fallback.
const LEGAL_SUFFIXES: &[&str] = &[" LLC", " JSC", " LTD", " Inc", " Corp"];

/// Map a raw ISP string to a canonical provider name.
///
/// Scans the known-provider table case-insensitively; falls back to
/// [`parse_isp_name`] when no keyword matches.
pub fn identify_provider(isp: &str) -> String {
    let lower = isp.to_lowercase();

    for (provider_name, keywords) in KNOWN_ISPS {
        for keyword in *keywords {
            if lower.contains(keyword) {
                return (*provider_name).to_string();
            }
        }
    }

    parse_isp_name(isp)
}

/// Generic ISP name cleanup.
///
/// Drops a leading autonomous-system token ("AS12345 UZTELECOM LLC" ->
/// "UZTELECOM LLC") and trailing legal suffixes, then trims whitespace.
pub fn parse_isp_name(isp: &str) -> String {
    let mut name = isp;

    if name.starts_with("AS") {
        if let Some((_, rest)) = name.split_once(' ') {
            name = rest;
        }
    }

    let mut cleaned = name.to_string();
    for suffix in LEGAL_SUFFIXES {
        if cleaned.to_uppercase().ends_with(&suffix.to_uppercase()) {
            cleaned.truncate(cleaned.len() - suffix.len());
        }
    }

    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_keyword_wins_regardless_of_surrounding_text() {
        assert_eq!(identify_provider("AS8193 Uztelecom LLC"), "UZTELECOM");
        assert_eq!(identify_provider("JSC UCELL mobile"), "UZTELECOM");
        assert_eq!(identify_provider("beeline uzbekistan"), "Perfectum Mobile");
        assert_eq!(identify_provider("Turon Telecom backbone"), "Turon Telecom");
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert_eq!(identify_provider("SARKOR-TAS"), "Sarkor Telecom");
        assert_eq!(identify_provider("StReAm networks"), "Stream Telecom");
    }

    #[test]
    fn table_order_breaks_ties() {
        // "uztelecom" appears before "stream" in the table.
        assert_eq!(identify_provider("uztelecom stream dept"), "UZTELECOM");
    }

    #[test]
    fn fallback_strips_as_prefix_and_suffix() {
        assert_eq!(identify_provider("AS64500 Global Networks LLC"), "Global Networks");
        assert_eq!(parse_isp_name("Global Networks LLC"), "Global Networks");
        assert_eq!(parse_isp_name("Acme JSC"), "Acme");
        assert_eq!(parse_isp_name("Widget Corp"), "Widget");
    }

    #[test]
    fn fallback_suffix_match_is_case_insensitive() {
        assert_eq!(parse_isp_name("Global Networks llc"), "Global Networks");
        assert_eq!(parse_isp_name("Global Networks LTD"), "Global Networks");
    }

    #[test]
    fn as_prefix_without_space_is_kept() {
        assert_eq!(parse_isp_name("ASDF"), "ASDF");
    }

    #[test]
    fn empty_input_yields_empty_string() {
        assert_eq!(identify_provider(""), "");
        assert_eq!(parse_isp_name("   "), "");
    }
}
