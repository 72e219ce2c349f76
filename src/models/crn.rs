//! Resource-identifier (CRN) segment extraction
//!
//! Connect events identify their origin with a hierarchical identifier of
//! the form `crn://confluent.cloud/environment=env-abc/kafka=lkc-xyz/
//! connector=lcc-123`. This module pulls named `segment=value` components
//! out of that string without validating the scheme or host.

/// Sentinel used when a segment is absent or the identifier is unusable
pub const UNKNOWN: &str = "unknown";

/// Labels extracted from a connector resource identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrnLabels {
    /// Environment identifier (e.g. `env-mwvgw`)
    pub environment: String,

    /// Connector identifier from the path (e.g. `lcc-8wypzm`)
    pub connector: String,
}

impl Default for CrnLabels {
    fn default() -> Self {
        Self {
            environment: UNKNOWN.to_string(),
            connector: UNKNOWN.to_string(),
        }
    }
}

/// Look up a single named `segment=value` path component.
///
/// Segment order and count are not fixed; each lookup is independent.
/// Returns `None` for absent segments and for segments with empty values.
pub fn segment<'a>(source: &'a str, name: &str) -> Option<&'a str> {
    let path = source.split_once("://").map_or(source, |(_, rest)| rest);

    path.split('/')
        .filter_map(|component| component.split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

/// Extract the known classification labels from a resource identifier.
pub fn extract_labels(source: &str) -> CrnLabels {
    if source.is_empty() {
        return CrnLabels::default();
    }

    CrnLabels {
        environment: segment(source, "environment").unwrap_or(UNKNOWN).to_string(),
        connector: segment(source, "connector").unwrap_or(UNKNOWN).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "crn://confluent.cloud/environment=env-mwvgw/kafka=lkc-kz3jm/connector=lcc-8wypzm";

    #[test]
    fn test_extract_both_labels() {
        let labels = extract_labels(SOURCE);
        assert_eq!(labels.environment, "env-mwvgw");
        assert_eq!(labels.connector, "lcc-8wypzm");
    }

    #[test]
    fn test_segment_order_independent() {
        let reordered = "crn://confluent.cloud/connector=lcc-1/environment=env-2";
        let labels = extract_labels(reordered);
        assert_eq!(labels.environment, "env-2");
        assert_eq!(labels.connector, "lcc-1");
    }

    #[test]
    fn test_missing_segment_does_not_block_others() {
        let labels = extract_labels("crn://confluent.cloud/environment=env-only");
        assert_eq!(labels.environment, "env-only");
        assert_eq!(labels.connector, UNKNOWN);
    }

    #[test]
    fn test_empty_input_yields_unknowns() {
        let labels = extract_labels("");
        assert_eq!(labels.environment, UNKNOWN);
        assert_eq!(labels.connector, UNKNOWN);
    }

    #[test]
    fn test_no_scheme_still_parses_segments() {
        assert_eq!(segment("environment=env-x/connector=lcc-y", "connector"), Some("lcc-y"));
    }

    #[test]
    fn test_empty_value_treated_as_absent() {
        assert_eq!(segment("crn://confluent.cloud/environment=", "environment"), None);
    }

    #[test]
    fn test_host_component_is_ignored() {
        // `confluent.cloud` has no `=` and must never match a segment name
        assert_eq!(segment(SOURCE, "confluent.cloud"), None);
    }

    #[test]
    fn test_unknown_segment_name() {
        assert_eq!(segment(SOURCE, "cluster"), None);
        assert_eq!(segment(SOURCE, "kafka"), Some("lkc-kz3jm"));
    }
}
