//! Label normalization
//!
//! Both sides of a comparison are lower-cased and trimmed, and blank-like
//! values collapse to [`UNKNOWN_LABEL`]. CppCheck severities additionally fold
//! `warning` and `error` into `bug`.

/// Label used for empty, `nan` and `none` values
pub const UNKNOWN_LABEL: &str = "unknown";

/// Lower-case, trim, and map blank-like values to `unknown`
#[must_use]
pub fn clean_label(raw: &str) -> String {
    let label = raw.trim().to_lowercase();
    match label.as_str() {
        "" | "nan" | "none" => UNKNOWN_LABEL.to_string(),
        _ => label,
    }
}

/// [`clean_label`] for a possibly missing value
#[must_use]
pub fn clean_optional(raw: Option<&str>) -> String {
    clean_label(raw.unwrap_or(""))
}

/// Map a CppCheck severity onto the prediction label space
///
/// `warning` and `error` become `bug`; everything else is cleaned.
#[must_use]
pub fn map_severity(raw: &str) -> String {
    let label = clean_label(raw);
    match label.as_str() {
        "warning" | "error" => "bug".to_string(),
        _ => label,
    }
}

/// How a raw column value becomes a label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMapping {
    /// [`clean_label`]
    Clean,
    /// [`map_severity`]
    Severity,
}

impl LabelMapping {
    #[must_use]
    pub fn apply(self, raw: &str) -> String {
        match self {
            Self::Clean => clean_label(raw),
            Self::Severity => map_severity(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_normalization() {
        let raw = ["Warning", " error ", "style", "", "NaN"];
        let mapped: Vec<String> = raw.iter().map(|s| map_severity(s)).collect();
        assert_eq!(mapped, ["bug", "bug", "style", "unknown", "unknown"]);
    }

    #[test]
    fn clean_keeps_other_values() {
        assert_eq!(clean_label("  False_Positive "), "false_positive");
        assert_eq!(clean_label("None"), "unknown");
        assert_eq!(clean_label("performance"), "performance");
        assert_eq!(clean_optional(None), "unknown");
    }

    #[test]
    fn clean_does_not_remap_severity() {
        assert_eq!(LabelMapping::Clean.apply("error"), "error");
        assert_eq!(LabelMapping::Severity.apply("error"), "bug");
        assert_eq!(LabelMapping::Severity.apply("information"), "information");
    }
}
