//! MIME types (BCP 13 / RFC 6838).

use std::sync::LazyLock;

use regex::Regex;

use super::CodeValidation;

const TOP_LEVEL_TYPES: &[&str] = &[
    "application",
    "audio",
    "example",
    "font",
    "haptics",
    "image",
    "message",
    "model",
    "multipart",
    "text",
    "video",
];

/// `type/subtype` followed by `;name=value` parameters (values may be quoted).
static MEDIA_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?P<type>[A-Za-z0-9][A-Za-z0-9!#$&^_.+-]{0,126})/(?P<subtype>[A-Za-z0-9][A-Za-z0-9!#$&^_.+-]{0,126})(\s*;\s*[A-Za-z0-9!#$&^_.+-]+=("[^"]*"|[A-Za-z0-9!#$&^_.+-]+))*$"#,
    )
    .expect("Invalid media type regex")
});

pub(super) fn validate(code: &str) -> CodeValidation {
    let Some(caps) = MEDIA_TYPE.captures(code) else {
        return CodeValidation::invalid(format!("'{code}' is not a valid MIME type"));
    };
    let top_level = caps["type"].to_ascii_lowercase();
    if TOP_LEVEL_TYPES.contains(&top_level.as_str()) {
        CodeValidation::valid()
    } else {
        CodeValidation::invalid(format!(
            "'{code}' has an unregistered top-level media type '{top_level}'"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_types() {
        for code in [
            "application/fhir+json",
            "text/plain",
            "text/plain; charset=UTF-8",
            "image/svg+xml",
            "multipart/form-data; boundary=\"abc def\"",
            "Application/PDF",
        ] {
            assert!(validate(code).valid, "{code}");
        }
    }

    #[test]
    fn rejects_malformed_and_unregistered() {
        for code in ["text", "text/", "/plain", "foo/bar", "text/plain;", "text plain"] {
            assert!(!validate(code).valid, "{code}");
        }
    }
}
