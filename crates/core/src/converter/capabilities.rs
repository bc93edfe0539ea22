//! Which output formats each input extension may be converted to.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Input extension -> permitted output formats.
///
/// Keys are lowercase. The empty key covers inputs with no detectable extension.
static CAPABILITY_TABLE: Lazy<BTreeMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    const PDF_ONLY: &[&str] = &["pdf"];
    const PDF_HTML: &[&str] = &["pdf", "html"];
    const WORD: &[&str] = &["pdf", "odt", "html"];
    const RICH_TEXT: &[&str] = &["docx", "txt", "pdf"];
    const PLAIN_TEXT: &[&str] = &["pdf", "odt", "doc", "docx", "html"];

    BTreeMap::from([
        ("", PDF_ONLY),
        ("pptx", PDF_ONLY),
        ("ppt", PDF_ONLY),
        ("pdf", PDF_HTML),
        ("docx", WORD),
        ("doc", WORD),
        ("wps", WORD),
        ("dotx", WORD),
        ("docm", WORD),
        ("dotm", WORD),
        ("dot", WORD),
        ("odt", PDF_HTML),
        ("xlsx", PDF_ONLY),
        ("xls", PDF_ONLY),
        ("png", PDF_ONLY),
        ("jpg", PDF_ONLY),
        ("jpeg", PDF_ONLY),
        ("jfif", PDF_ONLY),
        ("rtf", RICH_TEXT),
        ("txt", PLAIN_TEXT),
    ])
});

/// Normalizes a user-supplied extension or format name for table lookups.
///
/// Surrounding whitespace and a single leading dot are removed and the result is
/// lowercased, so `".DOCX"`, `"Docx"` and `"docx"` all resolve to the same entry.
pub fn normalize_extension(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('.')
        .unwrap_or(trimmed)
        .to_ascii_lowercase()
}

/// Read-only view over the capability table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities;

impl Capabilities {
    /// Output formats permitted for `extension`, in table order.
    ///
    /// Unknown extensions yield an empty slice.
    pub fn outputs_for(extension: &str) -> &'static [&'static str] {
        CAPABILITY_TABLE
            .get(normalize_extension(extension).as_str())
            .copied()
            .unwrap_or(&[])
    }

    /// Whether `extension` is registered at all.
    pub fn supports_input(extension: &str) -> bool {
        CAPABILITY_TABLE.contains_key(normalize_extension(extension).as_str())
    }

    /// Whether `extension` may be converted to `format`.
    pub fn supports(extension: &str, format: &str) -> bool {
        let format = normalize_extension(format);
        Self::outputs_for(extension).contains(&format.as_str())
    }

    /// The whole table, keyed by extension.
    pub fn table() -> &'static BTreeMap<&'static str, &'static [&'static str]> {
        &CAPABILITY_TABLE
    }

    /// Every registered input extension.
    pub fn input_extensions() -> impl Iterator<Item = &'static str> {
        CAPABILITY_TABLE.keys().copied()
    }
}
