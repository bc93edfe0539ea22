//! Export and import filter selection for the engine.
//!
//! Filter names follow the engine's documented conversion filters. An export token is
//! either a bare format name (`pdf`) or a `format:FilterName:options` triplet.

use super::capabilities::normalize_extension;

/// A registered export filter for one (input, output) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterEntry {
    pub input_extension: &'static str,
    pub output_format: &'static str,
    pub export_filter: &'static str,
}

const EXPORT_FILTERS: &[FilterEntry] = &[
    FilterEntry {
        input_extension: "doc",
        output_format: "html",
        export_filter: "html:HTML:EmbedImages",
    },
    FilterEntry {
        input_extension: "docx",
        output_format: "html",
        export_filter: "html:HTML:EmbedImages",
    },
    FilterEntry {
        input_extension: "pdf",
        output_format: "html",
        export_filter: "html:XHTML Impress File",
    },
];

/// Input extension -> import filter name.
const IMPORT_FILTERS: &[(&str, &str)] = &[("pdf", "impress_pdf_import")];

/// Filters resolved for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFilters {
    /// Token passed to `--convert-to`.
    pub export: String,
    /// Token passed to `--infilter`, if the input needs one.
    pub import: Option<String>,
}

impl ResolvedFilters {
    /// Resolves the filters for converting `input_extension` into `output_format`.
    ///
    /// Unknown pairs fall back to the normalized output format as the export token
    /// and no import filter.
    pub fn resolve(input_extension: &str, output_format: &str) -> Self {
        Self {
            export: export_filter(input_extension, output_format),
            import: import_filter(input_extension).map(str::to_string),
        }
    }
}

/// Export token for `--convert-to`.
pub fn export_filter(input_extension: &str, output_format: &str) -> String {
    let input = normalize_extension(input_extension);
    let output = normalize_extension(output_format);

    EXPORT_FILTERS
        .iter()
        .find(|entry| entry.input_extension == input && entry.output_format == output)
        .map(|entry| entry.export_filter.to_string())
        .unwrap_or(output)
}

/// Import filter name for `--infilter`, if one is registered.
pub fn import_filter(input_extension: &str) -> Option<&'static str> {
    let input = normalize_extension(input_extension);
    IMPORT_FILTERS
        .iter()
        .find(|(ext, _)| *ext == input)
        .map(|(_, filter)| *filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_to_html_embeds_images() {
        let filters = ResolvedFilters::resolve("doc", "html");
        assert_eq!(filters.export, "html:HTML:EmbedImages");
        assert_eq!(filters.import, None);
    }

    #[test]
    fn test_pdf_to_html_uses_impress_filters() {
        let filters = ResolvedFilters::resolve("pdf", "html");
        assert_eq!(filters.export, "html:XHTML Impress File");
        assert_eq!(filters.import.as_deref(), Some("impress_pdf_import"));
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(export_filter("DOCX", "HTML"), "html:HTML:EmbedImages");
        assert_eq!(export_filter("Doc", "html"), "html:HTML:EmbedImages");
        assert_eq!(import_filter("PDF"), Some("impress_pdf_import"));
    }

    #[test]
    fn test_unknown_pair_falls_back_to_format() {
        let filters = ResolvedFilters::resolve("docx", "pdf");
        assert_eq!(filters.export, "pdf");
        assert_eq!(filters.import, None);

        assert_eq!(export_filter("txt", "ODT"), "odt");
    }

    #[test]
    fn test_import_filter_depends_only_on_input() {
        let filters = ResolvedFilters::resolve("pdf", "pdf");
        assert_eq!(filters.export, "pdf");
        assert_eq!(filters.import.as_deref(), Some("impress_pdf_import"));
    }
}
