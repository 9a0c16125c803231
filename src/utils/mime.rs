//! MIME type detection for compiled artifacts.

use std::path::Path;

/// MIME type constants for artifact formats.
pub mod types {
    pub const PDF: &str = "application/pdf";
    pub const DVI: &str = "application/x-dvi";
    pub const POSTSCRIPT: &str = "application/postscript";
    pub const PNG: &str = "image/png";
    pub const SVG: &str = "image/svg+xml";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

/// Guess MIME type from an artifact locator (path or path-like string).
pub fn from_locator(locator: &str) -> &'static str {
    from_extension(Path::new(locator).extension().and_then(|e| e.to_str()))
}

/// Guess MIME type from file extension string (case-insensitive).
pub fn from_extension(ext: Option<&str>) -> &'static str {
    match ext.map(str::to_ascii_lowercase).as_deref() {
        Some("pdf") => types::PDF,
        Some("dvi") => types::DVI,
        Some("ps" | "eps") => types::POSTSCRIPT,
        Some("png") => types::PNG,
        Some("svg") => types::SVG,
        _ => types::OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_locator() {
        assert_eq!(from_locator("/data/temp/abc.pdf"), types::PDF);
        assert_eq!(from_locator("C:/Users/me/vitae/temp/abc.PDF"), types::PDF);
        assert_eq!(from_locator("out.dvi"), types::DVI);
        assert_eq!(from_locator("figure.svg"), types::SVG);
        assert_eq!(from_locator("no-extension"), types::OCTET_STREAM);
    }
}
