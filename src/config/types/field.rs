//! Config field path.

use owo_colors::{OwoColorize, Stream};
use std::fmt;

/// Dotted path of a config field, e.g. `compile.debounce_ms`.
///
/// ```ignore
/// impl CompileConfig {
///     pub const PROGRAM: FieldPath = FieldPath::new("compile.program");
/// }
///
/// diag.error(CompileConfig::PROGRAM, "compiler program is empty");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(pub &'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }

    /// TOML table the field lives in (`compile` for `compile.program`).
    pub fn section(&self) -> &'static str {
        self.0.split_once('.').map_or(self.0, |(section, _)| section)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = format!("`{}`", self.0);
        write!(f, "{}", path.if_supports_color(Stream::Stderr, |p| p.bright_blue()))
    }
}
