//! English plurals for counts in status lines and banners.

/// `""` for exactly one, `"s"` otherwise (including zero).
#[inline]
pub const fn plural_s(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// `"1 error"`, `"3 warnings"`, `"0 errors"`.
pub fn plural_count(count: usize, noun: &str) -> String {
    format!("{count} {noun}{}", plural_s(count))
}
