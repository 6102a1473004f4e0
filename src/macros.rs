/// Compile a regex literal once and hand out a `&'static Regex`.
///
/// Patterns are string literals checked by the tests that exercise them, so a
/// bad pattern fails the first time the enclosing function runs.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}
