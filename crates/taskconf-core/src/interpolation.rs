//! Placeholder interpolation
//!
//! Resolves environment references embedded in configuration values:
//! - `${NAME}` - value of `NAME`, or the placeholder verbatim if unset
//! - `${NAME:default}` - value of `NAME`, or `default` if unset
//! - `${NAME:}` - value of `NAME`, or the empty string if unset
//! - `${URL:http\://localhost\:8080}` - `\:` in a replacement becomes `:`
//!
//! Matching is lazy, not brace-balanced. A placeholder ends at the first `}`
//! after its `${`, so `${A:${B:x}}` is the placeholder `${A:${B:x}` (name `A`,
//! default `${B:x`) followed by a literal `}`.
//!
//! Resolution is a single left-to-right pass. Substituted text is never
//! scanned again, which also means resolving twice is not the same as
//! resolving once:
//!
//! ```rust
//! use std::collections::HashMap;
//! use taskconf_core::interpolation::resolve;
//!
//! let env: HashMap<String, String> = HashMap::new();
//! let once = resolve("${A:${B:nested}}", &env);
//! assert_eq!(once, "${B:nested}");
//! assert_eq!(resolve(&once, &env), "nested");
//! ```
//!
//! Malformed input never fails: an unterminated `${` is copied through.

use std::borrow::Cow;

use crate::config::RawConfig;
use crate::lookup::EnvLookup;
use crate::resolved::ResolvedConfig;

const OPEN: &str = "${";
const CLOSE: u8 = b'}';
const SEPARATOR: u8 = b':';

/// A placeholder found in a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Variable name (everything between `${` and the first `:` or `}`)
    pub name: &'a str,
    /// Default segment, if a `:` followed the name
    pub default: Option<&'a str>,
    /// The whole match, `${` through `}`
    pub matched: &'a str,
    /// Byte offset of the `$`
    pub start: usize,
    /// Byte offset just past the `}`
    pub end: usize,
}

impl Placeholder<'_> {
    /// Whether the placeholder carries a default segment (possibly empty)
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Which part of a placeholder body the scanner is accumulating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Name,
    Default { separator: usize },
}

/// Find the first placeholder starting at or after byte offset `from`
///
/// `from` must lie on a char boundary of `input`.
pub fn find_placeholder(input: &str, from: usize) -> Option<Placeholder<'_>> {
    let start = from + input.get(from..)?.find(OPEN)?;
    let body = start + OPEN.len();

    // Neither segment may consume a `}`, so the first one closes the match.
    // If there is none, no later `${` can close either.
    let mut segment = Segment::Name;
    for (offset, &byte) in input.as_bytes()[body..].iter().enumerate() {
        let at = body + offset;
        match (byte, segment) {
            (CLOSE, Segment::Name) => {
                return Some(Placeholder {
                    name: &input[body..at],
                    default: None,
                    matched: &input[start..=at],
                    start,
                    end: at + 1,
                });
            }
            (CLOSE, Segment::Default { separator }) => {
                return Some(Placeholder {
                    name: &input[body..separator],
                    default: Some(&input[separator + 1..at]),
                    matched: &input[start..=at],
                    start,
                    end: at + 1,
                });
            }
            (SEPARATOR, Segment::Name) => segment = Segment::Default { separator: at },
            _ => {}
        }
    }

    None
}

/// Iterator over the placeholders of a text, in scan order
///
/// Matches never overlap: scanning resumes just past the previous `}`.
pub struct Placeholders<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Placeholders<'a> {
    /// Create a new scanner over the given input
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Byte offset where the next search will start
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for Placeholders<'a> {
    type Item = Placeholder<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let found = find_placeholder(self.input, self.pos)?;
        self.pos = found.end;
        Some(found)
    }
}

/// Check if a string contains any complete placeholder
pub fn contains_placeholder(input: &str) -> bool {
    find_placeholder(input, 0).is_some()
}

/// Offset of a `${` that is never closed, if the input has one
///
/// Such text is copied through unchanged by [`resolve`]; this exists so
/// callers can warn about it.
pub fn find_unterminated(input: &str) -> Option<usize> {
    let mut scanner = Placeholders::new(input);
    while scanner.next().is_some() {}
    let tail = scanner.position();
    input[tail..].find(OPEN).map(|offset| tail + offset)
}

/// Prepare a replacement value for splicing into the output
///
/// Applied in this order:
/// 1. every `$` becomes `\$`
/// 2. every `\:` becomes `:`
///
/// The `\$` escape is consumed again when the replacement is appended, so
/// only step 2 is visible in resolved output.
pub fn escape_replacement(value: &str) -> String {
    value.replace('$', "\\$").replace("\\:", ":")
}

/// Append an escaped replacement, decoding `\$` back to `$`
fn append_replacement(out: &mut String, escaped: &str) {
    let mut rest = escaped;
    while let Some(idx) = rest.find("\\$") {
        out.push_str(&rest[..idx]);
        out.push('$');
        rest = &rest[idx + 2..];
    }
    out.push_str(rest);
}

/// Pick the replacement for a placeholder
///
/// The environment always wins; then the default segment; then the matched
/// text itself.
fn select_replacement<'a, L>(placeholder: &Placeholder<'a>, lookup: &L) -> Cow<'a, str>
where
    L: EnvLookup + ?Sized,
{
    if let Some(value) = lookup.lookup(placeholder.name) {
        log::trace!("'{}' resolved from environment", placeholder.name);
        return Cow::Owned(value);
    }
    match placeholder.default {
        Some(default) => {
            log::trace!("'{}' unset, using default", placeholder.name);
            Cow::Borrowed(default)
        }
        None => {
            log::trace!("'{}' unset with no default, left as written", placeholder.name);
            Cow::Borrowed(placeholder.matched)
        }
    }
}

/// Resolve every placeholder in `text` against `lookup`
///
/// Never fails: every input string has a defined output.
pub fn resolve<L>(text: &str, lookup: &L) -> String
where
    L: EnvLookup + ?Sized,
{
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for placeholder in Placeholders::new(text) {
        out.push_str(&text[cursor..placeholder.start]);
        let replacement = select_replacement(&placeholder, lookup);
        append_replacement(&mut out, &escape_replacement(&replacement));
        cursor = placeholder.end;
    }

    out.push_str(&text[cursor..]);
    out
}

/// An interpolation engine bound to one environment lookup
#[derive(Debug, Clone, Default)]
pub struct Interpolator<L> {
    lookup: L,
}

impl<L: EnvLookup> Interpolator<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// The lookup this interpolator consults
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Resolve a single value
    pub fn resolve(&self, text: &str) -> String {
        resolve(text, &self.lookup)
    }

    /// Resolve every value of a raw configuration
    pub fn resolve_all(&self, raw: &RawConfig) -> ResolvedConfig {
        raw.resolve(&self.lookup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::FnLookup;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn empty() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_plain_text_is_identity() {
        for text in [
            "",
            "plain text",
            "jdbc:postgresql://localhost:5432/todo",
            "just $dollar and {braces}",
            "$ {spaced} and $",
            "trailing $",
            "ünïcödé ✓ text",
        ] {
            assert_eq!(resolve(text, &empty()), text);
        }
    }

    #[test]
    fn test_default_used_when_unset() {
        assert_eq!(
            resolve("${NONEXISTENT_VAR:default_value}", &empty()),
            "default_value"
        );
    }

    #[test]
    fn test_unset_without_default_left_verbatim() {
        assert_eq!(
            resolve("${NONEXISTENT_VAR}", &empty()),
            "${NONEXISTENT_VAR}"
        );
    }

    #[test]
    fn test_empty_default() {
        assert_eq!(resolve("${NONEXISTENT_VAR:}", &empty()), "");
    }

    #[test]
    fn test_adjacent_placeholders() {
        assert_eq!(resolve("${VAR1:val1}${VAR2:val2}", &empty()), "val1val2");
    }

    #[test]
    fn test_escaped_colons_in_default() {
        assert_eq!(
            resolve(r"${VAR:value\:with\:colons}", &empty()),
            "value:with:colons"
        );
    }

    #[test]
    fn test_nested_looking_placeholder_is_lazy() {
        assert_eq!(resolve("${VAR1:${VAR2:nested}}", &empty()), "${VAR2:nested}");
    }

    #[test]
    fn test_nested_looking_placeholder_with_outer_set() {
        let env = env(&[("VAR1", "outer")]);
        // The stray `}` belongs to the text, not the placeholder
        assert_eq!(resolve("${VAR1:${VAR2:nested}}", &env), "outer}");
    }

    #[test]
    fn test_unterminated_placeholder_passed_through() {
        assert_eq!(resolve("before_${UNCLOSED", &empty()), "before_${UNCLOSED");
        assert_eq!(resolve("${", &empty()), "${");
        assert_eq!(resolve("${A:b", &empty()), "${A:b");
    }

    #[test]
    fn test_unterminated_after_complete_placeholder() {
        assert_eq!(resolve("${A:x} and ${B", &empty()), "x and ${B");
    }

    #[test]
    fn test_environment_beats_default() {
        let env = env(&[("DB_HOST", "db.prod"), ("EMPTY", "")]);

        assert_eq!(resolve("${DB_HOST:localhost}", &env), "db.prod");
        assert_eq!(resolve("${DB_HOST}", &env), "db.prod");
        // An empty value is still a value
        assert_eq!(resolve("${EMPTY:fallback}", &env), "");
    }

    #[test]
    fn test_resolution_is_not_idempotent() {
        let once = resolve("${VAR1:${VAR2:nested}}", &empty());
        let twice = resolve(&once, &empty());

        assert_eq!(once, "${VAR2:nested}");
        assert_eq!(twice, "nested");
    }

    #[test]
    fn test_substituted_text_is_not_rescanned() {
        let env = env(&[("OUTER", "${INNER}"), ("INNER", "secret")]);

        assert_eq!(resolve("${OUTER}", &env), "${INNER}");
        assert_eq!(resolve("${MISSING:${INNER}", &env), "${INNER");
    }

    #[test]
    fn test_dollar_in_replacement_is_literal() {
        let env = env(&[("PASSWORD", "pa$$w0rd"), ("PRICE", "$5")]);

        assert_eq!(resolve("${PASSWORD}", &env), "pa$$w0rd");
        assert_eq!(resolve("cost=${PRICE}", &env), "cost=$5");
        assert_eq!(resolve("${MISSING:$HOME}", &empty()), "$HOME");
    }

    #[test]
    fn test_backslashes_other_than_colon_escape_are_kept() {
        let env = env(&[("WIN_PATH", r"C:\todo\data"), ("LITERAL", r"\$x")]);

        assert_eq!(resolve("${WIN_PATH}", &env), r"C:\todo\data");
        assert_eq!(resolve("${LITERAL}", &env), r"\$x");
    }

    #[test]
    fn test_colon_escape_applies_to_environment_values() {
        let env = env(&[("URL", r"http\://example.com")]);

        assert_eq!(resolve("${URL}", &env), "http://example.com");
    }

    #[test]
    fn test_surrounding_text_preserved() {
        let env = env(&[("DB_HOST", "db.prod")]);

        assert_eq!(
            resolve(
                r"jdbc:postgresql://${DB_HOST:localhost}:${DB_PORT:5432}/todo",
                &env,
            ),
            "jdbc:postgresql://db.prod:5432/todo"
        );
    }

    #[test]
    fn test_jdbc_url_default_with_escaped_colons() {
        assert_eq!(
            resolve(r"${DB_URL:jdbc\:h2\:file\:./todo-db}", &empty()),
            "jdbc:h2:file:./todo-db"
        );
    }

    #[test]
    fn test_default_may_contain_unescaped_colons() {
        // Only the first `:` separates name from default
        assert_eq!(resolve("${ADDR:localhost:8080}", &empty()), "localhost:8080");
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(resolve("${}", &empty()), "${}");
        assert_eq!(resolve("${:fallback}", &empty()), "fallback");
    }

    #[test]
    fn test_names_are_not_validated() {
        let env = env(&[("weird name-1", "ok")]);

        assert_eq!(resolve("${weird name-1}", &env), "ok");
        assert_eq!(resolve("${ spaced :d}", &empty()), "d");
    }

    #[test]
    fn test_lookup_queried_per_occurrence() {
        let seen = RefCell::new(Vec::new());
        let lookup = FnLookup::new(|name: &str| {
            seen.borrow_mut().push(name.to_string());
            None
        });

        assert_eq!(resolve("${A:1}-${A:2}-${B}", &lookup), "1-2-${B}");
        assert_eq!(*seen.borrow(), vec!["A", "A", "B"]);
    }

    #[test]
    fn test_find_placeholder_spans() {
        let text = "url=${HOST:localhost}/x";
        let found = find_placeholder(text, 0).unwrap();

        assert_eq!(found.name, "HOST");
        assert_eq!(found.default, Some("localhost"));
        assert!(found.has_default());
        assert_eq!(found.matched, "${HOST:localhost}");
        assert_eq!(&text[found.start..found.end], found.matched);
        assert_eq!(find_placeholder(text, found.end), None);
    }

    #[test]
    fn test_find_placeholder_lazy_default() {
        let found = find_placeholder("${VAR1:${VAR2:nested}}", 0).unwrap();

        assert_eq!(found.name, "VAR1");
        assert_eq!(found.default, Some("${VAR2:nested"));
        assert_eq!(found.end, 21);
    }

    #[test]
    fn test_find_placeholder_name_may_contain_open() {
        let found = find_placeholder("${A ${B}", 0).unwrap();

        assert_eq!(found.name, "A ${B");
        assert_eq!(found.start, 0);
        assert!(!found.has_default());
    }

    #[test]
    fn test_find_placeholder_out_of_range() {
        assert_eq!(find_placeholder("${A}", 10), None);
    }

    #[test]
    fn test_placeholders_iterator() {
        let names: Vec<_> = Placeholders::new("${A}${B:1} ${C:} ${D")
            .map(|p| (p.name, p.default))
            .collect();

        assert_eq!(
            names,
            vec![("A", None), ("B", Some("1")), ("C", Some(""))]
        );
    }

    #[test]
    fn test_contains_placeholder() {
        assert!(contains_placeholder("${VAR}"));
        assert!(contains_placeholder("prefix ${VAR:x} suffix"));
        assert!(!contains_placeholder("no placeholder"));
        assert!(!contains_placeholder("just $dollar"));
        assert!(!contains_placeholder("${unclosed"));
    }

    #[test]
    fn test_find_unterminated() {
        assert_eq!(find_unterminated("before_${UNCLOSED"), Some(7));
        assert_eq!(find_unterminated("${A} ${B"), Some(5));
        assert_eq!(find_unterminated("${A} ${B}"), None);
        assert_eq!(find_unterminated("plain"), None);
    }

    #[test]
    fn test_escape_replacement_order() {
        assert_eq!(escape_replacement("a$b"), r"a\$b");
        assert_eq!(escape_replacement(r"a\:b"), "a:b");
        assert_eq!(escape_replacement(r"$\:"), r"\$:");
        assert_eq!(escape_replacement("plain"), "plain");
    }

    #[test]
    fn test_interpolator_resolve() {
        let interpolator = Interpolator::new(env(&[("TODO_THEME", "dark")]));

        assert_eq!(interpolator.resolve("theme=${TODO_THEME:light}"), "theme=dark");
        assert_eq!(interpolator.resolve("${TODO_LANG:en}"), "en");
        assert_eq!(interpolator.lookup().len(), 1);
    }

    #[test]
    fn test_interpolator_resolve_all() {
        let raw = RawConfig::from_pairs([
            ("db.user", "${DB_USER:sa}"),
            ("db.pool.size", "${DB_POOL:4}"),
        ]);
        let interpolator = Interpolator::new(env(&[("DB_POOL", "16")]));

        let resolved = interpolator.resolve_all(&raw);

        assert_eq!(resolved.get("db.user"), Some("sa"));
        assert_eq!(resolved.get_u32("db.pool.size").unwrap(), 16);
    }

    #[test]
    fn test_resolve_is_thread_safe() {
        let env = env(&[("WORKER", "ok")]);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|i| {
                    let env = &env;
                    scope.spawn(move || resolve(&format!("{}-${{WORKER}}", i), env))
                })
                .collect();
            for (i, handle) in handles.into_iter().enumerate() {
                assert_eq!(handle.join().unwrap(), format!("{}-ok", i));
            }
        });
    }
}
