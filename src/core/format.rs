//! Named-placeholder substitution used for message and line templates
//!
//! A tag is `{name}`. Substitution is a single left-to-right pass: every
//! occurrence of a bound tag is replaced, unbound tags are copied through
//! untouched, and substituted text is never scanned again, so a value that
//! itself contains `{name}` cannot expand recursively.
//!
//! # Examples
//!
//! ```
//! use rust_cascade_logger::core::format;
//! use std::collections::HashMap;
//!
//! let mut bindings = HashMap::new();
//! bindings.insert("a", "1");
//! bindings.insert("b", "2");
//! assert_eq!(format::format("{a}-{b}-{c}", &bindings), "1-2-{c}");
//! assert_eq!(format::erase_tags("{nc}hi{bold}"), "hi");
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

/// Substitute every `{name}` bound in `bindings`.
pub fn format<K, V, S>(template: &str, bindings: &HashMap<K, V, S>) -> String
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
    S: BuildHasher,
{
    format_with(template, |name, out| match bindings.get(name) {
        Some(value) => {
            out.push_str(value.as_ref());
            true
        }
        None => false,
    })
}

/// Substitute tags through a lookup callback.
///
/// `lookup` receives the tag name and the output buffer. It appends the
/// replacement and returns `true`, or returns `false` without writing to keep
/// the tag literally.
pub fn format_with<F>(template: &str, mut lookup: F) -> String
where
    F: FnMut(&str, &mut String) -> bool,
{
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find(['{', '}']) {
            Some(end) if after.as_bytes()[end] == b'}' => {
                let name = &after[..end];
                if !lookup(name, &mut out) {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
                rest = &after[end + 1..];
            }
            Some(end) => {
                // A second '{' before any '}': the first brace is plain text.
                out.push('{');
                out.push_str(&after[..end]);
                rest = &after[end..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Substitute positional arguments into a message template.
///
/// `{}` takes the next argument in order and renders empty once the arguments
/// run out; `{N}` binds argument `N` and stays literal when `N` is out of range.
/// Any other tag is left untouched.
pub fn format_positional<A: AsRef<str>>(template: &str, args: &[A]) -> String {
    if args.is_empty() && !template.contains("{}") {
        return template.to_string();
    }

    let mut next = 0;
    format_with(template, |name, out| {
        if name.is_empty() {
            if let Some(arg) = args.get(next) {
                out.push_str(arg.as_ref());
            }
            next += 1;
            return true;
        }

        if !name.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        match name.parse::<usize>().ok().and_then(|i| args.get(i)) {
            Some(arg) => {
                out.push_str(arg.as_ref());
                true
            }
            None => false,
        }
    })
}

/// True iff the literal `{tag}` occurs in `template`.
pub fn has_tag(template: &str, tag: &str) -> bool {
    let bytes = template.as_bytes();
    template.match_indices(tag).any(|(start, _)| {
        let end = start + tag.len();
        start > 0 && bytes[start - 1] == b'{' && bytes.get(end) == Some(&b'}')
    })
}

/// Remove every `{[A-Za-z0-9]+}` tag.
pub fn erase_tags(template: &str) -> String {
    erase_tags_where(template, |_| true)
}

/// Remove the `{[A-Za-z0-9]+}` tags whose name satisfies `predicate`.
pub fn erase_tags_where<P>(template: &str, mut predicate: P) -> String
where
    P: FnMut(&str) -> bool,
{
    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'{' {
            i += 1;
            continue;
        }

        let name_start = i + 1;
        let mut j = name_start;
        while j < bytes.len() && bytes[j].is_ascii_alphanumeric() {
            j += 1;
        }

        if j > name_start && j < bytes.len() && bytes[j] == b'}' {
            if predicate(&template[name_start..j]) {
                out.push_str(&template[copied..i]);
                copied = j + 1;
            }
            i = j + 1;
        } else {
            i += 1;
        }
    }

    out.push_str(&template[copied..]);
    out
}
