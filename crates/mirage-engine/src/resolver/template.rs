//! `@name@` token scanning

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Upper bound on substitution passes over one template
pub const MAX_PASSES: usize = 64;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(\w+)@").expect("token pattern is valid"));

/// Check whether `text` still contains a variable token
pub fn has_tokens(text: &str) -> bool {
    TOKEN.is_match(text)
}

/// Names of the tokens in `text`, in order of appearance
pub fn tokens(text: &str) -> Vec<&str> {
    TOKEN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Replace every token in one left-to-right pass.
///
/// A token the lookup has no value for is replaced by its bare name.
pub fn substitute_once<F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    TOKEN
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            lookup(name).unwrap_or_else(|| name.to_string())
        })
        .into_owned()
}
