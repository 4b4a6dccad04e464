//! Clean-up of raw completions.
//!
//! The catalog's mutation endpoint rejects comment text with embedded line
//! breaks, and completions frequently end in a cut-off sentence or carry HTML
//! entities. [`clean_completion`] applies, in order: trimming, cropping at the
//! last period, entity decoding and newline collapsing.

use html_escape::decode_html_entities;
use std::borrow::Cow;

/// Named references HTML still recognizes without a trailing `;`.
const LEGACY_ENTITY_NAMES: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig", "agrave",
    "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy", "curren",
    "deg", "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14", "frac34",
    "gt", "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr", "micro",
    "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm", "oslash",
    "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy", "sup1",
    "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc", "ugrave", "uml", "uuml",
    "yacute", "yen", "yuml",
];

/// Truncate `text` after its last `.`; text without a period is returned as is.
///
/// ```rust
/// use description_bot_core::generation::postprocess::crop_at_last_period;
///
/// assert_eq!(crop_at_last_period("Hello, Mr. Smith. How are you?"), "Hello, Mr. Smith.");
/// assert_eq!(crop_at_last_period("No periods here"), "No periods here");
/// ```
pub fn crop_at_last_period(text: &str) -> &str {
    match text.rfind('.') {
        Some(index) => &text[..=index],
        None => text,
    }
}

/// Replace every `\n` with a single space.
pub fn collapse_newlines(text: &str) -> String {
    text.replace('\n', " ")
}

/// Add the missing `;` to legacy references such as `&amp` or `&uumlber`.
///
/// The longest legacy name that prefixes the alphanumeric run after `&` is
/// terminated; references already ending in `;` are left alone.
pub fn terminate_legacy_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut output = String::with_capacity(text.len() + 8);
    let mut rest = text;

    while let Some(position) = rest.find('&') {
        let (before, after) = rest.split_at(position + 1);
        output.push_str(before);

        let run_len = after
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(after.len());
        let run = &after[..run_len];
        let terminated = after[run_len..].starts_with(';');

        rest = after;
        if terminated {
            continue;
        }

        let legacy = LEGACY_ENTITY_NAMES
            .iter()
            .filter(|name| run.starts_with(*name))
            .max_by_key(|name| name.len());

        if let Some(name) = legacy {
            output.push_str(name);
            output.push(';');
            rest = &after[name.len()..];
        }
    }

    output.push_str(rest);
    Cow::Owned(output)
}

/// Turn a raw completion into a single-line draft.
pub fn clean_completion(raw: &str) -> String {
    let cropped = crop_at_last_period(raw.trim());
    let terminated = terminate_legacy_entities(cropped);
    let decoded = decode_html_entities(terminated.as_ref());
    collapse_newlines(&decoded)
}

#[cfg(test)]
#[path = "postprocess_tests.rs"]
mod tests;
