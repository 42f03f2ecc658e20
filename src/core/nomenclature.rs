//! Cleaning of stored values and the naming rules used across the site.

use regex::Regex;
use std::sync::LazyLock;

static LOCANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"N\((\d)\)").expect("locant pattern is valid"));

/// Removes one pair of enclosing quotes or brackets from a stored value.
pub fn strip_sql_quotes(value: &str) -> &str {
    let trimmed = value.trim();
    let mut chars = trimmed.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return trimmed;
    };

    let enclosed = matches!(
        (first, last),
        ('\'', '\'') | ('"', '"') | ('[', ']') | ('(', ')')
    );
    if enclosed {
        &trimmed[first.len_utf8()..trimmed.len() - last.len_utf8()]
    } else {
        trimmed
    }
}

/// Parses a stored synonym list such as `['5mC', '5-methylcytosine']`.
pub fn parse_synonyms(value: &str) -> Vec<String> {
    let inner = strip_sql_quotes(value);
    if inner.trim().is_empty() {
        return Vec::new();
    }

    inner
        .split(", ")
        .map(|item| strip_sql_quotes(item).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Renders the `N(6)` style locant of a curated name as `<i>N</i><sup>6</sup>`.
/// The result is HTML; the rest of the name is escaped.
pub fn format_curated_name(name: &str) -> String {
    match LOCANT.captures(name) {
        Some(caps) => {
            let locant = &caps[0];
            let markup = format!("<i>N</i><sup>{}</sup>", &caps[1]);
            name.split(locant)
                .map(escape_html)
                .collect::<Vec<_>>()
                .join(&markup)
        }
        None => escape_html(name),
    }
}

/// Escapes text placed into a label that templates emit unescaped.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Relative URL of a generated file, percent-encoding each path segment.
pub fn file_href(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// File stem shared by a modification's page and its structure image.
pub fn page_stem(chebi_name: &str) -> String {
    chebi_name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect()
}

pub fn is_synthetic(origin: &str) -> bool {
    origin
        .trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.eq_ignore_ascii_case(&'s'))
}

/// True when the origin mentions one of the shaded origin types as a word.
pub fn is_shaded(origin: &str, shade_origins: &[String]) -> bool {
    let words: Vec<String> = origin
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    shade_origins
        .iter()
        .map(|shade| shade.trim().to_lowercase())
        .any(|shade| words.iter().any(|word| *word == shade))
}

/// Case-insensitive ordering used for every link list.
pub fn sort_case_insensitive<T>(items: &mut [T], name: impl Fn(&T) -> &str) {
    items.sort_by_cached_key(|item| name(item).to_lowercase());
}
