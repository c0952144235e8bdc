//! Narrow interface over the regex-based page scanning the pipeline does.
//! The kanachu print pages are not reliably well-formed, so link and cell
//! extraction works on the raw markup; anything with sane structure goes
//! through `scraper` instead (see `terminal_index` and `duration`).

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HREF_REGEX: Regex = Regex::new(r#"href="([^"]+)""#).unwrap();
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Collects every `href` in the page whose value matches `pattern`, in
/// document order. `&amp;` is normalized to `&` first so query-string links
/// compare equal to the paths the crawler enqueues.
pub fn extract_href_paths(html: &str, pattern: &Regex) -> Vec<String> {
    HREF_REGEX
        .captures_iter(html)
        .map(|caps| caps[1].replace("&amp;", "&"))
        .filter(|href| pattern.is_match(href))
        .collect()
}

/// Replaces tags with spaces, decodes entities and collapses `&nbsp;`, then
/// trims. Good enough for the table-cell fragments this crate reads.
pub fn strip_tags(fragment: &str) -> String {
    let text = TAG_REGEX.replace_all(fragment, " ");
    html_escape::decode_html_entities(&text)
        .replace('\u{a0}', " ")
        .trim()
        .to_string()
}
