use lazy_static::lazy_static;
use regex::Regex;

use crate::error::PipelineError;
use crate::models::ParsedLocator;

lazy_static! {
    // Print and timetable paths both address a cell as /cs:<cell>-<seq>/nid:<terminal>.
    static ref CS_NID_REGEX: Regex = Regex::new(r"/cs:(\d+)-\d+/nid:(\d+)").unwrap();
}

/// Extracts the (cell id, terminal id) pair from a print URL. The URL may
/// arrive percent-encoded; a failed decode falls back to the raw string.
pub fn parse_print_url(url: &str) -> Result<ParsedLocator, PipelineError> {
    let decoded = urlencoding::decode(url)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| url.to_string());

    let caps = CS_NID_REGEX
        .captures(&decoded)
        .ok_or_else(|| PipelineError::MalformedLocator {
            url: url.to_string(),
        })?;

    Ok(ParsedLocator {
        cid: caps[1].to_string(),
        nid: caps[2].to_string(),
    })
}

/// The cell id a timetable path points at, if it carries one.
pub fn cid_from_timetable_path(path: &str) -> Option<String> {
    CS_NID_REGEX.captures(path).map(|caps| caps[1].to_string())
}
