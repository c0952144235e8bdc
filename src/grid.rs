//! Parser for the printable timetable grid. One `<tr class="row2">` per
//! hour; inside, day-type-tagged cells carry the minute values. The markup
//! is not guaranteed well-formed, so rows and cells are located by their
//! open tags and a cell's span runs to the next tagged open tag.

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::PipelineError;
use crate::html_extract::strip_tags;
use crate::models::{DayType, DayTypeSchedule};

lazy_static! {
    static ref ROW_ANCHOR_REGEX: Regex = Regex::new(r#"(?i)<tr class="row2"[^>]*>"#).unwrap();
    static ref HOUR_CELL_REGEX: Regex =
        Regex::new(r#"(?is)<th[^>]*class="hour"[^>]*>(.*?)</th>"#).unwrap();
    static ref DAY_CELL_OPEN_REGEX: Regex = Regex::new(
        r#"(?i)<td[^>]*id="hournd\d+"[^>]*class="[^"]*col_(weekday|saturday|holiday)[^"]*"[^>]*>"#
    )
    .unwrap();
    static ref BARE_HOUR_REGEX: Regex = Regex::new(r"^(\d{1,2})$").unwrap();
    static ref MINUTE_TOKEN_REGEX: Regex = Regex::new(r"\d{1,2}").unwrap();
}

fn day_type_for(marker: &str) -> DayType {
    match marker {
        "weekday" => DayType::Weekday,
        "saturday" => DayType::Saturday,
        _ => DayType::Holiday,
    }
}

/// Parses the print page into per-day-type departure lists. Hours run 0-24
/// (24 is a past-midnight service and stays `24:xx`); rows without a bare
/// numeric hour are skipped. Each list comes back sorted and deduplicated.
/// A page yielding zero departures across all three day types is a parse
/// failure, not an empty schedule.
pub fn parse_print_timetable(html: &str) -> Result<DayTypeSchedule, PipelineError> {
    let mut out = DayTypeSchedule::default();

    let row_starts: Vec<usize> = ROW_ANCHOR_REGEX.find_iter(html).map(|m| m.start()).collect();

    for (i, &start) in row_starts.iter().enumerate() {
        let end = row_starts.get(i + 1).copied().unwrap_or(html.len());
        let row = &html[start..end];

        let hour_text = match HOUR_CELL_REGEX.captures(row) {
            Some(caps) => strip_tags(&caps[1]),
            None => continue,
        };
        let hour: u32 = match BARE_HOUR_REGEX.captures(&hour_text) {
            Some(caps) => caps[1].parse().unwrap_or(u32::MAX),
            None => continue,
        };
        if hour > 24 {
            continue;
        }

        let cells: Vec<(DayType, usize)> = DAY_CELL_OPEN_REGEX
            .captures_iter(row)
            .map(|caps| {
                let m = caps.get(0).unwrap();
                (day_type_for(&caps[1]), m.end())
            })
            .collect();

        for (j, &(day, span_start)) in cells.iter().enumerate() {
            let span_end = cells
                .get(j + 1)
                .map(|&(_, next_start)| next_start)
                .unwrap_or(row.len());
            let text = strip_tags(&row[span_start..span_end]);

            for token in MINUTE_TOKEN_REGEX.find_iter(&text) {
                let minute: u32 = match token.as_str().parse() {
                    Ok(minute) => minute,
                    Err(_) => continue,
                };
                if minute <= 59 {
                    out.get_mut(day).push(format!("{:02}:{:02}", hour, minute));
                }
            }
        }
    }

    for day in DayType::ALL {
        let times = std::mem::take(out.get_mut(day));
        *out.get_mut(day) = times.into_iter().unique().sorted().collect();
    }

    if out.weekday.is_empty() && out.saturday.is_empty() && out.holiday.is_empty() {
        return Err(PipelineError::EmptyTimetable);
    }
    Ok(out)
}
