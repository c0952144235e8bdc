//! Travel-duration inference. For every departure extracted from the print
//! grid, minutes to the destination stop are estimated from the route's
//! per-departure course pages, in three tiers:
//!
//! 1. explicit arrival stamp at the destination node, clock-diffed against
//!    the departure (wrapping past midnight),
//! 2. sum of the per-leg minute annotations up to and including the
//!    destination node,
//! 3. the single representative figure on the route's overview page,
//!    applied uniformly when nothing per-departure was recovered (or the
//!    route is flagged to skip its detail pages).
//!
//! Every candidate passes a plausibility filter before being accepted.
//! Nothing in here is fatal; the worst case leaves the route's static
//! estimate as its summary duration.

use ahash::AHashMap;
use itertools::Itertools;
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use scraper::{Html, Selector};

use crate::html_extract::extract_href_paths;
use crate::models::{DayType, DayTypeSchedule, DurationTable, ResolvedRoute};

/// Durations outside this window are scraping artifacts, not bus rides.
pub const MIN_PLAUSIBLE_MINS: u32 = 5;
pub const MAX_PLAUSIBLE_MINS: u32 = 120;

lazy_static! {
    // per-departure course pages, linked from the timetable overview;
    // dk: 0=weekday 1=saturday 2=holiday, tm: HHMM (hour may be 24)
    static ref COURSE_LINK_REGEX: Regex =
        Regex::new(r"^/dia/diagram/course/cs:\d+-\d+/nid:\d+/dk:([0-2])/tm:(\d{4})$").unwrap();
    static ref TIMETABLE_PREFIX_REGEX: Regex =
        Regex::new(r"^/dia/diagram/timetable/(cs:\d+-\d+/nid:\d+)").unwrap();
    static ref CLOCK_STAMP_REGEX: Regex = Regex::new(r"(\d{1,2}):(\d{2})").unwrap();
    static ref LEG_MINUTES_REGEX: Regex = Regex::new(r"(\d+)分").unwrap();
    static ref SUMMARY_MINUTES_REGEX: Regex = Regex::new(r"約(\d+)分").unwrap();
    static ref BUSSTOP_SELECTOR: Selector = Selector::parse("li.busstop").unwrap();
}

pub fn plausible(mins: u32) -> bool {
    (MIN_PLAUSIBLE_MINS..=MAX_PLAUSIBLE_MINS).contains(&mins)
}

/// `"24:05"` -> 1445. Hours up to 24 are legal (past-midnight services).
pub fn hhmm_to_minutes(hhmm: &str) -> Option<u32> {
    let (hours, minutes) = hhmm.split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 24 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Minutes from `departure` to `arrival` on a clock, wrapping past midnight.
pub fn wrapped_diff_minutes(departure: u32, arrival: u32) -> u32 {
    (arrival as i64 - departure as i64).rem_euclid(24 * 60) as u32
}

/// Course links on a timetable overview page, keyed by (day type, HH:MM).
pub fn course_links_in_page(html: &str) -> AHashMap<(DayType, String), String> {
    let mut out = AHashMap::new();
    for href in extract_href_paths(html, &COURSE_LINK_REGEX) {
        if let Some(caps) = COURSE_LINK_REGEX.captures(&href) {
            let day = match &caps[1] {
                "0" => DayType::Weekday,
                "1" => DayType::Saturday,
                _ => DayType::Holiday,
            };
            let tm = &caps[2];
            let time = format!("{}:{}", &tm[..2], &tm[2..]);
            out.insert((day, time), href.clone());
        }
    }
    out
}

/// Tier 1: the explicit arrival stamp inside the destination stop's node,
/// as minutes-of-day.
pub fn arrival_stamp_minutes(html: &str, destination_nid: &str) -> Option<u32> {
    let document = Html::parse_document(html);
    let node = document
        .select(&BUSSTOP_SELECTOR)
        .find(|li| li.value().attr("data-nid") == Some(destination_nid))?;
    let text = node.text().collect::<String>();
    let caps = CLOCK_STAMP_REGEX.captures(&text)?;
    let hours: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;
    Some(hours * 60 + minutes)
}

/// Tier 2: per-leg minute annotations summed over the itinerary up to and
/// including the destination node. No annotations at all is a miss, not a
/// zero-minute ride.
pub fn segment_sum_minutes(html: &str, destination_nid: &str) -> Option<u32> {
    let document = Html::parse_document(html);
    let mut total: u32 = 0;

    for li in document.select(&BUSSTOP_SELECTOR) {
        let text = li.text().collect::<String>();
        for caps in LEG_MINUTES_REGEX.captures_iter(&text) {
            total += caps[1].parse::<u32>().ok()?;
        }
        if li.value().attr("data-nid") == Some(destination_nid) {
            return if total > 0 { Some(total) } else { None };
        }
    }
    None
}

/// Overview page for a timetable path: same cell, `summary` segment, any
/// trailing segments dropped.
pub fn summary_path_for(timetable_path: &str) -> Option<String> {
    TIMETABLE_PREFIX_REGEX
        .captures(timetable_path)
        .map(|caps| format!("/dia/diagram/summary/{}", &caps[1]))
}

/// Tier 3: the representative `約N分` figure on the overview page.
pub fn summary_minutes(html: &str) -> Option<u32> {
    let caps = SUMMARY_MINUTES_REGEX.captures(html)?;
    caps[1].parse().ok()
}

/// Median of the recovered per-departure durations; even counts average the
/// middle pair and round.
pub fn median(samples: &[u32]) -> Option<u32> {
    if samples.is_empty() {
        return None;
    }
    let sorted: Vec<u32> = samples.iter().copied().sorted().collect();
    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some(((sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0).round() as u32)
    }
}

pub struct InferredDurations {
    pub by_time: DurationTable,
    /// Median of the tier-1/2 values, or the static estimate when none.
    pub representative: u32,
}

async fn fetch_page(client: &reqwest::Client, path: &str) -> Option<String> {
    let url = crate::full_url(path);
    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => response.text().await.ok(),
        Ok(response) => {
            warn!("{}: status {}", url, response.status());
            None
        }
        Err(error) => {
            warn!("{}: {}", url, error);
            None
        }
    }
}

/// Runs the three tiers for one route. `destination_nid` is the terminal id
/// of the stop the duration is measured to.
pub async fn infer_durations(
    client: &reqwest::Client,
    route: &ResolvedRoute,
    destination_nid: &str,
    schedule: &DayTypeSchedule,
) -> InferredDurations {
    let mut by_time = DurationTable::default();
    let mut samples: Vec<u32> = Vec::new();

    let course_links = if route.def.duration_from_overview {
        AHashMap::new()
    } else {
        match fetch_page(client, &route.timetable_path).await {
            Some(html) => course_links_in_page(&html),
            None => {
                warn!(
                    "route {}: timetable overview unavailable, skipping per-departure durations",
                    route.def.id
                );
                AHashMap::new()
            }
        }
    };

    for day in DayType::ALL {
        for departure in schedule.get(day) {
            let link = match course_links.get(&(day, departure.clone())) {
                Some(link) => link,
                None => continue,
            };
            let html = match fetch_page(client, link).await {
                Some(html) => html,
                None => continue,
            };
            let departure_mins = match hhmm_to_minutes(departure) {
                Some(mins) => mins,
                None => continue,
            };

            let candidate = arrival_stamp_minutes(&html, destination_nid)
                .map(|arrival| wrapped_diff_minutes(departure_mins, arrival))
                .filter(|mins| plausible(*mins))
                .or_else(|| {
                    segment_sum_minutes(&html, destination_nid).filter(|mins| plausible(*mins))
                });

            if let Some(mins) = candidate {
                by_time.get_mut(day).insert(departure.clone(), mins);
                samples.push(mins);
            }
        }
    }

    if samples.is_empty() {
        if let Some(summary_path) = summary_path_for(&route.timetable_path) {
            let summary = match fetch_page(client, &summary_path).await {
                Some(html) => summary_minutes(&html).filter(|mins| plausible(*mins)),
                None => None,
            };
            match summary {
                Some(mins) => {
                    for day in DayType::ALL {
                        for departure in schedule.get(day) {
                            by_time
                                .get_mut(day)
                                .entry(departure.clone())
                                .or_insert(mins);
                        }
                    }
                }
                None => warn!(
                    "route {}: no overview duration either, leaving static estimate",
                    route.def.id
                ),
            }
        }
    }

    InferredDurations {
        representative: median(&samples).unwrap_or(route.def.approx_duration_mins),
        by_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERVIEW_PAGE: &str = r#"
        <div class="timetableDetail">
          <a href="/dia/diagram/course/cs:0000803517-1/nid:00114298/dk:0/tm:0650">6:50</a>
          <a href="/dia/diagram/course/cs:0000803517-1/nid:00114298/dk:1/tm:0715">7:15</a>
          <a href="/dia/diagram/course/cs:0000803517-1/nid:00114298/dk:2/tm:2405">24:05</a>
          <a href="/dia/diagram/printdate/cs:0000803517-1/nid:00114298/chk:all/dts:1772215200">印刷</a>
        </div>
    "#;

    const COURSE_PAGE: &str = r#"
        <ul class="courseList">
          <li class="busstop" data-nid="00114298"><span class="stopName">相模大野駅北口</span><span class="depart">6:50</span></li>
          <li class="busstop" data-nid="00114401"><span class="legMins">4分</span><span class="stopName">文化会館前</span></li>
          <li class="busstop" data-nid="00114502"><span class="legMins">9分</span><span class="stopName">麻溝台</span></li>
          <li class="busstop" data-nid="00129119"><span class="legMins">8分</span><span class="stopName">北里大学病院・北里大学</span><span class="arrive">7:15</span></li>
          <li class="busstop" data-nid="00129200"><span class="legMins">6分</span><span class="stopName">相模原駅南口</span></li>
        </ul>
    "#;

    const COURSE_PAGE_NO_STAMP: &str = r#"
        <ul class="courseList">
          <li class="busstop" data-nid="00114298"><span class="stopName">相模大野駅北口</span></li>
          <li class="busstop" data-nid="00114401"><span class="legMins">4分</span></li>
          <li class="busstop" data-nid="00129119"><span class="legMins">9分</span></li>
        </ul>
    "#;

    #[test]
    fn course_links_are_keyed_by_day_type_and_time() {
        let links = course_links_in_page(OVERVIEW_PAGE);
        assert_eq!(links.len(), 3);
        assert_eq!(
            links[&(DayType::Weekday, "06:50".to_string())],
            "/dia/diagram/course/cs:0000803517-1/nid:00114298/dk:0/tm:0650"
        );
        assert!(links.contains_key(&(DayType::Saturday, "07:15".to_string())));
        assert!(links.contains_key(&(DayType::Holiday, "24:05".to_string())));
    }

    #[test]
    fn arrival_stamp_is_read_from_the_destination_node_only() {
        assert_eq!(arrival_stamp_minutes(COURSE_PAGE, "00129119"), Some(7 * 60 + 15));
        assert_eq!(arrival_stamp_minutes(COURSE_PAGE_NO_STAMP, "00129119"), None);
        assert_eq!(arrival_stamp_minutes(COURSE_PAGE, "99999999"), None);
    }

    #[test]
    fn segment_sum_stops_at_the_destination_node() {
        // 4 + 9 + 8, not including the onward leg to the loop terminus
        assert_eq!(segment_sum_minutes(COURSE_PAGE, "00129119"), Some(21));
        assert_eq!(segment_sum_minutes(COURSE_PAGE_NO_STAMP, "00129119"), Some(13));
        assert_eq!(segment_sum_minutes(COURSE_PAGE, "99999999"), None);
    }

    #[test]
    fn segment_sum_without_annotations_is_a_miss() {
        let page = r#"
            <ul>
              <li class="busstop" data-nid="00114298"></li>
              <li class="busstop" data-nid="00129119"></li>
            </ul>
        "#;
        assert_eq!(segment_sum_minutes(page, "00129119"), None);
    }

    #[test]
    fn clock_difference_wraps_past_midnight() {
        let depart = hhmm_to_minutes("24:05").unwrap();
        assert_eq!(depart, 1445);
        // 24:05 departure arriving 00:30
        assert_eq!(wrapped_diff_minutes(depart, 30), 25);
        // plain same-day diff
        assert_eq!(
            wrapped_diff_minutes(
                hhmm_to_minutes("06:50").unwrap(),
                hhmm_to_minutes("07:15").unwrap()
            ),
            25
        );
    }

    #[test]
    fn plausibility_window_is_inclusive() {
        assert!(!plausible(4));
        assert!(plausible(5));
        assert!(plausible(120));
        assert!(!plausible(121));
    }

    #[test]
    fn summary_path_swaps_the_segment_and_drops_the_tail() {
        assert_eq!(
            summary_path_for("/dia/diagram/timetable/cs:0000803517-1/nid:00114298/rt:0"),
            Some("/dia/diagram/summary/cs:0000803517-1/nid:00114298".to_string())
        );
        assert_eq!(summary_path_for("/dia/noriba/terminal?nid=00114298"), None);
    }

    #[test]
    fn summary_minutes_reads_the_approximate_figure() {
        let page = r#"<div class="summary">所要時間：約25分（道路状況により前後します）</div>"#;
        assert_eq!(summary_minutes(page), Some(25));
        assert_eq!(summary_minutes("<div>所要時間未掲載</div>"), None);
    }

    #[test]
    fn median_is_the_middle_value_or_the_rounded_mean_of_the_middle_pair() {
        assert_eq!(median(&[10, 20, 30]), Some(20));
        assert_eq!(median(&[10, 20]), Some(15));
        assert_eq!(median(&[20, 10, 30]), Some(20));
        assert_eq!(median(&[10, 21]), Some(16));
        assert_eq!(median(&[]), None);
    }
}
