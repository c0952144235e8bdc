// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use serde_derive::Deserialize;
use serde_derive::Serialize;
use std::collections::BTreeMap;

/// The three schedule variants a kanachu route publishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Weekday,
    Saturday,
    Holiday,
}

impl DayType {
    pub const ALL: [DayType; 3] = [DayType::Weekday, DayType::Saturday, DayType::Holiday];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "SAGAMI_ONO_TO_KITASATO")]
    SagamiOnoToKitasato,
    #[serde(rename = "KITASATO_TO_SAGAMI_ONO")]
    KitasatoToSagamiOno,
}

impl Direction {
    /// Keyword looked for in a search-row destination when a route number
    /// alone matches several timetables.
    pub fn destination_keyword(&self) -> &'static str {
        match self {
            Direction::SagamiOnoToKitasato => "北里",
            Direction::KitasatoToSagamiOno => "相模大野",
        }
    }
}

/// Hand-curated route entry. The print URL is only a last-known locator; the
/// resolver confirms or replaces it on every run.
#[derive(Clone, Debug)]
pub struct RouteDefinition {
    pub id: &'static str,
    pub direction: Direction,
    pub route_no: &'static str,
    pub from_stop: &'static str,
    pub to_stop: &'static str,
    pub platform: &'static str,
    pub approx_duration_mins: u32,
    pub print_url: &'static str,
    /// Skip the per-departure detail pages and take the duration published on
    /// the route overview page instead.
    pub duration_from_overview: bool,
}

#[derive(Clone, Debug)]
pub struct StopDefinition {
    pub key: &'static str,
    pub name: &'static str,
    pub nid: &'static str,
}

/// The (timetable cell, terminal) pair a print URL encodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedLocator {
    pub cid: String,
    pub nid: String,
}

/// A route whose locator parsed; input to the resolver.
#[derive(Clone, Debug)]
pub struct SeededRoute {
    pub def: &'static RouteDefinition,
    pub locator: ParsedLocator,
}

/// A route with a confirmed-current timetable path and print URL.
#[derive(Clone, Debug)]
pub struct ResolvedRoute {
    pub def: &'static RouteDefinition,
    pub locator: ParsedLocator,
    pub timetable_path: String,
    pub print_url: String,
}

/// One value per day type, serialized under the day-type key names the
/// display component expects.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerDayType<T> {
    pub weekday: T,
    pub saturday: T,
    pub holiday: T,
}

impl<T> PerDayType<T> {
    pub fn get(&self, day: DayType) -> &T {
        match day {
            DayType::Weekday => &self.weekday,
            DayType::Saturday => &self.saturday,
            DayType::Holiday => &self.holiday,
        }
    }

    pub fn get_mut(&mut self, day: DayType) -> &mut T {
        match day {
            DayType::Weekday => &mut self.weekday,
            DayType::Saturday => &mut self.saturday,
            DayType::Holiday => &mut self.holiday,
        }
    }
}

/// Sorted, deduplicated departure times per day type, as `HH:MM` strings.
/// Hour 24 marks a past-midnight service and is kept verbatim, so the
/// lexicographic order is also the service-day order.
pub type DayTypeSchedule = PerDayType<Vec<String>>;

/// Inferred minutes to the destination stop, keyed by departure time.
/// Partial by construction.
pub type DurationTable = PerDayType<BTreeMap<String, u32>>;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputMeta {
    pub generated_at: String,
    pub timezone: String,
    pub notes: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StopOut {
    pub name: String,
    pub nid: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceOut {
    pub print_url: String,
    pub final_url: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOut {
    pub id: String,
    pub direction: Direction,
    pub route_no: String,
    pub from_stop: String,
    pub to_stop: String,
    pub platform: String,
    /// Representative travel time: the median of the per-departure inferred
    /// durations, or the static estimate when none could be inferred.
    pub approx_duration_mins: u32,
    pub duration_by_time: DurationTable,
    pub timetable: DayTypeSchedule,
    pub source: SourceOut,
}

/// The sole durable artifact of a run, consumed by the display component.
#[derive(Clone, Debug, Serialize)]
pub struct OutputRecord {
    pub meta: OutputMeta,
    pub stops: BTreeMap<String, StopOut>,
    pub routes: Vec<RouteOut>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_route_uses_display_field_names() {
        let route = RouteOut {
            id: "S2K-O15".to_string(),
            direction: Direction::SagamiOnoToKitasato,
            route_no: "大15".to_string(),
            from_stop: "sagamiono".to_string(),
            to_stop: "kitasato".to_string(),
            platform: "1".to_string(),
            approx_duration_mins: 25,
            duration_by_time: DurationTable::default(),
            timetable: DayTypeSchedule::default(),
            source: SourceOut {
                print_url: "https://example.invalid/print".to_string(),
                final_url: "https://example.invalid/final".to_string(),
            },
        };

        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["routeNo"], "大15");
        assert_eq!(json["approxDurationMins"], 25);
        assert_eq!(json["direction"], "SAGAMI_ONO_TO_KITASATO");
        assert!(json["durationByTime"]["weekday"].is_object());
        assert!(json["timetable"]["holiday"].is_array());
        assert_eq!(json["source"]["printUrl"], "https://example.invalid/print");
    }
}
