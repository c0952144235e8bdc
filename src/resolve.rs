//! Reconciles a route's last-known locator against the live site: direct
//! cell-id lookup first, then the route-number fallback with its two
//! narrowing strategies, then the hop to the current printable page.

use ahash::AHashMap;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;

use crate::error::PipelineError;
use crate::html_extract::extract_href_paths;
use crate::locator::cid_from_timetable_path;
use crate::models::{ResolvedRoute, SeededRoute};
use crate::terminal_index::{SystemCandidate, TerminalIndexes};

/// Seed cell ids of every route in the run, keyed by route id. Used by the
/// opposite-direction tie-break.
pub type SeedCidById = AHashMap<&'static str, String>;

lazy_static! {
    static ref SYSTEM_NO_REGEX: Regex = Regex::new(r"-([A-Z])(\d+)").unwrap();
    static ref PRINTDATE_REGEX: Regex =
        Regex::new(r"^/dia/diagram/printdate/cs:\d+-\d+/nid:\d+/chk:[^/]+/dts:\d+$").unwrap();
}

/// `S2K-O15` -> `大15`, `K2S-S25` -> `相25`. The site labels routes with a
/// kanji prefix that the id encodes as a single letter.
pub fn route_id_to_system_no(id: &str) -> Option<String> {
    let caps = SYSTEM_NO_REGEX.captures(id)?;
    let prefix = match &caps[1] {
        "O" => "大",
        "S" => "相",
        _ => return None,
    };
    Some(format!("{}{}", prefix, &caps[2]))
}

/// The same physical route in the other direction, if the id follows the
/// direction-prefix convention.
pub fn opposite_route_id(id: &str) -> Option<String> {
    if let Some(rest) = id.strip_prefix("S2K-") {
        Some(format!("K2S-{rest}"))
    } else if let Some(rest) = id.strip_prefix("K2S-") {
        Some(format!("S2K-{rest}"))
    } else {
        None
    }
}

/// Finds the timetable path for one route. Direct cid hit wins; otherwise
/// the system-number candidates are narrowed by destination keyword, then by
/// the opposite direction's seed cid, and only a unique survivor is
/// accepted. Each narrowing is kept only when it leaves something.
pub fn resolve_timetable_path(
    route: &SeededRoute,
    seed_cids: &SeedCidById,
    indexes: &TerminalIndexes,
) -> Result<String, PipelineError> {
    if let Some(path) = indexes.timetable_by_cid.get(&route.locator.cid) {
        return Ok(path.clone());
    }

    let empty: Vec<SystemCandidate> = Vec::new();
    let records = route_id_to_system_no(route.def.id)
        .and_then(|system_no| indexes.system_candidates.get(&system_no).cloned())
        .unwrap_or(empty);

    let mut candidates: Vec<&SystemCandidate> = records.iter().collect();

    if candidates.len() > 1 {
        let keyword = route.def.direction.destination_keyword();
        let narrowed: Vec<&SystemCandidate> = candidates
            .iter()
            .copied()
            .filter(|candidate| candidate.destination.contains(keyword))
            .collect();
        if !narrowed.is_empty() {
            candidates = narrowed;
        }
    }

    if candidates.len() > 1 {
        let opposite_cid = opposite_route_id(route.def.id)
            .and_then(|opposite| seed_cids.get(opposite.as_str()));
        if let Some(opposite_cid) = opposite_cid {
            // the two directions of one route number tend to sit in adjacent
            // listing cells, so the opposite seed cid identifies ours
            let narrowed: Vec<&SystemCandidate> = candidates
                .iter()
                .copied()
                .filter(|candidate| {
                    cid_from_timetable_path(&candidate.path).as_deref() == Some(opposite_cid)
                })
                .collect();
            if !narrowed.is_empty() {
                candidates = narrowed;
            }
        }
    }

    if candidates.len() == 1 {
        let path = candidates[0].path.clone();
        info!(
            "route {}: cid {} stale, resolved by system number -> {}",
            route.def.id, route.locator.cid, path
        );
        Ok(path)
    } else {
        Err(PipelineError::UnresolvedRoute {
            cid: route.locator.cid.clone(),
            nid: route.locator.nid.clone(),
            candidates: candidates.len(),
        })
    }
}

/// Follows a timetable path and pulls the current printable-page URL out of
/// it. The print link rotates with every diagram revision, which is the
/// whole reason this pipeline exists.
pub async fn fetch_print_url(
    client: &reqwest::Client,
    timetable_path: &str,
) -> Result<String, PipelineError> {
    let url = crate::full_url(timetable_path);
    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(PipelineError::TimetableFetch {
            url,
            status: response.status().as_u16(),
        });
    }
    let html = response.text().await?;

    match extract_href_paths(&html, &PRINTDATE_REGEX).into_iter().next() {
        Some(path) => Ok(crate::full_url(&path)),
        None => Err(PipelineError::MissingPrintLink {
            path: timetable_path.to_string(),
        }),
    }
}

/// Full resolution for one route: timetable path, then current print URL.
pub async fn resolve_route(
    client: &reqwest::Client,
    route: &SeededRoute,
    seed_cids: &SeedCidById,
    indexes: &TerminalIndexes,
) -> Result<ResolvedRoute, PipelineError> {
    let timetable_path = resolve_timetable_path(route, seed_cids, indexes)?;
    let print_url = fetch_print_url(client, &timetable_path).await?;
    Ok(ResolvedRoute {
        def: route.def,
        locator: route.locator.clone(),
        timetable_path,
        print_url,
    })
}

pub struct PrintPage {
    pub final_url: String,
    pub html: String,
}

/// Fetches the printable page, following redirects, and rejects dead ends:
/// non-success statuses and the site's 404 landing page both mean the
/// locator is no longer any good.
pub async fn fetch_print_page(
    client: &reqwest::Client,
    print_url: &str,
) -> Result<PrintPage, PipelineError> {
    let response = client.get(print_url).send().await?;
    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() || final_url.path() == "/404.html" {
        return Err(PipelineError::DeadLocator {
            status: status.as_u16(),
            final_url: final_url.to_string(),
        });
    }

    Ok(PrintPage {
        final_url: final_url.to_string(),
        html: response.text().await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, ParsedLocator, RouteDefinition};
    use crate::terminal_index::TerminalIndexes;

    static S2K_O15: RouteDefinition = RouteDefinition {
        id: "S2K-O15",
        direction: Direction::SagamiOnoToKitasato,
        route_no: "大15",
        from_stop: "sagamiono",
        to_stop: "kitasato",
        platform: "1",
        approx_duration_mins: 25,
        print_url: "https://www.kanachu.co.jp/dia/diagram/printdate/cs:0000803517-1/nid:00114298/chk:all/dts:1772215200",
        duration_from_overview: false,
    };

    fn seeded(def: &'static RouteDefinition, cid: &str, nid: &str) -> SeededRoute {
        SeededRoute {
            def,
            locator: ParsedLocator {
                cid: cid.to_string(),
                nid: nid.to_string(),
            },
        }
    }

    fn candidate(path: &str, destination: &str) -> SystemCandidate {
        SystemCandidate {
            path: path.to_string(),
            destination: destination.to_string(),
        }
    }

    #[test]
    fn system_numbers_follow_the_prefix_convention() {
        assert_eq!(route_id_to_system_no("S2K-O15"), Some("大15".to_string()));
        assert_eq!(route_id_to_system_no("K2S-S25"), Some("相25".to_string()));
        assert_eq!(route_id_to_system_no("K2S-X12"), None);
        assert_eq!(route_id_to_system_no("nonsense"), None);
    }

    #[test]
    fn opposite_ids_swap_the_direction_prefix() {
        assert_eq!(opposite_route_id("S2K-O15"), Some("K2S-O15".to_string()));
        assert_eq!(opposite_route_id("K2S-S25"), Some("S2K-S25".to_string()));
        assert_eq!(opposite_route_id("ABC-O15"), None);
    }

    #[test]
    fn direct_cid_hit_short_circuits_everything() {
        let route = seeded(&S2K_O15, "0000803517", "00114298");
        let mut indexes = TerminalIndexes::default();
        indexes.timetable_by_cid.insert(
            "0000803517".to_string(),
            "/dia/diagram/timetable/cs:0000803517-1/nid:00114298".to_string(),
        );

        let path = resolve_timetable_path(&route, &SeedCidById::new(), &indexes).unwrap();
        assert_eq!(path, "/dia/diagram/timetable/cs:0000803517-1/nid:00114298");
    }

    #[test]
    fn stale_cid_with_a_single_candidate_resolves_by_system_number() {
        let route = seeded(&S2K_O15, "0000000000", "00114298");
        let mut indexes = TerminalIndexes::default();
        indexes.system_candidates.insert(
            "大15".to_string(),
            vec![candidate(
                "/dia/diagram/timetable/cs:0000803600-1/nid:00114298",
                "北里大学病院・北里大学",
            )],
        );

        let path = resolve_timetable_path(&route, &SeedCidById::new(), &indexes).unwrap();
        assert_eq!(path, "/dia/diagram/timetable/cs:0000803600-1/nid:00114298");
    }

    #[test]
    fn destination_keyword_narrows_two_directions_of_one_route() {
        let route = seeded(&S2K_O15, "0000000000", "00114298");
        let mut indexes = TerminalIndexes::default();
        indexes.system_candidates.insert(
            "大15".to_string(),
            vec![
                candidate(
                    "/dia/diagram/timetable/cs:0000803600-1/nid:00114298",
                    "北里大学病院・北里大学",
                ),
                candidate(
                    "/dia/diagram/timetable/cs:0000803601-1/nid:00114298",
                    "相模大野駅北口",
                ),
            ],
        );

        let path = resolve_timetable_path(&route, &SeedCidById::new(), &indexes).unwrap();
        assert_eq!(path, "/dia/diagram/timetable/cs:0000803600-1/nid:00114298");
    }

    #[test]
    fn opposite_seed_cid_breaks_a_tie_the_keyword_cannot() {
        // two candidates both heading the right way; only one sits in the
        // cell the opposite direction's seed locator points at
        let route = seeded(&S2K_O15, "0000000000", "00114298");
        let mut indexes = TerminalIndexes::default();
        indexes.system_candidates.insert(
            "大15".to_string(),
            vec![
                candidate(
                    "/dia/diagram/timetable/cs:0000803600-1/nid:00114298",
                    "北里大学病院・北里大学",
                ),
                candidate(
                    "/dia/diagram/timetable/cs:0000803500-3/nid:00114298",
                    "北里大学病院・北里大学 急行",
                ),
            ],
        );

        let mut seed_cids = SeedCidById::new();
        seed_cids.insert("K2S-O15", "0000803500".to_string());

        let path = resolve_timetable_path(&route, &seed_cids, &indexes).unwrap();
        assert_eq!(path, "/dia/diagram/timetable/cs:0000803500-3/nid:00114298");
    }

    #[test]
    fn ambiguity_after_all_narrowing_is_a_resolution_failure() {
        let route = seeded(&S2K_O15, "0000000000", "00114298");
        let mut indexes = TerminalIndexes::default();
        indexes.system_candidates.insert(
            "大15".to_string(),
            vec![
                candidate(
                    "/dia/diagram/timetable/cs:0000803600-1/nid:00114298",
                    "北里大学病院・北里大学",
                ),
                candidate(
                    "/dia/diagram/timetable/cs:0000803601-1/nid:00114298",
                    "北里大学病院・北里大学 深夜",
                ),
            ],
        );

        let err =
            resolve_timetable_path(&route, &SeedCidById::new(), &indexes).unwrap_err();
        match err {
            PipelineError::UnresolvedRoute { candidates, .. } => assert_eq!(candidates, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_candidates_is_a_resolution_failure() {
        let route = seeded(&S2K_O15, "0000000000", "00114298");
        let indexes = TerminalIndexes::default();

        let err =
            resolve_timetable_path(&route, &SeedCidById::new(), &indexes).unwrap_err();
        match err {
            PipelineError::UnresolvedRoute { candidates, .. } => assert_eq!(candidates, 0),
            other => panic!("unexpected error: {other}"),
        }
    }
}
