//! Per-terminal page crawling: the paginated のりば listing (which cell ids
//! currently map to which timetable paths) and the route-search listing
//! (which timetable paths a route number could mean).

use ahash::{AHashMap, AHashSet};
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::VecDeque;

use crate::error::PipelineError;
use crate::html_extract::extract_href_paths;
use crate::locator::cid_from_timetable_path;

/// cid -> currently valid timetable path, for one terminal.
pub type TerminalTimetableIndex = AHashMap<String, String>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemCandidate {
    pub path: String,
    pub destination: String,
}

/// route-number label -> candidate timetable paths, for one terminal.
/// Multiplicity is expected; disambiguation is the resolver's job.
pub type SystemIndex = AHashMap<String, Vec<SystemCandidate>>;

/// Both indexes for one nid, built once per run and shared read-only.
#[derive(Clone, Debug, Default)]
pub struct TerminalIndexes {
    pub timetable_by_cid: TerminalTimetableIndex,
    pub system_candidates: SystemIndex,
}

fn timetable_link_regex(nid: &str) -> Regex {
    Regex::new(&format!(
        r"^/dia/diagram/timetable/cs:\d+-\d+/nid:{nid}(?:/.*)?$"
    ))
    .unwrap()
}

fn pagination_link_regex(nid: &str) -> Regex {
    Regex::new(&format!(r"^/dia/noriba/terminal\?nid={nid}&pno=\d+$")).unwrap()
}

/// (cid, timetable path) pairs on one listing page, scoped to `nid`.
pub fn timetable_links_in_page(html: &str, nid: &str) -> Vec<(String, String)> {
    extract_href_paths(html, &timetable_link_regex(nid))
        .into_iter()
        .filter_map(|path| cid_from_timetable_path(&path).map(|cid| (cid, path)))
        .collect()
}

/// Further numbered pages of the same listing.
pub fn pagination_links_in_page(html: &str, nid: &str) -> Vec<String> {
    extract_href_paths(html, &pagination_link_regex(nid))
}

/// Breadth-first crawl of the terminal listing, explicit worklist plus
/// visited set. Converges regardless of page-link ordering or duplication;
/// any non-success page is fatal for the whole terminal.
pub async fn fetch_terminal_timetable_map(
    client: &reqwest::Client,
    nid: &str,
) -> Result<TerminalTimetableIndex, PipelineError> {
    let mut queue = VecDeque::from([format!("/dia/noriba/terminal?nid={nid}")]);
    let mut visited: AHashSet<String> = AHashSet::new();
    let mut index = TerminalTimetableIndex::new();

    while let Some(path) = queue.pop_front() {
        if !visited.insert(path.clone()) {
            continue;
        }

        let url = crate::full_url(&path);
        let response = client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(PipelineError::TerminalFetch {
                nid: nid.to_string(),
                url,
                status: response.status().as_u16(),
            });
        }
        let html = response.text().await?;

        for (cid, link) in timetable_links_in_page(&html, nid) {
            index.insert(cid, link);
        }

        for page in pagination_links_in_page(&html, nid) {
            if !visited.contains(&page) && !queue.contains(&page) {
                queue.push_back(page);
            }
        }
    }

    info!("nid {}: collected {} timetable cids", nid, index.len());
    Ok(index)
}

lazy_static! {
    static ref ROW_SELECTOR: Selector = Selector::parse("tr").unwrap();
    static ref LINK_SELECTOR: Selector = Selector::parse("a[href]").unwrap();
    static ref SYSTEM_CELL_SELECTOR: Selector = Selector::parse("td.system").unwrap();
    static ref DESTINATION_CELL_SELECTOR: Selector = Selector::parse("td.destination").unwrap();
}

fn cell_text(cell: scraper::ElementRef) -> String {
    cell.text()
        .collect::<String>()
        .replace('\u{a0}', " ")
        .trim()
        .to_string()
}

/// Best-effort scan of the search-results table. Rows without a timetable
/// link or a system label are skipped silently.
pub fn parse_search_rows(html: &str) -> SystemIndex {
    let document = Html::parse_document(html);
    let mut out = SystemIndex::new();

    for row in document.select(&ROW_SELECTOR) {
        let path = row
            .select(&LINK_SELECTOR)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| href.contains("/dia/diagram/timetable/"));
        let path = match path {
            Some(path) => path.to_string(),
            None => continue,
        };

        let system_no = match row.select(&SYSTEM_CELL_SELECTOR).next() {
            Some(cell) => cell_text(cell),
            None => continue,
        };
        if system_no.is_empty() {
            continue;
        }

        let destination = row
            .select(&DESTINATION_CELL_SELECTOR)
            .next()
            .map(cell_text)
            .unwrap_or_default();

        out.entry(system_no)
            .or_insert_with(Vec::new)
            .push(SystemCandidate { path, destination });
    }

    out
}

/// One GET of the terminal's route-search listing.
pub async fn fetch_system_index(
    client: &reqwest::Client,
    nid: &str,
) -> Result<SystemIndex, PipelineError> {
    let url = crate::full_url(&format!("/dia/diagram/search?t=0&nid={nid}"));
    let response = client.get(&url).send().await?;
    if !response.status().is_success() {
        return Err(PipelineError::TerminalFetch {
            nid: nid.to_string(),
            url,
            status: response.status().as_u16(),
        });
    }
    let html = response.text().await?;
    let index = parse_search_rows(&html);
    info!("nid {}: indexed {} system labels", nid, index.len());
    Ok(index)
}

/// Builds both per-terminal indexes; the two fetches are independent.
pub async fn build_terminal_indexes(
    client: &reqwest::Client,
    nid: &str,
) -> Result<TerminalIndexes, PipelineError> {
    let (timetable_by_cid, system_candidates) = futures::try_join!(
        fetch_terminal_timetable_map(client, nid),
        fetch_system_index(client, nid)
    )?;
    Ok(TerminalIndexes {
        timetable_by_cid,
        system_candidates,
    })
}
