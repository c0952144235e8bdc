use thiserror::Error;

use crate::models::RouteDefinition;

/// Everything that can sink a route (or a whole terminal) during a refresh
/// run. Duration-inference misses are deliberately absent: those degrade
/// instead of failing.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot parse cs/nid from print url: {url}")]
    MalformedLocator { url: String },

    #[error("failed to fetch terminal page for nid {nid}: {url} (status={status})")]
    TerminalFetch {
        nid: String,
        url: String,
        status: u16,
    },

    #[error("failed to fetch timetable page: {url} (status={status})")]
    TimetableFetch { url: String, status: u16 },

    #[error("no unique timetable candidate for cid {cid} on nid {nid} ({candidates} candidates)")]
    UnresolvedRoute {
        cid: String,
        nid: String,
        candidates: usize,
    },

    #[error("printdate link not found in timetable page: {path}")]
    MissingPrintLink { path: String },

    #[error("print page unavailable (status={status}, finalUrl={final_url})")]
    DeadLocator { status: u16, final_url: String },

    #[error("timetable rows not found in print page")]
    EmptyTimetable,

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// One line of the end-of-run failure report. Failures are collected per
/// route so a single run can report every broken route at once.
#[derive(Debug)]
pub struct RouteFailure {
    pub id: &'static str,
    pub route_no: &'static str,
    pub print_url: &'static str,
    pub message: String,
}

impl RouteFailure {
    pub fn new(def: &'static RouteDefinition, error: PipelineError) -> RouteFailure {
        RouteFailure {
            id: def.id,
            route_no: def.route_no,
            print_url: def.print_url,
            message: error.to_string(),
        }
    }
}

/// Renders the end-of-run report enumerating every broken route. The run
/// exits non-zero right after printing this; no output file gets written.
pub fn render_failure_report(failures: &[RouteFailure], total_routes: usize) -> String {
    let mut report = format!(
        "failed to refresh {}/{} routes\n",
        failures.len(),
        total_routes
    );
    for failure in failures {
        report.push_str(&format!(
            "- {}({}): {}\n  printUrl={}\n",
            failure.id, failure.route_no, failure.message, failure.print_url
        ));
    }
    report
}
