// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

// Sakura refreshes the 相模大野 ⇄ 北里大学 timetable document: it
// re-resolves every route's print locator against the live kanachu pages,
// extracts the departure grids, infers travel durations, and writes
// timetables.json for the display. Either every route makes it or nothing
// is written; a half-refreshed timetable on the display is worse than a
// loud failure here.

use ahash::AHashMap;
use chrono::SecondsFormat;
use chrono::Utc;
use clap::Parser;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use kitanav::duration;
use kitanav::error;
use kitanav::error::{PipelineError, RouteFailure};
use kitanav::grid;
use kitanav::locator;
use kitanav::models::{OutputMeta, OutputRecord, RouteOut, SeededRoute, SourceOut, StopOut};
use kitanav::resolve::{self, SeedCidById};
use kitanav::routes::{ROUTES, STOPS, stop};
use kitanav::terminal_index::{TerminalIndexes, build_terminal_indexes};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Where the timetable document is written
    #[arg(long, default_value = "build/timetables.json")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    env_logger::init();
    let args = Args::parse();
    let client = kitanav::make_kanachu_client()?;

    let mut seeded: Vec<SeededRoute> = Vec::new();
    let mut failures: Vec<RouteFailure> = Vec::new();
    for def in ROUTES.iter() {
        match locator::parse_print_url(def.print_url) {
            Ok(parsed) => seeded.push(SeededRoute {
                def,
                locator: parsed,
            }),
            Err(error) => failures.push(RouteFailure::new(def, error)),
        }
    }

    let seed_cids: SeedCidById = seeded
        .iter()
        .map(|route| (route.def.id, route.locator.cid.clone()))
        .collect();

    // one crawl + one search fetch per distinct terminal, shared by every
    // route on that terminal; a terminal failure invalidates all of them,
    // so it aborts the run outright
    let mut indexes_by_nid: AHashMap<String, TerminalIndexes> = AHashMap::new();
    let nids: Vec<String> = seeded
        .iter()
        .map(|route| route.locator.nid.clone())
        .unique()
        .collect();
    for nid in nids {
        let indexes = build_terminal_indexes(&client, &nid).await?;
        indexes_by_nid.insert(nid, indexes);
    }

    let mut routes_out: Vec<RouteOut> = Vec::new();
    for route in &seeded {
        let indexes = indexes_by_nid
            .get(&route.locator.nid)
            .expect("indexes are built for every seeded nid");
        match run_route(&client, route, &seed_cids, indexes).await {
            Ok(out) => routes_out.push(out),
            Err(error) => failures.push(RouteFailure::new(route.def, error)),
        }
    }

    if !failures.is_empty() {
        eprint!("{}", error::render_failure_report(&failures, ROUTES.len()));
        std::process::exit(1);
    }

    let record = build_output(routes_out);
    write_output(&args.out, &record)?;
    println!("wrote {}", args.out.display());
    Ok(())
}

async fn run_route(
    client: &reqwest::Client,
    route: &SeededRoute,
    seed_cids: &SeedCidById,
    indexes: &TerminalIndexes,
) -> Result<RouteOut, PipelineError> {
    let resolved = resolve::resolve_route(client, route, seed_cids, indexes).await?;
    let page = resolve::fetch_print_page(client, &resolved.print_url).await?;
    let timetable = grid::parse_print_timetable(&page.html)?;

    let destination = stop(route.def.to_stop).expect("route table references known stops");
    let durations = duration::infer_durations(client, &resolved, destination.nid, &timetable).await;

    Ok(RouteOut {
        id: route.def.id.to_string(),
        direction: route.def.direction,
        route_no: route.def.route_no.to_string(),
        from_stop: route.def.from_stop.to_string(),
        to_stop: route.def.to_stop.to_string(),
        platform: route.def.platform.to_string(),
        approx_duration_mins: durations.representative,
        duration_by_time: durations.by_time,
        timetable,
        source: SourceOut {
            print_url: resolved.print_url.clone(),
            final_url: page.final_url,
        },
    })
}

fn build_output(routes: Vec<RouteOut>) -> OutputRecord {
    let generated_at = Utc::now()
        .with_timezone(&chrono_tz::Asia::Tokyo)
        .to_rfc3339_opts(SecondsFormat::Secs, false);

    let stops: BTreeMap<String, StopOut> = STOPS
        .iter()
        .map(|stop| {
            (
                stop.key.to_string(),
                StopOut {
                    name: stop.name.to_string(),
                    nid: stop.nid.to_string(),
                },
            )
        })
        .collect();

    OutputRecord {
        meta: OutputMeta {
            generated_at,
            timezone: "Asia/Tokyo".to_string(),
            notes: vec![
                "weekday=weekdays, saturday=Saturdays, holiday=Sundays/holidays".to_string(),
                "approxDurationMins is an estimated travel time in minutes.".to_string(),
                "durationByTime overrides approxDurationMins per departure where known."
                    .to_string(),
            ],
        },
        stops,
        routes,
    }
}

/// The presence of the output file is evidence of total success, so the
/// previous version is only ever replaced whole.
fn write_output(path: &Path, record: &OutputRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(record)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
