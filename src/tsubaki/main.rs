// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

// Tsubaki is the locator-maintenance half of sakura: it re-resolves every
// route's print URL and validates that the result actually serves a page,
// then prints an old -> new report so the hand-curated table in routes.rs
// can be updated. No timetable parsing, no output file.

use ahash::AHashMap;
use itertools::Itertools;
use std::error::Error;

use kitanav::error;
use kitanav::error::RouteFailure;
use kitanav::locator;
use kitanav::models::SeededRoute;
use kitanav::resolve::{self, SeedCidById};
use kitanav::routes::ROUTES;
use kitanav::terminal_index::{TerminalIndexes, build_terminal_indexes};

struct RefreshedRoute {
    id: &'static str,
    old_print_url: &'static str,
    new_print_url: String,
    final_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    env_logger::init();
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

    let mut refreshed: Vec<RefreshedRoute> = Vec::new();
    for route in &seeded {
        let indexes = indexes_by_nid
            .get(&route.locator.nid)
            .expect("indexes are built for every seeded nid");

        let outcome = async {
            let resolved = resolve::resolve_route(&client, route, &seed_cids, indexes).await?;
            let page = resolve::fetch_print_page(&client, &resolved.print_url).await?;
            Ok::<(String, String), kitanav::error::PipelineError>((
                resolved.print_url,
                page.final_url,
            ))
        }
        .await;

        match outcome {
            Ok((new_print_url, final_url)) => refreshed.push(RefreshedRoute {
                id: route.def.id,
                old_print_url: route.def.print_url,
                new_print_url,
                final_url,
            }),
            Err(error) => failures.push(RouteFailure::new(route.def, error)),
        }
    }

    if !failures.is_empty() {
        eprint!("{}", error::render_failure_report(&failures, ROUTES.len()));
        std::process::exit(1);
    }

    println!("refreshed {} print urls", refreshed.len());
    for route in &refreshed {
        println!("{}", route.id);
        println!("  old: {}", route.old_print_url);
        println!("  new: {}", route.new_print_url);
        println!("  final: {}", route.final_url);
    }
    let stale = refreshed
        .iter()
        .filter(|route| route.new_print_url != route.old_print_url)
        .count();
    if stale > 0 {
        println!("{stale} entries changed; update routes.rs accordingly");
    }
    Ok(())
}
