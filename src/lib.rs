// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::arc_with_non_send_sync,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_unit_value,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::bytes_nth,
    clippy::deprecated_clippy_cfg_attr,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::cmp_null,
    clippy::op_ref
)]

#[macro_use]
extern crate serde;

pub mod duration;
pub mod error;
pub mod grid;
pub mod html_extract;
pub mod locator;
pub mod models;
pub mod resolve;
pub mod routes;
pub mod terminal_index;

use std::time::Duration;

/// Every page the pipeline touches is anchored at this host.
pub const KANACHU_BASE: &str = "https://www.kanachu.co.jp";

/// A hung fetch counts as a fetch failure, so every request is bounded.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub fn full_url(path: &str) -> String {
    format!("{}{}", KANACHU_BASE, path)
}

/// Shared client for all kanachu fetches. Redirects are followed because the
/// site answers stale print locators with a redirect to its 404 landing page,
/// and the final URL is what gets inspected.
pub fn make_kanachu_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
}
