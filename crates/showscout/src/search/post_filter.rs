//! The filter pipeline every successful strategy's rows go through.
//!
//! Stages, in order: dedupe by id, status, temporal validity (not ended, and
//! overlapping the window), fee ceiling, categories (any), features (all),
//! radius. Then rows are sorted by start, ties broken by id.

use ahash::AHashSet as HashSet;
use chrono::{DateTime, Utc};
use showscout_store::ShowRecord;
use tracing::{debug, instrument};

use super::filter::ResolvedFilter;
use crate::resolve::{AddressCoordinateCache, resolve};

/// How many rows each stage removed. Logged once per search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub received: usize,
    pub duplicates: usize,
    pub status: usize,
    pub temporal: usize,
    pub fee: usize,
    pub category: usize,
    pub feature: usize,
    pub radius: usize,
    pub kept: usize,
}

/// Run the full pipeline over `rows`. `now` is the wall clock at call time.
#[instrument(name = "Post-filter", skip_all, fields(rows = rows.len()), level = "debug")]
pub fn apply(
    rows: Vec<ShowRecord>,
    filter: &ResolvedFilter,
    now: DateTime<Utc>,
) -> (Vec<ShowRecord>, PipelineStats) {
    let mut stats = PipelineStats {
        received: rows.len(),
        ..Default::default()
    };

    // Built from everything the strategy returned, before any stage drops rows.
    let cache = if filter.radius.is_active() {
        AddressCoordinateCache::build(&rows)
    } else {
        AddressCoordinateCache::new()
    };

    let mut seen = HashSet::with_capacity(rows.len());
    let before = rows.len();
    let rows: Vec<ShowRecord> = rows
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect();
    stats.duplicates = before - rows.len();

    let rows = retain(rows, &mut stats.status, |r| r.status == filter.status);
    let rows = retain(rows, &mut stats.temporal, |r| {
        r.end_date >= now && filter.window.overlaps(r.start_date, r.end_date)
    });
    let rows = retain(rows, &mut stats.fee, |r| {
        filter.max_fee.is_none_or(|max| r.fee_or_free() <= max)
    });
    let rows = retain(rows, &mut stats.category, |r| {
        filter.categories.is_empty() || r.in_any_category(filter.categories.as_slice())
    });
    let rows = retain(rows, &mut stats.feature, |r| {
        filter.features.iter().all(|f| r.has_feature(f))
    });

    let before = rows.len();
    let mut rows: Vec<ShowRecord> = rows
        .into_iter()
        .filter_map(|mut record| {
            let point = resolve(&record, &cache).map(|r| r.coordinate);
            if !filter.radius.admits(point) {
                return None;
            }
            record.distance_miles = filter.radius.distance(point);
            Some(record)
        })
        .collect();
    stats.radius = before - rows.len();

    rows.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));
    stats.kept = rows.len();

    debug!(?stats, cached_addresses = cache.len(), "Post-filter complete");
    (rows, stats)
}

fn retain(
    rows: Vec<ShowRecord>,
    dropped: &mut usize,
    keep: impl Fn(&ShowRecord) -> bool,
) -> Vec<ShowRecord> {
    let before = rows.len();
    let kept: Vec<ShowRecord> = rows.into_iter().filter(|r| keep(r)).collect();
    *dropped = before - kept.len();
    kept
}
