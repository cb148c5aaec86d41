//! Nearby show search
//!
//! This example demonstrates:
//! - Searching an in-memory store around a point
//! - Narrowing by fee, category and feature
//! - Falling back when the store's remote search functions misbehave
//! - Talking to a PostgREST backend when `SHOWSCOUT_REST_URL` is set

use chrono::Utc;
use showscout::{
    SearchConfigBuilder, SearchFilter, SearchResponse, ShowSearcher,
    store::{
        FunctionBehaviour, InMemoryStore, RemoteFunction,
        test_data::{AUSTIN, sample_shows},
    },
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    showscout::init_logging(tracing::Level::INFO)?;

    let searcher = ShowSearcher::new(InMemoryStore::new(sample_shows(Utc::now())));

    println!("Shows within 25 miles of downtown Austin:");
    let response = searcher
        .search(&SearchFilter::near(AUSTIN).radius_miles(25.0))
        .await;
    print_response(&response);

    println!("\nCheap card shows with parking:");
    let filter = SearchFilter::near(AUSTIN)
        .max_fee(10.0)
        .category("Sports Cards")
        .feature("parking");
    print_response(&searcher.search(&filter).await);

    // The first two remote functions are broken; the search still answers.
    println!("\nSame search against a degraded store:");
    let degraded = InMemoryStore::new(sample_shows(Utc::now()))
        .with_function(RemoteFunction::NearbyInWindow, FunctionBehaviour::Unsupported)
        .with_function(
            RemoteFunction::NearbyFiltered,
            FunctionBehaviour::Fail("502 Bad Gateway".to_string()),
        );
    let config = SearchConfigBuilder::fast().build();
    let searcher = ShowSearcher::with_config(degraded, config);
    print_response(&searcher.search(&SearchFilter::near(AUSTIN)).await);

    if std::env::var("SHOWSCOUT_REST_URL").is_ok() {
        println!("\nLive search:");
        let live = ShowSearcher::from_env()?;
        print_response(&live.search(&SearchFilter::near(AUSTIN)).await);
    }

    Ok(())
}

fn print_response(response: &SearchResponse) {
    if let Some(error) = &response.error {
        println!("  search failed: {error}");
        return;
    }
    let page = &response.data;
    println!(
        "  {} of {} shows (page {}/{}) via {}",
        page.data.len(),
        page.total_count,
        page.current_page,
        page.total_pages,
        response.strategy.map_or("-", |s| s.name())
    );
    for show in &page.data {
        println!(
            "  - {} on {} ({:.1} mi, ${:.2})",
            show.title,
            show.start_date.format("%a %b %e"),
            show.distance_miles.unwrap_or_default(),
            show.fee_or_free()
        );
    }
}
