use courtrank_shared::{MatchRecord, QuerySpec};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::store::DocumentStore;

/// Build the initial match list for a league, trusting the cache where the server agrees.
///
/// Returns up to two pages of the newest records (more when the cache holds
/// more and is still current). The result is newest first and contiguous in
/// the server ordering: newer server records, then the cached run, then any
/// older records the cache lost. Any read failure is returned as-is.
pub async fn fetch_league_matches<S>(
    store: &S,
    league_id: &str,
    page_size: usize,
) -> Result<Vec<MatchRecord>, StoreError>
where
    S: DocumentStore + ?Sized,
{
    let target = page_size * 2;

    let cached = store
        .read_from_cache(&QuerySpec::league_matches(league_id))
        .await?;

    let (Some(newest_cached), Some(oldest_cached)) = (cached.first(), cached.last()) else {
        info!(league_id, "no cached matches, reading {target} from server");
        let fresh = store
            .read_from_server(&QuerySpec::league_matches(league_id).limit(target))
            .await?;
        debug!(league_id, fetched = fresh.len(), "initial server read");
        return Ok(fresh.records);
    };
    let newest_key = newest_cached.sort_key();
    let oldest_key = oldest_cached.sort_key();

    let updates = store
        .read_from_server(
            &QuerySpec::league_matches(league_id)
                .end_before(newest_key)
                .limit(target),
        )
        .await?;

    if updates.len() >= target {
        info!(
            league_id,
            updates = updates.len(),
            cached = cached.len(),
            "cache superseded by newer server matches"
        );
        return Ok(updates.records);
    }

    let mut matches = updates.records;
    let update_count = matches.len();
    matches.extend(cached.records);

    let mut gap_count = 0;
    if matches.len() < target {
        let gap = store
            .read_from_server(
                &QuerySpec::league_matches(league_id)
                    .start_after(oldest_key)
                    .limit(target - matches.len()),
            )
            .await?;
        gap_count = gap.len();
        matches.extend(gap.records);
    }

    debug!(
        league_id,
        updates = update_count,
        gap_filled = gap_count,
        total = matches.len(),
        "reconciled cached matches with server"
    );
    Ok(matches)
}
