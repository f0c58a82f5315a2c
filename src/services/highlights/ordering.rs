use std::collections::HashSet;
use std::hash::Hash;

use super::types::ResolvedItem;

/// Sort by owner score (highest first), then owner band, then original
/// position, and move the record of the week to the front.
pub fn order_resolved_items(
    mut items: Vec<ResolvedItem>,
    record_of_the_week: &str,
) -> Vec<ResolvedItem> {
    items.sort_by(|a, b| {
        b.owner_score
            .cmp(&a.owner_score)
            .then_with(|| a.owner_band.cmp(&b.owner_band))
            .then_with(|| a.position.cmp(&b.position))
    });

    if record_of_the_week.trim().is_empty() {
        return items;
    }

    let (mut pinned, rest): (Vec<_>, Vec<_>) = items
        .into_iter()
        .partition(|item| item.owner_band == record_of_the_week);
    if pinned.is_empty() {
        log::debug!("record of the week {} has no resolved tracks", record_of_the_week);
    }
    pinned.extend(rest);
    pinned
}

/// Drop repeated values, keeping the first occurrence and the order.
pub fn dedup_preserving_order<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Final playlist order: ordered items reduced to unique track ids.
pub fn playlist_track_ids(items: Vec<ResolvedItem>, record_of_the_week: &str) -> Vec<String> {
    let ordered = order_resolved_items(items, record_of_the_week);
    dedup_preserving_order(ordered.into_iter().map(|item| item.track_id))
}
