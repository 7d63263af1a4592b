/// Zero-based page index for a 1-based `page` of `limit` rows.
///
/// Returns `None` when the page starts past the largest offset a query can
/// carry; such a page is empty whatever the table holds.
pub fn page_index(page: u64, limit: u64) -> Option<u64> {
    let index = page.saturating_sub(1);
    index
        .checked_mul(limit)
        .filter(|offset| *offset <= i64::MAX as u64)
        .map(|_| index)
}
