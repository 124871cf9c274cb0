//! Fixed-size pagination for list output.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("\"{requested}\" is an invalid page number. Valid pages: 1/{total}")]
    OutOfRange { requested: String, total: usize },
}

/// Number of pages `len` items occupy. An empty list still has one (empty) page.
pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Select 1-based page `page` of `items`.
///
/// Every page except possibly the last has exactly `page_size` items.
pub fn page<T>(items: &[T], page_size: usize, page: usize) -> Result<&[T], PageError> {
    let size = page_size.max(1);
    let total = page_count(items.len(), size);
    if page == 0 || page > total {
        return Err(PageError::OutOfRange {
            requested: page.to_string(),
            total,
        });
    }
    let start = (page - 1) * size;
    let end = (start + size).min(items.len());
    Ok(&items[start.min(end)..end])
}

/// Parse a user-supplied page token and select that page.
pub fn page_from_token<'a, T>(
    items: &'a [T],
    page_size: usize,
    token: &str,
) -> Result<(&'a [T], usize), PageError> {
    let total = page_count(items.len(), page_size);
    let number = token
        .trim()
        .parse::<usize>()
        .map_err(|_| PageError::OutOfRange {
            requested: token.to_string(),
            total,
        })?;
    page(items, page_size, number).map(|p| (p, number))
}
