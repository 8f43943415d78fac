use serde::Serialize;

use crate::error::ServiceError;

/// Hard upper bound on page size, regardless of configuration.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Validated pagination window. Construct via [`PageRequest::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: u32,
    size: u32,
}

impl PageRequest {
    /// `number` is 1-based. Out-of-range values are rejected, never clamped.
    pub fn new(number: i64, size: i64) -> Result<Self, ServiceError> {
        if number < 1 || number > u32::MAX as i64 {
            return Err(ServiceError::Validation(
                "Invalid 'page' value. It must be a positive number.".to_string(),
            ));
        }
        if size < 1 || size > MAX_PAGE_SIZE as i64 {
            return Err(ServiceError::Validation(format!(
                "Invalid 'limit' value. It must be between 1 and {}.",
                MAX_PAGE_SIZE
            )));
        }
        Ok(Self {
            number: number as u32,
            size: size as u32,
        })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        (self.number as u64 - 1) * self.size as u64
    }
}

/// One page of an ordered result set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the full filtered set before pagination
    pub total_count: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        let size = request.size() as u64;
        let total_pages = total_count.div_ceil(size);
        Self {
            items,
            total_count,
            page: request.number(),
            limit: request.size(),
            total_pages,
            has_next_page: (request.number() as u64) < total_pages,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_windows() {
        assert!(PageRequest::new(0, 10).is_err());
        assert!(PageRequest::new(-3, 10).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(1, 51).is_err());
        assert!(PageRequest::new(1, 50).is_ok());
    }

    #[test]
    fn offset_is_zero_based() {
        let req = PageRequest::new(3, 20).unwrap();
        assert_eq!(req.offset(), 40);
    }

    #[test]
    fn page_metadata_reflects_totals() {
        let req = PageRequest::new(2, 2).unwrap();
        let page = Page::new(vec![3, 4], 6, req);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next_page);

        let last = Page::new(vec![5], 5, PageRequest::new(3, 2).unwrap());
        assert_eq!(last.total_pages, 3);
        assert!(!last.has_next_page);

        let empty: Page<u8> = Page::new(vec![], 0, PageRequest::new(1, 10).unwrap());
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
    }
}
