use serde::{Deserialize, Serialize};

/// One page of results plus the counters a pager needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    /// `last_page` is `ceil(total / per_page)`, or 0 for a zero page size
    pub fn new(data: Vec<T>, total: u64, current_page: u64, per_page: u64) -> Self {
        let last_page = if per_page == 0 { 0 } else { total.div_ceil(per_page) };

        Self {
            total,
            per_page,
            current_page,
            last_page,
            data,
        }
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
