/// Jobs returned per page of the job listing.
pub const JOBS_PER_PAGE: i64 = 4;
/// Applications returned per page of the admin application listing.
pub const APPLICATIONS_PER_PAGE: i64 = 10;

/// A 1-based page over a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub per_page: i64,
}

impl Page {
    /// Reads `page` from raw query pairs. Missing, non-numeric or non-positive
    /// values fall back to the first page.
    pub fn from_pairs(pairs: &[(String, String)], per_page: i64) -> Self {
        let number = pairs
            .iter()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.trim().parse::<i64>().ok())
            .filter(|n| *n >= 1)
            .unwrap_or(1);
        Page { number, per_page }
    }

    pub fn skip(&self) -> i64 {
        self.per_page.saturating_mul(self.number - 1)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}
