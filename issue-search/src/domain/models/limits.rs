pub const DEFAULT_PAGE_SIZE: u32 = 25;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const FACET_PAGE_SIZE: u32 = 500;
pub const MAX_FACET_SCAN: u32 = 2000;

/// Bounds applied to every search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Page size used when a request does not specify one
    pub default_page_size: u32,
    /// Upper clamp for the caller's page size
    pub max_page_size: u32,
    /// Page size for the facet scan
    pub facet_page_size: u32,
    /// Hard cap on records scanned while computing facets
    pub max_facet_scan: u32,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            facet_page_size: FACET_PAGE_SIZE,
            max_facet_scan: MAX_FACET_SCAN,
        }
    }
}
