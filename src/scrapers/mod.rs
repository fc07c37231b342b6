pub mod detail;
pub mod fetcher;
pub mod layout;
pub mod listing;
pub mod traits;
pub mod types;

pub use detail::{parse_detail_page, DetailLayout, DetailParse};
pub use fetcher::HttpFetcher;
pub use layout::{CompiledLayout, FieldRule, FieldSpec, ListingLayout};
pub use listing::parse_list_page;
pub use traits::PageFetcher;
pub use types::{FailurePolicy, PageRange};
