pub mod filters;
pub mod types;

pub use filters::{FilterKey, FilterSet, FilterSetError, PriceFilter};
pub use types::{FurnishedType, ListingType, ProjectStatus, PropertyRecord, RowId};
