pub mod descriptor;
pub mod error;
pub mod executor;
pub mod sql;
pub mod types;

pub use descriptor::QueryDescriptor;
pub use error::QueryError;
pub use types::{Comparator, FieldFilter, Page, Pagination, PopulateSpec, SortDirection, SortKey};
