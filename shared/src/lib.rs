pub mod matches;
pub mod query;
pub mod validation;

pub use matches::*;
pub use query::{MatchQueryParams, QueryParamsError, QuerySpec};
pub use validation::ValidationReport;
