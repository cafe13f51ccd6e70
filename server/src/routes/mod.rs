pub mod api;
pub mod matches;
