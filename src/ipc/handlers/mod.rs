pub mod catalog;
pub mod core;
pub mod import;
pub mod overview;
