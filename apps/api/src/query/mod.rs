pub mod fields;
pub mod filter;
pub mod pagination;
pub mod sql;
