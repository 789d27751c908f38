pub mod awards;
pub mod calendar;
pub mod convert;
pub mod filter;
pub mod ingest;
pub mod review;
pub mod validate;
