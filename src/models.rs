pub mod award;
pub mod collection;
