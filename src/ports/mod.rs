pub mod catalog;
pub mod playlist;
pub mod records;
