pub mod highlights;
pub mod playlist;
pub mod records_file;
pub mod spotify;
