pub mod files;
pub mod upload;
