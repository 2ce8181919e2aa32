//! Query repositories, one per warehouse table.

pub mod output_file_repo;

pub use output_file_repo::OutputFileRepo;
