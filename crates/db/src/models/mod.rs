pub mod output_file;
