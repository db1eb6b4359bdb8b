mod files;

pub use files::{JsonStore, list_json_files, read_json, read_text};
