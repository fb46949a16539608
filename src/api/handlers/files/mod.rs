pub mod download;
pub mod list;
pub mod manage;
pub mod types;
pub mod upload;

pub use types::*;

pub use download::download_file;
pub use list::{file_info, list_files};
pub use manage::delete_file;
pub use upload::{update_file, upload_file};
