pub use super::file_records::Entity as FileRecords;
pub use super::profiles::Entity as Profiles;
