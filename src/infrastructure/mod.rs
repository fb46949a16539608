pub mod cache;
pub mod database;
pub mod events;
pub mod storage;
