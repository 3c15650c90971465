pub mod backup;
pub mod catalog;
pub mod models;
pub mod nutrition;
pub mod service;
pub mod storage;
pub mod store;
pub mod units;
