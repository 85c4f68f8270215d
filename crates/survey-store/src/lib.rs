pub mod config;
pub mod error;
pub mod index_store;
pub mod lockfile;
pub mod memory;
pub mod outbox;
pub mod port;
pub mod query;
pub mod records;
pub mod repository;
pub mod service;
