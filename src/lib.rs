pub mod atomic;
pub mod config;
pub mod store;
