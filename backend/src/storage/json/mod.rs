//! File-backed JSON storage: one `<key>.json` file per storage key.

pub mod connection;
pub mod key_value_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::JsonConnection;
pub use key_value_repository::FileKeyValueRepository;
