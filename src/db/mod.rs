// src/db/mod.rs
//
// Database module
//
// Provides connection pooling for the local reference database.

pub mod connection;

pub use connection::{create_connection_pool, get_connection, ConnectionPool, PooledConn};
