//! Adapters behind the domain ports: storage backends, the deposit
//! verifier and address provider stand-ins, and notification sinks.

pub mod address;
pub mod in_memory;
pub mod notify;
pub mod verifier;

#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
