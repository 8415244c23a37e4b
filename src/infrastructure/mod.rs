//! Adapters behind the domain ports: storage backends and the checkout-session lookup.

pub mod checkout;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod seed;
