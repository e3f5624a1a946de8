pub mod account;
pub mod ttl_store;
