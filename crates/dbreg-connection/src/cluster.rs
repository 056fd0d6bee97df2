//! Multi-node database client
//!
//! A `ClusterDatabase` spreads one logical database over several nodes. The
//! first node is the primary and receives every write; reads rotate over the
//! remaining nodes. Each node owns a `ConnectionPool`, so opening a cluster
//! never touches the network: connections appear on first use or on `ping`.
//!
//! `ClusterOpener` is the `DatabaseOpener` the registry uses by default. It
//! resolves the driver by name from a `DriverRegistry`.

mod database;
mod opener;


pub use database::ClusterDatabase;
pub use opener::ClusterOpener;
