//! Database access: MySQL repositories, the connection registry, and the store traits
//! the reconciler is written against

pub mod connection;
pub mod mapping_repo;
pub mod registry;
pub mod store;
pub mod target_repo;

pub use connection::{init_pool, MySqlConnector};
pub use mapping_repo::MappingRepository;
pub use registry::ConnectionRegistry;
pub use store::{Connector, MappingStore, RowSink, TargetKey, TargetStore};
pub use target_repo::TargetRepository;
