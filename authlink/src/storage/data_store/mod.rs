mod config;
mod types;

pub use config::{DataStoreKind, open_data_store};
pub use types::DataStore;
