pub use artifact_unzip_core::{contract, error, notification, params, storage_keys};
