use std::sync::Arc;

use ctfserver_core::ServerConfig;
use ctfserver_ops::{UploadStore, UploadValidator, UploadsLister};
use ctfserver_scan::TreeBuilder;

/// Shared, read-only handles every handler needs.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub tree_builder: TreeBuilder,
    pub validator: UploadValidator,
    pub store: UploadStore,
    pub lister: UploadsLister,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            tree_builder: TreeBuilder::new(config.tree_config()),
            validator: UploadValidator::new(config.max_upload_size),
            store: UploadStore::new(&config.upload_dir, config.max_upload_size),
            lister: UploadsLister::new(&config.upload_dir),
            config: Arc::new(config),
        }
    }
}
