/// Factory: build the directory adapter from `DirectorySettings`.
use std::sync::Arc;

use crate::config::DirectorySettings;
use crate::services::directory::client::{DirectoryClient, DirectoryError};
use crate::services::directory::fixture::FixtureDirectory;

pub async fn build_directory_client(
    settings: &DirectorySettings,
) -> Result<Arc<dyn DirectoryClient>, DirectoryError> {
    let path = settings.url.to_file_path().map_err(|_| {
        DirectoryError::Unavailable(format!("unsupported directory url: {}", settings.url))
    })?;

    let directory = FixtureDirectory::load(&path, &settings.base_dn, &settings.credentials).await?;
    tracing::info!(
        backend = directory.backend_name(),
        base_dn = %settings.base_dn,
        "directory adapter ready"
    );

    Ok(Arc::new(directory))
}
