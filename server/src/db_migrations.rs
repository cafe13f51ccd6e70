use std::path::{Path, PathBuf};

use tracing::info;

const MIGRATIONS_DIR: &str = "migrations";

/// Locate `migrations/` whether the binary runs from the workspace root or the crate dir.
fn migrations_path() -> PathBuf {
    let from_workspace = Path::new("server").join(MIGRATIONS_DIR);
    if from_workspace.is_dir() {
        return from_workspace;
    }
    let from_manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join(MIGRATIONS_DIR);
    if from_manifest.is_dir() {
        return from_manifest;
    }
    PathBuf::from(MIGRATIONS_DIR)
}

pub async fn run(pool: &sqlx::PgPool) -> Result<(), sqlx_core::migrate::MigrateError> {
    let path = migrations_path();
    let migrator = sqlx_core::migrate::Migrator::new(path.as_path()).await?;
    info!(
        path = %path.display(),
        migrations = migrator.iter().count(),
        "applying database migrations"
    );
    migrator.run(pool).await
}
