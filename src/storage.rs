use std::io;
use std::path::{Path, PathBuf};
use tauri::{AppHandle, Manager, Runtime};

use crate::common::DatabaseSettings;
use crate::provision::ProvisionError;

fn path_result_to_str(result: &Result<PathBuf, ProvisionError>) -> String {
    match result {
        Ok(pb) => pb.to_str().unwrap_or("Non-UTF8 path").to_owned(),
        Err(e) => format!("Not available ({e})"),
    }
}

/// Joins the app-private database directory from the resolved app data dir.
pub fn database_dir_in(app_data_dir: &Path, settings: &DatabaseSettings) -> PathBuf {
    app_data_dir.join(&settings.database_dir)
}

pub fn database_dir<R: Runtime>(
    app: &AppHandle<R>,
    settings: &DatabaseSettings,
) -> Result<PathBuf, ProvisionError> {
    app.path()
        .app_data_dir()
        .map(|data_dir| database_dir_in(&data_dir, settings))
        .map_err(|e| ProvisionError::CreateFailed {
            path: PathBuf::from(&settings.database_dir),
            source: io::Error::other(e.to_string()),
        })
}

/// Creates `dir` if needed and returns the database file path inside it.
pub fn prepare_database_path_in(
    dir: &Path,
    settings: &DatabaseSettings,
) -> Result<PathBuf, ProvisionError> {
    std::fs::create_dir_all(dir).map_err(|source| ProvisionError::CreateFailed {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(dir.join(&settings.database_name))
}

pub fn prepare_database_path<R: Runtime>(
    app: &AppHandle<R>,
    settings: &DatabaseSettings,
) -> Result<PathBuf, ProvisionError> {
    let dir = database_dir(app, settings)?;
    prepare_database_path_in(&dir, settings)
}

fn describe_database_file(path: &Path) -> String {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => format!("present, {} bytes", meta.len()),
        Ok(_) => "blocked by a non-file entry".to_owned(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => "not installed".to_owned(),
        Err(e) => format!("unreadable ({e})"),
    }
}

pub fn debug_info<R: Runtime>(app: &AppHandle<R>, settings: &DatabaseSettings) -> String {
    let mut s = String::new();

    let db_dir = database_dir(app, settings);
    s.push_str("Directories:\n");
    s.push_str(&format!(
        "\tDatabases: {}\n",
        path_result_to_str(&db_dir)
    ));

    s.push_str("\nDatabase:\n");
    s.push_str(&format!("\tName: {}\n", settings.database_name));
    if let Ok(dir) = &db_dir {
        s.push_str(&format!(
            "\tFile: {}\n",
            describe_database_file(&dir.join(&settings.database_name))
        ));
    }

    s.push_str("\nOS:\n");
    s.push_str(&format!("\tPlatform: {}\n", tauri_plugin_os::platform()));
    s.push_str(&format!("\tArch: {}\n", tauri_plugin_os::arch()));
    s.push_str(&format!("\tVersion: {}\n", tauri_plugin_os::version()));

    let pck = app.package_info();
    s.push_str("\nPackage:\n");
    s.push_str(&format!("\tCrate: {}\n", pck.crate_name));
    s.push_str(&format!("\tVersion: {}\n", pck.version));

    log::debug!("Assembled storage report:\n{s}");
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn database_lives_below_databases_dir() {
        let dir = database_dir_in(Path::new("/data/user/0/app"), &DatabaseSettings::default());
        assert_eq!(dir, PathBuf::from("/data/user/0/app/databases"));
    }

    #[test]
    fn prepare_creates_missing_directories() {
        let root = tempdir().unwrap();
        let settings = DatabaseSettings::default();
        let dir = database_dir_in(&root.path().join("app"), &settings);

        let path = prepare_database_path_in(&dir, &settings).unwrap();

        assert!(dir.is_dir());
        assert_eq!(path, dir.join("foods.db"));
        assert!(!path.exists());
    }

    #[test]
    fn prepare_fails_when_a_file_blocks_the_directory() {
        let root = tempdir().unwrap();
        let blocker = root.path().join("databases");
        fs::write(&blocker, b"").unwrap();

        let err = prepare_database_path_in(&blocker, &DatabaseSettings::default()).unwrap_err();

        assert!(matches!(err, ProvisionError::CreateFailed { .. }));
    }

    #[test]
    fn describes_file_state() {
        let root = tempdir().unwrap();
        let db = root.path().join("foods.db");
        assert_eq!(describe_database_file(&db), "not installed");

        fs::write(&db, [1, 2, 3]).unwrap();
        assert_eq!(describe_database_file(&db), "present, 3 bytes");

        assert_eq!(describe_database_file(root.path()), "blocked by a non-file entry");
    }

    #[test]
    fn unresolved_path_is_reported_inline() {
        let err: Result<PathBuf, ProvisionError> = Err(ProvisionError::CreateFailed {
            path: PathBuf::from("databases"),
            source: io::Error::other("no data dir"),
        });
        assert!(path_result_to_str(&err).starts_with("Not available (could not create"));
    }
}
