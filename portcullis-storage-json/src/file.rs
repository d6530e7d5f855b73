//! Whole-file JSON reads and atomic writes.
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use portcullis_core::{Error, error::StorageError};
use serde_json::{Map, Value};

/// Read `path` as a JSON object.
///
/// A missing file is `Ok(None)`. Anything that is not a JSON object is
/// [`StorageError::Malformed`].
pub(crate) async fn read_object(path: &Path) -> Result<Option<Map<String, Value>>, Error> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StorageError::Unreadable(format!("{}: {e}", path.display())).into());
        }
    };

    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err(StorageError::Malformed(format!(
            "{}: top-level value is not an object",
            path.display()
        ))
        .into()),
        Err(e) => Err(StorageError::Malformed(format!("{}: {e}", path.display())).into()),
    }
}

/// Replace `path` with `contents`, writing to a sibling temp file first.
pub(crate) async fn write_atomic(path: &Path, contents: &str) -> Result<(), Error> {
    let tmp_path = temp_path(path);

    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| StorageError::Write(format!("{}: {e}", tmp_path.display())))?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        tokio::fs::remove_file(&tmp_path).await.ok();
        return Err(StorageError::Write(format!(
            "failed to rename {} -> {}: {e}",
            tmp_path.display(),
            path.display()
        ))
        .into());
    }

    Ok(())
}

/// Create the parent directory of `path` if it has one.
pub(crate) async fn ensure_parent(path: &Path) -> Result<(), Error> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::Write(format!("{}: {e}", parent.display())).into()),
        _ => Ok(()),
    }
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A sibling of `path` unique to this process and call.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(
        ".{}.{}.tmp",
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(
            read_object(&dir.path().join("absent.json"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_non_object_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        tokio::fs::write(&path, "[1, 2]").await.unwrap();

        let err = read_object(&path).await.unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        tokio::fs::write(&path, "old").await.unwrap();

        write_atomic(&path, "{}").await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "{}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_temp_paths_are_unique() {
        let path = Path::new("/var/lib/portcullis/login-failures.json");
        let first = temp_path(path);
        let second = temp_path(path);

        assert_ne!(first, second);
        assert_eq!(first.parent(), path.parent());
        assert!(first.to_string_lossy().ends_with(".tmp"));
    }

    #[tokio::test]
    async fn test_concurrent_writers_do_not_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let writers: Vec<_> = (0..16)
            .map(|i| {
                let path = path.clone();
                tokio::spawn(async move {
                    let padding = "x".repeat(4096);
                    let contents = format!(r#"{{"writer": {i}, "padding": "{padding}"}}"#);
                    write_atomic(&path, &contents).await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        assert!(read_object(&path).await.unwrap().is_some());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("data.json");

        let err = write_atomic(&path, "{}").await.unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Write(_))));
    }
}
