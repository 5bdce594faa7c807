//! Local inventory: walk the static directory

use std::path::{Component, Path};

use walkdir::WalkDir;

use crate::error::{AssetError, Result};
use crate::types::LocalFileRecord;

/// MIME type for `path` from its extension, `None` when unknown
pub fn guess_content_type(path: &Path) -> Option<String> {
    mime_guess::from_path(path).first_raw().map(String::from)
}

/// Enumerate every regular file under `root`, in traversal order.
///
/// Keys are relative to `root` and always `/`-separated. Symlinks to files
/// are included; symlinked directories are not descended into.
pub fn scan_local(root: &Path) -> Result<Vec<LocalFileRecord>> {
    let root = std::fs::canonicalize(root)?;
    if !root.is_dir() {
        return Err(AssetError::InvalidInput(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut records = Vec::new();
    for entry in WalkDir::new(&root).follow_links(false) {
        let entry = entry?;
        let path = entry.path();

        let is_file = entry.file_type().is_file() || (entry.path_is_symlink() && path.is_file());
        if !is_file {
            continue;
        }

        let relative = path
            .strip_prefix(&root)
            .map_err(|e| AssetError::Internal(e.to_string()))?;

        records.push(LocalFileRecord {
            key: object_key(relative)?,
            path: path.to_path_buf(),
            content_type: guess_content_type(path),
        });
    }

    tracing::debug!("Found {} local files under {}", records.len(), root.display());
    Ok(records)
}

/// Join the components of a relative path with `/`
fn object_key(relative: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| {
                    AssetError::InvalidInput(format!(
                        "File name is not valid UTF-8: {}",
                        relative.display()
                    ))
                })?;
                parts.push(part);
            }
            Component::CurDir => {}
            _ => {
                return Err(AssetError::InvalidInput(format!(
                    "Unexpected path component in {}",
                    relative.display()
                )))
            }
        }
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_scan_nested_tree() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::create_dir_all(dir.path().join("js/vendor")).unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        fs::write(dir.path().join("css/style.css"), "body {}").unwrap();
        fs::write(dir.path().join("js/index.js"), "main()").unwrap();
        fs::write(dir.path().join("js/vendor/lib.js"), "lib()").unwrap();
        fs::write(dir.path().join("README"), "hi").unwrap();

        let records = scan_local(dir.path()).unwrap();
        let keys: HashSet<_> = records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(
            keys,
            HashSet::from(["css/style.css", "js/index.js", "js/vendor/lib.js", "README"])
        );

        for record in &records {
            assert!(record.path.is_absolute());
            assert!(record.path.is_file());
        }
    }

    #[test]
    fn test_content_types() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("style.css"), "").unwrap();
        fs::write(dir.path().join("page.html"), "").unwrap();
        fs::write(dir.path().join("blob.unknownext"), "").unwrap();

        let records = scan_local(dir.path()).unwrap();
        let lookup = |key: &str| {
            records
                .iter()
                .find(|r| r.key == key)
                .and_then(|r| r.content_type.clone())
        };
        assert_eq!(lookup("style.css").as_deref(), Some("text/css"));
        assert_eq!(lookup("page.html").as_deref(), Some("text/html"));
        assert_eq!(lookup("blob.unknownext"), None);
    }

    #[test]
    fn test_missing_root_fails() {
        let dir = tempdir().unwrap();
        let err = scan_local(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }

    #[test]
    fn test_file_root_fails() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            scan_local(&file),
            Err(AssetError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_dir() {
        let dir = tempdir().unwrap();
        assert!(scan_local(dir.path()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_name_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff.txt")), "x").unwrap();

        assert!(matches!(
            scan_local(dir.path()),
            Err(AssetError::InvalidInput(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks() {
        use std::os::unix::fs::symlink;

        let outside = tempdir().unwrap();
        fs::write(outside.path().join("f.css"), "body {}").unwrap();
        fs::create_dir(outside.path().join("sub")).unwrap();
        fs::write(outside.path().join("sub/inner.js"), "x").unwrap();

        let dir = tempdir().unwrap();
        symlink(outside.path().join("f.css"), dir.path().join("link.css")).unwrap();
        symlink(outside.path().join("sub"), dir.path().join("linkdir")).unwrap();

        let records = scan_local(dir.path()).unwrap();
        let found: Vec<_> = records
            .iter()
            .map(|r| (r.key.as_str(), r.content_type.as_deref()))
            .collect();
        assert_eq!(found, vec![("link.css", Some("text/css"))]);
    }
}
