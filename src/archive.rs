//! Zipping of directory app bundles.
//!
//! iOS simulator builds are `.app` directories; the upload endpoint takes a
//! single file, so the directory is zipped next to itself first.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;

/// Errors raised while archiving a directory.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("cannot archive {}: path has no file name", .0.display())]
    NoFileName(PathBuf),

    #[error("failed to remove stale archive {}: {source}", path.display())]
    RemoveStale {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to write archive {}: {source}", path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("IO error while archiving: {0}")]
    Io(#[from] io::Error),

    #[error("archive task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Sibling archive path: `Foo.app` → `Foo.app.zip`.
pub fn archive_path_for(dir: &Path) -> Result<PathBuf, ArchiveError> {
    let name = dir
        .file_name()
        .ok_or_else(|| ArchiveError::NoFileName(dir.to_path_buf()))?;
    let mut archive_name = name.to_os_string();
    archive_name.push(".zip");
    Ok(dir.with_file_name(archive_name))
}

/// Zips `dir` into its sibling `.zip`, replacing any existing archive.
///
/// Entries are rooted at the directory name, so `Foo.app/Info.plist` unpacks
/// back into `Foo.app`. Unix permissions and symlinks are preserved.
pub fn zip_dir(dir: &Path) -> Result<PathBuf, ArchiveError> {
    let archive_path = archive_path_for(dir)?;
    let root = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ArchiveError::NoFileName(dir.to_path_buf()))?;

    info!("Zipping app directory {}", dir.display());

    match fs::remove_file(&archive_path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ArchiveError::RemoveStale {
                path: archive_path,
                source,
            });
        }
    }

    let zip_err = |source| ArchiveError::Zip {
        path: archive_path.clone(),
        source,
    };

    let mut zip = zip::ZipWriter::new(File::create(&archive_path)?);

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| ArchiveError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut name = root.clone();
        for component in relative.components() {
            name.push('/');
            name.push_str(&component.as_os_str().to_string_lossy());
        }

        let metadata = fs::symlink_metadata(entry.path())?;
        let options = entry_options(&metadata);

        if metadata.file_type().is_symlink() {
            let target = fs::read_link(entry.path())?;
            zip.add_symlink(name, target.to_string_lossy(), options)
                .map_err(zip_err)?;
        } else if metadata.is_dir() {
            zip.add_directory(name, options).map_err(zip_err)?;
        } else {
            zip.start_file(name, options).map_err(zip_err)?;
            let mut file = File::open(entry.path())?;
            io::copy(&mut file, &mut zip)?;
        }
    }

    zip.finish().map_err(zip_err)?;
    Ok(archive_path)
}

/// Runs [`zip_dir`] on the blocking thread pool.
pub async fn zip_dir_async(dir: PathBuf) -> Result<PathBuf, ArchiveError> {
    tokio::task::spawn_blocking(move || zip_dir(&dir)).await?
}

fn entry_options(metadata: &fs::Metadata) -> FileOptions {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        options.unix_permissions(metadata.permissions().mode() & 0o7777)
    }

    #[cfg(not(unix))]
    {
        let _ = metadata;
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn app_bundle(temp: &TempDir) -> PathBuf {
        let app = temp.path().join("Shop.app");
        fs::create_dir_all(app.join("Frameworks")).unwrap();
        fs::write(app.join("Info.plist"), "<plist/>").unwrap();
        fs::write(app.join("Frameworks").join("Lib.dylib"), "binary").unwrap();
        app
    }

    #[test]
    fn test_archive_path_for() {
        assert_eq!(
            archive_path_for(Path::new("/tmp/build/Shop.app")).unwrap(),
            PathBuf::from("/tmp/build/Shop.app.zip")
        );
        assert_eq!(
            archive_path_for(Path::new("/tmp/build/Shop.app/")).unwrap(),
            PathBuf::from("/tmp/build/Shop.app.zip")
        );
        assert!(archive_path_for(Path::new("/")).is_err());
    }

    #[test]
    fn test_zip_dir_roots_entries_at_directory_name() {
        let temp = TempDir::new().unwrap();
        let app = app_bundle(&temp);

        let archive_path = zip_dir(&app).unwrap();
        assert_eq!(archive_path, temp.path().join("Shop.app.zip"));

        let mut archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert!(names.iter().any(|n| n == "Shop.app/Info.plist"));
        assert!(names.iter().any(|n| n == "Shop.app/Frameworks/Lib.dylib"));

        let mut contents = String::new();
        archive
            .by_name("Shop.app/Info.plist")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "<plist/>");
    }

    #[test]
    fn test_zip_dir_replaces_existing_archive() {
        let temp = TempDir::new().unwrap();
        let app = app_bundle(&temp);
        fs::write(temp.path().join("Shop.app.zip"), "stale").unwrap();

        let archive_path = zip_dir(&app).unwrap();

        let archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        assert!(archive.len() >= 3);
    }

    #[tokio::test]
    async fn test_zip_dir_async() {
        let temp = TempDir::new().unwrap();
        let app = app_bundle(&temp);

        let archive_path = zip_dir_async(app).await.unwrap();
        assert!(archive_path.exists());
    }
}
