//! Capability-based file access.

use std::io::{self, Read};

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};

/// Read a UTF-8 file using ambient authority.
pub(crate) fn read_to_string(path: &Utf8Path) -> io::Result<String> {
    let mut file = fs_utf8::File::open_ambient(path, ambient_authority())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Whether `path` names an existing regular file.
///
/// # Errors
/// Returns the underlying I/O error, including [`io::ErrorKind::NotFound`]
/// when the file or its parent directory is missing.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.metadata(name).map(|meta| meta.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::rstest;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf())
            .unwrap_or_else(|path| panic!("non-UTF-8 temp path {path:?}"))
    }

    #[rstest]
    fn distinguishes_files_from_directories() {
        let dir = tempfile::tempdir().unwrap_or_else(|err| panic!("temp dir: {err}"));
        let root = utf8(dir.path());
        let file = root.join("workers.json");
        std::fs::write(&file, "[]").unwrap_or_else(|err| panic!("write: {err}"));

        assert!(matches!(file_is_file(&file), Ok(true)));
        assert!(matches!(file_is_file(&root), Ok(false)));
        assert_eq!(read_to_string(&file).ok().as_deref(), Some("[]"));
    }

    #[rstest]
    fn missing_files_report_not_found() {
        let dir = tempfile::tempdir().unwrap_or_else(|err| panic!("temp dir: {err}"));
        let missing = utf8(dir.path()).join("jobs.json");
        let err = file_is_file(&missing).err();
        assert_eq!(err.map(|err| err.kind()), Some(io::ErrorKind::NotFound));
    }
}
