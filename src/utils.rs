use crate::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::fs::ReadDir;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Write a file.
pub(crate) fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, contents)
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Write a file by first writing `contents` to a sibling temporary file and then renaming it over
/// `path`. Readers of `path` see either the old contents or the new contents, never a mix.
pub(crate) fn write_atomic(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .with_context(|| format!("Cannot write to a path without a file name: {}", path.display()))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));
    write(&tmp, contents)?;
    rename(&tmp, path)
}

/// Read a file to a `String`.
pub fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Deserialize a JSON file into type `T`.
pub fn deserialize<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = read(path)?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON file at {}", path.display()))
}

/// Basically move a file. Renames `from` -> `to`.
pub fn rename(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    std::fs::rename(from.as_ref(), to.as_ref()).with_context(|| {
        format!(
            "Unable to move file from '{}' to '{}'",
            from.as_ref().to_string_lossy(),
            to.as_ref().to_string_lossy()
        )
    })
}

/// Copy a file from `from` to `to`.
pub fn copy(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    std::fs::copy(from.as_ref(), to.as_ref())
        .map(|_| ())
        .with_context(|| {
            format!(
                "Unable to copy file from '{}' to '{}'",
                from.as_ref().to_string_lossy(),
                to.as_ref().to_string_lossy()
            )
        })
}

/// Remove a file.
pub fn remove(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    std::fs::remove_file(path).with_context(|| format!("Unable to remove {}", path.display()))
}

/// Create a directory and its parents. It is not an error if the directory already exists.
pub fn make_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match std::fs::create_dir_all(path) {
        Ok(_) => Ok(()),
        Err(e) => match e.kind() {
            ErrorKind::AlreadyExists => Ok(()),
            _ => Err(e).context(format!("Unable to create directory {}", path.display())),
        },
    }
}

pub fn canonicalize(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    std::fs::canonicalize(path)
        .with_context(|| format!("Unable to canonicalize the path {}", path.to_string_lossy()))
}

pub fn read_dir(path: impl AsRef<Path>) -> Result<ReadDir> {
    let path = path.as_ref();
    std::fs::read_dir(path).with_context(|| format!("Unable to read directory {}", path.display()))
}
