use std::{
    fs::{create_dir_all, File},
    path::Path,
};

/// Setup workspace directories if not exist.
pub fn setup_if_not_exists(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        trace!("Workspace does not exist, creating one..");

        create_dir_all(path)?;
    }

    debug!("Using workspace directory {}", path.to_string_lossy());

    Ok(())
}

/// Lock the workspace.
///
/// The lock file must be kept alive for the lifetime of the daemon. A second
/// daemon trying to lock the same workspace is rejected.
pub fn lock(path: &Path) -> super::runtime::Result<File> {
    use fs2::FileExt;

    let file = File::create(path.join("lock")).map_err(super::runtime::Error::Io)?;

    match file.try_lock_exclusive() {
        Ok(_) => Ok(file),
        Err(_) => Err(super::runtime::Error::WorkspaceInUse),
    }
}
