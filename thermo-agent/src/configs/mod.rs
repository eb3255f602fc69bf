use std::path::PathBuf;
use std::{env, io};

pub mod settings;

pub use settings::Settings;

/// Resolve a relative path against the current working directory.
pub fn normalize_path(path: &str) -> io::Result<PathBuf> {
    let path_buf = PathBuf::from(path);

    Ok(if path_buf.is_absolute() {
        path_buf
    } else {
        env::current_dir()?.join(path_buf)
    })
}
