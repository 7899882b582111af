//! IO utilities.

use std::io::Write;
use std::path::Path;

use crate::error::{with_err_context, ErrorContext, Result};

pub fn create_file(path: impl AsRef<Path>) -> Result<std::fs::File> {
    let path = path.as_ref();
    let file = with_err_context(std::fs::File::create(path), || {
        ErrorContext::CreateFile(path.to_path_buf())
    })?;
    Ok(file)
}

pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let data = with_err_context(std::fs::read_to_string(path), || {
        ErrorContext::ReadFile(path.to_path_buf())
    })?;
    Ok(data)
}

/// Writes `data` to a new file at `path`, flushing before the file is closed.
pub fn write_file(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let mut file = std::io::BufWriter::new(create_file(path)?);
    with_err_context(file.write_all(data).and_then(|_| file.flush()), || {
        ErrorContext::CreateFile(path.to_path_buf())
    })?;
    Ok(())
}
