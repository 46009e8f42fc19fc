use crate::error::Result;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};

use super::constants::DEFAULT_BUFFER_SIZE;

/// Output file that only appears at its destination once committed.
///
/// Writes go to a temporary file next to the target. Dropping the value
/// without calling [`AtomicOutput::commit`] removes the temporary file and
/// leaves any existing target untouched.
pub struct AtomicOutput {
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl AtomicOutput {
    pub fn create(target: &Path) -> Result<Self> {
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let temp = temp_builder().tempfile_in(&parent)?;
        Ok(Self {
            target: target.to_path_buf(),
            writer: BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, temp),
        })
    }

    /// Flush and move the temporary file onto the target path
    pub fn commit(self) -> Result<()> {
        let temp = self.writer.into_inner().map_err(|e| e.into_error())?;
        temp.persist(&self.target).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Temp files default to 0600; ask for 0666 so the committed file ends up
/// with the same umask-derived mode as one created with `File::create`
#[cfg(unix)]
fn temp_builder() -> Builder<'static, 'static> {
    use std::os::unix::fs::PermissionsExt;

    let mut builder = Builder::new();
    builder.permissions(std::fs::Permissions::from_mode(0o666));
    builder
}

#[cfg(not(unix))]
fn temp_builder() -> Builder<'static, 'static> {
    Builder::new()
}

impl Write for AtomicOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}
