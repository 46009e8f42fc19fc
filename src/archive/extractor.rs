use crate::archive::ArchiveFormat;
use crate::error::{ProcessingError, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// Unpacks the toll data archive into a working directory
pub struct ArchiveExtractor {
    format: Option<ArchiveFormat>,
}

impl ArchiveExtractor {
    pub fn new() -> Self {
        Self { format: None }
    }

    /// Skip extension sniffing and treat every archive as `format`
    pub fn with_format(format: ArchiveFormat) -> Self {
        Self {
            format: Some(format),
        }
    }

    /// Unpack every member of `archive` into `destination`.
    ///
    /// The destination is created if missing. Members whose path would land
    /// outside of it are skipped. Returns the paths of the extracted files.
    pub fn unpack(&self, archive: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
        let format = self
            .format
            .or_else(|| ArchiveFormat::from_path(archive))
            .ok_or_else(|| ProcessingError::UnsupportedArchive(archive.to_path_buf()))?;

        std::fs::create_dir_all(destination)?;
        let file = BufReader::new(File::open(archive)?);

        let extracted = match format {
            ArchiveFormat::TarGz => unpack_tar(GzDecoder::new(file), destination)?,
            ArchiveFormat::Tar => unpack_tar(file, destination)?,
            ArchiveFormat::Zip => unpack_zip(file, destination)?,
        };

        info!(
            "Unpacked {} files from {} archive {} into {}",
            extracted.len(),
            format,
            archive.display(),
            destination.display()
        );
        Ok(extracted)
    }
}

impl Default for ArchiveExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn unpack_tar<R: Read>(reader: R, destination: &Path) -> Result<Vec<PathBuf>> {
    let mut archive = tar::Archive::new(reader);
    let mut extracted = Vec::new();

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let member = entry.path()?.into_owned();
        let is_file = entry.header().entry_type().is_file();

        if !entry.unpack_in(destination)? {
            warn!("Skipping archive member outside destination: {}", member.display());
            continue;
        }

        if is_file {
            debug!("Extracted {} ({} bytes)", member.display(), entry.size());
            extracted.push(destination.join(member));
        }
    }

    Ok(extracted)
}

fn unpack_zip<R: Read + std::io::Seek>(reader: R, destination: &Path) -> Result<Vec<PathBuf>> {
    let mut archive = ZipArchive::new(reader)?;
    let mut extracted = Vec::new();

    for i in 0..archive.len() {
        let mut zip_file = archive.by_index(i)?;

        let member = match zip_file.enclosed_name() {
            Some(name) => name.to_path_buf(),
            None => {
                warn!("Skipping archive member outside destination: {}", zip_file.name());
                continue;
            }
        };
        let dest_path = destination.join(&member);

        if zip_file.is_dir() {
            std::fs::create_dir_all(&dest_path)?;
            continue;
        }

        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&dest_path)?);
        std::io::copy(&mut zip_file, &mut writer)?;
        writer.flush()?;

        debug!("Extracted {} ({} bytes)", member.display(), zip_file.size());
        extracted.push(dest_path);
    }

    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::{NamedTempFile, TempDir};
    use zip::{CompressionMethod, ZipWriter};

    fn append_member<W: Write>(builder: &mut tar::Builder<W>, name: &str, data: &[u8]) -> Result<()> {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, data)?;
        Ok(())
    }

    fn create_test_tgz(dir: &Path) -> Result<PathBuf> {
        let path = dir.join("tolldata.tgz");
        let encoder = GzEncoder::new(File::create(&path)?, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        append_member(&mut builder, "vehicle-data.csv", b"1,Thu Aug 19 21:54:38 2021,125094,car,2,VC965\n")?;
        append_member(&mut builder, "tollplaza-data.tsv", b"1\tThu Aug 19 21:54:38 2021\t125094\tcar\t2\t4856\tPC7C042B7\n")?;
        append_member(&mut builder, "payment-data.txt", b"    1 Thu Aug 19 21:54:38 2021 125094  4856 PC7C042B7 PTE VC965\n")?;
        builder.into_inner()?.finish()?;
        Ok(path)
    }

    fn create_test_zip() -> Result<NamedTempFile> {
        let file = tempfile::Builder::new().suffix(".zip").tempfile()?;
        {
            let mut zip = ZipWriter::new(&file);
            let options =
                zip::write::FileOptions::default().compression_method(CompressionMethod::Stored);

            zip.start_file("nested/vehicle-data.csv", options)?;
            zip.write_all(b"1,Thu Aug 19 21:54:38 2021,125094,car,2,VC965\n")?;

            zip.start_file("../escape.txt", options)?;
            zip.write_all(b"should not be written")?;

            zip.finish()?;
        }
        Ok(file)
    }

    #[test]
    fn test_unpack_tgz() -> Result<()> {
        let dir = TempDir::new()?;
        let archive = create_test_tgz(dir.path())?;
        let destination = dir.path().join("out");

        let mut extracted = ArchiveExtractor::new().unpack(&archive, &destination)?;
        extracted.sort();

        assert_eq!(extracted.len(), 3);
        assert!(destination.join("payment-data.txt").exists());
        let vehicles = std::fs::read_to_string(destination.join("vehicle-data.csv"))?;
        assert!(vehicles.starts_with("1,Thu Aug 19"));
        Ok(())
    }

    #[test]
    fn test_unpack_zip_skips_escaping_members() -> Result<()> {
        let archive = create_test_zip()?;
        let dir = TempDir::new()?;
        let destination = dir.path().join("out");

        let extracted = ArchiveExtractor::new().unpack(archive.path(), &destination)?;

        assert_eq!(extracted, vec![destination.join("nested/vehicle-data.csv")]);
        assert!(!dir.path().join("escape.txt").exists());
        Ok(())
    }

    #[test]
    fn test_missing_archive_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = ArchiveExtractor::new().unpack(&dir.path().join("absent.tgz"), dir.path());
        assert!(matches!(result, Err(ProcessingError::Io(_))));
    }

    #[test]
    fn test_corrupt_archive_is_an_error() -> Result<()> {
        let dir = TempDir::new()?;
        let archive = dir.path().join("tolldata.tgz");
        std::fs::write(&archive, b"definitely not gzip")?;

        let result = ArchiveExtractor::new().unpack(&archive, &dir.path().join("out"));
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_unknown_extension_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let archive = dir.path().join("tolldata.rar");
        std::fs::write(&archive, b"")?;

        let result = ArchiveExtractor::new().unpack(&archive, dir.path());
        assert!(matches!(result, Err(ProcessingError::UnsupportedArchive(_))));
        Ok(())
    }

    #[test]
    fn test_explicit_format_overrides_extension() -> Result<()> {
        let dir = TempDir::new()?;
        let tgz = create_test_tgz(dir.path())?;
        let renamed = dir.path().join("tolldata.bin");
        std::fs::rename(&tgz, &renamed)?;

        let extracted = ArchiveExtractor::with_format(ArchiveFormat::TarGz)
            .unpack(&renamed, &dir.path().join("out"))?;
        assert_eq!(extracted.len(), 3);
        Ok(())
    }
}
