//! Photo archiver
//!
//! Streams the photo directory into a `.tar.zst` archive and back out.
//! Archive layout:
//!
//! ```text
//! photos/<file_name>          check-item photos
//! photos/thumbs/<file_name>   thumbnails (optional)
//! ```
//!
//! The archiver reports per-file progress through a callback and produces
//! the [`PhotoManifest`] embedded in the snapshot: per-photo sizes and xxh3
//! checksums, total size, thumbnail flag. Writes are atomic (temp file, then
//! rename). Extraction refuses entries whose paths would escape the output
//! directory.

use crate::error::{BackupError, BackupResult};
use crate::snapshot::{PhotoEntry, PhotoManifest};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, Builder, Header};
use tracing::{debug, warn};

/// Archive paths within the photo bundle
mod paths {
    /// Root directory in the archive
    pub const ROOT: &str = "photos";
    /// Thumbnail directory in the archive
    pub const THUMBS: &str = "photos/thumbs";
}

/// Thumbnail subdirectory inside the photo directory on disk
const THUMBS_DIR: &str = "thumbs";

/// Per-file progress of an archive operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveProgress {
    /// Files processed so far
    pub processed: u64,
    /// Total files to process
    pub total: u64,
}

/// Compute xxh3 hash of data and return as hex string
pub fn xxh3_hex(data: &[u8]) -> String {
    use xxhash_rust::xxh3::xxh3_64;
    format!("{:016x}", xxh3_64(data))
}

/// Creates and extracts photo archives
pub struct PhotoArchiver {
    photos_root: PathBuf,
    compression_level: i32,
}

impl PhotoArchiver {
    /// Create an archiver over the given photo directory
    pub fn new(photos_root: impl Into<PathBuf>) -> Self {
        Self {
            photos_root: photos_root.into(),
            compression_level: 3,
        }
    }

    /// Override the zstd compression level (1-22)
    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// The photo directory this archiver reads from and restores into
    pub fn photos_root(&self) -> &Path {
        &self.photos_root
    }

    /// Build the manifest without writing an archive
    pub fn generate_manifest(&self, include_thumbnails: bool) -> BackupResult<PhotoManifest> {
        let photos = self.photo_files()?;
        let mut entries = Vec::with_capacity(photos.len());
        let mut total_bytes: u64 = 0;

        for path in &photos {
            let data = fs::read(path)?;
            total_bytes += data.len() as u64;
            entries.push(PhotoEntry {
                file_name: file_name_of(path)?,
                size_bytes: data.len() as u64,
                checksum: xxh3_hex(&data),
            });
        }

        Ok(PhotoManifest {
            total_photos: entries.len() as u64,
            total_size_mb: total_bytes as f64 / (1024.0 * 1024.0),
            photos: entries,
            includes_thumbnails: include_thumbnails && !self.thumb_files()?.is_empty(),
        })
    }

    /// Write the photo archive and return its manifest
    ///
    /// Atomic: either the complete archive lands at `output` or no file is
    /// left behind.
    pub fn create_archive(
        &self,
        output: &Path,
        include_thumbnails: bool,
        mut on_progress: impl FnMut(ArchiveProgress),
    ) -> BackupResult<PhotoManifest> {
        let photos = self.photo_files()?;
        let thumbs = if include_thumbnails {
            self.thumb_files()?
        } else {
            Vec::new()
        };
        let total = (photos.len() + thumbs.len()) as u64;

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let temp_path = output.with_extension("tmp");

        let result = self.write_archive(&photos, &thumbs, total, &temp_path, &mut on_progress);
        match result {
            Ok(manifest) => {
                fs::rename(&temp_path, output)?;
                debug!(path = %output.display(), files = total, "photo archive written");
                Ok(manifest)
            }
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                Err(e)
            }
        }
    }

    fn write_archive(
        &self,
        photos: &[PathBuf],
        thumbs: &[PathBuf],
        total: u64,
        path: &Path,
        on_progress: &mut impl FnMut(ArchiveProgress),
    ) -> BackupResult<PhotoManifest> {
        let file = File::create(path)?;
        let buf_writer = BufWriter::new(file);
        let zstd_writer = zstd::Encoder::new(buf_writer, self.compression_level)
            .map_err(|e| BackupError::compression(format!("zstd encoder: {}", e)))?;
        let zstd_writer = zstd_writer.auto_finish();
        let mut tar_builder = Builder::new(zstd_writer);

        let mut entries = Vec::with_capacity(photos.len());
        let mut total_bytes: u64 = 0;
        let mut processed: u64 = 0;

        for photo in photos {
            let name = file_name_of(photo)?;
            let data = fs::read(photo)?;
            total_bytes += data.len() as u64;
            entries.push(PhotoEntry {
                file_name: name.clone(),
                size_bytes: data.len() as u64,
                checksum: xxh3_hex(&data),
            });
            add_file(
                &mut tar_builder,
                &format!("{}/{}", paths::ROOT, name),
                &data,
            )?;
            processed += 1;
            on_progress(ArchiveProgress { processed, total });
        }

        for thumb in thumbs {
            let name = file_name_of(thumb)?;
            let data = fs::read(thumb)?;
            add_file(
                &mut tar_builder,
                &format!("{}/{}", paths::THUMBS, name),
                &data,
            )?;
            processed += 1;
            on_progress(ArchiveProgress { processed, total });
        }

        let zstd_writer = tar_builder
            .into_inner()
            .map_err(|e| BackupError::archive(format!("tar finish: {}", e)))?;
        drop(zstd_writer);

        Ok(PhotoManifest {
            total_photos: entries.len() as u64,
            total_size_mb: total_bytes as f64 / (1024.0 * 1024.0),
            photos: entries,
            includes_thumbnails: !thumbs.is_empty(),
        })
    }

    /// Extract an archive into `output_dir`, returning the file count
    ///
    /// Entry paths are validated before anything is written: absolute paths
    /// and `..` components are rejected, so a crafted archive cannot write
    /// outside the output directory.
    pub fn extract_archive(
        &self,
        archive_path: &Path,
        output_dir: &Path,
        mut on_progress: impl FnMut(ArchiveProgress),
    ) -> BackupResult<u64> {
        let file = File::open(archive_path)?;
        let buf_reader = BufReader::new(file);
        let decoder = zstd::Decoder::new(buf_reader)
            .map_err(|e| BackupError::compression(format!("zstd decode: {}", e)))?;
        let mut archive = Archive::new(decoder);

        fs::create_dir_all(output_dir)?;
        let prefix = format!("{}/", paths::ROOT);
        let mut extracted: u64 = 0;

        for entry in archive
            .entries()
            .map_err(|e| BackupError::archive(e.to_string()))?
        {
            let mut entry = entry.map_err(|e| BackupError::archive(e.to_string()))?;
            let entry_path = entry
                .path()
                .map_err(|e| BackupError::archive(e.to_string()))?
                .to_path_buf();

            let entry_str = entry_path.to_string_lossy().to_string();
            let Some(relative) = entry_str.strip_prefix(&prefix) else {
                warn!(entry = %entry_str, "skipping entry outside photos/ root");
                continue;
            };
            if relative.is_empty() {
                continue;
            }
            let relative = Path::new(relative);
            if !is_safe_relative(relative) {
                return Err(BackupError::archive(format!(
                    "archive entry escapes output directory: {}",
                    entry_str
                )));
            }

            let target = output_dir.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|e| BackupError::archive(format!("read {}: {}", entry_str, e)))?;
            let mut out = File::create(&target)?;
            out.write_all(&data)?;

            extracted += 1;
            on_progress(ArchiveProgress {
                processed: extracted,
                total: 0, // entry count unknown until the tar is fully read
            });
        }

        debug!(files = extracted, dir = %output_dir.display(), "photo archive extracted");
        Ok(extracted)
    }

    /// Photo files directly under the photo directory, sorted by name
    ///
    /// Sorting keeps archive contents and manifest order deterministic,
    /// which in turn keeps consecutive backups of unchanged photos
    /// byte-comparable.
    fn photo_files(&self) -> BackupResult<Vec<PathBuf>> {
        self.files_in(&self.photos_root)
    }

    /// Thumbnail files, sorted by name
    fn thumb_files(&self) -> BackupResult<Vec<PathBuf>> {
        self.files_in(&self.photos_root.join(THUMBS_DIR))
    }

    fn files_in(&self, dir: &Path) -> BackupResult<Vec<PathBuf>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Add one in-memory file to the tar archive
fn add_file<W: Write>(builder: &mut Builder<W>, path: &str, data: &[u8]) -> BackupResult<()> {
    let mut header = Header::new_gnu();
    header
        .set_path(path)
        .map_err(|e| BackupError::archive(format!("set path '{}': {}", path, e)))?;
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();

    builder
        .append(&header, data)
        .map_err(|e| BackupError::archive(format!("append '{}': {}", path, e)))?;
    Ok(())
}

fn file_name_of(path: &Path) -> BackupResult<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| BackupError::archive(format!("path has no file name: {}", path.display())))
}

fn is_safe_relative(path: &Path) -> bool {
    !path.is_absolute()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn seed_photos(root: &Path, names: &[&str], with_thumbs: bool) {
        fs::create_dir_all(root).unwrap();
        for name in names {
            fs::write(root.join(name), format!("jpeg-bytes-{}", name)).unwrap();
        }
        if with_thumbs {
            let thumbs = root.join(THUMBS_DIR);
            fs::create_dir_all(&thumbs).unwrap();
            for name in names {
                fs::write(thumbs.join(name), format!("thumb-{}", name)).unwrap();
            }
        }
    }

    #[test]
    fn test_manifest_of_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let archiver = PhotoArchiver::new(dir.path().join("nope"));
        let manifest = archiver.generate_manifest(true).unwrap();
        assert_eq!(manifest.total_photos, 0);
        assert!(!manifest.includes_thumbnails);
    }

    #[test]
    fn test_manifest_counts_and_checksums() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("photos");
        seed_photos(&root, &["a.jpg", "b.jpg"], false);

        let manifest = PhotoArchiver::new(&root).generate_manifest(false).unwrap();
        assert_eq!(manifest.total_photos, 2);
        assert_eq!(manifest.photos[0].file_name, "a.jpg");
        assert_eq!(manifest.photos[0].checksum, xxh3_hex(b"jpeg-bytes-a.jpg"));
    }

    #[test]
    fn test_archive_roundtrip() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("photos");
        seed_photos(&root, &["a.jpg", "b.jpg", "c.jpg"], true);

        let archive = dir.path().join("photos.tar.zst");
        let mut events = Vec::new();
        let manifest = PhotoArchiver::new(&root)
            .create_archive(&archive, true, |p| events.push(p))
            .unwrap();

        assert_eq!(manifest.total_photos, 3);
        assert!(manifest.includes_thumbnails);
        // 3 photos + 3 thumbnails, in-order progress up to the total.
        assert_eq!(events.len(), 6);
        assert_eq!(events.last().unwrap().processed, 6);
        assert!(archive.exists());
        assert!(!archive.with_extension("tmp").exists());

        let out = dir.path().join("restored");
        let extracted = PhotoArchiver::new(&root)
            .extract_archive(&archive, &out, |_| {})
            .unwrap();
        assert_eq!(extracted, 6);
        assert_eq!(
            fs::read(out.join("a.jpg")).unwrap(),
            b"jpeg-bytes-a.jpg".to_vec()
        );
        assert_eq!(
            fs::read(out.join("thumbs").join("a.jpg")).unwrap(),
            b"thumb-a.jpg".to_vec()
        );
    }

    #[test]
    fn test_thumbnails_excluded_when_not_requested() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("photos");
        seed_photos(&root, &["a.jpg"], true);

        let archive = dir.path().join("photos.tar.zst");
        let manifest = PhotoArchiver::new(&root)
            .create_archive(&archive, false, |_| {})
            .unwrap();
        assert!(!manifest.includes_thumbnails);

        let out = dir.path().join("restored");
        let extracted = PhotoArchiver::new(&root)
            .extract_archive(&archive, &out, |_| {})
            .unwrap();
        assert_eq!(extracted, 1);
        assert!(!out.join(THUMBS_DIR).exists());
    }

    #[test]
    fn test_empty_photo_directory_archives_cleanly() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("photos");
        fs::create_dir_all(&root).unwrap();

        let archive = dir.path().join("photos.tar.zst");
        let manifest = PhotoArchiver::new(&root)
            .create_archive(&archive, true, |_| {})
            .unwrap();
        assert_eq!(manifest.total_photos, 0);
        assert!(archive.exists());
    }

    #[test]
    fn test_path_escape_rejected() {
        assert!(!is_safe_relative(Path::new("../evil.jpg")));
        assert!(!is_safe_relative(Path::new("a/../../evil.jpg")));
        assert!(!is_safe_relative(Path::new("/etc/passwd")));
        assert!(is_safe_relative(Path::new("thumbs/a.jpg")));
    }
}
