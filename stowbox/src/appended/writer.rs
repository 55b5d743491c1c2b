use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Datelike, Timelike, Utc};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::path::{archive_box_name, BoxPath};

fn dos_time(time: SystemTime) -> zip::DateTime {
    let datetime: DateTime<Utc> = time.into();
    u16::try_from(datetime.year())
        .ok()
        .and_then(|year| {
            zip::DateTime::from_date_and_time(
                year,
                datetime.month() as u8,
                datetime.day() as u8,
                datetime.hour() as u8,
                datetime.minute() as u8,
                datetime.second() as u8,
            )
            .ok()
        })
        .unwrap_or_default()
}

/// Writes boxes into a zip stream laid out the way [`AppendedRegistry`](super::AppendedRegistry) reads them.
///
/// The stream may already contain data (an executable); the archive is written
/// from the current position onward.
pub struct AppendWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    entries: usize,
}

impl<W: Write + Seek> AppendWriter<W> {
    pub fn new(inner: W) -> AppendWriter<W> {
        AppendWriter {
            zip: ZipWriter::new(inner),
            entries: 0,
        }
    }

    fn options(modified: SystemTime) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(dos_time(modified))
    }

    pub fn add_dir(&mut self, box_name: &str, path: &BoxPath, modified: SystemTime) -> Result<()> {
        let name = format!("{}/{}/", archive_box_name(box_name), path);
        self.zip.add_directory(name, Self::options(modified))?;
        self.entries += 1;
        Ok(())
    }

    pub fn add_file(
        &mut self,
        box_name: &str,
        path: &BoxPath,
        content: &[u8],
        modified: SystemTime,
    ) -> Result<()> {
        let name = format!("{}/{}", archive_box_name(box_name), path);
        self.zip.start_file(name, Self::options(modified))?;
        self.zip.write_all(content)?;
        self.entries += 1;
        Ok(())
    }

    /// Adds every file and directory below `dir` to the box `box_name`.
    pub fn add_tree<P: AsRef<Path>>(&mut self, box_name: &str, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::NotADirectory {
                path: dir.to_path_buf(),
            });
        }

        for entry in walkdir::WalkDir::new(dir)
            .min_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;
            let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
            let path = BoxPath::from_platform(relative).map_err(|source| Error::InvalidPath {
                path: relative.display().to_string(),
                source,
            })?;
            let meta = entry.metadata().map_err(std::io::Error::from)?;
            let modified = meta.modified().unwrap_or_else(|_| SystemTime::now());

            tracing::debug!(box_name, path = %path, "appending entry");

            if meta.is_dir() {
                self.add_dir(box_name, &path, modified)?;
            } else {
                let content = std::fs::read(entry.path())?;
                self.add_file(box_name, &path, &content, modified)?;
            }
        }

        Ok(())
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    pub fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}

/// Appends the given `(box name, directory)` pairs as a zip archive to the end
/// of the executable at `exe`. Returns the number of entries written.
///
/// On failure the executable is truncated back to its original length.
pub fn append_to_executable<P: AsRef<Path>>(exe: P, boxes: &[(String, PathBuf)]) -> Result<usize> {
    let mut file = OpenOptions::new().read(true).write(true).open(exe.as_ref())?;
    let original_len = file.seek(SeekFrom::End(0))?;

    match write_boxes(&mut file, boxes) {
        Ok(count) => Ok(count),
        Err(e) => {
            if let Err(truncate) = file.set_len(original_len) {
                tracing::warn!(
                    exe = %exe.as_ref().display(),
                    error = %truncate,
                    "cannot restore executable after failed append"
                );
            }
            Err(e)
        }
    }
}

fn write_boxes(file: &mut File, boxes: &[(String, PathBuf)]) -> Result<usize> {
    let mut writer = AppendWriter::new(file);
    for (name, dir) in boxes {
        writer.add_tree(name, dir)?;
    }

    let count = writer.len();
    writer.finish()?.flush()?;
    Ok(count)
}
