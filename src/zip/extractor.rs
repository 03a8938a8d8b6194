use log::{info, warn};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, ZipError};
use crate::io::ReadAt;

use super::consumer::Consumed;
use super::cursor::ZipCursor;
use super::structures::EntryMetadata;

/// What to do when the output file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Skip silently
    Never,
    /// Replace the existing file
    Always,
    /// Skip and suggest `-o`
    #[default]
    Ask,
}

/// Options for extracting into a directory
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub dest_dir: PathBuf,
    pub junk_paths: bool,
    pub overwrite: OverwriteMode,
    pub quiet: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            dest_dir: PathBuf::from("."),
            junk_paths: false,
            overwrite: OverwriteMode::default(),
            quiet: false,
        }
    }
}

/// Counts of what happened during an extraction run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub extracted: usize,
    pub directories: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// An entry as seen while listing, with sizes learned by consuming it
#[derive(Debug, Clone)]
pub struct ListedEntry {
    pub entry: EntryMetadata,
    /// `None` if the data could not be decoded
    pub consumed: Option<Consumed>,
}

/// ZIP file extractor
///
/// Drives a [`ZipCursor`] over the whole archive in a single forward pass.
pub struct ZipExtractor<R: ReadAt> {
    cursor: ZipCursor<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self {
            cursor: ZipCursor::open(reader)?,
        })
    }

    /// List all entries, consuming each one to learn its true sizes
    pub fn list_files(&mut self) -> Result<Vec<ListedEntry>> {
        let mut entries = Vec::new();

        while let Some(entry) = self.cursor.next_entry()? {
            let consumed = match self.cursor.skip() {
                Ok(consumed) => Some(consumed),
                Err(e) => {
                    warn!("cannot determine size of {}: {}", entry.name, e);
                    None
                }
            };
            entries.push(ListedEntry { entry, consumed });
        }

        Ok(entries)
    }

    /// Extract every selected entry below `options.dest_dir`.
    ///
    /// Per-entry failures are reported and counted; only archive-level
    /// errors abort the run.
    pub fn extract_all(
        &mut self,
        options: &ExtractOptions,
        mut select: impl FnMut(&EntryMetadata) -> bool,
    ) -> Result<ExtractSummary> {
        let mut summary = ExtractSummary::default();

        while let Some(entry) = self.cursor.next_entry()? {
            if !select(&entry) {
                summary.skipped += 1;
                continue;
            }

            let Some(relative) = enclosed_path(&entry.name) else {
                warn!("refusing to extract {:?}: path escapes destination", entry.name);
                summary.skipped += 1;
                continue;
            };

            if entry.is_directory() {
                if !options.junk_paths {
                    let dir = options.dest_dir.join(&relative);
                    if !options.quiet {
                        println!("   creating: {}", entry.name);
                    }
                    match fs::create_dir_all(&dir) {
                        Ok(()) => summary.directories += 1,
                        Err(e) => {
                            eprintln!("Failed to create directory {}: {}", dir.display(), e);
                            summary.failed += 1;
                        }
                    }
                }
                continue;
            }

            let output_path = if options.junk_paths {
                // Junk paths: use only the base filename
                match relative.file_name() {
                    Some(name) => options.dest_dir.join(name),
                    None => options.dest_dir.join(&relative),
                }
            } else {
                options.dest_dir.join(&relative)
            };

            // Handle existing files based on overwrite options
            if output_path.exists() {
                match options.overwrite {
                    OverwriteMode::Never => {
                        if !options.quiet {
                            eprintln!("Skipping: {} (file exists)", entry.name);
                        }
                        summary.skipped += 1;
                        continue;
                    }
                    OverwriteMode::Ask => {
                        if !options.quiet {
                            eprintln!("Skipping: {} (use -o to overwrite)", entry.name);
                        }
                        summary.skipped += 1;
                        continue;
                    }
                    OverwriteMode::Always => {}
                }
            }

            if !options.quiet {
                println!("  extracting: {}", entry.name);
            }

            match self.extract_to_file(&output_path) {
                Ok(consumed) => {
                    info!("{} -> {} ({} bytes)", entry.name, output_path.display(), consumed.uncompressed);
                    summary.extracted += 1;
                }
                Err(e) if e.is_entry_local() => {
                    eprintln!("Failed to extract: {}: {}", entry.name, e);
                    summary.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(summary)
    }

    /// Write every selected non-directory entry to `out`, back to back
    pub fn extract_to_writer(
        &mut self,
        out: &mut dyn Write,
        mut select: impl FnMut(&EntryMetadata) -> bool,
    ) -> Result<ExtractSummary> {
        let mut summary = ExtractSummary::default();

        while let Some(entry) = self.cursor.next_entry()? {
            if entry.is_directory() || !select(&entry) {
                summary.skipped += 1;
                continue;
            }

            match self.cursor.extract(out) {
                Ok(_) => summary.extracted += 1,
                Err(e) if e.is_entry_local() => {
                    eprintln!("Failed to extract: {}: {}", entry.name, e);
                    summary.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(summary)
    }

    /// Release the underlying reader.
    pub fn into_reader(self) -> R {
        self.cursor.close()
    }

    /// Extract the current entry to disk, removing the partial file on failure
    fn extract_to_file(&mut self, output_path: &Path) -> Result<Consumed> {
        // Create parent directories if needed
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(ZipError::Sink)?;
            }
        }

        let file = File::create(output_path).map_err(ZipError::Sink)?;
        let mut writer = BufWriter::new(file);

        match self.cursor.extract(&mut writer) {
            Ok(consumed) => Ok(consumed),
            Err(e) => {
                drop(writer);
                let _ = fs::remove_file(output_path);
                Err(e)
            }
        }
    }
}

/// Turn an entry name into a relative path that stays inside the destination.
///
/// Backslashes are treated as separators and leading roots are dropped.
/// Returns `None` for names with `..` components or nothing left to extract.
pub fn enclosed_path(name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    let mut path = PathBuf::new();

    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => return None,
        }
    }

    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}
