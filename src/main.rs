//! Main entry point for the scanzip CLI application.
//!
//! This binary provides a command-line interface for recovering files from
//! ZIP archives on the local filesystem or at remote HTTP URLs.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use scanzip::zip::{ExtractOptions, ExtractSummary, ListedEntry};
use scanzip::{Cli, EntryMetadata, HttpRangeReader, LocalFileReader, ReadAt, ZipExtractor};

/// Application entry point.
///
/// Parses command-line arguments and dispatches to the appropriate handler
/// based on whether the input is a local file or HTTP URL.
fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .format_timestamp(None)
        .init();

    if cli.is_http_url() {
        // Handle remote ZIP file via HTTP Range requests
        let reader = HttpRangeReader::new(cli.file.clone())?;
        let transferred_before = reader.transferred_bytes();

        let reader = process_zip(reader, &cli)?;

        // Display network transfer statistics for HTTP sources
        if !cli.is_quiet() {
            let transferred = reader.transferred_bytes() - transferred_before;
            eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
        }
    } else {
        // Handle local ZIP file
        let reader = LocalFileReader::open(Path::new(&cli.file))
            .with_context(|| format!("cannot open {}", cli.file))?;
        process_zip(reader, &cli)?;
    }

    Ok(())
}

/// Process a ZIP archive based on CLI options.
///
/// - List mode (`-l` or `-v`): display archive contents
/// - Pipe mode (`-p`): write matching entries to stdout
/// - Extract mode: extract matching entries to disk
///
/// Returns the reader so callers can inspect it afterwards.
fn process_zip<R: ReadAt>(reader: R, cli: &Cli) -> Result<R> {
    let mut extractor = ZipExtractor::new(reader)?;

    // List mode: display archive contents and exit
    if cli.list || cli.verbose {
        let entries = extractor.list_files()?;
        print_listing(&entries, cli.verbose);
        return Ok(extractor.into_reader());
    }

    let summary = if cli.pipe {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let summary = extractor.extract_to_writer(&mut out, |e| is_selected(cli, e))?;
        out.flush()?;
        summary
    } else {
        let options = ExtractOptions {
            dest_dir: cli
                .extract_dir
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            junk_paths: cli.junk_paths,
            overwrite: cli.overwrite_mode(),
            quiet: cli.is_quiet(),
        };
        extractor.extract_all(&options, |e| is_selected(cli, e))?
    };

    report(&summary, cli)?;
    Ok(extractor.into_reader())
}

/// Apply the positional file filters and `-x` exclusions to an entry.
///
/// Directory entries are only selected when no explicit file list is given;
/// parent directories of selected files are created on demand anyway.
fn is_selected(cli: &Cli, entry: &EntryMetadata) -> bool {
    let name = entry.name.as_str();

    if !cli.files.is_empty() {
        if entry.is_directory() {
            return false;
        }
        let matches = cli.files.iter().any(|f| {
            if has_glob_chars(f) {
                // Pattern contains wildcards: use glob matching
                glob_match(f, name)
            } else {
                // No wildcards: exact match on filename or full path
                let basename = Path::new(name)
                    .file_name()
                    .map(|s| s.to_string_lossy())
                    .unwrap_or_default();
                name == f || basename == f.as_str()
            }
        });
        if !matches {
            return false;
        }
    }

    // Exclude files matching the -x patterns
    !cli.exclude
        .iter()
        .any(|x| name.contains(x.as_str()) || glob_match(x, name))
}

/// Print a summary and fail when any entry could not be extracted.
fn report(summary: &ExtractSummary, cli: &Cli) -> Result<()> {
    if !cli.is_quiet() {
        eprintln!(
            "{} extracted, {} directories, {} skipped, {} failed",
            summary.extracted, summary.directories, summary.skipped, summary.failed
        );
    }
    if summary.failed > 0 {
        bail!("{} entries could not be extracted", summary.failed);
    }
    Ok(())
}

/// List files in the ZIP archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): Just file names, one per line
/// - Verbose format (`-v`): Table with size, compressed size, method and timestamps
///
/// Sizes come from decoding each entry, so data-descriptor entries report
/// their real sizes. Entries that could not be decoded show `?`.
fn print_listing(entries: &[ListedEntry], verbose: bool) {
    if verbose {
        // Print table header for verbose output
        println!(
            "{:>10}  {:>10}  {:>6}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Size", "Method", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(78));
    }

    // Track totals for summary line
    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for listed in entries {
        let entry = &listed.entry;
        if !verbose {
            // Simple format: just the file name
            println!("{}", entry.name);
            continue;
        }

        // Parse DOS timestamp into human-readable format
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();

        let (length, size, ratio) = match listed.consumed {
            Some(c) => (
                c.uncompressed.to_string(),
                c.compressed.to_string(),
                ratio(c.compressed, c.uncompressed),
            ),
            None => ("?".to_string(), "?".to_string(), "   ?".to_string()),
        };

        println!(
            "{:>10}  {:>10}  {:>6}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            length,
            size,
            entry.compression_method.label(),
            ratio,
            year,
            month,
            day,
            hour,
            minute,
            entry.name
        );

        // Accumulate totals (excluding directories)
        if !entry.is_directory() {
            if let Some(c) = listed.consumed {
                total_uncompressed += c.uncompressed;
                total_compressed += c.compressed;
            }
            file_count += 1;
        }
    }

    // Print summary line in verbose mode
    if verbose {
        println!("{}", "-".repeat(78));
        println!(
            "{:>10}  {:>10}  {:>6}  {}  {:>17}  {} files",
            total_uncompressed,
            total_compressed,
            "",
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        );
    }
}

/// Compression ratio as percentage saved.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 {
        format!(
            "{:>4}%",
            100u64.saturating_sub(compressed * 100 / uncompressed)
        )
    } else {
        "  0%".to_string()
    }
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    /// Recursive helper function for glob matching.
    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            // Both exhausted: match successful
            (None, None) => true,
            // Star matches zero or more characters
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            // Question mark matches exactly one character
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            // Literal character match
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            // No match
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("*.txt", "readme.txt"));
        assert!(glob_match("file?.dat", "file1.dat"));
        assert!(glob_match("docs/*", "docs/a/b.md"));
        assert!(!glob_match("*.txt", "readme.md"));
        assert!(!glob_match("file?.dat", "file10.dat"));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }

    #[test]
    fn test_ratio_never_underflows() {
        assert_eq!(ratio(50, 100), "  50%");
        assert_eq!(ratio(120, 100), "   0%");
        assert_eq!(ratio(0, 0), "  0%");
    }
}
