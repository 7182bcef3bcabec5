//! Main entry point for the zipguard CLI application.
//!
//! Opens a local archive, builds its catalog with every consistency check
//! enabled (unless relaxed by flags), and lists, tests or extracts entries.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use zipguard::{
    ArchiveHandle, CentralDirectoryEntry, Cli, MappedArchive, ReadAt, ZipArchive, ZipError,
};

/// Application entry point.
///
/// Parses command-line arguments, opens the archive through the requested
/// source and dispatches to the list, test or extract handler.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let file = std::fs::File::open(&cli.file)
        .with_context(|| format!("cannot open `{}`", cli.file))?;
    let config = cli.archive_config();

    if cli.mmap {
        let source = MappedArchive::new(&file)
            .with_context(|| format!("cannot map `{}`", cli.file))?;
        let archive = ZipArchive::with_config(source, config)
            .with_context(|| format!("rejected archive `{}`", cli.file))?;
        process_zip(Arc::new(archive), &cli).await
    } else {
        let source = ArchiveHandle::new(file)?;
        let archive = ZipArchive::with_config(source, config)
            .with_context(|| format!("rejected archive `{}`", cli.file))?;
        process_zip(Arc::new(archive), &cli).await
    }
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Process a ZIP archive based on CLI options.
///
/// - List mode (`-l` or `-v`): Display archive contents
/// - Test mode (`-t`): Read every entry, checking sizes and CRCs
/// - Extract mode: Extract files matching the specified filters
async fn process_zip<S: ReadAt + 'static>(archive: Arc<ZipArchive<S>>, cli: &Cli) -> Result<()> {
    if cli.list || cli.verbose {
        list_files(&archive, cli.verbose);
        return Ok(());
    }

    if cli.test {
        return test_archive(archive, cli).await;
    }

    let names: Vec<String> = archive
        .entries()
        .filter(|e| is_selected(e, cli))
        .map(|e| e.name.clone())
        .collect();

    let multiple_files = cli.pipe && names.len() > 1;
    for name in &names {
        extract_file(&archive, name, cli, multiple_files).await?;
    }

    Ok(())
}

/// Apply filters to determine which files to extract:
/// 1. Skip directories (they are created automatically during extraction)
/// 2. If specific files are requested, only include matching entries
/// 3. Exclude files matching the exclusion patterns
fn is_selected(e: &CentralDirectoryEntry, cli: &Cli) -> bool {
    if e.is_directory() {
        return false;
    }

    if !cli.files.is_empty() {
        let matches = cli.files.iter().any(|f| {
            if has_glob_chars(f) {
                glob_match(f, &e.name)
            } else {
                let basename = Path::new(&e.name)
                    .file_name()
                    .map(|s| s.to_string_lossy())
                    .unwrap_or_default();
                e.name == *f || basename == *f
            }
        });
        if !matches {
            return false;
        }
    }

    !cli
        .exclude
        .iter()
        .any(|x| e.name.contains(x) || glob_match(x, &e.name))
}

/// List files in the ZIP archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): Just file names, one per line
/// - Verbose format (`-v`): Detailed table with size, compression ratio, and timestamps
fn list_files<S: ReadAt>(archive: &ZipArchive<S>, verbose: bool) {
    if verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  {:>8}  Name",
            "Length", "Size", "Cmpr", "Date", "Time", "CRC-32"
        );
        println!("{}", "-".repeat(80));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in archive.entries() {
        if !verbose {
            println!("{}", entry.name);
            continue;
        }

        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();

        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {:08x}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            entry.crc32,
            entry.name
        );

        if !entry.is_directory() {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    if verbose {
        println!("{}", "-".repeat(80));
        println!(
            "{:>10}  {:>10}  {}  {:>31}  {} files",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        );
        if !archive.comment().is_empty() {
            println!("Comment: {}", String::from_utf8_lossy(archive.comment()));
        }
    }
}

/// Compression ratio as percentage saved.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 && compressed <= uncompressed {
        format!("{:>4}%", 100 - (compressed * 100 / uncompressed))
    } else {
        "  0%".to_string()
    }
}

/// Read every entry to the end on blocking worker threads.
///
/// All workers share the one archive; each opens its own stream, so reads
/// interleave on the single underlying source.
async fn test_archive<S: ReadAt + 'static>(archive: Arc<ZipArchive<S>>, cli: &Cli) -> Result<()> {
    let mut tasks = tokio::task::JoinSet::new();
    for (index, name) in archive.names().map(str::to_owned).enumerate() {
        let archive = Arc::clone(&archive);
        tasks.spawn_blocking(move || {
            let result = archive.open(&name).and_then(|mut stream| {
                std::io::copy(&mut stream, &mut std::io::sink()).map_err(ZipError::from_stream)
            });
            (index, name, result)
        });
    }

    let mut results = Vec::with_capacity(archive.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|(index, _, _)| *index);

    let mut failed = 0usize;
    let mut total_bytes = 0u64;
    for (_, name, result) in &results {
        match result {
            Ok(bytes) => {
                total_bytes += bytes;
                if !cli.is_quiet() {
                    println!("    testing: {name:<48} OK");
                }
            }
            Err(e) => {
                failed += 1;
                if !cli.is_very_quiet() {
                    eprintln!("    testing: {name:<48} FAILED: {e}");
                }
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} entries failed in `{}`", failed, results.len(), cli.file);
    }
    if !cli.is_very_quiet() {
        println!(
            "No errors detected in compressed data of {} ({} entries, {}).",
            cli.file,
            results.len(),
            format_size(total_bytes)
        );
    }
    Ok(())
}

/// Extract a single file from the archive.
///
/// Handles various extraction options:
/// - Pipe mode (`-p`): Write to stdout instead of file
/// - Custom output directory (`-d`): Extract to specified directory
/// - Junk paths (`-j`): Ignore directory structure in archive
/// - Overwrite control (`-n`, `-o`): Handle existing files
async fn extract_file<S: ReadAt + 'static>(
    archive: &Arc<ZipArchive<S>>,
    name: &str,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    let data = {
        let archive = Arc::clone(archive);
        let name = name.to_owned();
        tokio::task::spawn_blocking(move || archive.read_to_vec(&name)).await??
    };

    if cli.pipe {
        let mut stdout = tokio::io::stdout();
        if show_filename {
            stdout
                .write_all(format!("--- {} ---\n", name).as_bytes())
                .await?;
        }
        stdout.write_all(&data).await?;
        stdout.flush().await?;
        return Ok(());
    }

    let Some(relative) = enclosed_path(name) else {
        tracing::warn!(name, "skipping entry with unsafe path");
        return Ok(());
    };
    let file_name = if cli.junk_paths {
        match relative.file_name() {
            Some(base) => PathBuf::from(base),
            None => relative,
        }
    } else {
        relative
    };
    let output_path = match cli.extract_dir {
        Some(ref dir) => PathBuf::from(dir).join(&file_name),
        None => file_name,
    };

    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (file exists)", name);
            }
            return Ok(());
        }

        if !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", name);
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("  extracting: {}", name);
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let mut file = tokio::fs::File::create(&output_path)
        .await
        .with_context(|| format!("cannot create `{}`", output_path.display()))?;
    file.write_all(&data).await?;

    Ok(())
}

/// Relative path for an entry name, or `None` if it is absolute or would
/// climb out of the extraction directory.
fn enclosed_path(name: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!out.as_os_str().is_empty()).then_some(out)
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

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
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
