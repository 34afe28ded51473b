//! walk_to_xml - Walk a directory tree and stream an XML manifest.
//!
//! This tool recursively walks a directory, collecting file metadata, and
//! streams the results as an XML manifest to stdout or a file without
//! holding the tree in memory.
//!
//! # Usage
//!
//! ```bash
//! walk_to_xml [OPTIONS] [PATH]
//! ```
//!
//! # Examples
//!
//! ```bash
//! # Walk the current directory
//! walk_to_xml > manifest.xml
//!
//! # Walk a specific directory into a gzip-compressed file
//! walk_to_xml -o manifest.xml.gz --compress /path/to/directory
//!
//! # Compact output, following symlinks
//! walk_to_xml --compact --follow-links /path/to/directory
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use clap::Parser;
use walkdir::WalkDir;

use xmlwriter_rs::{Result, XmlWriter};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Walk a directory tree and stream an XML manifest.
#[derive(Parser, Debug)]
#[command(name = "walk_to_xml")]
#[command(version = VERSION)]
#[command(about = "Walk a directory tree and stream an XML manifest")]
#[command(long_about = "Recursively walks a directory, collecting file metadata, and \
    streams the results as an XML manifest to stdout or a file.")]
struct Args {
    /// Directory to walk (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// gzip-compress the output file
    #[arg(short, long, requires = "output")]
    compress: bool,

    /// Follow symbolic links when walking directories
    #[arg(long)]
    follow_links: bool,

    /// Output compact XML (no indentation)
    #[arg(long)]
    compact: bool,
}

/// Classifies a directory entry for the manifest's `kind` attribute.
fn entry_kind(entry: &walkdir::DirEntry) -> &'static str {
    let file_type = entry.file_type();
    if file_type.is_symlink() {
        "symlink"
    } else if file_type.is_dir() {
        "directory"
    } else {
        "file"
    }
}

/// Streams the manifest for the configured directory through `writer`.
fn write_manifest<W: Write>(writer: &mut XmlWriter<W>, args: &Args) -> Result<()> {
    writer.start_document(None, Some("UTF-8"), None)?;
    writer.start_element("manifest")?;
    writer.write_attribute("root", &args.path.to_string_lossy())?;
    writer.write_attribute("generator", &format!("walk_to_xml/{}", VERSION))?;

    let walker = WalkDir::new(&args.path)
        .follow_links(args.follow_links)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                writer.write_element("error", Some(&e.to_string()))?;
                continue;
            }
        };
        let rel = entry
            .path()
            .strip_prefix(&args.path)
            .unwrap_or_else(|_| entry.path());
        if rel.as_os_str().is_empty() {
            // the walk root itself
            continue;
        }

        writer.start_element("entry")?;
        writer.write_attribute("kind", entry_kind(&entry))?;
        writer.write_element("name", Some(&rel.to_string_lossy()))?;

        if let Ok(metadata) = entry.metadata() {
            if metadata.is_file() {
                writer.write_element("size", Some(&metadata.len().to_string()))?;
            }
            if let Ok(mtime) = metadata.modified() {
                if let Ok(since_epoch) = mtime.duration_since(UNIX_EPOCH) {
                    writer.write_element("mtime", Some(&since_epoch.as_secs().to_string()))?;
                }
            }
        }

        if entry.file_type().is_symlink() {
            if let Ok(target) = std::fs::read_link(entry.path()) {
                writer.write_element("target", Some(&target.to_string_lossy()))?;
            }
        }

        writer.end_element()?;
    }

    writer.end_document()?;
    Ok(())
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match &args.output {
        Some(path) => {
            let mut writer = XmlWriter::to_path(path, args.compress)?;
            writer.set_indent(!args.compact);
            write_manifest(&mut writer, &args)?;
            let mut sink = writer.into_inner()?;
            sink.close()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = XmlWriter::new(stdout.lock());
            writer.set_indent(!args.compact);
            write_manifest(&mut writer, &args)?;
        }
    }

    Ok(())
}
