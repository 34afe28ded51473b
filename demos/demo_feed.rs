//! demo_feed - Write a namespaced feed to a gzip-compressed file.
//!
//! This demo streams an Atom-style feed through the file sink with gzip
//! compression enabled, declaring a default namespace on the root and a
//! prefixed namespace on a descendant.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example demo_feed /tmp/feed.xml.gz
//! ```

use std::env;

use xmlwriter_rs::XmlWriter;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <output.xml.gz>", args[0]);
        std::process::exit(1);
    }

    let mut writer = XmlWriter::to_path(&args[1], true)?;
    writer.set_indent(true);

    writer.start_document(None, Some("UTF-8"), None)?;
    writer.start_element_ns(None, "feed", Some(ATOM_NS))?;
    writer.write_element("title", Some("Release notes"))?;

    writer.start_element("entry")?;
    writer.write_element("title", Some("v0.1.0"))?;
    writer.write_element_ns(Some("dc"), "creator", Some(DC_NS), Some("The maintainers"))?;
    writer.write_element(
        "summary",
        Some("First release: files & buffers, gzip output."),
    )?;
    writer.end_element()?;

    writer.end_document()?;
    let mut sink = writer.into_inner()?;
    sink.close()?;

    eprintln!("wrote {}", args[1]);
    Ok(())
}
