//! demo_catalog - Generate a small book catalog document.
//!
//! This demo exercises most of the writer surface in one document: the
//! XML declaration, a DOCTYPE with an internal subset (element, attribute
//! list, and entity declarations), comments, CDATA, and indented nested
//! elements with attributes.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example demo_catalog
//! ```
//!
//! The generated catalog is printed to stdout.

use xmlwriter_rs::XmlWriter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = XmlWriter::to_memory();
    writer.set_indent(true);

    writer.start_document(None, Some("UTF-8"), None)?;

    writer.start_dtd("catalog", None, None)?;
    writer.write_dtd_element("catalog", "(book*)")?;
    writer.write_dtd_element("book", "(title, blurb?)")?;
    writer.write_dtd_attlist("book", "isbn CDATA #REQUIRED")?;
    writer.write_dtd_internal_entity(false, "publisher", "Example House")?;
    writer.end_dtd()?;

    writer.write_comment(" spring listing ")?;
    writer.start_element("catalog")?;

    writer.start_element("book")?;
    writer.write_attribute("isbn", "978-1-0000-0001-1")?;
    writer.write_element("title", Some("Ampersands & You"))?;
    writer.start_element("blurb")?;
    writer.write_cdata("Learn when < and > need no escaping at all.")?;
    writer.end_element()?;
    writer.end_element()?;

    writer.start_element("book")?;
    writer.write_attribute("isbn", "978-1-0000-0002-8")?;
    writer.write_element("title", Some("Streaming Documents"))?;
    writer.end_element()?;

    writer.end_document()?;

    let xml = String::from_utf8(writer.into_inner()?)?;
    print!("{xml}");
    Ok(())
}
