//! Streaming XML writer.
//!
//! This module provides [`XmlWriter`], a stateful writer that emits
//! well-formed XML incrementally to any [`std::io::Write`] sink without
//! building a document tree. The writer tracks the open-element stack and
//! the currently active section (attribute value, comment, CDATA, DTD,
//! processing instruction) and rejects call sequences that would produce
//! mismatched markup.
//!
//! Start tags are closed lazily: the `>` of a start tag is deferred until
//! content, a child element, or the end tag forces a decision, which is
//! what lets attributes be added after [`XmlWriter::start_element`] and
//! lets empty elements collapse to the `<name/>` form.
//!
//! # Example
//!
//! ```rust
//! use xmlwriter_rs::XmlWriter;
//!
//! let mut writer = XmlWriter::to_memory();
//! writer.start_document(None, Some("UTF-8"), None)?;
//! writer.start_element("catalog")?;
//! writer.write_attribute("version", "1.0")?;
//! writer.write_element("title", Some("Spring catalog"))?;
//! writer.end_document()?;
//!
//! let xml = String::from_utf8(writer.into_inner()?).unwrap();
//! assert!(xml.contains("<title>Spring catalog</title>"));
//! # Ok::<(), xmlwriter_rs::Error>(())
//! ```

use std::io::Write;
use std::path::Path;

use crate::encoding::resolve_charset;
use crate::error::{Error, Result};
use crate::escape::{escape_attr, escape_text};
use crate::sink::Sink;

const BASE64_TABLE: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const BASE64_LINE_LEN: usize = 72;

/// The exclusive section the writer is currently emitting.
///
/// Exactly one mode is active at a time; the payload carries whether the
/// section's deferred opener (the space after a PI target, the `[` of an
/// internal DTD subset, the opening quote of an entity value) has been
/// written yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Plain element content, or the prolog/epilog
    Content,
    /// Inside an attribute value of the innermost open start tag
    Attribute,
    /// Inside a comment
    Comment,
    /// Inside a CDATA section
    Cdata,
    /// Inside a processing instruction
    Pi { started: bool },
    /// Inside a DOCTYPE declaration
    Dtd { subset_open: bool },
    /// Inside a `<!ELEMENT>` declaration of the internal subset
    DtdElement { started: bool },
    /// Inside a `<!ATTLIST>` declaration of the internal subset
    DtdAttlist { started: bool },
    /// Inside a `<!ENTITY>` declaration of the internal subset
    DtdEntity { parameter: bool, started: bool },
}

impl Mode {
    fn describe(self) -> &'static str {
        match self {
            Mode::Content => "element content",
            Mode::Attribute => "an attribute value",
            Mode::Comment => "a comment",
            Mode::Cdata => "a CDATA section",
            Mode::Pi { .. } => "a processing instruction",
            Mode::Dtd { .. } => "a DTD declaration",
            Mode::DtdElement { .. } => "a DTD element declaration",
            Mode::DtdAttlist { .. } => "a DTD attribute list declaration",
            Mode::DtdEntity { .. } => "a DTD entity declaration",
        }
    }
}

/// Whether an element's start tag is still open for attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagState {
    /// Start tag written, `>` not yet emitted
    Open,
    /// The start tag has been closed; body content may follow
    HasContent,
}

/// A namespace binding declared on one element.
#[derive(Debug)]
struct NsDecl {
    prefix: Option<String>,
    uri: String,
}

/// One frame of the open-element stack.
///
/// The per-frame declaration list is the namespace scope map: lookups walk
/// the stack from innermost to outermost, so a prefix redeclared on a
/// descendant shadows the ancestor's binding for that subtree only.
#[derive(Debug)]
struct ElementFrame {
    name: String,
    tag: TagState,
    ns_decls: Vec<NsDecl>,
}

/// A streaming XML writer over any [`Write`] sink.
///
/// All mutating operations return the number of bytes appended to the
/// output buffer, or an error. A failed call leaves the element stack and
/// section mode consistent, so callers may recover or abort as they see
/// fit. The writer is single-threaded: share it across threads only behind
/// external synchronization.
pub struct XmlWriter<W: Write> {
    out: Option<W>,
    buf: Vec<u8>,
    stack: Vec<ElementFrame>,
    mode: Mode,
    indent: bool,
    indent_str: String,
    /// Cleared after inline text so a close tag stays on the same line
    doindent: bool,
    quote: u8,
}

impl XmlWriter<Sink> {
    /// Opens a writer over a file sink at `path`, optionally
    /// gzip-compressed.
    pub fn to_path<P: AsRef<Path>>(path: P, compressed: bool) -> Result<Self> {
        Ok(Self::new(Sink::create(path, compressed)?))
    }
}

impl XmlWriter<Vec<u8>> {
    /// Opens a writer over an in-memory buffer sink.
    ///
    /// Recover the bytes with [`XmlWriter::into_inner`].
    pub fn to_memory() -> Self {
        Self::new(Vec::new())
    }
}

impl<W: Write> XmlWriter<W> {
    /// Wraps an arbitrary sink.
    pub fn new(sink: W) -> Self {
        Self {
            out: Some(sink),
            buf: Vec::new(),
            stack: Vec::new(),
            mode: Mode::Content,
            indent: false,
            indent_str: "  ".to_string(),
            doindent: true,
            quote: b'"',
        }
    }

    // ========================================================================
    // Lifecycle and formatting
    // ========================================================================

    /// Drains the internal buffer to the sink.
    ///
    /// Returns the number of bytes pushed out, `0` when nothing was
    /// pending.
    pub fn flush(&mut self) -> Result<usize> {
        if self.buf.is_empty() {
            return Ok(0);
        }
        let Some(out) = self.out.as_mut() else {
            return Ok(0);
        };
        out.write_all(&self.buf)?;
        out.flush()?;
        let count = self.buf.len();
        self.buf.clear();
        Ok(count)
    }

    /// Flushes and hands back the sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.out.take().expect("sink is present until into_inner"))
    }

    /// Enables or disables indentation.
    ///
    /// Takes effect on the next newline-triggering write; already-written
    /// bytes are never reformatted.
    pub fn set_indent(&mut self, enabled: bool) {
        self.indent = enabled;
        self.doindent = true;
    }

    /// Sets the per-level indent string (default: two spaces).
    pub fn set_indent_string(&mut self, s: impl Into<String>) {
        self.indent_str = s.into();
    }

    /// Sets the character used for quoting attribute values.
    ///
    /// Only ASCII `"` and `'` are legal XML attribute delimiters; anything
    /// else is rejected. Affects subsequently opened attributes only.
    pub fn set_quote_char(&mut self, c: char) -> Result<()> {
        if c != '"' && c != '\'' {
            return Err(Error::InvalidQuoteChar(c));
        }
        self.quote = c as u8;
        Ok(())
    }

    // ========================================================================
    // Document operations
    // ========================================================================

    /// Writes the XML declaration.
    ///
    /// `version` defaults to `1.0`. `encoding` is a platform encoding
    /// label resolved through [`crate::encoding::resolve_charset`]; a
    /// label that cannot be resolved omits the encoding attribute rather
    /// than failing. Call order relative to other content is tolerated,
    /// not enforced: the declaration is emitted wherever the writer
    /// currently is.
    pub fn start_document(
        &mut self,
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: Option<bool>,
    ) -> Result<usize> {
        let mut sum = self.push_str("<?xml version=");
        sum += self.push_quote();
        sum += self.push_str(version.unwrap_or("1.0"));
        sum += self.push_quote();
        if let Some(charset) = encoding.and_then(resolve_charset) {
            sum += self.push_str(" encoding=");
            sum += self.push_quote();
            sum += self.push_str(charset);
            sum += self.push_quote();
        }
        if let Some(standalone) = standalone {
            sum += self.push_str(" standalone=");
            sum += self.push_quote();
            sum += self.push_str(if standalone { "yes" } else { "no" });
            sum += self.push_quote();
        }
        sum += self.push_str("?>\n");
        Ok(sum)
    }

    /// Ends the document: closes every still-open construct in
    /// reverse-open order, then flushes the sink.
    ///
    /// Returns the bytes emitted by the closing writes.
    pub fn end_document(&mut self) -> Result<usize> {
        let mut sum = 0;
        loop {
            match self.mode {
                Mode::Attribute => sum += self.end_attribute()?,
                Mode::Comment => sum += self.end_comment()?,
                Mode::Cdata => sum += self.end_cdata()?,
                Mode::Pi { .. } => sum += self.end_pi()?,
                Mode::DtdElement { .. } => sum += self.end_dtd_element()?,
                Mode::DtdAttlist { .. } => sum += self.end_dtd_attlist()?,
                Mode::DtdEntity { .. } => sum += self.end_dtd_entity()?,
                Mode::Dtd { .. } => sum += self.end_dtd()?,
                Mode::Content => {
                    if self.stack.is_empty() {
                        break;
                    }
                    sum += self.end_element()?;
                }
            }
        }
        if !self.indent {
            // the indenting paths already ended on a newline
            sum += self.push_str("\n");
        }
        self.flush()?;
        Ok(sum)
    }

    // ========================================================================
    // Elements
    // ========================================================================

    /// Starts an element.
    ///
    /// The start tag stays open for attributes until body content, a child
    /// element, or the end tag closes it.
    pub fn start_element(&mut self, name: &str) -> Result<usize> {
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        match self.mode {
            Mode::Content | Mode::Attribute => {}
            other => {
                return Err(Error::InvalidState {
                    operation: "start_element",
                    state: other.describe(),
                })
            }
        }
        let mut sum = self.close_start_tag(true)?;
        let level = self.stack.len();
        self.stack.push(ElementFrame {
            name: name.to_string(),
            tag: TagState::Open,
            ns_decls: Vec::new(),
        });
        if self.indent {
            sum += self.write_indent_level(level);
        }
        sum += self.push_str("<");
        sum += self.push_str(name);
        Ok(sum)
    }

    /// Ends the innermost element.
    ///
    /// An element with no body content collapses to the self-closing
    /// `<name/>` form; use [`XmlWriter::full_end_element`] to force an
    /// explicit end tag.
    pub fn end_element(&mut self) -> Result<usize> {
        match self.mode {
            Mode::Content | Mode::Attribute => {}
            other => {
                return Err(Error::InvalidState {
                    operation: "end_element",
                    state: other.describe(),
                })
            }
        }
        let Some(tag) = self.stack.last().map(|f| f.tag) else {
            return Err(Error::NoOpenElement);
        };

        let mut sum = 0;
        match tag {
            TagState::Open => {
                if self.mode == Mode::Attribute {
                    sum += self.end_attribute()?;
                }
                let decls = self.render_ns_decls();
                sum += self.push_str(&decls);
                self.doindent = true;
                sum += self.push_str("/>");
            }
            TagState::HasContent => {
                if self.indent && self.doindent {
                    sum += self.write_indent_level(self.stack.len() - 1);
                }
                self.doindent = true;
                let name = self.stack.last().map(|f| f.name.clone()).unwrap_or_default();
                sum += self.push_str("</");
                sum += self.push_str(&name);
                sum += self.push_str(">");
            }
        }
        if self.indent {
            sum += self.push_str("\n");
        }
        self.stack.pop();
        Ok(sum)
    }

    /// Ends the innermost element with an explicit `</name>` tag, never
    /// the self-closing form, even when the element is empty.
    pub fn full_end_element(&mut self) -> Result<usize> {
        match self.mode {
            Mode::Content | Mode::Attribute => {}
            other => {
                return Err(Error::InvalidState {
                    operation: "full_end_element",
                    state: other.describe(),
                })
            }
        }
        let Some(tag) = self.stack.last().map(|f| f.tag) else {
            return Err(Error::NoOpenElement);
        };

        let mut sum = 0;
        if tag == TagState::Open {
            if self.mode == Mode::Attribute {
                sum += self.end_attribute()?;
            }
            let decls = self.render_ns_decls();
            sum += self.push_str(&decls);
            sum += self.push_str(">");
            if self.indent {
                // the end tag hugs the start tag
                self.doindent = false;
            }
        }
        if self.indent && self.doindent {
            sum += self.write_indent_level(self.stack.len() - 1);
        }
        self.doindent = true;
        let name = self.stack.last().map(|f| f.name.clone()).unwrap_or_default();
        sum += self.push_str("</");
        sum += self.push_str(&name);
        sum += self.push_str(">");
        if self.indent {
            sum += self.push_str("\n");
        }
        self.stack.pop();
        Ok(sum)
    }

    /// Writes a complete element: start tag, optional text content, end
    /// tag. An element with no content collapses to `<name/>`.
    pub fn write_element(&mut self, name: &str, content: Option<&str>) -> Result<usize> {
        let mut sum = self.start_element(name)?;
        if let Some(content) = content {
            sum += self.write_string(content)?;
        }
        sum += self.end_element()?;
        Ok(sum)
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Starts an attribute on the innermost open start tag.
    ///
    /// A previously started attribute is ended first.
    pub fn start_attribute(&mut self, name: &str) -> Result<usize> {
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        let mut sum = 0;
        match self.mode {
            Mode::Attribute => sum += self.end_attribute()?,
            Mode::Content => {}
            other => {
                return Err(Error::InvalidState {
                    operation: "start_attribute",
                    state: other.describe(),
                })
            }
        }
        let Some(frame) = self.stack.last() else {
            return Err(Error::NoOpenElement);
        };
        if frame.tag != TagState::Open {
            return Err(Error::InvalidState {
                operation: "start_attribute",
                state: "element content after the start tag was closed",
            });
        }
        sum += self.push_str(" ");
        sum += self.push_str(name);
        sum += self.push_str("=");
        sum += self.push_quote();
        self.mode = Mode::Attribute;
        Ok(sum)
    }

    /// Ends the attribute currently being written.
    pub fn end_attribute(&mut self) -> Result<usize> {
        if self.mode != Mode::Attribute {
            return Err(Error::InvalidState {
                operation: "end_attribute",
                state: self.mode.describe(),
            });
        }
        self.mode = Mode::Content;
        Ok(self.push_quote())
    }

    /// Writes a complete attribute with an escaped value.
    pub fn write_attribute(&mut self, name: &str, content: &str) -> Result<usize> {
        let mut sum = self.start_attribute(name)?;
        sum += self.write_string(content)?;
        sum += self.end_attribute()?;
        Ok(sum)
    }

    // ========================================================================
    // Namespaces
    // ========================================================================

    /// Starts an element with an optionally prefixed name.
    ///
    /// When `namespace_uri` is given and the `(prefix, uri)` binding is
    /// not already visible from an enclosing scope, an `xmlns`
    /// declaration is recorded on this element and emitted when its start
    /// tag closes.
    pub fn start_element_ns(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        namespace_uri: Option<&str>,
    ) -> Result<usize> {
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        let qname = qualified_name(prefix, name);
        let sum = self.start_element(&qname)?;
        if let Some(uri) = namespace_uri {
            self.declare_ns(prefix, uri)?;
        }
        Ok(sum)
    }

    /// Writes a complete namespaced element.
    pub fn write_element_ns(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        namespace_uri: Option<&str>,
        content: Option<&str>,
    ) -> Result<usize> {
        let mut sum = self.start_element_ns(prefix, name, namespace_uri)?;
        if let Some(content) = content {
            sum += self.write_string(content)?;
        }
        sum += self.end_element()?;
        Ok(sum)
    }

    /// Starts an attribute with an optionally prefixed name, recording a
    /// namespace declaration for the binding when needed.
    pub fn start_attribute_ns(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        namespace_uri: Option<&str>,
    ) -> Result<usize> {
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        // validate before recording the binding so a rejected call leaves
        // no half-registered declaration behind
        match self.mode {
            Mode::Content | Mode::Attribute => {}
            other => {
                return Err(Error::InvalidState {
                    operation: "start_attribute",
                    state: other.describe(),
                })
            }
        }
        let Some(frame) = self.stack.last() else {
            return Err(Error::NoOpenElement);
        };
        if frame.tag != TagState::Open {
            return Err(Error::InvalidState {
                operation: "start_attribute",
                state: "element content after the start tag was closed",
            });
        }
        if let Some(uri) = namespace_uri {
            self.declare_ns(prefix, uri)?;
        }
        let qname = qualified_name(prefix, name);
        self.start_attribute(&qname)
    }

    /// Writes a complete namespaced attribute with an escaped value.
    pub fn write_attribute_ns(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        namespace_uri: Option<&str>,
        content: &str,
    ) -> Result<usize> {
        let mut sum = self.start_attribute_ns(prefix, name, namespace_uri)?;
        sum += self.write_string(content)?;
        sum += self.end_attribute()?;
        Ok(sum)
    }

    // ========================================================================
    // Text content
    // ========================================================================

    /// Writes text, escaped according to the active section.
    ///
    /// Element content is text-escaped and attribute values are
    /// attribute-escaped; comment, CDATA, PI, and DTD content is emitted
    /// raw. Callers are responsible for keeping a section's own terminator
    /// sequence (`-->`, `]]>`, `?>`) out of raw content.
    pub fn write_string(&mut self, content: &str) -> Result<usize> {
        match self.mode {
            Mode::Attribute => {
                let escaped = escape_attr(content, self.quote);
                let count = self.buf.len();
                self.buf.extend_from_slice(escaped.as_bytes());
                Ok(self.buf.len() - count)
            }
            Mode::Content => {
                let mut sum = self.close_start_tag(false)?;
                let escaped = escape_text(content);
                self.buf.extend_from_slice(escaped.as_bytes());
                sum += escaped.len();
                if self.indent {
                    self.doindent = false;
                }
                Ok(sum)
            }
            _ => self.write_raw(content),
        }
    }

    /// Writes content verbatim, with no escaping, after the active
    /// section's deferred opener.
    pub fn write_raw(&mut self, content: &str) -> Result<usize> {
        let mut sum = self.begin_section_content()?;
        self.buf.extend_from_slice(content.as_bytes());
        sum += content.len();
        if self.indent {
            self.doindent = false;
        }
        Ok(sum)
    }

    /// Writes binary data as base64 text, wrapping lines at 72 columns.
    pub fn write_base64(&mut self, data: &[u8]) -> Result<usize> {
        let mut sum = self.begin_section_content()?;
        let mut line_len = 0;
        for group in data.chunks(3) {
            let mut quad = [b'='; 4];
            match *group {
                [a, b, c] => {
                    quad[0] = BASE64_TABLE[(a >> 2) as usize];
                    quad[1] = BASE64_TABLE[(((a & 0x03) << 4) | (b >> 4)) as usize];
                    quad[2] = BASE64_TABLE[(((b & 0x0f) << 2) | (c >> 6)) as usize];
                    quad[3] = BASE64_TABLE[(c & 0x3f) as usize];
                }
                [a, b] => {
                    quad[0] = BASE64_TABLE[(a >> 2) as usize];
                    quad[1] = BASE64_TABLE[(((a & 0x03) << 4) | (b >> 4)) as usize];
                    quad[2] = BASE64_TABLE[((b & 0x0f) << 2) as usize];
                }
                [a] => {
                    quad[0] = BASE64_TABLE[(a >> 2) as usize];
                    quad[1] = BASE64_TABLE[((a & 0x03) << 4) as usize];
                }
                _ => {}
            }
            if line_len >= BASE64_LINE_LEN {
                sum += self.push_str("\r\n");
                line_len = 0;
            }
            self.buf.extend_from_slice(&quad);
            sum += 4;
            line_len += 4;
        }
        if self.indent {
            self.doindent = false;
        }
        Ok(sum)
    }

    // ========================================================================
    // Comments
    // ========================================================================

    /// Starts a comment.
    pub fn start_comment(&mut self) -> Result<usize> {
        let mut sum = 0;
        match self.mode {
            Mode::Content => sum += self.close_start_tag(true)?,
            other => {
                return Err(Error::InvalidState {
                    operation: "start_comment",
                    state: other.describe(),
                })
            }
        }
        self.mode = Mode::Comment;
        if self.indent {
            sum += self.write_indent_level(self.stack.len());
        }
        sum += self.push_str("<!--");
        Ok(sum)
    }

    /// Ends the current comment.
    pub fn end_comment(&mut self) -> Result<usize> {
        if self.mode != Mode::Comment {
            return Err(Error::InvalidState {
                operation: "end_comment",
                state: self.mode.describe(),
            });
        }
        let mut sum = self.push_str("-->");
        if self.indent {
            sum += self.push_str("\n");
        }
        self.mode = Mode::Content;
        Ok(sum)
    }

    /// Writes a complete comment.
    pub fn write_comment(&mut self, content: &str) -> Result<usize> {
        let mut sum = self.start_comment()?;
        sum += self.write_string(content)?;
        sum += self.end_comment()?;
        Ok(sum)
    }

    // ========================================================================
    // CDATA sections
    // ========================================================================

    /// Starts a CDATA section.
    pub fn start_cdata(&mut self) -> Result<usize> {
        let mut sum = 0;
        match self.mode {
            Mode::Content => sum += self.close_start_tag(false)?,
            other => {
                return Err(Error::InvalidState {
                    operation: "start_cdata",
                    state: other.describe(),
                })
            }
        }
        self.mode = Mode::Cdata;
        sum += self.push_str("<![CDATA[");
        Ok(sum)
    }

    /// Ends the current CDATA section.
    pub fn end_cdata(&mut self) -> Result<usize> {
        if self.mode != Mode::Cdata {
            return Err(Error::InvalidState {
                operation: "end_cdata",
                state: self.mode.describe(),
            });
        }
        let sum = self.push_str("]]>");
        self.mode = Mode::Content;
        Ok(sum)
    }

    /// Writes a complete CDATA section.
    pub fn write_cdata(&mut self, content: &str) -> Result<usize> {
        let mut sum = self.start_cdata()?;
        sum += self.write_string(content)?;
        sum += self.end_cdata()?;
        Ok(sum)
    }

    // ========================================================================
    // Processing instructions
    // ========================================================================

    /// Starts a processing instruction.
    ///
    /// The target `xml` (in any case) is reserved for the XML declaration.
    pub fn start_pi(&mut self, target: &str) -> Result<usize> {
        if target.is_empty() {
            return Err(Error::EmptyName);
        }
        if target.eq_ignore_ascii_case("xml") {
            return Err(Error::ReservedPiTarget(target.to_string()));
        }
        let mut sum = 0;
        match self.mode {
            Mode::Content => sum += self.close_start_tag(false)?,
            other => {
                return Err(Error::InvalidState {
                    operation: "start_pi",
                    state: other.describe(),
                })
            }
        }
        self.mode = Mode::Pi { started: false };
        sum += self.push_str("<?");
        sum += self.push_str(target);
        Ok(sum)
    }

    /// Ends the current processing instruction.
    pub fn end_pi(&mut self) -> Result<usize> {
        if !matches!(self.mode, Mode::Pi { .. }) {
            return Err(Error::InvalidState {
                operation: "end_pi",
                state: self.mode.describe(),
            });
        }
        let mut sum = self.push_str("?>");
        if self.indent {
            sum += self.push_str("\n");
        }
        self.mode = Mode::Content;
        Ok(sum)
    }

    /// Writes a complete processing instruction.
    pub fn write_pi(&mut self, target: &str, content: Option<&str>) -> Result<usize> {
        let mut sum = self.start_pi(target)?;
        if let Some(content) = content {
            sum += self.write_string(content)?;
        }
        sum += self.end_pi()?;
        Ok(sum)
    }

    // ========================================================================
    // DTD sections
    // ========================================================================

    /// Starts a DOCTYPE declaration. Only allowed in the prolog, before
    /// any element is opened.
    ///
    /// A public identifier requires a system identifier. The internal
    /// subset's `[` is deferred until the first subset declaration or text
    /// write, so an empty DOCTYPE renders without brackets.
    pub fn start_dtd(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<usize> {
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        if public_id.is_some() && system_id.is_none() {
            return Err(Error::MissingSystemId);
        }
        if self.mode != Mode::Content {
            return Err(Error::InvalidState {
                operation: "start_dtd",
                state: self.mode.describe(),
            });
        }
        if !self.stack.is_empty() {
            return Err(Error::InvalidState {
                operation: "start_dtd",
                state: "element content",
            });
        }

        let mut sum = self.push_str("<!DOCTYPE ");
        sum += self.push_str(name);
        if let Some(public_id) = public_id {
            sum += self.push_str(if self.indent { "\n" } else { " " });
            sum += self.push_str("PUBLIC ");
            sum += self.push_quote();
            sum += self.push_str(public_id);
            sum += self.push_quote();
        }
        if let Some(system_id) = system_id {
            if public_id.is_some() {
                // align the system id under the public id
                sum += self.push_str(if self.indent { "\n       " } else { " " });
            } else {
                sum += self.push_str(if self.indent { "\n" } else { " " });
                sum += self.push_str("SYSTEM ");
            }
            sum += self.push_quote();
            sum += self.push_str(system_id);
            sum += self.push_quote();
        }
        self.mode = Mode::Dtd { subset_open: false };
        Ok(sum)
    }

    /// Ends the DOCTYPE declaration.
    ///
    /// Fails while a `<!ELEMENT>`, `<!ATTLIST>`, or `<!ENTITY>`
    /// sub-declaration is still open.
    pub fn end_dtd(&mut self) -> Result<usize> {
        let Mode::Dtd { subset_open } = self.mode else {
            return Err(Error::InvalidState {
                operation: "end_dtd",
                state: self.mode.describe(),
            });
        };
        let mut sum = 0;
        if subset_open {
            sum += self.push_str("]");
        }
        sum += self.push_str(">");
        if self.indent {
            sum += self.push_str("\n");
        }
        self.mode = Mode::Content;
        Ok(sum)
    }

    /// Writes a complete DOCTYPE declaration with an optional internal
    /// subset written verbatim.
    pub fn write_dtd(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        subset: Option<&str>,
    ) -> Result<usize> {
        let mut sum = self.start_dtd(name, public_id, system_id)?;
        if let Some(subset) = subset {
            sum += self.write_string(subset)?;
        }
        sum += self.end_dtd()?;
        Ok(sum)
    }

    /// Starts a `<!ELEMENT>` declaration in the internal subset.
    pub fn start_dtd_element(&mut self, name: &str) -> Result<usize> {
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        let mut sum = self.open_dtd_subset("start_dtd_element")?;
        self.mode = Mode::DtdElement { started: false };
        if self.indent {
            sum += self.write_indent_level(1);
        }
        sum += self.push_str("<!ELEMENT ");
        sum += self.push_str(name);
        Ok(sum)
    }

    /// Ends the current `<!ELEMENT>` declaration.
    pub fn end_dtd_element(&mut self) -> Result<usize> {
        if !matches!(self.mode, Mode::DtdElement { .. }) {
            return Err(Error::InvalidState {
                operation: "end_dtd_element",
                state: self.mode.describe(),
            });
        }
        let mut sum = self.push_str(">");
        if self.indent {
            sum += self.push_str("\n");
        }
        self.mode = Mode::Dtd { subset_open: true };
        Ok(sum)
    }

    /// Writes a complete `<!ELEMENT>` declaration.
    pub fn write_dtd_element(&mut self, name: &str, content: &str) -> Result<usize> {
        let mut sum = self.start_dtd_element(name)?;
        sum += self.write_string(content)?;
        sum += self.end_dtd_element()?;
        Ok(sum)
    }

    /// Starts a `<!ATTLIST>` declaration in the internal subset.
    pub fn start_dtd_attlist(&mut self, name: &str) -> Result<usize> {
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        let mut sum = self.open_dtd_subset("start_dtd_attlist")?;
        self.mode = Mode::DtdAttlist { started: false };
        if self.indent {
            sum += self.write_indent_level(1);
        }
        sum += self.push_str("<!ATTLIST ");
        sum += self.push_str(name);
        Ok(sum)
    }

    /// Ends the current `<!ATTLIST>` declaration.
    pub fn end_dtd_attlist(&mut self) -> Result<usize> {
        if !matches!(self.mode, Mode::DtdAttlist { .. }) {
            return Err(Error::InvalidState {
                operation: "end_dtd_attlist",
                state: self.mode.describe(),
            });
        }
        let mut sum = self.push_str(">");
        if self.indent {
            sum += self.push_str("\n");
        }
        self.mode = Mode::Dtd { subset_open: true };
        Ok(sum)
    }

    /// Writes a complete `<!ATTLIST>` declaration.
    pub fn write_dtd_attlist(&mut self, name: &str, content: &str) -> Result<usize> {
        let mut sum = self.start_dtd_attlist(name)?;
        sum += self.write_string(content)?;
        sum += self.end_dtd_attlist()?;
        Ok(sum)
    }

    /// Starts a `<!ENTITY>` declaration in the internal subset.
    ///
    /// With `parameter` set the entity is a parameter entity
    /// (`<!ENTITY % name ...>`). A value written through
    /// [`XmlWriter::write_string`] is wrapped in the quote character.
    pub fn start_dtd_entity(&mut self, parameter: bool, name: &str) -> Result<usize> {
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        let mut sum = self.open_dtd_subset("start_dtd_entity")?;
        self.mode = Mode::DtdEntity {
            parameter,
            started: false,
        };
        if self.indent {
            sum += self.write_indent_level(1);
        }
        sum += self.push_str("<!ENTITY ");
        if parameter {
            sum += self.push_str("% ");
        }
        sum += self.push_str(name);
        Ok(sum)
    }

    /// Ends the current `<!ENTITY>` declaration, closing the value quote
    /// when a value was written.
    pub fn end_dtd_entity(&mut self) -> Result<usize> {
        let Mode::DtdEntity { started, .. } = self.mode else {
            return Err(Error::InvalidState {
                operation: "end_dtd_entity",
                state: self.mode.describe(),
            });
        };
        let mut sum = 0;
        if started {
            sum += self.push_quote();
        }
        sum += self.push_str(">");
        if self.indent {
            sum += self.push_str("\n");
        }
        self.mode = Mode::Dtd { subset_open: true };
        Ok(sum)
    }

    /// Writes a complete internal entity declaration:
    /// `<!ENTITY name "content">`.
    pub fn write_dtd_internal_entity(
        &mut self,
        parameter: bool,
        name: &str,
        content: &str,
    ) -> Result<usize> {
        let mut sum = self.start_dtd_entity(parameter, name)?;
        sum += self.write_string(content)?;
        sum += self.end_dtd_entity()?;
        Ok(sum)
    }

    /// Writes a complete external entity declaration with PUBLIC/SYSTEM
    /// identifiers and an optional NDATA notation reference.
    pub fn write_dtd_external_entity(
        &mut self,
        parameter: bool,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        ndata_id: Option<&str>,
    ) -> Result<usize> {
        if system_id.is_none() {
            return Err(Error::MissingSystemId);
        }
        if parameter && ndata_id.is_some() {
            return Err(Error::NotationOnParameterEntity);
        }
        let mut sum = self.start_dtd_entity(parameter, name)?;
        if let Some(public_id) = public_id {
            sum += self.push_str(" PUBLIC ");
            sum += self.push_quote();
            sum += self.push_str(public_id);
            sum += self.push_quote();
        }
        if let Some(system_id) = system_id {
            if public_id.is_none() {
                sum += self.push_str(" SYSTEM");
            }
            sum += self.push_str(" ");
            sum += self.push_quote();
            sum += self.push_str(system_id);
            sum += self.push_quote();
        }
        if let Some(ndata_id) = ndata_id {
            sum += self.push_str(" NDATA ");
            sum += self.push_str(ndata_id);
        }
        sum += self.end_dtd_entity()?;
        Ok(sum)
    }

    /// Writes a `<!NOTATION>` declaration in the internal subset.
    pub fn write_dtd_notation(
        &mut self,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<usize> {
        if name.is_empty() {
            return Err(Error::EmptyName);
        }
        if public_id.is_none() && system_id.is_none() {
            return Err(Error::MissingSystemId);
        }
        let mut sum = self.open_dtd_subset("write_dtd_notation")?;
        self.mode = Mode::Dtd { subset_open: true };
        if self.indent {
            sum += self.write_indent_level(1);
        }
        sum += self.push_str("<!NOTATION ");
        sum += self.push_str(name);
        if let Some(public_id) = public_id {
            sum += self.push_str(" PUBLIC ");
            sum += self.push_quote();
            sum += self.push_str(public_id);
            sum += self.push_quote();
        }
        if let Some(system_id) = system_id {
            if public_id.is_none() {
                sum += self.push_str(" SYSTEM");
            }
            sum += self.push_str(" ");
            sum += self.push_quote();
            sum += self.push_str(system_id);
            sum += self.push_quote();
        }
        sum += self.push_str(">");
        if self.indent {
            sum += self.push_str("\n");
        }
        Ok(sum)
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn push_str(&mut self, s: &str) -> usize {
        self.buf.extend_from_slice(s.as_bytes());
        s.len()
    }

    fn push_quote(&mut self) -> usize {
        self.buf.push(self.quote);
        1
    }

    fn write_indent_level(&mut self, level: usize) -> usize {
        let mut sum = 0;
        for _ in 0..level {
            self.buf.extend_from_slice(self.indent_str.as_bytes());
            sum += self.indent_str.len();
        }
        sum
    }

    /// Ends a pending attribute and closes the innermost pending start
    /// tag, emitting queued namespace declarations first.
    fn close_start_tag(&mut self, newline: bool) -> Result<usize> {
        let mut sum = 0;
        if self.mode == Mode::Attribute {
            sum += self.end_attribute()?;
        }
        if self.stack.last().map(|f| f.tag) == Some(TagState::Open) {
            let decls = self.render_ns_decls();
            sum += self.push_str(&decls);
            sum += self.push_str(">");
            if newline && self.indent {
                sum += self.push_str("\n");
            }
            if let Some(frame) = self.stack.last_mut() {
                frame.tag = TagState::HasContent;
            }
        }
        Ok(sum)
    }

    /// Serializes the namespace declarations queued on the innermost
    /// element as `xmlns` attributes.
    fn render_ns_decls(&self) -> String {
        let mut out = String::new();
        if let Some(frame) = self.stack.last() {
            for decl in &frame.ns_decls {
                out.push(' ');
                match &decl.prefix {
                    Some(prefix) => {
                        out.push_str("xmlns:");
                        out.push_str(prefix);
                    }
                    None => out.push_str("xmlns"),
                }
                out.push('=');
                out.push(self.quote as char);
                out.push_str(&escape_attr(&decl.uri, self.quote));
                out.push(self.quote as char);
            }
        }
        out
    }

    /// Records a namespace binding on the innermost element unless it is
    /// already visible from an enclosing scope.
    ///
    /// The innermost binding for a prefix decides: a matching binding is
    /// not redeclared, a conflicting binding on an ancestor is shadowed
    /// here, and a conflicting binding on this element is an error.
    fn declare_ns(&mut self, prefix: Option<&str>, uri: &str) -> Result<()> {
        let top = self.stack.len().saturating_sub(1);
        for (depth, frame) in self.stack.iter().enumerate().rev() {
            if let Some(decl) = frame.ns_decls.iter().find(|d| d.prefix.as_deref() == prefix) {
                if decl.uri == uri {
                    return Ok(());
                }
                if depth == top {
                    return Err(Error::PrefixRebound(
                        prefix.unwrap_or_default().to_string(),
                    ));
                }
                break;
            }
        }
        if let Some(frame) = self.stack.last_mut() {
            frame.ns_decls.push(NsDecl {
                prefix: prefix.map(str::to_string),
                uri: uri.to_string(),
            });
        }
        Ok(())
    }

    /// Emits the active section's deferred opener before raw content: the
    /// pending `>` of a start tag, the space after a PI target or DTD
    /// declaration name, the `[` of an internal subset, or the opening
    /// quote of an entity value.
    fn begin_section_content(&mut self) -> Result<usize> {
        let mut sum = 0;
        match self.mode {
            Mode::Content => sum += self.close_start_tag(false)?,
            Mode::Pi { started: false } => {
                sum += self.push_str(" ");
                self.mode = Mode::Pi { started: true };
            }
            Mode::Dtd { subset_open: false } => {
                sum += self.push_str(" [");
                self.mode = Mode::Dtd { subset_open: true };
            }
            Mode::DtdElement { started: false } => {
                sum += self.push_str(" ");
                self.mode = Mode::DtdElement { started: true };
            }
            Mode::DtdAttlist { started: false } => {
                sum += self.push_str(" ");
                self.mode = Mode::DtdAttlist { started: true };
            }
            Mode::DtdEntity {
                parameter,
                started: false,
            } => {
                sum += self.push_str(" ");
                sum += self.push_quote();
                self.mode = Mode::DtdEntity {
                    parameter,
                    started: true,
                };
            }
            _ => {}
        }
        Ok(sum)
    }

    /// Opens the internal subset bracket on the first subset declaration.
    fn open_dtd_subset(&mut self, operation: &'static str) -> Result<usize> {
        let Mode::Dtd { subset_open } = self.mode else {
            return Err(Error::InvalidState {
                operation,
                state: self.mode.describe(),
            });
        };
        let mut sum = 0;
        if !subset_open {
            sum += self.push_str(" [");
            if self.indent {
                sum += self.push_str("\n");
            }
        }
        Ok(sum)
    }
}

impl<W: Write> Drop for XmlWriter<W> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

fn qualified_name(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, name),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::events::Event as XmlEvent;
    use quick_xml::Reader;

    fn into_string(writer: XmlWriter<Vec<u8>>) -> String {
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_simple_document() {
        let mut w = XmlWriter::to_memory();
        w.start_document(None, Some("utf8"), None).unwrap();
        w.start_element("root").unwrap();
        w.write_string("hello").unwrap();
        w.end_element().unwrap();

        assert_eq!(
            into_string(w),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>hello</root>"
        );
    }

    #[test]
    fn test_declaration_with_standalone() {
        let mut w = XmlWriter::to_memory();
        w.start_document(Some("1.1"), None, Some(true)).unwrap();
        assert_eq!(into_string(w), "<?xml version=\"1.1\" standalone=\"yes\"?>\n");
    }

    #[test]
    fn test_declaration_omits_unknown_encoding() {
        let mut w = XmlWriter::to_memory();
        w.start_document(None, Some("no-such-encoding"), None).unwrap();
        assert_eq!(into_string(w), "<?xml version=\"1.0\"?>\n");
    }

    #[test]
    fn test_empty_element_self_closes() {
        let mut w = XmlWriter::to_memory();
        w.start_element("n").unwrap();
        w.end_element().unwrap();
        assert_eq!(into_string(w), "<n/>");
    }

    #[test]
    fn test_full_end_element_forces_pair() {
        let mut w = XmlWriter::to_memory();
        w.start_element("n").unwrap();
        w.full_end_element().unwrap();
        assert_eq!(into_string(w), "<n></n>");
    }

    #[test]
    fn test_attribute_escaping() {
        let mut w = XmlWriter::to_memory();
        w.start_element("a").unwrap();
        w.write_attribute("k", "x < \"y\" & z").unwrap();
        w.end_element().unwrap();
        assert_eq!(into_string(w), "<a k=\"x &lt; &quot;y&quot; &amp; z\"/>");
    }

    #[test]
    fn test_single_quote_char() {
        let mut w = XmlWriter::to_memory();
        w.set_quote_char('\'').unwrap();
        w.start_element("a").unwrap();
        w.write_attribute("k", "it's").unwrap();
        w.end_element().unwrap();
        assert_eq!(into_string(w), "<a k='it&apos;s'/>");
    }

    #[test]
    fn test_quote_char_rejects_non_quote() {
        let mut w = XmlWriter::to_memory();
        assert!(matches!(
            w.set_quote_char('x'),
            Err(Error::InvalidQuoteChar('x'))
        ));
        assert!(matches!(
            w.set_quote_char('\u{201c}'),
            Err(Error::InvalidQuoteChar(_))
        ));
    }

    #[test]
    fn test_attributes_after_start_element() {
        let mut w = XmlWriter::to_memory();
        w.start_element("a").unwrap();
        w.start_attribute("one").unwrap();
        w.write_string("1").unwrap();
        // starting the next attribute ends the previous one
        w.start_attribute("two").unwrap();
        w.write_string("2").unwrap();
        w.end_attribute().unwrap();
        w.write_string("body").unwrap();
        w.end_element().unwrap();
        assert_eq!(into_string(w), "<a one=\"1\" two=\"2\">body</a>");
    }

    #[test]
    fn test_attribute_after_content_fails() {
        let mut w = XmlWriter::to_memory();
        w.start_element("a").unwrap();
        w.write_string("body").unwrap();
        let err = w.start_attribute("k").unwrap_err();
        assert!(err.is_structural());
    }

    #[test]
    fn test_attribute_with_no_element_fails() {
        let mut w = XmlWriter::to_memory();
        assert!(matches!(
            w.start_attribute("k"),
            Err(Error::NoOpenElement)
        ));
    }

    #[test]
    fn test_end_element_on_empty_stack() {
        let mut w = XmlWriter::to_memory();
        assert!(matches!(w.end_element(), Err(Error::NoOpenElement)));
        // the failure leaves the writer usable
        w.start_element("a").unwrap();
        w.end_element().unwrap();
        assert_eq!(into_string(w), "<a/>");
    }

    #[test]
    fn test_end_document_closes_in_reverse_order() {
        let mut w = XmlWriter::to_memory();
        w.start_element("a").unwrap();
        w.start_element("b").unwrap();
        w.start_element("c").unwrap();
        w.write_string("x").unwrap();
        w.end_document().unwrap();
        assert_eq!(into_string(w), "<a><b><c>x</c></b></a>\n");
    }

    #[test]
    fn test_end_document_closes_open_sections() {
        let mut w = XmlWriter::to_memory();
        w.start_element("a").unwrap();
        w.start_comment().unwrap();
        w.write_string("unfinished").unwrap();
        w.end_document().unwrap();
        assert_eq!(into_string(w), "<a><!--unfinished--></a>\n");
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut w = XmlWriter::to_memory();
        assert!(matches!(w.start_element(""), Err(Error::EmptyName)));
        w.start_element("a").unwrap();
        assert!(matches!(w.start_attribute(""), Err(Error::EmptyName)));
        assert!(matches!(w.start_pi(""), Err(Error::EmptyName)));
    }

    #[test]
    fn test_comment() {
        let mut w = XmlWriter::to_memory();
        w.start_element("a").unwrap();
        w.write_comment(" note ").unwrap();
        w.end_element().unwrap();
        assert_eq!(into_string(w), "<a><!-- note --></a>");
    }

    #[test]
    fn test_comment_inside_cdata_fails() {
        let mut w = XmlWriter::to_memory();
        w.start_element("a").unwrap();
        w.start_cdata().unwrap();
        let err = w.start_comment().unwrap_err();
        assert!(err.is_structural());
        // the CDATA section is still open and usable
        w.write_string("data").unwrap();
        w.end_cdata().unwrap();
        w.end_element().unwrap();
        assert_eq!(into_string(w), "<a><![CDATA[data]]></a>");
    }

    #[test]
    fn test_cdata_content_is_raw() {
        let mut w = XmlWriter::to_memory();
        w.start_element("script").unwrap();
        w.write_cdata("if (a < b && c > d) {}").unwrap();
        w.end_element().unwrap();
        assert_eq!(
            into_string(w),
            "<script><![CDATA[if (a < b && c > d) {}]]></script>"
        );
    }

    #[test]
    fn test_pi() {
        let mut w = XmlWriter::to_memory();
        w.write_pi("xml-stylesheet", Some("href=\"style.css\" type=\"text/css\""))
            .unwrap();
        assert_eq!(
            into_string(w),
            "<?xml-stylesheet href=\"style.css\" type=\"text/css\"?>"
        );
    }

    #[test]
    fn test_pi_reserved_target() {
        let mut w = XmlWriter::to_memory();
        assert!(matches!(
            w.start_pi("xml"),
            Err(Error::ReservedPiTarget(_))
        ));
        assert!(matches!(
            w.start_pi("XmL"),
            Err(Error::ReservedPiTarget(_))
        ));
    }

    #[test]
    fn test_pi_inside_comment_fails() {
        let mut w = XmlWriter::to_memory();
        w.start_comment().unwrap();
        assert!(w.start_pi("target").unwrap_err().is_structural());
    }

    #[test]
    fn test_dtd_public_and_system() {
        let mut w = XmlWriter::to_memory();
        w.start_dtd(
            "html",
            Some("-//W3C//DTD XHTML 1.0 Strict//EN"),
            Some("http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd"),
        )
        .unwrap();
        w.end_dtd().unwrap();
        assert_eq!(
            into_string(w),
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \
             \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">"
        );
    }

    #[test]
    fn test_dtd_public_requires_system() {
        let mut w = XmlWriter::to_memory();
        assert!(matches!(
            w.start_dtd("html", Some("-//W3C//..."), None),
            Err(Error::MissingSystemId)
        ));
    }

    #[test]
    fn test_dtd_internal_subset() {
        let mut w = XmlWriter::to_memory();
        w.start_dtd("doc", None, None).unwrap();
        w.write_dtd_element("doc", "(#PCDATA)").unwrap();
        w.write_dtd_attlist("doc", "lang CDATA #IMPLIED").unwrap();
        w.write_dtd_internal_entity(false, "author", "Jane Doe").unwrap();
        w.end_dtd().unwrap();
        assert_eq!(
            into_string(w),
            "<!DOCTYPE doc [<!ELEMENT doc (#PCDATA)>\
             <!ATTLIST doc lang CDATA #IMPLIED>\
             <!ENTITY author \"Jane Doe\">]>"
        );
    }

    #[test]
    fn test_dtd_parameter_entity() {
        let mut w = XmlWriter::to_memory();
        w.start_dtd("doc", None, None).unwrap();
        w.write_dtd_internal_entity(true, "fields", "name | email").unwrap();
        w.end_dtd().unwrap();
        assert_eq!(
            into_string(w),
            "<!DOCTYPE doc [<!ENTITY % fields \"name | email\">]>"
        );
    }

    #[test]
    fn test_dtd_external_entity() {
        let mut w = XmlWriter::to_memory();
        w.start_dtd("doc", None, None).unwrap();
        w.write_dtd_external_entity(false, "chap1", None, Some("chap1.xml"), None)
            .unwrap();
        w.end_dtd().unwrap();
        assert_eq!(
            into_string(w),
            "<!DOCTYPE doc [<!ENTITY chap1 SYSTEM \"chap1.xml\">]>"
        );
    }

    #[test]
    fn test_dtd_notation() {
        let mut w = XmlWriter::to_memory();
        w.start_dtd("doc", None, None).unwrap();
        w.write_dtd_notation("png", None, Some("image/png")).unwrap();
        w.end_dtd().unwrap();
        assert_eq!(
            into_string(w),
            "<!DOCTYPE doc [<!NOTATION png SYSTEM \"image/png\">]>"
        );
    }

    #[test]
    fn test_end_dtd_with_open_submode_fails() {
        let mut w = XmlWriter::to_memory();
        w.start_dtd("doc", None, None).unwrap();
        w.start_dtd_element("doc").unwrap();
        assert!(w.end_dtd().unwrap_err().is_structural());
        w.end_dtd_element().unwrap();
        w.end_dtd().unwrap();
    }

    #[test]
    fn test_dtd_inside_element_fails() {
        let mut w = XmlWriter::to_memory();
        w.start_element("a").unwrap();
        assert!(w.start_dtd("doc", None, None).unwrap_err().is_structural());
    }

    #[test]
    fn test_external_entity_notation_on_parameter_entity() {
        let mut w = XmlWriter::to_memory();
        w.start_dtd("doc", None, None).unwrap();
        assert!(matches!(
            w.write_dtd_external_entity(true, "e", None, Some("e.xml"), Some("png")),
            Err(Error::NotationOnParameterEntity)
        ));
    }

    #[test]
    fn test_namespaced_elements_no_redeclaration() {
        let mut w = XmlWriter::to_memory();
        w.start_element_ns(Some("dc"), "metadata", Some("http://purl.org/dc/"))
            .unwrap();
        w.start_element_ns(Some("dc"), "title", Some("http://purl.org/dc/"))
            .unwrap();
        w.write_string("T").unwrap();
        w.end_element().unwrap();
        w.end_element().unwrap();
        assert_eq!(
            into_string(w),
            "<dc:metadata xmlns:dc=\"http://purl.org/dc/\">\
             <dc:title>T</dc:title></dc:metadata>"
        );
    }

    #[test]
    fn test_default_namespace() {
        let mut w = XmlWriter::to_memory();
        w.start_element_ns(None, "html", Some("http://www.w3.org/1999/xhtml"))
            .unwrap();
        w.end_element().unwrap();
        assert_eq!(
            into_string(w),
            "<html xmlns=\"http://www.w3.org/1999/xhtml\"/>"
        );
    }

    #[test]
    fn test_namespace_shadowing() {
        let mut w = XmlWriter::to_memory();
        w.start_element_ns(Some("p"), "outer", Some("urn:one")).unwrap();
        w.start_element_ns(Some("p"), "inner", Some("urn:two")).unwrap();
        w.end_element().unwrap();
        w.end_element().unwrap();
        assert_eq!(
            into_string(w),
            "<p:outer xmlns:p=\"urn:one\"><p:inner xmlns:p=\"urn:two\"/></p:outer>"
        );
    }

    #[test]
    fn test_namespace_rebind_on_same_element_fails() {
        let mut w = XmlWriter::to_memory();
        w.start_element_ns(Some("p"), "a", Some("urn:one")).unwrap();
        assert!(matches!(
            w.write_attribute_ns(Some("p"), "k", Some("urn:other"), "v"),
            Err(Error::PrefixRebound(_))
        ));
    }

    #[test]
    fn test_namespaced_attribute() {
        let mut w = XmlWriter::to_memory();
        w.start_element("use").unwrap();
        w.write_attribute_ns(
            Some("xlink"),
            "href",
            Some("http://www.w3.org/1999/xlink"),
            "#icon",
        )
        .unwrap();
        w.end_element().unwrap();
        assert_eq!(
            into_string(w),
            "<use xlink:href=\"#icon\" xmlns:xlink=\"http://www.w3.org/1999/xlink\"/>"
        );
    }

    #[test]
    fn test_indentation() {
        let mut w = XmlWriter::to_memory();
        w.set_indent(true);
        w.start_element("a").unwrap();
        w.start_element("b").unwrap();
        w.write_element("c", Some("x")).unwrap();
        w.end_element().unwrap();
        w.end_element().unwrap();
        assert_eq!(into_string(w), "<a>\n  <b>\n    <c>x</c>\n  </b>\n</a>\n");
    }

    #[test]
    fn test_indent_string() {
        let mut w = XmlWriter::to_memory();
        w.set_indent(true);
        w.set_indent_string("\t");
        w.start_element("a").unwrap();
        w.write_element("b", None).unwrap();
        w.end_element().unwrap();
        assert_eq!(into_string(w), "<a>\n\t<b/>\n</a>\n");
    }

    #[test]
    fn test_flush_with_nothing_pending_returns_zero() {
        let mut w = XmlWriter::to_memory();
        w.start_element("a").unwrap();
        assert!(w.flush().unwrap() > 0);
        assert_eq!(w.flush().unwrap(), 0);
    }

    #[test]
    fn test_write_raw_is_verbatim() {
        let mut w = XmlWriter::to_memory();
        w.start_element("a").unwrap();
        w.write_raw("<b>already &amp; marked up</b>").unwrap();
        w.end_element().unwrap();
        assert_eq!(into_string(w), "<a><b>already &amp; marked up</b></a>");
    }

    #[test]
    fn test_write_base64() {
        let mut w = XmlWriter::to_memory();
        w.start_element("blob").unwrap();
        w.write_base64(b"Man").unwrap();
        w.end_element().unwrap();
        assert_eq!(into_string(w), "<blob>TWFu</blob>");
    }

    #[test]
    fn test_write_base64_padding_and_wrapping() {
        let mut w = XmlWriter::to_memory();
        w.start_element("blob").unwrap();
        w.write_base64(b"M").unwrap();
        w.end_element().unwrap();
        assert_eq!(into_string(w), "<blob>TQ==</blob>");

        let mut w = XmlWriter::to_memory();
        w.start_element("blob").unwrap();
        w.write_base64(&[0u8; 100]).unwrap();
        w.end_element().unwrap();
        let xml = into_string(w);
        // 100 bytes encode past the 72-column limit, so a line break appears
        assert!(xml.contains("\r\n"));
    }

    #[test]
    fn test_start_document_order_tolerated() {
        let mut w = XmlWriter::to_memory();
        w.write_comment("preamble").unwrap();
        assert!(w.start_document(None, None, None).is_ok());
    }

    #[test]
    fn test_roundtrip_through_parser() {
        let original_attr = "a<b & \"c\">d\tend";
        let original_text = "x < y & z";

        let mut w = XmlWriter::to_memory();
        w.start_element("doc").unwrap();
        w.write_attribute("v", original_attr).unwrap();
        w.write_string(original_text).unwrap();
        w.end_element().unwrap();
        let xml = into_string(w);

        let mut reader = Reader::from_str(&xml);
        let mut attr_value = None;
        let mut text = None;
        loop {
            match reader.read_event().unwrap() {
                XmlEvent::Start(e) => {
                    for attr in e.attributes() {
                        let attr = attr.unwrap();
                        attr_value = Some(attr.unescape_value().unwrap().into_owned());
                    }
                }
                XmlEvent::Text(e) => text = Some(e.unescape().unwrap().into_owned()),
                XmlEvent::Eof => break,
                _ => {}
            }
        }
        assert_eq!(attr_value.as_deref(), Some(original_attr));
        assert_eq!(text.as_deref(), Some(original_text));
    }

    #[test]
    fn test_full_surface_parses() {
        let mut w = XmlWriter::to_memory();
        w.set_indent(true);
        w.start_document(None, Some("UTF-8"), Some(false)).unwrap();
        w.write_pi("xml-stylesheet", Some("href=\"s.css\"")).unwrap();
        w.start_element_ns(None, "feed", Some("http://www.w3.org/2005/Atom"))
            .unwrap();
        w.write_attribute("version", "1.0").unwrap();
        w.write_comment(" generated ").unwrap();
        w.start_element("entry").unwrap();
        w.write_attribute_ns(Some("xml"), "lang", None, "en").unwrap();
        w.write_element("title", Some("Quotes & angles <>")).unwrap();
        w.write_cdata("raw < content >").unwrap();
        w.end_element().unwrap();
        w.end_document().unwrap();
        let xml = into_string(w);

        let mut reader = Reader::from_str(&xml);
        loop {
            match reader.read_event() {
                Ok(XmlEvent::Eof) => break,
                Ok(_) => {}
                Err(e) => panic!("generated XML failed to parse: {e} in {xml}"),
            }
        }
    }

    #[test]
    fn test_structural_error_leaves_writer_usable() {
        let mut w = XmlWriter::to_memory();
        w.start_element("a").unwrap();
        assert!(w.end_comment().unwrap_err().is_structural());
        assert!(w.end_cdata().unwrap_err().is_structural());
        w.write_element("b", None).unwrap();
        w.end_element().unwrap();
        assert_eq!(into_string(w), "<a><b/></a>");
    }

    #[test]
    fn test_file_sink_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml");

        let mut w = XmlWriter::to_path(&path, false).unwrap();
        w.start_document(None, Some("UTF-8"), None).unwrap();
        w.write_element("root", Some("persisted")).unwrap();
        w.end_document().unwrap();
        let mut sink = w.into_inner().unwrap();
        sink.close().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>persisted</root>\n"
        );
    }

    #[test]
    fn test_gzip_sink_document() {
        use flate2::read::GzDecoder;
        use std::io::Read;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml.gz");

        let mut w = XmlWriter::to_path(&path, true).unwrap();
        w.write_element("root", Some("compressed")).unwrap();
        w.end_document().unwrap();
        let mut sink = w.into_inner().unwrap();
        sink.close().unwrap();

        let raw = std::fs::read(&path).unwrap();
        let mut inflated = String::new();
        GzDecoder::new(&raw[..]).read_to_string(&mut inflated).unwrap();
        assert_eq!(inflated, "<root>compressed</root>\n");
    }
}
