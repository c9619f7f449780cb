//! quick-xml adapters for the token stream traits.
//!
//! ## Output layout
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <entry xmlns="http://www.w3.org/2005/Atom"
//!        xmlns:gd="http://schemas.google.com/g/2005">
//!   <category scheme="http://schemas.google.com/g/2005#kind"
//!             term="http://schemas.google.com/g/2005#event"/>
//!   <gd:when startTime="2026-01-01T10:00:00Z"/>
//! </entry>
//! ```
//!
//! The root element's namespace becomes the default namespace. Every other
//! namespace used in the document is declared on the root, with its
//! preferred prefix when one is known and `nsN` otherwise. The XML
//! namespace always uses the reserved `xml` prefix and is never declared.
//!
//! Indentation only goes between tags. Elements holding text are written
//! verbatim, so text content and mixed content read back unchanged.

use indexmap::IndexSet;
use quick_xml::NsReader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use std::io::Write;

use super::event::{EventBuffer, EventSource, StartTag, XmlEvent, XmlSink, replay};
use super::generate::Generator;
use super::options::GenerateOptions;
use super::parse::Parser;
use crate::base::{QName, namespaces};
use crate::model::{Attribute, Extension, ExtensionKind, ExtensionProfile, ModelError};

// ============================================================================
// READER
// ============================================================================

/// Namespace-resolving token source over an XML byte slice.
pub struct QuickXmlSource<'a> {
    reader: NsReader<&'a [u8]>,
    buf: Vec<u8>,
}

impl<'a> QuickXmlSource<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        let mut reader = NsReader::from_reader(input);
        let config = reader.config_mut();
        config.expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    pub fn from_text(input: &'a str) -> Self {
        Self::new(input.as_bytes())
    }
}

fn utf8(bytes: &[u8], what: &str) -> Result<String, ModelError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| ModelError::xml(format!("Invalid {what}: {e}")))
}

fn namespace_of(resolved: ResolveResult<'_>) -> Result<String, ModelError> {
    match resolved {
        ResolveResult::Bound(namespace) => utf8(namespace.as_ref(), "namespace URI"),
        ResolveResult::Unbound => Ok(String::new()),
        ResolveResult::Unknown(prefix) => Err(ModelError::xml(format!(
            "Unknown namespace prefix '{}'",
            String::from_utf8_lossy(&prefix)
        ))),
    }
}

fn start_tag(
    reader: &NsReader<&[u8]>,
    namespace: String,
    start: &BytesStart<'_>,
) -> Result<StartTag, ModelError> {
    let local = utf8(start.local_name().as_ref(), "tag name")?;
    let mut tag = StartTag::new(QName::new(namespace, local));

    for attribute in start.attributes() {
        let attribute =
            attribute.map_err(|e| ModelError::xml(format!("Attribute error: {e}")))?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attribute.key);
        let name = QName::new(
            namespace_of(resolved)?,
            utf8(local.as_ref(), "attribute name")?,
        );
        let value = attribute
            .unescape_value()
            .map_err(|e| ModelError::xml(format!("Attribute value error: {e}")))?
            .into_owned();
        tag.attributes.push(Attribute::qualified(name, value));
    }
    Ok(tag)
}

impl EventSource for QuickXmlSource<'_> {
    fn next_event(&mut self) -> Result<Option<XmlEvent>, ModelError> {
        loop {
            self.buf.clear();
            let position = self.reader.buffer_position();
            let (namespace, event) = match self.reader.read_resolved_event_into(&mut self.buf) {
                Ok((resolved, event)) => (namespace_of(resolved)?, event),
                Err(e) => {
                    return Err(ModelError::xml(format!(
                        "XML parse error at position {position}: {e}"
                    )));
                }
            };

            match event {
                Event::Start(start) => {
                    return start_tag(&self.reader, namespace, &start)
                        .map(|tag| Some(XmlEvent::Start(tag)));
                }
                Event::End(end) => {
                    let local = utf8(end.local_name().as_ref(), "tag name")?;
                    return Ok(Some(XmlEvent::End(QName::new(namespace, local))));
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map_err(|e| ModelError::xml(format!("Text error: {e}")))?;
                    if !text.is_empty() {
                        return Ok(Some(XmlEvent::Text(text.into_owned())));
                    }
                }
                Event::CData(data) => {
                    return utf8(&data.into_inner(), "CDATA").map(|text| Some(XmlEvent::Text(text)));
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

// ============================================================================
// WRITER
// ============================================================================

/// A namespace binding declared on one open element. `prefix: None` is the
/// default namespace.
#[derive(Debug, Clone)]
struct Binding {
    prefix: Option<String>,
    uri: String,
}

/// Token sink writing XML through quick-xml.
///
/// Elements with no content are written as empty-element tags.
pub struct QuickXmlSink<W: Write> {
    writer: Writer<W>,
    indent: Option<usize>,
    xml_declaration: bool,
    /// Namespaces to declare on the root, besides the root's own.
    root_namespaces: Vec<String>,
    /// Bindings per open element, outermost first.
    scopes: Vec<Vec<Binding>>,
    /// Written tag names per open element.
    open: Vec<String>,
    /// Start tag not yet written, so it can still become an empty element.
    pending: Option<BytesStart<'static>>,
    generated: usize,
    /// Per start tag, in write order: whether the element holds text.
    text_elements: Vec<bool>,
    started: usize,
    /// Depth of the outermost open element holding text.
    verbatim: Option<usize>,
    line_break: bool,
}

impl<W: Write> QuickXmlSink<W> {
    pub fn new(inner: W, options: &GenerateOptions) -> Self {
        Self {
            writer: Writer::new(inner),
            indent: options.indent,
            xml_declaration: options.xml_declaration,
            root_namespaces: Vec::new(),
            scopes: Vec::new(),
            open: Vec::new(),
            pending: None,
            generated: 0,
            text_elements: Vec::new(),
            started: 0,
            verbatim: None,
            line_break: false,
        }
    }

    /// Declare these namespaces on the root element.
    pub fn with_namespaces(mut self, uris: impl IntoIterator<Item = String>) -> Self {
        self.root_namespaces.extend(uris);
        self
    }

    /// Mark elements holding text, one flag per start tag in write order.
    ///
    /// Without these flags an element turns verbatim at its first text, so
    /// children written before that text are still indented.
    pub fn with_text_elements(mut self, flags: Vec<bool>) -> Self {
        self.text_elements = flags;
        self
    }

    /// Return the underlying writer. Fails if elements are still open.
    pub fn finish(mut self) -> Result<W, ModelError> {
        if let Some(open) = self.open.last() {
            return Err(ModelError::xml(format!("Element '{open}' was never closed")));
        }
        self.flush_pending()?;
        Ok(self.writer.into_inner())
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), ModelError> {
        self.writer
            .write_event(event)
            .map_err(|e| ModelError::xml(format!("Write error: {e}")))
    }

    /// Newline and indentation before a tag at `depth`.
    fn break_line(&mut self, depth: usize) -> Result<(), ModelError> {
        let Some(width) = self.indent else {
            return Ok(());
        };
        if !self.line_break || self.verbatim.is_some_and(|outer| outer <= depth) {
            return Ok(());
        }
        let layout = format!("\n{}", " ".repeat(width * depth));
        self.write(Event::Text(BytesText::from_escaped(layout)))
    }

    fn flush_pending(&mut self) -> Result<(), ModelError> {
        match self.pending.take() {
            Some(start) => self.write(Event::Start(start)),
            None => Ok(()),
        }
    }

    /// Bindings visible from the element being opened, innermost first.
    fn visible<'b>(&'b self, declared: &'b [Binding]) -> impl Iterator<Item = &'b Binding> {
        declared
            .iter()
            .rev()
            .chain(self.scopes.iter().rev().flat_map(|scope| scope.iter().rev()))
    }

    fn default_namespace<'b>(&'b self, declared: &'b [Binding]) -> &'b str {
        self.visible(declared)
            .find(|binding| binding.prefix.is_none())
            .map_or("", |binding| binding.uri.as_str())
    }

    fn prefix_for(&self, uri: &str, declared: &[Binding]) -> Option<String> {
        if uri == namespaces::XML {
            return Some("xml".to_string());
        }
        let binding = self
            .visible(declared)
            .find(|binding| binding.prefix.is_some() && binding.uri == uri)?;
        binding.prefix.clone()
    }

    fn choose_prefix(&mut self, uri: &str, declared: &[Binding]) -> String {
        let taken = |sink: &Self, prefix: &str| {
            sink.visible(declared)
                .any(|binding| binding.prefix.as_deref() == Some(prefix))
        };
        if let Some(preferred) = namespaces::preferred_prefix(uri) {
            if !taken(self, preferred) {
                return preferred.to_string();
            }
        }
        loop {
            self.generated += 1;
            let candidate = format!("ns{}", self.generated);
            if !taken(self, &candidate) {
                return candidate;
            }
        }
    }

    /// Prefix for a namespace, declaring it if nothing in scope binds it.
    fn bind(&mut self, uri: &str, declared: &mut Vec<Binding>) -> String {
        if let Some(prefix) = self.prefix_for(uri, declared) {
            return prefix;
        }
        let prefix = self.choose_prefix(uri, declared);
        declared.push(Binding {
            prefix: Some(prefix.clone()),
            uri: uri.to_string(),
        });
        prefix
    }

    fn element_tag(&mut self, name: &QName, declared: &mut Vec<Binding>) -> String {
        let uri = name.namespace();
        if self.default_namespace(declared) == uri {
            return name.local_name().to_string();
        }
        if uri.is_empty() {
            declared.push(Binding {
                prefix: None,
                uri: String::new(),
            });
            return name.local_name().to_string();
        }
        let prefix = self.bind(uri, declared);
        format!("{prefix}:{}", name.local_name())
    }
}

impl<W: Write> XmlSink for QuickXmlSink<W> {
    fn start_element(&mut self, name: &QName, attributes: &[Attribute]) -> Result<(), ModelError> {
        self.flush_pending()?;

        let mut declared = Vec::new();
        if self.scopes.is_empty() {
            if self.xml_declaration {
                self.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
                self.line_break = true;
            }
            if name.is_qualified() {
                declared.push(Binding {
                    prefix: None,
                    uri: name.namespace().to_string(),
                });
            }
            for uri in std::mem::take(&mut self.root_namespaces) {
                if uri.is_empty() || uri == name.namespace() {
                    continue;
                }
                self.bind(&uri, &mut declared);
            }
        }

        let tag = self.element_tag(name, &mut declared);
        let mut written = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            let key = if attribute.name.is_qualified() {
                let prefix = self.bind(attribute.name.namespace(), &mut declared);
                format!("{prefix}:{}", attribute.name.local_name())
            } else {
                attribute.name.local_name().to_string()
            };
            written.push((key, attribute.value.as_str()));
        }

        let mut start = BytesStart::new(tag.clone());
        for binding in &declared {
            let key = match &binding.prefix {
                Some(prefix) => format!("xmlns:{prefix}"),
                None => "xmlns".to_string(),
            };
            start.push_attribute((key.as_str(), binding.uri.as_str()));
        }
        for (key, value) in &written {
            start.push_attribute((key.as_str(), *value));
        }

        let depth = self.open.len();
        self.break_line(depth)?;
        let holds_text = self.text_elements.get(self.started).copied().unwrap_or(false);
        self.started += 1;
        if holds_text && self.verbatim.is_none() {
            self.verbatim = Some(depth);
        }

        self.scopes.push(declared);
        self.open.push(tag);
        self.pending = Some(start);
        self.line_break = true;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), ModelError> {
        self.flush_pending()?;
        if self.verbatim.is_none() && !self.open.is_empty() {
            self.verbatim = Some(self.open.len() - 1);
        }
        self.line_break = false;
        self.write(Event::Text(BytesText::new(text)))
    }

    fn end_element(&mut self, name: &QName) -> Result<(), ModelError> {
        let tag = self
            .open
            .pop()
            .ok_or_else(|| ModelError::xml(format!("End of {name} without a start")))?;
        self.scopes.pop();
        let depth = self.open.len();
        let result = match self.pending.take() {
            Some(start) => self.write(Event::Empty(start)),
            None => {
                self.break_line(depth)?;
                self.write(Event::End(BytesEnd::new(tag)))
            }
        };
        if self.verbatim == Some(depth) {
            self.verbatim = None;
        }
        self.line_break = true;
        result
    }
}

// ============================================================================
// CONVENIENCE
// ============================================================================

/// Namespaces used by element and attribute names, in first-use order.
/// The XML namespace is implicit and left out.
fn used_namespaces(events: &EventBuffer) -> IndexSet<String> {
    let mut uris = IndexSet::new();
    for event in events.events() {
        if let XmlEvent::Start(tag) = event {
            uris.insert(tag.name.namespace().to_string());
            for attribute in &tag.attributes {
                if attribute.name.is_qualified() {
                    uris.insert(attribute.name.namespace().to_string());
                }
            }
        }
    }
    uris.shift_remove(namespaces::XML);
    uris
}

/// One flag per start tag: whether that element has a direct text child.
fn text_elements(events: &EventBuffer) -> Vec<bool> {
    let mut flags = Vec::new();
    let mut open = Vec::new();
    for event in events.events() {
        match event {
            XmlEvent::Start(_) => {
                open.push(flags.len());
                flags.push(false);
            }
            XmlEvent::Text(_) => {
                if let Some(&index) = open.last() {
                    flags[index] = true;
                }
            }
            XmlEvent::End(_) => {
                open.pop();
            }
        }
    }
    flags
}

/// Parse an XML document rooted at `T`.
pub fn from_slice<T: ExtensionKind>(
    profile: &ExtensionProfile,
    input: &[u8],
) -> Result<T, ModelError> {
    Parser::new(profile).parse(QuickXmlSource::new(input))
}

/// Parse an XML document rooted at `T`.
pub fn from_str<T: ExtensionKind>(profile: &ExtensionProfile, input: &str) -> Result<T, ModelError> {
    from_slice(profile, input.as_bytes())
}

/// Write `root` as an XML document.
pub fn to_vec(
    profile: &ExtensionProfile,
    root: &dyn Extension,
    options: &GenerateOptions,
) -> Result<Vec<u8>, ModelError> {
    let events = Generator::with_options(profile, options.clone()).to_events(root)?;
    let mut sink = QuickXmlSink::new(Vec::new(), options)
        .with_namespaces(used_namespaces(&events))
        .with_text_elements(text_elements(&events));
    replay(events, &mut sink)?;
    let mut output = sink.finish()?;
    output.push(b'\n');
    Ok(output)
}

/// Write `root` as an XML string.
pub fn to_string(
    profile: &ExtensionProfile,
    root: &dyn Extension,
    options: &GenerateOptions,
) -> Result<String, ModelError> {
    let bytes = to_vec(profile, root, options)?;
    String::from_utf8(bytes).map_err(|e| ModelError::xml(format!("Invalid UTF-8 output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(input: &str) -> Vec<XmlEvent> {
        let mut source = QuickXmlSource::from_text(input);
        let mut events = Vec::new();
        while let Some(event) = source.next_event().unwrap() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_source_resolves_namespaces() {
        let events = read_all(
            r#"<feed xmlns="urn:a" xmlns:x="urn:x"><x:item x:k="1" plain="2"/></feed>"#,
        );
        assert_eq!(events.len(), 4);
        let XmlEvent::Start(item) = &events[1] else {
            panic!("expected start tag, got {:?}", events[1]);
        };
        assert_eq!(item.name, QName::new("urn:x", "item"));
        assert_eq!(item.attributes[0].name, QName::new("urn:x", "k"));
        assert!(item.attributes[1].is("plain"));
        assert_eq!(events[2], XmlEvent::End(QName::new("urn:x", "item")));
    }

    #[test]
    fn test_source_unescapes_text() {
        let events = read_all(r#"<a xmlns="urn:a">x &amp; y</a>"#);
        assert_eq!(events[1], XmlEvent::text("x & y"));
    }

    #[test]
    fn test_source_rejects_unknown_prefix() {
        let mut source = QuickXmlSource::from_text("<p:a/>");
        assert!(source.next_event().is_err());
    }

    #[test]
    fn test_sink_declares_namespaces_on_root() {
        let options = GenerateOptions::compact();
        let mut sink = QuickXmlSink::new(Vec::new(), &options)
            .with_namespaces(vec![namespaces::GD.to_string()]);
        let root = QName::new(namespaces::ATOM, "entry");
        let when = QName::new(namespaces::GD, "when");
        sink.start_element(&root, &[]).unwrap();
        sink.start_element(&when, &[Attribute::new("startTime", "t")])
            .unwrap();
        sink.end_element(&when).unwrap();
        sink.end_element(&root).unwrap();

        let output = String::from_utf8(sink.finish().unwrap()).unwrap();
        assert_eq!(
            output,
            format!(
                r#"<entry xmlns="{}" xmlns:gd="{}"><gd:when startTime="t"/></entry>"#,
                namespaces::ATOM,
                namespaces::GD
            )
        );
    }

    #[test]
    fn test_sink_generates_prefix_for_unknown_namespace() {
        let options = GenerateOptions::compact();
        let mut sink = QuickXmlSink::new(Vec::new(), &options);
        let root = QName::new(namespaces::ATOM, "entry");
        let custom = QName::new("urn:custom", "thing");
        sink.start_element(&root, &[]).unwrap();
        sink.start_element(&custom, &[]).unwrap();
        sink.text("a < b").unwrap();
        sink.end_element(&custom).unwrap();
        sink.end_element(&root).unwrap();

        let output = String::from_utf8(sink.finish().unwrap()).unwrap();
        assert!(output.contains(r#"<ns1:thing xmlns:ns1="urn:custom">a &lt; b</ns1:thing>"#));
    }

    #[test]
    fn test_sink_indents_between_tags_only() {
        let options = GenerateOptions {
            xml_declaration: false,
            ..GenerateOptions::default()
        };
        let name = |local: &str| QName::new("urn:a", local);
        let mut sink =
            QuickXmlSink::new(Vec::new(), &options).with_text_elements(vec![false, true, true, false]);
        sink.start_element(&name("entry"), &[]).unwrap();
        sink.start_element(&name("title"), &[]).unwrap();
        sink.text("  padded  ").unwrap();
        sink.end_element(&name("title")).unwrap();
        sink.start_element(&name("note"), &[]).unwrap();
        sink.start_element(&name("b"), &[]).unwrap();
        sink.end_element(&name("b")).unwrap();
        sink.text(" c").unwrap();
        sink.end_element(&name("note")).unwrap();
        sink.end_element(&name("entry")).unwrap();

        let output = String::from_utf8(sink.finish().unwrap()).unwrap();
        assert_eq!(
            output,
            "<entry xmlns=\"urn:a\">\n  <title>  padded  </title>\n  <note><b/> c</note>\n</entry>"
        );
    }

    #[test]
    fn test_sink_writes_xml_namespace_with_reserved_prefix() {
        let options = GenerateOptions::compact();
        let mut sink = QuickXmlSink::new(Vec::new(), &options)
            .with_namespaces(vec![namespaces::XML.to_string()]);
        let root = QName::new("urn:a", "a");
        let lang = Attribute::qualified(QName::new(namespaces::XML, "lang"), "en");
        sink.start_element(&root, &[lang]).unwrap();
        sink.end_element(&root).unwrap();

        let output = String::from_utf8(sink.finish().unwrap()).unwrap();
        assert_eq!(output, r#"<a xmlns="urn:a" xml:lang="en"/>"#);
    }

    #[test]
    fn test_source_resolves_xml_prefix_and_keeps_padding() {
        let events = read_all(r#"<a xmlns="urn:a" xml:lang="en">  x  </a>"#);
        let XmlEvent::Start(tag) = &events[0] else {
            panic!("expected start tag, got {:?}", events[0]);
        };
        assert_eq!(tag.attributes[0].name, QName::new(namespaces::XML, "lang"));
        assert_eq!(events[1], XmlEvent::text("  x  "));
    }

    #[test]
    fn test_sink_rejects_unclosed_elements() {
        let options = GenerateOptions::compact();
        let mut sink = QuickXmlSink::new(Vec::new(), &options);
        sink.start_element(&QName::new("urn:a", "a"), &[]).unwrap();
        assert!(sink.finish().is_err());
    }
}
