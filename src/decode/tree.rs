use super::DecodeError;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

/// A namespace-resolved XML element.
///
/// CAP documents are small, so the decoder reads the whole document into this tree first and then
/// maps it onto the model types.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub(crate) struct Element {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    /// Child elements with the given local name, in any namespace.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Child elements with the given local name in one of `namespaces`.
    pub fn children_in<'a>(
        &'a self,
        namespaces: &'a [&'a str],
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children_named(name).filter(move |c| {
            c.namespace
                .as_deref()
                .map(|ns| namespaces.contains(&ns))
                .unwrap_or(false)
        })
    }

    pub fn child<'a>(&'a self, name: &'a str) -> Option<&'a Element> {
        self.children_named(name).next()
    }

    /// Text of the first child named `name`, or an empty string.
    pub fn child_text(&self, name: &str) -> String {
        self.child(name).map(|c| c.text.clone()).unwrap_or_default()
    }

    pub fn child_text_in(&self, namespaces: &[&str], name: &str) -> String {
        self.children_in(namespaces, name)
            .next()
            .map(|c| c.text.clone())
            .unwrap_or_default()
    }

    /// Text of every child named `name`, in document order.
    pub fn children_text(&self, name: &str) -> Vec<String> {
        self.children_named(name).map(|c| c.text.clone()).collect()
    }

    pub fn children_text_in(&self, namespaces: &[&str], name: &str) -> Vec<String> {
        self.children_in(namespaces, name)
            .map(|c| c.text.clone())
            .collect()
    }

    /// Value of an unprefixed attribute, or an empty string.
    pub fn attribute(&self, name: &str) -> String {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }
}

/// Documents nested deeper than this are rejected rather than risking the stack.
const MAX_DEPTH: usize = 1024;

/// Parse a complete document, returning its root element.
///
/// Any well-formedness problem is reported as [`DecodeError::Malformed`]; there is no partial
/// recovery.
pub(crate) fn parse(input: &[u8]) -> Result<Element, DecodeError> {
    let mut reader = NsReader::from_reader(input);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (namespace, event) = reader.read_resolved_event_into(&mut buf)?;
        let namespace = match namespace {
            ResolveResult::Bound(ns) => Some(
                std::str::from_utf8(ns.as_ref())
                    .map_err(|e| DecodeError::Malformed(format!("namespace: {}", e)))?
                    .to_string(),
            ),
            ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
        };
        // the declared encoding is only known once the XML declaration has been read
        let decoder = reader.decoder();

        match event {
            Event::Start(start) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(DecodeError::Malformed("nesting too deep".to_string()));
                }
                stack.push(open(decoder, namespace, &start)?);
            }
            Event::Empty(start) => {
                let element = open(decoder, namespace, &start)?;
                close(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                // quick-xml has already matched the end tag against its start tag
                let element = stack.pop().ok_or_else(|| {
                    DecodeError::Malformed("end tag without a start tag".to_string())
                })?;
                close(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(cdata) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&decode(decoder, &cdata, "CDATA")?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(DecodeError::Malformed(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| DecodeError::Malformed("no root element".to_string()))
}

fn decode(decoder: Decoder, bytes: &[u8], what: &str) -> Result<String, DecodeError> {
    decoder
        .decode(bytes)
        .map(|s| s.into_owned())
        .map_err(|e| DecodeError::Malformed(format!("{}: {}", what, e)))
}

fn open(
    decoder: Decoder,
    namespace: Option<String>,
    start: &BytesStart,
) -> Result<Element, DecodeError> {
    let name = decode(decoder, start.local_name().as_ref(), "element name")?;

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let key = decode(decoder, attr.key.local_name().as_ref(), "attribute name")?;
        let value = attr.decode_and_unescape_value(decoder)?.into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        namespace,
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn close(
    element: Element,
    stack: &mut Vec<Element>,
    root: &mut Option<Element>,
) -> Result<(), DecodeError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(DecodeError::Malformed(format!(
            "second root element <{}>",
            element.name
        ))),
    }
}
