//! quick-xml backed parser building a [`Document`]

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::document::{Attribute, Declaration, Document, NodeId, NodeKind};
use crate::error::{MarkupError, Result};

const FRAGMENT_WRAPPER: &str = "fragment";

impl Document {
    /// Parse a complete XML document
    pub fn parse(input: &str) -> Result<Document> {
        let mut doc = Document::new();
        let top = doc.document_node();
        read_into(&mut doc, top, input)?;
        if doc.root_element().is_none() {
            return Err(MarkupError::NoRootElement);
        }
        Ok(doc)
    }

    /// Parse mixed content (text and elements). The nodes end up as children of the returned
    /// wrapper element.
    pub fn parse_fragment(markup: &str) -> Result<(Document, NodeId)> {
        let wrapped = format!("<{FRAGMENT_WRAPPER}>{markup}</{FRAGMENT_WRAPPER}>");
        let doc = Document::parse(&wrapped)?;
        let wrapper = doc.root_element().ok_or(MarkupError::NoRootElement)?;
        Ok((doc, wrapper))
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<NodeKind> {
    let name = std::str::from_utf8(start.name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.into_owned();
        attributes.push(Attribute::new(key, value));
    }
    Ok(NodeKind::Element { name, attributes })
}

fn read_into(doc: &mut Document, top: NodeId, input: &str) -> Result<()> {
    let mut reader = Reader::from_str(input);
    let mut stack = vec![top];

    loop {
        let current = *stack.last().unwrap_or(&top);
        match reader.read_event()? {
            Event::Decl(decl) => {
                let version = decl
                    .version()
                    .map(|v| String::from_utf8_lossy(&v).into_owned())
                    .unwrap_or_else(|_| String::from("1.0"));
                let encoding = decl
                    .encoding()
                    .and_then(|e| e.ok())
                    .map(|e| String::from_utf8_lossy(&e).into_owned());
                let standalone = decl
                    .standalone()
                    .and_then(|s| s.ok())
                    .map(|s| String::from_utf8_lossy(&s).into_owned());
                doc.set_declaration(Some(Declaration {
                    version,
                    encoding,
                    standalone,
                }));
            }
            Event::DocType(text) => {
                let doctype = std::str::from_utf8(&text)?.trim().to_string();
                doc.set_doctype(Some(doctype));
            }
            Event::Start(start) => {
                let node = doc.create_node(element_from(&start)?);
                doc.append_child(current, node);
                stack.push(node);
            }
            Event::Empty(start) => {
                let node = doc.create_node(element_from(&start)?);
                doc.append_child(current, node);
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Text(text) => {
                let text = text.unescape()?.into_owned();
                // whitespace between prolog, doctype and root is not content
                if current == top && text.trim().is_empty() {
                    continue;
                }
                let node = doc.create_text(text);
                doc.append_child(current, node);
            }
            Event::CData(data) => {
                let text = std::str::from_utf8(&data)?.to_string();
                let node = doc.create_node(NodeKind::CData(text));
                doc.append_child(current, node);
            }
            Event::Comment(text) => {
                let text = std::str::from_utf8(&text)?.to_string();
                let node = doc.create_node(NodeKind::Comment(text));
                doc.append_child(current, node);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() > 1 {
        let open = stack
            .last()
            .and_then(|&id| doc.name(id))
            .unwrap_or_default()
            .to_string();
        return Err(MarkupError::Unclosed(open));
    }

    Ok(())
}
