//! Serialization of a [`Document`] through quick-xml's `Writer`

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

use crate::document::{Document, NodeId, NodeKind};
use crate::error::Result;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

impl Document {
    /// Serialize the whole document, declaration and doctype included
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        if let Some(decl) = self.declaration() {
            writer.write_event(Event::Decl(BytesDecl::new(
                &decl.version,
                decl.encoding.as_deref(),
                decl.standalone.as_deref(),
            )))?;
            writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
        }

        if let Some(doctype) = self.doctype() {
            writer.write_event(Event::DocType(BytesText::from_escaped(doctype)))?;
            writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
        }

        for &child in self.children(self.document_node()) {
            write_node(&mut writer, self, child)?;
        }

        Ok(String::from_utf8(writer.into_inner().into_inner())?)
    }

    /// Serialize a single node and its subtree
    pub fn node_to_xml(&self, id: NodeId) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        write_node(&mut writer, self, id)?;
        Ok(String::from_utf8(writer.into_inner().into_inner())?)
    }
}

fn has_content(doc: &Document, id: NodeId) -> bool {
    doc.children(id).iter().any(|&c| match doc.kind(c) {
        NodeKind::Text(s) => !s.is_empty(),
        _ => true,
    })
}

fn write_node(writer: &mut XmlWriter, doc: &Document, id: NodeId) -> Result<()> {
    match doc.kind(id) {
        NodeKind::Document => {
            for &child in doc.children(id) {
                write_node(writer, doc, child)?;
            }
        }
        NodeKind::Element { name, attributes } => {
            let mut start = BytesStart::new(name.as_str());
            for attr in attributes {
                start.push_attribute((attr.name.as_str(), attr.value.as_str()));
            }

            if has_content(doc, id) {
                writer.write_event(Event::Start(start))?;
                for &child in doc.children(id) {
                    write_node(writer, doc, child)?;
                }
                writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
            } else {
                writer.write_event(Event::Empty(start))?;
            }
        }
        NodeKind::Text(text) => {
            if !text.is_empty() {
                writer.write_event(Event::Text(BytesText::new(text)))?;
            }
        }
        NodeKind::CData(text) => {
            writer.write_event(Event::CData(BytesCData::new(text.as_str())))?;
        }
        NodeKind::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?;
        }
    }
    Ok(())
}
