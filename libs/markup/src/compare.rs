//! Structural comparison of documents
//!
//! Two documents are equivalent when their root elements have the same names, the same
//! attribute sets and equivalent children. Whitespace-only text is ignored, adjacent text and
//! CDATA runs are merged, and runs of whitespace inside text compare equal. Comments are not
//! compared.

use crate::document::{Document, NodeId, NodeKind};

enum Item {
    Element(NodeId),
    Text(String),
}

fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn items(doc: &Document, id: NodeId) -> Vec<Item> {
    let mut result = Vec::new();
    let mut pending = String::new();

    let flush = |pending: &mut String, result: &mut Vec<Item>| {
        let text = normalize_space(pending);
        if !text.is_empty() {
            result.push(Item::Text(text));
        }
        pending.clear();
    };

    for &child in doc.children(id) {
        match doc.kind(child) {
            NodeKind::Text(s) | NodeKind::CData(s) => pending.push_str(s),
            NodeKind::Element { .. } => {
                flush(&mut pending, &mut result);
                result.push(Item::Element(child));
            }
            NodeKind::Comment(_) | NodeKind::Document => {}
        }
    }
    flush(&mut pending, &mut result);
    result
}

fn sorted_attributes(doc: &Document, id: NodeId) -> Vec<(&str, &str)> {
    let mut attributes: Vec<(&str, &str)> = doc
        .attributes(id)
        .iter()
        .map(|a| (a.name.as_str(), a.value.as_str()))
        .collect();
    attributes.sort();
    attributes
}

fn elements_equivalent(a: &Document, a_id: NodeId, b: &Document, b_id: NodeId) -> bool {
    if a.name(a_id) != b.name(b_id) || sorted_attributes(a, a_id) != sorted_attributes(b, b_id) {
        return false;
    }

    let left = items(a, a_id);
    let right = items(b, b_id);
    left.len() == right.len()
        && left.iter().zip(right.iter()).all(|pair| match pair {
            (Item::Text(x), Item::Text(y)) => x == y,
            (Item::Element(x), Item::Element(y)) => elements_equivalent(a, *x, b, *y),
            _ => false,
        })
}

impl Document {
    pub fn equivalent(&self, other: &Document) -> bool {
        match (self.root_element(), other.root_element()) {
            (Some(a), Some(b)) => elements_equivalent(self, a, other, b),
            (None, None) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_formatting_whitespace_and_attribute_order() {
        let a = Document::parse("<a x=\"1\" y=\"2\">\n  <b>text</b>\n</a>").unwrap();
        let b = Document::parse("<a y=\"2\" x=\"1\"><b> text </b></a>").unwrap();
        assert!(a.equivalent(&b));
    }

    #[test]
    fn merges_text_with_cdata() {
        let a = Document::parse("<a><![CDATA[bla bla]]></a>").unwrap();
        let b = Document::parse("<a>bla bla</a>").unwrap();
        assert!(a.equivalent(&b));
    }

    #[test]
    fn detects_different_content() {
        let a = Document::parse("<a><b/></a>").unwrap();
        let b = Document::parse("<a><c/></a>").unwrap();
        assert!(!a.equivalent(&b));
    }
}
