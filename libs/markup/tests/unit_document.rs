//! Integration tests for the markup document model

use thyme_markup::{Document, NodeKind};

const NS: &str = "http://www.hekkelman.com/libzeep/m2";

#[test]
fn test_namespace_resolution_walks_ancestors() {
    let doc = Document::parse(
        r#"<data xmlns="urn:default" xmlns:m="http://www.hekkelman.com/libzeep/m2"><div><span m:text="x"/></div></data>"#,
    )
    .unwrap();

    let root = doc.root_element().unwrap();
    let span = doc
        .descendants(root)
        .into_iter()
        .find(|&n| doc.name(n) == Some("span"))
        .unwrap();

    assert_eq!(doc.namespace_for_prefix(span, "m"), Some(NS));
    assert_eq!(doc.namespace_uri(span), Some("urn:default"));
    assert_eq!(doc.prefix_for_namespace(span, NS).as_deref(), Some("m"));
    assert_eq!(doc.attribute_name_in(span, NS, "text").as_deref(), Some("m:text"));

    let attr = &doc.attributes(span)[0];
    assert_eq!(doc.attribute_namespace(span, attr), Some(NS));
}

#[test]
fn test_unprefixed_attribute_has_no_namespace() {
    let doc = Document::parse(r#"<a xmlns="urn:x" id="1"/>"#).unwrap();
    let root = doc.root_element().unwrap();
    let id = doc.attributes(root).iter().find(|a| a.name == "id").unwrap();
    assert_eq!(doc.attribute_namespace(root, id), None);
}

#[test]
fn test_import_subtree_copies_between_documents() {
    let source = Document::parse("<a><b c=\"1\">text<!--note--></b></a>").unwrap();
    let b = source.element_children(source.root_element().unwrap())[0];

    let mut dest = Document::parse("<root/>").unwrap();
    let copy = dest.import_subtree(&source, b);
    let root = dest.root_element().unwrap();
    dest.append_child(root, copy);

    assert_eq!(dest.to_xml().unwrap(), "<root><b c=\"1\">text<!--note--></b></root>");
    assert_eq!(source.to_xml().unwrap(), "<a><b c=\"1\">text<!--note--></b></a>");
}

#[test]
fn test_rename_prefix_leaves_declarations_alone() {
    let mut doc = Document::parse(r#"<x:a xmlns:x="urn:x"><x:b x:c="1"/></x:a>"#).unwrap();
    let root = doc.root_element().unwrap();
    doc.rename_prefix(root, "x", "y");

    assert_eq!(doc.to_xml().unwrap(), r#"<y:a xmlns:x="urn:x"><y:b y:c="1"/></y:a>"#);
}

#[test]
fn test_set_attribute_keeps_position() {
    let mut doc = Document::parse(r#"<a x="1" y="2"/>"#).unwrap();
    let root = doc.root_element().unwrap();
    doc.set_attribute(root, "x", "3");
    doc.set_attribute(root, "z", "4");

    let names: Vec<&str> = doc.attributes(root).iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["x", "y", "z"]);
    assert_eq!(doc.remove_attribute(root, "y").as_deref(), Some("2"));
    assert_eq!(doc.attribute(root, "y"), None);
}

#[test]
fn test_cdata_and_comments_survive_round_trip() {
    let doc = Document::parse("<s><![CDATA[a < b]]><!-- c --></s>").unwrap();
    let root = doc.root_element().unwrap();
    let kinds: Vec<&NodeKind> = doc.children(root).iter().map(|&c| doc.kind(c)).collect();

    assert!(matches!(kinds[0], NodeKind::CData(s) if s == "a < b"));
    assert!(matches!(kinds[1], NodeKind::Comment(_)));
    assert_eq!(doc.to_xml().unwrap(), "<s><![CDATA[a < b]]><!-- c --></s>");
}

#[test]
fn test_equivalent_ignores_comments_but_not_text() {
    let a = Document::parse("<a>one<!-- x --> two</a>").unwrap();
    let b = Document::parse("<a>one two</a>").unwrap();
    let c = Document::parse("<a>one three</a>").unwrap();

    assert!(a.equivalent(&b));
    assert!(!a.equivalent(&c));
}

#[test]
fn test_missing_root_is_rejected() {
    assert!(Document::parse("   ").is_err());
}
