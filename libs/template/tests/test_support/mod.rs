#![allow(dead_code)]

use std::path::PathBuf;

use thyme_markup::Document;
use thyme_template::{FileLoader, ProcessorOptions, Scope, TagProcessor};

pub const NS: &str = "http://www.hekkelman.com/libzeep/m2";

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Parse and process `src`, returning the serialized result
pub fn process_to_xml(src: &str, scope: &Scope<'_>) -> String {
    let doc = process_document(src, scope);
    doc.to_xml().expect("failed to serialize document")
}

pub fn process_document(src: &str, scope: &Scope<'_>) -> Document {
    let mut doc = Document::parse(src).expect("failed to parse template");
    let options = ProcessorOptions::default();
    let loader = FileLoader::new(fixtures_dir()).expect("failed to open fixtures");

    let root = doc.root_element().expect("template has no root element");
    let mut processor = TagProcessor::new(&options, &loader, "");
    processor
        .process(&mut doc, root, scope)
        .expect("processing failed");
    doc
}

/// Process `src` and assert the result is structurally equal to `expected`
pub fn process_and_compare(src: &str, expected: &str, scope: &Scope<'_>) {
    let doc = process_document(src, scope);
    let expected_doc = Document::parse(expected).expect("failed to parse expected document");

    if !doc.equivalent(&expected_doc) {
        panic!(
            "documents differ\n--- processed ---\n{}\n--- expected ---\n{}",
            doc.to_xml().unwrap_or_default(),
            expected_doc.to_xml().unwrap_or_default()
        );
    }
}
