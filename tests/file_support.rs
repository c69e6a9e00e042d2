//! Integration tests for multi-format text extraction.
//!
//! Asserts page-ordered PDF text, slide/shape-ordered PPTX text, paragraph
//! joined DOCX text, and that malformed or unknown files fail without
//! panicking.

mod common;

use common::{
    docx_with_paragraphs, pdf_with_pages, pptx_with_presentation_order, pptx_with_slides,
};
use lecture_brief::extract::{
    extract_text, DocumentKind, ExtractError, MIME_DOCX, MIME_PDF, MIME_PPTX,
};

#[test]
fn pdf_pages_are_joined_in_order() {
    let pdf = pdf_with_pages(&["X", "Y"]);
    let text = extract_text(&pdf, "week.pdf", Some(MIME_PDF)).unwrap();
    assert_eq!(text, "X\nY");
}

#[test]
fn pdf_single_page_phrase() {
    let pdf = pdf_with_pages(&["lecture test phrase"]);
    let text = extract_text(&pdf, "week.pdf", None).unwrap();
    assert!(text.contains("lecture test phrase"), "got {:?}", text);
}

#[test]
fn slide_shapes_each_end_with_newline() {
    let pptx = pptx_with_slides(&[&["P"], &["Q"]]);
    let text = extract_text(&pptx, "deck.pptx", Some(MIME_PPTX)).unwrap();
    assert_eq!(text, "P\nQ\n");
}

#[test]
fn slides_follow_numeric_order() {
    let slides: [&[&str]; 10] = [
        &["s1"],
        &["s2"],
        &["s3"],
        &["s4"],
        &["s5"],
        &["s6"],
        &["s7"],
        &["s8"],
        &["s9"],
        &["s10", "s10b"],
    ];
    let pptx = pptx_with_slides(&slides);
    let text = extract_text(&pptx, "deck.pptx", None).unwrap();
    assert_eq!(text, "s1\ns2\ns3\ns4\ns5\ns6\ns7\ns8\ns9\ns10\ns10b\n");
}

#[test]
fn slides_follow_presentation_order_over_part_names() {
    let pptx = pptx_with_presentation_order(&[&["one"], &["two"], &["three"]], &[3, 1, 2]);
    let text = extract_text(&pptx, "reordered.pptx", None).unwrap();
    assert_eq!(text, "three\none\ntwo\n");
}

#[test]
fn docx_paragraphs_are_newline_joined() {
    let docx = docx_with_paragraphs(&["교육공학 3주차", "학습 이론 개관"]);
    let text = extract_text(&docx, "handout.docx", Some(MIME_DOCX)).unwrap();
    assert_eq!(text, "교육공학 3주차\n학습 이론 개관");
}

#[test]
fn docx_keeps_inner_spacing() {
    let docx = docx_with_paragraphs(&["  indented  "]);
    let text = extract_text(&docx, "handout.docx", None).unwrap();
    assert_eq!(text, "  indented  ");
}

#[test]
fn docx_without_document_xml_fails() {
    let pptx = pptx_with_slides(&[&["P"]]);
    let err = DocumentKind::WordProcessorDocument.extract(&pptx).unwrap_err();
    assert!(matches!(err, ExtractError::Ooxml(_)));
}

#[test]
fn unknown_format_is_unsupported() {
    let err = extract_text(b"HWP Document File", "3주차.hwp", None).unwrap_err();
    assert!(matches!(err, ExtractError::Unsupported(_)));
}
