//! Multi-format text extraction for lecture material (PDF, PPTX, DOCX).
//!
//! Stores supply bytes plus a declared content type and a file name; this
//! module classifies the document into a [`DocumentKind`] and returns plain
//! UTF-8 text. Unknown kinds are reported as [`ExtractError::Unsupported`]
//! so the resolver can skip them.

use std::collections::{HashMap, HashSet};
use std::io::Read;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::store::drive::{MIME_GOOGLE_DOCS, MIME_GOOGLE_SLIDES};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extraction error. Never a panic; callers skip the document.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported document: {0}")]
    Unsupported(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("OOXML extraction failed: {0}")]
    Ooxml(String),
}

/// The closed set of document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Pdf,
    SlidePresentation,
    WordProcessorDocument,
}

impl DocumentKind {
    /// Classifies by declared content type, falling back to the file-name
    /// suffix when the content type is missing or generic.
    pub fn classify(name: &str, content_type: Option<&str>) -> Option<Self> {
        if let Some(kind) = content_type.and_then(Self::from_content_type) {
            return Some(kind);
        }
        Self::from_file_name(name)
    }

    pub fn from_content_type(content_type: &str) -> Option<Self> {
        // Strip parameters such as "; charset=binary".
        let essence = content_type.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            MIME_PDF => Some(Self::Pdf),
            // Native Google files are exported to OOXML on download.
            MIME_PPTX | MIME_GOOGLE_SLIDES => Some(Self::SlidePresentation),
            MIME_DOCX | MIME_GOOGLE_DOCS => Some(Self::WordProcessorDocument),
            _ => None,
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "pptx" => Some(Self::SlidePresentation),
            "docx" => Some(Self::WordProcessorDocument),
            _ => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => MIME_PDF,
            Self::SlidePresentation => MIME_PPTX,
            Self::WordProcessorDocument => MIME_DOCX,
        }
    }

    pub fn extract(self, bytes: &[u8]) -> Result<String, ExtractError> {
        match self {
            Self::Pdf => extract_pdf(bytes),
            Self::SlidePresentation => extract_pptx(bytes),
            Self::WordProcessorDocument => extract_docx(bytes),
        }
    }
}

/// Classifies `name`/`content_type` and extracts the text of `bytes`.
pub fn extract_text(
    bytes: &[u8],
    name: &str,
    content_type: Option<&str>,
) -> Result<String, ExtractError> {
    let kind = DocumentKind::classify(name, content_type).ok_or_else(|| {
        ExtractError::Unsupported(format!(
            "{} ({})",
            name,
            content_type.unwrap_or("no content-type")
        ))
    })?;
    kind.extract(bytes)
}

/// Page texts, in page order, joined by newlines.
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(pages
        .iter()
        .map(|page| page.trim())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn open_archive(bytes: &[u8]) -> Result<zip::ZipArchive<std::io::Cursor<&[u8]>>, ExtractError> {
    zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| ExtractError::Ooxml(e.to_string()))
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

/// Every paragraph of `word/document.xml`, newline-joined.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = open_archive(bytes)?;
    let xml = read_zip_entry_bounded(&mut archive, "word/document.xml", MAX_XML_ENTRY_BYTES)?;
    Ok(collect_paragraphs(&xml)?.join("\n"))
}

/// Every text-bearing shape of every slide, each followed by a newline.
fn extract_pptx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = open_archive(bytes)?;
    let slide_names = match presentation_slide_order(&mut archive)? {
        Some(order) if !order.is_empty() => order,
        _ => numbered_slide_order(&archive),
    };
    let mut out = String::new();
    for name in slide_names {
        let xml = read_zip_entry_bounded(&mut archive, &name, MAX_XML_ENTRY_BYTES)?;
        for shape in collect_shape_texts(&xml)? {
            out.push_str(&shape);
            out.push('\n');
        }
    }
    Ok(out)
}

/// Slide parts in the order of `<p:sldIdLst>`, resolved through the
/// presentation relationships. `None` when the deck has no presentation part.
fn presentation_slide_order(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Result<Option<Vec<String>>, ExtractError> {
    const PRESENTATION: &str = "ppt/presentation.xml";
    const RELS: &str = "ppt/_rels/presentation.xml.rels";

    let entries: HashSet<String> = archive.file_names().map(str::to_string).collect();
    if !entries.contains(PRESENTATION) || !entries.contains(RELS) {
        return Ok(None);
    }

    let presentation = read_zip_entry_bounded(archive, PRESENTATION, MAX_XML_ENTRY_BYTES)?;
    let rels = read_zip_entry_bounded(archive, RELS, MAX_XML_ENTRY_BYTES)?;
    let targets = relationship_targets(&rels)?;

    let order = slide_relationship_ids(&presentation)?
        .iter()
        .filter_map(|id| targets.get(id))
        .map(|target| match target.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("ppt/{}", target),
        })
        .filter(|name| entries.contains(name))
        .collect();
    Ok(Some(order))
}

/// `ppt/slides/slideN.xml` parts sorted by N.
fn numbered_slide_order(archive: &zip::ZipArchive<std::io::Cursor<&[u8]>>) -> Vec<String> {
    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    slide_names.sort_by_key(|name| {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    slide_names
}

/// Relationship ids (`r:id`) of every `<p:sldId>`, in presentation order.
fn slide_relationship_ids(xml: &[u8]) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut ids = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sldId" => {
                for attr in e.attributes().flatten() {
                    // The numeric `id` is unprefixed; the relationship id is `r:id`.
                    if attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id" {
                        let value = attr
                            .unescape_value()
                            .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
                        ids.push(value.into_owned());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(ids)
}

/// `Id` to `Target` of every `<Relationship>` in a `.rels` part.
fn relationship_targets(xml: &[u8]) -> Result<HashMap<String, String>, ExtractError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut targets = HashMap::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    let value = attr
                        .unescape_value()
                        .map_err(|e| ExtractError::Ooxml(e.to_string()))?
                        .into_owned();
                    match attr.key.as_ref() {
                        b"Id" => id = Some(value),
                        b"Target" => target = Some(value),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

/// Texts of `<w:p>` paragraphs in document order.
///
/// Paragraphs nested inside another paragraph (text boxes) are emitted as
/// their own entries when they close.
fn collect_paragraphs(xml: &[u8]) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"tab" => push_to_open(&mut open, "\t"),
                b"br" | b"cr" => push_to_open(&mut open, "\n"),
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(|e| ExtractError::Ooxml(e.to_string()))?;
                push_to_open(&mut open, &text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(p) = open.pop() {
                        paragraphs.push(p);
                    }
                }
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs)
}

fn push_to_open(open: &mut [String], text: &str) {
    if let Some(current) = open.last_mut() {
        current.push_str(text);
    }
}

/// Text of every `<p:sp>` shape that carries a `<p:txBody>`, in slide order.
fn collect_shape_texts(xml: &[u8]) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut shapes = Vec::new();
    // (has text body, paragraphs) of the shape being read.
    let mut shape: Option<(bool, Vec<String>)> = None;
    let mut paragraph: Option<String> = None;
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"sp" => shape = Some((false, Vec::new())),
                b"txBody" => {
                    if let Some((has_body, _)) = shape.as_mut() {
                        *has_body = true;
                    }
                }
                b"p" if shape.is_some() => paragraph = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some((_, paragraphs)) = shape.as_mut() {
                        paragraphs.push(String::new());
                    }
                }
                b"br" => {
                    if let Some(p) = paragraph.as_mut() {
                        p.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(|e| ExtractError::Ooxml(e.to_string()))?;
                if let Some(p) = paragraph.as_mut() {
                    p.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if let (Some(p), Some((_, paragraphs))) = (paragraph.take(), shape.as_mut()) {
                        paragraphs.push(p);
                    }
                }
                b"sp" => {
                    if let Some((true, paragraphs)) = shape.take() {
                        shapes.push(paragraphs.join("\n"));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(shapes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_is_unsupported() {
        let err = extract_text(b"foo", "notes.hwp", Some("application/octet-stream")).unwrap_err();
        assert!(matches!(err, ExtractError::Unsupported(_)));
    }

    #[test]
    fn content_type_wins_over_suffix() {
        assert_eq!(
            DocumentKind::classify("slides.pdf", Some(MIME_PPTX)),
            Some(DocumentKind::SlidePresentation)
        );
    }

    #[test]
    fn suffix_used_for_generic_content_type() {
        assert_eq!(
            DocumentKind::classify("3주차 강의.PPTX", Some("application/octet-stream")),
            Some(DocumentKind::SlidePresentation)
        );
        assert_eq!(
            DocumentKind::classify("handout.docx", None),
            Some(DocumentKind::WordProcessorDocument)
        );
        assert_eq!(DocumentKind::classify("README", None), None);
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        assert_eq!(
            DocumentKind::from_content_type("Application/PDF; charset=binary"),
            Some(DocumentKind::Pdf)
        );
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_text(b"not a pdf", "a.pdf", Some(MIME_PDF)).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn invalid_zip_returns_error_for_docx() {
        let err = extract_text(b"not a zip", "a.docx", None).unwrap_err();
        assert!(matches!(err, ExtractError::Ooxml(_)));
    }

    #[test]
    fn docx_paragraphs_are_newline_joined() {
        let xml = br#"<w:document xmlns:w="w"><w:body>
            <w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>
            <w:p/>
            <w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let paragraphs = collect_paragraphs(xml).unwrap();
        assert_eq!(paragraphs.join("\n"), "Hello world\n\na\tb");
    }

    #[test]
    fn slide_shapes_without_text_body_are_skipped() {
        let xml = br#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree>
            <p:sp><p:txBody><a:p><a:r><a:t>Title</a:t></a:r></a:p></p:txBody></p:sp>
            <p:sp><p:spPr/></p:sp>
            <p:sp><p:txBody><a:p><a:r><a:t>one</a:t></a:r></a:p><a:p><a:r><a:t>two</a:t></a:r></a:p></p:txBody></p:sp>
        </p:spTree></p:cSld></p:sld>"#;
        assert_eq!(collect_shape_texts(xml).unwrap(), vec!["Title", "one\ntwo"]);
    }

    #[test]
    fn escaped_entities_are_unescaped() {
        let xml = br#"<w:body xmlns:w="w"><w:p><w:r><w:t>A &amp; B</w:t></w:r></w:p></w:body>"#;
        assert_eq!(collect_paragraphs(xml).unwrap(), vec!["A & B"]);
    }
}
