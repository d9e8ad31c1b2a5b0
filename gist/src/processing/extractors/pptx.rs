//! PPTX extractor using zip + quick-xml

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;

use async_trait::async_trait;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use super::{read_file, TextExtractor};
use crate::error::{GistError, Result};
use crate::models::DocumentType;

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

/// Text of every shape on every slide, in presentation order.
///
/// Paragraphs inside a shape are joined by newlines; shapes are joined by a
/// single space. Shapes without a text body, or whose text is blank, are skipped.
pub struct PptxExtractor;

impl PptxExtractor {
    pub fn extract_bytes(bytes: &[u8]) -> Result<String> {
        let mut archive =
            ZipArchive::new(Cursor::new(bytes)).map_err(|e| GistError::extraction("PPTX", e))?;

        let slide_order = Self::slide_order(&mut archive)?;
        let slide_mapping = Self::slide_mapping(&mut archive)?;

        let mut shapes = Vec::new();
        for (index, r_id) in slide_order.iter().enumerate() {
            let slide_path = slide_mapping
                .get(r_id)
                .cloned()
                .unwrap_or_else(|| format!("ppt/slides/slide{}.xml", index + 1));

            // A dangling relationship should not sink the whole deck.
            let Ok(xml) = Self::read_entry(&mut archive, &slide_path) else {
                tracing::debug!(slide = %slide_path, "Slide missing from archive");
                continue;
            };
            shapes.extend(Self::shape_texts(&xml)?);
        }

        Ok(shapes.join(" ").trim().to_string())
    }

    fn slide_order(archive: &mut Archive<'_>) -> Result<Vec<String>> {
        let xml = Self::read_entry(archive, "ppt/presentation.xml")?;

        let mut reader = Reader::from_str(&xml);
        reader.config_mut().trim_text(true);

        let mut slide_ids = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"p:sldId" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"r:id" {
                            if let Ok(val) = std::str::from_utf8(&attr.value) {
                                slide_ids.push(val.to_string());
                            }
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(GistError::extraction(
                        "PPTX",
                        format!("malformed presentation.xml: {e}"),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(slide_ids)
    }

    /// Relationship id to slide part path.
    fn slide_mapping(archive: &mut Archive<'_>) -> Result<HashMap<String, String>> {
        let Ok(xml) = Self::read_entry(archive, "ppt/_rels/presentation.xml.rels") else {
            return Ok(HashMap::new());
        };

        let mut reader = Reader::from_str(&xml);
        reader.config_mut().trim_text(true);

        let mut mapping = HashMap::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;

                    for attr in e.attributes().flatten() {
                        let value = std::str::from_utf8(&attr.value).ok().map(String::from);
                        match attr.key.as_ref() {
                            b"Id" => id = value,
                            b"Target" => target = value,
                            b"Type" => rel_type = value,
                            _ => {}
                        }
                    }

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/slide") {
                            let target = target.trim_start_matches('/');
                            let full_path = if target.starts_with("ppt/") {
                                target.to_string()
                            } else {
                                format!("ppt/{target}")
                            };
                            mapping.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) | Err(_) => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(mapping)
    }

    /// Non-blank text of each `p:sp` shape that carries a `p:txBody`.
    fn shape_texts(xml: &str) -> Result<Vec<String>> {
        let mut reader = Reader::from_str(xml);

        let mut shapes = Vec::new();
        let mut has_text_body = false;
        let mut paragraphs: Vec<String> = Vec::new();
        let mut current_paragraph = String::new();
        let mut in_text_element = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"p:sp" => {
                        has_text_body = false;
                        paragraphs.clear();
                    }
                    b"p:txBody" => has_text_body = true,
                    b"a:p" => current_paragraph.clear(),
                    b"a:t" => in_text_element = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"a:p" => paragraphs.push(String::new()),
                    b"a:br" => current_paragraph.push('\n'),
                    _ => {}
                },
                // References arrive as separate `GeneralRef` events, so text is literal.
                Ok(Event::Text(e)) if in_text_element => {
                    if let Ok(text) = std::str::from_utf8(e.as_ref()) {
                        current_paragraph.push_str(text);
                    }
                }
                Ok(Event::GeneralRef(e)) if in_text_element => push_reference(&mut current_paragraph, &e),
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"a:t" => in_text_element = false,
                    b"a:p" => paragraphs.push(std::mem::take(&mut current_paragraph)),
                    b"p:sp" => {
                        let text = paragraphs.join("\n");
                        if has_text_body && !text.trim().is_empty() {
                            shapes.push(text);
                        }
                        paragraphs.clear();
                        has_text_body = false;
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(GistError::extraction(
                        "PPTX",
                        format!("malformed slide XML: {e}"),
                    ))
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(shapes)
    }

    fn read_entry(archive: &mut Archive<'_>, path: &str) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| GistError::extraction("PPTX", format!("missing {path}: {e}")))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| GistError::extraction("PPTX", format!("unreadable {path}: {e}")))?;

        Ok(content)
    }
}

/// Append the character a `&...;` reference stands for. Unknown entities are dropped.
fn push_reference(out: &mut String, reference: &BytesRef<'_>) {
    match reference.resolve_char_ref() {
        Ok(Some(c)) => out.push(c),
        Ok(None) => {
            let resolved = std::str::from_utf8(reference.as_ref())
                .ok()
                .and_then(resolve_predefined_entity);
            match resolved {
                Some(text) => out.push_str(text),
                None => tracing::debug!(
                    entity = %String::from_utf8_lossy(reference.as_ref()),
                    "Unknown entity in slide text"
                ),
            }
        }
        Err(e) => tracing::debug!(error = %e, "Invalid character reference in slide text"),
    }
}

#[async_trait]
impl TextExtractor for PptxExtractor {
    fn kind(&self) -> DocumentType {
        DocumentType::Pptx
    }

    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = read_file(path, self.kind()).await?;
        Self::extract_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree>
    <p:sp><p:txBody><a:p><a:r><a:t>Quarterly</a:t></a:r><a:r><a:t> Review</a:t></a:r></a:p></p:txBody></p:sp>
    <p:sp><p:spPr/></p:sp>
    <p:sp><p:txBody><a:p><a:r><a:t>   </a:t></a:r></a:p></p:txBody></p:sp>
    <p:sp><p:txBody><a:p><a:r><a:t>Revenue &amp; costs</a:t></a:r></a:p><a:p><a:r><a:t>Up 5%</a:t></a:r></a:p></p:txBody></p:sp>
  </p:spTree></p:cSld>
</p:sld>"#;

    #[test]
    fn test_shape_texts_skip_blank_and_textless_shapes() {
        let shapes = PptxExtractor::shape_texts(SLIDE).unwrap();
        assert_eq!(shapes, vec!["Quarterly Review", "Revenue & costs\nUp 5%"]);
    }

    #[test]
    fn test_entities_and_character_references_are_resolved() {
        let slide = r#"<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree>
    <p:sp><p:txBody><a:p><a:r><a:t>&lt;b&gt; &quot;caf&#233;&quot; &#x41;&apos;s&amp;co&nbsp;!</a:t></a:r></a:p></p:txBody></p:sp>
  </p:spTree></p:cSld></p:sld>"#;

        let shapes = PptxExtractor::shape_texts(slide).unwrap();
        assert_eq!(shapes, vec!["<b> \"café\" A's&co!"]);
    }

    #[test]
    fn test_not_a_zip() {
        let err = PptxExtractor::extract_bytes(b"plain bytes").unwrap_err();
        assert!(err.to_string().starts_with("Error reading PPTX"));
    }
}
