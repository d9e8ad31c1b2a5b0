#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use gist::error::{GistError, Result};
use gist::transcription::{AudioPreprocessor, SpeechRecognizer, TARGET_SAMPLE_RATE};

/// Write `bytes` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, bytes: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap_or_else(|e| panic!("Failed to write fixture '{name}': {e}"));
    path
}

/// A DOCX with one paragraph per entry.
pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    use docx_rs::*;

    let docx = paragraphs.iter().fold(Docx::new(), |docx, text| {
        docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)))
    });

    let mut buffer = Cursor::new(Vec::new());
    docx.build().pack(&mut buffer).expect("Failed to pack DOCX");
    buffer.into_inner()
}

/// A PPTX with one slide per entry; each slide holds one text shape per string.
/// An empty string produces a shape whose text body has no runs.
pub fn pptx_bytes(slides: &[&[&str]]) -> Vec<u8> {
    use zip::write::FileOptions;
    use zip::CompressionMethod;

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buffer);
        let options: FileOptions<zip::write::ExtendedFileOptions> = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        zip.start_file("[Content_Types].xml", options.clone())
            .unwrap();
        zip.write_all(CONTENT_TYPES_PPTX.as_bytes()).unwrap();

        zip.start_file("_rels/.rels", options.clone()).unwrap();
        zip.write_all(RELS_PPTX.as_bytes()).unwrap();

        let slide_ids: String = (0..slides.len())
            .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 1))
            .collect();
        zip.start_file("ppt/presentation.xml", options.clone())
            .unwrap();
        zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:sldIdLst>{slide_ids}</p:sldIdLst></p:presentation>"#
            )
            .as_bytes(),
        )
        .unwrap();

        let rels: String = (0..slides.len())
            .map(|i| {
                format!(
                    r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
                    i + 1,
                    i + 1
                )
            })
            .collect();
        zip.start_file("ppt/_rels/presentation.xml.rels", options.clone())
            .unwrap();
        zip.write_all(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
            )
            .as_bytes(),
        )
        .unwrap();

        for (i, shapes) in slides.iter().enumerate() {
            zip.start_file(format!("ppt/slides/slide{}.xml", i + 1), options.clone())
                .unwrap();
            zip.write_all(slide_xml(shapes).as_bytes()).unwrap();
        }

        zip.finish().unwrap();
    }

    buffer.into_inner()
}

fn slide_xml(shapes: &[&str]) -> String {
    let body: String = shapes
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let paragraph = if text.is_empty() {
                "<a:p/>".to_string()
            } else {
                format!("<a:p><a:r><a:t>{text}</a:t></a:r></a:p>")
            };
            format!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="Shape {}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/>{paragraph}</p:txBody></p:sp>"#,
                i + 2,
                i + 1
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{body}</p:spTree></p:cSld></p:sld>"#
    )
}

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";

const CONTENT_TYPES_PPTX: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
</Types>"#;

const RELS_PPTX: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
</Relationships>"#;

/// `seconds` of a 440 Hz tone as 16 kHz mono 16-bit WAV.
pub fn wav_bytes(seconds: f32) -> Vec<u8> {
    let count = (TARGET_SAMPLE_RATE as f32 * seconds) as usize;
    let samples: Vec<f32> = (0..count)
        .map(|i| {
            let t = i as f32 / TARGET_SAMPLE_RATE as f32;
            (t * 440.0 * std::f32::consts::TAU).sin() * 0.25
        })
        .collect();
    AudioPreprocessor::encode_wav(&samples)
}

/// Number of `.wav` files directly inside `dir`.
pub fn count_wav_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| {
                    entry
                        .path()
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
                })
                .count()
        })
        .unwrap_or(0)
}

/// Speech recognizer double that records calls and, optionally, how many WAV
/// artifacts exist in a scratch directory while it runs.
pub struct MockRecognizer {
    reply: std::result::Result<String, String>,
    watch_dir: Option<PathBuf>,
    pub calls: AtomicUsize,
    pub artifacts_seen: AtomicUsize,
}

impl MockRecognizer {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            watch_dir: None,
            calls: AtomicUsize::new(0),
            artifacts_seen: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            watch_dir: None,
            calls: AtomicUsize::new(0),
            artifacts_seen: AtomicUsize::new(0),
        })
    }

    pub fn watching(self: Arc<Self>, dir: &Path) -> Arc<Self> {
        Arc::new(Self {
            reply: self.reply.clone(),
            watch_dir: Some(dir.to_path_buf()),
            calls: AtomicUsize::new(0),
            artifacts_seen: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn recognize(&self, _audio: &[u8], _format_hint: Option<&str>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(dir) = &self.watch_dir {
            self.artifacts_seen
                .fetch_add(count_wav_files(dir), Ordering::SeqCst);
        }
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(GistError::Transcription(message.clone())),
        }
    }
}

/// OpenAI chat-completion response body with a single choice.
pub fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-4o-mini",
        "choices": [
            {
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }
        ],
        "usage": {
            "prompt_tokens": 1,
            "completion_tokens": 1,
            "total_tokens": 2
        }
    })
}

pub fn api_error_body(message: &str, error_type: &str, code: &str) -> serde_json::Value {
    json!({
        "error": {
            "message": message,
            "type": error_type,
            "param": serde_json::Value::Null,
            "code": code
        }
    })
}
