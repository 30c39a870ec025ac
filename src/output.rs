//! Output types returned by the generation entry points.

use crate::markup::{DocumentTree, Mode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A finished notes or solutions document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub mode: Mode,
    /// Text the document was generated from: the syllabus for notes, the
    /// transcribed or supplied question paper for solutions.
    pub source_text: String,
    /// Cleaned model output that was fed to the converter.
    pub generated_text: String,
    pub tree: DocumentTree,
    /// Standalone HTML page.
    pub html: String,
    /// PDF bytes; base64 in serialised form.
    #[serde(serialize_with = "serialize_base64", deserialize_with = "deserialize_base64")]
    pub pdf: Vec<u8>,
    pub stats: GenerationStats,
}

impl GeneratedDocument {
    /// The PDF as standard base64, the shape upload APIs and JSON clients
    /// expect.
    pub fn pdf_base64(&self) -> String {
        STANDARD.encode(&self.pdf)
    }
}

/// Token usage and timings for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// LLM calls made (0 for offline styling, 2 for a photographed paper).
    pub llm_calls: u32,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    /// Retries spent across all LLM calls.
    pub retries: u32,
    /// Characters of transcribed question text; 0 when no image was read.
    pub extracted_chars: usize,
    pub node_count: usize,
    pub pdf_bytes: usize,
    pub llm_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

fn deserialize_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    STANDARD.decode(encoded).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::convert;

    fn sample() -> GeneratedDocument {
        let tree = convert("Answer: 4", Mode::Solution);
        GeneratedDocument {
            mode: Mode::Solution,
            source_text: "Q1. 2+2?".into(),
            generated_text: "Answer: 4".into(),
            html: tree.to_html(),
            tree,
            pdf: b"%PDF-1.5 fake".to_vec(),
            stats: GenerationStats::default(),
        }
    }

    #[test]
    fn pdf_base64_encodes_bytes() {
        assert_eq!(sample().pdf_base64(), "JVBERi0xLjUgZmFrZQ==");
    }

    #[test]
    fn json_carries_pdf_as_base64() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["pdf"], "JVBERi0xLjUgZmFrZQ==");
        assert_eq!(json["mode"], "solution");
        assert_eq!(json["tree"]["nodes"][0]["type"], "callout");
    }

    #[test]
    fn json_roundtrip_restores_pdf() {
        let doc = sample();
        let json = serde_json::to_string(&doc).unwrap();
        let back: GeneratedDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pdf, doc.pdf);
        assert_eq!(back.tree, doc.tree);
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["pdf"] = serde_json::Value::String("not base64!".into());
        assert!(serde_json::from_value::<GeneratedDocument>(json).is_err());
    }
}
