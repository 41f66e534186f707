// SPDX-License-Identifier: GPL-3.0-only

//! Reply documents
//!
//! A depth reply is a JSON object:
//!
//! ```text
//! {
//!   "resolution": { "width": 720, "height": 404 },
//!   "data": ["0.12", "-0.07", "-1.5", "1.5", ...]
//! }
//! ```
//!
//! `data` is the depth buffer flattened row-major with the four channels of
//! each pixel interleaved, one string per `f32`. Each string is the shortest
//! decimal form that parses back to the same `f32`, so a consumer can rebuild
//! the grid exactly from `resolution` and `data`. Non-finite samples (pixels
//! without a measurement) are written as `NaN`, `inf` and `-inf`. Readers
//! that expect lowercase `nan` should parse case-insensitively; Rust's
//! `f32::from_str` and Python's `float()` accept both spellings.

use serde::{Deserialize, Serialize, Serializer};

use crate::backends::depth::{DepthBuffer, Resolution};
use crate::errors::{BridgeError, BridgeResult};

/// Borrowed view of a depth buffer in reply form
#[derive(Serialize)]
pub struct ReplyDocument<'a> {
    pub resolution: Resolution,
    pub data: FlatSamples<'a>,
}

impl<'a> ReplyDocument<'a> {
    pub fn new(buffer: &'a DepthBuffer) -> Self {
        Self {
            resolution: buffer.resolution(),
            data: FlatSamples(buffer.as_flat()),
        }
    }

    /// Encode as UTF-8 JSON
    pub fn to_bytes(&self) -> BridgeResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Samples serialized as a sequence of decimal strings
pub struct FlatSamples<'a>(pub &'a [f32]);

impl Serialize for FlatSamples<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|&v| SampleStr(v)))
    }
}

struct SampleStr(f32);

impl Serialize for SampleStr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

/// Reply sent instead of depth data when a cycle fails
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDocument {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Cycle stage that failed (`grab` or `retrieve`)
    pub stage: String,
    /// Provider status code or message
    pub code: String,
}

impl ErrorDocument {
    pub fn new(stage: &str, code: impl ToString) -> Self {
        Self {
            error: ErrorBody {
                stage: stage.to_string(),
                code: code.to_string(),
            },
        }
    }

    pub fn to_bytes(&self) -> BridgeResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Depth reply as received by a consumer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParsedReply {
    pub resolution: Resolution,
    pub data: Vec<String>,
}

impl ParsedReply {
    /// Reshape `data` into a depth buffer
    pub fn to_buffer(&self) -> BridgeResult<DepthBuffer> {
        let samples = self
            .data
            .iter()
            .enumerate()
            .map(|(i, s)| {
                s.parse::<f32>().map_err(|e| {
                    BridgeError::Serialization(format!("data[{}] = {:?}: {}", i, s, e))
                })
            })
            .collect::<BridgeResult<Vec<f32>>>()?;

        DepthBuffer::from_flat(self.resolution, &samples).ok_or_else(|| {
            BridgeError::Serialization(format!(
                "{} values do not fit a {} grid of 4-channel samples",
                samples.len(),
                self.resolution
            ))
        })
    }
}

/// Any reply the bridge can send
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Depth(ParsedReply),
    Error(ErrorDocument),
}

impl Reply {
    pub fn from_bytes(bytes: &[u8]) -> BridgeResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_buffer() -> DepthBuffer {
        let res = Resolution::new(3, 2);
        let samples: Vec<f32> = (0..res.sample_count())
            .map(|i| i as f32 * 0.1 - 0.5)
            .collect();
        DepthBuffer::from_flat(res, &samples).unwrap()
    }

    #[test]
    fn test_document_shape() {
        let buffer = sample_buffer();
        let bytes = ReplyDocument::new(&buffer).to_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["resolution"]["width"], 3);
        assert_eq!(value["resolution"]["height"], 2);
        let data = value["data"].as_array().unwrap();
        assert_eq!(data.len(), 24);
        assert!(data.iter().all(|v| v.is_string()));
        assert_eq!(data[0], "-0.5");
    }

    #[test]
    fn test_consumer_recovers_exact_values() {
        let buffer = sample_buffer();
        let bytes = ReplyDocument::new(&buffer).to_bytes().unwrap();

        let Reply::Depth(parsed) = Reply::from_bytes(&bytes).unwrap() else {
            panic!("expected a depth reply");
        };
        assert_eq!(parsed.to_buffer().unwrap(), buffer);
    }

    #[test]
    fn test_non_finite_samples_are_strings() {
        let res = Resolution::new(1, 1);
        let buffer =
            DepthBuffer::from_flat(res, &[f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 1.0])
                .unwrap();
        let bytes = ReplyDocument::new(&buffer).to_bytes().unwrap();
        let text = std::str::from_utf8(&bytes).unwrap();
        assert!(text.contains(r#"["NaN","inf","-inf","1"]"#));

        let Reply::Depth(parsed) = Reply::from_bytes(&bytes).unwrap() else {
            panic!("expected a depth reply");
        };

        let restored = parsed.to_buffer().unwrap();
        let px = restored.get(0, 0).unwrap();
        assert!(px[0].is_nan());
        assert_eq!(px[1], f32::INFINITY);
        assert_eq!(px[2], f32::NEG_INFINITY);

        // Lowercase spellings from other writers are read back too
        let lowercase = ParsedReply {
            resolution: res,
            data: ["nan", "inf", "-inf", "1"].map(String::from).to_vec(),
        };
        assert!(lowercase.to_buffer().unwrap().get(0, 0).unwrap()[0].is_nan());
    }

    #[test]
    fn test_length_mismatch_is_an_error() {
        let parsed = ParsedReply {
            resolution: Resolution::new(2, 2),
            data: vec!["1".to_string(); 15],
        };
        assert!(parsed.to_buffer().is_err());
    }

    #[test]
    fn test_error_document() {
        let bytes = ErrorDocument::new("grab", "CAMERA NOT DETECTED")
            .to_bytes()
            .unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"error":{"stage":"grab","code":"CAMERA NOT DETECTED"}}"#
        );
        assert!(matches!(Reply::from_bytes(&bytes).unwrap(), Reply::Error(_)));
    }
}
