//! Binary/text sniffing and best-effort decoding.

use crate::options::BinaryDetection;
use serde::{Deserialize, Serialize};

/// Number of leading bytes inspected by [`classify`].
pub const SAMPLE_LEN: usize = 4096;

/// Fraction of disallowed control bytes above which a sample is binary.
pub const CONTROL_RATIO_LIMIT: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Binary,
    Text,
}

/// Bytes below tab, between carriage return and space (exclusive), and DEL.
fn is_disallowed_control(b: u8) -> bool {
    b < 9 || (b > 13 && b < 32) || b == 127
}

/// Classifies a sample with the null-byte and control-ratio heuristic.
///
/// Only the first [`SAMPLE_LEN`] bytes are looked at. An empty sample is text.
pub fn classify(sample: &[u8]) -> ContentKind {
    let sample = &sample[..sample.len().min(SAMPLE_LEN)];
    if sample.contains(&0) {
        return ContentKind::Binary;
    }
    if sample.is_empty() {
        return ContentKind::Text;
    }
    let weird = sample.iter().filter(|&&b| is_disallowed_control(b)).count();
    if weird as f64 / sample.len() as f64 > CONTROL_RATIO_LIMIT {
        ContentKind::Binary
    } else {
        ContentKind::Text
    }
}

/// Classifies a sample using the selected strategy.
pub fn classify_with(sample: &[u8], method: BinaryDetection) -> ContentKind {
    match method {
        BinaryDetection::Heuristic => classify(sample),
        BinaryDetection::Accurate => {
            let sample = &sample[..sample.len().min(SAMPLE_LEN)];
            if content_inspector::inspect(sample).is_binary() {
                ContentKind::Binary
            } else {
                ContentKind::Text
            }
        }
        BinaryDetection::None => ContentKind::Text,
    }
}

/// The decoder that produced a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    Utf8,
    Latin1,
    Utf8Lossy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: Encoding,
}

type Attempt = fn(&[u8]) -> Option<String>;

/// Fallible decoders, tried in order.
const ATTEMPTS: &[(Encoding, Attempt)] = &[(Encoding::Utf8, utf8), (Encoding::Latin1, latin1)];

fn utf8(bytes: &[u8]) -> Option<String> {
    std::str::from_utf8(bytes).ok().map(str::to_owned)
}

fn latin1(bytes: &[u8]) -> Option<String> {
    Some(bytes.iter().map(|&b| char::from(b)).collect())
}

/// Decodes bytes with the UTF-8, Latin-1, lossy UTF-8 chain. Never fails.
pub fn decode(bytes: &[u8]) -> Decoded {
    ATTEMPTS
        .iter()
        .find_map(|(encoding, attempt)| {
            attempt(bytes).map(|text| Decoded {
                text,
                encoding: *encoding,
            })
        })
        .unwrap_or_else(|| Decoded {
            text: String::from_utf8_lossy(bytes).into_owned(),
            encoding: Encoding::Utf8Lossy,
        })
}
