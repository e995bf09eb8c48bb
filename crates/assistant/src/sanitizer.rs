//! Response sanitizer: cut the answer out of a raw model decode.

/// Text after the last occurrence of this marker is the answer.
pub const ANSWER_MARKER: &str = "Answer:";

/// Keep what follows the last [`ANSWER_MARKER`], trimmed.
///
/// Without a marker the text is returned unchanged.
pub fn sanitize(raw: &str) -> String {
    match raw.rfind(ANSWER_MARKER) {
        Some(pos) => raw[pos + ANSWER_MARKER.len()..].trim().to_string(),
        None => raw.to_string(),
    }
}
