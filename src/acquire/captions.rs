// Caption payload parsing
//
// Accepts whatever a caption endpoint actually returned: a WEBVTT
// subtitle track, a time-coded XML document, or bare lines of text.
// Pure and total - the only failure signal is an empty fragment list,
// which the calling strategy interprets as its own failure.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::models::TranscriptFragment;

/// Parse a raw caption payload into ordered transcript fragments.
///
/// Format detection mirrors what the upstream endpoints serve:
/// a `WEBVTT` marker anywhere selects the line-oriented subtitle parse,
/// a leading `<` selects the time-coded XML parse, and anything else
/// falls back to the line-oriented heuristic.
pub fn parse_payload(raw: &str) -> Vec<TranscriptFragment> {
    let text = raw.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if text.contains("WEBVTT") {
        return parse_subtitle_lines(text);
    }
    if text.starts_with('<') {
        return parse_timed_xml(text);
    }
    parse_subtitle_lines(text)
}

/// Join fragments into a single plain-text string.
pub fn fragments_to_text(fragments: &[TranscriptFragment]) -> String {
    fragments
        .iter()
        .map(|f| f.text.as_str())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Line-oriented subtitle parse. Drops the format header, cue sequence
/// numbers, timing lines, and blanks; everything else is a fragment.
fn parse_subtitle_lines(text: &str) -> Vec<TranscriptFragment> {
    let mut fragments = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("WEBVTT") {
            continue;
        }
        if line.contains("-->") {
            continue;
        }
        if line.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        fragments.push(TranscriptFragment {
            text: line.to_string(),
        });
    }
    fragments
}

/// Time-coded XML parse: every `<text>` node's character content,
/// entity-unescaped, newline-folded, trimmed. Malformed XML yields an
/// empty list rather than an error.
fn parse_timed_xml(text: &str) -> Vec<TranscriptFragment> {
    let mut reader = Reader::from_str(text);
    let mut fragments = Vec::new();
    let mut depth = 0usize;
    let mut capture: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if e.name().as_ref() == b"text" {
                    capture = Some(String::new());
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(buf) = capture.as_mut() {
                    match t.unescape() {
                        Ok(unescaped) => buf.push_str(&unescaped),
                        Err(_) => return Vec::new(),
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(buf) = capture.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                if depth == 0 {
                    return Vec::new();
                }
                depth -= 1;
                if e.name().as_ref() == b"text" {
                    if let Some(buf) = capture.take() {
                        let folded = buf.replace(['\n', '\r'], " ");
                        let trimmed = folded.trim();
                        if !trimmed.is_empty() {
                            fragments.push(TranscriptFragment {
                                text: trimmed.to_string(),
                            });
                        }
                    }
                }
            }
            Ok(Event::Eof) => {
                // Unclosed elements at EOF count as malformed.
                if depth != 0 {
                    return Vec::new();
                }
                break;
            }
            Ok(_) => {}
            Err(_) => return Vec::new(),
        }
    }

    fragments
}
