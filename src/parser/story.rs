use serde::Serialize;
use tracing::debug;

use super::rules::{classify_line, ScanState};
use super::vocab::SCRIPT_MARKER;

/// Kept lines of one page, in page order, under a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorySegment {
    pub title: String,
    pub lines: Vec<String>,
}

impl StorySegment {
    pub fn render(&self) -> String {
        format!("\n--- {} ---\n\n{}\n", self.title, self.lines.join("\n"))
    }
}

/// All segments of one activity, in fetch order.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub activity: String,
    pub segments: Vec<StorySegment>,
}

impl Transcript {
    pub fn new(activity: &str) -> Self {
        Self {
            activity: activity.to_string(),
            segments: Vec::new(),
        }
    }

    pub fn push(&mut self, segment: StorySegment) {
        self.segments.push(segment);
    }

    pub fn render(&self) -> String {
        let mut out = format!("Activity: {}\n\n", self.activity);
        for segment in &self.segments {
            out.push_str(&segment.render());
        }
        out
    }
}

/// Byte-order mark left at the head of lines copied out of some pages.
const BOM: char = '\u{feff}';

/// Where the scan starts and whether the script body is already confirmed.
fn localize<'a>(text: &'a str, raw_markup: Option<&'a str>) -> (&'a str, bool) {
    if let Some(idx) = text.find(SCRIPT_MARKER) {
        return (&text[idx..], true);
    }
    if let Some(raw) = raw_markup {
        if let Some(idx) = raw.find(SCRIPT_MARKER) {
            debug!("script marker only found in raw markup");
            return (&raw[idx..], true);
        }
    }
    (text, false)
}

/// Pull the story lines out of rendered page text.
///
/// `raw_markup` is the unstripped page source, consulted only when the
/// rendered text lacks the script marker. Returns `None` when nothing survives.
pub fn extract(text: &str, raw_markup: Option<&str>, title: &str) -> Option<StorySegment> {
    let (body, in_script) = localize(text, raw_markup);
    let mut state = ScanState { in_script };

    let lines: Vec<String> = body
        .lines()
        .map(|line| line.trim_matches(|c: char| c.is_whitespace() || c == BOM))
        .filter(|line| !line.is_empty())
        .filter_map(|line| classify_line(line, &mut state).into_line())
        .collect();

    debug!(title, kept = lines.len(), latched = state.in_script, "extracted");

    if lines.is_empty() {
        return None;
    }
    Some(StorySegment {
        title: title.to_string(),
        lines,
    })
}
