pub mod links;
pub mod rules;
pub mod story;
pub mod vocab;

use crate::render;
use story::StorySegment;

/// Page HTML → story segment. The raw HTML backs up the rendered text when
/// stripping lost the script marker.
pub fn process_page(html: &str, title: &str) -> Option<StorySegment> {
    let text = render::story_text(html);
    story::extract(&text, Some(html), title)
}
