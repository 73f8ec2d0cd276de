use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static STAGE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]+(?:-[A-Z]+)?-\d+").unwrap());
static STAGE_ANYWHERE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]+-\d+").unwrap());

/// Url markers of pages that hold story text directly.
const STORY_MARKERS: &[&str] = &["ST", "NBT"];
/// Url markers of wiki pages that are never stages.
const REJECT_MARKERS: &[&str] = &["Special:", "File:", "action=", "Talk:"];
/// Trial, challenge and secret stage variants.
const EXCLUDED_VARIANTS: &[&str] = &["TR-", "EX-", "-S-"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateLink {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkVerdict {
    Accept,
    Reject,
}

/// How a candidate's story text is laid out on the wiki.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    /// The page itself (or its `/NBT` subpage) is the story.
    StoryPage,
    /// Story lives on the `/BEG` and `/END` subpages of a stage.
    StageSubpages,
    /// Nothing to fetch.
    Skip,
}

pub fn classify(title: &str, url: &str, activity: &str) -> LinkVerdict {
    if REJECT_MARKERS.iter().any(|m| url.contains(m)) {
        return LinkVerdict::Reject;
    }

    let is_story_link = STORY_MARKERS.iter().any(|m| url.contains(m));
    let is_stage = STAGE_CODE_RE.is_match(title);
    let names_activity = !activity.is_empty() && title.contains(activity);

    if is_story_link || is_stage || names_activity {
        LinkVerdict::Accept
    } else {
        LinkVerdict::Reject
    }
}

pub fn is_excluded_variant(link: &CandidateLink) -> bool {
    EXCLUDED_VARIANTS
        .iter()
        .any(|v| link.title.contains(v) || link.url.contains(v))
}

/// Keep the first occurrence of each url, preserving order.
pub fn dedup_by_url(links: Vec<CandidateLink>) -> Vec<CandidateLink> {
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(link.url.clone()))
        .collect()
}

/// Turn a page's anchors into the ordered list of story links to visit.
pub fn select_story_links(
    anchors: &[(String, String)],
    activity: &str,
    base_url: &str,
) -> Vec<CandidateLink> {
    let accepted = anchors
        .iter()
        .filter(|(text, href)| classify(text, href, activity) == LinkVerdict::Accept)
        .map(|(text, href)| CandidateLink {
            title: text.clone(),
            url: absolute_url(href, base_url),
        })
        .collect();

    dedup_by_url(accepted)
        .into_iter()
        .filter(|link| !is_excluded_variant(link))
        .collect()
}

pub fn fetch_plan(link: &CandidateLink) -> FetchPlan {
    if link.url.contains("ST") || link.url.contains("/NBT") {
        FetchPlan::StoryPage
    } else if STAGE_ANYWHERE_RE.is_match(&link.title) || STAGE_ANYWHERE_RE.is_match(&link.url) {
        FetchPlan::StageSubpages
    } else {
        FetchPlan::Skip
    }
}

/// Resolve a wiki href against the site root.
pub fn absolute_url(href: &str, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if href.starts_with("http") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", base, href)
    } else {
        format!("{}/w/{}", base, href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://prts.wiki";

    fn link(title: &str, url: &str) -> CandidateLink {
        CandidateLink {
            title: title.into(),
            url: url.into(),
        }
    }

    #[test]
    fn stage_codes_accepted() {
        assert_eq!(classify("HS-1", "/w/HS-1", "x"), LinkVerdict::Accept);
        assert_eq!(classify("CB-EX-1", "/w/CB-EX-1", "x"), LinkVerdict::Accept);
        assert_eq!(classify("hs-1", "/w/hs-1", "x"), LinkVerdict::Reject);
        assert_eq!(classify("HS1", "/w/HS1", "x"), LinkVerdict::Reject);
    }

    #[test]
    fn story_markers_accepted() {
        assert_eq!(classify("序章", "/w/HS-ST-1", "x"), LinkVerdict::Accept);
        assert_eq!(classify("幕间", "/w/foo/NBT", "x"), LinkVerdict::Accept);
    }

    #[test]
    fn activity_name_accepted() {
        assert_eq!(classify("众生行记 剧情", "/w/abc", "众生行记"), LinkVerdict::Accept);
        assert_eq!(classify("其他", "/w/abc", ""), LinkVerdict::Reject);
    }

    #[test]
    fn special_pages_rejected() {
        assert_eq!(classify("HS-1", "/w/Special:Upload", "x"), LinkVerdict::Reject);
        assert_eq!(classify("HS-1", "/w/File:HS-1.png", "x"), LinkVerdict::Reject);
        assert_eq!(classify("HS-1", "/index.php?title=HS-1&action=edit", "x"), LinkVerdict::Reject);
        assert_eq!(classify("HS-ST-1", "/w/Talk:HS-ST-1", "x"), LinkVerdict::Reject);
    }

    #[test]
    fn variants_removed_after_classification() {
        assert_eq!(classify("TR-8", "/w/TR-8", "x"), LinkVerdict::Accept);
        assert!(is_excluded_variant(&link("TR-8", "https://prts.wiki/w/TR-8")));
        assert!(is_excluded_variant(&link("CB-EX-1", "x")));
        assert!(is_excluded_variant(&link("a", "https://prts.wiki/w/HS-S-1")));
        assert!(!is_excluded_variant(&link("HS-1", "https://prts.wiki/w/HS-1")));
    }

    #[test]
    fn dedup_keeps_first() {
        let links = vec![
            link("HS-1", "https://prts.wiki/w/HS-1"),
            link("HS-2", "https://prts.wiki/w/HS-2"),
            link("行动 HS-1", "https://prts.wiki/w/HS-1"),
        ];
        let out = dedup_by_url(links);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "HS-1");
        assert_eq!(out[1].title, "HS-2");
    }

    #[test]
    fn select_pipeline() {
        let anchors = vec![
            ("首页".to_string(), "/w/首页".to_string()),
            ("HS-1".to_string(), "/w/HS-1".to_string()),
            ("HS-1".to_string(), "HS-1".to_string()),
            ("TR-8".to_string(), "/w/TR-8".to_string()),
            ("HS-ST-1".to_string(), "/w/HS-ST-1".to_string()),
            ("HS-2".to_string(), "/w/Special:Upload".to_string()),
        ];
        let out = select_story_links(&anchors, "众生行记", BASE);
        assert_eq!(
            out,
            vec![
                link("HS-1", "https://prts.wiki/w/HS-1"),
                link("HS-ST-1", "https://prts.wiki/w/HS-ST-1"),
            ]
        );
    }

    #[test]
    fn plans() {
        assert_eq!(fetch_plan(&link("HS-ST-1", "https://prts.wiki/w/HS-ST-1")), FetchPlan::StoryPage);
        assert_eq!(fetch_plan(&link("HS-1", "https://prts.wiki/w/HS-1")), FetchPlan::StageSubpages);
        assert_eq!(fetch_plan(&link("众生行记", "https://prts.wiki/w/abc")), FetchPlan::Skip);
    }

    #[test]
    fn urls() {
        assert_eq!(absolute_url("https://x.org/a", BASE), "https://x.org/a");
        assert_eq!(absolute_url("/w/HS-1", BASE), "https://prts.wiki/w/HS-1");
        assert_eq!(absolute_url("HS-1", "https://prts.wiki/"), "https://prts.wiki/w/HS-1");
    }
}
