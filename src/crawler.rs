use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::Config;
use crate::fetcher::{Fetcher, PageSource};
use crate::parser::links::{absolute_url, fetch_plan, select_story_links, CandidateLink, FetchPlan};
use crate::parser::process_page;
use crate::parser::story::{StorySegment, Transcript};
use crate::render;

/// Walks an activity's story pages and assembles the transcript.
pub struct Crawler<S = Fetcher> {
    source: S,
    config: Config,
}

impl Crawler<Fetcher> {
    pub fn new(config: Config) -> Result<Self> {
        let source = Fetcher::new(&config)?;
        Ok(Self { source, config })
    }
}

impl<S: PageSource> Crawler<S> {
    pub fn with_source(config: Config, source: S) -> Self {
        Self { source, config }
    }

    /// Activity page url from the hub page, or the direct `/w/{activity}` guess.
    pub async fn resolve_activity_page(&self, activity: &str) -> String {
        let hub = self.config.hub_url();
        info!("Fetching hub page: {}", hub);
        match self.source.page(&hub).await {
            Ok(Some(html)) => {
                let anchors = render::anchors(&html);
                if let Some(url) = find_activity_link(&anchors, activity, &self.config) {
                    info!("Found activity page: {}", url);
                    return url;
                }
            }
            Ok(None) => warn!("Hub page not found: {}", hub),
            Err(e) => warn!("Hub page fetch failed: {:#}", e),
        }
        let url = self.config.page_url(activity);
        info!("No hub link, trying direct url: {}", url);
        url
    }

    /// Candidate story links on the activity page, deduplicated and with
    /// trial/challenge/secret variants removed.
    pub async fn story_links(&self, activity: &str) -> Result<Vec<CandidateLink>> {
        let page = self.resolve_activity_page(activity).await;
        let html = match self
            .source
            .page(&page)
            .await
            .with_context(|| format!("Failed to fetch activity page {}", page))?
        {
            Some(html) => html,
            None => bail!("Activity page not found: {}", page),
        };

        let anchors = render::anchors(&html);
        let links = select_story_links(&anchors, activity, &self.config.base_url);
        info!("Activity page has {} anchors, {} story links", anchors.len(), links.len());
        Ok(links)
    }

    /// Fetch every link's story pages in order, one at a time.
    pub async fn collect_transcript(&self, activity: &str, links: &[CandidateLink]) -> Transcript {
        let mut transcript = Transcript::new(activity);

        let pb = ProgressBar::new(links.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=> "));
        }

        for (i, link) in links.iter().enumerate() {
            pb.set_message(link.title.clone());
            let processed = match self.collect_link(link).await {
                Some(segments) => {
                    for segment in segments {
                        transcript.push(segment);
                    }
                    true
                }
                None => false,
            };
            pb.inc(1);
            if processed && i + 1 < links.len() {
                tokio::time::sleep(self.config.delay()).await;
            }
        }

        pb.finish_and_clear();
        info!("Collected {} segments from {} links", transcript.segments.len(), links.len());
        transcript
    }

    /// Segments for one link, in page order. `None` when the link was
    /// skipped because its page has no title.
    async fn collect_link(&self, link: &CandidateLink) -> Option<Vec<StorySegment>> {
        info!("Processing {} ({})", link.title, link.url);

        let Some(title) = self.canonical_title(&link.url).await else {
            warn!("Skipping {}: no page title", link.url);
            return None;
        };
        let canonical = self.config.page_url(&title);

        let segments = match fetch_plan(link) {
            FetchPlan::StoryPage => {
                let segment = match self.extract_page(&canonical, &title).await {
                    Some(seg) => Some(seg),
                    None => self.extract_page(&format!("{}/NBT", canonical), &title).await,
                };
                segment.into_iter().collect()
            }
            FetchPlan::StageSubpages => {
                let mut out = Vec::new();
                let before = format!("{} (行动前)", title);
                let after = format!("{} (行动后)", title);
                if let Some(seg) = self.extract_page(&format!("{}/BEG", canonical), &before).await {
                    out.push(seg);
                }
                if let Some(seg) = self.extract_page(&format!("{}/END", canonical), &after).await {
                    out.push(seg);
                }
                out
            }
            FetchPlan::Skip => Vec::new(),
        };
        Some(segments)
    }

    async fn canonical_title(&self, url: &str) -> Option<String> {
        match self.source.page(url).await {
            Ok(Some(html)) => render::page_title(&html),
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read title of {}: {:#}", url, e);
                None
            }
        }
    }

    /// Missing pages and fetch failures both yield no segment.
    async fn extract_page(&self, url: &str, title: &str) -> Option<StorySegment> {
        match self.source.page(url).await {
            Ok(Some(html)) => process_page(&html, title),
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to fetch {}: {:#}", url, e);
                None
            }
        }
    }
}

/// Last hub anchor whose text names the activity and points into the wiki.
fn find_activity_link(
    anchors: &[(String, String)],
    activity: &str,
    config: &Config,
) -> Option<String> {
    let host = config.host();
    anchors
        .iter()
        .rev()
        .find(|(text, href)| {
            text.contains(activity) && (href.contains("/w/") || href.contains(host))
        })
        .map(|(_, href)| absolute_url(href, &config.base_url))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Instant;

    use super::*;

    /// Pages served from memory; unknown urls are missing.
    #[derive(Default)]
    struct PageMap(HashMap<String, String>);

    impl PageMap {
        fn with(mut self, url: &str, html: String) -> Self {
            self.0.insert(url.to_string(), html);
            self
        }
    }

    impl PageSource for PageMap {
        async fn page(&self, url: &str) -> Result<Option<String>> {
            Ok(self.0.get(url).cloned())
        }
    }

    fn config() -> Config {
        Config {
            delay_ms: 0,
            ..Config::default()
        }
    }

    fn titled(title: &str) -> String {
        format!(
            "<html><head><title>{} - PRTS</title></head><body><div class=\"mw-parser-output\"><p>关卡一览</p></div></body></html>",
            title
        )
    }

    fn story(line: &str) -> String {
        format!(
            "<html><head><title>x - PRTS</title></head><body><div class=\"mw-parser-output\"><pre>[HEADER]\n{}\n</pre></div></body></html>",
            line
        )
    }

    fn link(title: &str, url: &str) -> CandidateLink {
        CandidateLink {
            title: title.into(),
            url: url.into(),
        }
    }

    #[tokio::test]
    async fn story_page_falls_back_to_nbt() {
        let c = config();
        let canonical = c.page_url("HS-ST-1");
        let pages = PageMap::default()
            .with(&canonical, titled("HS-ST-1"))
            .with(&format!("{}/NBT", canonical), story("幕间的旁白。"));
        let crawler = Crawler::with_source(c, pages);

        let segs = crawler
            .collect_link(&link("HS-ST-1", &canonical))
            .await
            .unwrap();
        assert_eq!(
            segs,
            vec![StorySegment {
                title: "HS-ST-1".into(),
                lines: vec!["幕间的旁白。".into()],
            }]
        );
    }

    #[tokio::test]
    async fn story_page_used_directly() {
        let c = config();
        let canonical = c.page_url("HS-ST-2");
        let html = titled("HS-ST-2").replace("<p>关卡一览</p>", "<pre>[HEADER]\n直接的旁白。\n</pre>");
        let pages = PageMap::default()
            .with(&canonical, html)
            .with(&format!("{}/NBT", canonical), story("不该读到。"));
        let crawler = Crawler::with_source(c, pages);

        let segs = crawler
            .collect_link(&link("HS-ST-2", &canonical))
            .await
            .unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].lines, vec!["直接的旁白。"]);
    }

    #[tokio::test]
    async fn stage_reads_beg_and_end() {
        let c = config();
        let link_url = "https://prts.wiki/w/HS-1";
        let canonical = c.page_url("HS-1 沉睡之城");
        let pages = PageMap::default()
            .with(link_url, titled("HS-1 沉睡之城"))
            .with(&format!("{}/BEG", canonical), story("行动前的旁白。"))
            .with(&format!("{}/END", canonical), story("行动后的旁白。"));
        let crawler = Crawler::with_source(c, pages);

        let segs = crawler.collect_link(&link("HS-1", link_url)).await.unwrap();
        let titles: Vec<&str> = segs.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["HS-1 沉睡之城 (行动前)", "HS-1 沉睡之城 (行动后)"]);
        assert_eq!(segs[0].lines, vec!["行动前的旁白。"]);
        assert_eq!(segs[1].lines, vec!["行动后的旁白。"]);
    }

    #[tokio::test]
    async fn stage_missing_end_page() {
        let c = config();
        let link_url = "https://prts.wiki/w/HS-2";
        let canonical = c.page_url("HS-2");
        let pages = PageMap::default()
            .with(link_url, titled("HS-2"))
            .with(&format!("{}/BEG", canonical), story("只有行动前。"));
        let crawler = Crawler::with_source(c, pages);

        let segs = crawler.collect_link(&link("HS-2", link_url)).await.unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].title, "HS-2 (行动前)");
    }

    #[tokio::test]
    async fn link_without_title_is_skipped() {
        let crawler = Crawler::with_source(config(), PageMap::default());
        let skipped = crawler
            .collect_link(&link("HS-3", "https://prts.wiki/w/HS-3"))
            .await;
        assert!(skipped.is_none());
    }

    #[tokio::test]
    async fn transcript_in_link_order() {
        let c = config();
        let first = c.page_url("HS-1");
        let second = c.page_url("HS-2");
        let pages = PageMap::default()
            .with(&first, titled("HS-1"))
            .with(&format!("{}/BEG", first), story("第一段。"))
            .with(&second, titled("HS-2"))
            .with(&format!("{}/END", second), story("第二段。"));
        let crawler = Crawler::with_source(c, pages);

        let links = vec![
            link("HS-1", &first),
            link("HS-9", "https://prts.wiki/w/HS-9"),
            link("HS-2", &second),
        ];
        let transcript = crawler.collect_transcript("众生行记", &links).await;
        assert_eq!(
            transcript.render(),
            "Activity: 众生行记\n\n\n--- HS-1 (行动前) ---\n\n第一段。\n\n--- HS-2 (行动后) ---\n\n第二段。\n"
        );
    }

    #[tokio::test]
    async fn no_delay_after_skipped_or_last_link() {
        let c = Config {
            delay_ms: 300,
            ..Config::default()
        };
        let page = c.page_url("HS-1");
        let pages = PageMap::default().with(&page, titled("HS-1"));
        let crawler = Crawler::with_source(c, pages);

        let links = vec![
            link("HS-8", "https://prts.wiki/w/HS-8"),
            link("HS-9", "https://prts.wiki/w/HS-9"),
            link("HS-1", &page),
        ];
        let start = Instant::now();
        crawler.collect_transcript("x", &links).await;
        assert!(start.elapsed().as_millis() < 300);
    }

    #[tokio::test]
    async fn story_links_from_activity_page() {
        let c = config();
        let hub = "<html><body><a href=\"/w/%E4%BC%97%E7%94%9F%E8%A1%8C%E8%AE%B0\">众生行记</a></body></html>".to_string();
        let activity = "<html><body><a href=\"/w/HS-1\">HS-1</a><a href=\"/w/HS-1\">HS-1</a><a href=\"/w/TR-8\">TR-8</a></body></html>";
        let pages = PageMap::default()
            .with(&c.hub_url(), hub)
            .with(
                "https://prts.wiki/w/%E4%BC%97%E7%94%9F%E8%A1%8C%E8%AE%B0",
                activity.to_string(),
            );
        let crawler = Crawler::with_source(c, pages);

        let links = crawler.story_links("众生行记").await.unwrap();
        assert_eq!(links, vec![link("HS-1", "https://prts.wiki/w/HS-1")]);
    }

    #[tokio::test]
    async fn missing_activity_page_errors() {
        let crawler = Crawler::with_source(config(), PageMap::default());
        assert!(crawler.story_links("不存在").await.is_err());
    }

    fn anchor(text: &str, href: &str) -> (String, String) {
        (text.to_string(), href.to_string())
    }

    #[test]
    fn last_matching_hub_link_wins() {
        let anchors = vec![
            anchor("众生行记", "/w/%E4%BC%97%E7%94%9F%E8%A1%8C%E8%AE%B0"),
            anchor("众生行记", "/index.php?title=x"),
            anchor("众生行记 复刻", "https://prts.wiki/w/Fuke"),
            anchor("其他活动", "/w/Other"),
        ];
        let url = find_activity_link(&anchors, "众生行记", &Config::default());
        assert_eq!(url.as_deref(), Some("https://prts.wiki/w/Fuke"));
    }

    #[test]
    fn no_hub_link() {
        let anchors = vec![anchor("其他活动", "/w/Other")];
        assert!(find_activity_link(&anchors, "众生行记", &Config::default()).is_none());
    }
}
