//! Atom (`feed.xml`) and RSS 2.0 (`rss.xml`) feeds.
//!
//! Both formats require absolute links, so feeds are only produced when the
//! site has a public base URL (`site_url`, or an absolute `base_url`) and at
//! least one post. Timestamps are derived from post dates at midnight UTC;
//! nothing depends on the wall clock, so rebuilding yields identical bytes.
//!
//! Entry content is the post's images (absolute `src`) followed by its body
//! HTML, escaped into the element text.

use crate::config::SiteConfig;
use crate::post::Post;
use crate::process::ImageSet;
use crate::seo::{escape_xml, strip_invalid_xml_chars};
use crate::urls::SiteUrls;
use chrono::{NaiveDate, NaiveTime, SecondsFormat};
use maud::{PreEscaped, html};
use std::fmt::Write;

pub const ATOM_PATH: &str = "feed.xml";
pub const RSS_PATH: &str = "rss.xml";

/// Inputs shared by both feed formats.
#[derive(Debug, Clone, Copy)]
pub struct FeedSource<'a> {
    pub config: &'a SiteConfig,
    pub urls: &'a SiteUrls,
    pub images: &'a ImageSet,
    /// All posts, newest first. Only the first `feed_max_posts` are used.
    pub posts: &'a [Post],
}

impl FeedSource<'_> {
    /// Whether feeds can be written for this site.
    pub fn is_available(&self) -> bool {
        self.urls.has_public_base() && !self.posts.is_empty() && self.config.feed_max_posts > 0
    }

    fn entries(&self) -> &[Post] {
        &self.posts[..self.posts.len().min(self.config.feed_max_posts)]
    }

    fn author(&self) -> &str {
        if self.config.author.is_empty() {
            &self.config.title
        } else {
            &self.config.author
        }
    }

    /// Entry body: images then the post's HTML.
    fn content_html(&self, post: &Post) -> String {
        let markup = html! {
            @for image in &post.images {
                @let path = self.images.get(&image.src).map_or(image.src.as_str(), |m| m.primary_path());
                p { img src=(self.urls.public_url(path)) alt=(image.alt.as_deref().unwrap_or("")); }
            }
            (PreEscaped(&post.body_html))
        };
        strip_invalid_xml_chars(&markup.into_string())
    }
}

/// Render the Atom feed, or `None` when feeds are unavailable.
pub fn render_atom(source: &FeedSource) -> Option<String> {
    if !source.is_available() {
        return None;
    }
    let home = source.urls.absolute_url("")?;
    let self_url = source.urls.absolute_url(ATOM_PATH)?;
    let entries = source.entries();
    let updated = rfc3339(entries[0].date);

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str("<feed xmlns=\"http://www.w3.org/2005/Atom\">\n");
    let _ = writeln!(out, "  <title>{}</title>", escape_xml(&source.config.title));
    if !source.config.tagline.is_empty() {
        let _ = writeln!(out, "  <subtitle>{}</subtitle>", escape_xml(&source.config.tagline));
    }
    let _ = writeln!(out, "  <link href=\"{}\" rel=\"self\"/>", escape_xml(&self_url));
    let _ = writeln!(out, "  <link href=\"{}\"/>", escape_xml(&home));
    let _ = writeln!(out, "  <id>{}</id>", escape_xml(&home));
    let _ = writeln!(out, "  <updated>{updated}</updated>");
    let _ = writeln!(out, "  <author><name>{}</name></author>", escape_xml(source.author()));

    for post in entries {
        let url = source.urls.public_url(&post.url_path());
        let date = rfc3339(post.date);
        out.push_str("  <entry>\n");
        let _ = writeln!(out, "    <title>{}</title>", escape_xml(&post.title));
        let _ = writeln!(out, "    <link href=\"{}\"/>", escape_xml(&url));
        let _ = writeln!(out, "    <id>{}</id>", escape_xml(&url));
        let _ = writeln!(out, "    <published>{date}</published>");
        let _ = writeln!(out, "    <updated>{date}</updated>");
        let _ = writeln!(
            out,
            "    <summary>{}</summary>",
            escape_xml(&post.description(&source.config.description))
        );
        let _ = writeln!(
            out,
            "    <content type=\"html\">{}</content>",
            escape_xml(&source.content_html(post))
        );
        out.push_str("  </entry>\n");
    }

    out.push_str("</feed>\n");
    Some(out)
}

/// Render the RSS 2.0 feed, or `None` when feeds are unavailable.
pub fn render_rss(source: &FeedSource) -> Option<String> {
    if !source.is_available() {
        return None;
    }
    let home = source.urls.absolute_url("")?;
    let self_url = source.urls.absolute_url(RSS_PATH)?;
    let entries = source.entries();
    let description = if source.config.description.is_empty() {
        &source.config.title
    } else {
        &source.config.description
    };

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    out.push_str("<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n");
    out.push_str("  <channel>\n");
    let _ = writeln!(out, "    <title>{}</title>", escape_xml(&source.config.title));
    let _ = writeln!(out, "    <link>{}</link>", escape_xml(&home));
    let _ = writeln!(out, "    <description>{}</description>", escape_xml(description));
    let _ = writeln!(
        out,
        "    <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>",
        escape_xml(&self_url)
    );
    let _ = writeln!(out, "    <lastBuildDate>{}</lastBuildDate>", rfc2822(entries[0].date));

    for post in entries {
        let url = source.urls.public_url(&post.url_path());
        out.push_str("    <item>\n");
        let _ = writeln!(out, "      <title>{}</title>", escape_xml(&post.title));
        let _ = writeln!(out, "      <link>{}</link>", escape_xml(&url));
        let _ = writeln!(out, "      <guid isPermaLink=\"true\">{}</guid>", escape_xml(&url));
        let _ = writeln!(out, "      <pubDate>{}</pubDate>", rfc2822(post.date));
        let _ = writeln!(
            out,
            "      <description>{}</description>",
            escape_xml(&source.content_html(post))
        );
        out.push_str("    </item>\n");
    }

    out.push_str("  </channel>\n");
    out.push_str("</rss>\n");
    Some(out)
}

fn rfc3339(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN)
        .and_utc()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn rfc2822(date: NaiveDate) -> String {
    date.and_time(NaiveTime::MIN).and_utc().to_rfc2822()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{dated_posts, make_post};

    fn config() -> SiteConfig {
        SiteConfig {
            title: "Notes & Things".into(),
            author: "Ada".into(),
            ..SiteConfig::default()
        }
    }

    fn absolute() -> SiteUrls {
        SiteUrls::new(Some("https://example.com"), Some("/blog"))
    }

    #[test]
    fn no_feeds_without_public_base() {
        let config = config();
        let posts = dated_posts(2);
        let images = ImageSet::default();
        let urls = SiteUrls::new(None, Some("/blog"));
        let source = FeedSource {
            config: &config,
            urls: &urls,
            images: &images,
            posts: &posts,
        };
        assert!(!source.is_available());
        assert_eq!(render_atom(&source), None);
        assert_eq!(render_rss(&source), None);
    }

    #[test]
    fn no_feeds_without_posts() {
        let config = config();
        let images = ImageSet::default();
        let urls = absolute();
        let source = FeedSource {
            config: &config,
            urls: &urls,
            images: &images,
            posts: &[],
        };
        assert_eq!(render_atom(&source), None);
    }

    #[test]
    fn atom_feed_structure() {
        let config = config();
        let posts = dated_posts(3);
        let images = ImageSet::default();
        let urls = absolute();
        let source = FeedSource {
            config: &config,
            urls: &urls,
            images: &images,
            posts: &posts,
        };
        let xml = render_atom(&source).unwrap();

        assert!(xml.contains("<title>Notes &amp; Things</title>"));
        assert!(xml.contains(r#"<link href="https://example.com/blog/feed.xml" rel="self"/>"#));
        assert!(xml.contains("<id>https://example.com/blog/</id>"));
        assert!(xml.contains("<updated>2024-12-31T00:00:00Z</updated>"));
        assert!(xml.contains("<author><name>Ada</name></author>"));
        assert!(xml.contains("<id>https://example.com/blog/2024/12/post-001/</id>"));
        assert!(xml.contains("<content type=\"html\">&lt;p&gt;Body of post-000.&lt;/p&gt;"));
        assert_eq!(xml.matches("<entry>").count(), 3);
    }

    #[test]
    fn feed_limited_to_max_posts() {
        let mut config = config();
        config.feed_max_posts = 2;
        let posts = dated_posts(5);
        let images = ImageSet::default();
        let urls = absolute();
        let source = FeedSource {
            config: &config,
            urls: &urls,
            images: &images,
            posts: &posts,
        };
        assert_eq!(render_atom(&source).unwrap().matches("<entry>").count(), 2);
        assert_eq!(render_rss(&source).unwrap().matches("<item>").count(), 2);
    }

    #[test]
    fn rss_feed_structure() {
        let config = config();
        let date = NaiveDate::from_ymd_opt(2024, 10, 12).unwrap();
        let posts = vec![make_post("a", date, &["static/a.jpg"])];
        let images = ImageSet::default();
        let urls = absolute();
        let source = FeedSource {
            config: &config,
            urls: &urls,
            images: &images,
            posts: &posts,
        };
        let xml = render_rss(&source).unwrap();

        assert!(xml.contains(r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">"#));
        assert!(xml.contains(
            r#"<atom:link href="https://example.com/blog/rss.xml" rel="self" type="application/rss+xml"/>"#
        ));
        assert!(xml.contains("<pubDate>Sat, 12 Oct 2024 00:00:00 +0000</pubDate>"));
        assert!(xml.contains(r#"<guid isPermaLink="true">https://example.com/blog/2024/10/a/</guid>"#));
        // falls back to the title when no description is configured
        assert!(xml.contains("<description>Notes &amp; Things</description>"));
        assert!(xml.contains("&lt;img src=&quot;https://example.com/blog/static/a.jpg&quot;"));
    }

    #[test]
    fn dates_are_midnight_utc() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(rfc3339(date), "2024-02-29T00:00:00Z");
        assert_eq!(rfc2822(date), "Thu, 29 Feb 2024 00:00:00 +0000");
    }
}
