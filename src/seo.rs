//! `sitemap.xml` and `robots.txt`.
//!
//! Both bodies are built as plain strings. URLs go through [`SiteUrls`], so
//! they are absolute when a public base is configured and root-relative
//! otherwise.
//!
//! ```text
//! <urlset xmlns=… xmlns:image=…>
//!   <url><loc>…/</loc><lastmod>newest post</lastmod></url>         index
//!   <url><loc>…/page/2/</loc><lastmod>newest post</lastmod></url>  page N
//!   <url>                                                           post
//!     <loc>…/2024/10/a/</loc><lastmod>2024-10-12</lastmod>
//!     <image:image><image:loc>…/static/a.jpg</image:loc></image:image>
//!   </url>
//! </urlset>
//! ```

use crate::pagination::page_url_path;
use crate::post::Post;
use crate::process::ImageSet;
use crate::urls::SiteUrls;
use std::fmt::Write;

pub const SITEMAP_PATH: &str = "sitemap.xml";
pub const ROBOTS_PATH: &str = "robots.txt";

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const IMAGE_NS: &str = "http://www.google.com/schemas/sitemap-image/1.1";

/// Render the sitemap for `posts` (newest first) spread over `total_pages`
/// feed pages.
pub fn render_sitemap(
    posts: &[Post],
    total_pages: usize,
    images: &ImageSet,
    urls: &SiteUrls,
) -> String {
    let newest = posts.first().map(Post::iso_date);
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    let _ = writeln!(
        out,
        "<urlset xmlns=\"{SITEMAP_NS}\" xmlns:image=\"{IMAGE_NS}\">"
    );

    for number in 1..=total_pages.max(1) {
        push_url(&mut out, &urls.public_url(&page_url_path(number)), newest.as_deref(), &[]);
    }

    for post in posts {
        let image_locs: Vec<String> = post
            .images
            .iter()
            .map(|image| {
                let path = images.get(&image.src).map_or(image.src.as_str(), |m| m.path.as_str());
                urls.public_url(path)
            })
            .collect();
        push_url(
            &mut out,
            &urls.public_url(&post.url_path()),
            Some(&post.iso_date()),
            &image_locs,
        );
    }

    out.push_str("</urlset>\n");
    out
}

fn push_url(out: &mut String, loc: &str, lastmod: Option<&str>, images: &[String]) {
    out.push_str("  <url>\n");
    let _ = writeln!(out, "    <loc>{}</loc>", escape_xml(loc));
    if let Some(lastmod) = lastmod {
        let _ = writeln!(out, "    <lastmod>{lastmod}</lastmod>");
    }
    for image in images {
        out.push_str("    <image:image>\n");
        let _ = writeln!(out, "      <image:loc>{}</image:loc>", escape_xml(image));
        out.push_str("    </image:image>\n");
    }
    out.push_str("  </url>\n");
}

/// Render `robots.txt`.
///
/// `existing` is the site's own `robots.txt`, if any; its `Sitemap:` lines
/// are dropped. A `Sitemap:` directive is appended only when the sitemap's
/// absolute URL is known.
pub fn render_robots(existing: Option<&str>, urls: &SiteUrls) -> String {
    let mut lines: Vec<String> = match existing {
        Some(text) => text
            .lines()
            .filter(|line| !line.trim().to_ascii_lowercase().starts_with("sitemap:"))
            .map(str::to_string)
            .collect(),
        None => vec!["User-agent: *".into(), "Allow: /".into()],
    };

    if let Some(sitemap) = urls.absolute_url(SITEMAP_PATH) {
        lines.push(String::new());
        lines.push(format!("Sitemap: {sitemap}"));
    }

    let mut out = lines.join("\n").trim_end().to_string();
    out.push('\n');
    out
}

/// Escape XML special characters
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Drop characters XML 1.0 cannot carry (control characters other than
/// tab, newline and carriage return).
pub(crate) fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}
