//! HTML rendering.
//!
//! Pure functions from posts, resolved images and site configuration to
//! [`Markup`]. Nothing here touches the filesystem; the writer decides where
//! each page lands.
//!
//! ## Pages
//!
//! - **Feed pages** (`index.html`, `page/N/index.html`): one card per post
//!   with its first image as a thumbnail, a summary, and links to the
//!   neighbouring pages.
//! - **Post pages** (`YYYY/MM/slug/index.html`): the full body and every
//!   image. Photo-layout posts put the images before the text.
//!
//! ## Head
//!
//! Every page carries a canonical link, Open Graph and Twitter card tags,
//! the meta description, and the stylesheet inlined in a `<style>` block.
//! The priority image picked by [`plan_loading`] is also preloaded with
//! `imagesrcset`/`imagesizes` so the browser can start fetching it before
//! layout.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! All interpolation is escaped; the only pre-escaped inputs are the
//! stylesheet and post bodies, which are rendered with raw HTML already
//! neutralized.

use crate::config::SiteConfig;
use crate::feed::ATOM_PATH;
use crate::pagination::Page;
use crate::post::{ImageRef, Layout, Post, collapse_whitespace};
use crate::process::{ImageSet, Loading, SIZES_HINT, plan_loading};
use crate::urls::SiteUrls;
use chrono::Datelike;
use maud::{DOCTYPE, Markup, PreEscaped, html};

/// Stylesheet compiled into the binary; a site's `theme.css` replaces it.
pub const BUILTIN_CSS: &str = include_str!("../static/style.css");

/// Feed card summaries are cut to this many characters.
const SUMMARY_MAX_CHARS: usize = 160;

/// Everything shared by all pages of one build.
#[derive(Debug, Clone, Copy)]
pub struct SiteContext<'a> {
    pub config: &'a SiteConfig,
    pub urls: &'a SiteUrls,
    pub images: &'a ImageSet,
    pub css: &'a str,
    /// Year shown in the footer, see [`footer_year`].
    pub footer_year: Option<i32>,
    pub has_favicon: bool,
    /// Whether `feed.xml` is written, so pages can advertise it.
    pub has_feed: bool,
}

/// The configured footer year, else the newest post's year.
pub fn footer_year(config: &SiteConfig, posts: &[Post]) -> Option<i32> {
    config
        .footer_year
        .or_else(|| posts.iter().map(|p| p.date.year()).max())
}

/// Title of feed page `number`.
pub fn feed_page_title(site_title: &str, number: usize) -> String {
    if number <= 1 {
        site_title.to_string()
    } else {
        format!("{site_title} — Page {number}")
    }
}

/// Title of a post page.
pub fn post_page_title(post: &Post, site_title: &str) -> String {
    format!("{} — {site_title}", post.title)
}

// ============================================================================
// Pages
// ============================================================================

/// Render one feed page.
pub fn render_feed_page(ctx: &SiteContext, page: &Page) -> Markup {
    let thumbs: Vec<&ImageRef> = page.posts.iter().filter_map(|p| p.images.first()).collect();
    let plan = plan_for(ctx, &thumbs);
    let mut loading = plan.iter().copied();

    let head = Head {
        title: feed_page_title(&ctx.config.title, page.number),
        path: page.url_path(),
        description: collapse_whitespace(&ctx.config.description),
        og_type: "website",
        og_image: thumbs.first().map(|image| primary_src(ctx, image)),
        prev: page.prev_url_path(),
        next: page.next_url_path(),
        preload: preload_for(ctx, &thumbs, &plan),
    };

    let content = html! {
        @if page.posts.is_empty() {
            p.empty { "Nothing here yet." }
        }
        @for post in page.posts {
            @let href = ctx.urls.href(&post.url_path());
            article.card {
                @if let Some(image) = post.images.first() {
                    a.thumb href=(href) tabindex="-1" {
                        (render_image(ctx, image, loading.next().unwrap_or(Loading::Lazy)))
                    }
                }
                h2 { a href=(href) { (post.title) } }
                (render_date(post))
                @if let Some(summary) = card_summary(post) {
                    p.summary { (summary) }
                }
            }
        }
        (render_pagination(ctx, page))
    };

    base_document(ctx, &head, "feed", page.is_first(), content)
}

/// Render one post page.
pub fn render_post_page(ctx: &SiteContext, post: &Post) -> Markup {
    let images: Vec<&ImageRef> = post.images.iter().collect();
    let plan = plan_for(ctx, &images);

    let head = Head {
        title: post_page_title(post, &ctx.config.title),
        path: post.url_path(),
        description: post.description(&ctx.config.description),
        og_type: "article",
        og_image: images.first().map(|image| primary_src(ctx, image)),
        prev: None,
        next: None,
        preload: preload_for(ctx, &images, &plan),
    };

    let figures = html! {
        @if !images.is_empty() {
            div.images {
                @for (image, loading) in images.iter().zip(plan.iter().copied()) {
                    figure { (render_image(ctx, image, loading)) }
                }
            }
        }
    };
    let header = html! {
        header {
            h1 { (post.title) }
            (render_date(post))
        }
    };
    let body = html! {
        @if !post.body_html.is_empty() {
            div.body { (PreEscaped(&post.body_html)) }
        }
    };

    let content = html! {
        article class={ "post post-" (post.layout.as_str()) } {
            @match post.layout {
                Layout::Photo => { (figures) (header) (body) }
                Layout::Default => { (header) (body) (figures) }
            }
        }
        a.back href=(ctx.urls.href("")) { "← All posts" }
    };

    base_document(ctx, &head, "post-page", false, content)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Per-page head values.
struct Head {
    title: String,
    /// Site path of the page, `""` for the index.
    path: String,
    description: String,
    og_type: &'static str,
    /// Output-relative path of the Open Graph image.
    og_image: Option<String>,
    prev: Option<String>,
    next: Option<String>,
    preload: Option<ImgAttrs>,
}

/// Renders the base HTML document structure
fn base_document(
    ctx: &SiteContext,
    head: &Head,
    body_class: &str,
    title_is_heading: bool,
    content: Markup,
) -> Markup {
    let canonical = ctx.urls.public_url(&head.path);
    let og_image = head.og_image.as_deref().map(|p| ctx.urls.public_url(p));
    let twitter_card = if og_image.is_some() {
        "summary_large_image"
    } else {
        "summary"
    };

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (head.title) }
                @if !head.description.is_empty() {
                    meta name="description" content=(head.description);
                }
                link rel="canonical" href=(canonical);
                meta property="og:type" content=(head.og_type);
                meta property="og:site_name" content=(ctx.config.title);
                meta property="og:title" content=(head.title);
                @if !head.description.is_empty() {
                    meta property="og:description" content=(head.description);
                }
                meta property="og:url" content=(canonical);
                @if let Some(image) = &og_image {
                    meta property="og:image" content=(image);
                }
                meta name="twitter:card" content=(twitter_card);
                @if let Some(prev) = &head.prev {
                    link rel="prev" href=(ctx.urls.href(prev));
                }
                @if let Some(next) = &head.next {
                    link rel="next" href=(ctx.urls.href(next));
                }
                @if ctx.has_feed {
                    link rel="alternate" type="application/atom+xml" title=(ctx.config.title) href=(ctx.urls.href(ATOM_PATH));
                }
                @if ctx.has_favicon {
                    link rel="icon" type="image/png" href=(ctx.urls.href("favicon.png"));
                }
                @if let Some(image) = &head.preload {
                    link rel="preload" as="image" href=(image.src) imagesrcset=[image.srcset.as_deref()] imagesizes=[image.sizes()] fetchpriority="high";
                }
                style { (PreEscaped(ctx.css)) }
            }
            body class=(body_class) {
                (site_header(ctx, title_is_heading))
                main { (content) }
                (site_footer(ctx))
            }
        }
    }
}

/// Site title and tagline. Only the index uses `<h1>` for the title.
fn site_header(ctx: &SiteContext, title_is_heading: bool) -> Markup {
    let link = html! { a href=(ctx.urls.href("")) { (ctx.config.title) } };
    html! {
        header.site-header {
            @if title_is_heading {
                h1.site-title { (link) }
            } @else {
                p.site-title { (link) }
            }
            @if !ctx.config.tagline.is_empty() {
                p.tagline { (ctx.config.tagline) }
            }
        }
    }
}

fn site_footer(ctx: &SiteContext) -> Markup {
    let owner = if ctx.config.author.is_empty() {
        &ctx.config.title
    } else {
        &ctx.config.author
    };
    html! {
        footer.site-footer {
            "© "
            @if let Some(year) = ctx.footer_year {
                (year) " "
            }
            (owner)
        }
    }
}

fn render_date(post: &Post) -> Markup {
    html! {
        time datetime=(post.iso_date()) { (post.display_date()) }
    }
}

/// Newer/older links plus the page position.
fn render_pagination(ctx: &SiteContext, page: &Page) -> Markup {
    if page.total <= 1 {
        return html! {};
    }
    html! {
        nav.pagination aria-label="Pagination" {
            @if let Some(prev) = page.prev_url_path() {
                a rel="prev" href=(ctx.urls.href(&prev)) { "← Newer" }
            } @else {
                span.spacer {}
            }
            span.position { "Page " (page.number) " of " (page.total) }
            @if let Some(next) = page.next_url_path() {
                a rel="next" href=(ctx.urls.href(&next)) { "Older →" }
            } @else {
                span.spacer {}
            }
        }
    }
}

/// Resolved `<img>` attributes for one image reference.
#[derive(Debug, Clone, PartialEq)]
struct ImgAttrs {
    src: String,
    srcset: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl ImgAttrs {
    fn resolve(ctx: &SiteContext, image: &ImageRef) -> Self {
        let Some(meta) = ctx.images.get(&image.src) else {
            return Self {
                src: ctx.urls.href(&image.src),
                srcset: None,
                width: None,
                height: None,
            };
        };
        let srcset = (!meta.variants.is_empty()).then(|| {
            meta.srcset_candidates()
                .iter()
                .map(|(path, width)| format!("{} {width}w", ctx.urls.href(path)))
                .collect::<Vec<_>>()
                .join(", ")
        });
        Self {
            src: ctx.urls.href(meta.primary_path()),
            srcset,
            width: meta.intrinsic_width,
            height: meta.intrinsic_height,
        }
    }

    fn sizes(&self) -> Option<&'static str> {
        self.srcset.as_ref().map(|_| SIZES_HINT)
    }
}

fn render_image(ctx: &SiteContext, image: &ImageRef, loading: Loading) -> Markup {
    let attrs = ImgAttrs::resolve(ctx, image);
    html! {
        img src=(attrs.src)
            srcset=[attrs.srcset.as_deref()]
            sizes=[attrs.sizes()]
            width=[attrs.width]
            height=[attrs.height]
            alt=(image.alt.as_deref().unwrap_or(""))
            loading=(loading.attr())
            decoding="async"
            fetchpriority=[loading.is_high_priority().then_some("high")];
    }
}

/// Loading plan for images in render order.
fn plan_for(ctx: &SiteContext, images: &[&ImageRef]) -> Vec<Loading> {
    let candidates: Vec<bool> = images
        .iter()
        .map(|image| {
            ctx.images
                .get(&image.src)
                .is_some_and(|meta| meta.is_lcp_candidate)
        })
        .collect();
    plan_loading(&candidates, ctx.config.eager_images)
}

fn preload_for(ctx: &SiteContext, images: &[&ImageRef], plan: &[Loading]) -> Option<ImgAttrs> {
    let index = plan.iter().position(|l| l.is_high_priority())?;
    Some(ImgAttrs::resolve(ctx, images[index]))
}

/// Output-relative path of the `src` an image renders with.
fn primary_src(ctx: &SiteContext, image: &ImageRef) -> String {
    ctx.images
        .get(&image.src)
        .map(|meta| meta.primary_path().to_string())
        .unwrap_or_else(|| image.src.clone())
}

/// Excerpt, else the start of the body text.
fn card_summary(post: &Post) -> Option<String> {
    if let Some(excerpt) = &post.excerpt {
        return Some(collapse_whitespace(excerpt));
    }
    if post.body_text.is_empty() {
        return None;
    }
    if post.body_text.chars().count() <= SUMMARY_MAX_CHARS {
        return Some(post.body_text.clone());
    }
    let cut: String = post.body_text.chars().take(SUMMARY_MAX_CHARS).collect();
    Some(format!("{}…", cut.trim_end()))
}
