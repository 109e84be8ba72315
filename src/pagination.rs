//! Feed pagination.
//!
//! Posts (already newest-first) are split into fixed-size pages. Page 1 is
//! the site index; page N ≥ 2 lives at `page/N/`. Every page links to its
//! immediate neighbours only.

use crate::post::Post;

/// One feed page: a slice of the ordered posts plus its position.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    /// 1-based page number.
    pub number: usize,
    pub total: usize,
    pub posts: &'a [Post],
}

impl Page<'_> {
    pub fn is_first(&self) -> bool {
        self.number == 1
    }

    /// Site path of this page: `""` or `page/N/`.
    pub fn url_path(&self) -> String {
        page_url_path(self.number)
    }

    /// Output file relative to the output root.
    pub fn output_path(&self) -> String {
        format!("{}index.html", self.url_path())
    }

    pub fn prev_url_path(&self) -> Option<String> {
        (self.number > 1).then(|| page_url_path(self.number - 1))
    }

    pub fn next_url_path(&self) -> Option<String> {
        (self.number < self.total).then(|| page_url_path(self.number + 1))
    }
}

/// Site path of page `number`.
pub fn page_url_path(number: usize) -> String {
    if number <= 1 {
        String::new()
    } else {
        format!("page/{number}/")
    }
}

/// Number of pages for `count` posts; always at least one.
pub fn total_pages(count: usize, per_page: usize) -> usize {
    count.div_ceil(per_page.max(1)).max(1)
}

/// Split posts into pages of `per_page`.
///
/// An empty post list still yields one (empty) index page.
pub fn paginate(posts: &[Post], per_page: usize) -> Vec<Page<'_>> {
    let per_page = per_page.max(1);
    let total = total_pages(posts.len(), per_page);
    if posts.is_empty() {
        return vec![Page {
            number: 1,
            total,
            posts,
        }];
    }
    posts
        .chunks(per_page)
        .enumerate()
        .map(|(i, chunk)| Page {
            number: i + 1,
            total,
            posts: chunk,
        })
        .collect()
}
