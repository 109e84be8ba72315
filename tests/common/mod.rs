//! Site fixtures shared by the integration tests.

#![allow(dead_code)]

use image::{ImageEncoder, RgbImage};
use microblog::pipeline::BuildOptions;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// A site root and an output directory inside one temp dir.
pub struct Fixture {
    pub tmp: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("site/posts")).unwrap();
        Self { tmp }
    }

    pub fn root(&self) -> PathBuf {
        self.tmp.path().join("site")
    }

    pub fn out(&self) -> PathBuf {
        self.tmp.path().join("dist")
    }

    pub fn options(&self) -> BuildOptions {
        BuildOptions {
            source: self.root(),
            output: self.out(),
            config: None,
        }
    }

    pub fn file(&self, relative: &str, contents: &[u8]) {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    pub fn post(&self, relative: &str, content: &str) {
        self.file(&format!("posts/{relative}"), content.as_bytes());
    }

    pub fn jpeg(&self, relative: &str, width: u32, height: u32) {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let writer = std::io::BufWriter::new(fs::File::create(&path).unwrap());
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    pub fn read_out(&self, relative: &str) -> String {
        let path = self.out().join(relative);
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
    }
}

/// SHA-256 of every file under `dir`, keyed by relative path.
pub fn tree_digest(dir: &Path) -> BTreeMap<String, String> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(dir).unwrap().to_string_lossy().into_owned();
            let digest = Sha256::digest(fs::read(e.path()).unwrap());
            let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
            (rel, hex)
        })
        .collect()
}
