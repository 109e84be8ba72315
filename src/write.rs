//! Output writing with all-or-nothing publication.
//!
//! A build never writes into the output directory directly. Everything goes
//! into a sibling staging directory (`dist` → `.dist.staging`) which only
//! replaces the output once the whole site has been written:
//!
//! ```text
//! .dist.staging/   ← Staging::create, every write lands here
//!      │  publish()
//!      ▼
//! dist/ → .dist.old  (rename)
//! .dist.staging → dist  (rename)
//! .dist.old  (removed)
//! ```
//!
//! Dropping a [`Staging`] without publishing removes the staging directory,
//! so any error during a build leaves the previous output untouched. If the
//! final rename fails the previous output is moved back; when even that
//! fails, [`WriteError::RestoreFailure`] says where it was left. Once the new
//! tree is in place the build has succeeded: a `.dist.old` that cannot be
//! removed is reported in [`Published::leftover`], not as an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("cannot write {}: {source}", path.display())]
    OutputWriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot read {}: {source}", path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "cannot publish {}: {source}; restoring the previous site also failed ({restore}), it is at {}",
        output.display(),
        backup.display()
    )]
    RestoreFailure {
        output: PathBuf,
        backup: PathBuf,
        #[source]
        source: io::Error,
        restore: io::Error,
    },
    #[error(
        "refusing to use {} as output: it would replace the site at {}",
        output.display(),
        source_root.display()
    )]
    UnsafeOutput {
        output: PathBuf,
        source_root: PathBuf,
    },
}

fn write_failure(path: &Path) -> impl FnOnce(io::Error) -> WriteError + '_ {
    move |source| WriteError::OutputWriteFailure {
        path: path.to_path_buf(),
        source,
    }
}

/// Outcome of [`Staging::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub output: PathBuf,
    /// Previous output moved aside during the swap that could not be
    /// removed afterwards.
    pub leftover: Option<PathBuf>,
}

/// A staging directory that becomes the output on [`publish`](Self::publish).
#[derive(Debug)]
pub struct Staging {
    dir: PathBuf,
    output: PathBuf,
    published: bool,
}

impl Staging {
    /// Create a fresh staging directory next to `output`.
    ///
    /// Fails with [`WriteError::UnsafeOutput`] when `output` is the site
    /// root or one of its ancestors, or has no usable file name.
    pub fn create(output: &Path, source_root: &Path) -> Result<Self, WriteError> {
        let unsafe_output = || WriteError::UnsafeOutput {
            output: output.to_path_buf(),
            source_root: source_root.to_path_buf(),
        };

        let name = output
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty() && *n != "." && *n != "..")
            .ok_or_else(unsafe_output)?;

        if let (Ok(root), Ok(out)) = (fs::canonicalize(source_root), fs::canonicalize(output))
            && root.starts_with(&out)
        {
            return Err(unsafe_output());
        }

        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(write_failure(&parent))?;

        let dir = parent.join(format!(".{name}.staging"));
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(write_failure(&dir))?;
        }
        fs::create_dir(&dir).map_err(write_failure(&dir))?;

        Ok(Self {
            dir,
            output: output.to_path_buf(),
            published: false,
        })
    }

    /// Root of the staging tree.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Write `contents` at `relative`, creating parent directories.
    pub fn write(
        &self,
        relative: impl AsRef<Path>,
        contents: impl AsRef<[u8]>,
    ) -> Result<(), WriteError> {
        let path = self.dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_failure(parent))?;
        }
        fs::write(&path, contents).map_err(write_failure(&path))
    }

    /// Copy one file byte-for-byte to `relative`.
    pub fn copy_file(&self, from: &Path, relative: impl AsRef<Path>) -> Result<(), WriteError> {
        let to = self.dir.join(relative);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(write_failure(parent))?;
        }
        fs::copy(from, &to).map_err(write_failure(&to))?;
        Ok(())
    }

    /// Copy the tree under `from` to `relative`, returning the file count.
    pub fn copy_dir(&self, from: &Path, relative: impl AsRef<Path>) -> Result<usize, WriteError> {
        let target = self.dir.join(relative);
        let mut copied = 0;
        for entry in WalkDir::new(from).sort_by_file_name() {
            let entry = entry.map_err(|e| WriteError::ReadFailure {
                path: e.path().unwrap_or(from).to_path_buf(),
                source: e.into(),
            })?;
            let rel = entry
                .path()
                .strip_prefix(from)
                .map_err(|_| WriteError::ReadFailure {
                    path: entry.path().to_path_buf(),
                    source: io::Error::other("entry outside copied tree"),
                })?;
            let to = target.join(rel);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&to).map_err(write_failure(&to))?;
            } else if entry.path().is_file() {
                fs::copy(entry.path(), &to).map_err(write_failure(&to))?;
                copied += 1;
            }
        }
        Ok(copied)
    }

    /// Replace the output directory with the staged tree.
    pub fn publish(self) -> Result<Published, WriteError> {
        self.publish_with(|from, to| fs::rename(from, to), remove_path)
    }

    fn publish_with(
        mut self,
        mut rename: impl FnMut(&Path, &Path) -> io::Result<()>,
        mut remove: impl FnMut(&Path) -> io::Result<()>,
    ) -> Result<Published, WriteError> {
        let backup = self.dir.with_file_name(
            self.dir
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.replace(".staging", ".old"))
                .unwrap_or_else(|| ".output.old".into()),
        );

        if backup.exists() {
            remove(&backup).map_err(write_failure(&backup))?;
        }
        let had_output = self.output.exists();
        if had_output {
            rename(&self.output, &backup).map_err(write_failure(&self.output))?;
        }
        if let Err(source) = rename(&self.dir, &self.output) {
            if had_output && let Err(restore) = rename(&backup, &self.output) {
                return Err(WriteError::RestoreFailure {
                    output: self.output.clone(),
                    backup,
                    source,
                    restore,
                });
            }
            return Err(WriteError::OutputWriteFailure {
                path: self.output.clone(),
                source,
            });
        }
        self.published = true;

        let leftover = (had_output && remove(&backup).is_err()).then_some(backup);
        Ok(Published {
            output: self.output.clone(),
            leftover,
        })
    }
}

fn remove_path(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if !self.published {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_file;
    use tempfile::TempDir;

    fn sandbox() -> (TempDir, PathBuf, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let site = tmp.path().join("site");
        fs::create_dir_all(&site).unwrap();
        let out = tmp.path().join("dist");
        (tmp, site, out)
    }

    #[test]
    fn staging_is_a_hidden_sibling() {
        let (tmp, site, out) = sandbox();
        let staging = Staging::create(&out, &site).unwrap();
        assert_eq!(staging.path(), tmp.path().join(".dist.staging"));
        assert!(staging.path().is_dir());
        assert!(!out.exists());
    }

    #[test]
    fn publish_replaces_previous_output() {
        let (tmp, site, out) = sandbox();
        write_file(&out.join("stale.html"), b"old");

        let staging = Staging::create(&out, &site).unwrap();
        staging.write("index.html", "new").unwrap();
        staging.write("2024/10/a/index.html", "post").unwrap();
        staging.publish().unwrap();

        assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "new");
        assert!(out.join("2024/10/a/index.html").is_file());
        assert!(!out.join("stale.html").exists());
        assert!(!tmp.path().join(".dist.staging").exists());
        assert!(!tmp.path().join(".dist.old").exists());
    }

    #[test]
    fn dropping_unpublished_staging_keeps_output() {
        let (tmp, site, out) = sandbox();
        write_file(&out.join("index.html"), b"old");
        {
            let staging = Staging::create(&out, &site).unwrap();
            staging.write("index.html", "half-built").unwrap();
        }
        assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "old");
        assert!(!tmp.path().join(".dist.staging").exists());
    }

    #[test]
    fn leftover_staging_is_cleared() {
        let (tmp, site, out) = sandbox();
        write_file(&tmp.path().join(".dist.staging/junk.txt"), b"x");
        let staging = Staging::create(&out, &site).unwrap();
        assert!(!staging.path().join("junk.txt").exists());
    }

    #[test]
    fn output_equal_to_site_root_rejected() {
        let (_tmp, site, _) = sandbox();
        let result = Staging::create(&site, &site);
        assert!(matches!(result, Err(WriteError::UnsafeOutput { .. })));
    }

    #[test]
    fn output_above_site_root_rejected() {
        let (tmp, site, _) = sandbox();
        let result = Staging::create(tmp.path(), &site);
        assert!(matches!(result, Err(WriteError::UnsafeOutput { .. })));
    }

    #[test]
    fn output_inside_site_root_allowed() {
        let (_tmp, site, _) = sandbox();
        let staging = Staging::create(&site.join("dist"), &site).unwrap();
        assert_eq!(staging.path(), site.join(".dist.staging"));
    }

    #[test]
    fn dot_output_rejected() {
        let (_tmp, site, _) = sandbox();
        assert!(matches!(
            Staging::create(Path::new("."), &site),
            Err(WriteError::UnsafeOutput { .. })
        ));
    }

    #[test]
    fn copy_dir_is_byte_for_byte() {
        let (_tmp, site, out) = sandbox();
        let bytes: Vec<u8> = (0..=255).collect();
        write_file(&site.join("static/img/a.bin"), &bytes);
        write_file(&site.join("static/b.css"), b"body{}");

        let staging = Staging::create(&out, &site).unwrap();
        let copied = staging.copy_dir(&site.join("static"), "static").unwrap();
        assert_eq!(copied, 2);
        assert_eq!(fs::read(staging.path().join("static/img/a.bin")).unwrap(), bytes);
        assert_eq!(fs::read(staging.path().join("static/b.css")).unwrap(), b"body{}");
    }

    #[test]
    fn copy_file_creates_parents() {
        let (_tmp, site, out) = sandbox();
        write_file(&site.join("photos/x.jpg"), b"jpeg");
        let staging = Staging::create(&out, &site).unwrap();
        staging.copy_file(&site.join("photos/x.jpg"), "photos/x.jpg").unwrap();
        assert_eq!(fs::read(staging.path().join("photos/x.jpg")).unwrap(), b"jpeg");
    }

    fn denied() -> io::Error {
        io::Error::new(io::ErrorKind::PermissionDenied, "denied")
    }

    #[test]
    fn failed_swap_restores_previous_output() {
        let (tmp, site, out) = sandbox();
        write_file(&out.join("index.html"), b"old");
        let staging = Staging::create(&out, &site).unwrap();
        let staged = staging.path().to_path_buf();

        let result = staging.publish_with(
            |from, to| if from == staged { Err(denied()) } else { fs::rename(from, to) },
            remove_path,
        );

        assert!(matches!(result, Err(WriteError::OutputWriteFailure { .. })));
        assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "old");
        assert!(!tmp.path().join(".dist.old").exists());
        assert!(!tmp.path().join(".dist.staging").exists());
    }

    #[test]
    fn failed_restore_is_reported_with_backup_location() {
        let (tmp, site, out) = sandbox();
        write_file(&out.join("index.html"), b"old");
        let staging = Staging::create(&out, &site).unwrap();
        let backup = tmp.path().join(".dist.old");
        let mut calls = 0;

        let err = staging
            .publish_with(
                |from, to| {
                    calls += 1;
                    if calls == 1 { fs::rename(from, to) } else { Err(denied()) }
                },
                remove_path,
            )
            .unwrap_err();

        match &err {
            WriteError::RestoreFailure {
                output, backup: left, ..
            } => {
                assert_eq!(output, &out);
                assert_eq!(left, &backup);
            }
            other => panic!("expected RestoreFailure, got {other:?}"),
        }
        assert!(err.to_string().contains(".dist.old"));
        assert_eq!(fs::read_to_string(backup.join("index.html")).unwrap(), "old");
    }

    #[test]
    fn leftover_backup_does_not_fail_publish() {
        let (tmp, site, out) = sandbox();
        write_file(&out.join("index.html"), b"old");
        let staging = Staging::create(&out, &site).unwrap();
        staging.write("index.html", "new").unwrap();

        let published = staging
            .publish_with(|from, to| fs::rename(from, to), |_| Err(denied()))
            .unwrap();

        let backup = tmp.path().join(".dist.old");
        assert_eq!(published.output, out);
        assert_eq!(published.leftover.as_deref(), Some(backup.as_path()));
        assert_eq!(fs::read_to_string(out.join("index.html")).unwrap(), "new");
    }

    #[test]
    fn clean_publish_has_no_leftover() {
        let (_tmp, site, out) = sandbox();
        write_file(&out.join("index.html"), b"old");
        let staging = Staging::create(&out, &site).unwrap();
        assert_eq!(staging.publish().unwrap().leftover, None);
    }
}
