//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: identify and resize.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests swap in the
//! recording [`MockBackend`](tests::MockBackend).

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Both operations must be implemented so the rest of the codebase is
/// backend-agnostic.
pub trait ImageBackend {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Execute a resize operation, encoding in the output's format.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    ///
    /// `identify` answers from `identify_results` (popped from the back) and
    /// falls back to `default_dimensions` when the queue is empty.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub default_dimensions: Option<Dimensions>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Resize {
            source: String,
            output: String,
            width: u32,
            height: u32,
            quality: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                ..Self::default()
            }
        }

        /// Every identify returns the same size.
        pub fn uniform(width: u32, height: u32) -> Self {
            Self {
                default_dimensions: Some(Dimensions { width, height }),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        pub fn identify_count(&self) -> usize {
            self.get_operations()
                .iter()
                .filter(|op| matches!(op, RecordedOp::Identify(_)))
                .count()
        }

        pub fn resize_outputs(&self) -> Vec<String> {
            self.get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Resize { output, .. } => Some(output),
                    _ => None,
                })
                .collect()
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(path.to_string_lossy().to_string()));

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .or(self.default_dimensions)
                .ok_or_else(|| BackendError::ProcessingFailed("No mock dimensions".to_string()))
        }

        fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                source: params.source.to_string_lossy().to_string(),
                output: params.output.to_string_lossy().to_string(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_without_dimensions_errors() {
        let backend = MockBackend::new();
        assert!(backend.identify(Path::new("/x.jpg")).is_err());
    }

    #[test]
    fn mock_uniform_answers_every_call() {
        let backend = MockBackend::uniform(640, 480);
        for _ in 0..3 {
            let dims = backend.identify(Path::new("/x.jpg")).unwrap();
            assert_eq!((dims.width, dims.height), (640, 480));
        }
        assert_eq!(backend.identify_count(), 3);
    }

    #[test]
    fn mock_records_resize() {
        let backend = MockBackend::new();

        backend
            .resize(&ResizeParams {
                source: "/source.jpg".into(),
                output: "/source-480w.jpg".into(),
                width: 480,
                height: 360,
                quality: super::super::params::Quality::new(90),
            })
            .unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize {
                width: 480,
                height: 360,
                quality: 90,
                ..
            }
        ));
        assert_eq!(backend.resize_outputs(), vec!["/source-480w.jpg".to_string()]);
    }
}
