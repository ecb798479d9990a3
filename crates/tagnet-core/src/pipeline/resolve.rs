//! Resolve a manifest identifier to an image file.

use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Finds `<dir>/<name>.<ext>` by trying extensions in preference order.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    dir: PathBuf,
    extensions: Vec<String>,
}

impl ImageResolver {
    /// Leading dots on extensions are ignored, so `".png"` and `"png"` are the same.
    pub fn new(dir: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            dir: dir.into(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Candidate paths for an identifier, most preferred first.
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        self.extensions
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", name, ext)))
            .collect()
    }

    /// The first candidate that exists as a file.
    pub async fn resolve(&self, name: &str) -> Result<PathBuf, PipelineError> {
        for candidate in self.candidates(name) {
            match tokio::fs::metadata(&candidate).await {
                Ok(metadata) if metadata.is_file() => return Ok(candidate),
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(PipelineError::ImageProcessing {
                        path: candidate,
                        message: format!("Cannot read metadata: {}", e),
                    })
                }
            }
        }

        Err(PipelineError::ImageNotFound {
            name: name.to_string(),
            dir: self.dir.clone(),
            tried: self.extensions.join(", "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_png_preferred_over_jpg() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("foo.png"), b"png").unwrap();
        std::fs::write(dir.path().join("foo.jpg"), b"jpg").unwrap();

        let resolver = ImageResolver::new(dir.path(), &exts(&["png", "jpg"]));
        let path = resolver.resolve("foo").await.unwrap();
        assert_eq!(path, dir.path().join("foo.png"));
    }

    #[tokio::test]
    async fn test_falls_back_to_later_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("foo.jpg"), b"jpg").unwrap();

        let resolver = ImageResolver::new(dir.path(), &exts(&["png", "jpg"]));
        let path = resolver.resolve("foo").await.unwrap();
        assert_eq!(path, dir.path().join("foo.jpg"));
    }

    #[tokio::test]
    async fn test_not_found_names_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ImageResolver::new(dir.path(), &exts(&["png", "jpg"]));

        let err = resolver.resolve("missingno").await.unwrap_err();
        match &err {
            PipelineError::ImageNotFound { name, tried, .. } => {
                assert_eq!(name, "missingno");
                assert_eq!(tried, "png, jpg");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("missingno"));
    }

    #[tokio::test]
    async fn test_directory_with_image_name_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("foo.png")).unwrap();
        std::fs::write(dir.path().join("foo.jpg"), b"jpg").unwrap();

        let resolver = ImageResolver::new(dir.path(), &exts(&["png", "jpg"]));
        assert_eq!(
            resolver.resolve("foo").await.unwrap(),
            dir.path().join("foo.jpg")
        );
    }

    #[tokio::test]
    async fn test_unreadable_candidate_is_not_reported_missing() {
        // a regular file in place of the image directory fails with ENOTDIR
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain");
        std::fs::write(&plain, b"not a directory").unwrap();

        let resolver = ImageResolver::new(&plain, &exts(&["png"]));
        let err = resolver.resolve("foo").await.unwrap_err();
        assert!(
            matches!(err, PipelineError::ImageProcessing { ref path, .. } if *path == plain.join("foo.png")),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_leading_dots_stripped() {
        let resolver = ImageResolver::new("/imgs", &exts(&[".png", "jpg"]));
        assert_eq!(
            resolver.candidates("a"),
            vec![PathBuf::from("/imgs/a.png"), PathBuf::from("/imgs/a.jpg")]
        );
    }
}
