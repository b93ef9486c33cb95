//! Template loading
//!
//! The tag processor reads other templates (for cross-file fragments) through a
//! [`TemplateLoader`]. Caching, if any, is the loader's business.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use thyme_markup::Document;

use crate::error::{Error, Result};

/// Source of template documents
pub trait TemplateLoader {
    /// Modification time of `file`; an error when it does not exist
    fn file_time(&self, file: &Path) -> Result<SystemTime>;

    /// Load and parse `file`
    fn load_template(&self, file: &Path) -> Result<Document>;
}

/// Probe `base` with each of `extensions` appended, returning the first that exists
pub fn locate_template(
    loader: &dyn TemplateLoader,
    base: &Path,
    extensions: &[String],
) -> Option<PathBuf> {
    extensions.iter().find_map(|ext| {
        let mut candidate = base.as_os_str().to_os_string();
        candidate.push(ext);
        let candidate = PathBuf::from(candidate);
        loader.file_time(&candidate).ok().map(|_| candidate)
    })
}

/// Loads templates from a directory on disk
#[derive(Debug, Clone)]
pub struct FileLoader {
    docroot: PathBuf,
}

impl FileLoader {
    /// A loader rooted at `docroot`, which must exist unless it is empty
    pub fn new(docroot: impl Into<PathBuf>) -> Result<Self> {
        let docroot = docroot.into();
        if !docroot.as_os_str().is_empty() && !docroot.exists() {
            return Err(Error::TemplateNotFound(format!(
                "docroot '{}' does not seem to exist",
                docroot.display()
            )));
        }
        Ok(Self { docroot })
    }

    pub fn docroot(&self) -> &Path {
        &self.docroot
    }

    /// Absolute paths are taken relative to the docroot
    fn resolve(&self, file: &Path) -> PathBuf {
        let relative: PathBuf = file
            .components()
            .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
            .collect();
        self.docroot.join(relative)
    }
}

impl TemplateLoader for FileLoader {
    fn file_time(&self, file: &Path) -> Result<SystemTime> {
        let path = self.resolve(file);
        let metadata = fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(Error::TemplateNotFound(path.display().to_string()));
        }
        Ok(metadata.modified()?)
    }

    fn load_template(&self, file: &Path) -> Result<Document> {
        let path = self.resolve(file);
        tracing::debug!(path = %path.display(), "loading template");

        let text = fs::read_to_string(&path).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "cannot read template");
            Error::TemplateNotFound(file.display().to_string())
        })?;

        Ok(Document::parse(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_probed_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("page.html"), "<html/>").unwrap();
        fs::write(dir.path().join("page.xml"), "<xml/>").unwrap();

        let loader = FileLoader::new(dir.path()).unwrap();
        let extensions: Vec<String> = ["", ".xhtml", ".html", ".xml"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let found = locate_template(&loader, Path::new("page"), &extensions).unwrap();
        assert_eq!(found, PathBuf::from("page.html"));
        assert!(locate_template(&loader, Path::new("missing"), &extensions).is_none());
    }

    #[test]
    fn rooted_paths_stay_inside_docroot() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("t.xhtml"), "<t>x</t>").unwrap();

        let loader = FileLoader::new(dir.path()).unwrap();
        let doc = loader.load_template(Path::new("/t.xhtml")).unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.name(root), Some("t"));

        assert!(matches!(
            loader.load_template(Path::new("nope.xhtml")),
            Err(Error::TemplateNotFound(_))
        ));
        assert!(FileLoader::new(dir.path().join("absent")).is_err());
    }
}
