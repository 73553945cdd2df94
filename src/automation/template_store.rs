//! Ordered collection of the templates configured for search

use crate::error::{ClickerError, ClickerResult};
use crate::template_matching::{Template, TemplateId};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Templates in insertion order; the order is the scan priority
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: Vec<Arc<Template>>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a template unless one from the same source is already present
    pub fn add(&mut self, template: Template) -> ClickerResult<TemplateId> {
        if self.contains_source(template.source()) {
            return Err(ClickerError::DuplicateTemplate {
                path: template.source().to_path_buf(),
            });
        }
        let id = template.id();
        log::info!("🖼️ Template added: {} {}", id, template.name());
        self.templates.push(Arc::new(template));
        Ok(id)
    }

    /// Load and append an image file
    pub fn add_path(&mut self, path: impl AsRef<Path>) -> ClickerResult<TemplateId> {
        let path = path.as_ref();
        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if self.contains_source(&canonical) {
            return Err(ClickerError::DuplicateTemplate { path: canonical });
        }
        self.add(Template::load(path)?)
    }

    /// Load a persisted list of template paths in order.
    ///
    /// Files that are missing, unreadable or duplicated are skipped; their
    /// errors are returned so the caller can report them.
    pub fn load_all<P: AsRef<Path>>(&mut self, paths: &[P]) -> Vec<ClickerError> {
        let mut skipped = Vec::new();
        for path in paths {
            if let Err(e) = self.add_path(path) {
                log::warn!("⚠️ Skipping template {:?}: {}", path.as_ref(), e);
                skipped.push(e);
            }
        }
        skipped
    }

    pub fn remove(&mut self, id: TemplateId) -> ClickerResult<Arc<Template>> {
        let index = self
            .templates
            .iter()
            .position(|t| t.id() == id)
            .ok_or(ClickerError::TemplateNotFound { id })?;
        let removed = self.templates.remove(index);
        log::info!("🗑️ Template removed: {} {}", id, removed.name());
        Ok(removed)
    }

    pub fn get(&self, id: TemplateId) -> Option<&Arc<Template>> {
        self.templates.iter().find(|t| t.id() == id)
    }

    /// Read-only view in scan order
    pub fn list(&self) -> &[Arc<Template>] {
        &self.templates
    }

    /// Copy of the current list for a run; later edits do not affect it
    pub fn snapshot(&self) -> Vec<Arc<Template>> {
        self.templates.clone()
    }

    /// Source paths in order, the shape persisted in settings
    pub fn sources(&self) -> Vec<PathBuf> {
        self.templates
            .iter()
            .map(|t| t.source().to_path_buf())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn clear(&mut self) {
        self.templates.clear();
    }

    fn contains_source(&self, source: &Path) -> bool {
        self.templates.iter().any(|t| t.source() == source)
    }
}
