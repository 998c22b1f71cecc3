// FATX path resolution
// Walks slash-separated components from the root directory cluster.

use fatx_core::FatxError;
use log::{debug, trace};

use super::dir_entry::FatxAttr;
use super::reader::FatxReader;

/// Result of path resolution.
#[derive(Debug, Clone)]
pub struct ResolvedPath {
    pub attr: FatxAttr,
    /// Cluster of the containing directory, `None` for the synthetic root.
    pub parent_cluster: Option<u32>,
}

pub struct PathResolver<'a> {
    reader: &'a mut FatxReader,
}

impl<'a> PathResolver<'a> {
    pub fn new(reader: &'a mut FatxReader) -> Self {
        Self { reader }
    }

    /// Resolve a path to its directory entry.
    ///
    /// Matching is ASCII case-insensitive; FATX preserves filename case on
    /// disk but treats names as equal regardless of case. An empty path or
    /// `/` resolves to the synthetic root attribute.
    pub fn resolve(&mut self, path: &str) -> Result<ResolvedPath, FatxError> {
        debug!("Resolving FATX path: {}", path);

        let components: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if components.is_empty() {
            return Ok(ResolvedPath {
                attr: self.reader.root_attr(),
                parent_cluster: None,
            });
        }

        let mut current_cluster = self.reader.volume().root_cluster;
        for (i, component) in components.iter().enumerate() {
            trace!(
                "Resolving component '{}' in cluster {}",
                component,
                current_cluster
            );

            let entries = self.reader.read_directory(current_cluster)?;
            let entry = entries
                .into_iter()
                .find(|e| e.filename.eq_ignore_ascii_case(component))
                .ok_or_else(|| {
                    FatxError::NotFound(format!("path component '{}' not found", component))
                })?;

            if i < components.len() - 1 {
                // Not the last component, must be a directory to descend into
                if !entry.is_directory() {
                    return Err(FatxError::NotADirectory(format!(
                        "'{}' is not a directory",
                        component
                    )));
                }
                current_cluster = entry.first_cluster;
            } else {
                return Ok(ResolvedPath {
                    attr: entry,
                    parent_cluster: Some(current_cluster),
                });
            }
        }

        Err(FatxError::NotFound(path.to_string()))
    }
}
