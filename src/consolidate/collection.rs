//! Ordered sets of named datasets.

use std::path::{Path, PathBuf};

use crate::error::{EngineError, EngineResult};
use crate::ingestion::{ingest_from_path, IngestionOptions};
use crate::types::DataSet;

/// One dataset in a [`DatasetCollection`].
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionEntry {
    /// Stable identifier, usually the source file stem.
    pub id: String,
    pub dataset: DataSet,
    /// File the dataset was read from, if any.
    pub source: Option<PathBuf>,
}

/// Ordered mapping from dataset id to dataset.
///
/// Iteration order is insertion order; consolidation relies on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetCollection {
    entries: Vec<CollectionEntry>,
}

impl DatasetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `dataset` under `id`. An existing entry with the same id is replaced in place.
    pub fn insert(&mut self, id: impl Into<String>, dataset: DataSet) -> &mut Self {
        self.upsert(CollectionEntry {
            id: id.into(),
            dataset,
            source: None,
        });
        self
    }

    /// Insert a dataset that was read from `source`.
    pub fn insert_with_source(
        &mut self,
        id: impl Into<String>,
        dataset: DataSet,
        source: impl Into<PathBuf>,
    ) -> &mut Self {
        self.upsert(CollectionEntry {
            id: id.into(),
            dataset,
            source: Some(source.into()),
        });
        self
    }

    fn upsert(&mut self, entry: CollectionEntry) {
        match self.entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, id: &str) -> Option<&DataSet> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.dataset)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollectionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Directory consolidated exports go to: the parent of the first entry's source file.
    pub fn output_dir(&self) -> Option<PathBuf> {
        let source = self.entries.first()?.source.as_ref()?;
        match source.parent() {
            Some(p) if !p.as_os_str().is_empty() => Some(p.to_path_buf()),
            _ => Some(PathBuf::from(".")),
        }
    }

    /// Read every path in order. Ids are file stems; a repeated stem gets a `_2`, `_3`, ...
    /// suffix so no file is shadowed.
    ///
    /// # Errors
    ///
    /// The first ingestion failure, with nothing returned.
    pub fn load_paths<P: AsRef<Path>>(paths: &[P], options: &IngestionOptions) -> EngineResult<Self> {
        let mut collection = Self::new();
        for path in paths {
            let path = path.as_ref();
            let dataset = ingest_from_path(path, options)?;
            let id = collection.unique_id(&dataset_id_from_path(path));
            collection.insert_with_source(id, dataset, path);
        }
        Ok(collection)
    }

    /// Read every file matching a glob pattern, in the pattern's (sorted) match order.
    ///
    /// # Errors
    ///
    /// [`EngineError::Pattern`] for a malformed pattern, [`EngineError::Io`] for an unreadable
    /// match, or the first ingestion failure.
    pub fn load_glob(pattern: &str, options: &IngestionOptions) -> EngineResult<Self> {
        let paths = glob::glob(pattern)?
            .map(|entry| entry.map_err(|e| EngineError::Io(e.into())))
            .collect::<EngineResult<Vec<PathBuf>>>()?;
        tracing::debug!(pattern, matches = paths.len(), "expanded dataset glob");
        Self::load_paths(&paths, options)
    }

    fn unique_id(&self, base: &str) -> String {
        if self.get(base).is_none() {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base}_{n}"))
            .find(|candidate| self.get(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }
}

impl<'a> IntoIterator for &'a DatasetCollection {
    type Item = &'a CollectionEntry;
    type IntoIter = std::slice::Iter<'a, CollectionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Dataset id for a source file: its stem, or the whole file name when there is none.
pub fn dataset_id_from_path(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string())
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{dataset_id_from_path, DatasetCollection};
    use crate::types::{DataSet, Schema};

    #[test]
    fn insertion_order_is_kept_and_ids_replace_in_place() {
        let mut c = DatasetCollection::new();
        c.insert("b", DataSet::default());
        c.insert("a", DataSet::default());
        c.insert("b", DataSet::new(Schema::utf8(&["x"]), vec![]));
        assert_eq!(c.ids().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(c.get("b").unwrap().column_count(), 1);
    }

    #[test]
    fn output_dir_is_parent_of_first_source() {
        let mut c = DatasetCollection::new();
        assert_eq!(c.output_dir(), None);
        c.insert_with_source("sales", DataSet::default(), "data/in/sales.csv");
        c.insert_with_source("other", DataSet::default(), "elsewhere/other.csv");
        assert_eq!(c.output_dir(), Some(PathBuf::from("data/in")));

        let mut bare = DatasetCollection::new();
        bare.insert_with_source("x", DataSet::default(), "x.csv");
        assert_eq!(bare.output_dir(), Some(PathBuf::from(".")));
    }

    #[test]
    fn ids_come_from_file_stems() {
        assert_eq!(dataset_id_from_path(Path::new("/tmp/Q1 sales.xlsx")), "Q1 sales");
        assert_eq!(dataset_id_from_path(Path::new("notes")), "notes");
    }

    #[test]
    fn repeated_stems_are_disambiguated() {
        let mut c = DatasetCollection::new();
        c.insert("sales", DataSet::default());
        assert_eq!(c.unique_id("sales"), "sales_2");
        assert_eq!(c.unique_id("other"), "other");
    }
}
