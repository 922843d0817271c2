use crate::errors::{SchemaError, SchemaResult};
use crate::file::SchemaFile;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/* Import resolver for loading a schema file together with its imports */
pub struct ImportResolver {
    /* Track loaded files so each is read once and import cycles terminate */
    loaded_files: HashSet<PathBuf>,

    /* Include directories for searching imports */
    include_dirs: Vec<PathBuf>,

    /* Loaded files, imports before the files importing them */
    files: Vec<SchemaFile>,
}

impl ImportResolver {
    pub fn new(include_dirs: Vec<PathBuf>) -> Self {
        Self {
            loaded_files: HashSet::new(),
            include_dirs,
            files: Vec::new(),
        }
    }

    /* Resolve an import relative to the importing file, then the include directories */
    fn resolve_import_path(&self, import_path: &str, base_file: &Path) -> SchemaResult<PathBuf> {
        let candidates = base_file
            .parent()
            .into_iter()
            .chain(self.include_dirs.iter().map(PathBuf::as_path))
            .map(|dir| dir.join(import_path));

        for candidate in candidates {
            if candidate.exists() {
                return canonicalize(&candidate);
            }
        }

        Err(SchemaError::ImportNotFound {
            import: import_path.to_string(),
            base: base_file.to_path_buf(),
        })
    }

    /* Load a schema file and recursively load its imports */
    pub fn load_file_with_imports(&mut self, file_path: &Path) -> SchemaResult<()> {
        let canonical_path = canonicalize(file_path)?;
        if !self.loaded_files.insert(canonical_path.clone()) {
            debug!(path = %file_path.display(), "skipping already loaded schema file");
            return Ok(());
        }

        let file = SchemaFile::load(&canonical_path)?;
        debug!(
            path = %file_path.display(),
            package = %file.package,
            messages = file.messages.len(),
            imports = file.imports.len(),
            "loaded schema file"
        );

        for import in &file.imports {
            let import_path = self.resolve_import_path(import, &canonical_path)?;
            self.load_file_with_imports(&import_path)?;
        }

        self.files.push(file);
        Ok(())
    }

    /* Get all loaded files; the root file comes last */
    pub fn files(&self) -> &[SchemaFile] {
        &self.files
    }

    pub fn into_files(self) -> Vec<SchemaFile> {
        self.files
    }

    pub fn loaded_file_count(&self) -> usize {
        self.loaded_files.len()
    }
}

fn canonicalize(path: &Path) -> SchemaResult<PathBuf> {
    path.canonicalize().map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })
}
