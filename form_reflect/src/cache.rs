/* Per-schema path tables, built once and shared by every bind */

use crate::flatten::{flatten, QueryPath};
use form_types::MessageSchema;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/* Flattened paths of one message with an exact-name index */
#[derive(Debug)]
pub struct PathTable {
    paths: Vec<QueryPath>,
    index: HashMap<String, usize>,
}

impl PathTable {
    pub fn build(schema: &MessageSchema) -> Self {
        let paths = flatten(schema);
        let index = paths
            .iter()
            .enumerate()
            .map(|(idx, path)| (path.dotted_name.clone(), idx))
            .collect();
        Self { paths, index }
    }

    /* Exact dotted-name lookup; no prefix matching */
    pub fn lookup(&self, dotted_name: &str) -> Option<&QueryPath> {
        self.index.get(dotted_name).map(|idx| &self.paths[*idx])
    }

    pub fn paths(&self) -> &[QueryPath] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

struct CacheEntry {
    /* Keeps the schema alive so its address cannot be reused by another */
    _schema: Arc<MessageSchema>,
    table: Arc<PathTable>,
}

/// Path tables keyed by schema identity.
///
/// Lookups take a shared lock. A miss takes the exclusive lock, re-checks,
/// builds and publishes, so each schema is flattened at most once. Entries
/// are never invalidated.
#[derive(Default)]
pub struct PathCache {
    tables: RwLock<HashMap<usize, CacheEntry>>,
}

impl std::fmt::Debug for PathCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathCache")
            .field("schemas", &self.len())
            .finish()
    }
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /* Get the table for a schema, flattening it on first use */
    pub fn get_or_build(&self, schema: &Arc<MessageSchema>) -> Arc<PathTable> {
        let key = Arc::as_ptr(schema) as usize;
        {
            let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = tables.get(&key) {
                return entry.table.clone();
            }
        }

        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let entry = tables.entry(key).or_insert_with(|| {
            let table = PathTable::build(schema);
            debug!(
                message = %schema.name,
                paths = table.len(),
                "built form path table"
            );
            CacheEntry {
                _schema: schema.clone(),
                table: Arc::new(table),
            }
        });
        entry.table.clone()
    }

    /* Number of schemas with a published table */
    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
