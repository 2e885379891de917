//! Registry of compiled query parsers, one per graph.
//!
//! A graph's [`QueryParser`] is built when its schema is registered and rebuilt
//! only when the schema is replaced. Parsers are immutable and shared through
//! `Arc`, so concurrent queries against one graph need no locking beyond the
//! lookup itself.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::error::{QueryError, Result};
use crate::parser::QueryParser;
use crate::plan::QueryPlan;
use crate::schema::Schema;

pub struct GraphRegistry {
    parsers: RwLock<HashMap<String, Arc<QueryParser>>>,
    max_query_length: usize,
}

impl GraphRegistry {
    pub fn new(max_query_length: usize) -> Self {
        Self {
            parsers: RwLock::new(HashMap::new()),
            max_query_length,
        }
    }

    /// Builds the parser for `schema` and makes it the graph's current one.
    /// An inconsistent schema leaves the previous parser in place.
    pub fn register(&self, slug: &str, schema: &Schema) -> Result<Arc<QueryParser>> {
        let parser = Arc::new(QueryParser::new(schema)?.with_max_query_length(self.max_query_length));
        let replaced = self
            .parsers
            .write()
            .map_err(|e| QueryError::Lock(e.to_string()))?
            .insert(slug.to_owned(), Arc::clone(&parser))
            .is_some();
        info!(
            graph = slug,
            node_types = schema.node_types().len(),
            relationship_types = schema.relationship_types().len(),
            replaced,
            "schema registered"
        );
        Ok(parser)
    }

    pub fn remove(&self, slug: &str) -> Result<bool> {
        Ok(self
            .parsers
            .write()
            .map_err(|e| QueryError::Lock(e.to_string()))?
            .remove(slug)
            .is_some())
    }

    pub fn parser(&self, slug: &str) -> Result<Arc<QueryParser>> {
        self.parsers
            .read()
            .map_err(|e| QueryError::Lock(e.to_string()))?
            .get(slug)
            .cloned()
            .ok_or_else(|| QueryError::UnknownGraph(slug.to_owned()))
    }

    pub fn parse(&self, slug: &str, query: &str) -> Result<QueryPlan> {
        self.parser(slug)?.parse(query)
    }

    pub fn describe(&self, slug: &str) -> Result<String> {
        Ok(self.parser(slug)?.grammar().describe())
    }

    pub fn slugs(&self) -> Result<Vec<String>> {
        let mut slugs: Vec<String> = self
            .parsers
            .read()
            .map_err(|e| QueryError::Lock(e.to_string()))?
            .keys()
            .cloned()
            .collect();
        slugs.sort();
        Ok(slugs)
    }

    /// Registers every `<slug>.json` schema in `directory`, skipping (and
    /// logging) files that do not load. Returns how many graphs were registered.
    pub fn load_directory(&self, directory: &Path) -> Result<usize> {
        if !directory.is_dir() {
            warn!(directory = %directory.display(), "schema directory not found");
            return Ok(0);
        }
        let mut loaded = 0;
        for entry in fs::read_dir(directory)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(slug) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            debug!(path = %path.display(), "loading schema");
            match Schema::load(&path).and_then(|schema| self.register(slug, &schema)) {
                Ok(_) => loaded += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "schema skipped"),
            }
        }
        Ok(loaded)
    }
}
