//! Resolution of message definitions into shared schema trees.

use crate::errors::{SchemaError, SchemaResult};
use crate::file::{qualify, SchemaFile};
use crate::resolver::ImportResolver;
use form_types::{FieldKind, FieldSchema, FieldType, MessageDef, MessageRef, MessageSchema};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Message names that resolve to dynamic values instead of nested messages.
pub const DEFAULT_DYNAMIC_VALUE_TYPES: &[&str] = &["google.protobuf.Value"];

/* Options for loading and resolving schema files */
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /* Include directories for resolving imports */
    pub include_dirs: Vec<PathBuf>,
    /* Fully-qualified message names treated as dynamic values */
    pub dynamic_value_types: Vec<String>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            include_dirs: Vec::new(),
            dynamic_value_types: DEFAULT_DYNAMIC_VALUE_TYPES
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

impl LoaderOptions {
    pub fn with_include_dirs(include_dirs: Vec<PathBuf>) -> Self {
        Self {
            include_dirs,
            ..Self::default()
        }
    }
}

/// Every resolved message of a set of schema files, by full name.
///
/// Each message is resolved once, so all references to it share one
/// `Arc<MessageSchema>`. A message may contain itself through repeated, map,
/// extension or weak fields; such schemas form reference cycles and live as
/// long as the process.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    messages: BTreeMap<String, Arc<MessageSchema>>,
}

impl SchemaSet {
    /* Resolve every message declared in the given files */
    pub fn from_files(files: &[SchemaFile], options: &LoaderOptions) -> SchemaResult<Self> {
        let mut resolver = MessageResolver::new(files, options)?;
        let names: Vec<String> = resolver.definitions.keys().cloned().collect();
        let mut messages = BTreeMap::new();
        for name in names {
            let schema = resolver.resolve(&name, true)?;
            messages.insert(name, schema);
        }
        Ok(Self { messages })
    }

    /// Look up a message by full name, or by simple name when unique.
    pub fn get(&self, name: &str) -> Option<&Arc<MessageSchema>> {
        if let Some(schema) = self.messages.get(name) {
            return Some(schema);
        }
        let suffix = format!(".{name}");
        let mut matches = self
            .messages
            .iter()
            .filter(|(full_name, _)| full_name.ends_with(&suffix));
        match (matches.next(), matches.next()) {
            (Some((_, schema)), None) => Some(schema),
            _ => None,
        }
    }

    /* Like `get`, but a missing message is an error */
    pub fn message(&self, name: &str) -> SchemaResult<Arc<MessageSchema>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))
    }

    /* Messages that have not opted out of form binding */
    pub fn bindable_messages(&self) -> impl Iterator<Item = &Arc<MessageSchema>> {
        self.messages.values().filter(|schema| !schema.skip_form)
    }

    pub fn message_names(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Load a schema file with its imports and resolve all messages.
pub fn load_schemas(file_path: &Path, options: &LoaderOptions) -> SchemaResult<SchemaSet> {
    let mut imports = ImportResolver::new(options.include_dirs.clone());
    imports.load_file_with_imports(file_path)?;
    let files = imports.into_files();
    SchemaSet::from_files(&files, options)
}

/* Definition of one message together with the package it was declared in */
struct Definition<'a> {
    package: &'a str,
    def: &'a MessageDef,
}

/* A message being resolved and whether it was reached through an expandable field */
struct Frame {
    name: String,
    expandable: bool,
}

struct MessageResolver<'a> {
    definitions: BTreeMap<String, Definition<'a>>,
    dynamic_value_types: HashSet<String>,
    resolved: HashMap<String, Arc<MessageSchema>>,
    /* Messages currently being resolved, outermost first */
    in_progress: Vec<Frame>,
    /* Handles waiting for a message in `in_progress` to be published */
    pending: HashMap<String, Vec<MessageRef>>,
}

impl<'a> MessageResolver<'a> {
    fn new(files: &'a [SchemaFile], options: &LoaderOptions) -> SchemaResult<Self> {
        let mut definitions = BTreeMap::new();
        for file in files {
            for def in &file.messages {
                let full_name = file.full_name(&def.name);
                let definition = Definition {
                    package: &file.package,
                    def,
                };
                if definitions.insert(full_name.clone(), definition).is_some() {
                    return Err(SchemaError::DuplicateMessage(full_name));
                }
            }
        }

        Ok(Self {
            definitions,
            dynamic_value_types: options
                .dynamic_value_types
                .iter()
                .map(|name| name.trim_start_matches('.').to_string())
                .collect(),
            resolved: HashMap::new(),
            in_progress: Vec::new(),
            pending: HashMap::new(),
        })
    }

    fn resolve(&mut self, full_name: &str, expandable: bool) -> SchemaResult<Arc<MessageSchema>> {
        if let Some(schema) = self.resolved.get(full_name) {
            return Ok(schema.clone());
        }

        let (package, def) = match self.definitions.get(full_name) {
            Some(definition) => (definition.package, definition.def),
            None => return Err(SchemaError::NotFound(full_name.to_string())),
        };

        self.in_progress.push(Frame {
            name: full_name.to_string(),
            expandable,
        });
        let fields = self.resolve_fields(full_name, package, def);
        self.in_progress.pop();

        let schema = Arc::new(MessageSchema {
            name: full_name.to_string(),
            fields: fields?,
            skip_form: def.skip_form,
        });
        for handle in self.pending.remove(full_name).unwrap_or_default() {
            handle.fill(schema.clone());
        }
        self.resolved.insert(full_name.to_string(), schema.clone());
        Ok(schema)
    }

    /// Reference a message from a field.
    ///
    /// A message that is still being resolved yields a pending handle,
    /// unless every field on the way back to it is expandable: that cycle
    /// would produce unbounded dotted paths and is rejected.
    fn link(&mut self, target: &str, expandable: bool) -> SchemaResult<MessageRef> {
        if let Some(schema) = self.resolved.get(target) {
            return Ok(MessageRef::resolved(schema.clone()));
        }
        let Some(pos) = self.in_progress.iter().position(|frame| frame.name == target) else {
            return self.resolve(target, expandable).map(MessageRef::resolved);
        };

        if expandable && self.in_progress[pos + 1..].iter().all(|frame| frame.expandable) {
            let mut cycle: Vec<String> = self.in_progress[pos..]
                .iter()
                .map(|frame| frame.name.clone())
                .collect();
            cycle.push(target.to_string());
            return Err(SchemaError::RecursiveMessage {
                message: target.to_string(),
                cycle,
            });
        }

        let handle = MessageRef::pending();
        self.pending
            .entry(target.to_string())
            .or_default()
            .push(handle.clone());
        Ok(handle)
    }

    fn resolve_fields(
        &mut self,
        full_name: &str,
        package: &str,
        def: &MessageDef,
    ) -> SchemaResult<Vec<FieldSchema>> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(def.fields.len());

        for field in &def.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    message: full_name.to_string(),
                    field: field.name.clone(),
                });
            }

            let (kind, sub_schema) = match (&field.field_type, &field.message) {
                (FieldType::Message, None) => {
                    return Err(SchemaError::MissingMessageRef {
                        message: full_name.to_string(),
                        field: field.name.clone(),
                    })
                }
                (FieldType::Message, Some(target)) => {
                    if self.is_dynamic_value_type(package, target) {
                        (FieldKind::DynamicValue, None)
                    } else {
                        let target_name =
                            self.resolve_reference(full_name, &field.name, package, target)?;
                        let handle = self.link(&target_name, field.is_expandable())?;
                        (FieldKind::Message, Some(handle))
                    }
                }
                (_, Some(target)) => {
                    return Err(SchemaError::UnexpectedMessageRef {
                        message: full_name.to_string(),
                        field: field.name.clone(),
                        target: target.clone(),
                    })
                }
                (field_type, None) => (FieldKind::from(*field_type), None),
            };

            fields.push(FieldSchema {
                name: field.name.clone(),
                kind,
                repeated: field.repeated,
                optional: field.optional,
                is_map: field.map,
                is_extension: field.extension,
                is_weak: field.weak,
                sub_schema,
            });
        }
        Ok(fields)
    }

    fn is_dynamic_value_type(&self, package: &str, target: &str) -> bool {
        let target = target.trim_start_matches('.');
        self.dynamic_value_types.contains(target)
            || self.dynamic_value_types.contains(&qualify(package, target))
    }

    /* Full name, then package-relative name, then unique simple name */
    fn resolve_reference(
        &self,
        message: &str,
        field: &str,
        package: &str,
        target: &str,
    ) -> SchemaResult<String> {
        let target = target.trim_start_matches('.');
        if self.definitions.contains_key(target) {
            return Ok(target.to_string());
        }
        let relative = qualify(package, target);
        if self.definitions.contains_key(&relative) {
            return Ok(relative);
        }

        let suffix = format!(".{target}");
        let candidates: Vec<String> = self
            .definitions
            .keys()
            .filter(|name| name.ends_with(&suffix))
            .cloned()
            .collect();
        match candidates.as_slice() {
            [] => Err(SchemaError::UnknownMessage {
                message: message.to_string(),
                field: field.to_string(),
                target: target.to_string(),
            }),
            [single] => Ok(single.clone()),
            _ => Err(SchemaError::AmbiguousReference {
                target: target.to_string(),
                candidates,
            }),
        }
    }
}
