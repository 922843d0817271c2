use crate::errors::{SchemaError, SchemaResult};
use form_types::MessageDef;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

/* On-disk encoding of a schema file, chosen by extension */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Yaml,
    Json,
}

impl SchemaFormat {
    /* `.json` files are JSON; everything else is read as YAML */
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SchemaFormat::Json,
            _ => SchemaFormat::Yaml,
        }
    }
}

/* Complete schema file: package, path imports and message definitions */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct SchemaFile {
    /* Package prefix for every message in this file (e.g., "demo.users") */
    #[serde(default)]
    pub package: String,

    #[serde(default)]
    pub description: Option<String>,

    /* Other schema files, relative to this one or to an include directory */
    #[serde(default)]
    pub imports: Vec<String>,

    #[serde(default)]
    pub messages: Vec<MessageDef>,
}

impl SchemaFile {
    /* Read and parse a schema file */
    pub fn load(path: &Path) -> SchemaResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match SchemaFormat::from_path(path) {
            SchemaFormat::Yaml => {
                serde_yml::from_str(&contents).map_err(|source| SchemaError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })
            }
            SchemaFormat::Json => {
                serde_json::from_str(&contents).map_err(|source| SchemaError::Json {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    /* Fully-qualified name of a message declared in this file */
    pub fn full_name(&self, message: &str) -> String {
        qualify(&self.package, message)
    }
}

pub(crate) fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}
