/* Path flattening - enumerate every form-addressable field of a message */

use form_types::{FieldSchema, MessageSchema};
use serde::Serialize;

/* One bindable dotted path */
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPath {
    /* Field names from the root field to the terminal field, joined by '.' */
    pub dotted_name: String,
    /* Top-level field this path descends from */
    pub root_field: FieldSchema,
    /* Field at the end of the path */
    pub terminal_field: FieldSchema,
}

/* Serializable view of a path for listings */
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PathSummary {
    pub path: String,
    pub kind: String,
    pub repeated: bool,
    pub optional: bool,
}

impl QueryPath {
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.dotted_name.split('.')
    }

    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    pub fn summary(&self) -> PathSummary {
        PathSummary {
            path: self.dotted_name.clone(),
            kind: self.terminal_field.kind.to_string(),
            repeated: self.terminal_field.repeated,
            optional: self.terminal_field.optional,
        }
    }
}

/// Flatten a message schema into its ordered path table.
///
/// Traversal is depth-first in field declaration order. Every dynamic-value
/// field and every scalar field that is not a map, extension or weak field
/// yields one path. A singular message field yields a path for itself
/// followed by the paths of its sub-schema; repeated, map, extension and
/// weak message fields yield nothing.
pub fn flatten(schema: &MessageSchema) -> Vec<QueryPath> {
    let mut paths = Vec::new();
    for field in &schema.fields {
        collect_paths(field, field, None, &mut paths);
    }
    paths
}

fn collect_paths(
    root: &FieldSchema,
    field: &FieldSchema,
    prefix: Option<&str>,
    paths: &mut Vec<QueryPath>,
) {
    if !field.is_addressable() {
        return;
    }
    let dotted_name = match prefix {
        Some(prefix) => format!("{prefix}.{}", field.name),
        None => field.name.clone(),
    };
    paths.push(QueryPath {
        dotted_name: dotted_name.clone(),
        root_field: root.clone(),
        terminal_field: field.clone(),
    });

    /* Only singular messages have addressable children */
    if let Some(sub_schema) = field.message_schema() {
        for child in &sub_schema.fields {
            collect_paths(root, child, Some(&dotted_name), paths);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_types::{FieldKind, MessageRef};
    use std::sync::Arc;

    fn names(paths: &[QueryPath]) -> Vec<&str> {
        paths.iter().map(|p| p.dotted_name.as_str()).collect()
    }

    fn geo() -> Arc<MessageSchema> {
        Arc::new(MessageSchema::new(
            "demo.Geo",
            vec![
                FieldSchema::scalar("lat", FieldKind::Float64),
                FieldSchema::scalar("lng", FieldKind::Float64),
            ],
        ))
    }

    fn address() -> Arc<MessageSchema> {
        Arc::new(MessageSchema::new(
            "demo.Address",
            vec![
                FieldSchema::scalar("city", FieldKind::String),
                FieldSchema::message("geo", geo()),
                FieldSchema::dynamic("meta"),
            ],
        ))
    }

    #[test]
    fn nested_messages_expand_depth_first() {
        let schema = MessageSchema::new(
            "demo.User",
            vec![
                FieldSchema::scalar("id", FieldKind::Int64),
                FieldSchema::message("addr", address()),
                FieldSchema::scalar("tags", FieldKind::String).repeated(),
            ],
        );
        let paths = flatten(&schema);
        assert_eq!(
            names(&paths),
            vec![
                "id",
                "addr",
                "addr.city",
                "addr.geo",
                "addr.geo.lat",
                "addr.geo.lng",
                "addr.meta",
                "tags",
            ]
        );
        let lat = &paths[4];
        assert_eq!(lat.root_field.name, "addr");
        assert_eq!(lat.terminal_field.name, "lat");
        assert_eq!(lat.depth(), 3);
    }

    #[test]
    fn ambiguous_containers_are_dead_ends() {
        let schema = MessageSchema::new(
            "demo.Containers",
            vec![
                FieldSchema::message("list", address()).repeated(),
                FieldSchema::message("by_name", address()).map(),
                FieldSchema::message("ext", address()).extension(),
                FieldSchema::message("legacy", address()).weak(),
                FieldSchema::scalar("note", FieldKind::String).extension(),
                FieldSchema::scalar("labels", FieldKind::String).map(),
                FieldSchema::scalar("old", FieldKind::Int32).weak(),
                FieldSchema::scalar("kept", FieldKind::Int32),
            ],
        );
        assert_eq!(names(&flatten(&schema)), vec!["kept"]);
    }

    #[test]
    fn self_referencing_containers_terminate() {
        let children = MessageRef::pending();
        let tree = MessageSchema::new(
            "demo.Tree",
            vec![
                FieldSchema::scalar("name", FieldKind::String),
                FieldSchema::message("children", children.clone()).repeated(),
            ],
        )
        .into_shared();
        assert!(children.fill(tree.clone()));

        let root = MessageSchema::new("demo.Forest", vec![FieldSchema::message("tree", tree)]);
        assert_eq!(names(&flatten(&root)), vec!["tree", "tree.name"]);
    }

    #[test]
    fn dynamic_values_are_terminal_regardless_of_flags() {
        let schema = MessageSchema::new(
            "demo.Dyn",
            vec![
                FieldSchema::dynamic("v"),
                FieldSchema::dynamic("vs").repeated(),
                FieldSchema::dynamic("m").map(),
            ],
        );
        let paths = flatten(&schema);
        assert_eq!(names(&paths), vec!["v", "vs", "m"]);
        assert!(paths
            .iter()
            .all(|p| p.terminal_field.kind == FieldKind::DynamicValue));
    }

    #[test]
    fn shared_sub_schema_yields_independent_paths() {
        let shared = geo();
        let schema = MessageSchema::new(
            "demo.Route",
            vec![
                FieldSchema::message("from", shared.clone()),
                FieldSchema::message("to", shared),
            ],
        );
        let paths = flatten(&schema);
        assert_eq!(
            names(&paths),
            vec!["from", "from.lat", "from.lng", "to", "to.lat", "to.lng"]
        );
        assert_eq!(paths[1].root_field.name, "from");
        assert_eq!(paths[4].root_field.name, "to");
    }

    #[test]
    fn flattening_is_deterministic() {
        let build = || {
            MessageSchema::new(
                "demo.User",
                vec![
                    FieldSchema::message("addr", address()),
                    FieldSchema::scalar("id", FieldKind::UInt32),
                ],
            )
        };
        assert_eq!(flatten(&build()), flatten(&build()));
    }

    #[test]
    fn summary_reports_terminal_flags() {
        let schema = MessageSchema::new(
            "demo.Flags",
            vec![FieldSchema::scalar("n", FieldKind::UInt32).optional()],
        );
        let summary = flatten(&schema)[0].summary();
        assert_eq!(summary.path, "n");
        assert_eq!(summary.kind, "uint32");
        assert!(summary.optional);
        assert!(!summary.repeated);
    }
}
