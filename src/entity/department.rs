//! Department entity - department forest
//!
//! Table: department. `path` is the unique key of a node; `parent_id` and `depth`
//! are derived from it when the node is created.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Separator between segment names in a department path
pub const PATH_SEPARATOR: &str = "/";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "department")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Segment name (e.g. "인사팀")
    #[sea_orm(column_type = "String(Some(128))")]
    pub name: String,

    /// Full path from the root, joined with [`PATH_SEPARATOR`]
    #[sea_orm(column_type = "String(Some(512))", unique)]
    pub path: String,

    /// Zero-based level, root = 0
    pub depth: i32,

    /// Owning ancestor (None only for roots)
    #[sea_orm(nullable)]
    pub parent_id: Option<i64>,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
    #[sea_orm(has_many = "super::asset::Entity")]
    Asset,
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Department tree node (used for API responses)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentTree {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub depth: i32,
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DepartmentTree>,
}

impl From<Model> for DepartmentTree {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            path: model.path,
            depth: model.depth,
            parent_id: model.parent_id,
            children: Vec::new(),
        }
    }
}

impl DepartmentTree {
    /// Assemble the forest from a flat node list.
    ///
    /// Nodes whose parent is missing from the list are treated as roots.
    pub fn build(mut nodes: Vec<Model>) -> Vec<DepartmentTree> {
        // Deepest first, so every child is attached before its parent is moved.
        nodes.sort_by(|a, b| b.depth.cmp(&a.depth).then_with(|| b.path.cmp(&a.path)));

        let ids: std::collections::HashSet<i64> = nodes.iter().map(|n| n.id).collect();
        let mut pending: std::collections::HashMap<i64, Vec<DepartmentTree>> =
            std::collections::HashMap::new();
        let mut roots = Vec::new();

        for node in nodes {
            let parent_id = node.parent_id;
            let mut tree = DepartmentTree::from(node);
            if let Some(mut children) = pending.remove(&tree.id) {
                children.sort_by(|a, b| a.path.cmp(&b.path));
                tree.children = children;
            }
            match parent_id {
                Some(pid) if ids.contains(&pid) => pending.entry(pid).or_default().push(tree),
                _ => roots.push(tree),
            }
        }

        roots.sort_by(|a, b| a.path.cmp(&b.path));
        roots
    }
}
