//! Schema descriptors built from entity classes.
//!
//! Relations refer to their target by model name only; the descriptors
//! never own each other, so two entities referencing one another are
//! just two entries in [`SchemaModels`].

mod extract;
mod render;

pub use self::extract::extract;
pub use self::render::{Fragment, SchemaDocument, render_enum, render_model};

use serde::Serialize;

pub use crate::mapping::{RelationKind, ScalarType};

/// Placeholder target for relations whose target cannot be determined.
pub const UNKNOWN_MODEL: &str = "Unknown";

/// One entity class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDescriptor {
    pub name: String,
    pub table_name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl ModelDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The first identity field.
    pub fn identity(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.role == Role::Identity)
    }
}

/// The schema purpose of a field, resolved once from its decorators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Identity,
    Plain,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
    Relation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub scalar: ScalarType,
    pub role: Role,
    pub options: FieldOptions,
    pub relation: Option<RelationDescriptor>,
}

impl FieldDescriptor {
    pub(crate) fn new(name: &str, scalar: ScalarType, role: Role) -> Self {
        Self {
            name: name.to_string(),
            scalar,
            role,
            options: FieldOptions::default(),
            relation: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldOptions {
    pub optional: bool,
    pub unique: bool,
    pub default: Option<DefaultValue>,
    /// Column name when it differs from the field name.
    pub column_name: Option<String>,
}

/// The argument of a rendered `@default(..)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DefaultValue {
    Uuid,
    Autoincrement,
    Now,
    /// Rendered verbatim: `"text"`, `42`, `true`, or an enum member.
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationDescriptor {
    pub kind: RelationKind,
    pub target_model: String,
    pub relation_name: String,
    pub owns_foreign_key: bool,
    /// Name of the synthesized foreign-key field (`authorId`).
    pub foreign_key: Option<String>,
    /// Identity field of the target the foreign key points at.
    pub references: Option<String>,
}

/// An enum referenced by a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDescriptor {
    pub name: String,
    pub values: Vec<String>,
}

/// Models and enums of one file, in first-discovered order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaModels {
    pub models: Vec<ModelDescriptor>,
    pub enums: Vec<EnumDescriptor>,
}

impl SchemaModels {
    pub fn get(&self, name: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }
}
