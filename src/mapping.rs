//! Static lookup tables: column type names to schema scalars, and
//! decorator names to the schema role they encode.

use std::fmt;

use serde::Serialize;
use swc_ecma_ast::{TsEntityName, TsKeywordTypeKind, TsType, TsTypeRef};

use crate::ast::non_null;

/// A scalar type in the generated schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ScalarType {
    String,
    Int,
    BigInt,
    Float,
    Decimal,
    Boolean,
    DateTime,
    Json,
    Bytes,
    /// A declared enum, rendered by name.
    Enum(String),
    /// The target of a relation field.
    Model(String),
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::Int => "Int",
            Self::BigInt => "BigInt",
            Self::Float => "Float",
            Self::Decimal => "Decimal",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Json => "Json",
            Self::Bytes => "Bytes",
            Self::Enum(name) | Self::Model(name) => name,
        };
        f.write_str(name)
    }
}

/// Map a column type name (`'varchar'`, `'int'`, ...) to a scalar.
/// Lookup is case-insensitive; unknown names map to `String`.
pub fn scalar_for(type_name: &str) -> ScalarType {
    match type_name.trim().to_ascii_lowercase().as_str() {
        "varchar" | "text" | "char" | "character varying" | "uuid" | "string" | "nvarchar"
        | "citext" => ScalarType::String,
        "int" | "integer" | "int4" | "smallint" | "int2" | "tinyint" | "mediumint" | "number" => {
            ScalarType::Int
        }
        "bigint" | "int8" => ScalarType::BigInt,
        "float" | "double" | "double precision" | "real" | "float4" | "float8" => {
            ScalarType::Float
        }
        "decimal" | "numeric" | "money" => ScalarType::Decimal,
        "boolean" | "bool" => ScalarType::Boolean,
        "date" | "datetime" | "timestamp" | "timestamptz" | "timestamp with time zone" | "time" => {
            ScalarType::DateTime
        }
        "json" | "jsonb" | "simple-json" => ScalarType::Json,
        "bytea" | "blob" | "buffer" | "binary" => ScalarType::Bytes,
        _ => ScalarType::String,
    }
}

/// Infer a scalar from a property's own type annotation. `is_enum` tells
/// whether a referenced name is an enum declared in the same file.
pub fn scalar_for_annotation(ty: &TsType, is_enum: impl Fn(&str) -> bool) -> ScalarType {
    match non_null(ty) {
        TsType::TsKeywordType(keyword) => match keyword.kind {
            TsKeywordTypeKind::TsNumberKeyword => ScalarType::Int,
            TsKeywordTypeKind::TsBooleanKeyword => ScalarType::Boolean,
            TsKeywordTypeKind::TsBigIntKeyword => ScalarType::BigInt,
            TsKeywordTypeKind::TsObjectKeyword => ScalarType::Json,
            _ => ScalarType::String,
        },
        TsType::TsTypeRef(TsTypeRef {
            type_name: TsEntityName::Ident(ident),
            ..
        }) => match &*ident.sym {
            "Date" => ScalarType::DateTime,
            "Buffer" => ScalarType::Bytes,
            "Record" => ScalarType::Json,
            other if is_enum(other) => ScalarType::Enum(other.to_string()),
            other => scalar_for(other),
        },
        TsType::TsArrayType(_) | TsType::TsTypeLit(_) | TsType::TsTupleType(_) => ScalarType::Json,
        _ => ScalarType::String,
    }
}

/// The four relation decorators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RelationKind {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

impl RelationKind {
    /// Only the many-to-one side stores the foreign key.
    pub fn owns_foreign_key(self) -> bool {
        matches!(self, Self::ManyToOne)
    }

    /// Whether the field holds a list of targets.
    pub fn is_list(self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }
}

/// What a decorator means for the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoratorRole {
    /// Marks a class as schema-backed.
    Entity,
    Identity { generated: bool },
    Plain,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
    Relation(RelationKind),
    /// `JoinColumn`/`JoinTable`: recognised, contributes nothing.
    Join,
}

pub fn decorator_role(name: &str) -> Option<DecoratorRole> {
    Some(match name {
        "Entity" => DecoratorRole::Entity,
        "PrimaryGeneratedColumn" => DecoratorRole::Identity { generated: true },
        "PrimaryColumn" => DecoratorRole::Identity { generated: false },
        "Column" => DecoratorRole::Plain,
        "CreateDateColumn" => DecoratorRole::CreatedAt,
        "UpdateDateColumn" => DecoratorRole::UpdatedAt,
        "DeleteDateColumn" => DecoratorRole::DeletedAt,
        "OneToOne" => DecoratorRole::Relation(RelationKind::OneToOne),
        "ManyToOne" => DecoratorRole::Relation(RelationKind::ManyToOne),
        "OneToMany" => DecoratorRole::Relation(RelationKind::OneToMany),
        "ManyToMany" => DecoratorRole::Relation(RelationKind::ManyToMany),
        "JoinColumn" | "JoinTable" => DecoratorRole::Join,
        _ => return None,
    })
}

/// Decorator symbols that become dead imports once the schema file is the
/// source of truth.
pub fn is_schema_decorator(name: &str) -> bool {
    decorator_role(name).is_some()
        || matches!(
            name,
            "Index" | "Unique" | "Check" | "Generated" | "VersionColumn" | "RelationId"
        )
}
