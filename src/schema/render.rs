//! Descriptor → Prisma schema text.

use serde::Serialize;

use super::*;
use crate::config::SchemaConfig;

/// Referenced field when the target's identity is not known.
const DEFAULT_IDENTITY: &str = "id";

pub fn render_enum(descriptor: &EnumDescriptor) -> String {
    let mut output = format!("enum {} {{\n", descriptor.name);
    for value in &descriptor.values {
        output.push_str(&format!("  {value}\n"));
    }
    output.push_str("}\n");
    output
}

pub fn render_model(model: &ModelDescriptor) -> String {
    let mut output = format!("model {} {{\n", model.name);
    for field in &model.fields {
        output.push_str(&format!("  {}\n", render_field(field)));
    }
    output.push_str(&format!("  @@map(\"{}\")\n", model.table_name));
    output.push_str("}\n");
    output
}

fn render_field(field: &FieldDescriptor) -> String {
    let options = &field.options;
    let optional = if options.optional { "?" } else { "" };
    let mut line = format!("{} {}", field.name, field.scalar);

    match field.role {
        Role::Identity => {
            line.push_str(" @id");
            push_default(&mut line, options);
            push_map(&mut line, options);
        }
        Role::Plain => {
            line.push_str(optional);
            push_default(&mut line, options);
            if options.unique {
                line.push_str(" @unique");
            }
            push_map(&mut line, options);
        }
        Role::CreatedAt => line.push_str(" @default(now())"),
        Role::UpdatedAt => line.push_str(" @updatedAt"),
        Role::DeletedAt => line.push('?'),
        Role::Relation => {
            let Some(relation) = &field.relation else {
                return line;
            };
            if relation.kind.is_list() {
                line.push_str("[]");
            } else {
                line.push_str(optional);
            }
            match &relation.foreign_key {
                Some(fk) => line.push_str(&format!(
                    " @relation(\"{}\", fields: [{fk}], references: [{}])",
                    relation.relation_name,
                    relation.references.as_deref().unwrap_or(DEFAULT_IDENTITY)
                )),
                None => line.push_str(&format!(" @relation(\"{}\")", relation.relation_name)),
            }
        }
    }
    line
}

fn push_default(line: &mut String, options: &FieldOptions) {
    let value = match &options.default {
        None => return,
        Some(DefaultValue::Uuid) => "uuid()",
        Some(DefaultValue::Autoincrement) => "autoincrement()",
        Some(DefaultValue::Now) => "now()",
        Some(DefaultValue::Literal(raw)) => raw.as_str(),
    };
    line.push_str(&format!(" @default({value})"));
}

fn push_map(line: &mut String, options: &FieldOptions) {
    if let Some(column) = &options.column_name {
        line.push_str(&format!(" @map(\"{column}\")"));
    }
}

/// A rendered block and the name it was rendered for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub name: String,
    pub text: String,
}

/// Preamble, enum blocks, then model blocks, each in the order they
/// were discovered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaDocument {
    provider: String,
    url_env: String,
    pub enums: Vec<Fragment>,
    pub models: Vec<Fragment>,
}

impl SchemaDocument {
    pub fn new(config: &SchemaConfig) -> Self {
        Self {
            provider: config.provider.clone(),
            url_env: config.url_env.clone(),
            enums: Vec::new(),
            models: Vec::new(),
        }
    }

    /// Render every enum and model of one file.
    pub fn from_models(models: &SchemaModels, config: &SchemaConfig) -> Self {
        let mut document = Self::new(config);
        for descriptor in &models.enums {
            document.enums.push(Fragment {
                name: descriptor.name.clone(),
                text: render_enum(descriptor),
            });
        }
        for model in &models.models {
            document.models.push(Fragment {
                name: model.name.clone(),
                text: render_model(model),
            });
        }
        document
    }

    pub fn is_empty(&self) -> bool {
        self.enums.is_empty() && self.models.is_empty()
    }

    /// Append another document's fragments as they are.
    pub fn extend(&mut self, other: SchemaDocument) {
        self.enums.extend(other.enums);
        self.models.extend(other.models);
    }

    /// Append another document's fragments, skipping names already
    /// present. Used when combining the documents of many files.
    pub fn merge(&mut self, other: SchemaDocument) {
        for fragment in other.enums {
            if !self.enums.iter().any(|f| f.name == fragment.name) {
                self.enums.push(fragment);
            }
        }
        for fragment in other.models {
            if !self.models.iter().any(|f| f.name == fragment.name) {
                self.models.push(fragment);
            }
        }
    }

    fn preamble(&self) -> String {
        let mut output = String::new();
        output.push_str("// Generated by ormlift from TypeORM entities.\n");
        output.push_str("// Review relations and defaults before running `prisma migrate`.\n\n");
        output.push_str("generator client {\n");
        output.push_str("  provider = \"prisma-client-js\"\n");
        output.push_str("}\n\n");
        output.push_str("datasource db {\n");
        output.push_str(&format!("  provider = \"{}\"\n", self.provider));
        output.push_str(&format!("  url      = env(\"{}\")\n", self.url_env));
        output.push_str("}\n");
        output
    }

    pub fn render(&self) -> String {
        let mut output = self.preamble();
        for fragment in self.enums.iter().chain(&self.models) {
            output.push('\n');
            output.push_str(&fragment.text);
        }
        output
    }
}
