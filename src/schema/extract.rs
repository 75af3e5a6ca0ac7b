//! Entity classes → [`ModelDescriptor`]s.
//!
//! Every class in the file is considered, at any depth: inside functions,
//! namespaces, blocks and class expressions alike.

use swc_ecma_ast::{
    Class, ClassDecl, ClassExpr, ClassProp, Decorator, Expr, Lit, MemberExpr, MemberProp, TsEnumDecl,
    TsEnumMemberId, TsType, UnaryOp,
};
use swc_ecma_visit::{Visit, VisitWith};
use tracing::{debug, warn};

use super::*;
use crate::ast::{
    arrow_result, bool_value, class_start, decorator_args, decorator_name, element_type, generic_arg,
    ident_name, is_nullable, object, option, plain_args, prop_type, properties, str_value, type_name,
    unparen,
};
use crate::edit::EditSet;
use crate::mapping::{DecoratorRole, decorator_role, scalar_for, scalar_for_annotation};
use crate::parser::ParsedSource;
use crate::rewrite::advisory;

/// An enum declared somewhere in the file.
#[derive(Debug, Clone)]
struct DeclaredEnum {
    name: String,
    /// Member names and their string initializers.
    members: Vec<(String, Option<String>)>,
}

/// A foreign key to fix up once every model of the file is known.
struct ForeignKey {
    model: usize,
    field: String,
    target: String,
    /// Whether the key field was synthesized rather than declared.
    synthesized: bool,
}

/// Build a descriptor for every entity class and mark each class with a
/// reference-only advisory. Nothing else in the file is touched.
pub fn extract(source: &ParsedSource, edits: &mut EditSet) -> SchemaModels {
    let mut enums = EnumCollector::default();
    source.module.visit_with(&mut enums);

    let mut finder = EntityFinder {
        source,
        edits,
        declared: &enums.declared,
        schema: SchemaModels::default(),
        referenced_enums: Vec::new(),
        foreign_keys: Vec::new(),
    };
    source.module.visit_with(&mut finder);
    let EntityFinder {
        mut schema,
        referenced_enums,
        foreign_keys,
        ..
    } = finder;

    // Foreign keys take the type and name of the target's identity, which
    // may be declared further down the file.
    for fk in foreign_keys {
        let identity = schema.get(&fk.target).and_then(ModelDescriptor::identity);
        let scalar = identity.map_or(ScalarType::String, |id| id.scalar.clone());
        let references = identity.map(|id| id.name.clone());
        let model = &mut schema.models[fk.model];
        for field in &mut model.fields {
            if fk.synthesized && field.name == fk.field {
                field.scalar = scalar.clone();
            }
            if let Some(relation) = &mut field.relation
                && relation.foreign_key.as_deref() == Some(fk.field.as_str())
            {
                relation.references = references.clone();
            }
        }
    }

    for name in referenced_enums {
        match enums.declared.iter().find(|d| d.name == name) {
            Some(decl) => schema.enums.push(EnumDescriptor {
                name,
                values: decl.members.iter().map(|(member, _)| member.clone()).collect(),
            }),
            None => warn!(%name, "enum is not declared in this file; no enum block rendered"),
        }
    }

    schema
}

#[derive(Default)]
struct EnumCollector {
    declared: Vec<DeclaredEnum>,
}

impl Visit for EnumCollector {
    fn visit_ts_enum_decl(&mut self, decl: &TsEnumDecl) {
        let members = decl
            .members
            .iter()
            .map(|member| {
                let name = match &member.id {
                    TsEnumMemberId::Ident(ident) => ident.sym.to_string(),
                    TsEnumMemberId::Str(lit) => lit.value.to_string(),
                };
                let init = member.init.as_deref().and_then(str_value).map(str::to_string);
                (name, init)
            })
            .collect();
        self.declared.push(DeclaredEnum {
            name: decl.id.sym.to_string(),
            members,
        });
    }
}

struct EntityFinder<'a> {
    source: &'a ParsedSource,
    edits: &'a mut EditSet,
    declared: &'a [DeclaredEnum],
    schema: SchemaModels,
    referenced_enums: Vec<String>,
    foreign_keys: Vec<ForeignKey>,
}

impl EntityFinder<'_> {
    fn class(&mut self, name: &str, class: &Class) {
        let Some(entity) = class
            .decorators
            .iter()
            .find(|d| decorator_name(d).and_then(decorator_role) == Some(DecoratorRole::Entity))
        else {
            return;
        };

        let mut extractor = ClassExtractor {
            name,
            class,
            source: self.source,
            declared: self.declared,
            referenced_enums: &mut self.referenced_enums,
            foreign_keys: Vec::new(),
        };
        let model = extractor.model(entity);
        let index = self.schema.models.len();
        self.foreign_keys.extend(extractor.foreign_keys.into_iter().map(|(field, target, synthesized)| {
            ForeignKey {
                model: index,
                field,
                target,
                synthesized,
            }
        }));
        debug!(model = %model.name, table = %model.table_name, fields = model.fields.len(), "extracted model");
        self.schema.models.push(model);

        let at = self.source.offset(class_start(class));
        advisory::annotate(self.source, self.edits, at, &advisory::entity());
    }
}

impl Visit for EntityFinder<'_> {
    fn visit_class_decl(&mut self, decl: &ClassDecl) {
        self.class(&decl.ident.sym, &decl.class);
        decl.visit_children_with(self);
    }

    fn visit_class_expr(&mut self, expr: &ClassExpr) {
        match &expr.ident {
            Some(ident) => self.class(&ident.sym, &expr.class),
            None => debug!("anonymous class expression skipped"),
        }
        expr.visit_children_with(self);
    }
}

struct ClassExtractor<'a> {
    name: &'a str,
    class: &'a Class,
    source: &'a ParsedSource,
    declared: &'a [DeclaredEnum],
    referenced_enums: &'a mut Vec<String>,
    /// Foreign-key fields, their relation targets, and whether each was
    /// synthesized.
    foreign_keys: Vec<(String, String, bool)>,
}

impl ClassExtractor<'_> {
    fn model(&mut self, entity: &Decorator) -> ModelDescriptor {
        let explicit = decorator_args(entity).first().and_then(|arg| {
            str_value(&arg.expr).or_else(|| option(&arg.expr, "name").and_then(str_value))
        });
        let table_name = explicit.map_or_else(|| self.name.to_lowercase(), str::to_string);

        let mut fields = Vec::new();
        for (name, prop) in properties(self.class) {
            fields.extend(self.fields(name, prop));
        }
        ModelDescriptor {
            name: self.name.to_string(),
            table_name,
            fields,
        }
    }

    /// Descriptors for one property: none when it carries no schema
    /// decorator, two for a many-to-one relation.
    fn fields(&mut self, name: &str, prop: &ClassProp) -> Vec<FieldDescriptor> {
        // First role-bearing decorator wins.
        let Some((decorator, role)) = prop.decorators.iter().find_map(|d| {
            match decorator_role(decorator_name(d)?)? {
                DecoratorRole::Entity | DecoratorRole::Join => None,
                role => Some((d, role)),
            }
        }) else {
            return Vec::new();
        };

        match role {
            DecoratorRole::Identity { generated: true } => {
                let uuid = decorator_args(decorator)
                    .first()
                    .and_then(|arg| str_value(&arg.expr))
                    == Some("uuid");
                let mut field = if uuid {
                    let mut f = FieldDescriptor::new(name, ScalarType::String, Role::Identity);
                    f.options.default = Some(DefaultValue::Uuid);
                    f
                } else {
                    let mut f = FieldDescriptor::new(name, ScalarType::Int, Role::Identity);
                    f.options.default = Some(DefaultValue::Autoincrement);
                    f
                };
                field.options.column_name = column_name(decorator);
                vec![field]
            }
            DecoratorRole::Identity { generated: false } => {
                let mut field = self.column(name, prop, decorator);
                field.role = Role::Identity;
                field.options.optional = false;
                vec![field]
            }
            DecoratorRole::Plain => vec![self.column(name, prop, decorator)],
            DecoratorRole::CreatedAt => {
                let mut field = FieldDescriptor::new(name, ScalarType::DateTime, Role::CreatedAt);
                field.options.default = Some(DefaultValue::Now);
                vec![field]
            }
            DecoratorRole::UpdatedAt => {
                vec![FieldDescriptor::new(name, ScalarType::DateTime, Role::UpdatedAt)]
            }
            DecoratorRole::DeletedAt => {
                let mut field = FieldDescriptor::new(name, ScalarType::DateTime, Role::DeletedAt);
                field.options.optional = true;
                vec![field]
            }
            DecoratorRole::Relation(kind) => self.relation(name, prop, decorator, kind),
            DecoratorRole::Entity | DecoratorRole::Join => Vec::new(),
        }
    }

    /// `@Column(...)` in any of its argument shapes.
    fn column(&mut self, name: &str, prop: &ClassProp, decorator: &Decorator) -> FieldDescriptor {
        let args = plain_args(decorator_args(decorator)).unwrap_or_default();
        let (type_name, options) = match args.first().copied() {
            Some(first) if str_value(first).is_some() => (str_value(first), args.get(1).copied()),
            Some(first) if object(first).is_some() => (None, Some(first)),
            _ => (None, None),
        };
        let opt = |key: &str| options.and_then(|o| option(o, key));
        let type_name = type_name.or_else(|| opt("type").and_then(str_value));
        let enum_ref = opt("enum").and_then(ident_name).map(str::to_string);

        let scalar = match (type_name, enum_ref) {
            (Some("enum") | Some("simple-enum") | None, Some(name)) => ScalarType::Enum(name),
            (Some(name), _) if name != "enum" && name != "simple-enum" => scalar_for(name),
            _ => self.from_annotation(prop_type(prop)),
        };
        if let ScalarType::Enum(name) = &scalar
            && !self.referenced_enums.contains(name)
        {
            self.referenced_enums.push(name.clone());
        }

        let mut field = FieldDescriptor::new(name, scalar, Role::Plain);
        field.options.optional = opt("nullable")
            .and_then(bool_value)
            .unwrap_or_else(|| declared_optional(prop));
        field.options.unique = opt("unique").and_then(bool_value) == Some(true);
        field.options.default = opt("default").and_then(|d| self.default_value(d, &field.scalar));
        field.options.column_name = opt("name").and_then(str_value).map(str::to_string);
        field
    }

    fn from_annotation(&self, ty: Option<&TsType>) -> ScalarType {
        match ty {
            Some(ty) => scalar_for_annotation(ty, |name| self.declared.iter().any(|d| d.name == name)),
            None => ScalarType::String,
        }
    }

    fn default_value(&self, expr: &Expr, scalar: &ScalarType) -> Option<DefaultValue> {
        let expr = unparen(expr);
        if let Some(value) = str_value(expr) {
            if is_current_timestamp(value) {
                return Some(DefaultValue::Now);
            }
            if let ScalarType::Enum(name) = scalar
                && let Some(member) = self.enum_member(name, value)
            {
                return Some(DefaultValue::Literal(member));
            }
            let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
            return Some(DefaultValue::Literal(format!("\"{escaped}\"")));
        }
        match expr {
            Expr::Lit(Lit::Num(num)) => Some(DefaultValue::Literal(self.source.slice(num.span).to_string())),
            Expr::Lit(Lit::Bool(b)) => Some(DefaultValue::Literal(b.value.to_string())),
            Expr::Unary(unary) if unary.op == UnaryOp::Minus => match unparen(&unary.arg) {
                Expr::Lit(Lit::Num(num)) => {
                    Some(DefaultValue::Literal(format!("-{}", self.source.slice(num.span))))
                }
                _ => None,
            },
            // `Role.USER`
            Expr::Member(MemberExpr {
                prop: MemberProp::Ident(member),
                ..
            }) => Some(DefaultValue::Literal(member.sym.to_string())),
            // `() => 'CURRENT_TIMESTAMP'`
            _ => arrow_result(expr)
                .and_then(str_value)
                .filter(|value| is_current_timestamp(value))
                .map(|_| DefaultValue::Now),
        }
    }

    /// Member of a declared enum by name or by initializer value.
    fn enum_member(&self, enum_name: &str, value: &str) -> Option<String> {
        let decl = self.declared.iter().find(|d| d.name == enum_name)?;
        decl.members
            .iter()
            .find(|(name, init)| name == value || init.as_deref() == Some(value))
            .map(|(name, _)| name.clone())
    }

    fn relation(
        &mut self,
        name: &str,
        prop: &ClassProp,
        decorator: &Decorator,
        kind: RelationKind,
    ) -> Vec<FieldDescriptor> {
        let target = relation_target(decorator, prop_type(prop)).unwrap_or_else(|| {
            warn!(class = %self.name, field = %name, "relation target unresolved");
            UNKNOWN_MODEL.to_string()
        });
        let relation_name = match kind {
            RelationKind::OneToOne | RelationKind::ManyToMany => format!("{}To{}", self.name, target),
            RelationKind::ManyToOne | RelationKind::OneToMany => format!("{name}Relation"),
        };
        let nullable = decorator_args(decorator)
            .iter()
            .find_map(|arg| option(&arg.expr, "nullable").and_then(bool_value))
            .unwrap_or_else(|| declared_optional(prop));

        let foreign_key = kind.owns_foreign_key().then(|| format!("{name}Id"));
        let mut field = FieldDescriptor::new(name, ScalarType::Model(target.clone()), Role::Relation);
        field.options.optional = match kind {
            RelationKind::OneToOne => true,
            RelationKind::ManyToOne => nullable,
            RelationKind::OneToMany | RelationKind::ManyToMany => false,
        };
        field.relation = Some(RelationDescriptor {
            kind,
            target_model: target.clone(),
            relation_name,
            owns_foreign_key: kind.owns_foreign_key(),
            foreign_key: foreign_key.clone(),
            references: None,
        });

        let mut fields = vec![field];
        if let Some(fk) = foreign_key {
            // An explicitly declared `authorId` column keeps its own field.
            let declared = properties(self.class).any(|(prop_name, _)| prop_name == fk);
            if !declared {
                let mut fk_field = FieldDescriptor::new(&fk, ScalarType::String, Role::Plain);
                fk_field.options.optional = nullable;
                fk_field.options.column_name = prop
                    .decorators
                    .iter()
                    .find(|d| decorator_name(d) == Some("JoinColumn"))
                    .and_then(column_name);
                fields.push(fk_field);
            }
            self.foreign_keys.push((fk, target, !declared));
        }
        fields
    }
}

/// `name` option of a column-like decorator's options object.
fn column_name(decorator: &Decorator) -> Option<String> {
    decorator_args(decorator)
        .iter()
        .find_map(|arg| option(&arg.expr, "name"))
        .and_then(str_value)
        .map(str::to_string)
}

fn declared_optional(prop: &ClassProp) -> bool {
    prop.is_optional || prop_type(prop).is_some_and(is_nullable)
}

fn is_current_timestamp(value: &str) -> bool {
    let value = value.to_ascii_lowercase();
    value == "current_timestamp" || value == "now()" || value == "current_timestamp()"
}

/// Target of a relation decorator: `() => User`, `'User'`, or the
/// property's own type (`User`, `User[]`, `Promise<User>`).
fn relation_target(decorator: &Decorator, ty: Option<&TsType>) -> Option<String> {
    if let Some(first) = decorator_args(decorator).first() {
        if let Some(name) = arrow_result(&first.expr).and_then(ident_name) {
            return Some(name.to_string());
        }
        if let Some(name) = str_value(&first.expr) {
            return Some(name.to_string());
        }
    }
    let ty = ty?;
    let ty = generic_arg(ty, "Promise").unwrap_or(ty);
    let ty = element_type(ty).unwrap_or(ty);
    type_name(ty).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::parser::parse;

    /// Extracted models and the annotated source.
    fn extract_from(source: &str) -> (String, SchemaModels) {
        let parsed = parse(source).unwrap();
        let mut edits = EditSet::new();
        let schema = extract(&parsed, &mut edits);
        (parsed.render(&edits), schema)
    }

    #[test]
    fn test_uuid_identity_and_plain_field() {
        let (_, schema) = extract_from(
            r#"
@Entity()
export class User {
  @PrimaryGeneratedColumn('uuid')
  id: string;

  @Column()
  name: string;
}
"#,
        );
        let user = schema.get("User").unwrap();
        assert_eq!(user.table_name, "user");
        let id = user.field("id").unwrap();
        assert_eq!(id.role, Role::Identity);
        assert_eq!(id.scalar, ScalarType::String);
        assert_eq!(id.options.default, Some(DefaultValue::Uuid));
        let name = user.field("name").unwrap();
        assert_eq!(name.role, Role::Plain);
        assert_eq!(name.scalar, ScalarType::String);
        assert!(!name.options.optional);
    }

    #[test]
    fn test_column_options() {
        let (_, schema) = extract_from(
            r#"
@Entity({ name: 'accounts' })
class Account {
  @PrimaryGeneratedColumn()
  id: number;

  @Column({ type: 'varchar', nullable: true, unique: true, name: 'display_name' })
  displayName: string;

  @Column('int', { default: 0 })
  balance: number;

  @Column({ default: () => 'CURRENT_TIMESTAMP' })
  openedAt: Date;

  @Column({ default: 'it\'s' })
  motto: string;

  @Column()
  active?: boolean;

  notMapped: string;
}
"#,
        );
        let account = schema.get("Account").unwrap();
        assert_eq!(account.table_name, "accounts");
        assert_eq!(account.fields.len(), 6);
        assert_eq!(account.field("id").unwrap().scalar, ScalarType::Int);
        assert_eq!(
            account.field("id").unwrap().options.default,
            Some(DefaultValue::Autoincrement)
        );

        let display = &account.field("displayName").unwrap().options;
        assert!(display.optional);
        assert!(display.unique);
        assert_eq!(display.column_name.as_deref(), Some("display_name"));

        let balance = account.field("balance").unwrap();
        assert_eq!(balance.scalar, ScalarType::Int);
        assert_eq!(balance.options.default, Some(DefaultValue::Literal("0".into())));

        let opened = account.field("openedAt").unwrap();
        assert_eq!(opened.scalar, ScalarType::DateTime);
        assert_eq!(opened.options.default, Some(DefaultValue::Now));

        assert_eq!(
            account.field("motto").unwrap().options.default,
            Some(DefaultValue::Literal("\"it's\"".into()))
        );
        let active = account.field("active").unwrap();
        assert_eq!(active.scalar, ScalarType::Boolean);
        assert!(active.options.optional);
        assert!(account.field("notMapped").is_none());
    }

    #[test]
    fn test_timestamps() {
        let (_, schema) = extract_from(
            r#"
@Entity()
class Post {
  @CreateDateColumn() createdAt: Date;
  @UpdateDateColumn() updatedAt: Date;
  @DeleteDateColumn() deletedAt: Date;
}
"#,
        );
        let post = schema.get("Post").unwrap();
        let roles: Vec<Role> = post.fields.iter().map(|f| f.role).collect();
        assert_eq!(roles, vec![Role::CreatedAt, Role::UpdatedAt, Role::DeletedAt]);
        assert_eq!(post.fields[0].options.default, Some(DefaultValue::Now));
        assert!(post.fields[2].options.optional);
    }

    #[test]
    fn test_relation_naming_one_to_one() {
        let (_, schema) = extract_from(
            r#"
@Entity()
class User {
  @OneToOne(() => Profile)
  @JoinColumn()
  profile: Profile;
}
"#,
        );
        let relation = schema.get("User").unwrap().fields[0].relation.clone().unwrap();
        assert_eq!(relation.kind, RelationKind::OneToOne);
        assert_eq!(relation.relation_name, "UserToProfile");
        assert!(!relation.owns_foreign_key);
    }

    #[test]
    fn test_relation_naming_one_to_many() {
        let (_, schema) = extract_from(
            r#"
@Entity()
class User {
  @OneToMany(() => Post, (post) => post.author)
  posts: Post[];
}
"#,
        );
        let relation = schema.get("User").unwrap().fields[0].relation.clone().unwrap();
        assert_eq!(relation.target_model, "Post");
        assert_eq!(relation.relation_name, "postsRelation");
    }

    #[test]
    fn test_many_to_one_synthesizes_foreign_key() {
        let (_, schema) = extract_from(
            r#"
@Entity()
class Post {
  @ManyToOne(() => User, (user) => user.posts, { nullable: true })
  @JoinColumn({ name: 'author_id' })
  author: User;
}

@Entity()
class User {
  @PrimaryGeneratedColumn()
  id: number;
}
"#,
        );
        let post = schema.get("Post").unwrap();
        assert_eq!(post.fields.len(), 2);
        let author = &post.fields[0];
        assert!(author.options.optional);
        let relation = author.relation.as_ref().unwrap();
        assert_eq!(relation.relation_name, "authorRelation");
        assert!(relation.owns_foreign_key);
        assert_eq!(relation.foreign_key.as_deref(), Some("authorId"));

        let fk = &post.fields[1];
        assert_eq!(fk.name, "authorId");
        assert_eq!(fk.scalar, ScalarType::Int);
        assert!(fk.options.optional);
        assert_eq!(fk.options.column_name.as_deref(), Some("author_id"));
    }

    #[test]
    fn test_declared_foreign_key_is_not_duplicated() {
        let (_, schema) = extract_from(
            r#"
@Entity()
class Post {
  @ManyToOne(() => User)
  author: User;

  @Column()
  authorId: number;
}
"#,
        );
        let names: Vec<&str> = schema.get("Post").unwrap().fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["author", "authorId"]);
    }

    #[test]
    fn test_relation_target_from_type_or_unknown() {
        let (_, schema) = extract_from(
            r#"
@Entity()
class User {
  @ManyToMany(undefined)
  tags: Tag[];

  @OneToOne()
  mystery;
}
"#,
        );
        let user = schema.get("User").unwrap();
        let tags = user.field("tags").unwrap().relation.as_ref().unwrap();
        assert_eq!(tags.target_model, "Tag");
        assert_eq!(tags.relation_name, "UserToTag");
        let mystery = user.field("mystery").unwrap().relation.as_ref().unwrap();
        assert_eq!(mystery.target_model, UNKNOWN_MODEL);
    }

    #[test]
    fn test_enum_columns() {
        let (_, schema) = extract_from(
            r#"
export enum Role {
  ADMIN = 'admin',
  USER = 'user',
}

@Entity()
class User {
  @Column({ type: 'enum', enum: Role, default: Role.USER })
  role: Role;

  @Column({ default: 'admin' })
  fallback: Role;
}
"#,
        );
        let user = schema.get("User").unwrap();
        let role = user.field("role").unwrap();
        assert_eq!(role.scalar, ScalarType::Enum("Role".into()));
        assert_eq!(role.options.default, Some(DefaultValue::Literal("USER".into())));
        let fallback = user.field("fallback").unwrap();
        assert_eq!(fallback.scalar, ScalarType::Enum("Role".into()));
        assert_eq!(fallback.options.default, Some(DefaultValue::Literal("ADMIN".into())));
        assert_eq!(
            schema.enums,
            vec![EnumDescriptor {
                name: "Role".into(),
                values: vec!["ADMIN".into(), "USER".into()],
            }]
        );
    }

    #[test]
    fn test_advisory_inserted_once() {
        let source = "@Entity()\nclass User {\n  @Column() name: string;\n}\n";
        let (once, _) = extract_from(source);
        assert_eq!(
            once,
            format!("{}\n{}\n{source}", advisory::entity()[0], advisory::entity()[1])
        );
        let (twice, schema) = extract_from(&once);
        assert_eq!(twice, once);
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn test_non_entity_classes_are_ignored() {
        let source = "@Injectable()\nclass UserService {\n  @Column() x: string;\n}\n";
        let (output, schema) = extract_from(source);
        assert!(schema.is_empty());
        assert_eq!(output, source);
    }

    #[test]
    fn test_nested_entities_are_found() {
        let source = r#"export function mk() {
  @Entity()
  class Inner {
    @PrimaryGeneratedColumn()
    id: number;
  }
  return Inner;
}

namespace Models {
  @Entity('tags')
  export class Tag {
    @Column() label: string;
  }
}

export const build = () => {
  @Entity()
  class Local {
    @Column() x: string;
  }
  return Local;
};
"#;
        let (output, schema) = extract_from(source);
        let names: Vec<&str> = schema.models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Inner", "Tag", "Local"]);
        assert_eq!(schema.get("Tag").unwrap().table_name, "tags");
        assert_eq!(schema.get("Inner").unwrap().identity().unwrap().name, "id");
        assert!(output.contains("  // ormlift: reference only.") && output.contains("\n  @Entity()\n  class Inner"));
        assert_eq!(output.matches("// ormlift: reference only.").count(), 3);
    }

    #[test]
    fn test_relation_references_target_identity() {
        let (_, schema) = extract_from(
            r#"
@Entity()
class Order {
  @ManyToOne(() => Customer)
  customer: Customer;

  @ManyToOne(() => Missing)
  missing: Missing;
}

@Entity()
class Customer {
  @PrimaryColumn()
  code: string;
}
"#,
        );
        let order = schema.get("Order").unwrap();
        let customer = order.field("customer").unwrap().relation.as_ref().unwrap();
        assert_eq!(customer.references.as_deref(), Some("code"));
        assert_eq!(order.field("customerId").unwrap().scalar, ScalarType::String);
        let missing = order.field("missing").unwrap().relation.as_ref().unwrap();
        assert_eq!(missing.references, None);
    }
}
