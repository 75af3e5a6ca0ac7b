use ormlift::prelude::*;
use ormlift::schema::ScalarType;
use pretty_assertions::assert_eq;

fn run(source: &str) -> Transformation {
    Codemod::default().transform(source).unwrap()
}

fn output(source: &str) -> String {
    run(source).output
}

const ENTITY: &str = r#"import { Entity, PrimaryGeneratedColumn, Column, OneToOne, OneToMany } from 'typeorm';
import { Profile } from './profile.entity';
import { Post } from './post.entity';

@Entity()
export class User {
  @PrimaryGeneratedColumn('uuid')
  id: string;

  @Column()
  name: string;

  @OneToOne(() => Profile)
  profile: Profile;

  @OneToMany(() => Post, (post) => post.author)
  posts: Post[];
}
"#;

const SERVICE: &str = r#"import { Injectable } from '@nestjs/common';
import { InjectRepository } from '@nestjs/typeorm';
import { Repository } from 'typeorm';
import { User } from './user.entity';

@Injectable()
export class UserService {
  constructor(
    @InjectRepository(User)
    private readonly userRepository: Repository<User>,
  ) {}

  findAll(): Promise<User[]> {
    return this.userRepository.find();
  }

  findOne(id: number): Promise<User> {
    return this.userRepository.findOneBy({ id });
  }

  async remove(id: number): Promise<void> {
    await this.userRepository.delete(id);
  }
}
"#;

const MODULE: &str = r#"import { Module } from '@nestjs/common';
import { TypeOrmModule } from '@nestjs/typeorm';
import { UserService } from './user.service';
import { User } from './user.entity';

@Module({
  imports: [TypeOrmModule.forFeature([User])],
  providers: [UserService],
})
export class UserModule {}
"#;

// ============================================================================
// No-op guarantee
// ============================================================================

#[test]
fn test_unmatched_files_are_returned_verbatim() {
    let sources = [
        "",
        "export const  answer   = 42;\n",
        "import { Injectable } from '@nestjs/common';\n\n@Injectable()\nexport class Clock {\n  now() { return Date.now(); }\n}\n",
        "// only a comment\n",
        "export class Cache {\n  constructor(private readonly store: Map<string, string>) {}\n\n  get(key: string) {\n    return this.store.get(key);\n  }\n}\n",
    ];
    for source in sources {
        let result = run(source);
        assert!(!result.changed(), "{source}");
        assert_eq!(result.output, source);
    }
}

#[test]
fn test_unknown_repository_methods_are_untouched() {
    let source = "export class UserService {\n  constructor(private readonly userRepository: Repository<User>) {}\n\n  go() {\n    return this.userRepository.upsert({ id: 1 }, ['id']);\n  }\n}\n";
    let result = run(source);
    assert!(!result.changed());
    assert_eq!(result.output, source);
}

// ============================================================================
// Source fidelity
// ============================================================================

const COMMENTED: &str = r#"import { Injectable } from '@nestjs/common';
import { Repository } from 'typeorm';

const x = 1; // important

@Injectable()
export class UserService {
  constructor(private readonly userRepository: Repository<User>) {}

  active() {
    const limit = x * 10;


    return this.userRepository.find({ // only active users
      where: { active: true }, // trailing note
      take: limit,
    });
  }
}
"#;

fn commented_expected() -> String {
    COMMENTED
        .replace("import { Repository } from 'typeorm';\n", "")
        .replace(
            "import { Injectable }",
            "import { PrismaService } from '../prisma/prisma.service';\nimport { Injectable }",
        )
        .replace("private readonly userRepository: Repository<User>", "private readonly prisma: PrismaService")
        .replace("this.userRepository.find(", "this.prisma.user.findMany(")
}

#[test]
fn test_comments_and_blank_lines_survive() {
    let out = output(COMMENTED);
    assert_eq!(out, commented_expected());
    assert!(out.contains("const x = 1; // important\n"));
    assert!(out.contains("findMany({ // only active users\n      where: { active: true }, // trailing note\n"));
    assert!(out.contains("const limit = x * 10;\n\n\n    return"));
}

#[test]
fn test_crlf_line_endings_survive() {
    let source = COMMENTED.replace('\n', "\r\n");
    let out = output(&source);
    assert_eq!(out, commented_expected().replace('\n', "\r\n"));
    assert!(!out.replace("\r\n", "").contains('\n'), "{out:?}");
}

#[test]
fn test_files_with_other_syntax_are_still_rewritten() {
    let sources = [
        "const re = /^[a-z]+$/i;\nrepo.findOneBy({ id: 1 });\n",
        "const f = function () {\n  return 1;\n};\nrepo.findOneBy({ id: 1 });\n",
        "const o = {\n  m() {\n    return 1;\n  },\n  get n() {\n    return 2;\n  },\n};\nrepo.findOneBy({ id: 1 });\n",
        "\u{feff}repo.findOneBy({ id: 1 });\n",
        "type Id = `user-${number}`;\nconst s = `a${1 + 1}b`;\nrepo.findOneBy({ id: 1 });\n",
    ];
    for source in sources {
        let result = run(source);
        assert!(result.flags.services, "{source}");
        assert_eq!(
            result.output,
            source.replace("repo.findOneBy({ id: 1 })", "prisma.model.findUnique({ where: { id: 1 } })"),
        );
    }
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_second_run_changes_nothing() {
    for source in [SERVICE, MODULE] {
        let once = output(source);
        let twice = run(&once);
        assert!(!twice.changed(), "{once}");
        assert_eq!(twice.output, once);
    }
}

#[test]
fn test_entity_second_run_adds_no_advisories() {
    let once = output(ENTITY);
    let twice = output(&once);
    assert_eq!(twice, once);
    assert_eq!(twice.matches("// ormlift: reference only.").count(), 1);
}

// ============================================================================
// Rule table
// ============================================================================

#[test]
fn test_rule_examples() {
    let cases = [
        ("repo.find();", "prisma.model.findMany();"),
        ("repo.findOneBy({id: 1});", "prisma.model.findUnique({ where: {id: 1} });"),
        ("repo.findBy({ active: true });", "prisma.model.findMany({ where: { active: true } });"),
        (
            "repo.findOne({ where: { id: 1 }, relations: ['posts'] });",
            "prisma.model.findUnique({ where: { id: 1 }, include: { posts: true } });",
        ),
        (
            "repo.update(1, {name: 'x'});",
            "prisma.model.update({ where: { id: 1 }, data: {name: 'x'} });",
        ),
        ("repo.delete(1);", "prisma.model.delete({ where: { id: 1 } });"),
        ("repo.remove({ email });", "prisma.model.delete({ where: { email } });"),
        ("repo.count({ active: true });", "prisma.model.count({ where: { active: true } });"),
    ];
    for (before, after) in cases {
        assert_eq!(output(&format!("{before}\n")), format!("{after}\n"), "{before}");
    }
}

#[test]
fn test_service_file() {
    let expected = r#"import { PrismaService } from '../prisma/prisma.service';
import { Injectable } from '@nestjs/common';
// ormlift: entity import; use the generated model types from '@prisma/client' instead.
import { User } from './user.entity';

@Injectable()
export class UserService {
  constructor(
    private readonly prisma: PrismaService,
  ) {}

  findAll(): Promise<User[]> {
    return this.prisma.user.findMany();
  }

  findOne(id: number): Promise<User> {
    return this.prisma.user.findUnique({ where: { id } });
  }

  async remove(id: number): Promise<void> {
    await this.prisma.user.delete({ where: { id } });
  }
}
"#;
    let result = run(SERVICE);
    assert_eq!(result.output, expected);
    assert!(result.flags.services);
    assert!(result.flags.repositories);
    assert!(result.flags.modules);
    assert!(!result.flags.entities);
}

#[test]
fn test_module_file() {
    let expected = r#"import { PrismaModule } from '../prisma/prisma.module';
import { Module } from '@nestjs/common';
import { UserService } from './user.service';
// ormlift: entity import; use the generated model types from '@prisma/client' instead.
import { User } from './user.entity';

@Module({
  imports: [PrismaModule.forFeature([User])],
  providers: [UserService],
})
export class UserModule {}
"#;
    assert_eq!(output(MODULE), expected);
}

#[test]
fn test_root_registration_arguments_cleared() {
    let source = "import { TypeOrmModule } from '@nestjs/typeorm';\n\n@Module({ imports: [TypeOrmModule.forRootAsync({ inject: [ConfigService] })] })\nexport class AppModule {}\n";
    let out = output(source);
    assert!(out.contains("imports: [PrismaModule.forRootAsync()]"), "{out}");
    assert_eq!(out.matches("import { PrismaModule }").count(), 1);
    assert!(!out.contains("TypeOrmModule"));
}

// ============================================================================
// Save heuristic
// ============================================================================

#[test]
fn test_save_with_id_becomes_update() {
    let expected = "// ormlift: `save` became update when the object has an `id`, create otherwise.
// Verify the intended semantics; `upsert` may be the better fit.
prisma.model.update({ where: { id: 5 }, data: { name: 'x' } });
";
    assert_eq!(output("repo.save({id: 5, name: 'x'});\n"), expected);
}

#[test]
fn test_save_without_id_becomes_create() {
    let out = output("repo.save({name: 'x'});\n");
    assert!(out.ends_with("prisma.model.create({ data: {name: 'x'} });\n"), "{out}");
    assert!(out.starts_with("// ormlift: `save`"));
}

// ============================================================================
// Schema extraction
// ============================================================================

#[test]
fn test_uuid_entity_schema() {
    let source = r#"@Entity()
export class Account {
  @PrimaryGeneratedColumn('uuid')
  id: string;

  @Column()
  email: string;
}
"#;
    let result = run(source);
    assert!(result.flags.entities);
    let expected = r#"model Account {
  id String @id @default(uuid())
  email String
  @@map("account")
}
"#;
    assert_eq!(result.schema.models[0].text, expected);
    assert!(result.output.starts_with("// ormlift: reference only."));
    assert!(result.schema.render().contains("datasource db {"));
}

#[test]
fn test_relation_naming_asymmetry() {
    let result = run(ENTITY);
    let text = &result.schema.models[0].text;
    assert!(text.contains("  profile Profile? @relation(\"UserToProfile\")\n"), "{text}");
    assert!(text.contains("  posts Post[] @relation(\"postsRelation\")\n"), "{text}");
}

#[test]
fn test_entity_imports_trimmed() {
    let out = output(ENTITY);
    assert!(!out.contains("from 'typeorm'"), "{out}");
    // decorators stay on the class for reference
    assert!(out.contains("@PrimaryGeneratedColumn('uuid')"));
}

#[test]
fn test_foreign_key_uses_target_identity() {
    let source = r#"@Entity()
export class Team {
  @PrimaryGeneratedColumn()
  id: number;
}

@Entity()
export class Player {
  @PrimaryGeneratedColumn()
  id: number;

  @ManyToOne(() => Team, { nullable: true })
  @JoinColumn({ name: 'team_id' })
  team: Team;
}
"#;
    let result = run(source);
    let player = result.models.get("Player").unwrap();
    let fk = player.field("teamId").unwrap();
    assert_eq!(fk.scalar, ScalarType::Int);
    assert!(fk.options.optional);
    assert_eq!(fk.options.column_name.as_deref(), Some("team_id"));
}

#[test]
fn test_nested_entity_classes() {
    let source = r#"export function mk() {
  @Entity()
  class Inner {
    @PrimaryGeneratedColumn()
    id: number;
  }
  return Inner;
}
"#;
    let result = run(source);
    assert!(result.flags.entities);
    assert!(result.models.get("Inner").is_some());
    assert!(
        result.output.contains("export function mk() {\n  // ormlift: reference only."),
        "{}",
        result.output
    );
}

#[test]
fn test_relation_references_target_identity_name() {
    let source = r#"@Entity()
export class Customer {
  @PrimaryGeneratedColumn('uuid')
  uuid: string;
}

@Entity()
export class Order {
  @PrimaryGeneratedColumn()
  id: number;

  @ManyToOne(() => Customer)
  customer: Customer;
}
"#;
    let result = run(source);
    let schema = result.schema.render();
    assert!(schema.contains("fields: [customerId], references: [uuid]"), "{schema}");
    assert!(!schema.contains("references: [id]"), "{schema}");
}

// ============================================================================
// Unsupported constructs
// ============================================================================

#[test]
fn test_query_builder_preserved() {
    let call = "this.userRepository.createQueryBuilder('user').where('user.id = :id', { id }).getOne()";
    let source = format!(
        "export class UserService {{\n  constructor(private readonly userRepository: Repository<User>) {{}}\n\n  byId(id: number) {{\n    return {call};\n  }}\n}}\n"
    );
    let result = run(&source);
    assert!(result.flags.services);
    assert!(!result.flags.repositories);
    assert!(result.output.contains(&format!("    return {call};\n")), "{}", result.output);
    assert!(result.output.contains("// ormlift: createQueryBuilder is not rewritten automatically."));
    assert!(result.output.contains("after:  prisma.user.findUnique({ where: { id } })"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_changes_client() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ormlift.toml");
    std::fs::write(
        &path,
        r#"placeholder_model = "Entity"

[client]
member = "db"
service = "DbService"
service_path = "@app/db"

[models]
repo = "Invoice"
"#,
    )
    .unwrap();

    let config = CodemodConfig::load(Some(&path)).unwrap();
    let codemod = Codemod::new(config);
    assert_eq!(
        codemod.transform("repo.find();\n").unwrap().output,
        "db.invoice.findMany();\n"
    );
    assert_eq!(
        codemod.transform("other.find();\n").unwrap().output,
        "other.find();\n"
    );

    let service = codemod.transform(SERVICE).unwrap().output;
    assert!(service.starts_with("import { DbService } from '@app/db';\n"), "{service}");
    assert!(service.contains("constructor(\n    private readonly db: DbService,\n  ) {}"), "{service}");
    assert!(service.contains("this.db.user.findMany()"));
}

#[test]
fn test_config_rejects_unknown_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ormlift.toml");
    std::fs::write(&path, "[client]\nmemebr = \"db\"\n").unwrap();
    assert!(CodemodConfig::load(Some(&path)).is_err());
}
