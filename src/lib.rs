//! # ormlift
//!
//! > **Lift TypeORM repositories onto the Prisma client.**
//!
//! ormlift rewrites TypeScript sources that use the TypeORM repository API
//! into Prisma client calls, and extracts a `schema.prisma` from the
//! entity classes it finds along the way.
//!
//! ## Quick Example
//!
//! ```rust
//! let source = r#"
//! export class UserService {
//!   constructor(private readonly userRepository: Repository<User>) {}
//!
//!   one(id: number) {
//!     return this.userRepository.findOneBy({ id });
//!   }
//! }
//! "#;
//!
//! let result = ormlift::transform(source).unwrap();
//! assert!(result.output.contains("this.prisma.user.findUnique({ where: { id } })"));
//! ```
//!
//! ## Pipeline
//!
//! | Stage    | Module              | Flag                        |
//! |----------|---------------------|-----------------------------|
//! | Parse    | [`parser`]          |                             |
//! | Extract  | [`schema`]          | `entities`                  |
//! | Calls    | [`rewrite`]         | `services`, `repositories`  |
//! | Imports  | [`rewrite`]         | `modules`                   |
//! | Assemble | [`engine`]          |                             |
//!
//! Stages never reprint the file: they record byte-range edits (see
//! [`edit`]) against the original text, so comments, blank lines and line
//! endings outside a rewritten expression stay as written. A file for
//! which no flag fires comes back byte for byte.

pub mod ast;
pub mod config;
pub mod edit;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod parser;
pub mod resolver;
pub mod rewrite;
pub mod schema;

pub mod prelude {
    pub use crate::config::CodemodConfig;
    pub use crate::edit::EditSet;
    pub use crate::engine::{ChangeFlags, Codemod, LogSink, SchemaSink, Transformation};
    pub use crate::error::*;
    pub use crate::parser::{ParsedSource, parse};
    pub use crate::resolver::{ModelResolver, ResolverChain};
    pub use crate::schema::{SchemaDocument, SchemaModels};
}

/// Transform one TypeScript source with the default configuration.
///
/// # Example
///
/// ```
/// let result = ormlift::transform("export const n = 1;\n").unwrap();
/// assert!(!result.changed());
/// ```
pub fn transform(source: &str) -> Result<engine::Transformation, error::CodemodError> {
    engine::Codemod::default().transform(source)
}
