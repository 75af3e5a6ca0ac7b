//! The per-file pipeline and output assembly.
//!
//! One source file is parsed once, then goes through schema extraction,
//! call-site rewriting and import rewriting, in that order. Stages read the
//! tree and record byte-range edits; each reports what it did into a
//! [`TransformContext`]. The assembler then decides whether the edited
//! text or the untouched input is the result.
//!
//! ```
//! use ormlift::engine::Codemod;
//!
//! let codemod = Codemod::default();
//! let source = "export const answer = 42;\n";
//! let result = codemod.transform(source).unwrap();
//! assert!(!result.flags.any());
//! assert_eq!(result.output, source);
//! ```

use serde::Serialize;
use tracing::{debug, info};

use crate::config::CodemodConfig;
use crate::edit::EditSet;
use crate::error::CodemodResult;
use crate::parser::{self, ParsedSource};
use crate::resolver::{ModelResolver, ResolverChain};
use crate::rewrite::{CallRewrites, rewrite_calls, rewrite_imports};
use crate::schema::{self, SchemaDocument, SchemaModels};

/// Which rewrite categories fired for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeFlags {
    /// Entity classes were annotated and extracted.
    pub entities: bool,
    /// Repository injections were replaced by the client.
    pub repositories: bool,
    /// Imports or module registrations were rewritten.
    pub modules: bool,
    /// Repository calls were rewritten or flagged.
    pub services: bool,
}

impl ChangeFlags {
    pub fn any(&self) -> bool {
        self.entities || self.repositories || self.modules || self.services
    }
}

/// State accumulated while one file moves through the pipeline.
#[derive(Debug, Default)]
pub struct TransformContext {
    pub flags: ChangeFlags,
    pub models: SchemaModels,
    pub calls: CallRewrites,
}

impl TransformContext {
    fn record_models(&mut self, models: SchemaModels) {
        self.flags.entities |= !models.is_empty();
        self.models = models;
    }

    fn record_calls(&mut self, calls: CallRewrites) {
        self.flags.services |= calls.calls > 0 || calls.query_builders > 0;
        self.flags.repositories |= calls.injections > 0;
        self.calls = calls;
    }

    fn record_imports(&mut self, changed: bool) {
        self.flags.modules |= changed;
    }
}

/// The result of transforming one file.
#[derive(Debug, Clone, Serialize)]
pub struct Transformation {
    /// The rewritten source, or the input itself when nothing fired.
    pub output: String,
    pub flags: ChangeFlags,
    /// Schema fragments for the entities in this file.
    pub schema: SchemaDocument,
    #[serde(skip)]
    pub models: SchemaModels,
}

impl Transformation {
    pub fn changed(&self) -> bool {
        self.flags.any()
    }
}

/// The configured pipeline.
pub struct Codemod {
    config: CodemodConfig,
    resolver: Box<dyn ModelResolver>,
}

impl Default for Codemod {
    fn default() -> Self {
        Self::new(CodemodConfig::default())
    }
}

impl Codemod {
    /// Pipeline with the standard resolver chain: configured model
    /// mappings first, then class-name conventions.
    pub fn new(config: CodemodConfig) -> Self {
        let resolver = Box::new(ResolverChain::standard(&config.models));
        Self { config, resolver }
    }

    /// Replace the model resolution strategy.
    pub fn with_resolver(mut self, resolver: impl ModelResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn config(&self) -> &CodemodConfig {
        &self.config
    }

    /// Parse and transform one source file.
    pub fn transform(&self, source: &str) -> CodemodResult<Transformation> {
        let parsed = parser::parse(source)?;
        Ok(self.transform_parsed(&parsed))
    }

    /// Run the stages over an already parsed file.
    pub fn transform_parsed(&self, parsed: &ParsedSource) -> Transformation {
        let mut context = TransformContext::default();
        let mut edits = EditSet::new();

        context.record_models(schema::extract(parsed, &mut edits));
        context.record_calls(rewrite_calls(parsed, &mut edits, &self.config, self.resolver.as_ref()));
        let needs_service = context.calls.injections > 0;
        context.record_imports(rewrite_imports(parsed, &mut edits, &self.config, needs_service));

        debug!(
            models = context.models.len(),
            edits = edits.len(),
            calls = context.calls.calls,
            query_builders = context.calls.query_builders,
            injections = context.calls.injections,
            flags = ?context.flags,
            "transformed file"
        );

        let schema = SchemaDocument::from_models(&context.models, &self.config.schema);
        Transformation {
            output: assemble(context.flags, parsed, &edits),
            flags: context.flags,
            schema,
            models: context.models,
        }
    }
}

/// The edited text if any category fired, otherwise the input unchanged.
pub fn assemble(flags: ChangeFlags, parsed: &ParsedSource, edits: &EditSet) -> String {
    if flags.any() {
        parsed.render(edits)
    } else {
        parsed.original()
    }
}

/// Where rendered schema documents go.
pub trait SchemaSink {
    fn accept(&mut self, document: &SchemaDocument);
}

/// Writes each non-empty document to the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl SchemaSink for LogSink {
    fn accept(&mut self, document: &SchemaDocument) {
        if document.is_empty() {
            return;
        }
        info!(
            enums = document.enums.len(),
            models = document.models.len(),
            "generated schema:\n{}",
            document.render()
        );
    }
}

impl SchemaSink for Vec<String> {
    fn accept(&mut self, document: &SchemaDocument) {
        if !document.is_empty() {
            self.push(document.render());
        }
    }
}

impl SchemaSink for SchemaDocument {
    /// Accumulates fragments across files, first discovery wins.
    fn accept(&mut self, document: &SchemaDocument) {
        self.merge(document.clone());
    }
}
