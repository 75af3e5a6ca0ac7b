//! Import declarations and module registrations.

use std::collections::BTreeMap;
use std::ops::Range;

use swc_common::{BytePos, Spanned};
use swc_ecma_ast::{
    CallExpr, Callee, Decl, DefaultDecl, ExportDecl, ExportDefaultDecl, Expr, Ident, ImportDecl, ImportSpecifier,
    MemberExpr, MemberProp, ModuleDecl, ModuleExportName, ModuleItem, Stmt,
};
use swc_ecma_visit::{Visit, VisitWith};
use tracing::debug;

use super::advisory;
use crate::ast::class_start;
use crate::config::CodemodConfig;
use crate::edit::EditSet;
use crate::mapping::is_schema_decorator;
use crate::parser::ParsedSource;

/// The repository-capability symbol.
const REPOSITORY: &str = "Repository";
/// Injection and lookup helpers that go away with it.
const REPOSITORY_HELPERS: &[&str] = &["InjectRepository", "getRepository"];

const ROOT_REGISTRATIONS: &[&str] = &["forRoot", "forRootAsync"];
const FEATURE_REGISTRATION: &str = "forFeature";

/// Rewrite registrations and source-library imports. The client service
/// is imported when `needs_service` or when the file imports the
/// repository symbol. Returns whether anything changed.
pub fn rewrite_imports(
    source: &ParsedSource,
    edits: &mut EditSet,
    config: &CodemodConfig,
    mut needs_service: bool,
) -> bool {
    let registrations = rewrite_registrations(source, edits, config);
    let mut changed = registrations > 0;

    // Decide per imported name before touching the declarations; text the
    // earlier stages removed no longer counts as a use.
    let uses = references(source, edits);
    let used = |local: &str| uses.get(local).is_some_and(|n| *n > 0);

    let imports: Vec<&ImportDecl> = imports(source).collect();
    for import in &imports {
        let path: &str = &import.src.value;
        if config.is_source_module(path) {
            needs_service |= imports_symbol(import, REPOSITORY);
            changed |= trim_import(source, edits, import, |imported, local| {
                is_schema_decorator(imported)
                    || (!used(local)
                        && (imported == REPOSITORY
                            || REPOSITORY_HELPERS.contains(&imported)
                            || imported == config.source.registrar))
            });
        } else if is_entity_path(path) {
            let at = source.offset(import.span.lo);
            changed |= advisory::annotate(source, edits, at, &advisory::entity_import());
        }
    }

    let client = &config.client;
    let mut inserts = Vec::new();
    if needs_service && !has_import(&imports, &client.service, &client.service_path) {
        inserts.push((client.service.as_str(), client.service_path.as_str()));
    }
    if registrations > 0 && !has_import(&imports, &client.module, &client.module_path) {
        inserts.push((client.module.as_str(), client.module_path.as_str()));
    }
    if !inserts.is_empty() {
        changed = true;
        insert_at_top(source, edits, imports.first().copied(), &inserts);
    }
    changed
}

fn imports(source: &ParsedSource) -> impl Iterator<Item = &ImportDecl> {
    source.module.body.iter().filter_map(|item| match item {
        ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => Some(import),
        _ => None,
    })
}

/// `TypeOrmModule.forRoot(..)` → `PrismaModule.forRoot()`,
/// `TypeOrmModule.forFeature([..])` → `PrismaModule.forFeature([..])`.
fn rewrite_registrations(source: &ParsedSource, edits: &mut EditSet, config: &CodemodConfig) -> usize {
    struct Registrations<'a> {
        source: &'a ParsedSource,
        edits: &'a mut EditSet,
        registrar: &'a str,
        module: &'a str,
        count: usize,
    }

    impl Visit for Registrations<'_> {
        fn visit_call_expr(&mut self, call: &CallExpr) {
            call.visit_children_with(self);
            let Callee::Expr(callee) = &call.callee else {
                return;
            };
            let Expr::Member(MemberExpr {
                obj,
                prop: MemberProp::Ident(method),
                ..
            }) = &**callee
            else {
                return;
            };
            let Expr::Ident(registrar) = &**obj else {
                return;
            };
            if &*registrar.sym != self.registrar {
                return;
            }
            let is_root = ROOT_REGISTRATIONS.contains(&&*method.sym);
            if !is_root && &*method.sym != FEATURE_REGISTRATION {
                return;
            }

            let name = self.source.range_of(registrar);
            if !self.edits.replace(name.clone(), self.module) {
                return;
            }
            self.edits.drop_range(name);
            if is_root && !call.args.is_empty() {
                // Everything after the callee, parentheses included.
                let args = self.source.offset(callee.span().hi)..self.source.offset(call.span.hi);
                self.edits.replace(args.clone(), "()");
                self.edits.drop_range(args);
            }
            self.count += 1;
        }
    }

    let mut visitor = Registrations {
        source,
        edits,
        registrar: &config.source.registrar,
        module: &config.client.module,
        count: 0,
    };
    source.module.visit_with(&mut visitor);
    if visitor.count > 0 {
        debug!(count = visitor.count, "rewrote module registrations");
    }
    visitor.count
}

/// How often each identifier occurs outside imports and outside text
/// that is gone from the output.
fn references(source: &ParsedSource, edits: &EditSet) -> BTreeMap<String, usize> {
    struct References<'a> {
        source: &'a ParsedSource,
        edits: &'a EditSet,
        counts: BTreeMap<String, usize>,
    }

    impl Visit for References<'_> {
        fn visit_import_decl(&mut self, _: &ImportDecl) {}

        fn visit_ident(&mut self, ident: &Ident) {
            if !self.edits.is_dropped(&self.source.range_of(ident)) {
                *self.counts.entry(ident.sym.to_string()).or_default() += 1;
            }
        }
    }

    let mut visitor = References {
        source,
        edits,
        counts: BTreeMap::new(),
    };
    source.module.visit_with(&mut visitor);
    visitor.counts
}

/// Remove the specifiers `drop(imported, local)` selects. The import goes
/// entirely once nothing is left; otherwise the named list is rewritten
/// from the kept specifiers as written.
fn trim_import(
    source: &ParsedSource,
    edits: &mut EditSet,
    import: &ImportDecl,
    drop: impl Fn(&str, &str) -> bool,
) -> bool {
    let mut named = Vec::new();
    let mut others = Vec::new();
    let mut removed = 0;
    for spec in &import.specifiers {
        match spec {
            ImportSpecifier::Named(named_spec) => {
                let local: &str = &named_spec.local.sym;
                let imported = named_spec.imported.as_ref().map_or(local, export_name);
                if drop(imported, local) {
                    removed += 1;
                } else {
                    named.push(spec);
                }
            }
            other => others.push(other),
        }
    }
    if removed == 0 {
        return false;
    }
    debug!(source = %import.src.value, removed, "trimmed import");

    let statement = source.range_of(import);
    if named.is_empty() && others.is_empty() {
        let range = source.whole_lines(statement.clone()).unwrap_or(statement);
        return edits.delete(range);
    }

    let list = named_list(source, import);
    match (named.is_empty(), others.last()) {
        // `import D, { a } from 'x'` → `import D from 'x'`
        (true, Some(last)) => {
            let Some(list) = list else {
                return false;
            };
            edits.delete(source.offset(last.span().hi)..list.end)
        }
        _ => {
            let mut specs = import.specifiers.iter().filter(|s| is_named(s));
            let Some(first) = specs.next() else {
                return false;
            };
            let last = specs.next_back().unwrap_or(first);
            let range = source.offset(first.span().lo)..source.offset(last.span().hi);
            let separator = source.list_separator(range.clone());
            let kept: Vec<&str> = named.iter().map(|spec| source.slice(spec.span())).collect();
            edits.replace(range, kept.join(&separator))
        }
    }
}

fn imports_symbol(import: &ImportDecl, symbol: &str) -> bool {
    import.specifiers.iter().any(|spec| match spec {
        ImportSpecifier::Named(named) => {
            named.imported.as_ref().map_or(&*named.local.sym, export_name) == symbol
        }
        _ => false,
    })
}

fn is_named(spec: &ImportSpecifier) -> bool {
    matches!(spec, ImportSpecifier::Named(_))
}

/// The braces of the named list, closing brace included.
fn named_list(source: &ParsedSource, import: &ImportDecl) -> Option<Range<usize>> {
    let last = import.specifiers.iter().rfind(|s| is_named(s))?;
    let after = source.offset(last.span().hi);
    let close = after + source.text()[after..].find('}')? + 1;
    let open = source.text()[..after].rfind('{')?;
    Some(open..close)
}

fn export_name(name: &ModuleExportName) -> &str {
    match name {
        ModuleExportName::Ident(ident) => &*ident.sym,
        ModuleExportName::Str(s) => &*s.value,
    }
}

fn is_entity_path(source: &str) -> bool {
    source.ends_with(".entity") || source.contains("/entities/") || source.contains("/entity/")
}

/// An import of `name` or from `path` already exists.
fn has_import(imports: &[&ImportDecl], name: &str, path: &str) -> bool {
    imports.iter().any(|import| {
        &*import.src.value == path
            || import.specifiers.iter().any(|spec| match spec {
                ImportSpecifier::Named(named) => &*named.local.sym == name,
                _ => false,
            })
    })
}

/// New imports go above the first existing import (or the first item),
/// below any header comment but above advisories written for that line.
/// Quotes and semicolons follow the first import.
fn insert_at_top(source: &ParsedSource, edits: &mut EditSet, first: Option<&ImportDecl>, inserts: &[(&str, &str)]) {
    let anchor = match first {
        Some(import) => import.span.lo,
        None => source.module.body.first().map_or(source.module.span.lo, item_start),
    };
    let at = advisory::block_start(source, source.offset(anchor));

    let (quote, semi) = match first {
        Some(import) => {
            let text = source.slice(import.span);
            let quote = if source.slice(import.src.span).starts_with('"') { '"' } else { '\'' };
            (quote, if text.trim_end().ends_with(';') { ";" } else { "" })
        }
        None => ('\'', ";"),
    };
    let newline = source.newline();
    let text: String = inserts
        .iter()
        .map(|(name, path)| format!("import {{ {name} }} from {quote}{path}{quote}{semi}{newline}"))
        .collect();
    edits.insert_first(at, text);
}

/// Where an item starts, counting decorators on an exported class.
fn item_start(item: &ModuleItem) -> BytePos {
    let class = match item {
        ModuleItem::Stmt(Stmt::Decl(Decl::Class(decl))) => Some(&*decl.class),
        ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl {
            decl: Decl::Class(decl),
            ..
        })) => Some(&*decl.class),
        ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(ExportDefaultDecl {
            decl: DefaultDecl::Class(expr),
            ..
        })) => Some(&*expr.class),
        _ => None,
    };
    let lo = item.span().lo;
    class.map_or(lo, |class| class_start(class).min(lo))
}
