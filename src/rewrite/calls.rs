//! Call-site rewriting and repository injection replacement.

use std::collections::BTreeMap;

use swc_common::{BytePos, Spanned};
use swc_ecma_ast::{
    CallExpr, Callee, Class, ClassDecl, ClassExpr, ClassMember, Expr, MemberExpr, MemberProp, ModuleDecl,
    ParamOrTsParamProp, Stmt, TsType,
};
use swc_ecma_visit::{Visit, VisitWith};
use tracing::{debug, warn};

use super::{ArgumentTransform, QUERY_BUILDER, Snippets, advisory, rule_for};
use crate::ast::{
    constructor, ident_name, member_start, param_name, param_prop, param_start, prop_name, prop_type,
    properties, this_member,
};
use crate::config::CodemodConfig;
use crate::edit::EditSet;
use crate::parser::ParsedSource;
use crate::resolver::{CallSite, ClassContext, ModelResolver, is_repository_name, lower_camel, repository_entity};

/// What the call-site pass did to one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallRewrites {
    /// Calls rewritten through the rule table.
    pub calls: usize,
    /// `createQueryBuilder` sites that received an advisory.
    pub query_builders: usize,
    /// Classes whose repository members were replaced by the client.
    pub injections: usize,
}

/// Rewrite every repository call in the file, then replace repository
/// injections in classes whose members are no longer used.
pub fn rewrite_calls(
    source: &ParsedSource,
    edits: &mut EditSet,
    config: &CodemodConfig,
    resolver: &dyn ModelResolver,
) -> CallRewrites {
    let mut rewriter = CallRewriter {
        source,
        edits,
        config,
        resolver,
        classes: Vec::new(),
        anchors: Vec::new(),
        stats: CallRewrites::default(),
    };
    source.module.visit_with(&mut rewriter);
    rewriter.stats
}

/// A class being walked and the calls rewritten through its members.
struct ClassScope {
    context: ClassContext,
    rewritten: BTreeMap<String, usize>,
}

struct CallRewriter<'a> {
    source: &'a ParsedSource,
    edits: &'a mut EditSet,
    config: &'a CodemodConfig,
    resolver: &'a dyn ModelResolver,
    /// Enclosing classes, innermost last.
    classes: Vec<ClassScope>,
    /// Start offsets of the enclosing statements and members; advisories
    /// go above the innermost one.
    anchors: Vec<usize>,
    stats: CallRewrites,
}

impl CallRewriter<'_> {
    fn anchored(&mut self, at: BytePos, walk: impl FnOnce(&mut Self)) {
        self.anchors.push(self.source.offset(at));
        walk(self);
        self.anchors.pop();
    }

    fn class(&mut self, name: &str, class: &Class) {
        self.classes.push(ClassScope {
            context: ClassContext::of(name, class),
            rewritten: BTreeMap::new(),
        });
        let before = self.stats.calls;
        class.visit_children_with(self);
        // Only classes whose calls moved to the client lose their
        // repositories; untouched classes keep compiling as they were.
        if let Some(scope) = self.classes.pop()
            && self.stats.calls > before
        {
            self.replace_injections(class, &scope);
        }
    }

    fn rewrite_call(&mut self, call: &CallExpr) {
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
        let Some((member, through_this)) = repository_member(obj) else {
            return;
        };
        let method: &str = &method.sym;
        if method != QUERY_BUILDER && rule_for(method).is_none() {
            return;
        }

        let site = CallSite {
            class: self.classes.last().map(|scope| &scope.context),
            member: Some(member),
        };
        let model = self.resolver.resolve(&site).unwrap_or_else(|| {
            warn!(%member, %method, placeholder = %self.config.placeholder_model, "model unresolved, using placeholder");
            self.config.placeholder_model.clone()
        });
        let delegate = lower_camel(&model);
        let config = self.config;
        let client = &config.client.member;
        let anchor = self
            .anchors
            .last()
            .copied()
            .unwrap_or_else(|| self.source.offset(call.span.lo));

        if method == QUERY_BUILDER {
            let note = advisory::query_builder(client, &delegate);
            if advisory::annotate(self.source, self.edits, anchor, &note) {
                self.stats.query_builders += 1;
            }
            return;
        }
        let Some(rule) = rule_for(method) else {
            return;
        };
        let rewritten = rule.apply(&call.args, &Snippets::new(self.source, self.edits));
        let Some(rewritten) = rewritten else {
            debug!(%member, %method, "argument shape not recognised, call left as is");
            return;
        };

        let receiver = if self.classes.is_empty() {
            client.clone()
        } else {
            format!("this.{client}")
        };
        let target = format!("{receiver}.{delegate}.{}", rewritten.method);
        if !self.edits.replace(self.source.range_of(&**callee), target) {
            return;
        }
        if let Some(args) = rewritten.args
            && let (Some(first), Some(last)) = (call.args.first(), call.args.last())
        {
            let range = self.source.offset(first.span().lo)..self.source.offset(last.span().hi);
            self.edits.replace(range, args);
        }
        if rule.transform == ArgumentTransform::Save {
            advisory::annotate(self.source, self.edits, anchor, &advisory::save());
        }

        self.stats.calls += 1;
        if through_this && let Some(scope) = self.classes.last_mut() {
            *scope.rewritten.entry(member.to_string()).or_default() += 1;
        }
        debug!(%member, from = %method, to = %rewritten.method, model = %delegate, "rewrote call");
    }

    /// Swap `Repository<X>` members the class no longer uses for a single
    /// client parameter.
    fn replace_injections(&mut self, class: &Class, scope: &ClassScope) {
        let uses = member_uses(class);
        let unused: Vec<&str> = scope
            .context
            .repositories
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| uses.get(*name) == scope.rewritten.get(*name))
            .collect();
        if unused.is_empty() {
            return;
        }
        let is_unused_repository = |name: &str, ty: Option<&TsType>| {
            unused.iter().any(|u| *u == name) && ty.and_then(repository_entity).is_some()
        };

        let config = self.config;
        let client = &config.client;
        let client_param = format!("private readonly {}: {}", client.member, client.service);
        let ctor = constructor(class);
        let has_client = properties(class).any(|(name, _)| name == client.member)
            || ctor.is_some_and(|ctor| ctor.params.iter().any(|p| param_name(p) == Some(client.member.as_str())));

        // Property members go as whole lines; the first one's place is
        // where a new constructor goes.
        let mut vacated = None;
        for member in &class.body {
            let ClassMember::ClassProp(prop) = member else {
                continue;
            };
            if !prop_name(&prop.key).is_some_and(|name| is_unused_repository(name, prop_type(prop))) {
                continue;
            }
            let start = self.source.offset(member_start(member));
            let mut end = self.source.offset(prop.span.hi);
            if self.source.text()[end..].starts_with(';') {
                end += 1;
            }
            let (range, whole) = match self.source.whole_lines(start..end) {
                Some(lines) => (lines, true),
                None => (start..end, false),
            };
            vacated.get_or_insert((range.start, whole));
            self.edits.delete(range);
        }

        match ctor {
            Some(ctor) => {
                let removed: Vec<bool> = ctor
                    .params
                    .iter()
                    .map(|p| param_prop(p).is_some_and(|(name, ty)| is_unused_repository(name, ty)))
                    .collect();
                if removed.contains(&true) || !has_client {
                    self.rebuild_params(&ctor.params, &removed, (!has_client).then_some(client_param));
                }
            }
            None if !has_client => {
                if let Some((at, whole)) = vacated {
                    let text = if whole {
                        let indent = self.source.indent_at(at);
                        format!("{indent}constructor({client_param}) {{}}{}", self.source.newline())
                    } else {
                        format!("constructor({client_param}) {{}}")
                    };
                    self.edits.insert(at, text);
                }
            }
            None => {}
        }

        self.stats.injections += 1;
        debug!(class = %scope.context.name, replaced = ?unused, "replaced repository injection");
    }

    /// Rewrite a constructor parameter list without the `removed`
    /// parameters, putting `client` where the first of them was (or at the
    /// end). Kept parameters are copied as written.
    fn rebuild_params(
        &mut self,
        params: &[ParamOrTsParamProp],
        removed: &[bool],
        mut client: Option<String>,
    ) {
        let (Some(first), Some(last)) = (params.first(), params.last()) else {
            return;
        };
        let range = self.source.offset(param_start(first))..self.source.offset(last.span().hi);
        let separator = self.source.list_separator(range.clone());

        let text = Snippets::new(self.source, self.edits);
        let mut items = Vec::new();
        let mut dropped = Vec::new();
        for (param, removed) in params.iter().zip(removed) {
            if *removed {
                items.extend(client.take());
                dropped.push(self.source.offset(param_start(param))..self.source.offset(param.span().hi));
            } else {
                items.push(text.of(param));
            }
        }
        items.extend(client);

        for range in dropped {
            self.edits.drop_range(range);
        }
        self.edits.replace(range, items.join(&separator));
    }
}

impl Visit for CallRewriter<'_> {
    fn visit_class_decl(&mut self, decl: &ClassDecl) {
        self.class(&decl.ident.sym, &decl.class);
    }

    fn visit_class_expr(&mut self, expr: &ClassExpr) {
        let name = expr.ident.as_ref().map_or("", |ident| &*ident.sym);
        self.class(name, &expr.class);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        self.anchored(stmt.span().lo, |this| stmt.visit_children_with(this));
    }

    fn visit_module_decl(&mut self, decl: &ModuleDecl) {
        self.anchored(decl.span().lo, |this| decl.visit_children_with(this));
    }

    fn visit_class_member(&mut self, member: &ClassMember) {
        self.anchored(member_start(member), |this| member.visit_children_with(this));
    }

    fn visit_call_expr(&mut self, call: &CallExpr) {
        call.visit_children_with(self);
        self.rewrite_call(call);
    }
}

/// `userRepository` of `this.userRepository` (and `true`), `repo` of a
/// bare `repo` (and `false`).
fn repository_member(object: &Expr) -> Option<(&str, bool)> {
    if let Some(name) = this_member(object) {
        return is_repository_name(name).then_some((name, true));
    }
    ident_name(object)
        .filter(|name| is_repository_name(name))
        .map(|name| (name, false))
}

/// How often each `this.<name>` appears in the class.
fn member_uses(class: &Class) -> BTreeMap<String, usize> {
    #[derive(Default)]
    struct Uses(BTreeMap<String, usize>);

    impl Visit for Uses {
        fn visit_member_expr(&mut self, expr: &MemberExpr) {
            if matches!(&*expr.obj, Expr::This(_))
                && let MemberProp::Ident(prop) = &expr.prop
            {
                *self.0.entry(prop.sym.to_string()).or_default() += 1;
            }
            expr.visit_children_with(self);
        }
    }

    let mut uses = Uses::default();
    class.visit_children_with(&mut uses);
    uses.0
}
