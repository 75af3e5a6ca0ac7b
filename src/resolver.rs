//! Which model does a call site talk to?
//!
//! Resolution is a best-effort guess from names and locally visible type
//! annotations. It can be wrong (a `UserService` that also injects a post
//! repository resolves every call to `User`), which is why an explicit
//! `[models]` mapping is consulted first and why unresolved sites fall
//! back to a visible placeholder instead of a guess.

use std::collections::BTreeMap;

use swc_ecma_ast::{Class, TsType};

use crate::ast::{constructor, generic_arg, param_prop, prop_type, properties, type_name};

const CLASS_SUFFIXES: &[&str] = &["Service", "Controller", "Repository"];

/// What a resolver may look at: the enclosing class, summarised before
/// rewriting starts, and the member the call goes through.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallSite<'a> {
    pub class: Option<&'a ClassContext>,
    /// `userRepository` in `this.userRepository.find()`, `repo` in
    /// `repo.find()`.
    pub member: Option<&'a str>,
}

/// Names and repository members of a class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassContext {
    pub name: String,
    /// Member name → entity type of every `Repository<Entity>` member.
    pub repositories: Vec<(String, String)>,
}

impl ClassContext {
    pub fn of(name: &str, class: &Class) -> Self {
        let mut repositories = Vec::new();
        let mut add = |member: &str, ty: Option<&TsType>| {
            if let Some(entity) = ty.and_then(repository_entity) {
                repositories.push((member.to_string(), entity.to_string()));
            }
        };
        for (member, prop) in properties(class) {
            add(member, prop_type(prop));
        }
        // Constructor parameter properties are members too.
        for param in constructor(class).into_iter().flat_map(|ctor| &ctor.params) {
            if let Some((member, ty)) = param_prop(param) {
                add(member, ty);
            }
        }
        Self {
            name: name.to_string(),
            repositories,
        }
    }

    pub fn repository_type(&self, member: &str) -> Option<&str> {
        self.repositories
            .iter()
            .find(|(name, _)| name == member)
            .map(|(_, entity)| entity.as_str())
    }
}

/// `Entity` of a `Repository<Entity>` annotation.
pub fn repository_entity(ty: &TsType) -> Option<&str> {
    generic_arg(ty, "Repository").and_then(type_name)
}

/// Whether a member or variable name denotes a repository.
pub fn is_repository_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("repository") || lower.ends_with("repo")
}

/// Client delegate name for a model: `BlogPost` → `blogPost`.
pub fn lower_camel(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One strategy for naming the model behind a call site.
pub trait ModelResolver {
    fn resolve(&self, site: &CallSite<'_>) -> Option<String>;
}

/// Naming conventions: the enclosing class's `<Base>Service`,
/// `<Base>Controller` or `<Base>Repository` name first, then the generic
/// argument of the member's `Repository<X>` annotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionResolver;

impl ModelResolver for ConventionResolver {
    fn resolve(&self, site: &CallSite<'_>) -> Option<String> {
        let class = site.class?;
        for suffix in CLASS_SUFFIXES {
            if let Some(base) = class.name.strip_suffix(suffix)
                && !base.is_empty()
            {
                return Some(base.to_string());
            }
        }
        let member = site.member.filter(|m| is_repository_name(m))?;
        class.repository_type(member).map(str::to_string)
    }
}

/// Explicit member name → model table.
#[derive(Debug, Clone, Default)]
pub struct MappedResolver {
    models: BTreeMap<String, String>,
}

impl MappedResolver {
    pub fn new(models: BTreeMap<String, String>) -> Self {
        Self { models }
    }
}

impl ModelResolver for MappedResolver {
    fn resolve(&self, site: &CallSite<'_>) -> Option<String> {
        self.models.get(site.member?).cloned()
    }
}

/// Resolvers tried in order until one answers.
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn ModelResolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config mapping first, then conventions.
    pub fn standard(models: &BTreeMap<String, String>) -> Self {
        let mut chain = Self::new();
        if !models.is_empty() {
            chain = chain.with(MappedResolver::new(models.clone()));
        }
        chain.with(ConventionResolver)
    }

    pub fn with(mut self, resolver: impl ModelResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }
}

impl ModelResolver for ResolverChain {
    fn resolve(&self, site: &CallSite<'_>) -> Option<String> {
        self.resolvers.iter().find_map(|r| r.resolve(site))
    }
}
