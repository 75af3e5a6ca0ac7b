//! Read-only queries over the swc syntax tree.
//!
//! The codemod only ever asks a handful of questions of the tree: what a
//! decorator is called, what an object literal holds under a key, what a
//! type annotation names. They live here so the stages read as rules
//! rather than as pattern matches.

use swc_common::{BytePos, Spanned};
use swc_ecma_ast::*;

/// `name` of `@name` or `@name(..)`.
pub fn decorator_name(decorator: &Decorator) -> Option<&str> {
    let target = match &*decorator.expr {
        Expr::Call(CallExpr {
            callee: Callee::Expr(callee),
            ..
        }) => &**callee,
        other => other,
    };
    ident_name(target)
}

/// Arguments of `@name(..)`; empty for a bare `@name`.
pub fn decorator_args(decorator: &Decorator) -> &[ExprOrSpread] {
    match &*decorator.expr {
        Expr::Call(call) => call.args.as_slice(),
        _ => &[],
    }
}

/// Non-spread argument expressions.
pub fn plain_args(args: &[ExprOrSpread]) -> Option<Vec<&Expr>> {
    args.iter()
        .map(|arg| arg.spread.is_none().then_some(&*arg.expr))
        .collect()
}

/// Strip any number of parentheses.
pub fn unparen(mut expr: &Expr) -> &Expr {
    while let Expr::Paren(paren) = expr {
        expr = &paren.expr;
    }
    expr
}

pub fn ident_name(expr: &Expr) -> Option<&str> {
    match unparen(expr) {
        Expr::Ident(ident) => Some(&*ident.sym),
        _ => None,
    }
}

/// Value of a string literal, escapes resolved.
pub fn str_value(expr: &Expr) -> Option<&str> {
    match unparen(expr) {
        Expr::Lit(Lit::Str(lit)) => Some(&*lit.value),
        _ => None,
    }
}

pub fn bool_value(expr: &Expr) -> Option<bool> {
    match unparen(expr) {
        Expr::Lit(Lit::Bool(lit)) => Some(lit.value),
        _ => None,
    }
}

/// `null`, `undefined` or `void ..`.
pub fn is_nullish(expr: &Expr) -> bool {
    match unparen(expr) {
        Expr::Lit(Lit::Null(_)) => true,
        Expr::Ident(ident) => &*ident.sym == "undefined",
        Expr::Unary(unary) => unary.op == UnaryOp::Void,
        _ => false,
    }
}

pub fn object(expr: &Expr) -> Option<&ObjectLit> {
    match unparen(expr) {
        Expr::Object(object) => Some(object),
        _ => None,
    }
}

/// Key of an object property, when it is a plain name or string.
pub fn prop_key(prop: &PropOrSpread) -> Option<&str> {
    match prop {
        PropOrSpread::Prop(prop) => match &**prop {
            Prop::Shorthand(ident) => Some(&*ident.sym),
            Prop::KeyValue(kv) => prop_name(&kv.key),
            Prop::Method(method) => prop_name(&method.key),
            Prop::Getter(getter) => prop_name(&getter.key),
            Prop::Setter(setter) => prop_name(&setter.key),
            Prop::Assign(assign) => Some(&*assign.key.sym),
        },
        PropOrSpread::Spread(_) => None,
    }
}

pub fn prop_name(key: &PropName) -> Option<&str> {
    match key {
        PropName::Ident(ident) => Some(&*ident.sym),
        PropName::Str(lit) => Some(&*lit.value),
        _ => None,
    }
}

/// Value stored under `key`: the expression of `key: value`, or `None`
/// for a shorthand (whose value is the name itself) and for absent keys.
pub fn prop_value<'a>(object: &'a ObjectLit, key: &str) -> Option<&'a Expr> {
    object.props.iter().find_map(|prop| match prop {
        PropOrSpread::Prop(prop) => match &**prop {
            Prop::KeyValue(kv) if prop_name(&kv.key) == Some(key) => Some(&*kv.value),
            _ => None,
        },
        PropOrSpread::Spread(_) => None,
    })
}

/// `key` option of an options-object expression.
pub fn option<'a>(expr: &'a Expr, key: &str) -> Option<&'a Expr> {
    prop_value(object(expr)?, key)
}

/// The single expression an arrow function returns, if it has no block.
pub fn arrow_result(expr: &Expr) -> Option<&Expr> {
    match unparen(expr) {
        Expr::Arrow(arrow) => match &*arrow.body {
            BlockStmtOrExpr::Expr(body) => Some(unparen(body)),
            BlockStmtOrExpr::BlockStmt(_) => None,
        },
        _ => None,
    }
}

/// `this.<name>` → `name`.
pub fn this_member(expr: &Expr) -> Option<&str> {
    match unparen(expr) {
        Expr::Member(MemberExpr {
            obj,
            prop: MemberProp::Ident(prop),
            ..
        }) if matches!(**obj, Expr::This(_)) => Some(&*prop.sym),
        _ => None,
    }
}

/// Strip parentheses and `| null` / `| undefined` union members.
pub fn non_null(ty: &TsType) -> &TsType {
    match ty {
        TsType::TsParenthesizedType(paren) => non_null(&paren.type_ann),
        TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
            let mut rest = union.types.iter().filter(|t| !is_null_type(t));
            match (rest.next(), rest.next()) {
                (Some(only), None) => non_null(only),
                _ => ty,
            }
        }
        _ => ty,
    }
}

/// Whether the annotation admits `null` or `undefined`.
pub fn is_nullable(ty: &TsType) -> bool {
    match ty {
        TsType::TsParenthesizedType(paren) => is_nullable(&paren.type_ann),
        TsType::TsUnionOrIntersectionType(TsUnionOrIntersectionType::TsUnionType(union)) => {
            union.types.iter().any(|t| is_null_type(t))
        }
        _ => false,
    }
}

fn is_null_type(ty: &TsType) -> bool {
    matches!(
        ty,
        TsType::TsKeywordType(TsKeywordType {
            kind: TsKeywordTypeKind::TsNullKeyword | TsKeywordTypeKind::TsUndefinedKeyword,
            ..
        })
    )
}

/// `User` of `User` or `User<..>`.
pub fn type_name(ty: &TsType) -> Option<&str> {
    match non_null(ty) {
        TsType::TsTypeRef(TsTypeRef {
            type_name: TsEntityName::Ident(ident),
            ..
        }) => Some(&*ident.sym),
        _ => None,
    }
}

/// `X` of `outer<X>`.
pub fn generic_arg<'a>(ty: &'a TsType, outer: &str) -> Option<&'a TsType> {
    match non_null(ty) {
        TsType::TsTypeRef(TsTypeRef {
            type_name: TsEntityName::Ident(ident),
            type_params: Some(params),
            ..
        }) if &*ident.sym == outer => params.params.first().map(|p| &**p),
        _ => None,
    }
}

/// Element type of `T[]` or `Array<T>`.
pub fn element_type(ty: &TsType) -> Option<&TsType> {
    match non_null(ty) {
        TsType::TsArrayType(array) => Some(&*array.elem_type),
        other => generic_arg(other, "Array"),
    }
}

/// Where a member starts, counting its decorators.
pub fn member_start(member: &ClassMember) -> BytePos {
    let decorators: &[Decorator] = match member {
        ClassMember::ClassProp(prop) => &prop.decorators,
        ClassMember::Method(method) => &method.function.decorators,
        ClassMember::PrivateMethod(method) => &method.function.decorators,
        ClassMember::PrivateProp(prop) => &prop.decorators,
        ClassMember::AutoAccessor(accessor) => &accessor.decorators,
        _ => &[],
    };
    earliest(member.span().lo, decorators)
}

/// Where a class starts, counting its decorators.
pub fn class_start(class: &Class) -> BytePos {
    earliest(class.span.lo, &class.decorators)
}

/// Where a constructor parameter starts, counting its decorators.
pub fn param_start(param: &ParamOrTsParamProp) -> BytePos {
    match param {
        ParamOrTsParamProp::TsParamProp(prop) => earliest(prop.span.lo, &prop.decorators),
        ParamOrTsParamProp::Param(param) => earliest(param.span.lo, &param.decorators),
    }
}

fn earliest(lo: BytePos, decorators: &[Decorator]) -> BytePos {
    decorators.iter().map(|d| d.span.lo).fold(lo, BytePos::min)
}

/// Name and type annotation of a constructor parameter property
/// (`private readonly repo: Repository<User>`).
pub fn param_prop(param: &ParamOrTsParamProp) -> Option<(&str, Option<&TsType>)> {
    let ParamOrTsParamProp::TsParamProp(prop) = param else {
        return None;
    };
    match &prop.param {
        TsParamPropParam::Ident(binding) => Some((
            &*binding.id.sym,
            binding.type_ann.as_ref().map(|t| &*t.type_ann),
        )),
        TsParamPropParam::Assign(_) => None,
    }
}

/// Name of a parameter of any kind.
pub fn param_name(param: &ParamOrTsParamProp) -> Option<&str> {
    match param {
        ParamOrTsParamProp::TsParamProp(_) => param_prop(param).map(|(name, _)| name),
        ParamOrTsParamProp::Param(Param {
            pat: Pat::Ident(binding),
            ..
        }) => Some(&*binding.id.sym),
        ParamOrTsParamProp::Param(_) => None,
    }
}

pub fn constructor(class: &Class) -> Option<&Constructor> {
    class.body.iter().find_map(|member| match member {
        ClassMember::Constructor(ctor) => Some(ctor),
        _ => None,
    })
}

/// Class properties with a plain name.
pub fn properties(class: &Class) -> impl Iterator<Item = (&str, &ClassProp)> {
    class.body.iter().filter_map(|member| match member {
        ClassMember::ClassProp(prop) => prop_name(&prop.key).map(|name| (name, prop)),
        _ => None,
    })
}

pub fn prop_type(prop: &ClassProp) -> Option<&TsType> {
    prop.type_ann.as_ref().map(|t| &*t.type_ann)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_type_queries() {
        assert_eq!(type_name(&annotation("User | null")), Some("User"));
        assert!(is_nullable(&annotation("User | null")));
        assert!(!is_nullable(&annotation("User")));
        let repo = annotation("Repository<Post>");
        assert_eq!(generic_arg(&repo, "Repository").and_then(type_name), Some("Post"));
        assert_eq!(generic_arg(&repo, "Promise").and_then(type_name), None);
        assert_eq!(element_type(&annotation("Tag[]")).and_then(type_name), Some("Tag"));
        assert_eq!(element_type(&annotation("Array<Tag>")).and_then(type_name), Some("Tag"));
    }

    #[test]
    fn test_decorators() {
        let parsed = parse("class A {\n  @Column({ nullable: true, name: 'x' }) a: string;\n  @Index b: string;\n}\n").unwrap();
        let (_, class) = first_class(&parsed);
        let props: Vec<&ClassProp> = properties(class).map(|(_, p)| p).collect();
        let column = &props[0].decorators[0];
        assert_eq!(decorator_name(column), Some("Column"));
        let options = &*decorator_args(column)[0].expr;
        assert_eq!(option(options, "nullable").and_then(bool_value), Some(true));
        assert_eq!(option(options, "name").and_then(str_value), Some("x"));
        assert_eq!(decorator_name(&props[1].decorators[0]), Some("Index"));
        assert!(decorator_args(&props[1].decorators[0]).is_empty());
    }

    #[test]
    fn test_expression_queries() {
        let parsed = parse("({ id, name: 'x', ...rest, active: (null) });").unwrap();
        let object = object(expression(&parsed)).unwrap();
        let keys: Vec<Option<&str>> = object.props.iter().map(prop_key).collect();
        assert_eq!(keys, vec![Some("id"), Some("name"), None, Some("active")]);
        assert!(prop_value(object, "id").is_none());
        assert!(prop_value(object, "active").is_some_and(is_nullish));
    }

    #[test]
    fn test_member_start_counts_decorators() {
        let source = "class A {\n  @InjectRepository(User)\n  private repo: Repository<User>;\n}\n";
        let parsed = parse(source).unwrap();
        let (_, class) = first_class(&parsed);
        let start = parsed.offset(member_start(&class.body[0]));
        assert_eq!(start, source.find('@').unwrap());
    }
}
