use std::collections::BTreeMap;

use rhai::{Dynamic, Engine, Scope};

use crate::error::ProjectionError;
use crate::front_matter::DefaultRule;

/// Everything a `defaults[].if` expression or a `{{…}}` command-template
/// interpolation can see, matching the binding set named in full.
#[derive(Debug, Clone, Default)]
pub struct DefaultsContext {
    pub page: i64,
    pub page_total: i64,
    pub titles: Vec<String>,
    pub subtitles: Vec<String>,
    pub bodies: Vec<String>,
    pub block_quotes: Vec<String>,
    pub code_blocks: Vec<String>,
    pub images: Vec<String>,
    pub comments: Vec<String>,
    pub headings: BTreeMap<i64, Vec<String>>,
    pub speaker_note: String,
    pub top_heading_level: i64,
}

fn string_array(values: &[String]) -> rhai::Array {
    values.iter().map(|v| Dynamic::from(v.clone())).collect()
}

fn headings_map(headings: &BTreeMap<i64, Vec<String>>) -> rhai::Map {
    headings
        .iter()
        .map(|(level, texts)| (level.to_string().into(), Dynamic::from(string_array(texts))))
        .collect()
}

pub fn build_scope(ctx: &DefaultsContext) -> Scope<'static> {
    let mut scope = Scope::new();
    scope.push("page", ctx.page);
    scope.push("pageTotal", ctx.page_total);
    scope.push("titles", string_array(&ctx.titles));
    scope.push("subtitles", string_array(&ctx.subtitles));
    scope.push("bodies", string_array(&ctx.bodies));
    scope.push("blockQuotes", string_array(&ctx.block_quotes));
    scope.push("codeBlocks", string_array(&ctx.code_blocks));
    scope.push("images", string_array(&ctx.images));
    scope.push("comments", string_array(&ctx.comments));
    scope.push("headings", headings_map(&ctx.headings));
    scope.push("speakerNote", ctx.speaker_note.clone());
    scope.push("topHeadingLevel", ctx.top_heading_level);
    scope
}

/// Evaluates a boolean `if` expression against a slide's scope, splitting
/// failures into compile vs. evaluate per the crate's error taxonomy.
fn eval_condition(engine: &Engine, scope: &mut Scope, expr: &str) -> Result<bool, ProjectionError> {
    let ast = engine
        .compile_expression(expr)
        .map_err(|e| ProjectionError::ExprCompile(e.to_string()))?;
    engine
        .eval_ast_with_scope::<bool>(scope, &ast)
        .map_err(|e| ProjectionError::ExprEval(e.to_string()))
}

/// Returns the first `defaults` rule whose `if` evaluates true (a rule with
/// no `if` always matches), or `None` if nothing matched.
pub fn select_default<'a>(
    engine: &Engine,
    ctx: &DefaultsContext,
    rules: &'a [DefaultRule],
) -> Result<Option<&'a DefaultRule>, ProjectionError> {
    for rule in rules {
        let matches = match &rule.if_expr {
            None => true,
            Some(expr) => {
                let mut scope = build_scope(ctx);
                eval_condition(engine, &mut scope, expr)?
            }
        };
        if matches {
            return Ok(Some(rule));
        }
    }
    Ok(None)
}

/// Replaces every `{{ expr }}` occurrence in `template` with the string form
/// of evaluating `expr` against `scope`. Used for the code-block rendering
/// command template (`CODEBLOCK_LANG`/`CODEBLOCK_CONTENT`/`CODEBLOCK_OUTPUT`
/// bindings, see `codeimage.rs`).
pub fn interpolate(engine: &Engine, scope: &mut Scope, template: &str) -> Result<String, ProjectionError> {
    let mut out = String::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| ProjectionError::ExprCompile("unterminated {{ ... }}".to_string()))?;
        let expr = after[..end].trim();
        let ast = engine
            .compile_expression(expr)
            .map_err(|e| ProjectionError::ExprCompile(e.to_string()))?;
        let value: Dynamic = engine
            .eval_ast_with_scope(scope, &ast)
            .map_err(|e| ProjectionError::ExprEval(e.to_string()))?;
        out.push_str(&value.to_string());
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_without_if_always_matches() {
        let engine = Engine::new();
        let ctx = DefaultsContext::default();
        let rules = vec![DefaultRule {
            if_expr: None,
            layout: Some("TITLE".into()),
            ..Default::default()
        }];
        let picked = select_default(&engine, &ctx, &rules).unwrap();
        assert_eq!(picked.unwrap().layout.as_deref(), Some("TITLE"));
    }

    #[test]
    fn first_matching_rule_wins() {
        let engine = Engine::new();
        let ctx = DefaultsContext {
            page: 2,
            ..Default::default()
        };
        let rules = vec![
            DefaultRule {
                if_expr: Some("page == 1".into()),
                layout: Some("FIRST".into()),
                ..Default::default()
            },
            DefaultRule {
                if_expr: Some("page == 2".into()),
                layout: Some("SECOND".into()),
                ..Default::default()
            },
        ];
        let picked = select_default(&engine, &ctx, &rules).unwrap();
        assert_eq!(picked.unwrap().layout.as_deref(), Some("SECOND"));
    }

    #[test]
    fn malformed_expression_is_a_compile_error() {
        let engine = Engine::new();
        let ctx = DefaultsContext::default();
        let rules = vec![DefaultRule {
            if_expr: Some("page ==".into()),
            ..Default::default()
        }];
        let err = select_default(&engine, &ctx, &rules).unwrap_err();
        assert!(matches!(err, ProjectionError::ExprCompile(_)));
    }

    #[test]
    fn interpolation_substitutes_bindings() {
        let engine = Engine::new();
        let mut scope = Scope::new();
        scope.push("CODEBLOCK_LANG", "rust".to_string());
        let out = interpolate(&engine, &mut scope, "render --lang {{CODEBLOCK_LANG}}").unwrap();
        assert_eq!(out, "render --lang rust");
    }

    #[test]
    fn interpolation_with_no_placeholders_is_unchanged() {
        let engine = Engine::new();
        let mut scope = Scope::new();
        let out = interpolate(&engine, &mut scope, "plain text").unwrap();
        assert_eq!(out, "plain text");
    }
}
