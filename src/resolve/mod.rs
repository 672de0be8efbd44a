//! Attribute path resolution
//!
//! Turns a category plus a [`KeySpec`] into concrete [`AttributePath`]s inside a
//! live container. Literal and path keys go through the rule's alias table;
//! pattern keys are matched against the keys the container currently holds and
//! disambiguated first by the values the caller passed, then by a [`KeyHint`].

pub mod hint;
pub mod keyspec;

pub use hint::{HintDecl, KeyHint};
pub use keyspec::{KeyPattern, KeySpec};

use std::collections::{BTreeMap, BTreeSet};

use crate::container::{category_keys, AttributePath, Category, Container};
use crate::error::CacheError;

/// Short name used by callers -> canonical key stored in the container
pub type AliasTable = BTreeMap<String, String>;

/// Outcome of resolving one declared key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    One(AttributePath),
    /// Hint-filtered candidates, each saved and loaded independently
    Many(Vec<AttributePath>),
    /// Optional key with nothing to match
    Skip,
}

impl Resolution {
    pub fn into_paths(self) -> Vec<AttributePath> {
        match self {
            Resolution::One(path) => vec![path],
            Resolution::Many(paths) => paths,
            Resolution::Skip => Vec::new(),
        }
    }
}

/// Everything resolution may consult besides the key itself
pub struct ResolveContext<'a> {
    pub container: &'a dyn Container,
    /// String values the current call was made with
    pub possible_values: &'a BTreeSet<String>,
    pub optional: bool,
    pub aliases: &'a AliasTable,
    pub hint: Option<&'a KeyHint>,
}

impl ResolveContext<'_> {
    fn alias(&self, name: &str) -> String {
        self.aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Resolve `spec` within `category` against the live container
pub fn resolve(
    category: Category,
    spec: &KeySpec,
    ctx: &ResolveContext<'_>,
) -> Result<Resolution, CacheError> {
    match spec {
        KeySpec::Whole => Ok(Resolution::One(AttributePath::whole(category))),
        KeySpec::Literal(name) => Ok(Resolution::One(AttributePath::key(
            category,
            ctx.alias(name),
        ))),
        KeySpec::Path(names) => Ok(Resolution::One(AttributePath::new(
            category,
            names.iter().map(|n| ctx.alias(n)).collect(),
        ))),
        KeySpec::Pattern(pattern) => resolve_pattern(category, pattern, ctx),
    }
}

fn resolve_pattern(
    category: Category,
    pattern: &KeyPattern,
    ctx: &ResolveContext<'_>,
) -> Result<Resolution, CacheError> {
    // captured short name -> full key
    let candidates: BTreeMap<String, String> = category_keys(ctx.container, category)
        .into_iter()
        .filter_map(|key| pattern.capture(&key).map(|name| (name, key)))
        .collect();

    let hits: Vec<&String> = candidates
        .iter()
        .filter(|(name, _)| ctx.possible_values.contains(*name))
        .map(|(_, key)| key)
        .collect();

    match hits.len() {
        1 => Ok(Resolution::One(AttributePath::key(category, hits[0].clone()))),
        0 => match candidates.len() {
            0 if ctx.optional => Ok(Resolution::Skip),
            1 => {
                let key = candidates.values().next().cloned().unwrap_or_default();
                Ok(Resolution::One(AttributePath::key(category, key)))
            }
            _ => disambiguate(category, pattern, candidates.values(), ctx.hint),
        },
        _ => disambiguate(category, pattern, hits.into_iter(), ctx.hint),
    }
}

fn disambiguate<'k>(
    category: Category,
    pattern: &KeyPattern,
    keys: impl Iterator<Item = &'k String>,
    hint: Option<&KeyHint>,
) -> Result<Resolution, CacheError> {
    let keys: Vec<&String> = keys.collect();

    let Some(hint) = hint else {
        return Err(CacheError::AmbiguousKeyMatch {
            category,
            pattern: pattern.source().to_string(),
            candidates: keys.into_iter().cloned().collect(),
        });
    };

    Ok(Resolution::Many(
        keys.into_iter()
            .filter(|key| hint.accepts(key))
            .map(|key| AttributePath::key(category, key.clone()))
            .collect(),
    ))
}

/// String values among a call's arguments
pub fn possible_values<'v, I>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'v crate::container::Value>,
{
    values
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{AnnotatedData, Mapping, Value};

    fn graphs() -> AnnotatedData {
        let mut data = AnnotatedData::new(4, 3);
        data.insert(Category::Uns, "leiden_graph", Value::empty_map()).unwrap();
        data.insert(Category::Uns, "louvain_graph", Value::empty_map()).unwrap();
        data.insert(Category::Uns, "neighbors", Value::empty_map()).unwrap();
        data
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn ctx<'a>(
        data: &'a AnnotatedData,
        possible: &'a BTreeSet<String>,
        aliases: &'a AliasTable,
        hint: Option<&'a KeyHint>,
    ) -> ResolveContext<'a> {
        ResolveContext {
            container: data,
            possible_values: possible,
            optional: false,
            aliases,
            hint,
        }
    }

    #[test]
    fn test_whole_and_literal() {
        let data = AnnotatedData::new(1, 1);
        let possible = set(&[]);
        let aliases = AliasTable::new();
        let c = ctx(&data, &possible, &aliases, None);

        assert_eq!(
            resolve(Category::X, &KeySpec::Whole, &c).unwrap(),
            Resolution::One(AttributePath::whole(Category::X))
        );
        assert_eq!(
            resolve(Category::Obsm, &KeySpec::literal("X_pca"), &c).unwrap(),
            Resolution::One(AttributePath::key(Category::Obsm, "X_pca"))
        );
    }

    #[test]
    fn test_aliases_translate_components() {
        let data = AnnotatedData::new(1, 1);
        let possible = set(&[]);
        let mut aliases = AliasTable::new();
        aliases.insert("clusters".to_string(), "louvain".to_string());
        aliases.insert("var".to_string(), "variance".to_string());
        let c = ctx(&data, &possible, &aliases, None);

        assert_eq!(
            resolve(Category::Obs, &KeySpec::literal("clusters"), &c).unwrap(),
            Resolution::One(AttributePath::key(Category::Obs, "louvain"))
        );
        assert_eq!(
            resolve(Category::Uns, &KeySpec::path(["pca", "var"]), &c).unwrap(),
            Resolution::One(AttributePath::new(
                Category::Uns,
                vec!["pca".to_string(), "variance".to_string()]
            ))
        );
    }

    #[test]
    fn test_pattern_disambiguated_by_arguments() {
        let data = graphs();
        let possible = set(&["leiden"]);
        let aliases = AliasTable::new();
        let spec = KeySpec::pattern(r"(.+)_graph$").unwrap();

        let resolution = resolve(Category::Uns, &spec, &ctx(&data, &possible, &aliases, None));
        assert_eq!(
            resolution.unwrap(),
            Resolution::One(AttributePath::key(Category::Uns, "leiden_graph"))
        );
    }

    #[test]
    fn test_arguments_win_over_hint() {
        let data = graphs();
        let possible = set(&["leiden"]);
        let aliases = AliasTable::new();
        let hint = KeyHint::contains("louvain");
        let spec = KeySpec::pattern(r"(.+)_graph$").unwrap();

        let resolution = resolve(
            Category::Uns,
            &spec,
            &ctx(&data, &possible, &aliases, Some(&hint)),
        );
        assert_eq!(
            resolution.unwrap(),
            Resolution::One(AttributePath::key(Category::Uns, "leiden_graph"))
        );
    }

    #[test]
    fn test_ambiguity_without_hint_fails() {
        let data = graphs();
        let possible = set(&[]);
        let aliases = AliasTable::new();
        let spec = KeySpec::pattern(r"(.+)_graph$").unwrap();

        let err = resolve(Category::Uns, &spec, &ctx(&data, &possible, &aliases, None))
            .unwrap_err();
        match err {
            CacheError::AmbiguousKeyMatch { candidates, .. } => {
                assert_eq!(
                    candidates,
                    vec!["leiden_graph".to_string(), "louvain_graph".to_string()]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_hint_narrows_ambiguity() {
        let data = graphs();
        let possible = set(&[]);
        let aliases = AliasTable::new();
        let hint = KeyHint::contains("leiden");
        let spec = KeySpec::pattern(r"(.+)_graph$").unwrap();

        let resolution = resolve(
            Category::Uns,
            &spec,
            &ctx(&data, &possible, &aliases, Some(&hint)),
        );
        assert_eq!(
            resolution.unwrap(),
            Resolution::Many(vec![AttributePath::key(Category::Uns, "leiden_graph")])
        );
    }

    #[test]
    fn test_hint_may_leave_several_candidates() {
        let data = graphs();
        let possible = set(&[]);
        let aliases = AliasTable::new();
        let hint = KeyHint::contains("_graph");
        let spec = KeySpec::pattern(r"(.+)_graph$").unwrap();

        let paths = resolve(
            Category::Uns,
            &spec,
            &ctx(&data, &possible, &aliases, Some(&hint)),
        )
        .unwrap()
        .into_paths();
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn test_several_argument_hits_are_ambiguous() {
        let data = graphs();
        let possible = set(&["leiden", "louvain"]);
        let aliases = AliasTable::new();
        let spec = KeySpec::pattern(r"(.+)_graph$").unwrap();

        let err = resolve(Category::Uns, &spec, &ctx(&data, &possible, &aliases, None))
            .unwrap_err();
        assert!(matches!(err, CacheError::AmbiguousKeyMatch { .. }));
    }

    #[test]
    fn test_single_candidate_needs_no_arguments() {
        let mut data = AnnotatedData::new(4, 3);
        data.insert(Category::Obsm, "X_draw_graph_fa", Value::empty_map())
            .unwrap();
        let possible = set(&[]);
        let aliases = AliasTable::new();
        let spec = KeySpec::pattern(r"X_draw_graph_(.+)$").unwrap();

        let resolution = resolve(Category::Obsm, &spec, &ctx(&data, &possible, &aliases, None));
        assert_eq!(
            resolution.unwrap(),
            Resolution::One(AttributePath::key(Category::Obsm, "X_draw_graph_fa"))
        );
    }

    #[test]
    fn test_optional_pattern_without_candidates_skips() {
        let data = AnnotatedData::new(4, 3);
        let possible = set(&[]);
        let aliases = AliasTable::new();
        let spec = KeySpec::pattern(r"(.+)_graph_neg$").unwrap();
        let mut c = ctx(&data, &possible, &aliases, None);
        c.optional = true;

        assert_eq!(resolve(Category::Uns, &spec, &c).unwrap(), Resolution::Skip);
    }

    #[test]
    fn test_no_candidates_without_hint_is_ambiguous() {
        let data = AnnotatedData::new(4, 3);
        let possible = set(&[]);
        let aliases = AliasTable::new();
        let spec = KeySpec::pattern(r"^velocity_(.+)$").unwrap();

        let err = resolve(Category::Obsm, &spec, &ctx(&data, &possible, &aliases, None))
            .unwrap_err();
        match err {
            CacheError::AmbiguousKeyMatch { candidates, .. } => assert!(candidates.is_empty()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_candidates_with_hint_resolves_to_nothing() {
        let mut data = AnnotatedData::new(4, 3);
        data.insert(Category::Obsm, "X_umap", Value::empty_map()).unwrap();
        let possible = set(&[]);
        let aliases = AliasTable::new();
        let hint = KeyHint::contains("umap");
        let spec = KeySpec::pattern(r"^velocity_(.+)$").unwrap();

        let resolution = resolve(
            Category::Obsm,
            &spec,
            &ctx(&data, &possible, &aliases, Some(&hint)),
        );
        assert_eq!(resolution.unwrap(), Resolution::Many(Vec::new()));
    }

    #[test]
    fn test_possible_values_keep_strings_only() {
        let mut kwargs = Mapping::new();
        kwargs.insert("basis".to_string(), Value::from("umap"));
        kwargs.insert("n_comps".to_string(), Value::Int(50));
        let values = possible_values(kwargs.values());
        assert_eq!(values, set(&["umap"]));
    }
}
