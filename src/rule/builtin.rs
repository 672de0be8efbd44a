//! Built-in rule declarations for the common preprocessing and tool results

use serde::Deserialize;

use super::decl::RuleDecl;
use crate::error::CacheError;

const BUILTIN_RULES: &str = r#"
[[rules]]
name = "expression"
group = "pp"
attrs = { X = { whole = true } }

[[rules]]
name = "moments"
group = "pp"
attrs = { uns = "pca", uns_cache1 = "neighbors", obsm = "X_pca", varm = "PCs", layers = "Ms", layers_cache1 = "Mu" }

[[rules]]
name = "pca"
group = "pp"
attrs = { obsm = "X_pca", varm = "PCs", uns = ["pca", "variance_ratio"], uns_cache1 = ["pca", "variance"] }

[[rules]]
name = "pcarr"
group = "pp"
fname = "pca_arr"
attrs = { obsm = "X_pca" }
returns = { obsm = "X_pca" }

[[rules]]
name = "neighbors"
group = "pp"
fname = "neighs"
attrs = { uns = "neighbors" }

[[rules]]
name = "louvain"
group = "tl"
attrs = { obs = "louvain" }

[[rules]]
name = "tsne"
group = "tl"
attrs = { obsm = "X_tsne" }

[[rules]]
name = "umap"
group = "tl"
attrs = { obsm = "X_umap" }

[[rules]]
name = "diffmap"
group = "tl"
attrs = { obsm = "X_diffmap", uns = "diffmap_evals", uns_cache1 = "iroot" }
optional = ["uns_cache1"]

[[rules]]
name = "paga"
group = "tl"
attrs = { uns = "paga" }

[[rules]]
name = "velocity"
group = "tl"
fname = "velo"
attrs = { var = "velocity_gamma", var_cache1 = "velocity_r2", var_cache2 = "velocity_genes", layers = "velocity" }

[[rules]]
name = "velocity_graph"
group = "tl"
fname = "velo_graph"
attrs = { uns = { pattern = "(.+)_graph$" }, uns_cache1 = { pattern = "(.+)_graph_neg$" } }

[[rules]]
name = "velocity_embedding"
group = "tl"
fname = "velo_emb"
attrs = { obsm = { pattern = "^velocity_(.+)$" } }

[[rules]]
name = "draw_graph"
group = "tl"
attrs = { obsm = { pattern = "^X_draw_graph_(.+)$" }, uns = "draw_graph" }
"#;

#[derive(Deserialize)]
struct BuiltinTable {
    rules: Vec<RuleDecl>,
}

/// Declarations of every built-in rule, in declaration order
pub fn declarations() -> Result<Vec<RuleDecl>, CacheError> {
    toml::from_str::<BuiltinTable>(BUILTIN_RULES)
        .map(|table| table.rules)
        .map_err(|e| CacheError::config(format!("Invalid built-in rule table: {}", e)))
}
