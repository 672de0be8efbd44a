// Common test utilities shared across acceptance tests
//
// Every test gets its own temporary workspace: a project directory used as the
// working directory, a cache root and a fake home so that no configuration or
// cache outside the workspace is ever discovered.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use scache::container::{Matrix, Value};
use scache::{AnnotatedData, Category};

/// Isolated project directory, cache root and home for one test
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("project")).unwrap();
        fs::create_dir_all(temp_dir.path().join("home")).unwrap();

        Self { temp_dir }
    }

    pub fn project(&self) -> PathBuf {
        self.temp_dir.path().join("project")
    }

    pub fn cache_root(&self) -> PathBuf {
        self.temp_dir.path().join("cache")
    }

    pub fn home(&self) -> PathBuf {
        self.temp_dir.path().join("home")
    }

    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.project().join("scache.toml");
        fs::write(&path, content).unwrap();
        path
    }

    /// `scache` binary running inside the project with the workspace cache root
    pub fn scache(&self) -> Command {
        let mut cmd = Command::new(std::env!("CARGO_BIN_EXE_scache"));
        cmd.current_dir(self.project())
            .env("HOME", self.home())
            .env("SCACHE_CACHE_DIR", self.cache_root())
            .env_remove("SCACHE_CONFIG")
            .env_remove("SCACHE_BACKEND")
            .env_remove("RUST_LOG");
        cmd
    }
}

/// Small dataset with a 4x3 expression matrix and the usual annotations
pub fn sample_data() -> AnnotatedData {
    let x = Matrix::new(4, 3, (0..12).map(|i| i as f64).collect());
    let mut data = AnnotatedData::with_matrix(x);
    data.insert(
        Category::Obs,
        "louvain",
        Value::Strings(vec!["0".into(), "1".into(), "1".into(), "0".into()]),
    )
    .unwrap();
    data
}

/// Deterministic 4x2 embedding
pub fn embedding(seed: f64) -> Matrix {
    Matrix::new(4, 2, (0..8).map(|i| seed + i as f64).collect())
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}
