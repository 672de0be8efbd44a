use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Nested string-keyed mapping, the shape of every mapping category
pub type Mapping = BTreeMap<String, Value>;

/// Dense row-major matrix of `f64`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(rows * cols, data.len());
        Self { rows, cols, data }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::new(rows, cols, vec![0.0; rows * cols])
    }
}

/// RGBA8 raster captured from a rendered figure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Raster {
    pub const CHANNELS: usize = 4;

    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Whether the pixel buffer matches `width * height * 4`
    pub fn is_consistent(&self) -> bool {
        self.pixels.len() == self.width as usize * self.height as usize * Self::CHANNELS
    }
}

/// Value stored in a container category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Floats(Vec<f64>),
    Strings(Vec<String>),
    Matrix(Matrix),
    Raster(Raster),
    Map(Mapping),
}

impl Value {
    pub fn empty_map() -> Self {
        Value::Map(Mapping::new())
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Short human-readable description used by `scache inspect`
    pub fn summary(&self) -> String {
        match self {
            Value::Bool(b) => format!("bool {}", b),
            Value::Int(i) => format!("int {}", i),
            Value::Float(x) => format!("float {}", x),
            Value::Str(s) => format!("str {:?}", s),
            Value::Floats(v) => format!("floats[{}]", v.len()),
            Value::Strings(v) => format!("strings[{}]", v.len()),
            Value::Matrix(m) => format!("matrix {}x{}", m.rows, m.cols),
            Value::Raster(r) => format!("raster {}x{} rgba", r.width, r.height),
            Value::Map(map) => format!("map {{{}}}", map.keys().cloned().collect::<Vec<_>>().join(", ")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Floats(v)
    }
}

impl From<Matrix> for Value {
    fn from(m: Matrix) -> Self {
        Value::Matrix(m)
    }
}

impl From<Raster> for Value {
    fn from(r: Raster) -> Self {
        Value::Raster(r)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Map(map)
    }
}
