use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::container::{Raster, Value};
use crate::resolve::{self, KeyHint};
use crate::rule::Callback;

/// Arguments a cached computation is called with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keyword: BTreeMap<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.keyword.get(name)
    }

    /// String values among all arguments, used to pick between pattern matches
    pub fn possible_values(&self) -> BTreeSet<String> {
        resolve::possible_values(self.positional.iter().chain(self.keyword.values()))
    }
}

/// Per-call behaviour switches
pub struct CallOptions<C> {
    /// Recompute and overwrite the cache file
    pub force: bool,
    /// Run the computation on a miss; otherwise only collect what is present
    pub call: bool,
    /// Work on a duplicate of the container and return it
    pub copy: bool,
    /// Downgrade missing keys and values to warnings
    pub skip: bool,
    pub verbose: bool,
    /// Overrides the rule's default file name
    pub fname: Option<String>,
    /// Overrides the rule's default hint
    pub hint: Option<KeyHint>,
    /// Overrides the rule's default computation
    pub callback: Option<Callback<C>>,
}

impl<C> CallOptions<C> {
    pub fn new() -> Self {
        Self {
            force: false,
            call: true,
            copy: false,
            skip: false,
            verbose: true,
            fname: None,
            hint: None,
            callback: None,
        }
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn call(mut self, call: bool) -> Self {
        self.call = call;
        self
    }

    pub fn copy(mut self, copy: bool) -> Self {
        self.copy = copy;
        self
    }

    pub fn skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn fname(mut self, fname: impl Into<String>) -> Self {
        self.fname = Some(fname.into());
        self
    }

    pub fn hint(mut self, hint: KeyHint) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn callback(mut self, callback: Callback<C>) -> Self {
        self.callback = Some(callback);
        self
    }
}

impl<C> Default for CallOptions<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for CallOptions<C> {
    fn clone(&self) -> Self {
        Self {
            force: self.force,
            call: self.call,
            copy: self.copy,
            skip: self.skip,
            verbose: self.verbose,
            fname: self.fname.clone(),
            hint: self.hint.clone(),
            callback: self.callback.clone(),
        }
    }
}

impl<C> fmt::Debug for CallOptions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("force", &self.force)
            .field("call", &self.call)
            .field("copy", &self.copy)
            .field("skip", &self.skip)
            .field("verbose", &self.verbose)
            .field("fname", &self.fname)
            .field("hint", &self.hint)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// What a cached call hands back to its caller
#[derive(Debug)]
pub enum Outcome<C> {
    /// The caller's container was updated in place
    Nothing,
    /// The updated duplicate, when copying
    Container(C),
    /// Captured plot
    Image(Raster),
    /// Return attribute of the rule, or the computation's own return value
    Value(Value),
}

impl<C> Outcome<C> {
    pub fn into_container(self) -> Option<C> {
        match self {
            Outcome::Container(container) => Some(container),
            _ => None,
        }
    }

    pub fn into_image(self) -> Option<Raster> {
        match self {
            Outcome::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Outcome::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_nothing(&self) -> bool {
        matches!(self, Outcome::Nothing)
    }
}
