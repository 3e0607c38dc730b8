//! Function library registry
//!
//! A [`FunctionLibrary`] maps helper names to registrars that install them
//! into a MiniJinja environment. The engine installs the sandboxed library
//! unless a builder is handed another one.

use indexmap::IndexMap;
use minijinja::Environment;

use crate::{filters, functions};

/// Installs one helper (as a filter, a function, or both)
pub type Registrar = fn(&mut Environment<'static>);

/// Helpers that read the live process environment
pub const RESTRICTED_FUNCTIONS: &[&str] = &["env", "expandenv"];

/// MiniJinja built-in filters, always available
pub const BUILTIN_FILTERS: &[&str] = &[
    "abs", "attr", "batch", "bool", "capitalize", "default", "dictsort", "e", "escape", "first",
    "float", "indent", "int", "items", "join", "last", "length", "list", "lower", "map", "max",
    "min", "reject", "rejectattr", "replace", "reverse", "round", "safe", "select",
    "selectattr", "slice", "sort", "string", "sum", "title", "tojson", "trim", "unique", "upper",
    "urlencode",
];

/// MiniJinja built-in global functions, always available
pub const BUILTIN_FUNCTIONS: &[&str] = &["range", "lipsum", "cycler", "joiner", "namespace"];

/// Named registry of template helpers
#[derive(Clone, Default)]
pub struct FunctionLibrary {
    entries: IndexMap<&'static str, Registrar>,
}

impl std::fmt::Debug for FunctionLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

impl FunctionLibrary {
    /// Library with no helpers at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every helper, including the ones reading the process environment
    pub fn standard() -> Self {
        Self::empty()
            // Format helpers
            .with("toYaml", |env| {
                env.add_filter("toYaml", filters::to_yaml);
                env.add_function("toYaml", filters::to_yaml);
            })
            .with("fromYaml", |env| {
                env.add_filter("fromYaml", filters::from_yaml);
                env.add_function("fromYaml", filters::from_yaml);
            })
            .with("toJson", |env| {
                env.add_filter("toJson", filters::to_json);
                env.add_function("toJson", filters::to_json);
            })
            .with("fromJson", |env| {
                env.add_filter("fromJson", filters::from_json);
                env.add_function("fromJson", filters::from_json);
            })
            .with("toToml", |env| {
                env.add_filter("toToml", filters::to_toml);
                env.add_function("toToml", filters::to_toml);
            })
            .with("ToYAML", |env| {
                env.add_function("ToYAML", functions::set_string_to_yaml);
            })
            // String helpers
            .with("quote", |env| env.add_filter("quote", filters::quote))
            .with("squote", |env| env.add_filter("squote", filters::squote))
            .with("indent", |env| env.add_filter("indent", filters::indent))
            .with("nindent", |env| env.add_filter("nindent", filters::nindent))
            .with("trunc", |env| env.add_filter("trunc", filters::trunc))
            .with("trimprefix", |env| env.add_filter("trimprefix", filters::trimprefix))
            .with("trimsuffix", |env| env.add_filter("trimsuffix", filters::trimsuffix))
            .with("snakecase", |env| env.add_filter("snakecase", filters::snakecase))
            .with("kebabcase", |env| env.add_filter("kebabcase", filters::kebabcase))
            .with("b64enc", |env| env.add_filter("b64enc", filters::b64enc))
            .with("b64dec", |env| env.add_filter("b64dec", filters::b64dec))
            .with("sha256sum", |env| env.add_filter("sha256sum", filters::sha256sum))
            .with("printf", |env| env.add_function("printf", functions::printf))
            // Collection helpers
            .with("dict", |env| env.add_function("dict", functions::dict))
            .with("list", |env| env.add_function("list", functions::list))
            .with("get", |env| env.add_function("get", functions::get))
            .with("haskey", |env| env.add_filter("haskey", filters::haskey))
            .with("keys", |env| env.add_filter("keys", filters::keys))
            .with("merge", |env| env.add_filter("merge", filters::merge))
            .with("coalesce", |env| env.add_function("coalesce", functions::coalesce))
            .with("ternary", |env| env.add_function("ternary", functions::ternary))
            .with("empty", |env| env.add_filter("empty", filters::empty))
            .with("required", |env| env.add_filter("required", filters::required))
            .with("fail", |env| env.add_function("fail", functions::fail))
            // Environment access
            .with("env", |env| env.add_function("env", functions::env))
            .with("expandenv", |env| env.add_function("expandenv", functions::expandenv))
    }

    /// The standard library without [`RESTRICTED_FUNCTIONS`]
    pub fn sandboxed() -> Self {
        Self::standard().without(RESTRICTED_FUNCTIONS)
    }

    /// Add or replace a helper
    pub fn with(mut self, name: &'static str, registrar: Registrar) -> Self {
        self.entries.insert(name, registrar);
        self
    }

    /// Remove helpers by name; unknown names are ignored
    pub fn without(mut self, names: &[&str]) -> Self {
        for name in names {
            self.entries.shift_remove(*name);
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Helper names in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Install every helper into `env`
    pub fn install(&self, env: &mut Environment<'static>) {
        for registrar in self.entries.values() {
            registrar(env);
        }
    }

    /// Names a template may call as filters or functions, for suggestions
    pub fn known_names(&self) -> Vec<&'static str> {
        let mut names = self.names();
        names.extend_from_slice(BUILTIN_FILTERS);
        names.extend_from_slice(BUILTIN_FUNCTIONS);
        names.sort_unstable();
        names.dedup();
        names
    }
}
