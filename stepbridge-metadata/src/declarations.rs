// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{borrow::Borrow, fmt};

/// A test class as recorded at discovery time.
///
/// Test classes form a nesting chain through [`enclosing`](Self::enclosing):
/// a nested test class names the class it is declared in.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestClass {
    /// The fully qualified name of the class.
    pub name: SmolStr,

    /// The name of the class this one is declared in, if any.
    #[serde(default)]
    pub enclosing: Option<SmolStr>,

    /// Extensions registered directly on this class.
    #[serde(default)]
    pub extensions: Vec<SmolStr>,

    /// Methods declared on this class, in declaration order.
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

impl TestClass {
    /// Creates a new top-level class with no extensions or methods.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            enclosing: None,
            extensions: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Sets the enclosing class.
    pub fn with_enclosing(mut self, enclosing: impl Into<SmolStr>) -> Self {
        self.enclosing = Some(enclosing.into());
        self
    }

    /// Registers an extension on this class.
    pub fn with_extension(mut self, extension: impl Into<SmolStr>) -> Self {
        self.extensions.push(extension.into());
        self
    }

    /// Declares a method on this class.
    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    /// Returns true if the given extension is registered directly on this class.
    pub fn has_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|e| e == extension)
    }

    /// Returns the methods with the given name, in declaration order.
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = (usize, &'a MethodDecl)> {
        self.methods
            .iter()
            .enumerate()
            .filter(move |(_, method)| method.name == name)
    }
}

/// A method declared on a [`TestClass`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MethodDecl {
    /// The name of the method.
    pub name: SmolStr,

    /// The fully qualified names of the parameter types, in order.
    #[serde(default)]
    pub parameter_types: Vec<SmolStr>,
}

impl MethodDecl {
    /// Creates a method declaration with no parameters.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            parameter_types: Vec::new(),
        }
    }

    /// Adds a parameter of the given type.
    pub fn with_parameter(mut self, ty: impl Into<SmolStr>) -> Self {
        self.parameter_types.push(ty.into());
        self
    }
}

/// Identifies a test method by its owning class, as `<className>.<methodName>`.
///
/// Overloads of a method share a key. Data tables are registered against
/// method keys.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodKey(SmolStr);

impl MethodKey {
    /// Creates a new key from a class name and a method name.
    pub fn new(class_name: &str, method_name: &str) -> Self {
        Self(SmolStr::from(format!("{class_name}.{method_name}")))
    }

    /// Returns the key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MethodKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
