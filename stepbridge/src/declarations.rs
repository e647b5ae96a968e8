// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolution of class and method names reported by the runner against the
//! declarations recorded in the test plan.

use crate::errors::LookupError;
use itertools::Itertools;
use smol_str::SmolStr;
use std::{collections::HashMap, fmt, sync::Arc};
use stepbridge_metadata::{MethodDecl, MethodKey, MethodSource, TestClass, TestPlan};
use tracing::error;

/// Class declarations of a test plan, indexed by class name.
///
/// Built once when the plan starts, so runner identifiers resolve to
/// declarations without repeated lookups by string.
#[derive(Clone, Debug, Default)]
pub struct DeclarationIndex {
    classes: HashMap<SmolStr, Arc<TestClass>>,
}

impl DeclarationIndex {
    /// Indexes the classes declared by the plan.
    pub fn new(plan: &TestPlan) -> Self {
        Self {
            classes: plan
                .classes()
                .map(|class| (class.name.clone(), Arc::new(class.clone())))
                .collect(),
        }
    }

    /// Looks up a class by name.
    pub fn class(&self, name: &str) -> Result<&Arc<TestClass>, LookupError> {
        self.classes
            .get(name)
            .ok_or_else(|| LookupError::ClassNotFound {
                class_name: name.into(),
            })
    }

    /// Returns the class followed by its enclosing classes, outward.
    ///
    /// Enclosing classes missing from the plan end the chain, as does a class
    /// that encloses itself.
    pub fn nest_chain<'a>(&'a self, class: &'a TestClass) -> Vec<&'a TestClass> {
        let mut chain = vec![class];
        let mut next = class.enclosing.as_deref();
        while let Some(name) = next {
            let Some(enclosing) = self.classes.get(name) else {
                break;
            };
            if chain.iter().any(|c| c.name == enclosing.name) {
                break;
            }
            chain.push(&**enclosing);
            next = enclosing.enclosing.as_deref();
        }
        chain
    }

    /// Resolves the method a runner's method source refers to.
    ///
    /// If the source carries parameter type names, the overload with exactly
    /// those parameter types is chosen. Type names that cannot be resolved are
    /// logged and never match. Without parameter types, the parameterless
    /// overload is preferred, then the only overload with that name.
    pub fn resolve_method(&self, source: &MethodSource) -> Result<TestMethod, LookupError> {
        let class = self.class(&source.class_name)?;
        let not_found = || LookupError::MethodNotFound {
            class_name: source.class_name.clone(),
            method_name: source.method_name.clone(),
            parameter_types: source.parameter_types.clone().unwrap_or_default(),
        };

        let index = match source.parameter_types.as_deref() {
            Some(raw) => {
                let resolved = resolve_parameter_types(raw);
                class
                    .methods_named(&source.method_name)
                    .find(|(_, decl)| parameters_match(decl, &resolved))
                    .map(|(index, _)| index)
            }
            None => {
                let overloads: Vec<_> = class.methods_named(&source.method_name).collect();
                let sole = match overloads.as_slice() {
                    [only] => Some(only),
                    _ => None,
                };
                overloads
                    .iter()
                    .find(|(_, decl)| decl.parameter_types.is_empty())
                    .or(sole)
                    .map(|(index, _)| *index)
            }
        };

        index
            .map(|index| TestMethod {
                class: Arc::clone(class),
                index,
            })
            .ok_or_else(not_found)
    }
}

/// A method resolved against its declaring class.
#[derive(Clone, Debug)]
pub struct TestMethod {
    class: Arc<TestClass>,
    index: usize,
}

impl TestMethod {
    /// Returns the declaring class.
    pub fn class(&self) -> &Arc<TestClass> {
        &self.class
    }

    /// Returns the method declaration.
    pub fn decl(&self) -> &MethodDecl {
        &self.class.methods[self.index]
    }

    /// Returns the method name.
    pub fn name(&self) -> &str {
        &self.decl().name
    }

    /// Returns the data table key for this method.
    pub fn key(&self) -> MethodKey {
        MethodKey::new(&self.class.name, self.name())
    }

    /// Returns a signature that distinguishes overloads, such as
    /// `FooTest.adds(int, int)`.
    pub fn signature(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({})",
            self.class.name,
            self.name(),
            self.decl().parameter_types.iter().join(", ")
        )
    }
}

/// Splits a comma-separated list of parameter type names. Unresolvable names
/// are logged and contribute a `None` placeholder.
fn resolve_parameter_types(raw: &str) -> Vec<Option<&str>> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',')
        .map(|name| {
            let name = name.trim();
            if is_type_name(name) {
                Some(name)
            } else {
                error!("problem resolving parameter type `{name}` in `{raw}`");
                None
            }
        })
        .collect()
}

fn parameters_match(decl: &MethodDecl, resolved: &[Option<&str>]) -> bool {
    decl.parameter_types.len() == resolved.len()
        && decl
            .parameter_types
            .iter()
            .zip(resolved)
            .all(|(declared, resolved)| *resolved == Some(declared.as_str()))
}

/// Returns true for dotted type paths such as `int`, `java.lang.String`,
/// `Outer$Inner` or `byte[]`.
fn is_type_name(name: &str) -> bool {
    let mut base = name;
    while let Some(stripped) = base.strip_suffix("[]") {
        base = stripped;
    }
    !base.is_empty()
        && base.split('.').all(|segment| {
            let mut chars = segment.chars();
            chars
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        })
}
