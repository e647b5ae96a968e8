// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Detection of test classes written for the reporting dialect.

use crate::declarations::DeclarationIndex;
use smol_str::SmolStr;
use std::collections::HashMap;
use stepbridge_metadata::TestClass;
use tracing::trace;

/// Decides whether a test class belongs to the reporting dialect.
///
/// A class belongs to the dialect if it, or any class it is nested in, registers
/// the dialect's extension marker. Answers are cached per class name for the
/// lifetime of a test plan.
#[derive(Clone, Debug)]
pub struct DialectDetector {
    extension: SmolStr,
    cache: HashMap<SmolStr, bool>,
}

impl DialectDetector {
    /// Creates a detector for the given extension marker.
    pub fn new(extension: impl Into<SmolStr>) -> Self {
        Self {
            extension: extension.into(),
            cache: HashMap::new(),
        }
    }

    /// Returns the extension marker this detector looks for.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns true if the class or any enclosing class registers the marker.
    ///
    /// This does not consult or populate the cache.
    pub fn is_dialect_member(&self, class: &TestClass, declarations: &DeclarationIndex) -> bool {
        declarations
            .nest_chain(class)
            .iter()
            .any(|class| class.has_extension(&self.extension))
    }

    /// Cached version of [`is_dialect_member`](Self::is_dialect_member).
    pub fn detect(&mut self, class: &TestClass, declarations: &DeclarationIndex) -> bool {
        if let Some(&is_member) = self.cache.get(&class.name) {
            return is_member;
        }
        let is_member = self.is_dialect_member(class, declarations);
        trace!(
            "class {} is {}a dialect member",
            class.name,
            if is_member { "" } else { "not " }
        );
        self.cache.insert(class.name.clone(), is_member);
        is_member
    }

    /// Forgets cached answers, for example when a new test plan starts.
    pub fn reset(&mut self) {
        self.cache.clear();
    }
}
