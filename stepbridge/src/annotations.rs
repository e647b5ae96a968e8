// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metadata attached to test classes and methods: data tables, manual,
//! pending and disabled markers, and custom display names.

use crate::{
    data_table::DataTable, declarations::TestMethod, errors::DisplayNameError,
    outcome::TestResult,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};
use stepbridge_metadata::{MethodKey, TestClass};
use tracing::debug;

/// The marker a test method carries, if any.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "marker", content = "result", rename_all = "kebab-case")]
pub enum MethodMarker {
    /// No marker.
    #[default]
    None,

    /// The verdict is fixed by configuration to the given result.
    Manual(TestResult),

    /// The test is not yet implemented.
    Pending,

    /// The test is disabled and will be skipped by the runner.
    Disabled,
}

impl MethodMarker {
    /// Returns true for [`MethodMarker::Manual`].
    pub fn is_manual(self) -> bool {
        matches!(self, Self::Manual(_))
    }

    /// Returns the configured verdict of a manual test.
    pub fn manual_result(self) -> Option<TestResult> {
        match self {
            Self::Manual(result) => Some(result),
            _ => None,
        }
    }

    /// Returns true for [`MethodMarker::Pending`].
    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }

    /// Returns true for [`MethodMarker::Disabled`].
    pub fn is_disabled(self) -> bool {
        self == Self::Disabled
    }
}

/// Looks up metadata attached to test classes and methods.
pub trait AnnotationsOracle {
    /// Returns the data tables declared by the methods of a class.
    fn data_tables_for(&self, class: &TestClass) -> IndexMap<MethodKey, DataTable>;

    /// Returns the marker a method carries.
    fn marker(&self, method: &TestMethod) -> MethodMarker;

    /// Returns the custom display name of a method, if it declares one.
    fn display_name_override(&self, method: &TestMethod)
    -> Result<Option<String>, DisplayNameError>;

    /// Returns true if the method is a manual test.
    fn is_manual(&self, method: &TestMethod) -> bool {
        self.marker(method).is_manual()
    }

    /// Returns the configured verdict of a manual test.
    fn manual_result(&self, method: &TestMethod) -> Option<TestResult> {
        self.marker(method).manual_result()
    }

    /// Returns true if the method is pending.
    fn is_pending(&self, method: &TestMethod) -> bool {
        self.marker(method).is_pending()
    }

    /// Returns true if the method is disabled.
    fn is_disabled(&self, method: &TestMethod) -> bool {
        self.marker(method).is_disabled()
    }
}

/// An [`AnnotationsOracle`] backed by metadata declared up front.
///
/// Markers and display names are registered per method key and so apply to
/// every overload of a method. This type can be deserialized, so a runner can
/// ship its metadata as JSON alongside the test plan.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StaticAnnotations {
    #[serde(default)]
    data_tables: HashMap<SmolStr, IndexMap<MethodKey, DataTable>>,
    #[serde(default)]
    markers: HashMap<MethodKey, MethodMarker>,
    #[serde(default)]
    display_names: HashMap<MethodKey, String>,
}

impl StaticAnnotations {
    /// Creates an empty set of annotations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a data table for a method of a class.
    pub fn with_data_table(mut self, class_name: &str, method_name: &str, table: DataTable) -> Self {
        self.data_tables
            .entry(class_name.into())
            .or_default()
            .insert(MethodKey::new(class_name, method_name), table);
        self
    }

    /// Registers a marker for a method of a class.
    pub fn with_marker(mut self, class_name: &str, method_name: &str, marker: MethodMarker) -> Self {
        self.markers
            .insert(MethodKey::new(class_name, method_name), marker);
        self
    }

    /// Registers a custom display name for a method of a class.
    pub fn with_display_name(
        mut self,
        class_name: &str,
        method_name: &str,
        display_name: impl Into<String>,
    ) -> Self {
        self.display_names
            .insert(MethodKey::new(class_name, method_name), display_name.into());
        self
    }
}

impl AnnotationsOracle for StaticAnnotations {
    fn data_tables_for(&self, class: &TestClass) -> IndexMap<MethodKey, DataTable> {
        self.data_tables
            .get(&class.name)
            .cloned()
            .unwrap_or_default()
    }

    fn marker(&self, method: &TestMethod) -> MethodMarker {
        self.markers.get(&method.key()).copied().unwrap_or_default()
    }

    fn display_name_override(
        &self,
        method: &TestMethod,
    ) -> Result<Option<String>, DisplayNameError> {
        Ok(self.display_names.get(&method.key()).cloned())
    }
}

/// Wraps an [`AnnotationsOracle`], querying it at most once per method.
///
/// Failures to resolve a display name are logged and remembered as "no custom
/// display name".
#[derive(Debug)]
pub struct CachedAnnotations<O> {
    inner: O,
    markers: Mutex<HashMap<String, MethodMarker>>,
    display_names: Mutex<HashMap<String, Option<String>>>,
}

impl<O: AnnotationsOracle> CachedAnnotations<O> {
    /// Wraps an oracle.
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            markers: Mutex::new(HashMap::new()),
            display_names: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the wrapped oracle.
    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Returns the display name override, treating failures as absent.
    pub fn display_name(&self, method: &TestMethod) -> Option<String> {
        let mut cache = self
            .display_names
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        cache
            .entry(method.signature())
            .or_insert_with(|| match self.inner.display_name_override(method) {
                Ok(name) => name,
                Err(error) => {
                    debug!("ignoring display name failure: {error}");
                    None
                }
            })
            .clone()
    }

    /// Forgets everything cached so far.
    pub fn clear(&self) {
        self.markers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.display_names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<O: AnnotationsOracle> AnnotationsOracle for CachedAnnotations<O> {
    fn data_tables_for(&self, class: &TestClass) -> IndexMap<MethodKey, DataTable> {
        self.inner.data_tables_for(class)
    }

    fn marker(&self, method: &TestMethod) -> MethodMarker {
        *self
            .markers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(method.signature())
            .or_insert_with(|| self.inner.marker(method))
    }

    fn display_name_override(
        &self,
        method: &TestMethod,
    ) -> Result<Option<String>, DisplayNameError> {
        Ok(self.display_name(method))
    }
}
