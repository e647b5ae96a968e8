// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{MethodKey, PlanBuildError, TestClass};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{
    collections::{BTreeMap, btree_map},
    fmt,
};

/// The unique ID of a node in the test tree, as assigned by the runner.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniqueId(SmolStr);

impl UniqueId {
    /// Creates a new unique ID.
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a node in the test tree groups other nodes or is executed itself.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestKind {
    /// A node that groups other nodes, typically a test class.
    Container,

    /// An executable test with no children.
    Test,
}

/// Where a node in the test tree was declared.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TestSource {
    /// The node corresponds to a class.
    Class(ClassSource),

    /// The node corresponds to a method.
    Method(MethodSource),
}

/// A [`TestSource`] pointing at a class.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClassSource {
    /// The fully qualified class name.
    pub class_name: SmolStr,
}

impl ClassSource {
    /// Creates a new class source.
    pub fn new(class_name: impl Into<SmolStr>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }
}

/// A [`TestSource`] pointing at a method.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MethodSource {
    /// The fully qualified name of the class declaring the method.
    pub class_name: SmolStr,

    /// The name of the method.
    pub method_name: SmolStr,

    /// Comma-separated parameter type names, e.g. `int, java.lang.String`.
    ///
    /// `None` means the runner did not report parameter types.
    #[serde(default)]
    pub parameter_types: Option<String>,
}

impl MethodSource {
    /// Creates a new method source without parameter type information.
    pub fn new(class_name: impl Into<SmolStr>, method_name: impl Into<SmolStr>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            parameter_types: None,
        }
    }

    /// Sets the comma-separated parameter type names.
    pub fn with_parameter_types(mut self, parameter_types: impl Into<String>) -> Self {
        self.parameter_types = Some(parameter_types.into());
        self
    }

    /// Returns the key used to look up data tables for this method.
    pub fn method_key(&self) -> MethodKey {
        MethodKey::new(&self.class_name, &self.method_name)
    }
}

/// A node in the test tree.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestIdentifier {
    /// The unique ID of this node.
    pub unique_id: UniqueId,

    /// The unique ID of the parent node, or `None` for roots.
    #[serde(default)]
    pub parent_id: Option<UniqueId>,

    /// Whether this is a container or a test.
    pub kind: TestKind,

    /// The human-readable name the runner shows for this node.
    #[serde(default)]
    pub display_name: String,

    /// Where this node was declared, if known.
    #[serde(default)]
    pub source: Option<TestSource>,
}

impl TestIdentifier {
    /// Creates a container node.
    pub fn container(unique_id: impl Into<SmolStr>, display_name: impl Into<String>) -> Self {
        Self::new(unique_id, TestKind::Container, display_name)
    }

    /// Creates a test node.
    pub fn test(unique_id: impl Into<SmolStr>, display_name: impl Into<String>) -> Self {
        Self::new(unique_id, TestKind::Test, display_name)
    }

    fn new(unique_id: impl Into<SmolStr>, kind: TestKind, display_name: impl Into<String>) -> Self {
        Self {
            unique_id: UniqueId::new(unique_id),
            parent_id: None,
            kind,
            display_name: display_name.into(),
            source: None,
        }
    }

    /// Sets the parent of this node.
    pub fn with_parent(mut self, parent_id: impl Into<SmolStr>) -> Self {
        self.parent_id = Some(UniqueId::new(parent_id));
        self
    }

    /// Sets the source of this node.
    pub fn with_source(mut self, source: TestSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Returns true if this node groups other nodes.
    pub fn is_container(&self) -> bool {
        self.kind == TestKind::Container
    }

    /// Returns true if this node is an executable test.
    pub fn is_test(&self) -> bool {
        self.kind == TestKind::Test
    }

    /// Returns the class source, if this node was declared by a class.
    pub fn class_source(&self) -> Option<&ClassSource> {
        match &self.source {
            Some(TestSource::Class(source)) => Some(source),
            _ => None,
        }
    }

    /// Returns the method source, if this node was declared by a method.
    pub fn method_source(&self) -> Option<&MethodSource> {
        match &self.source {
            Some(TestSource::Method(source)) => Some(source),
            _ => None,
        }
    }
}

/// The tree of tests a runner is about to execute, along with the declarations
/// of every class it references.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TestPlanRepr", into = "TestPlanRepr")]
pub struct TestPlan {
    identifiers: BTreeMap<UniqueId, TestIdentifier>,
    // Insertion order of identifiers, to keep children in discovery order.
    order: Vec<UniqueId>,
    classes: BTreeMap<SmolStr, TestClass>,
}

impl TestPlan {
    /// Creates a new, empty test plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a test plan from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Adds a class declaration to the plan.
    pub fn add_class(&mut self, class: TestClass) -> Result<&mut Self, PlanBuildError> {
        match self.classes.entry(class.name.clone()) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(class);
            }
            btree_map::Entry::Occupied(entry) => {
                return Err(PlanBuildError::DuplicateClass {
                    class_name: entry.key().clone(),
                });
            }
        }
        Ok(self)
    }

    /// Adds a node to the plan. The parent, if any, must already be present.
    pub fn add_identifier(
        &mut self,
        identifier: TestIdentifier,
    ) -> Result<&mut Self, PlanBuildError> {
        if let Some(parent_id) = &identifier.parent_id {
            if !self.identifiers.contains_key(parent_id) {
                return Err(PlanBuildError::UnknownParent {
                    unique_id: identifier.unique_id.clone(),
                    parent_id: parent_id.clone(),
                });
            }
        }
        match self.identifiers.entry(identifier.unique_id.clone()) {
            btree_map::Entry::Vacant(entry) => {
                self.order.push(identifier.unique_id.clone());
                entry.insert(identifier);
            }
            btree_map::Entry::Occupied(entry) => {
                return Err(PlanBuildError::DuplicateIdentifier {
                    unique_id: entry.key().clone(),
                });
            }
        }
        Ok(self)
    }

    /// Looks up a node by its unique ID.
    pub fn identifier(&self, unique_id: &UniqueId) -> Option<&TestIdentifier> {
        self.identifiers.get(unique_id)
    }

    /// Returns all nodes in the order they were added.
    pub fn identifiers(&self) -> impl Iterator<Item = &TestIdentifier> + '_ {
        self.order.iter().filter_map(|id| self.identifiers.get(id))
    }

    /// Returns the root nodes of the plan.
    pub fn roots(&self) -> impl Iterator<Item = &TestIdentifier> + '_ {
        self.identifiers().filter(|id| id.parent_id.is_none())
    }

    /// Returns the direct children of the given node.
    pub fn children<'a>(
        &'a self,
        parent_id: &'a UniqueId,
    ) -> impl Iterator<Item = &'a TestIdentifier> + 'a {
        self.identifiers()
            .filter(move |id| id.parent_id.as_ref() == Some(parent_id))
    }

    /// Looks up a class declaration by name.
    pub fn class(&self, name: &str) -> Option<&TestClass> {
        self.classes.get(name)
    }

    /// Returns every class declaration referenced by the plan.
    pub fn classes(&self) -> impl Iterator<Item = &TestClass> + '_ {
        self.classes.values()
    }

    /// Returns the number of containers in the plan.
    pub fn container_count(&self) -> usize {
        self.identifiers.values().filter(|id| id.is_container()).count()
    }

    /// Returns the number of tests in the plan.
    pub fn test_count(&self) -> usize {
        self.identifiers.values().filter(|id| id.is_test()).count()
    }
}

/// Serialized form of a [`TestPlan`]: class declarations, then nodes with
/// parents listed before their children.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TestPlanRepr {
    #[serde(default)]
    classes: Vec<TestClass>,
    #[serde(default)]
    identifiers: Vec<TestIdentifier>,
}

impl TryFrom<TestPlanRepr> for TestPlan {
    type Error = PlanBuildError;

    fn try_from(repr: TestPlanRepr) -> Result<Self, Self::Error> {
        let mut plan = TestPlan::new();
        for class in repr.classes {
            plan.add_class(class)?;
        }
        for identifier in repr.identifiers {
            plan.add_identifier(identifier)?;
        }
        Ok(plan)
    }
}

impl From<TestPlan> for TestPlanRepr {
    fn from(mut plan: TestPlan) -> Self {
        let identifiers = plan
            .order
            .iter()
            .filter_map(|id| plan.identifiers.remove(id))
            .collect();
        Self {
            classes: plan.classes.into_values().collect(),
            identifiers,
        }
    }
}
