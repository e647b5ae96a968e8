// Copyright (c) The stepbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Example tables for data-driven tests, and the registry they are loaded into
//! at the start of a test plan.

use crate::errors::DataTableShapeError;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use stepbridge_metadata::MethodKey;

/// An ordered table of example rows driving repeated invocations of one test
/// method.
///
/// Immutable once built.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<DataTableRow>,
}

impl DataTable {
    /// Builds a table from its headers and raw rows.
    ///
    /// Every row must have exactly one value per header.
    pub fn new<H, R, V>(headers: H, rows: R) -> Result<Self, DataTableShapeError>
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator,
        R::Item: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                let values: Vec<String> = row.into_iter().map(Into::into).collect();
                if values.len() != headers.len() {
                    return Err(DataTableShapeError::new(index, headers.len(), values.len()));
                }
                Ok(DataTableRow {
                    values: headers.iter().cloned().zip(values).collect(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { headers, rows })
    }

    /// Returns the column headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Returns all rows.
    pub fn rows(&self) -> &[DataTableRow] {
        &self.rows
    }

    /// Returns the row at `index`, or `None` past the end of the table.
    pub fn row(&self, index: usize) -> Option<&DataTableRow> {
        self.rows.get(index)
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Deserialize)]
struct DataTableDeserialize {
    headers: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<String>>,
}

// Deserialize through the raw shape so malformed rows are rejected.
impl<'de> Deserialize<'de> for DataTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = DataTableDeserialize::deserialize(deserializer)?;
        DataTable::new(raw.headers, raw.rows).map_err(serde::de::Error::custom)
    }
}

/// A single row of a [`DataTable`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DataTableRow {
    values: IndexMap<String, String>,
}

impl DataTableRow {
    /// Returns the value for the given parameter name.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.values.get(header).map(String::as_str)
    }

    /// Returns the row as a map from parameter name to value, in header order.
    pub fn as_map(&self) -> &IndexMap<String, String> {
        &self.values
    }
}

/// Data tables for every data-driven method in the plan, keyed by
/// `<className>.<methodName>`.
///
/// Populated when a test plan starts and read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct DataTableRegistry {
    tables: IndexMap<MethodKey, DataTable>,
}

impl DataTableRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the tables of one class. Tables already registered for a method are
    /// replaced.
    pub fn merge(&mut self, tables: impl IntoIterator<Item = (MethodKey, DataTable)>) {
        self.tables.extend(tables);
    }

    /// Returns the table registered for the method, if any.
    pub fn get(&self, key: &MethodKey) -> Option<&DataTable> {
        self.tables.get(key)
    }

    /// Returns true if no tables are registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns the number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub(crate) fn clear(&mut self) {
        self.tables.clear();
    }
}
