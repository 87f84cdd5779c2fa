//! Field selection and per-item field maps
//!
//! Beefweb answers column requests positionally: the `columns` array of an
//! item holds one formatted value per requested title-format expression, in
//! request order. A [`FieldSelection`] fixes that order together with the
//! caller-chosen output name for each expression, and a [`FieldMap`] pairs the
//! returned values back up with those names.

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use crate::error::{ApiError, Result};

/// Title-format expressions requested when the caller does not choose any
pub const DEFAULT_FIELDS: [(&str, &str); 9] = [
    ("%album artist%", "album_artist"),
    ("%album%", "album"),
    ("%artist%", "artist"),
    ("%length%", "length"),
    ("%length_seconds%", "length_seconds"),
    ("%path%", "path"),
    ("%title%", "title"),
    ("%track artist%", "track_artist"),
    ("%track number%", "track_number"),
];

/// Ordered mapping from upstream field identifier to output name
///
/// Construction rejects duplicate identifiers, duplicate output names and
/// reserved output names (empty, or starting with `_`), so a built selection
/// always yields well-formed [`FieldMap`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    ids: Vec<String>,
    names: Arc<[String]>,
}

impl FieldSelection {
    /// Build a selection from `(upstream id, output name)` pairs
    pub fn new<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut ids: Vec<String> = Vec::new();
        let mut names: Vec<String> = Vec::new();

        for (id, name) in pairs {
            let id = id.into();
            let name = name.into();

            if id.is_empty() {
                return Err(ApiError::UsageError("empty field identifier".to_string()));
            }
            if is_reserved_name(&name) {
                return Err(ApiError::UsageError(format!(
                    "'{name}' is a reserved field name"
                )));
            }
            if ids.contains(&id) {
                return Err(ApiError::UsageError(format!(
                    "field '{id}' selected more than once"
                )));
            }
            if names.contains(&name) {
                return Err(ApiError::UsageError(format!(
                    "output name '{name}' used more than once"
                )));
            }

            ids.push(id);
            names.push(name);
        }

        Ok(Self {
            ids,
            names: names.into(),
        })
    }

    /// Build a selection whose output names equal the upstream identifiers
    pub fn from_ids<I, S>(ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ids.into_iter().map(|id| {
            let id = id.into();
            (id.clone(), id)
        }))
    }

    /// Upstream identifiers in request order
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Output names in request order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Comma-joined identifiers, as sent in `columns`/`trcolumns`/`plcolumns`
    pub fn query_value(&self) -> String {
        self.ids.join(",")
    }

    /// Pair a positional `columns` array with this selection's names
    ///
    /// Extra trailing values are ignored; fewer values than selected fields
    /// is a malformed payload.
    pub fn map_columns(&self, mut columns: Vec<String>) -> Result<FieldMap> {
        if columns.len() < self.names.len() {
            return Err(ApiError::MalformedPayload(format!(
                "expected {} columns, got {}",
                self.names.len(),
                columns.len()
            )));
        }
        columns.truncate(self.names.len());

        Ok(FieldMap {
            names: Arc::clone(&self.names),
            values: columns,
        })
    }
}

impl Default for FieldSelection {
    fn default() -> Self {
        Self {
            ids: DEFAULT_FIELDS.iter().map(|(id, _)| id.to_string()).collect(),
            names: DEFAULT_FIELDS
                .iter()
                .map(|(_, name)| name.to_string())
                .collect::<Vec<_>>()
                .into(),
        }
    }
}

fn is_reserved_name(name: &str) -> bool {
    name.trim().is_empty() || name.starts_with('_')
}

/// Requested metadata for one item, addressable by output name or position
#[derive(Clone, PartialEq, Eq)]
pub struct FieldMap {
    names: Arc<[String]>,
    values: Vec<String>,
}

impl FieldMap {
    /// Value for an output name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i].as_str())
    }

    /// Value at a position in selection order
    pub fn get_index(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(name, value)` pairs in selection order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

impl Index<usize> for FieldMap {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.values[index]
    }
}

impl fmt::Debug for FieldMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
