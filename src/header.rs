use std::collections::HashMap;

use crate::format::Format;
use crate::{CsvError, CsvResult};

/// Ordered name-to-column-index mapping, shared read-only (behind an `Arc`)
/// by every record produced after it is built. Never mutated once the first
/// record has been issued.
///
/// `names` keeps every column position in order, including blanks and
/// duplicates; `index` holds only the addressable names. With duplicates
/// permitted, the last occurrence of a name wins the map entry while earlier
/// ones still occupy their column positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headers {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Headers {
    /// Build the mapping from an ordered name list, enforcing the format's
    /// duplicate and blank-name policies.
    pub fn from_names<I, S>(names: I, format: &Format) -> CsvResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                if !format.allow_missing_column_names {
                    return Err(CsvError::InvalidHeader(format!(
                        "column {} has no name",
                        i + 1
                    )));
                }
                continue;
            }
            if index.insert(name.clone(), i).is_some() && !format.allow_duplicate_headers {
                return Err(CsvError::DuplicateHeader(name.clone()));
            }
        }
        Ok(Self { names, index })
    }

    /// Column index for `name`, if mapped.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of column positions, blanks and duplicates included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All column names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The addressable (name, index) pairs, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, usize)> {
        self.index.iter().map(|(n, &i)| (n.as_str(), i))
    }
}
