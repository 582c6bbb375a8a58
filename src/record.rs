use std::collections::HashMap;
use std::sync::Arc;

use crate::header::Headers;
use crate::{CsvError, CsvResult};

/// One delimited value plus its was-quoted flag. Owned by the record that
/// contains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    value: String,
    quoted: bool,
}

impl Field {
    pub(crate) fn new(value: String, quoted: bool) -> Self {
        Self { value, quoted }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The field was enclosed in quote characters in the source.
    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    pub(crate) fn into_value(self) -> String {
        self.value
    }
}

/// One assembled record: an ordered group of fields, its 1-based record
/// number, the character offset of its first field in the source, and a
/// shared reference to the header mapping active when it was produced.
///
/// Immutable once assembled. Short and long records (relative to the header
/// width) are legal; [`Record::is_consistent`] exposes the check.
#[derive(Debug, Clone)]
pub struct Record {
    fields: Vec<Field>,
    number: u64,
    offset: u64,
    headers: Option<Arc<Headers>>,
}

impl Record {
    pub(crate) fn new(
        fields: Vec<Field>,
        number: u64,
        offset: u64,
        headers: Option<Arc<Headers>>,
    ) -> Self {
        Self {
            fields,
            number,
            offset,
            headers,
        }
    }

    /// Field value at `index`.
    pub fn get(&self, index: usize) -> CsvResult<&str> {
        self.fields
            .get(index)
            .map(|f| f.value())
            .ok_or(CsvError::OutOfRange {
                index,
                len: self.fields.len(),
            })
    }

    /// Field value for the column named `name`.
    ///
    /// Fails with `NoHeader` when no header mapping exists, `UnmappedName`
    /// when the header has no such column, and `InconsistentRecord` when the
    /// column's index lies beyond this record's length (a short record is
    /// never silently padded).
    pub fn get_named(&self, name: &str) -> CsvResult<&str> {
        let headers = self.headers.as_ref().ok_or(CsvError::NoHeader)?;
        let index = headers
            .get(name)
            .ok_or_else(|| CsvError::UnmappedName(name.to_string()))?;
        self.fields
            .get(index)
            .map(|f| f.value())
            .ok_or_else(|| CsvError::InconsistentRecord {
                name: name.to_string(),
                index,
                len: self.fields.len(),
            })
    }

    /// Whether this record's width matches the header width. Without a
    /// header consistency is only trivially defined: an empty record is
    /// consistent, a non-empty one is not.
    pub fn is_consistent(&self) -> bool {
        match &self.headers {
            Some(h) => self.fields.len() == h.len(),
            None => self.fields.is_empty(),
        }
    }

    /// Whether a header exists and maps `name` to some column.
    pub fn is_mapped(&self, name: &str) -> bool {
        self.headers.as_ref().is_some_and(|h| h.contains(name))
    }

    /// Whether `name` is mapped and its column lies within this record.
    pub fn is_set(&self, name: &str) -> bool {
        self.headers
            .as_ref()
            .and_then(|h| h.get(name))
            .is_some_and(|i| i < self.fields.len())
    }

    /// Fresh name-to-value map for every header name whose column lies
    /// within this record; names beyond a short record are omitted, not set
    /// to empty. No header yields an empty map.
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        self.copy_into(&mut map);
        map
    }

    /// Same population rule as [`Record::to_map`], written into a
    /// caller-supplied collection.
    pub fn copy_into<M>(&self, map: &mut M)
    where
        M: Extend<(String, String)>,
    {
        if let Some(headers) = &self.headers {
            map.extend(headers.entries().filter_map(|(name, i)| {
                self.fields
                    .get(i)
                    .map(|f| (name.to_string(), f.value().to_string()))
            }));
        }
    }

    /// Field values in column order. Each call yields a fresh traversal.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.value())
    }

    /// The fields themselves, with quoting metadata.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 1-based record number, strictly increasing within a parse session.
    /// Skipped lines (comments, ignored empty lines, a consumed header) do
    /// not take a number.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Character offset of the record's first field in the source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn headers(&self) -> Option<&Headers> {
        self.headers.as_deref()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a str;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, Field>, fn(&'a Field) -> &'a str>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter().map(Field::value as fn(&'a Field) -> &'a str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;

    fn fields(values: &[&str]) -> Vec<Field> {
        values
            .iter()
            .map(|v| Field::new(v.to_string(), false))
            .collect()
    }

    fn headers(names: &[&str]) -> Arc<Headers> {
        Arc::new(Headers::from_names(names.iter().copied(), &Format::default()).unwrap())
    }

    fn record() -> Record {
        Record::new(fields(&["A", "B", "C"]), 1, 0, None)
    }

    fn record_with_header() -> Record {
        Record::new(
            fields(&["A", "B", "C"]),
            1,
            0,
            Some(headers(&["first", "second", "third"])),
        )
    }

    #[test]
    fn get_by_index() {
        let r = record();
        assert_eq!(r.get(0).unwrap(), "A");
        assert_eq!(r.get(1).unwrap(), "B");
        assert_eq!(r.get(2).unwrap(), "C");
    }

    #[test]
    fn get_out_of_range() {
        let r = record();
        assert!(matches!(
            r.get(3),
            Err(CsvError::OutOfRange { index: 3, len: 3 })
        ));
        assert!(matches!(r.get(usize::MAX), Err(CsvError::OutOfRange { .. })));
    }

    #[test]
    fn get_by_name() {
        let r = record_with_header();
        assert_eq!(r.get_named("first").unwrap(), "A");
        assert_eq!(r.get_named("second").unwrap(), "B");
        assert_eq!(r.get_named("third").unwrap(), "C");
    }

    #[test]
    fn get_by_name_without_header() {
        let r = record();
        assert!(matches!(r.get_named("first"), Err(CsvError::NoHeader)));
    }

    #[test]
    fn get_unmapped_name() {
        let r = record_with_header();
        assert!(matches!(
            r.get_named("fourth"),
            Err(CsvError::UnmappedName(name)) if name == "fourth"
        ));
    }

    #[test]
    fn get_name_beyond_short_record() {
        let r = Record::new(
            fields(&["A", "B"]),
            1,
            0,
            Some(headers(&["first", "second", "third"])),
        );
        assert!(matches!(
            r.get_named("third"),
            Err(CsvError::InconsistentRecord {
                name,
                index: 2,
                len: 2
            }) if name == "third"
        ));
    }

    #[test]
    fn consistency() {
        assert!(record_with_header().is_consistent());
        let short = Record::new(
            fields(&["A", "B"]),
            1,
            0,
            Some(headers(&["first", "second", "third"])),
        );
        assert!(!short.is_consistent());
        // Without a header, only the empty record is trivially consistent.
        assert!(!record().is_consistent());
        assert!(Record::new(Vec::new(), 1, 0, None).is_consistent());
    }

    #[test]
    fn is_mapped_and_is_set() {
        let r = record_with_header();
        assert!(r.is_mapped("first"));
        assert!(!r.is_mapped("fourth"));
        assert!(r.is_set("first"));
        assert!(!r.is_set("fourth"));
        assert!(!record().is_mapped("first"));
        assert!(!record().is_set("first"));

        let short = Record::new(
            fields(&["A"]),
            1,
            0,
            Some(headers(&["first", "second"])),
        );
        assert!(short.is_mapped("second"));
        assert!(!short.is_set("second"));
    }

    #[test]
    fn to_map() {
        let map = record_with_header().to_map();
        assert_eq!(map.len(), 3);
        assert_eq!(map["first"], "A");
        assert_eq!(map["second"], "B");
        assert_eq!(map["third"], "C");
    }

    #[test]
    fn to_map_omits_names_beyond_short_record() {
        let short = Record::new(
            fields(&["A", "B"]),
            1,
            0,
            Some(headers(&["first", "second", "third"])),
        );
        let map = short.to_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["first"], "A");
        assert_eq!(map["second"], "B");
        assert!(!map.contains_key("third"));
    }

    #[test]
    fn to_map_without_header_is_empty() {
        assert!(record().to_map().is_empty());
    }

    #[test]
    fn to_map_is_idempotent() {
        let r = record_with_header();
        assert_eq!(r.to_map(), r.to_map());
    }

    #[test]
    fn copy_into_matches_to_map() {
        let r = record_with_header();
        let mut a: HashMap<String, String> = HashMap::new();
        let mut b: std::collections::BTreeMap<String, String> = Default::default();
        r.copy_into(&mut a);
        r.copy_into(&mut b);
        assert_eq!(a, r.to_map());
        assert_eq!(b.len(), a.len());
        assert_eq!(b["third"], "C");
    }

    #[test]
    fn iteration_is_restartable() {
        let r = record_with_header();
        let once: Vec<&str> = r.iter().collect();
        let twice: Vec<&str> = r.iter().collect();
        assert_eq!(once, ["A", "B", "C"]);
        assert_eq!(once, twice);
        let via_ref: Vec<&str> = (&r).into_iter().collect();
        assert_eq!(via_ref, once);
    }
}
