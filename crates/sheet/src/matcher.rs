//! Identifier-based row matching.

use std::collections::HashMap;

use tablesync_core::{RecordSet, SyncError, SyncResult};

/// Lookup from identity tuple to 1-based destination row number.
#[derive(Debug, Clone, Default)]
pub struct RowIndex {
    slots: HashMap<Vec<String>, u32>,
}

impl RowIndex {
    /// Index the destination's data rows by `fields`.
    ///
    /// `rows` excludes the header row, so data row `i` lives on sheet row
    /// `i + 2`. Cells past the end of a short row count as `""`. When two
    /// rows share an identity the later one owns the slot.
    pub fn build(headers: &[String], rows: &[Vec<String>], fields: &[String]) -> SyncResult<Self> {
        let columns = fields
            .iter()
            .map(|field| {
                headers
                    .iter()
                    .position(|h| h == field)
                    .ok_or_else(|| SyncError::IdentifierFieldNotFound {
                        field: field.clone(),
                    })
            })
            .collect::<SyncResult<Vec<usize>>>()?;

        let mut slots = HashMap::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let identity = columns
                .iter()
                .map(|&col| row.get(col).cloned().unwrap_or_default())
                .collect();
            slots.insert(identity, idx as u32 + 2);
        }

        Ok(Self { slots })
    }

    pub fn get(&self, identity: &[String]) -> Option<u32> {
        self.slots.get(identity).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Incoming rows split by whether they match a destination row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// `(sheet row number, incoming row index)` in incoming order.
    pub matched: Vec<(u32, usize)>,
    /// Incoming row indexes without a match, in incoming order.
    pub unmatched: Vec<usize>,
}

/// Probe `index` with each incoming row's identity.
///
/// Identities come from the incoming headers, so the input's column order
/// is irrelevant. Matching is exact string equality.
pub fn classify(records: &RecordSet, fields: &[String], index: &RowIndex) -> Classification {
    let mut result = Classification::default();
    for row in 0..records.len() {
        let identity = records.identity(row, fields.iter().map(String::as_str));
        match index.get(&identity) {
            Some(row_number) => result.matched.push((row_number, row)),
            None => result.unmatched.push(row),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_row_numbers_skip_header() {
        let index = RowIndex::build(
            &strings(&["id", "name"]),
            &[strings(&["1", "Ann"]), strings(&["2", "Ben"])],
            &strings(&["id"]),
        )
        .unwrap();
        assert_eq!(index.get(&strings(&["1"])), Some(2));
        assert_eq!(index.get(&strings(&["2"])), Some(3));
        assert_eq!(index.get(&strings(&["3"])), None);
    }

    #[test]
    fn test_missing_identifier_field() {
        let err = RowIndex::build(&strings(&["id"]), &[], &strings(&["id", "email"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Identifier field 'email' not found in sheet headers"
        );
    }

    #[test]
    fn test_short_rows_contribute_empty_cells() {
        let index = RowIndex::build(
            &strings(&["first", "last"]),
            &[strings(&["Ada"])],
            &strings(&["first", "last"]),
        )
        .unwrap();
        assert_eq!(index.get(&strings(&["Ada", ""])), Some(2));
    }

    #[test]
    fn test_duplicate_identity_last_row_wins() {
        let index = RowIndex::build(
            &strings(&["id"]),
            &[strings(&["7"]), strings(&["7"])],
            &strings(&["id"]),
        )
        .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&strings(&["7"])), Some(3));
    }

    #[test]
    fn test_classify_uses_incoming_column_order() {
        let index = RowIndex::build(
            &strings(&["id", "name"]),
            &[strings(&["1", "Ann"])],
            &strings(&["id"]),
        )
        .unwrap();
        let records = RecordSet::new(
            strings(&["name", "id"]),
            vec![strings(&["Alice", "1"]), strings(&["Bob", "2"])],
        );
        let result = classify(&records, &strings(&["id"]), &index);
        assert_eq!(result.matched, vec![(2, 0)]);
        assert_eq!(result.unmatched, vec![1]);
    }

    #[test]
    fn test_matching_is_exact() {
        let index = RowIndex::build(
            &strings(&["email"]),
            &[strings(&["ann@example.com"])],
            &strings(&["email"]),
        )
        .unwrap();
        let records = RecordSet::new(
            strings(&["email"]),
            vec![
                strings(&["Ann@example.com"]),
                strings(&[" ann@example.com"]),
                strings(&["ann@example.com"]),
            ],
        );
        let result = classify(&records, &strings(&["email"]), &index);
        assert_eq!(result.matched, vec![(2, 2)]);
        assert_eq!(result.unmatched, vec![0, 1]);
    }
}
