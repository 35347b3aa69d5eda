//! Header-driven parsing of comma-separated text.
//!
//! Deliberately minimal: one comma separates fields, there is no quoting
//! or escaping, and a field containing a comma shifts the rest of its row.
//! Malformed input yields malformed rows, never an error.

use std::rc::Rc;

/// One data line keyed by the header line.
#[derive(Debug, Clone)]
pub struct Row {
    headers: Rc<[String]>,
    values: Vec<Option<String>>,
}

impl Row {
    /// Raw value for a column. `None` when the column is unknown or the line
    /// was too short to reach it. A repeated header resolves to its last
    /// occurrence.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = self.headers.iter().rposition(|h| h == column)?;
        self.values[idx].as_deref()
    }

    /// Like [`Row::get`] but treats an empty string as absent.
    pub fn non_empty(&self, column: &str) -> Option<&str> {
        self.get(column).filter(|v| !v.is_empty())
    }

    /// Number of entries, always equal to the header count.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(|v| v.as_deref()))
    }
}

/// Parse `text` into rows. The first line is the header; surrounding
/// whitespace of the whole text is ignored. Short lines pad with `None`,
/// long lines drop their extra fields.
pub fn parse(text: &str) -> Vec<Row> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.trim().as_bytes());

    let mut records = rdr.records();
    let headers: Rc<[String]> = loop {
        match records.next() {
            Some(Ok(record)) => break record.iter().map(str::to_string).collect(),
            Some(Err(_)) => continue,
            None => return Vec::new(),
        }
    };

    let mut rows = Vec::new();
    for result in records {
        let Ok(record) = result else { continue };
        let values = (0..headers.len())
            .map(|i| record.get(i).map(str::to_string))
            .collect();
        rows.push(Row {
            headers: Rc::clone(&headers),
            values,
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows_in_order() {
        let rows = parse("account_id,merchant_name,amount\nacc_1,Cafe,4.50\nacc_2,Grocer,61.20\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("merchant_name"), Some("Cafe"));
        assert_eq!(rows[1].get("amount"), Some("61.20"));
        let keys: Vec<&str> = rows[0].iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["account_id", "merchant_name", "amount"]);
    }

    #[test]
    fn test_every_row_has_one_entry_per_header() {
        let text = "a,b,c,d\n1,2,3,4\n5,6\n7,8,9,10,11,12\n";
        let rows = parse(text);
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.len(), 4);
        }
    }

    #[test]
    fn test_short_line_pads_with_none() {
        let rows = parse("a,b,c\n1,2");
        assert_eq!(rows[0].get("b"), Some("2"));
        assert_eq!(rows[0].get("c"), None);
    }

    #[test]
    fn test_long_line_drops_extra_fields() {
        let rows = parse("a,b\n1,2,3,4");
        let values: Vec<Option<&str>> = rows[0].iter().map(|(_, v)| v).collect();
        assert_eq!(values, vec![Some("1"), Some("2")]);
    }

    #[test]
    fn test_no_quoting_support() {
        let rows = parse("name,amount\n\"Shop, Inc\",12.00");
        assert_eq!(rows[0].get("name"), Some("\"Shop"));
        assert_eq!(rows[0].get("amount"), Some(" Inc\""));
    }

    #[test]
    fn test_header_only_and_empty_text() {
        assert!(parse("a,b,c").is_empty());
        assert!(parse("").is_empty());
        assert!(parse("   \n  ").is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let rows = parse("a,b\r\n1,2\r\n3,4\r\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("b"), Some("4"));
    }

    #[test]
    fn test_empty_field_is_present_but_non_empty_filters_it() {
        let rows = parse("nickname,product_name\n,Sapphire");
        assert_eq!(rows[0].get("nickname"), Some(""));
        assert_eq!(rows[0].non_empty("nickname"), None);
        assert_eq!(rows[0].non_empty("product_name"), Some("Sapphire"));
    }

    #[test]
    fn test_unknown_column() {
        let rows = parse("a\n1");
        assert_eq!(rows[0].get("zzz"), None);
    }

    #[test]
    fn test_repeated_header_resolves_to_last() {
        let rows = parse("a,a\n1,2");
        assert_eq!(rows[0].get("a"), Some("2"));
    }
}
