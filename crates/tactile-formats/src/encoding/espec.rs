//! `ESpec` string table

/// `ESpec` table for compression specifications
///
/// The block after the header holds NUL-terminated strings; encoding key
/// records refer to them by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EspecTable {
    /// List of `ESpec` compression specification strings
    pub entries: Vec<String>,
}

impl EspecTable {
    /// Parse `ESpec` table from raw bytes
    pub fn parse(data: &[u8]) -> Self {
        let mut entries: Vec<String> = data
            .split(|&b| b == 0)
            .map(|spec| String::from_utf8_lossy(spec).into_owned())
            .collect();

        // The final terminator leaves an empty remainder
        if entries.last().is_some_and(String::is_empty) {
            entries.pop();
        }

        Self { entries }
    }

    /// Get `ESpec` string by index
    pub fn get(&self, index: u32) -> Option<&str> {
        self.entries.get(index as usize).map(String::as_str)
    }

    /// Number of strings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_positions() {
        let table = EspecTable::parse(b"n\0z\0b:{256K*=z}\0");
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0), Some("n"));
        assert_eq!(table.get(2), Some("b:{256K*=z}"));
        assert_eq!(table.get(3), None);
    }

    #[test]
    fn test_parse_unterminated_and_empty() {
        assert_eq!(EspecTable::parse(b"n\0z").entries, vec!["n", "z"]);
        assert!(EspecTable::parse(b"").is_empty());
    }
}
