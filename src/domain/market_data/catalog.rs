use super::entities::SymbolRecord;

/// Read-only snapshot of the tradable instruments handed to the feed
#[derive(Debug, Clone, Default)]
pub struct SymbolCatalog {
    records: Vec<SymbolRecord>,
}

impl SymbolCatalog {
    pub fn new(records: Vec<SymbolRecord>) -> Self {
        Self { records }
    }

    /// First record whose displayed ticker equals `ticker` exactly
    pub fn find(&self, ticker: &str) -> Option<&SymbolRecord> {
        self.records.iter().find(|record| record.symbol == ticker)
    }

    /// Case-insensitive substring match on ticker, base and quote, in catalog order
    pub fn search<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a SymbolRecord> + 'a {
        let needle = query.trim().to_uppercase();
        self.records.iter().filter(move |record| {
            needle.is_empty()
                || record.symbol.to_uppercase().contains(&needle)
                || record.base.to_uppercase().contains(&needle)
                || record.quote.to_uppercase().contains(&needle)
        })
    }

    /// First ticker that appears more than once
    pub fn first_duplicate(&self) -> Option<&str> {
        self.records.iter().enumerate().find_map(|(idx, record)| {
            self.records[..idx]
                .iter()
                .any(|earlier| earlier.symbol == record.symbol)
                .then_some(record.symbol.as_str())
        })
    }
}
