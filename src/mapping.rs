use std::collections::{HashMap, HashSet};

/// The canonical transaction fields a source column can map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    Amount,
    Description,
    Merchant,
    Category,
    Account,
}

impl Field {
    /// All fields, in resolution priority order: required fields first so
    /// they get first pick of the headers.
    pub const ALL: [Field; 6] = [
        Field::Date,
        Field::Amount,
        Field::Description,
        Field::Merchant,
        Field::Category,
        Field::Account,
    ];

    pub const REQUIRED: [Field; 3] = [Field::Date, Field::Amount, Field::Description];

    pub fn key(&self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Amount => "amount",
            Field::Description => "description",
            Field::Merchant => "merchant",
            Field::Category => "category",
            Field::Account => "account",
        }
    }

    /// Substring keywords matched against lower-cased headers, English and
    /// Vietnamese (accented and unaccented) since both appear in the wild.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Field::Date => &["date", "ngày", "ngay", "thời gian", "thoi gian"],
            Field::Amount => &["amount", "số tiền", "so tien", "giá trị", "gia tri", "sum"],
            Field::Description => &[
                "desc", "memo", "narrative", "detail", "mô tả", "mo ta", "diễn giải",
                "dien giai", "nội dung", "noi dung",
            ],
            Field::Merchant => &[
                "merchant", "payee", "vendor", "counterparty", "đối tác", "doi tac",
                "người nhận", "nguoi nhan",
            ],
            Field::Category => &["category", "danh mục", "danh muc", "loại", "loai"],
            Field::Account => &["account", "tài khoản", "tai khoan"],
        }
    }
}

/// Canonical field -> source header. Unset means unmapped. Every set header
/// is guaranteed to exist in the table it was resolved against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMapping {
    assignments: HashMap<Field, String>,
}

impl ColumnMapping {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.assignments.get(&field).map(|s| s.as_str())
    }

    pub fn set(&mut self, field: Field, header: String) {
        self.assignments.insert(field, header);
    }

    pub fn is_mapped(&self, field: Field) -> bool {
        self.assignments.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Headers this mapping references, for invariant checks.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.assignments.values().map(|s| s.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingSource {
    Oracle,
    Keyword,
}

impl MappingSource {
    pub fn label(&self) -> &'static str {
        match self {
            MappingSource::Oracle => "oracle",
            MappingSource::Keyword => "keyword",
        }
    }
}

/// Best-effort external column-suggestion service. Implementations own their
/// transport and timeout; any error here is advisory and falls through to
/// keyword matching.
pub trait MappingOracle {
    fn suggest(&self, headers: &[String]) -> anyhow::Result<HashMap<Field, String>>;
}

/// Resolve headers to a column mapping. Oracle tier first when available,
/// keyword tier as the deterministic fallback. Never fails: an empty mapping
/// simply means nothing matched.
pub fn resolve_mapping(
    headers: &[String],
    oracle: Option<&dyn MappingOracle>,
) -> (ColumnMapping, MappingSource) {
    if let Some(oracle) = oracle {
        match oracle.suggest(headers) {
            Ok(suggestions) => {
                let mapping = validate_suggestions(headers, suggestions);
                if !mapping.is_empty() {
                    return (mapping, MappingSource::Oracle);
                }
            }
            Err(_) => {}
        }
    }
    (keyword_mapping(headers), MappingSource::Keyword)
}

/// Keep only suggestions whose header actually exists in the file, matched
/// case-insensitively and rewritten to the file's own casing. Suggestions
/// for headers the file does not have are dropped silently.
fn validate_suggestions(
    headers: &[String],
    suggestions: HashMap<Field, String>,
) -> ColumnMapping {
    let mut mapping = ColumnMapping::default();
    for (field, suggested) in suggestions {
        let found = headers
            .iter()
            .find(|h| h.eq_ignore_ascii_case(suggested.trim()));
        if let Some(header) = found {
            mapping.set(field, header.clone());
        }
    }
    mapping
}

/// Deterministic keyword tier. Fields are scanned in priority order and each
/// claims the first containing header; a claimed header is never reassigned
/// to a later field in the same pass.
pub fn keyword_mapping(headers: &[String]) -> ColumnMapping {
    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    let mut mapping = ColumnMapping::default();
    let mut taken: HashSet<usize> = HashSet::new();

    for field in Field::ALL {
        let hit = lowered.iter().enumerate().find(|(i, header)| {
            !taken.contains(i) && field.keywords().iter().any(|kw| header.contains(kw))
        });
        if let Some((i, _)) = hit {
            taken.insert(i);
            mapping.set(field, headers[i].clone());
        }
    }
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    struct CannedOracle(HashMap<Field, String>);

    impl MappingOracle for CannedOracle {
        fn suggest(&self, _headers: &[String]) -> anyhow::Result<HashMap<Field, String>> {
            Ok(self.0.clone())
        }
    }

    struct FailingOracle;

    impl MappingOracle for FailingOracle {
        fn suggest(&self, _headers: &[String]) -> anyhow::Result<HashMap<Field, String>> {
            anyhow::bail!("suggestion service timed out")
        }
    }

    #[test]
    fn test_keyword_mapping_english() {
        let h = headers(&["Transaction Date", "Amount", "Description", "Payee"]);
        let m = keyword_mapping(&h);
        assert_eq!(m.get(Field::Date), Some("Transaction Date"));
        assert_eq!(m.get(Field::Amount), Some("Amount"));
        assert_eq!(m.get(Field::Description), Some("Description"));
        assert_eq!(m.get(Field::Merchant), Some("Payee"));
        assert!(!m.is_mapped(Field::Category));
    }

    #[test]
    fn test_keyword_mapping_vietnamese() {
        let h = headers(&["Ngày giao dịch", "Số tiền", "Nội dung", "Danh mục"]);
        let m = keyword_mapping(&h);
        assert_eq!(m.get(Field::Date), Some("Ngày giao dịch"));
        assert_eq!(m.get(Field::Amount), Some("Số tiền"));
        assert_eq!(m.get(Field::Description), Some("Nội dung"));
        assert_eq!(m.get(Field::Category), Some("Danh mục"));
    }

    #[test]
    fn test_keyword_mapping_never_reassigns_a_taken_header() {
        // "Amount Description" matches amount first; description must then
        // claim the later column rather than stealing the same header.
        let h = headers(&["Date", "Amount Description", "Details"]);
        let m = keyword_mapping(&h);
        assert_eq!(m.get(Field::Amount), Some("Amount Description"));
        assert_eq!(m.get(Field::Description), Some("Details"));
    }

    #[test]
    fn test_keyword_mapping_is_idempotent() {
        let h = headers(&["Date", "Amount", "Memo", "Account"]);
        assert_eq!(keyword_mapping(&h), keyword_mapping(&h));
    }

    #[test]
    fn test_resolve_accepts_validated_oracle_suggestions() {
        let h = headers(&["When", "How Much", "What"]);
        let mut s = HashMap::new();
        s.insert(Field::Date, "when".to_string());
        s.insert(Field::Amount, "HOW MUCH".to_string());
        s.insert(Field::Description, "What".to_string());
        let oracle = CannedOracle(s);
        let (m, source) = resolve_mapping(&h, Some(&oracle));
        assert_eq!(source, MappingSource::Oracle);
        // Rewritten to the file's own casing.
        assert_eq!(m.get(Field::Date), Some("When"));
        assert_eq!(m.get(Field::Amount), Some("How Much"));
    }

    #[test]
    fn test_resolve_drops_suggestions_for_missing_headers() {
        let h = headers(&["Date", "Amount", "Description"]);
        let mut s = HashMap::new();
        s.insert(Field::Date, "Date".to_string());
        s.insert(Field::Merchant, "Counterparty Name".to_string());
        let oracle = CannedOracle(s);
        let (m, source) = resolve_mapping(&h, Some(&oracle));
        assert_eq!(source, MappingSource::Oracle);
        assert_eq!(m.get(Field::Date), Some("Date"));
        assert!(!m.is_mapped(Field::Merchant));
    }

    #[test]
    fn test_resolve_falls_through_on_degenerate_oracle() {
        let h = headers(&["Date", "Amount", "Description"]);
        // Every suggestion points at a header the file does not have.
        let mut s = HashMap::new();
        s.insert(Field::Date, "Fecha".to_string());
        let oracle = CannedOracle(s);
        let (m, source) = resolve_mapping(&h, Some(&oracle));
        assert_eq!(source, MappingSource::Keyword);
        assert_eq!(m.get(Field::Date), Some("Date"));
    }

    #[test]
    fn test_resolve_falls_through_on_oracle_error() {
        let h = headers(&["Date", "Amount", "Description"]);
        let (m, source) = resolve_mapping(&h, Some(&FailingOracle));
        assert_eq!(source, MappingSource::Keyword);
        assert_eq!(m.get(Field::Amount), Some("Amount"));
    }

    #[test]
    fn test_resolve_without_oracle_uses_keywords() {
        let h = headers(&["Date", "Amount", "Description"]);
        let (m, source) = resolve_mapping(&h, None);
        assert_eq!(source, MappingSource::Keyword);
        assert!(m.is_mapped(Field::Date));
    }

    #[test]
    fn test_mapping_only_references_existing_headers() {
        let h = headers(&["Ngày", "Số tiền", "Ghi chú", "Tài khoản"]);
        let (m, _) = resolve_mapping(&h, None);
        for header in m.headers() {
            assert!(h.iter().any(|x| x == header), "unknown header {header}");
        }
    }
}
