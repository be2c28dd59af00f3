use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::db::SqliteStore;
use crate::detect::{detect, DateFormat};
use crate::error::{MiloError, Result};
use crate::mapping::{ColumnMapping, Field};
use crate::models::{CanonicalTransaction, ImportError, ImportWarning};
use crate::raw::RawTable;
use crate::validate::{validate_row, RowValidation};

/// How many date cells to sample when resolving `DateFormat::Auto`.
const DETECT_SAMPLE_SIZE: usize = 20;

/// Store seam consumed by the executor. Implemented by `SqliteStore` for the
/// real database and by in-memory fakes in tests.
pub trait TransactionStore {
    fn exists(
        &self,
        account_id: i64,
        date: NaiveDate,
        amount: f64,
        description: &str,
    ) -> Result<bool>;

    fn insert(&self, tx: &CanonicalTransaction) -> Result<i64>;

    /// Category registry lookup for rows with an explicit category column.
    /// Stores without a registry resolve nothing.
    fn category_id(&self, _name: &str) -> Result<Option<i64>> {
        Ok(None)
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub target_account_id: Option<i64>,
    pub default_category_id: Option<i64>,
    pub date_format: DateFormat,
    /// When false the file has no header line and `synthetic_headers` names
    /// the columns positionally.
    pub skip_header_row: bool,
    pub synthetic_headers: Vec<String>,
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            target_account_id: None,
            default_category_id: None,
            date_format: DateFormat::Auto,
            skip_header_row: true,
            synthetic_headers: Vec::new(),
            dry_run: false,
        }
    }
}

/// Terminal classification of one input row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Imported,
    SkippedDuplicate,
    Failed,
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub failed: usize,
    pub duplicates: usize,
    /// Signed sum of the imported rows' amounts, for the run summary.
    pub net_imported: f64,
    pub errors: Vec<ImportError>,
    pub warnings: Vec<ImportWarning>,
}

impl ImportResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Pipeline stages. Strictly sequential; a row that fails validation is out
/// for the run, there is no retry-in-place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd)]
enum Stage {
    Parsed,
    Mapped,
    Validated,
    DuplicatesChecked,
    Executed,
}

/// A validated row waiting on the duplicate check, keyed by its 1-based
/// user-facing row number.
pub struct Candidate {
    pub row_no: usize,
    pub tx: CanonicalTransaction,
}

/// Drive one import run over an already-parsed table. Serves both dry runs
/// and commits; the only difference is whether inserts are issued. Row-scoped
/// problems land in the result, never in `Err`. Fatal preconditions (no
/// target account, mapping referencing a column the file does not have) abort
/// before any row is processed.
pub fn run_import(
    table: &RawTable,
    mapping: &ColumnMapping,
    options: &ImportOptions,
    store: &dyn TransactionStore,
) -> Result<ImportResult> {
    // Fail-fast preconditions, checked before any row work.
    let account_id = options
        .target_account_id
        .ok_or_else(|| MiloError::Other("a target account is required".to_string()))?;
    for header in mapping.headers() {
        if !table.headers().iter().any(|h| h == header) {
            return Err(MiloError::UnknownColumn(header.to_string()));
        }
    }

    let format = resolve_format(table, mapping, options.date_format);

    let mut result = ImportResult::default();
    let mut outcomes: Vec<Option<RowOutcome>> = vec![None; table.row_count()];
    let mut candidates: Vec<Candidate> = Vec::new();
    let mut duplicate_rows: HashSet<usize> = HashSet::new();

    let mut stage = Stage::Parsed;
    loop {
        stage = match stage {
            // Parsing happened upstream; the mapping and format are frozen
            // for the run from here on.
            Stage::Parsed => Stage::Mapped,
            Stage::Mapped => {
                for row in 0..table.row_count() {
                    let row_no = row + 1;
                    let v = validate_row(
                        table,
                        row,
                        row_no,
                        mapping,
                        format,
                        options.default_category_id,
                    );
                    result.warnings.extend(v.warnings.iter().cloned());
                    if !v.is_valid() {
                        result.errors.extend(v.errors);
                        outcomes[row] = Some(RowOutcome::Failed);
                        continue;
                    }
                    let tx = build_transaction(table, row, mapping, account_id, options, store, &v)?;
                    candidates.push(Candidate { row_no, tx });
                }
                Stage::Validated
            }
            Stage::Validated => {
                duplicate_rows = find_duplicates(store, &candidates)?;
                Stage::DuplicatesChecked
            }
            Stage::DuplicatesChecked => {
                for candidate in std::mem::take(&mut candidates) {
                    let row = candidate.row_no - 1;
                    if duplicate_rows.contains(&candidate.row_no) {
                        outcomes[row] = Some(RowOutcome::SkippedDuplicate);
                        continue;
                    }
                    if options.dry_run {
                        outcomes[row] = Some(RowOutcome::Imported);
                        result.net_imported += candidate.tx.amount;
                        continue;
                    }
                    // One insert per row; a failure is recorded and the
                    // batch moves on.
                    match store.insert(&candidate.tx) {
                        Ok(_) => {
                            outcomes[row] = Some(RowOutcome::Imported);
                            result.net_imported += candidate.tx.amount;
                        }
                        Err(err) => {
                            result.errors.push(ImportError {
                                row: candidate.row_no,
                                field: "database".to_string(),
                                raw_value: candidate.tx.description.clone(),
                                message: err.to_string(),
                            });
                            outcomes[row] = Some(RowOutcome::Failed);
                        }
                    }
                }
                Stage::Executed
            }
            Stage::Executed => break,
        };
    }

    for outcome in outcomes.into_iter().flatten() {
        match outcome {
            RowOutcome::Imported => result.imported += 1,
            RowOutcome::SkippedDuplicate => result.duplicates += 1,
            RowOutcome::Failed => result.failed += 1,
        }
    }
    Ok(result)
}

/// Lock in a concrete date format for the run. `Auto` samples the mapped
/// date column once; the detector's answer then holds for every row.
fn resolve_format(table: &RawTable, mapping: &ColumnMapping, requested: DateFormat) -> DateFormat {
    if requested != DateFormat::Auto {
        return requested;
    }
    let samples: Vec<&str> = match mapping.get(Field::Date) {
        Some(header) => table
            .column(header)
            .into_iter()
            .filter(|v| !v.trim().is_empty())
            .take(DETECT_SAMPLE_SIZE)
            .collect(),
        None => Vec::new(),
    };
    detect(&samples).format
}

fn build_transaction(
    table: &RawTable,
    row: usize,
    mapping: &ColumnMapping,
    account_id: i64,
    options: &ImportOptions,
    store: &dyn TransactionStore,
    v: &RowValidation,
) -> Result<CanonicalTransaction> {
    // Validation guarantees these for a valid row.
    let date = v.date.expect("valid row has a date");
    let amount = v.amount.expect("valid row has an amount");
    let description = mapped_cell(table, row, mapping, Field::Description).unwrap_or_default();

    let mut tx = CanonicalTransaction::new(account_id, date, amount, description);
    tx.merchant = mapped_cell(table, row, mapping, Field::Merchant);
    tx.category_id = match mapped_cell(table, row, mapping, Field::Category) {
        Some(name) => store.category_id(&name)?.or(options.default_category_id),
        None => options.default_category_id,
    };
    Ok(tx)
}

fn mapped_cell(
    table: &RawTable,
    row: usize,
    mapping: &ColumnMapping,
    field: Field,
) -> Option<String> {
    let header = mapping.get(field)?;
    let value = table.cell(row, header)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Exact-match duplicate detection: a candidate collides iff the store holds
/// a transaction with the identical (account, date, amount, description)
/// tuple. Near-duplicates are not flagged. Returns 1-based row numbers;
/// lookup order does not affect the set.
pub fn find_duplicates(
    store: &dyn TransactionStore,
    candidates: &[Candidate],
) -> Result<HashSet<usize>> {
    let mut rows = HashSet::new();
    for candidate in candidates {
        let tx = &candidate.tx;
        if store.exists(tx.account_id, tx.date, tx.amount, &tx.description)? {
            rows.insert(candidate.row_no);
        }
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// import_file: file-level entry point over the sqlite store
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct FileImport {
    pub result: ImportResult,
    /// True when this exact file (by checksum) was already imported into the
    /// account; the pipeline is skipped entirely.
    pub duplicate_file: bool,
}

fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Import one CSV file into a named account. Wraps the pipeline with the
/// whole-file checksum short-circuit and, on commit, an audit record in the
/// imports table. Dry runs write nothing, record nothing.
pub fn import_file(
    conn: &Connection,
    file_path: &Path,
    account_name: &str,
    options: &ImportOptions,
) -> Result<FileImport> {
    let account_id = crate::db::account_id_by_name(conn, account_name)?
        .ok_or_else(|| MiloError::UnknownAccount(account_name.to_string()))?;

    let bytes = std::fs::read(file_path)?;
    let checksum = compute_checksum(&bytes);
    {
        let mut stmt =
            conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1 AND account_id = ?2")?;
        if stmt.exists(rusqlite::params![checksum, account_id])? {
            return Ok(FileImport { result: ImportResult::default(), duplicate_file: true });
        }
    }

    let table = if options.skip_header_row {
        RawTable::parse(&bytes)?
    } else {
        RawTable::parse_headerless(&bytes, options.synthetic_headers.clone())?
    };
    let (mapping, _source) = crate::mapping::resolve_mapping(table.headers(), None);

    let options = ImportOptions { target_account_id: Some(account_id), ..options.clone() };
    let store = SqliteStore::new(conn);
    let result = run_import(&table, &mapping, &options, &store)?;

    if !options.dry_run {
        record_import(conn, file_path, account_id, &table, &mapping, &checksum, &options)?;
    }

    Ok(FileImport { result, duplicate_file: false })
}

fn record_import(
    conn: &Connection,
    file_path: &Path,
    account_id: i64,
    table: &RawTable,
    mapping: &ColumnMapping,
    checksum: &str,
    options: &ImportOptions,
) -> Result<()> {
    let format = resolve_format(table, mapping, options.date_format);
    let mut dates: Vec<NaiveDate> = Vec::new();
    if let Some(header) = mapping.get(Field::Date) {
        for value in table.column(header) {
            if let Ok(date) = crate::normalize::parse_date(value, format) {
                dates.push(date);
            }
        }
    }
    let min_date = dates.iter().min().map(|d| d.to_string());
    let max_date = dates.iter().max().map(|d| d.to_string());

    conn.execute(
        "INSERT INTO imports (filename, account_id, record_count, date_range_start, date_range_end, checksum) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            account_id,
            table.row_count() as i64,
            min_date,
            max_date,
            checksum,
        ],
    )?;
    Ok(())
}
