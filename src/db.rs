use std::path::Path;

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::error::Result;
use crate::importer::TransactionStore;
use crate::models::{Account, CanonicalTransaction, Category};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    account_type TEXT NOT NULL,
    institution TEXT,
    last_four TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    category_type TEXT NOT NULL,
    description TEXT,
    is_active INTEGER DEFAULT 1
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    account_id INTEGER NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    date_range_start TEXT,
    date_range_end TEXT,
    checksum TEXT,
    FOREIGN KEY (account_id) REFERENCES accounts(id)
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL,
    date TEXT NOT NULL,
    description TEXT NOT NULL,
    amount REAL NOT NULL,
    category_id INTEGER,
    merchant TEXT,
    status TEXT NOT NULL DEFAULT 'posted',
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (category_id) REFERENCES categories(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_dedupe
    ON transactions (account_id, date, amount, description);
";

// (name, category_type, description)
const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Salary", "income", "Wages and salary deposits"),
    ("Interest", "income", "Bank interest"),
    ("Refunds", "income", "Returns and reimbursements"),
    ("Other Income", "income", "Anything else coming in"),
    ("Groceries", "expense", "Supermarkets, markets"),
    ("Dining", "expense", "Restaurants, cafes, delivery"),
    ("Transport", "expense", "Fuel, transit, ride-hailing"),
    ("Housing", "expense", "Rent, mortgage"),
    ("Utilities", "expense", "Power, water, internet, phone"),
    ("Health", "expense", "Pharmacy, doctors, insurance"),
    ("Entertainment", "expense", "Streaming, events, hobbies"),
    ("Shopping", "expense", "Clothing, electronics, household"),
    ("Travel", "expense", "Flights, hotels"),
    ("Education", "expense", "Courses, books, fees"),
    ("Fees", "expense", "Bank and card fees"),
    ("Transfer", "expense", "Transfers between own accounts"),
    ("Uncategorized", "expense", "Needs review"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |row| row.get(0))?;
    if count == 0 {
        for cat in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT INTO categories (name, category_type, description) VALUES (?1, ?2, ?3)",
                rusqlite::params![cat.0, cat.1, cat.2],
            )?;
        }
    }
    Ok(())
}

pub fn add_account(
    conn: &Connection,
    name: &str,
    account_type: &str,
    institution: Option<&str>,
    last_four: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO accounts (name, account_type, institution, last_four) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![name, account_type, institution, last_four],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, account_type, institution, last_four FROM accounts ORDER BY name",
    )?;
    let accounts = stmt
        .query_map([], |row| {
            Ok(Account {
                id: row.get(0)?,
                name: row.get(1)?,
                account_type: row.get(2)?,
                institution: row.get(3)?,
                last_four: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(accounts)
}

pub fn account_id_by_name(conn: &Connection, name: &str) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE name = ?1")?;
    let mut rows = stmt.query([name])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category_type, description, is_active FROM categories \
         WHERE is_active = 1 ORDER BY category_type, name",
    )?;
    let categories = stmt
        .query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                category_type: row.get(2)?,
                description: row.get(3)?,
                is_active: row.get::<_, i64>(4)? != 0,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub fn category_id_by_name(conn: &Connection, name: &str) -> Result<Option<i64>> {
    let mut stmt =
        conn.prepare("SELECT id FROM categories WHERE name = ?1 COLLATE NOCASE AND is_active = 1")?;
    let mut rows = stmt.query([name])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

/// The real transaction store, one per open connection.
pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        SqliteStore { conn }
    }
}

impl TransactionStore for SqliteStore<'_> {
    fn exists(
        &self,
        account_id: i64,
        date: NaiveDate,
        amount: f64,
        description: &str,
    ) -> Result<bool> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT 1 FROM transactions \
             WHERE account_id = ?1 AND date = ?2 AND amount = ?3 AND description = ?4",
        )?;
        Ok(stmt.exists(rusqlite::params![
            account_id,
            date.to_string(),
            amount,
            description
        ])?)
    }

    fn insert(&self, tx: &CanonicalTransaction) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO transactions (account_id, date, description, amount, category_id, merchant, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                tx.account_id,
                tx.date.to_string(),
                tx.description,
                tx.amount,
                tx.category_id,
                tx.merchant,
                tx.status,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn category_id(&self, name: &str) -> Result<Option<i64>> {
        category_id_by_name(self.conn, name)
    }
}
