//! SQLite storage implementation

use std::fmt;
use std::path::{Path, PathBuf};
use rusqlite::{Connection, DatabaseName, Params, params};
use crate::{Result, Error};
use crate::model::{Bill, BillDetails, Category, RowId, Shop, Usage, UNSET_ID};
use super::schema;

/// Where the store keeps its data
#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

impl Location {
    fn to_path_buf(&self) -> PathBuf {
        match self {
            Location::File(path) => path.clone(),
            Location::Memory => PathBuf::from(":memory:"),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::File(path) => write!(f, "{}", path.display()),
            Location::Memory => f.write_str(":memory:"),
        }
    }
}

/// SQLite-backed bill store.
///
/// Owns the single connection to the database. Mutations validate their
/// input before touching storage and bind every value as a parameter.
/// Lookups resolve identifiers back to names.
pub struct BillStore {
    location: Location,
    conn: Option<Connection>,
}

impl BillStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut store = Self {
            location: Location::File(path.as_ref().to_path_buf()),
            conn: None,
        };
        store.connect()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let mut store = Self {
            location: Location::Memory,
            conn: None,
        };
        store.connect()?;
        Ok(store)
    }

    // ========== Connection Management ==========

    /// Connect to the configured database. No-op when already connected.
    ///
    /// A failure to enable foreign keys is logged but does not fail the
    /// connect; a failure to open the file does.
    pub fn connect(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        let conn = match &self.location {
            Location::File(path) => Connection::open(path).map_err(|source| {
                tracing::error!("Error connecting to bill database {}: {}", path.display(), source);
                Error::Connection { path: path.clone(), source }
            })?,
            Location::Memory => Connection::open_in_memory().map_err(|source| Error::Connection {
                path: self.location.to_path_buf(),
                source,
            })?,
        };

        if let Err(e) = conn.execute_batch(schema::ENABLE_FOREIGN_KEYS) {
            tracing::warn!("Failed to enable foreign key constraint: {}", e);
        }

        // SQLite opens lazily; a file that is not a database only fails here
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, []).map_err(|source| {
                tracing::error!("Error preparing bill database {}: {}", self.location, source);
                Error::Connection { path: self.location.to_path_buf(), source }
            })?;
        }

        tracing::info!("Connected to bill database {}", self.location);
        self.conn = Some(conn);
        Ok(())
    }

    /// Release the connection. Every later operation fails with
    /// [`Error::NotConnected`] until [`BillStore::connect`] is called again.
    pub fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };

        conn.close().map_err(|(_, e)| {
            tracing::error!("Error closing bill database {}: {}", self.location, e);
            Error::Storage(e)
        })?;
        tracing::info!("Closed bill database {}", self.location);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Path of the database file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(Error::NotConnected)
    }

    // ========== Mutation Operations ==========

    /// Insert a new category and return its id
    pub fn add_category(&self, name: &str) -> Result<RowId> {
        if name.is_empty() {
            return Err(reject("category", "name cannot be empty"));
        }

        self.insert("category", "INSERT INTO category (name) VALUES (?1)", params![name])
    }

    /// Insert a new usage below `category_id` and return its id
    ///
    /// A non-zero category id that does not exist is rejected by the
    /// foreign key and surfaces as [`Error::Constraint`].
    pub fn add_usage(&self, name: &str, category_id: RowId) -> Result<RowId> {
        if name.is_empty() || category_id == UNSET_ID {
            return Err(reject("usage", "missing name or category"));
        }

        self.insert(
            "usage",
            "INSERT INTO usage (name, categoryId) VALUES (?1, ?2)",
            params![name, category_id],
        )
    }

    /// Insert a new shop and return its id
    pub fn add_shop(&self, name: &str) -> Result<RowId> {
        if name.is_empty() {
            return Err(reject("shop", "name cannot be empty"));
        }

        self.insert("shop", "INSERT INTO shops (name) VALUES (?1)", params![name])
    }

    /// Insert a new bill and return its id
    ///
    /// An empty `filename` is stored as NULL.
    pub fn add_bill(
        &self,
        date: &str,
        price: f64,
        shop_id: RowId,
        usage_id: RowId,
        filename: Option<&str>,
    ) -> Result<RowId> {
        if date.is_empty() || shop_id == UNSET_ID || usage_id == UNSET_ID {
            return Err(reject("bill", "missing date, shop or usage"));
        }
        if price == 0.0 || !price.is_finite() {
            return Err(reject("bill", "price must be a non-zero number"));
        }

        let filename = filename.filter(|f| !f.is_empty());
        self.insert(
            "bill",
            r#"
            INSERT INTO bills (date, price, shopId, usageId, filename)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![date, price, shop_id, usage_id, filename],
        )
    }

    /// Run one insert and return the new id.
    ///
    /// The statement runs in its own transaction so a row whose id does not
    /// fit a [`RowId`] is rolled back instead of left behind.
    fn insert<P: Params>(&self, entity: &'static str, sql: &str, params: P) -> Result<RowId> {
        let tx = self.conn()?.unchecked_transaction()?;
        if let Err(e) = tx.execute(sql, params) {
            tracing::error!(entity, "Error inserting {}: {}", entity, e);
            return Err(Error::Constraint(e.to_string()));
        }

        let id = to_row_id(tx.last_insert_rowid())?;
        tx.commit()?;
        tracing::info!(entity, id, "Inserted new {}", entity);
        Ok(id)
    }

    // ========== Lookup Operations ==========

    /// All usages in storage order.
    ///
    /// Never fails: a query error is logged and yields an empty list.
    pub fn get_all_usages(&self) -> Vec<Usage> {
        match self.query_usages("SELECT id, categoryId, name FROM usage ORDER BY id", []) {
            Ok(usages) => usages,
            Err(e) => {
                tracing::error!("Error reading usages: {}", e);
                Vec::new()
            }
        }
    }

    /// Usages that belong to one category
    pub fn get_usages_in_category(&self, category_id: RowId) -> Result<Vec<Usage>> {
        self.query_usages(
            "SELECT id, categoryId, name FROM usage WHERE categoryId = ?1 ORDER BY id",
            [category_id],
        )
    }

    /// Get a usage by id
    pub fn get_usage(&self, id: RowId) -> Result<Usage> {
        let mut usages = self.query_usages("SELECT id, categoryId, name FROM usage WHERE id = ?1", [id])?;
        match usages.len() {
            0 => Err(Error::NotFound { entity: "usage", id }),
            1 => Ok(usages.remove(0)),
            n => Err(duplicate("usage", id, n)),
        }
    }

    pub fn get_usage_name(&self, id: RowId) -> Result<String> {
        self.lookup_name("usage", "SELECT name FROM usage WHERE id = ?1", id)
    }

    pub fn get_shop_name(&self, id: RowId) -> Result<String> {
        self.lookup_name("shop", "SELECT name FROM shops WHERE id = ?1", id)
    }

    pub fn get_category_name(&self, id: RowId) -> Result<String> {
        self.lookup_name("category", "SELECT name FROM category WHERE id = ?1", id)
    }

    /// Resolve a single id to its name; exactly one row must match
    fn lookup_name(&self, entity: &'static str, sql: &str, id: RowId) -> Result<String> {
        let mut stmt = self.conn()?.prepare(sql)?;
        let mut rows = stmt.query([id])?;

        let name: String = match rows.next()? {
            Some(row) => row.get(0)?,
            None => {
                tracing::debug!(entity, id, "No {} with id {}", entity, id);
                return Err(Error::NotFound { entity, id });
            }
        };

        let mut extra = 0;
        while rows.next()?.is_some() {
            extra += 1;
        }
        if extra > 0 {
            return Err(duplicate(entity, id, extra + 1));
        }

        Ok(name)
    }

    /// All categories ordered by id
    pub fn get_all_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn()?.prepare("SELECT id, name FROM category ORDER BY id")?;
        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    /// All shops ordered by id
    pub fn get_all_shops(&self) -> Result<Vec<Shop>> {
        let mut stmt = self.conn()?.prepare("SELECT id, name FROM shops ORDER BY id")?;
        let shops = stmt
            .query_map([], |row| {
                Ok(Shop {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(shops)
    }

    /// All bills ordered by id
    pub fn get_all_bills(&self) -> Result<Vec<Bill>> {
        self.query_bills(
            "SELECT id, date, price, shopId, usageId, filename FROM bills ORDER BY id",
            [],
        )
    }

    /// Bills recorded for an exact date string
    pub fn get_bills_on(&self, date: &str) -> Result<Vec<Bill>> {
        self.query_bills(
            "SELECT id, date, price, shopId, usageId, filename FROM bills WHERE date = ?1 ORDER BY id",
            [date],
        )
    }

    /// Resolve the shop, usage and category of a bill to their names
    pub fn describe_bill(&self, bill: &Bill) -> Result<BillDetails> {
        let usage = self.get_usage(bill.usage_id)?;
        Ok(BillDetails {
            id: bill.id,
            date: bill.date.clone(),
            price: bill.price,
            shop: self.get_shop_name(bill.shop_id)?,
            category: self.get_category_name(usage.category_id)?,
            usage: usage.name,
            filename: bill.filename.clone(),
        })
    }

    fn query_usages<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Usage>> {
        let mut stmt = self.conn()?.prepare(sql)?;
        let usages = stmt
            .query_map(params, Self::row_to_usage)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(usages)
    }

    fn query_bills<P: Params>(&self, sql: &str, params: P) -> Result<Vec<Bill>> {
        let mut stmt = self.conn()?.prepare(sql)?;
        let bills = stmt
            .query_map(params, Self::row_to_bill)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bills)
    }

    /// Helper to convert a row to a Usage
    fn row_to_usage(row: &rusqlite::Row<'_>) -> rusqlite::Result<Usage> {
        Ok(Usage {
            id: row.get(0)?,
            category_id: row.get(1)?,
            name: row.get(2)?,
        })
    }

    /// Helper to convert a row to a Bill
    fn row_to_bill(row: &rusqlite::Row<'_>) -> rusqlite::Result<Bill> {
        Ok(Bill {
            id: row.get(0)?,
            date: row.get(1)?,
            price: row.get(2)?,
            shop_id: row.get(3)?,
            usage_id: row.get(4)?,
            filename: row.get(5)?,
        })
    }

    // ========== Counts & Maintenance ==========

    pub fn count_categories(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM category")
    }

    pub fn count_usages(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM usage")
    }

    pub fn count_shops(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM shops")
    }

    pub fn count_bills(&self) -> Result<usize> {
        self.count("SELECT COUNT(*) FROM bills")
    }

    fn count(&self, sql: &str) -> Result<usize> {
        let count: i64 = self.conn()?.query_row(sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            categories: self.count_categories()?,
            usages: self.count_usages()?,
            shops: self.count_shops()?,
            bills: self.count_bills()?,
        })
    }

    /// Copy the live database to `dest` with SQLite's online backup
    pub fn backup_to(&self, dest: &Path) -> Result<()> {
        let conn = self.conn()?;
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        conn.backup(DatabaseName::Main, dest, None)?;
        tracing::info!("Backed up bill database to {}", dest.display());
        Ok(())
    }
}

fn reject(entity: &'static str, reason: &str) -> Error {
    tracing::warn!(entity, "Failed to add {}: {}", entity, reason);
    Error::Validation(format!("{}: {}", entity, reason))
}

fn duplicate(entity: &'static str, id: RowId, rows: usize) -> Error {
    tracing::error!(entity, id, rows, "Duplicate {} id", entity);
    Error::Integrity(format!("{} id {} matched {} rows", entity, id, rows))
}

fn to_row_id(raw: i64) -> Result<RowId> {
    RowId::try_from(raw).map_err(|_| Error::Integrity(format!("row id {} out of range", raw)))
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DbStats {
    pub categories: usize,
    pub usages: usize,
    pub shops: usize,
    pub bills: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Categories: {}", self.categories)?;
        writeln!(f, "  Usages: {}", self.usages)?;
        writeln!(f, "  Shops: {}", self.shops)?;
        writeln!(f, "  Bills: {}", self.bills)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Category, usage and shop ready for bills
    fn seeded_store() -> (BillStore, RowId, RowId) {
        let store = BillStore::open_in_memory().unwrap();
        let category = store.add_category("Groceries").unwrap();
        let usage = store.add_usage("Weekly shop", category).unwrap();
        let shop = store.add_shop("SuperMart").unwrap();
        (store, shop, usage)
    }

    #[test]
    fn test_category_roundtrip() {
        let store = BillStore::open_in_memory().unwrap();

        for name in ["Groceries", "Rent", "Fun & Games", "Überweisung"] {
            let id = store.add_category(name).unwrap();
            assert_eq!(store.get_category_name(id).unwrap(), name);
        }
    }

    #[test]
    fn test_shop_roundtrip() {
        let store = BillStore::open_in_memory().unwrap();

        let id = store.add_shop("SuperMart").unwrap();
        assert_eq!(store.get_shop_name(id).unwrap(), "SuperMart");
    }

    #[test]
    fn test_names_are_bound_not_interpolated() {
        let store = BillStore::open_in_memory().unwrap();

        let tricky = "O'Brien's'); DROP TABLE category; --";
        let id = store.add_category(tricky).unwrap();
        assert_eq!(store.get_category_name(id).unwrap(), tricky);
        assert_eq!(store.count_categories().unwrap(), 1);
    }

    #[test]
    fn test_empty_category_rejected() {
        let store = BillStore::open_in_memory().unwrap();
        store.add_category("Rent").unwrap();

        let err = store.add_category("").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.count_categories().unwrap(), 1);
    }

    #[test]
    fn test_empty_shop_rejected() {
        let store = BillStore::open_in_memory().unwrap();

        assert!(store.add_shop("").unwrap_err().is_validation());
        assert_eq!(store.count_shops().unwrap(), 0);
    }

    #[test]
    fn test_usage_requires_name_and_category() {
        let store = BillStore::open_in_memory().unwrap();
        let category = store.add_category("Groceries").unwrap();

        assert!(store.add_usage("", category).unwrap_err().is_validation());
        assert!(store.add_usage("Weekly shop", UNSET_ID).unwrap_err().is_validation());
        assert_eq!(store.count_usages().unwrap(), 0);
    }

    #[test]
    fn test_usage_with_unknown_category_fails() {
        let store = BillStore::open_in_memory().unwrap();

        let err = store.add_usage("Weekly shop", 42).unwrap_err();
        assert!(err.is_constraint());
        assert_eq!(store.count_usages().unwrap(), 0);
    }

    #[test]
    fn test_bill_with_zero_price_fails() {
        let (store, shop, usage) = seeded_store();

        for file in [None, Some("receipt.pdf")] {
            let err = store.add_bill("2024-01-05", 0.0, shop, usage, file).unwrap_err();
            assert!(err.is_validation());
        }
        assert_eq!(store.count_bills().unwrap(), 0);
    }

    #[test]
    fn test_bill_with_non_finite_price_fails() {
        let (store, shop, usage) = seeded_store();

        assert!(store.add_bill("2024-01-05", f64::NAN, shop, usage, None).is_err());
        assert!(store.add_bill("2024-01-05", f64::INFINITY, shop, usage, None).is_err());
        assert_eq!(store.count_bills().unwrap(), 0);
    }

    #[test]
    fn test_bill_requires_date_and_references() {
        let (store, shop, usage) = seeded_store();

        assert!(store.add_bill("", 1.0, shop, usage, None).unwrap_err().is_validation());
        assert!(store.add_bill("2024-01-05", 1.0, UNSET_ID, usage, None).unwrap_err().is_validation());
        assert!(store.add_bill("2024-01-05", 1.0, shop, UNSET_ID, None).unwrap_err().is_validation());
        assert_eq!(store.count_bills().unwrap(), 0);
    }

    #[test]
    fn test_bill_with_unknown_references_fails() {
        let (store, shop, usage) = seeded_store();

        assert!(store.add_bill("2024-01-05", 9.99, 99, usage, None).unwrap_err().is_constraint());
        assert!(store.add_bill("2024-01-05", 9.99, shop, 99, None).unwrap_err().is_constraint());
        assert_eq!(store.count_bills().unwrap(), 0);
    }

    #[test]
    fn test_negative_price_is_accepted() {
        let (store, shop, usage) = seeded_store();

        let id = store.add_bill("2024-01-06", -3.5, shop, usage, None).unwrap();
        let bills = store.get_all_bills().unwrap();
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].id, id);
        assert_eq!(bills[0].price, -3.5);
    }

    #[test]
    fn test_empty_filename_stored_as_null() {
        let (store, shop, usage) = seeded_store();

        store.add_bill("2024-01-05", 1.0, shop, usage, Some("")).unwrap();
        store.add_bill("2024-01-05", 2.0, shop, usage, Some("scan.png")).unwrap();

        let bills = store.get_bills_on("2024-01-05").unwrap();
        assert_eq!(bills[0].filename, None);
        assert_eq!(bills[1].filename.as_deref(), Some("scan.png"));
    }

    #[test]
    fn test_get_all_usages() {
        let store = BillStore::open_in_memory().unwrap();
        assert!(store.get_all_usages().is_empty());

        let food = store.add_category("Food").unwrap();
        let home = store.add_category("Home").unwrap();
        let mut expected = Vec::new();
        for (name, category) in [("Weekly shop", food), ("Bakery", food), ("Cleaning", home)] {
            let id = store.add_usage(name, category).unwrap();
            expected.push(Usage::new(id, category, name));
        }

        assert_eq!(store.get_all_usages(), expected);
        assert_eq!(store.get_usages_in_category(food).unwrap().len(), 2);
        assert_eq!(store.get_usages_in_category(home).unwrap(), vec![expected[2].clone()]);
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let (store, _, _) = seeded_store();

        assert!(store.get_category_name(999).unwrap_err().is_not_found());
        assert!(store.get_shop_name(999).unwrap_err().is_not_found());
        assert!(store.get_usage_name(999).unwrap_err().is_not_found());
        assert!(store.get_usage(UNSET_ID).unwrap_err().is_not_found());

        match store.get_shop_name(7) {
            Err(Error::NotFound { entity, id }) => {
                assert_eq!(entity, "shop");
                assert_eq!(id, 7);
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_ids_advance() {
        let store = BillStore::open_in_memory().unwrap();

        let first = store.add_shop("A").unwrap();
        let second = store.add_shop("B").unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[test]
    fn test_describe_bill() {
        let (store, shop, usage) = seeded_store();
        store.add_bill("2024-01-05", 42.50, shop, usage, Some("receipt.pdf")).unwrap();

        let bill = store.get_all_bills().unwrap().remove(0);
        let details = store.describe_bill(&bill).unwrap();
        assert_eq!(details.shop, "SuperMart");
        assert_eq!(details.usage, "Weekly shop");
        assert_eq!(details.category, "Groceries");
        assert_eq!(details.filename.as_deref(), Some("receipt.pdf"));
    }

    #[test]
    fn test_listings() {
        let store = BillStore::open_in_memory().unwrap();
        store.add_category("Rent").unwrap();
        store.add_category("Food").unwrap();
        store.add_shop("Bakery").unwrap();

        let categories = store.get_all_categories().unwrap();
        assert_eq!(categories.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["Rent", "Food"]);
        assert_eq!(store.get_all_shops().unwrap(), vec![Shop { id: 1, name: "Bakery".to_string() }]);
    }

    #[test]
    fn test_stats() {
        let (store, shop, usage) = seeded_store();
        store.add_bill("2024-01-05", 1.0, shop, usage, None).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats, DbStats { categories: 1, usages: 1, shops: 1, bills: 1 });
        assert!(stats.to_string().contains("Bills: 1"));
    }

    #[test]
    fn test_closed_store() {
        let mut store = BillStore::open_in_memory().unwrap();
        store.close().unwrap();
        store.close().unwrap();

        assert!(!store.is_connected());
        assert!(matches!(store.add_shop("A"), Err(Error::NotConnected)));
        assert!(matches!(store.get_shop_name(1), Err(Error::NotConnected)));
        assert!(store.get_all_usages().is_empty());
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut store = BillStore::open_in_memory().unwrap();
        let id = store.add_shop("Kept").unwrap();

        store.connect().unwrap();
        assert_eq!(store.get_shop_name(id).unwrap(), "Kept");
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let store = BillStore::open_in_memory().unwrap();
        let enabled: i64 = store
            .conn()
            .unwrap()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_scenario() {
        let store = BillStore::open_in_memory().unwrap();

        let category = store.add_category("Groceries").unwrap();
        let usage = store.add_usage("Weekly shop", category).unwrap();
        let shop = store.add_shop("SuperMart").unwrap();
        let bill = store.add_bill("2024-01-05", 42.50, shop, usage, Some("receipt.pdf")).unwrap();

        assert_eq!((category, usage, shop, bill), (1, 1, 1, 1));
        assert_eq!(store.get_category_name(1).unwrap(), "Groceries");
        assert_eq!(store.get_shop_name(1).unwrap(), "SuperMart");
        assert_eq!(store.get_usage_name(1).unwrap(), "Weekly shop");
    }
}
