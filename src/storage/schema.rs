//! Database schema definitions

/// Enables foreign-key enforcement; must run on every new connection
pub const ENABLE_FOREIGN_KEYS: &str = "PRAGMA foreign_keys = ON;";

/// SQL to create the category table
pub const CREATE_CATEGORY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS category (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
)
"#;

/// SQL to create the usage table
/// Each usage is a sub-category of exactly one category
pub const CREATE_USAGE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS usage (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    categoryId INTEGER REFERENCES category(id),
    name TEXT NOT NULL
)
"#;

/// SQL to create the shops table
pub const CREATE_SHOPS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS shops (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
)
"#;

/// SQL to create the bills table
pub const CREATE_BILLS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS bills (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    price REAL NOT NULL,
    shopId INTEGER REFERENCES shops(id),
    usageId INTEGER REFERENCES usage(id),
    filename TEXT
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_usage_category ON usage(categoryId)",
    "CREATE INDEX IF NOT EXISTS idx_bills_shop ON bills(shopId)",
    "CREATE INDEX IF NOT EXISTS idx_bills_usage ON bills(usageId)",
    "CREATE INDEX IF NOT EXISTS idx_bills_date ON bills(date)",
];

/// All schema creation statements, referenced tables first
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_CATEGORY_TABLE,
        CREATE_USAGE_TABLE,
        CREATE_SHOPS_TABLE,
        CREATE_BILLS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
