use crate::model::{BillDetails, Usage};
use crate::storage::DbStats;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct NamedRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Category")]
    category_id: u32,
    #[tabled(rename = "Usage")]
    name: String,
}

#[derive(Tabled)]
struct BillRow {
    #[tabled(rename = "ID")]
    id: u32,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Shop")]
    shop: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Usage")]
    usage: String,
    #[tabled(rename = "File")]
    file: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &DbStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Categories", &stats.categories.to_string());
    builder.add_row("Usages", &stats.usages.to_string());
    builder.add_row("Shops", &stats.shops.to_string());
    builder.add_row("Bills", &stats.bills.to_string());
    builder.build()
}

/// Table of `(id, name)` pairs, used for categories and shops
pub fn named_table<'a>(rows: impl IntoIterator<Item = (u32, &'a str)>) -> String {
    let rows: Vec<NamedRow> = rows
        .into_iter()
        .map(|(id, name)| NamedRow { id, name: name.to_string() })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn usages_table(usages: &[Usage]) -> String {
    let rows: Vec<UsageRow> = usages
        .iter()
        .map(|u| UsageRow {
            id: u.id,
            category_id: u.category_id,
            name: u.name.clone(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn bills_table(bills: &[BillDetails]) -> String {
    let rows: Vec<BillRow> = bills
        .iter()
        .map(|b| BillRow {
            id: b.id,
            date: b.date.clone(),
            price: format!("{:.2}", b.price),
            shop: b.shop.clone(),
            category: b.category.clone(),
            usage: b.usage.clone(),
            file: b.filename.clone().unwrap_or_default(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
