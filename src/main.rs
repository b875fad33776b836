//! Bill Tracker CLI - record and browse personal expenses

use anyhow::Context;
use billtracker::config::{self, BillTrackerConfig};
use billtracker::ui::{self, Icons};
use billtracker::{BillStore, RowId};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "billtracker")]
#[command(version)]
#[command(about = "Personal expense tracker - bills, shops, categories and usages")]
#[command(long_about = r#"
Bill Tracker keeps your bills in a local SQLite database.
Every bill is paid at a shop and booked on a usage; every usage belongs
to a category.

Example usage:
  billtracker init
  billtracker add-category Groceries
  billtracker add-usage "Weekly shop" --category 1
  billtracker add-shop SuperMart
  billtracker add-bill --date 2024-01-05 --price 42.50 --shop 1 --usage 1 --file receipt.pdf
  billtracker bills --date 2024-01-05
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and create the database
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Add a spending category
    AddCategory { name: String },

    /// Add a usage below a category
    AddUsage {
        name: String,

        /// Category id
        #[arg(long)]
        category: RowId,
    },

    /// Add a shop
    AddShop { name: String },

    /// Add a bill
    AddBill {
        /// Date of the bill, e.g. 2024-01-05
        #[arg(long)]
        date: String,

        /// Amount paid; negative for refunds
        #[arg(long, allow_negative_numbers = true)]
        price: f64,

        /// Shop id
        #[arg(long)]
        shop: RowId,

        /// Usage id
        #[arg(long)]
        usage: RowId,

        /// Attached receipt file
        #[arg(long)]
        file: Option<String>,
    },

    /// List usages
    Usages {
        /// Only usages of this category
        #[arg(long)]
        category: Option<RowId>,
    },

    /// List categories
    Categories,

    /// List shops
    Shops,

    /// List bills with resolved names
    Bills {
        /// Only bills of this date
        #[arg(long)]
        date: Option<String>,
    },

    /// Resolve an id to its name
    Name {
        #[arg(value_enum)]
        entity: Entity,
        id: RowId,
    },

    /// Show statistics about the database
    Stats,

    /// Copy the database into the backup directory
    Backup {
        /// Destination file (defaults to the configured backup directory)
        #[arg(long)]
        to: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Entity {
    Category,
    Shop,
    Usage,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

fn emit_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolved locations for this run
struct Paths {
    config: PathBuf,
    database: PathBuf,
    backup: PathBuf,
    data_dir: PathBuf,
    /// `--database` as given on the command line
    database_override: Option<PathBuf>,
}

fn resolve_paths(cli: &Cli) -> anyhow::Result<Paths> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };
    let data_dir = config::default_data_dir()?;
    let loaded = config::load_config(&config_path)
        .with_context(|| format!("reading config {}", config_path.display()))?
        .unwrap_or_default();

    let database = cli
        .database
        .clone()
        .unwrap_or_else(|| loaded.database_path(&data_dir));

    Ok(Paths {
        config: config_path,
        backup: loaded.backup_path(&data_dir),
        database,
        data_dir,
        database_override: cli.database.clone(),
    })
}

fn open_store(db_path: &Path) -> anyhow::Result<BillStore> {
    config::ensure_db_dir(db_path)?;
    Ok(BillStore::open(db_path)?)
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(cli) {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    let paths = resolve_paths(&cli)?;

    if let Commands::Init { force } = cli.command {
        return run_init(&paths, force, mode);
    }

    let mut store = open_store(&paths.database)?;
    let result = dispatch(&store, cli.command, &paths, mode);
    store.close()?;
    result
}

fn run_init(paths: &Paths, force: bool, mode: OutputMode) -> anyhow::Result<()> {
    let mut defaults = BillTrackerConfig::with_defaults_in(&paths.data_dir);
    if let Some(database) = &paths.database_override {
        defaults = defaults.with_database(&std::path::absolute(database)?);
    }

    let created = if force {
        config::write_config(&paths.config, &defaults, true)?;
        true
    } else {
        config::initialize_config(&paths.config, &defaults)?
    };

    let mut store = open_store(&paths.database)?;
    store.close()?;

    if mode.is_human() {
        if created {
            ui::success(&format!("Config written to {}", paths.config.display()));
        } else {
            ui::info("Config already present", &paths.config.display().to_string());
        }
        ui::header(Icons::DATABASE, &format!("Database: {}", paths.database.display()));
    } else {
        emit_json(&serde_json::json!({
            "config": paths.config,
            "config_created": created,
            "database": paths.database,
        }))?;
    }
    Ok(())
}

fn dispatch(store: &BillStore, command: Commands, paths: &Paths, mode: OutputMode) -> anyhow::Result<()> {
    match command {
        Commands::Init { .. } => anyhow::bail!("init cannot run against an open store"),

        Commands::AddCategory { name } => {
            let id = store.add_category(&name)?;
            report_added(mode, "category", id, &name)
        }

        Commands::AddUsage { name, category } => {
            let id = store.add_usage(&name, category)?;
            report_added(mode, "usage", id, &name)
        }

        Commands::AddShop { name } => {
            let id = store.add_shop(&name)?;
            report_added(mode, "shop", id, &name)
        }

        Commands::AddBill { date, price, shop, usage, file } => {
            let id = store.add_bill(&date, price, shop, usage, file.as_deref())?;
            let label = format!("{} {:.2}", date, price);
            report_added(mode, "bill", id, &label)
        }

        Commands::Usages { category } => {
            let usages = match category {
                Some(id) => store.get_usages_in_category(id)?,
                None => store.get_all_usages(),
            };

            if !mode.is_human() {
                return emit_json(&usages);
            }
            if usages.is_empty() {
                ui::empty("usages");
            } else {
                println!("{}", ui::usages_table(&usages));
            }
            Ok(())
        }

        Commands::Categories => {
            let categories = store.get_all_categories()?;

            if !mode.is_human() {
                return emit_json(&categories);
            }
            if categories.is_empty() {
                ui::empty("categories");
            } else {
                println!("{}", ui::named_table(categories.iter().map(|c| (c.id, c.name.as_str()))));
            }
            Ok(())
        }

        Commands::Shops => {
            let shops = store.get_all_shops()?;

            if !mode.is_human() {
                return emit_json(&shops);
            }
            if shops.is_empty() {
                ui::empty("shops");
            } else {
                println!("{}", ui::named_table(shops.iter().map(|s| (s.id, s.name.as_str()))));
            }
            Ok(())
        }

        Commands::Bills { date } => {
            let bills = match &date {
                Some(date) => store.get_bills_on(date)?,
                None => store.get_all_bills()?,
            };
            let details = bills
                .iter()
                .map(|bill| store.describe_bill(bill))
                .collect::<billtracker::Result<Vec<_>>>()?;

            if !mode.is_human() {
                return emit_json(&details);
            }
            if details.is_empty() {
                ui::empty("bills");
                return Ok(());
            }

            println!("{}", ui::bills_table(&details));
            let total: f64 = details.iter().map(|b| b.price).sum();
            println!("{} Total: {}", Icons::BILL, ui::amount(total));
            Ok(())
        }

        Commands::Name { entity, id } => {
            let (label, name) = match entity {
                Entity::Category => ("category", store.get_category_name(id)?),
                Entity::Shop => ("shop", store.get_shop_name(id)?),
                Entity::Usage => ("usage", store.get_usage_name(id)?),
            };

            if mode.is_human() {
                println!("{}", name);
            } else {
                emit_json(&serde_json::json!({ "entity": label, "id": id, "name": name }))?;
            }
            Ok(())
        }

        Commands::Stats => {
            let stats = store.stats()?;

            if !mode.is_human() {
                return emit_json(&stats);
            }
            ui::header(Icons::STATS, &format!("Bill Tracker Statistics ({})", paths.database.display()));
            println!("{}", ui::stats_table(&stats));
            Ok(())
        }

        Commands::Backup { to } => {
            let dest = to.unwrap_or_else(|| paths.backup.join(config::DATABASE_FILE));
            store.backup_to(&dest)?;

            if mode.is_human() {
                ui::success(&format!("{} Backup written to {}", Icons::SAVE, dest.display()));
            } else {
                emit_json(&serde_json::json!({ "backup": dest }))?;
            }
            Ok(())
        }
    }
}

fn report_added(mode: OutputMode, entity: &str, id: RowId, label: &str) -> anyhow::Result<()> {
    if mode.is_human() {
        let icon = match entity {
            "shop" => Icons::SHOP,
            "bill" => Icons::BILL,
            _ => Icons::TAG,
        };
        ui::success(&format!("{} Added {} #{}: {}", icon, entity, id, label));
        Ok(())
    } else {
        emit_json(&serde_json::json!({ "entity": entity, "id": id, "name": label }))
    }
}
