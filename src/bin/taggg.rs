//! Taggg CLI — metadata tagging over a SQLite database.
//!
//! Usage:
//!   taggg init [--db path]
//!   taggg write <subject> [predicate] [object] [creator] [--db path]
//!   taggg exists <subject> [predicate] [object] [creator] [--db path]
//!   taggg fetch [--value v] [--order-by column] [--limit n] [--db path]

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taggg::{
    OpenStore, ResourceField, ResourceFilter, ResourceId, ResourceQuery, ResourceSpec, SortOrder,
    SqliteStore, TagEngine,
};

#[derive(Parser)]
#[command(
    name = "taggg",
    version,
    about = "Multiuser metadata tagging engine"
)]
struct Cli {
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database tables and reserved resources
    Init,
    /// Drop the database tables and all data
    Destroy,
    /// Create a tag among subject, predicate, object and creator
    Write {
        /// Subject specifier
        subject: Option<String>,
        /// Predicate specifier
        predicate: Option<String>,
        /// Object specifier
        object: Option<String>,
        /// Creator specifier
        creator: Option<String>,
    },
    /// Remove a tag
    Erase {
        /// Subject specifier
        subject: Option<String>,
        /// Predicate specifier
        predicate: Option<String>,
        /// Object specifier
        object: Option<String>,
        /// Creator specifier
        creator: Option<String>,
    },
    /// Check whether a tag exists
    Exists {
        /// Subject specifier
        subject: Option<String>,
        /// Predicate specifier
        predicate: Option<String>,
        /// Object specifier
        object: Option<String>,
        /// Creator specifier
        creator: Option<String>,
    },
    /// List resources as JSON
    Fetch {
        /// Filter by uri
        #[arg(long)]
        uri: Option<String>,
        /// Filter by class id
        #[arg(long)]
        class: Option<i64>,
        /// Filter by value
        #[arg(long)]
        value: Option<String>,
        /// Order by a column (id, uri, class, value, content)
        #[arg(long)]
        order_by: Option<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
        /// Number of results to skip
        #[arg(long)]
        offset: Option<usize>,
    },
}

/// Get the default database path (~/.local/share/taggg/taggg.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let taggg_dir = data_dir.join("taggg");
    std::fs::create_dir_all(&taggg_dir).ok();
    taggg_dir.join("taggg.db")
}

/// Interpret a CLI argument as a resource specifier. Absent arguments are
/// the empty resource; numeric arguments reference resources by id.
fn spec_from_arg(arg: &Option<String>) -> ResourceSpec {
    match arg {
        None => ResourceSpec::Empty,
        Some(raw) => match raw.parse::<i64>() {
            Ok(id) => ResourceSpec::from(id),
            Err(_) => ResourceSpec::parse(raw),
        },
    }
}

fn parse_field(name: &str) -> Option<ResourceField> {
    match name {
        "id" => Some(ResourceField::Id),
        "uri" => Some(ResourceField::Uri),
        "class" => Some(ResourceField::Class),
        "value" => Some(ResourceField::Value),
        "content" => Some(ResourceField::Content),
        _ => None,
    }
}

fn cmd_destroy(store: SqliteStore, db_path: &Path) -> i32 {
    match store.destroy() {
        Ok(()) => {
            println!("Destroyed tables in {}", db_path.display());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_write(
    store: SqliteStore,
    subject: &Option<String>,
    predicate: &Option<String>,
    object: &Option<String>,
    creator: &Option<String>,
) -> i32 {
    let engine = TagEngine::new(Arc::new(store));
    match engine.write(
        spec_from_arg(subject),
        spec_from_arg(predicate),
        spec_from_arg(object),
        spec_from_arg(creator),
    ) {
        Ok(_) => {
            println!("Tag written");
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_erase(
    store: SqliteStore,
    subject: &Option<String>,
    predicate: &Option<String>,
    object: &Option<String>,
    creator: &Option<String>,
) -> i32 {
    let engine = TagEngine::new(Arc::new(store));
    match engine.erase(
        spec_from_arg(subject),
        spec_from_arg(predicate),
        spec_from_arg(object),
        spec_from_arg(creator),
    ) {
        Ok(_) => {
            println!("Tag erased");
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_exists(
    store: SqliteStore,
    subject: &Option<String>,
    predicate: &Option<String>,
    object: &Option<String>,
    creator: &Option<String>,
) -> i32 {
    let engine = TagEngine::new(Arc::new(store));
    match engine.exists(
        spec_from_arg(subject),
        spec_from_arg(predicate),
        spec_from_arg(object),
        spec_from_arg(creator),
    ) {
        Ok(found) => {
            println!("{}", found);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_fetch(
    store: SqliteStore,
    uri: Option<String>,
    class: Option<i64>,
    value: Option<String>,
    order_by: Option<String>,
    desc: bool,
    limit: Option<usize>,
    offset: Option<usize>,
) -> i32 {
    let mut filter = ResourceFilter::new();
    if let Some(uri) = uri {
        filter = filter.with_uri(uri);
    }
    if let Some(class) = class {
        filter = filter.with_class(ResourceId::new(class));
    }
    if let Some(value) = value {
        filter = filter.with_value(value);
    }

    let mut query = ResourceQuery::new().with_filter(filter);
    if let Some(name) = order_by {
        let Some(field) = parse_field(&name) else {
            eprintln!("Error: unknown column '{}'", name);
            return 1;
        };
        let order = if desc {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        };
        query = query.order_by(field, order);
    }
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    if let Some(offset) = offset {
        query = query.offset(offset);
    }

    let engine = TagEngine::new(Arc::new(store)).with_fetch_query(query);
    match engine.fetch() {
        Ok(resources) => match serde_json::to_string_pretty(&resources) {
            Ok(json) => {
                println!("{}", json);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn run(cli: Cli) -> i32 {
    let db_path = cli.db.unwrap_or_else(default_db_path);
    let store = match SqliteStore::open(&db_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: failed to open database: {}", e);
            return 1;
        }
    };

    match cli.command {
        Commands::Init => {
            // Opening the store creates the schema and reserved rows
            println!("Initialized {}", db_path.display());
            0
        }
        Commands::Destroy => cmd_destroy(store, &db_path),
        Commands::Write {
            subject,
            predicate,
            object,
            creator,
        } => cmd_write(store, &subject, &predicate, &object, &creator),
        Commands::Erase {
            subject,
            predicate,
            object,
            creator,
        } => cmd_erase(store, &subject, &predicate, &object, &creator),
        Commands::Exists {
            subject,
            predicate,
            object,
            creator,
        } => cmd_exists(store, &subject, &predicate, &object, &creator),
        Commands::Fetch {
            uri,
            class,
            value,
            order_by,
            desc,
            limit,
            offset,
        } => cmd_fetch(store, uri, class, value, order_by, desc, limit, offset),
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    std::process::exit(run(cli));
}
