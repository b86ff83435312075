use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use segbase_core::{filter_from_json, Document, DocumentStore, FindOptions, StoreOptions};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "segbase")]
#[command(about = "SegBase CLI - command-line interface for the SegBase document store")]
#[command(version)]
struct Cli {
    /// Storage root directory
    #[arg(long, global = true, default_value = "segbase-data")]
    path: PathBuf,

    /// Maximum serialized bytes per segment file
    #[arg(long, global = true)]
    max_segment_bytes: Option<u64>,

    /// Maximum documents per segment file
    #[arg(long, global = true)]
    max_items: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert one document (a JSON object) into a collection
    Insert {
        collection: String,
        /// Document as inline JSON
        json: String,
    },
    /// Look up a document by id
    Get {
        collection: String,
        id: String,
    },
    /// Scan a collection with an optional filter
    Find {
        collection: String,
        /// Filter as a JSON object; values of the form {"min":..,"max":..}
        /// are inclusive ranges, strings match as substrings
        #[arg(long, default_value = "{}")]
        filter: String,
        /// Maximum number of documents to return
        #[arg(long)]
        limit: Option<usize>,
        /// Number of matching documents to skip
        #[arg(long)]
        skip: Option<usize>,
    },
    /// Merge a partial update into a document
    Update {
        collection: String,
        id: String,
        /// Patch as inline JSON; nested objects merge, everything else replaces
        json: String,
    },
    /// Delete a document by id
    Delete {
        collection: String,
        id: String,
    },
    /// Import a JSON array of documents from a file
    Import {
        collection: String,
        /// JSON file holding an array of objects
        file: PathBuf,
    },
    /// Export a full collection to a JSON array file
    Export {
        collection: String,
        /// Output JSON file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut options = StoreOptions::new();
    if let Some(bytes) = cli.max_segment_bytes {
        options = options.with_max_segment_bytes(bytes);
    }
    if let Some(items) = cli.max_items {
        options = options.with_max_items_per_segment(items);
    }
    let store = DocumentStore::open(&cli.path, options)
        .with_context(|| format!("failed to open store at {}", cli.path.display()))?;

    match cli.command {
        Commands::Insert { collection, json } => insert(&store, &collection, &json),
        Commands::Get { collection, id } => get(&store, &collection, &id),
        Commands::Find {
            collection,
            filter,
            limit,
            skip,
        } => find(&store, &collection, &filter, limit, skip),
        Commands::Update {
            collection,
            id,
            json,
        } => update(&store, &collection, &id, &json),
        Commands::Delete { collection, id } => delete(&store, &collection, &id),
        Commands::Import { collection, file } => import(&store, &collection, &file),
        Commands::Export { collection, file } => export(&store, &collection, &file),
    }
}

fn parse_document(json: &str) -> Result<Document> {
    let value: Value =
        serde_json::from_str(json).context("argument is not valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("argument must be a JSON object"),
    }
}

fn print_document(document: &Document) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(document)?);
    Ok(())
}

fn insert(store: &DocumentStore, collection: &str, json: &str) -> Result<()> {
    let document = parse_document(json)?;
    let created = store.collection(collection).insert_one(document)?;
    print_document(&created)
}

fn get(store: &DocumentStore, collection: &str, id: &str) -> Result<()> {
    match store.collection(collection).find_by_id(id)? {
        Some(document) => print_document(&document),
        None => bail!("no document with id '{id}' in '{collection}'"),
    }
}

fn find(
    store: &DocumentStore,
    collection: &str,
    filter_json: &str,
    limit: Option<usize>,
    skip: Option<usize>,
) -> Result<()> {
    let filter_value: Value =
        serde_json::from_str(filter_json).context("--filter is not valid JSON")?;
    if !filter_value.is_object() {
        bail!("--filter must be a JSON object");
    }
    let filter = filter_from_json(&filter_value);

    let mut options = FindOptions::new();
    if let Some(limit) = limit {
        options = options.with_limit(limit);
    }
    if let Some(skip) = skip {
        options = options.with_skip(skip);
    }

    let matched = store.collection(collection).find(&filter, &options)?;
    println!("{}", serde_json::to_string_pretty(&matched)?);
    eprintln!("{} document(s)", matched.len());
    Ok(())
}

fn update(store: &DocumentStore, collection: &str, id: &str, json: &str) -> Result<()> {
    let patch = parse_document(json)?;
    match store.collection(collection).update_one(id, &patch)? {
        Some(merged) => print_document(&merged),
        None => bail!("no document with id '{id}' in '{collection}'"),
    }
}

fn delete(store: &DocumentStore, collection: &str, id: &str) -> Result<()> {
    if store.collection(collection).delete_one(id)? {
        println!("deleted {id}");
    } else {
        println!("not found: {id}");
    }
    Ok(())
}

fn import(store: &DocumentStore, collection: &str, file: &Path) -> Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let Value::Array(entries) = value else {
        bail!("{} must hold a JSON array of objects", file.display());
    };
    let mut documents = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            Value::Object(map) => documents.push(map),
            _ => bail!("{} contains a non-object entry", file.display()),
        }
    }

    let created = store.collection(collection).insert_many(documents)?;
    println!("imported {} document(s) into '{}'", created.len(), collection);
    Ok(())
}

fn export(store: &DocumentStore, collection: &str, file: &Path) -> Result<()> {
    let documents = store
        .collection(collection)
        .find(&Default::default(), &FindOptions::new())?;
    let json = serde_json::to_string_pretty(&documents)?;
    fs::write(file, json).with_context(|| format!("failed to write {}", file.display()))?;
    println!("exported {} document(s) to {}", documents.len(), file.display());
    Ok(())
}
