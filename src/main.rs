//! Lodgebook CLI - administrative access to the listing store

use anyhow::Context;
use clap::{Parser, Subcommand};
use lodgebook::params::parse_params;
use lodgebook::{ui, Account, Entity, EntityData, EntityKind, Error, LookupKey, Storage};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "lodgebook")]
#[command(version = "0.0.1")]
#[command(about = "Listing persistence engine - file or SQLite backed")]
#[command(long_about = r#"
Lodgebook stores accounts, regions, locations, listings, reviews and
amenities in either a JSON snapshot file or a SQLite database, selected
with LODGEBOOK_TYPE_STORAGE (file | db).

Example usage:
  lodgebook create Region name="California"
  lodgebook create Location region_id="<id>" name="San_Francisco"
  lodgebook link Listing.<id> Amenity.<id>
  lodgebook related Region.<id> Location
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to lodgebook.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an entity from key=value attributes
    Create {
        /// Entity kind (Account, Region, Location, Listing, Review, Amenity)
        kind: String,

        /// Attributes, e.g. name="San_Francisco" max_guest=4 latitude=37.77
        params: Vec<String>,
    },

    /// Show one entity
    Show {
        /// Lookup key, <Kind>.<id>
        key: String,
    },

    /// List all entities, or those of one kind
    List {
        kind: Option<String>,
    },

    /// Update attributes of an entity
    Update {
        /// Lookup key, <Kind>.<id>
        key: String,

        /// Attributes to set
        params: Vec<String>,
    },

    /// Delete an entity and everything that cascades from it
    Destroy {
        /// Lookup key, <Kind>.<id>
        key: String,
    },

    /// Count entities, or those of one kind
    Count {
        kind: Option<String>,
    },

    /// Associate two entities, e.g. a listing and an amenity
    Link {
        a: String,
        b: String,
    },

    /// Remove an association
    Unlink {
        a: String,
        b: String,
    },

    /// Entities of a kind related to an entity
    Related {
        /// Lookup key, <Kind>.<id>
        key: String,

        /// Kind to resolve to
        kind: String,
    },

    /// Show backend and per-kind counts
    Stats,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = lodgebook::config::resolve(cli.config.as_deref()).context("Failed to load configuration")?;
    let mut storage = Storage::open(&config)?;

    let result = run(&mut storage, cli.command, cli.json);
    storage.close()?;
    if let Err(e) = result {
        ui::error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

fn run(storage: &mut Storage, command: Commands, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::Create { kind, params } => {
            let kind: EntityKind = kind.parse()?;
            let mut attrs = attributes(&params);
            if kind == EntityKind::Account {
                Account::hash_password_attribute(&mut attrs)?;
            }

            let entity = Entity::new(EntityData::from_attributes(kind, &attrs)?);
            let mut work = storage.unit_of_work();
            work.stage(&entity)?;
            work.persist()?;

            if json {
                print_json(&[&entity])?;
            } else {
                ui::success(&format!("Created {}", entity.key_string()));
            }
        }

        Commands::Show { key } => {
            let entity = fetch(storage, &key)?;
            if json {
                print_json(&[&entity])?;
            } else {
                ui::entity_line(&entity);
                for (name, value) in entity.to_attributes() {
                    ui::attribute_row(&name, &value);
                }
            }
        }

        Commands::List { kind } => {
            let kind = kind.map(|k| k.parse::<EntityKind>()).transpose()?;
            let entities = storage.enumerate(kind)?;
            print_entities(entities.values(), json)?;
        }

        Commands::Update { key, params } => {
            let mut entity = fetch(storage, &key)?;
            let mut attrs = attributes(&params);
            if entity.kind() == EntityKind::Account {
                Account::hash_password_attribute(&mut attrs)?;
            }
            for (name, value) in attrs {
                entity.set_attribute(&name, value)?;
            }

            let mut work = storage.unit_of_work();
            work.stage(&entity)?;
            work.persist()?;
            if json {
                print_json(&[&entity])?;
            } else {
                ui::success(&format!("Updated {}", entity.key_string()));
            }
        }

        Commands::Destroy { key } => {
            let entity = fetch(storage, &key)?;
            let mut work = storage.unit_of_work();
            work.remove(Some(&entity))?;
            work.persist()?;
            ui::deleted(&entity);
        }

        Commands::Count { kind } => {
            let kind = kind.map(|k| k.parse::<EntityKind>()).transpose()?;
            println!("{}", storage.count(kind)?);
        }

        Commands::Link { a, b } => {
            let a = fetch(storage, &a)?;
            let b = fetch(storage, &b)?;
            let mut work = storage.unit_of_work();
            work.link(&a, &b)?;
            work.persist()?;
            ui::linked(&a, &b);
        }

        Commands::Unlink { a, b } => {
            let a = fetch(storage, &a)?;
            let b = fetch(storage, &b)?;
            let mut work = storage.unit_of_work();
            work.unlink(&a, &b)?;
            work.persist()?;
            ui::unlinked(&a, &b);
        }

        Commands::Related { key, kind } => {
            let entity = fetch(storage, &key)?;
            let related = storage.related(&entity, kind.parse()?)?;
            print_entities(related.values(), json)?;
        }

        Commands::Stats => {
            let mut counts = Vec::new();
            for kind in EntityKind::all() {
                counts.push((kind.as_str(), storage.count(Some(*kind))?));
            }

            if json {
                let map: serde_json::Map<String, serde_json::Value> = counts
                    .iter()
                    .map(|(kind, count)| (kind.to_string(), serde_json::Value::from(*count)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                ui::header(&format!("Lodgebook Statistics ({} backend)", storage.backend_name()));
                println!("{}", ui::stats_table(&counts));
            }
        }
    }

    Ok(())
}

fn attributes(params: &[String]) -> lodgebook::Attributes {
    let (attrs, skipped) = parse_params(params);
    for arg in skipped {
        ui::warn(&format!("Ignoring malformed parameter {}", arg));
    }
    attrs
}

fn fetch(storage: &mut Storage, key: &str) -> lodgebook::Result<Entity> {
    let parsed = LookupKey::parse(key)?;
    storage
        .get(parsed.kind, &parsed.id)?
        .ok_or_else(|| Error::NotFound(parsed.to_key_string()))
}

fn to_json(entity: &Entity) -> serde_json::Value {
    serde_json::Value::Object(
        entity
            .to_attributes()
            .into_iter()
            .map(|(name, value)| (name, value.into()))
            .collect(),
    )
}

fn print_json(entities: &[&Entity]) -> anyhow::Result<()> {
    let values: Vec<serde_json::Value> = entities.iter().map(|e| to_json(e)).collect();
    if let [single] = values.as_slice() {
        println!("{}", serde_json::to_string_pretty(single)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&values)?);
    }
    Ok(())
}

fn print_entities<'a>(entities: impl Iterator<Item = &'a Entity>, json: bool) -> anyhow::Result<()> {
    let entities: Vec<&Entity> = entities.collect();
    if json {
        let values: Vec<serde_json::Value> = entities.iter().map(|e| to_json(e)).collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else if entities.is_empty() {
        println!("{}", ui::muted("No entities found."));
    } else {
        println!("{}", ui::entity_table(entities));
    }
    Ok(())
}
