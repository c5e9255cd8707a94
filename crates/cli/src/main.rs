mod config;
mod error;

use std::path::Path;

use clap::{Parser, Subcommand, ValueEnum};
use rbac::{Item, ItemKind, ItemStore, RbacManager, SubjectId};
use storage::{FileStore, SqliteStore};

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "warden.toml";

#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Role/permission authorization engine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the configured storage backend
    Init,
    /// Manage permission and role items
    #[command(subcommand)]
    Item(ItemCommands),
    /// Manage parent/child edges between items
    #[command(subcommand)]
    Child(ChildCommands),
    /// Assign an item to a subject
    Assign { subject: SubjectId, name: String },
    /// Revoke one assignment from a subject
    Revoke { subject: SubjectId, name: String },
    /// Revoke every assignment from a subject
    RevokeAll { subject: SubjectId },
    /// Check whether a subject holds at least one of the names
    Check {
        subject: SubjectId,
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ItemCommands {
    /// Create or update an item
    Add {
        name: String,
        /// Item kind
        #[arg(long, value_enum, default_value = "permission")]
        kind: KindArg,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List items
    List {
        /// Restrict to one kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Show one item with its direct children
    Show { name: String },
    /// Remove an item together with its edges and assignments
    Remove { name: String },
}

#[derive(Subcommand)]
enum ChildCommands {
    /// Attach a child under a parent
    Add { parent: String, child: String },
    /// Detach a child from a parent
    Remove { parent: String, child: String },
    /// Detach every child from a parent
    Clear { parent: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Permission,
    Role,
}

impl From<KindArg> for ItemKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Permission => ItemKind::Permission,
            KindArg::Role => ItemKind::Role,
        }
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config()?;

    match config.storage.backend.as_str() {
        "sqlite" => {
            let store = SqliteStore::open(&config.storage.db_path)?;
            if matches!(cli.command, Commands::Init) {
                println!("initialized sqlite store at {}", config.storage.db_path.display());
                return Ok(());
            }
            dispatch(RbacManager::from_config(store, &config.rbac), cli.command)
        }
        "file" => {
            let store = FileStore::new(&config.storage.items_file, &config.storage.assigns_file);
            if matches!(cli.command, Commands::Init) {
                store.init()?;
                println!(
                    "initialized file store at {} and {}",
                    config.storage.items_file.display(),
                    config.storage.assigns_file.display()
                );
                return Ok(());
            }
            dispatch(RbacManager::from_config(store, &config.rbac), cli.command)
        }
        other => Err(config::ConfigError::UnknownBackend {
            name: other.to_string(),
        }
        .into()),
    }
}

fn load_config() -> Result<Config> {
    if Path::new(CONFIG_FILE).exists() {
        Ok(Config::load(CONFIG_FILE)?)
    } else {
        Ok(Config::default())
    }
}

fn dispatch<S: ItemStore>(mut manager: RbacManager<S>, command: Commands) -> Result<()> {
    match command {
        Commands::Init => Ok(()),
        Commands::Item(command) => match command {
            ItemCommands::Add {
                name,
                kind,
                title,
                description,
            } => cmd_item_add(&mut manager, name, kind.into(), title, description),
            ItemCommands::List { kind } => cmd_item_list(&manager, kind.map(Into::into)),
            ItemCommands::Show { name } => cmd_item_show(&manager, &name),
            ItemCommands::Remove { name } => cmd_item_remove(&mut manager, &name),
        },
        Commands::Child(command) => match command {
            ChildCommands::Add { parent, child } => {
                let added = manager.attach(&parent, &child)?;
                println!(
                    "{}",
                    if added { "attached" } else { "already attached" }
                );
                Ok(())
            }
            ChildCommands::Remove { parent, child } => {
                manager.detach(&parent, &child)?;
                println!("detached");
                Ok(())
            }
            ChildCommands::Clear { parent } => {
                manager.detach_all(&parent)?;
                println!("detached all children of {parent}");
                Ok(())
            }
        },
        Commands::Assign { subject, name } => {
            let added = manager.assign(subject, &name)?;
            println!(
                "{}",
                if added { "assigned" } else { "already assigned" }
            );
            Ok(())
        }
        Commands::Revoke { subject, name } => {
            manager.revoke(subject, &name)?;
            println!("revoked");
            Ok(())
        }
        Commands::RevokeAll { subject } => {
            manager.revoke_all(subject)?;
            println!("revoked all assignments of subject {subject}");
            Ok(())
        }
        Commands::Check { subject, names } => cmd_check(&mut manager, subject, &names),
    }
}

fn cmd_item_add<S: ItemStore>(
    manager: &mut RbacManager<S>,
    name: String,
    kind: ItemKind,
    title: String,
    description: String,
) -> Result<()> {
    let item = Item::new(kind, name)
        .with_title(title)
        .with_description(description);
    manager.save(&item)?;
    println!("saved {item}");
    Ok(())
}

fn cmd_item_list<S: ItemStore>(manager: &RbacManager<S>, kind: Option<ItemKind>) -> Result<()> {
    let items = manager.items(kind)?;
    if items.is_empty() {
        println!("No items found.");
        return Ok(());
    }

    println!("{:<32}  {:<12}  TITLE", "NAME", "KIND");
    println!("{}", "-".repeat(64));
    for item in items {
        println!("{:<32}  {:<12}  {}", item.name, kind_label(item.kind), item.title);
    }
    Ok(())
}

fn cmd_item_show<S: ItemStore>(manager: &RbacManager<S>, name: &str) -> Result<()> {
    let item = manager.item(name)?.ok_or_else(|| Error::ItemNotFound {
        name: name.to_string(),
    })?;

    println!("name:        {}", item.name);
    println!("kind:        {}", kind_label(item.kind));
    if !item.title.is_empty() {
        println!("title:       {}", item.title);
    }
    if !item.description.is_empty() {
        println!("description: {}", item.description);
    }
    let edges = manager.store().child_edges()?;
    if let Some(children) = edges.get(name) {
        if !children.is_empty() {
            println!("children:    {}", children.join(", "));
        }
    }
    Ok(())
}

fn cmd_item_remove<S: ItemStore>(manager: &mut RbacManager<S>, name: &str) -> Result<()> {
    if manager.item(name)?.is_none() {
        return Err(Error::ItemNotFound {
            name: name.to_string(),
        });
    }
    manager.remove(name)?;
    println!("removed {name}");
    Ok(())
}

fn cmd_check<S: ItemStore>(
    manager: &mut RbacManager<S>,
    subject: SubjectId,
    names: &[String],
) -> Result<()> {
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    if manager.has(&names, Some(subject))? {
        println!("granted");
        Ok(())
    } else {
        println!("denied");
        std::process::exit(1);
    }
}

fn kind_label(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Permission => "permission",
        ItemKind::Role => "role",
    }
}
