mod review;
mod tree;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use review::{review_cards, undo_last, ReviewArgs};
use spares::collection::Collection;
use spares::config::{get_env_config, Environment};
use spares::model::{CardId, DeckConfigId, DeckId, FilteredOrder, FilteredSearchTerm};
use spares::schema::card::CardsSelector;
use spares::schema::deck::{CreateDeckRequest, CreateFilteredDeckRequest};
use tree::{build_tree, deck_relations, print_tree};

/// Spaced Repetition System
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, default_value_t = Environment::Production)]
    environment: Environment,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Study due cards
    Study(ReviewArgs),
    /// Manage decks
    Deck(DeckArgs),
    /// Manage cards
    Card(CardArgs),
    /// Undo the last graded review
    Undo,
    /// Show due-card counts
    Stats(StatsArgs),
    /// Repair orphaned rows and out-of-range fields in the store
    FixIntegrity,
}

#[derive(Args, Debug)]
struct DeckArgs {
    #[command(subcommand)]
    command: DeckCommands,
}

#[derive(Debug, Subcommand)]
enum DeckCommands {
    /// Create a deck, creating any missing ancestors
    Create {
        name: String,
        #[arg(long)]
        config_id: Option<DeckConfigId>,
    },
    /// Create a filtered deck from a search term
    CreateFiltered {
        name: String,
        search: String,
        #[arg(long, default_value_t = 100)]
        limit: u32,
        #[arg(long, default_value_t = true)]
        resched: bool,
    },
    /// Rename a deck (and its descendants' shared prefix)
    Rename { deck_id: DeckId, new_name: String },
    /// Remove a deck
    Remove {
        deck_id: DeckId,
        #[arg(long)]
        cards_too: bool,
        #[arg(long)]
        children_too: bool,
    },
    /// List every deck as a hierarchy
    List,
}

#[derive(Args, Debug)]
struct CardArgs {
    #[command(subcommand)]
    command: CardCommands,
}

#[derive(Debug, Subcommand)]
enum CardCommands {
    /// Suspend cards by id
    Suspend { card_ids: Vec<CardId> },
    /// Unsuspend cards by id
    Unsuspend { card_ids: Vec<CardId> },
    /// Manually bury a card
    Bury { card_id: CardId },
    /// Unbury every buried card, optionally limited to one deck
    Unbury {
        #[arg(long)]
        deck_id: Option<DeckId>,
    },
}

#[derive(Args, Debug)]
struct StatsArgs {
    deck_id: DeckId,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let env_config = get_env_config(cli.environment);
    let mut collection = Collection::open(&env_config.database_url)
        .await
        .map_err(|e| miette::miette!("{e}"))?;

    let result = run(cli.command, &mut collection).await;

    collection
        .save()
        .await
        .map_err(|e| miette::miette!("Failed to save collection: {e}"))?;

    result
}

async fn run(command: Commands, collection: &mut Collection) -> miette::Result<()> {
    match command {
        Commands::Study(args) => review_cards(args, collection)
            .await
            .map_err(|e| miette::miette!("{e}")),
        Commands::Deck(args) => run_deck(args.command, collection).await,
        Commands::Card(args) => run_card(args.command, collection).await,
        Commands::Undo => {
            match undo_last(collection).await.map_err(|e| miette::miette!("{e}"))? {
                Some(card_id) => println!("Restored card {card_id}"),
                None => println!("Nothing to undo"),
            }
            Ok(())
        }
        Commands::Stats(args) => {
            let today = collection.today(chrono::Utc::now());
            let counts = spares::api::statistics::due_counts(collection.pool(), args.deck_id, today)
                .await
                .map_err(|e| miette::miette!("{e}"))?;
            println!("New:      {}", counts.new_count.to_string().green());
            println!("Learning: {}", counts.learning_count.to_string().yellow());
            println!("Review:   {}", counts.review_count.to_string().blue());
            Ok(())
        }
        Commands::FixIntegrity => {
            let report = collection.fix_integrity().await.map_err(|e| miette::miette!("{e}"))?;
            println!("{report:?}");
            Ok(())
        }
    }
}

async fn run_deck(command: DeckCommands, collection: &mut Collection) -> miette::Result<()> {
    match command {
        DeckCommands::Create { name, config_id } => {
            let pool = collection.pool().clone();
            let id = spares::api::deck::create_deck(
                &pool,
                &mut collection.decks,
                CreateDeckRequest { name, config_id },
            )
            .await
            .map_err(|e| miette::miette!("{e}"))?;
            println!("Created deck {id}");
        }
        DeckCommands::CreateFiltered { name, search, limit, resched } => {
            let pool = collection.pool().clone();
            let id = spares::api::deck::create_filtered_deck(
                &pool,
                &mut collection.decks,
                CreateFilteredDeckRequest {
                    name,
                    terms: vec![FilteredSearchTerm {
                        search,
                        limit,
                        order: FilteredOrder::Due,
                    }],
                    resched,
                },
            )
            .await
            .map_err(|e| miette::miette!("{e}"))?;
            let now = chrono::Utc::now();
            collection
                .rebuild_filtered(id, now)
                .await
                .map_err(|e| miette::miette!("{e}"))?;
            println!("Created filtered deck {id}");
        }
        DeckCommands::Rename { deck_id, new_name } => {
            spares::api::deck::rename_deck(&mut collection.decks, deck_id, &new_name)
                .map_err(|e| miette::miette!("{e}"))?;
            println!("Renamed deck {deck_id}");
        }
        DeckCommands::Remove { deck_id, cards_too, children_too } => {
            let removed = spares::api::deck::remove_deck(&mut collection.decks, deck_id, cards_too, children_too)
                .map_err(|e| miette::miette!("{e}"))?;
            println!("Removed {} deck(s)", removed.len());
        }
        DeckCommands::List => {
            let today = collection.today(chrono::Utc::now());
            let decks = spares::api::deck::list_decks(&collection.decks, today);
            let names: Vec<String> = decks.decks.iter().map(|d| d.name.clone()).collect();
            let relations = deck_relations(&names);
            let tree = build_tree(&relations);
            for root in tree.keys().filter(|&name| relations.iter().all(|(_, child)| child != name)) {
                print_tree(&tree, root, 0);
            }
        }
    }
    Ok(())
}

async fn run_card(command: CardCommands, collection: &mut Collection) -> miette::Result<()> {
    match command {
        CardCommands::Suspend { card_ids } => {
            let n = spares::api::card::suspend_cards(collection.pool(), &CardsSelector::Ids(card_ids))
                .await
                .map_err(|e| miette::miette!("{e}"))?;
            println!("Suspended {n} card(s)");
        }
        CardCommands::Unsuspend { card_ids } => {
            let n = spares::api::card::unsuspend_cards(collection.pool(), &CardsSelector::Ids(card_ids))
                .await
                .map_err(|e| miette::miette!("{e}"))?;
            println!("Unsuspended {n} card(s)");
        }
        CardCommands::Bury { card_id } => {
            spares::api::card::bury_card(collection.pool(), card_id)
                .await
                .map_err(|e| miette::miette!("{e}"))?;
            println!("Buried card {card_id}");
        }
        CardCommands::Unbury { deck_id } => {
            let n = spares::api::card::unbury_cards(collection.pool(), deck_id)
                .await
                .map_err(|e| miette::miette!("{e}"))?;
            println!("Unburied {n} card(s)");
        }
    }
    Ok(())
}
