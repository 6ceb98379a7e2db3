//! lorefinder - Lorcana card similarity and deck substitution.
//!
//! ## Usage
//!
//! ```text
//! lorefinder [OPTIONS] <COMMAND>
//!
//! Commands:
//!   similar <CARD>     Cards most similar to CARD
//!   abilities <CARD>   Closest ability texts under every metric
//!   search <TERM>      Card names containing TERM
//!   deck               Build a decklist from a collection
//!   embed              (Re)compute the embedding cache
//! ```

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lorefinder::{
    CardFinder, CardRecord, Collection, DeckResult, Decklist, EncoderKind, Feature, FinderConfig,
    FinderService, HashedTextEncoder, SimilarityMetric, SimilarityResult, TextEncoder,
    substitute_deck,
};

#[derive(Parser)]
#[command(name = "lorefinder")]
#[command(about = "Find similar Lorcana cards and fill decks from a collection")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Card catalog (LorcanaJSON allCards.json)
    #[arg(long, global = true)]
    cards: Option<PathBuf>,

    /// Embedding cache file
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    /// JSON object of feature weights, e.g. {"ability": 0.5, "mechanics": 0.5}
    #[arg(long, global = true)]
    weights: Option<PathBuf>,

    /// Embedding encoder: hashed, or minilm (needs the fastembed feature)
    #[arg(long, global = true)]
    encoder: Option<EncoderKind>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cards most similar to CARD
    Similar {
        card: String,
        #[arg(short = 'n', long)]
        results: Option<usize>,
        /// cosine, dot, euclidean or manhattan
        #[arg(long)]
        metric: Option<SimilarityMetric>,
        #[arg(long)]
        json: bool,
    },
    /// Closest ability texts under every metric
    Abilities {
        card: String,
        #[arg(short = 'n', long, default_value_t = 5)]
        results: usize,
    },
    /// Card names containing TERM
    Search {
        term: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Build a decklist from a collection, substituting missing cards
    Deck {
        /// Lines of "<quantity> <card name>"
        #[arg(long)]
        decklist: PathBuf,
        /// JSON object of card name -> owned copies
        #[arg(long)]
        collection: PathBuf,
        #[arg(long)]
        pool: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// (Re)compute the embedding cache
    Embed {
        /// Recompute even if the cache is usable
        #[arg(long)]
        force: bool,
    },
}

fn load_config(cli: &Cli) -> Result<FinderConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => FinderConfig::load(path)?,
        None => FinderConfig::default(),
    };
    if let Some(path) = &cli.cards {
        config.catalog_path = path.clone();
    }
    if let Some(path) = &cli.cache {
        config.embeddings_cache_path = path.clone();
    }
    if let Some(path) = &cli.weights {
        let raw = fs::read_to_string(path)?;
        config.weights = serde_json::from_str(&raw)?;
    }
    if let Some(encoder) = cli.encoder {
        config.encoder = encoder;
    }
    if let Command::Embed { force } = cli.command {
        config.recompute_embeddings |= force;
    }
    Ok(config)
}

fn build_encoder(config: &FinderConfig) -> Result<Box<dyn TextEncoder>, Box<dyn Error>> {
    match config.encoder {
        EncoderKind::Hashed => Ok(Box::new(HashedTextEncoder::new(config.embedding_dims))),
        #[cfg(feature = "fastembed")]
        EncoderKind::MiniLm => {
            let encoder = match &config.model_cache_dir {
                Some(dir) => lorefinder::MiniLmEncoder::with_cache_dir(dir.clone())?,
                None => lorefinder::MiniLmEncoder::new()?,
            };
            Ok(Box::new(encoder))
        }
        #[cfg(not(feature = "fastembed"))]
        EncoderKind::MiniLm => {
            Err("the minilm encoder needs a build with the fastembed feature".into())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn stat(value: Option<i32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn diff(target: Option<i32>, other: Option<i32>) -> String {
    match (target, other) {
        (Some(a), Some(b)) if a != b => format!("({:+})", b - a),
        _ => String::new(),
    }
}

fn inkable(record: &CardRecord) -> &'static str {
    if record.inkwell { "yes" } else { "no" }
}

fn print_comparison(result: &SimilarityResult<'_>) {
    let target = result.target;
    println!("{}", "=".repeat(100));
    println!("Cards similar to: {}", target.full_name);
    println!("{}", "=".repeat(100));

    for m in &result.matches {
        let card = m.record;
        println!();
        println!("{} (overall {:.4})", card.full_name, m.overall);
        println!("{}", "-".repeat(100));
        println!(
            "{:<12} {:<25} {:<25} {:<8} {}",
            "Attribute", "Original", "Similar", "Diff", "Score"
        );
        let text_row = |label: &str, original: String, similar: String, feature: Feature| {
            println!(
                "{label:<12} {original:<25} {similar:<25} {:<8} {:.4}",
                "",
                m.scores.get(feature)
            );
        };
        text_row(
            "Color",
            target.color.to_string(),
            card.color.to_string(),
            Feature::InkColor,
        );
        text_row(
            "Inkable",
            inkable(target).to_string(),
            inkable(card).to_string(),
            Feature::Inkwell,
        );

        let stat_rows = [
            ("Cost", target.cost, card.cost, Feature::InkCost),
            ("Strength", target.strength, card.strength, Feature::Strength),
            ("Willpower", target.willpower, card.willpower, Feature::Willpower),
            ("Lore", target.lore, card.lore, Feature::LorePoints),
        ];
        for (label, original, similar, feature) in stat_rows {
            println!(
                "{label:<12} {:<25} {:<25} {:<8} {:.4}",
                stat(original),
                stat(similar),
                diff(original, similar),
                m.scores.get(feature)
            );
        }
        println!(
            "Tags {:.4}  Mechanics {:.4}  Type {:.4}",
            m.scores.get(Feature::Tags),
            m.scores.get(Feature::Mechanics),
            m.scores.get(Feature::CardType)
        );
        println!("Abilities ({:.4}):", m.scores.get(Feature::Ability));
        println!("  Original: {}", target.full_text);
        println!("  Similar:  {}", card.full_text);
    }
}

fn print_deck(result: &DeckResult) {
    println!("Final deck ({} cards):", result.total_cards());
    for (name, count) in &result.final_deck {
        println!("  {count} {name}");
    }
    println!();
    println!("Replacement log:");
    for (original, entries) in &result.replacement_log {
        println!("  {original}");
        for entry in entries {
            match &entry.card {
                Some(card) => println!("    {card}: {}", entry.reason),
                None => println!("    -: {}", entry.reason),
            }
        }
    }
}

fn run_similar(
    finder: &CardFinder,
    config: &FinderConfig,
    card: &str,
    results: Option<usize>,
    metric: Option<SimilarityMetric>,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    if let Some(metric) = metric {
        finder.set_metric(metric);
    }
    let result = finder.find_similar(card, results.unwrap_or(config.default_results))?;
    if json {
        print_json(&result)
    } else {
        print_comparison(&result);
        Ok(())
    }
}

fn run_abilities(finder: &CardFinder, card: &str, results: usize) -> Result<(), Box<dyn Error>> {
    for metric in SimilarityMetric::ALL {
        println!("{metric}:");
        for m in finder.ability_neighbors(card, metric, results)? {
            println!("  {:.4}  {}", m.score, m.record.full_name);
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if let Command::Search { term, limit } = &cli.command {
        // Name search needs the catalog only.
        let catalog = lorefinder::Catalog::load(&config.catalog_path)?;
        for record in catalog.search(term, *limit) {
            println!("{}", record.full_name);
        }
        return Ok(());
    }

    let service = FinderService::new();
    let encoder = build_encoder(&config)?;
    let finder = service.initialize(&config, encoder.as_ref())?;

    match cli.command {
        Command::Similar {
            card,
            results,
            metric,
            json,
        } => run_similar(&finder, &config, &card, results, metric, json)?,
        Command::Abilities { card, results } => run_abilities(&finder, &card, results)?,
        Command::Deck {
            decklist,
            collection,
            pool,
            json,
        } => {
            let decklist = Decklist::load(&decklist)?;
            let mut collection = Collection::load(&collection)?;
            let result = substitute_deck(
                &decklist,
                &mut collection,
                finder.as_ref(),
                pool.unwrap_or(config.candidate_pool),
            );
            if json {
                print_json(&result)?;
            } else {
                print_deck(&result);
            }
        }
        Command::Embed { .. } => {
            let cache = finder.embeddings();
            println!(
                "{} embeddings ({} dimensions) in {}",
                cache.len(),
                cache.dims().unwrap_or(0),
                config.embeddings_cache_path.display()
            );
        }
        Command::Search { .. } => {}
    }
    Ok(())
}

