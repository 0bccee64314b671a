use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use diesel::prelude::*;
use foodgram_server::db::create_pool;
use foodgram_server::models::{NewIngredient, NewTag};
use foodgram_server::schema::{ingredients, tags};
use foodgram_server::validation::{is_hex_color, is_slug};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "foodgram-admin")]
#[command(about = "Foodgram data administration", long_about = None)]
struct Cli {
    /// Database URL (default: $DATABASE_URL)
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load ingredients from a JSON array of {name, measurement_unit}
    LoadIngredients {
        /// Path to the JSON file
        #[arg(long)]
        path: PathBuf,
    },
    /// Create a recipe tag
    CreateTag {
        #[arg(long)]
        name: String,
        /// Letters, digits, hyphens and underscores
        #[arg(long)]
        slug: String,
        /// Hex color such as #E26C2D
        #[arg(long)]
        color: String,
    },
}

#[derive(Debug, Deserialize, PartialEq)]
struct IngredientRecord {
    name: String,
    measurement_unit: String,
}

fn parse_ingredients(json: &str) -> Result<Vec<IngredientRecord>> {
    let records: Vec<IngredientRecord> =
        serde_json::from_str(json).context("expected a JSON array of {name, measurement_unit}")?;

    for (i, record) in records.iter().enumerate() {
        if record.name.trim().is_empty() || record.measurement_unit.trim().is_empty() {
            bail!("record {i} has an empty name or measurement_unit");
        }
    }
    Ok(records)
}

/// Insert every record, skipping (name, unit) pairs that already exist.
fn load_ingredients(conn: &mut PgConnection, path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records = parse_ingredients(&json)?;

    let rows: Vec<NewIngredient> = records
        .iter()
        .map(|r| NewIngredient {
            name: r.name.trim(),
            measurement_unit: r.measurement_unit.trim(),
        })
        .collect();

    let mut inserted = 0;
    // stay well under the bind parameter limit
    for chunk in rows.chunks(1000) {
        inserted += diesel::insert_into(ingredients::table)
            .values(chunk)
            .on_conflict_do_nothing()
            .execute(conn)?;
    }

    println!(
        "Loaded {} ingredients ({} already present)",
        inserted,
        records.len() - inserted
    );
    Ok(())
}

fn create_tag(conn: &mut PgConnection, name: &str, slug: &str, color: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("tag name must not be blank");
    }
    if !is_slug(slug) {
        bail!("invalid slug {slug:?}: use letters, digits, hyphens and underscores");
    }
    if !is_hex_color(color) {
        bail!("invalid color {color:?}: expected a hex color such as #E26C2D");
    }

    let id: i32 = diesel::insert_into(tags::table)
        .values(NewTag {
            name: name.trim(),
            slug,
            color,
        })
        .returning(tags::id)
        .get_result(conn)
        .with_context(|| format!("failed to create tag {slug:?}"))?;

    println!("Created tag {slug} with id {id}");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let pool = create_pool(&cli.database_url)?;
    let mut conn = pool.get()?;

    match cli.command {
        Commands::LoadIngredients { path } => load_ingredients(&mut conn, &path)?,
        Commands::CreateTag { name, slug, color } => create_tag(&mut conn, &name, &slug, &color)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingredients() {
        let records = parse_ingredients(
            r#"[{"name": "абрикосовое варенье", "measurement_unit": "г"},
                {"name": "flour", "measurement_unit": "g"}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[1],
            IngredientRecord {
                name: "flour".to_string(),
                measurement_unit: "g".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_ingredients_rejects_bad_input() {
        assert!(parse_ingredients(r#"{"name": "flour"}"#).is_err());
        assert!(parse_ingredients(r#"[{"name": "flour"}]"#).is_err());
        assert!(parse_ingredients(r#"[{"name": " ", "measurement_unit": "g"}]"#).is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "foodgram-admin",
            "--database-url",
            "postgres://localhost/foodgram",
            "create-tag",
            "--name",
            "Breakfast",
            "--slug",
            "breakfast",
            "--color",
            "#E26C2D",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::CreateTag { .. }));
    }
}
