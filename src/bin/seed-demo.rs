//! Demo catalog seed script
//!
//! Seeds a handful of labels and recipes, and optionally schedules them into
//! the current week so the plan view has something to show.
//!
//! Usage:
//!   DATABASE_URL=... ./seed-demo [--with-plan]

use anyhow::{Context, Result};
use chrono::{Duration, Local};
use clap::Parser;

use recipe_planner_api::{
    db::{self, PgStore},
    models::{label::LabelFacet, recipe::RecipeDraft},
    services::{plan::PlanService, recipes::RecipeService, week::monday_of},
};

#[derive(Parser)]
#[command(name = "seed-demo", about = "Seed demo recipes into the recipe planner database")]
struct Args {
    /// Also schedule the seeded recipes into the current week
    #[arg(long)]
    with_plan: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL required")?;

    let pool = db::create_pool(&database_url, 5)
        .await
        .context("Failed to connect to database")?;
    db::run_migrations(&pool).await?;
    let store = PgStore::new(pool);

    let main_course = RecipeService::create_label(&store, "Main course", LabelFacet::Category).await?;
    let baking = RecipeService::create_label(&store, "Baking", LabelFacet::Category).await?;
    let christmas = RecipeService::create_label(&store, "Christmas", LabelFacet::Event).await?;
    let birthday = RecipeService::create_label(&store, "Birthday", LabelFacet::Event).await?;

    let drafts = [
        RecipeDraft {
            title: "Käsespätzle".into(),
            servings: Some(4),
            duration_minutes: Some(45),
            working_minutes: Some(30),
            ingredients: lines(&["400 g flour", "4 eggs", "200 g mountain cheese", "2 onions", "salt to taste"]),
            steps: lines(&["Make the batter.", "Press into boiling water.", "Layer with cheese and fried onions."]),
            labels: vec![main_course.id],
            ..Default::default()
        },
        RecipeDraft {
            title: "Stollen".into(),
            servings: Some(12),
            duration_minutes: Some(180),
            working_minutes: Some(60),
            temperature_celsius: Some(170),
            ingredients: lines(&["500 g flour", "250 g butter", "150 g raisins", "1 cube yeast"]),
            steps: lines(&["Knead the dough.", "Fold in the fruit.", "Bake for one hour."]),
            labels: vec![baking.id, christmas.id],
            ..Default::default()
        },
        RecipeDraft {
            title: "Chocolate Cake".into(),
            servings: Some(8),
            duration_minutes: Some(70),
            working_minutes: Some(20),
            temperature_celsius: Some(180),
            ingredients: lines(&["200 g dark chocolate", "150 g sugar", "3 eggs", "1,5 tsp baking powder"]),
            steps: lines(&["Melt the chocolate.", "Mix everything.", "Bake."]),
            labels: vec![baking.id, birthday.id],
            ..Default::default()
        },
        RecipeDraft {
            title: "Tomato Soup".into(),
            servings: Some(2),
            duration_minutes: Some(25),
            ingredients: lines(&["800 g tomatoes", "1 onion", "0,5 l stock", "basil to taste"]),
            steps: lines(&["Sweat the onion.", "Simmer with tomatoes and stock.", "Blend."]),
            labels: vec![main_course.id],
            ..Default::default()
        },
    ];

    let mut created = Vec::with_capacity(drafts.len());
    for draft in &drafts {
        let recipe = RecipeService::create(&store, draft).await?;
        println!("  Created {} ({})", recipe.title, recipe.slug);
        created.push(recipe);
    }

    if args.with_plan {
        let monday = monday_of(Local::now().date_naive());
        for (offset, recipe) in created.iter().enumerate() {
            let date = monday + Duration::days(offset as i64 * 2);
            PlanService::add(&store, recipe.id, date, None).await?;
            println!("  Planned {} on {}", recipe.title, date);
        }
    }

    println!("=== Seeded {} recipes ===", created.len());
    Ok(())
}

fn lines(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}
