//! Database seeder: loads the JSON fixtures under _data/ or wipes all rows.
//!
//!   cargo run --bin seed -- --import
//!   cargo run --bin seed -- --destroy

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use campdir::auth::password;
use campdir::database::models::{Role, SkillLevel};
use campdir::database::Db;

#[derive(Parser)]
#[command(name = "seed")]
#[command(about = "Seed or wipe the campdir database from _data/ fixtures")]
struct Args {
    #[arg(short = 'i', long, help = "Import all fixture data")]
    import: bool,

    #[arg(short = 'd', long, help = "Delete all data")]
    destroy: bool,
}

#[derive(Deserialize)]
struct SeedUser {
    id: Uuid,
    name: String,
    email: String,
    role: Role,
    password: String,
}

#[derive(Deserialize)]
struct SeedBootcamp {
    id: Uuid,
    user_id: Uuid,
    name: String,
    description: String,
    website: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    careers: Vec<String>,
    #[serde(default)]
    housing: bool,
    #[serde(default)]
    job_assistance: bool,
    #[serde(default)]
    job_guarantee: bool,
    #[serde(default)]
    accept_gi: bool,
}

#[derive(Deserialize)]
struct SeedCourse {
    id: Uuid,
    bootcamp_id: Uuid,
    user_id: Uuid,
    title: String,
    description: String,
    weeks: i32,
    tuition: f64,
    minimum_skill: SkillLevel,
    #[serde(default)]
    scholarship_available: bool,
}

#[derive(Deserialize)]
struct SeedReview {
    id: Uuid,
    bootcamp_id: Uuid,
    user_id: Uuid,
    title: String,
    text: String,
    rating: i32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    if args.import == args.destroy {
        bail!("pass exactly one of --import or --destroy");
    }

    Db::init().await.context("database init")?;
    let pool = Db::pool()?;

    if args.destroy {
        destroy(pool).await?;
        println!("Data destroyed");
    } else {
        import(pool).await?;
        println!("Data imported");
    }

    Db::close().await;
    Ok(())
}

fn load<T: serde::de::DeserializeOwned>(name: &str) -> Result<Vec<T>> {
    let path = format!("_data/{}.json", name);
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))
}

async fn import(pool: &PgPool) -> Result<()> {
    let users: Vec<SeedUser> = load("users")?;
    let bootcamps: Vec<SeedBootcamp> = load("bootcamps")?;
    let courses: Vec<SeedCourse> = load("courses")?;
    let reviews: Vec<SeedReview> = load("reviews")?;

    for u in &users {
        let hash = password::hash_password(&u.password)?;
        sqlx::query(
            "INSERT INTO users (id, name, email, role, password) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(u.id)
        .bind(&u.name)
        .bind(&u.email)
        .bind(u.role)
        .bind(&hash)
        .execute(pool)
        .await?;
    }

    for b in &bootcamps {
        sqlx::query(
            "INSERT INTO bootcamps (id, user_id, name, description, website, phone, email, \
             address, latitude, longitude, careers, housing, job_assistance, job_guarantee, \
             accept_gi) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(b.id)
        .bind(b.user_id)
        .bind(&b.name)
        .bind(&b.description)
        .bind(&b.website)
        .bind(&b.phone)
        .bind(&b.email)
        .bind(&b.address)
        .bind(b.latitude)
        .bind(b.longitude)
        .bind(&b.careers)
        .bind(b.housing)
        .bind(b.job_assistance)
        .bind(b.job_guarantee)
        .bind(b.accept_gi)
        .execute(pool)
        .await?;
    }

    for c in &courses {
        sqlx::query(
            "INSERT INTO courses (id, bootcamp_id, user_id, title, description, weeks, tuition, \
             minimum_skill, scholarship_available) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(c.id)
        .bind(c.bootcamp_id)
        .bind(c.user_id)
        .bind(&c.title)
        .bind(&c.description)
        .bind(c.weeks)
        .bind(c.tuition)
        .bind(c.minimum_skill)
        .bind(c.scholarship_available)
        .execute(pool)
        .await?;
    }

    for r in &reviews {
        sqlx::query(
            "INSERT INTO reviews (id, bootcamp_id, user_id, title, text, rating) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(r.id)
        .bind(r.bootcamp_id)
        .bind(r.user_id)
        .bind(&r.title)
        .bind(&r.text)
        .bind(r.rating)
        .execute(pool)
        .await?;
    }

    // Refresh the stored aggregates that mutations normally maintain
    for b in &bootcamps {
        campdir::database::models::Course::recalc_average_cost(b.id, pool).await?;
        campdir::database::models::Review::recalc_average_rating(b.id, pool).await?;
    }

    Ok(())
}

async fn destroy(pool: &PgPool) -> Result<()> {
    // Child tables cascade from users, but be explicit about the order
    sqlx::query("DELETE FROM reviews").execute(pool).await?;
    sqlx::query("DELETE FROM courses").execute(pool).await?;
    sqlx::query("DELETE FROM bootcamps").execute(pool).await?;
    sqlx::query("DELETE FROM users").execute(pool).await?;
    Ok(())
}
