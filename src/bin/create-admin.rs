//! Create (or reset) an administrator account.
//!
//! Usage: `create-admin <username> <password> [full name]`

use anyhow::{bail, Context};
use chrono::Utc;
use uuid::Uuid;

use labdesk::auth::hash_password;
use labdesk::config::AppConfig;
use labdesk::db;
use labdesk::db::repository::user;
use labdesk::models::User;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let (Some(username), Some(password)) = (args.next(), args.next()) else {
        bail!("usage: create-admin <username> <password> [full name]");
    };
    if password.len() < 6 {
        bail!("password must be at least 6 characters");
    }
    let full_name = args.next().unwrap_or_else(|| username.clone());

    let config = AppConfig::from_env();
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = db::open_database(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;

    let admin = User {
        id: Uuid::new_v4(),
        username: username.clone(),
        password_hash: hash_password(&password).context("hashing password")?,
        full_name,
        role: "admin".to_string(),
        permissions: vec![],
        created_at: Utc::now(),
    };
    user::upsert_user(&conn, &admin)?;

    println!("admin account '{username}' is ready");
    Ok(())
}
