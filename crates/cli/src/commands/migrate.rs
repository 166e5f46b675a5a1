use std::path::Path;

use ladder_core::{
    DatabaseConfig, LadderResult, MigrationEngine, MigrationRepository, PgVersionStore,
};

async fn connect(dir: &Path) -> LadderResult<(DatabaseConfig, MigrationEngine<PgVersionStore>)> {
    let config = DatabaseConfig::from_env()?;
    let pool = config.connect().await?;
    let engine = MigrationEngine::new(MigrationRepository::new(dir), PgVersionStore::new(pool));
    Ok((config, engine))
}

pub async fn run(dir: &Path, target: Option<i64>) -> LadderResult<()> {
    let (config, engine) = connect(dir).await?;

    let summary = engine.run(target).await?;

    println!("Migration Run");
    println!("=============");
    println!("Database: {}", config.masked_url());
    println!(
        "Version:  {} -> {} (target {})",
        summary.from_version, summary.to_version, summary.target_version
    );

    if summary.applied.is_empty() {
        println!("No migrations were applied");
    } else {
        for filename in &summary.applied {
            println!("  ✅ {}", filename);
        }
    }

    println!("Completed in {}ms", summary.execution_time_ms);
    Ok(())
}

pub async fn status(dir: &Path, json: bool) -> LadderResult<()> {
    let (config, engine) = connect(dir).await?;
    let status = engine.status().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Migration Status");
    println!("================");
    println!("Database: {}", config.masked_url());

    if status.is_empty() {
        println!("No migrations found in {}", dir.display());
        return Ok(());
    }

    for entry in &status {
        let marker = if entry.applied { "✅" } else { "⏳" };
        println!("  {} {:04} {}", marker, entry.version, entry.name);
    }
    println!("\n⏳ = Pending");
    Ok(())
}

pub async fn create(dir: &Path, name: &str) -> LadderResult<()> {
    let repository = MigrationRepository::new(dir);
    let (up, down) = repository.create_migration(name)?;

    println!("Created migration pair:");
    println!("  {}", dir.join(up).display());
    println!("  {}", dir.join(down).display());
    Ok(())
}
