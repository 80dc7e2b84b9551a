//! License administration commands.

use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum LicenseCommands {
    /// Register a license key
    Add {
        /// Holder's email address
        #[arg(long)]
        email: String,
        /// License key granted to the holder
        #[arg(long)]
        key: String,
    },
    /// List registered licenses
    List,
}

/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn run(pool: &sqlx::PgPool, command: LicenseCommands) -> anyhow::Result<()> {
    match command {
        LicenseCommands::Add { email, key } => {
            let inserted = pricewatch_db::insert_license(pool, &email, &key).await?;
            if inserted {
                println!("license registered for {email}");
            } else {
                println!("license already registered; nothing to do");
            }
        }
        LicenseCommands::List => {
            let licenses = pricewatch_db::list_licenses(pool).await?;
            if licenses.is_empty() {
                println!("no licenses registered");
            }
            for license in licenses {
                println!(
                    "{}  {}  {}",
                    license.email,
                    license.license_key,
                    license.created_at.format("%Y-%m-%d")
                );
            }
        }
    }
    Ok(())
}
