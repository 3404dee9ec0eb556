//! Database Config

use clap::Args;

use crate::database::DEFAULT_STATEMENT_TIMEOUT_MS;

/// Database settings.
#[derive(Debug, Clone, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Maximum pooled connections
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// Upper bound for any single statement, in milliseconds
    #[arg(
        long,
        env = "DATABASE_STATEMENT_TIMEOUT_MS",
        default_value_t = DEFAULT_STATEMENT_TIMEOUT_MS
    )]
    pub statement_timeout_ms: u64,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        database: DatabaseConfig,
    }

    #[test]
    fn defaults_apply_when_only_url_is_given() -> Result<(), clap::Error> {
        let harness = Harness::try_parse_from([
            "storefront",
            "--database-url",
            "postgres://localhost/storefront",
        ])?;

        assert_eq!(harness.database.max_connections, 10);
        assert_eq!(
            harness.database.statement_timeout_ms,
            DEFAULT_STATEMENT_TIMEOUT_MS
        );

        Ok(())
    }
}
