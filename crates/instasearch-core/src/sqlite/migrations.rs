#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SqliteMigration {
    pub version: i64,
    pub name: &'static str,
    pub up_sql: &'static str,
    pub down_sql: &'static str,
}

const MIGRATION_0001: SqliteMigration = SqliteMigration {
    version: 1,
    name: "search_response_cache",
    up_sql: r#"
CREATE TABLE IF NOT EXISTS search_response_cache (
    cache_key TEXT PRIMARY KEY,
    response_json TEXT NOT NULL,
    stored_at_unix INTEGER NOT NULL,
    expires_at_unix INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_search_response_cache_expiry
    ON search_response_cache (expires_at_unix);
"#,
    down_sql: r#"
DROP INDEX IF EXISTS idx_search_response_cache_expiry;
DROP TABLE IF EXISTS search_response_cache;
"#,
};

const MIGRATIONS: [SqliteMigration; 1] = [MIGRATION_0001];

pub fn migrations() -> &'static [SqliteMigration] {
    &MIGRATIONS
}

pub fn migration(version: i64) -> Option<&'static SqliteMigration> {
    MIGRATIONS.iter().find(|entry| entry.version == version)
}

pub fn current_schema_version() -> i64 {
    MIGRATIONS.last().map(|entry| entry.version).unwrap_or(0)
}
