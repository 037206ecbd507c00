//! Builds the statements for a JSONB document table: `id`, `doc`, timestamps.
//! Identifiers come from wiring code only; values are always parameters.

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// How the `id` column is typed and filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdColumn {
    Serial,
    BigSerial,
    /// TEXT filled from a dedicated sequence, so keys read "1", "2", ...
    SequencedText,
}

#[derive(Clone, Debug)]
pub struct DocumentTable {
    schema: String,
    table: String,
}

impl DocumentTable {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        DocumentTable {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Full qualified table name.
    pub fn qualified(&self) -> String {
        format!("{}.{}", quoted(&self.schema), quoted(&self.table))
    }

    fn qualified_sequence(&self) -> String {
        format!("{}.{}", quoted(&self.schema), quoted(&format!("{}_id_seq", self.table)))
    }

    /// DDL run at startup, in order.
    pub fn create_statements(&self, id: IdColumn) -> Vec<String> {
        let mut out = vec![format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(&self.schema))];
        let id_ddl = match id {
            IdColumn::Serial => "SERIAL PRIMARY KEY".to_string(),
            IdColumn::BigSerial => "BIGSERIAL PRIMARY KEY".to_string(),
            IdColumn::SequencedText => {
                let seq = self.qualified_sequence();
                out.push(format!("CREATE SEQUENCE IF NOT EXISTS {}", seq));
                format!(
                    "TEXT PRIMARY KEY DEFAULT nextval('{}')::text",
                    seq.replace('\'', "''")
                )
            }
        };
        out.push(format!(
            r#"CREATE TABLE IF NOT EXISTS {} (
                id {},
                doc JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
            self.qualified(),
            id_ddl
        ));
        out
    }

    /// `$1` = doc. Returns the allocated id.
    pub fn insert(&self) -> String {
        format!("INSERT INTO {} (doc) VALUES ($1) RETURNING id", self.qualified())
    }

    /// `$1` = id.
    pub fn select_by_id(&self) -> String {
        format!("SELECT id, doc FROM {} WHERE id = $1", self.qualified())
    }

    /// With `filtered`, `$1` = a JSONB document the rows must contain.
    pub fn select_list(&self, filtered: bool) -> String {
        if filtered {
            format!(
                "SELECT id, doc FROM {} WHERE doc @> $1 ORDER BY id",
                self.qualified()
            )
        } else {
            format!("SELECT id, doc FROM {} ORDER BY id", self.qualified())
        }
    }

    /// `$1` = doc, `$2` = id. Returns the id when the row existed.
    pub fn update(&self) -> String {
        format!(
            "UPDATE {} SET doc = $1, updated_at = NOW() WHERE id = $2 RETURNING id",
            self.qualified()
        )
    }

    /// `$1` = id. Returns the id when the row existed.
    pub fn delete(&self) -> String {
        format!("DELETE FROM {} WHERE id = $1 RETURNING id", self.qualified())
    }
}
