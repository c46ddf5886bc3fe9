use std::collections::HashSet;

use crate::domain::persistence::Persistence;
use crate::domain::tables::{Column, ForeignKeyConstraint, Index, Table};

pub trait MigrationStep {
    fn ctx(&self) -> &'static str;
    fn ddls(self) -> Vec<String>;
}

pub struct CreateTableStep {
    ddls: Vec<String>,
}

impl CreateTableStep {
    fn new(database_schema: &str, table: &Table) -> Self {
        let ddls = create_table_ddl(database_schema, table);
        Self { ddls }
    }
}

impl MigrationStep for CreateTableStep {
    fn ctx(&self) -> &'static str {
        "CREATE TABLE"
    }

    fn ddls(self) -> Vec<String> {
        self.ddls
    }
}

/// Creates the tables missing from the database schema.
pub struct Migration<P: Persistence> {
    tables: Vec<Table>,
    persistence: P,
}

impl<P: Persistence> Migration<P> {
    pub fn new(tables: Vec<Table>, persistence: P) -> Self {
        Self {
            tables,
            persistence,
        }
    }

    /// Returns the names of the tables created.
    pub async fn migrate(&self) -> Result<Vec<String>, anyhow::Error> {
        let actual_schema = self.persistence.load().await?;
        let missing = missing_tables(&self.tables, &actual_schema);
        let created = missing.iter().map(|table| table.name.clone()).collect();

        let schema = self.persistence.database_schema();
        let steps = missing
            .into_iter()
            .map(|table| CreateTableStep::new(schema, table))
            .collect::<Vec<_>>();
        self.persistence.apply_migration_steps(steps).await?;

        Ok(created)
    }
}

fn missing_tables<'a>(needed: &'a [Table], actual: &HashSet<String>) -> Vec<&'a Table> {
    needed
        .iter()
        .filter(|table| !actual.contains(&table.name))
        .collect()
}

fn create_table_ddl(schema: &str, table: &Table) -> Vec<String> {
    let mut columns = Vec::new();
    let mut pk_columns = Vec::new();

    for column in table.columns.iter() {
        columns.push(column_ddl(column));
        if column.primary_key {
            pk_columns.push(&column.name as &str);
        }
    }

    let table_ddl = format!(
        "CREATE TABLE \"{}\".\"{}\" (\n    {},\n    PRIMARY KEY({})\n)",
        schema,
        table.name,
        columns.join(",\n    "),
        pk_columns.join(",")
    );

    let mut ddls = vec![table_ddl];
    ddls.extend(table.foreign_keys.iter().map(|fk| create_fk_ddl(schema, fk)));
    ddls.extend(table.indexes.iter().map(|index| create_index_ddl(schema, index)));
    ddls
}

fn column_ddl(column: &Column) -> String {
    let mut sql = format!("\"{}\" {}", column.name, column.column_type);
    if column.not_null {
        sql.push_str(" NOT NULL");
    }
    if let Some(default_value) = &column.default_value {
        sql.push_str(&format!(" DEFAULT {default_value}"));
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    sql
}

fn create_fk_ddl(schema: &str, fk: &ForeignKeyConstraint) -> String {
    format!(
        "ALTER TABLE \"{}\".\"{}\" ADD CONSTRAINT \"{}_{}_fkey\" FOREIGN KEY (\"{}\") REFERENCES \"{}\".\"{}\" (\"{}\") ON DELETE CASCADE",
        schema,
        fk.table_name,
        fk.table_name,
        fk.column_name,
        fk.column_name,
        schema,
        fk.referenced_table_name,
        fk.referenced_column_name
    )
}

fn create_index_ddl(schema: &str, index: &Index) -> String {
    let columns_sql = index
        .columns
        .iter()
        .map(|column| format!("\"{column}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let kind = if index.unique { "UNIQUE INDEX" } else { "INDEX" };
    format!(
        "CREATE {} \"{}_{}_idx\" ON \"{}\".\"{}\" ({})",
        kind,
        index.table_name,
        index.columns.join("_"),
        schema,
        index.table_name,
        columns_sql
    )
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::domain::quire_tables;

    #[derive(Clone, Default)]
    struct FakePersistence {
        existing: HashSet<String>,
        applied: Arc<Mutex<Vec<String>>>,
    }

    impl Persistence for FakePersistence {
        async fn load(&self) -> Result<HashSet<String>, anyhow::Error> {
            Ok(self.existing.clone())
        }

        async fn apply_migration_steps(
            &self,
            steps: Vec<impl MigrationStep>,
        ) -> Result<(), anyhow::Error> {
            let mut applied = self.applied.lock().unwrap();
            for step in steps {
                applied.extend(step.ddls());
            }
            Ok(())
        }

        fn database_schema(&self) -> &str {
            "public"
        }
    }

    #[test]
    fn test_notes_ddl() {
        let tables = quire_tables();
        let ddls = create_table_ddl("public", &tables[1]);

        assert_eq!(ddls.len(), 3);
        assert!(ddls[0].starts_with("CREATE TABLE \"public\".\"notes\" ("));
        assert!(ddls[0].contains("\"note_id\" BIGSERIAL"));
        assert!(ddls[0].contains("\"tags\" TEXT[] NOT NULL DEFAULT '{}'"));
        assert!(ddls[0].contains("PRIMARY KEY(note_id)"));
        assert_eq!(
            ddls[1],
            "ALTER TABLE \"public\".\"notes\" ADD CONSTRAINT \"notes_owner_id_fkey\" FOREIGN KEY (\"owner_id\") REFERENCES \"public\".\"sites\" (\"owner_id\") ON DELETE CASCADE"
        );
        assert_eq!(
            ddls[2],
            "CREATE UNIQUE INDEX \"notes_owner_id_slug_idx\" ON \"public\".\"notes\" (\"owner_id\", \"slug\")"
        );
    }

    #[test]
    fn test_unique_handle_column() {
        let tables = quire_tables();
        let ddls = create_table_ddl("public", &tables[0]);

        assert_eq!(ddls.len(), 1);
        assert!(ddls[0].contains("\"handle\" TEXT NOT NULL UNIQUE"));
        assert!(ddls[0].contains("\"created_at\" TIMESTAMPTZ NOT NULL DEFAULT now()"));
    }

    #[tokio::test]
    async fn test_existing_tables_are_skipped() {
        let persistence = FakePersistence {
            existing: HashSet::from(["sites".to_string()]),
            ..Default::default()
        };
        let migration = Migration::new(quire_tables(), persistence.clone());

        let created = migration.migrate().await.unwrap();

        assert_eq!(created, vec!["notes"]);
        let applied = persistence.applied.lock().unwrap();
        assert!(!applied.iter().any(|ddl| ddl.starts_with("CREATE TABLE \"public\".\"sites\"")));
        assert!(applied[0].starts_with("CREATE TABLE \"public\".\"notes\""));
    }

    #[tokio::test]
    async fn test_up_to_date_schema_applies_nothing() {
        let persistence = FakePersistence {
            existing: HashSet::from(["sites".to_string(), "notes".to_string()]),
            ..Default::default()
        };
        let migration = Migration::new(quire_tables(), persistence.clone());

        assert!(migration.migrate().await.unwrap().is_empty());
        assert!(persistence.applied.lock().unwrap().is_empty());
    }
}
