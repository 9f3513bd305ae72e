//! Relation and qualified-column identifiers.

use std::fmt;

/// A relation handle: the alias if the query gave one, otherwise the base table name.
pub type RelationAlias = String;

/// A `relation.column` pair. Equality is structural; no interning is needed at this scale.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifiedColumn {
    pub relation: RelationAlias,
    pub column: String,
}

impl QualifiedColumn {
    pub fn new(relation: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for QualifiedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.relation, self.column)
    }
}

/// SQL dialect forwarded to the parser; mirrors the subset of dialects `sqlparser` ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Generic,
    Ansi,
    Bigquery,
    Clickhouse,
    Hive,
    Mssql,
    Mysql,
    Postgres,
    Redshift,
    Snowflake,
    Sqlite,
}

impl Dialect {
    pub fn to_sqlparser_dialect(self) -> Box<dyn sqlparser::dialect::Dialect> {
        use sqlparser::dialect::*;
        match self {
            Dialect::Generic => Box::new(GenericDialect {}),
            Dialect::Ansi => Box::new(AnsiDialect {}),
            Dialect::Bigquery => Box::new(BigQueryDialect {}),
            Dialect::Clickhouse => Box::new(ClickHouseDialect {}),
            Dialect::Hive => Box::new(HiveDialect {}),
            Dialect::Mssql => Box::new(MsSqlDialect {}),
            Dialect::Mysql => Box::new(MySqlDialect {}),
            Dialect::Postgres => Box::new(PostgreSqlDialect {}),
            Dialect::Redshift => Box::new(RedshiftSqlDialect {}),
            Dialect::Snowflake => Box::new(SnowflakeDialect {}),
            Dialect::Sqlite => Box::new(SQLiteDialect {}),
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generic" => Ok(Dialect::Generic),
            "ansi" => Ok(Dialect::Ansi),
            "bigquery" => Ok(Dialect::Bigquery),
            "clickhouse" => Ok(Dialect::Clickhouse),
            "hive" => Ok(Dialect::Hive),
            "mssql" => Ok(Dialect::Mssql),
            "mysql" => Ok(Dialect::Mysql),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "redshift" => Ok(Dialect::Redshift),
            "snowflake" => Ok(Dialect::Snowflake),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(format!("unknown dialect: {other}")),
        }
    }
}
