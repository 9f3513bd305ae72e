//! CLI argument parsing using clap.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// dpjoin - enumerate connected join-graph subsets for a batch of SQL queries
#[derive(Parser, Debug)]
#[command(name = "dpjoin")]
#[command(about = "Enumerate DP join-order subsets for every query in a file", long_about = None)]
#[command(version)]
pub struct Args {
    /// Input file containing one or more SQL queries
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Output CSV file
    #[arg(long, value_name = "FILE", default_value = "dpjoin_output.csv")]
    pub output: PathBuf,

    /// Treat the input file as semicolon-delimited queries instead of one-per-line
    #[arg(long)]
    pub semicolon_separated: bool,

    /// Abort on the first query that fails to parse or enumerate
    #[arg(long)]
    pub stop_on_error: bool,

    /// Maximum subset cardinality to enumerate
    #[arg(long, default_value_t = 20)]
    pub max_level: usize,

    /// SQL dialect to parse queries with
    #[arg(long, default_value = "generic", value_enum)]
    pub dialect: DialectArg,

    /// Raise the log level and report a per-query subset count
    #[arg(short, long)]
    pub verbose: bool,
}

/// SQL dialect options, mirroring the dialects `sqlparser` ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DialectArg {
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

impl From<DialectArg> for dpjoin_core::Dialect {
    fn from(d: DialectArg) -> Self {
        match d {
            DialectArg::Generic => dpjoin_core::Dialect::Generic,
            DialectArg::Ansi => dpjoin_core::Dialect::Ansi,
            DialectArg::Bigquery => dpjoin_core::Dialect::Bigquery,
            DialectArg::Clickhouse => dpjoin_core::Dialect::Clickhouse,
            DialectArg::Hive => dpjoin_core::Dialect::Hive,
            DialectArg::Mssql => dpjoin_core::Dialect::Mssql,
            DialectArg::Mysql => dpjoin_core::Dialect::Mysql,
            DialectArg::Postgres => dpjoin_core::Dialect::Postgres,
            DialectArg::Redshift => dpjoin_core::Dialect::Redshift,
            DialectArg::Snowflake => dpjoin_core::Dialect::Snowflake,
            DialectArg::Sqlite => dpjoin_core::Dialect::Sqlite,
        }
    }
}
