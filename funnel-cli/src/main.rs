//! `funnel` - show what the listing engine does to a SELECT statement.
//!
//! ```text
//! funnel compose --config heroes.toml --sql "SELECT * FROM heroes" \
//!     --filter name:contains=man --sort name=asc --page 2 --limit 10
//! funnel check-config --config heroes.toml
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `warn`).

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use funnel_sql::{
    ComposedQuery, ConditionCompiler, Dialect, FilterSpec, LimitClause, ListModel, ListingConfig,
    ListingRequest, OrderByClause, Postgres, QueryComposer, SortSpec, Sqlite, Value,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "funnel", version, about = "Compose listing queries over hand-written SELECT statements")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compose a listing query and print it with its bound parameters
    Compose(ComposeArgs),
    /// Validate a listing configuration file and print the resolved options
    CheckConfig {
        /// Listing configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum DialectArg {
    #[default]
    Postgres,
    Sqlite,
}

#[derive(Debug, Args)]
struct ComposeArgs {
    /// Listing configuration (TOML); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base SELECT statement
    #[arg(long, conflicts_with = "sql_file", required_unless_present = "sql_file")]
    sql: Option<String>,

    /// Read the base SELECT statement from a file
    #[arg(long)]
    sql_file: Option<PathBuf>,

    /// Placeholder syntax and pattern operators
    #[arg(short, long, value_enum, default_value_t)]
    dialect: DialectArg,

    /// Filter entry `column[:operator]=value`; repeatable
    #[arg(short, long = "filter", value_name = "KEY=VALUE", value_parser = parse_pair)]
    filters: Vec<(String, String)>,

    /// Free-text search term
    #[arg(short, long)]
    search: Option<String>,

    /// Sort entry `column=asc|desc`; repeatable, applied in order
    #[arg(long = "sort", value_name = "COLUMN=DIR", value_parser = parse_pair)]
    sorts: Vec<(String, String)>,

    /// Page number (1-based)
    #[arg(long)]
    page: Option<String>,

    /// Page size
    #[arg(long)]
    limit: Option<String>,

    /// Value for the base statement's own placeholders, in order; repeatable
    #[arg(long = "param", value_name = "VALUE")]
    params: Vec<String>,

    /// Compose without LIMIT/OFFSET
    #[arg(long)]
    unbounded: bool,

    /// Print JSON instead of annotated SQL
    #[arg(long)]
    json: bool,
}

impl ComposeArgs {
    fn request(&self) -> ListingRequest {
        ListingRequest {
            filters: self.filters.clone(),
            search: self.search.clone(),
            sorts: self.sorts.clone(),
            page: self.page.clone(),
            limit: self.limit.clone(),
        }
    }

    fn base_params(&self) -> Vec<Value> {
        self.params.iter().map(|p| Value::from(p.as_str())).collect()
    }

    fn base_sql(&self) -> Result<String> {
        match (&self.sql, &self.sql_file) {
            (Some(sql), _) => Ok(sql.clone()),
            (None, Some(path)) => fs::read_to_string(path)
                .with_context(|| format!("reading base statement from {}", path.display())),
            (None, None) => anyhow::bail!("one of --sql or --sql-file is required"),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComposeOutput<'a> {
    sql: &'a str,
    params: &'a [Value],
    count_alias: &'a str,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

fn load_config(path: Option<&Path>) -> Result<ListingConfig> {
    let Some(path) = path else {
        return Ok(ListingConfig::default());
    };
    let source = fs::read_to_string(path)
        .with_context(|| format!("reading configuration from {}", path.display()))?;
    ListingConfig::from_toml_str(&source)
        .with_context(|| format!("invalid configuration in {}", path.display()))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: &Cli) -> Result<String> {
    match &cli.command {
        Command::Compose(args) => {
            let config = load_config(args.config.as_deref())?;
            let base_sql = args.base_sql()?;
            match args.dialect {
                DialectArg::Postgres => compose(Postgres, &config, &base_sql, args),
                DialectArg::Sqlite => compose(Sqlite, &config, &base_sql, args),
            }
        },
        Command::CheckConfig { config } => {
            let config = load_config(Some(config))?;
            Ok(describe(&config))
        },
    }
}

fn compose<D: Dialect>(
    dialect: D,
    config: &ListingConfig,
    base_sql: &str,
    args: &ComposeArgs,
) -> Result<String> {
    let request = args.request();
    let query = if args.unbounded {
        compose_unbounded(dialect, config, base_sql, &request, &args.base_params())?
    } else {
        ListModel::new(dialect, config.clone(), base_sql)
            .with_params(args.base_params())
            .prepare(&request)?
            .query
    };
    tracing::debug!(params = query.params.len(), "composed");

    if args.json {
        let output = ComposeOutput {
            sql: &query.sql,
            params: &query.params,
            count_alias: &query.count_alias,
        };
        return Ok(serde_json::to_string_pretty(&output)? + "\n");
    }

    let mut out = format!("{}\n", query.sql);
    for (idx, value) in query.params.iter().enumerate() {
        writeln!(
            out,
            "-- {} = {}",
            dialect.param(idx + 1),
            serde_json::to_string(value)?
        )?;
    }
    Ok(out)
}

fn compose_unbounded<D: Dialect>(
    dialect: D,
    config: &ListingConfig,
    base_sql: &str,
    request: &ListingRequest,
    base_params: &[Value],
) -> Result<ComposedQuery> {
    let filters = FilterSpec::new(
        config,
        request.filters.iter().map(|(k, v)| (k, v)),
        request.search.as_deref(),
    );
    let sorts = SortSpec::new(config, request.sorts.iter().map(|(k, v)| (k, v)));
    let where_clause = ConditionCompiler::new(config).where_clause(&filters)?;

    Ok(QueryComposer::for_config(dialect, config).compose(
        base_sql,
        base_params,
        &where_clause,
        &OrderByClause::from_spec(&sorts),
        &LimitClause::unbounded(),
    )?)
}

fn describe(config: &ListingConfig) -> String {
    let join = |items: Vec<String>| {
        if items.is_empty() {
            "(none)".to_string()
        } else {
            items.join(", ")
        }
    };

    let whitelist = config.whitelist().map_or_else(
        || "(none: any safe identifier)".to_string(),
        |names| join(names.iter().cloned().collect()),
    );
    let aliases = join(
        config
            .alias_columns()
            .iter()
            .map(|(from, to)| format!("{from} -> {to}"))
            .collect(),
    );
    let sorts = join(
        config
            .default_sorts()
            .iter()
            .map(|sort| format!("{} {}", sort.column, sort.direction.as_sql()))
            .collect(),
    );

    let mut out = String::new();
    let _ = writeln!(out, "whitelist:        {whitelist}");
    let _ = writeln!(out, "aliases:          {aliases}");
    let _ = writeln!(out, "searchable:       {}", join(config.searchable_columns().to_vec()));
    let _ = writeln!(out, "default sorts:    {sorts}");
    let _ = writeln!(
        out,
        "nulls last:       asc={} desc={}",
        config.asc_nulls_last(),
        config.desc_nulls_last()
    );
    let _ = writeln!(
        out,
        "limits:           default={} max={}",
        config.default_limit(),
        config.max_limit_allowed()
    );
    let _ = writeln!(out, "aggregate:        {}", config.aggregate_operator().as_sql());
    let _ = writeln!(out, "search enabled:   {}", config.search_enabled());
    let _ = writeln!(out, "count alias:      {}", config.count_alias());
    out
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let output = run(&cli)?;
    print!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("funnel").chain(args.iter().copied()))?;
        run(&cli)
    }

    fn temp_config(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("funnel-cli-{}-{name}.toml", std::process::id()));
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("name:contains=man").unwrap(),
            ("name:contains".to_string(), "man".to_string())
        );
        assert_eq!(
            parse_pair("age:between=10~20").unwrap(),
            ("age:between".to_string(), "10~20".to_string())
        );
        assert!(parse_pair("name").is_err());
    }

    #[test]
    fn test_compose_sqlite_text() {
        let out = run_args(&[
            "compose",
            "--sql",
            "SELECT * FROM heroes",
            "--dialect",
            "sqlite",
            "--filter",
            "name:contains=man",
            "--limit",
            "50",
        ])
        .unwrap();

        insta::assert_snapshot!(out.trim_end(), @r#"
        SELECT count(*) OVER() AS _zf_count, * FROM heroes WHERE (name LIKE ?1 ESCAPE '\') LIMIT 50 OFFSET 0
        -- ?1 = "%man%"
        "#);
    }

    #[test]
    fn test_compose_json_with_config() {
        let config = temp_config(
            "json",
            r#"
whitelist = ["name"]
alias_columns = { name = "real_name" }
default_limit = 10
"#,
        );
        let out = run_args(&[
            "compose",
            "--config",
            config.to_str().unwrap(),
            "--sql",
            "SELECT * FROM heroes",
            "--sort",
            "name=desc",
            "--sort",
            "secret=asc",
            "--json",
        ])
        .unwrap();
        fs::remove_file(config).ok();

        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            json["sql"],
            "SELECT count(*) OVER() AS _zf_count, * FROM heroes ORDER BY real_name DESC LIMIT 10 OFFSET 0"
        );
        assert_eq!(json["countAlias"], "_zf_count");
        assert!(json["params"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_compose_unbounded_keeps_base_limit() {
        let out = run_args(&[
            "compose",
            "--sql",
            "SELECT * FROM heroes WHERE team = $1 LIMIT 5",
            "--param",
            "JLA",
            "--filter",
            "name:equals=Flash",
            "--unbounded",
        ])
        .unwrap();

        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some(
                "SELECT count(*) OVER() AS _zf_count, * FROM heroes WHERE (team = $1) AND (name = $2) LIMIT 5"
            )
        );
        assert_eq!(lines.next(), Some("-- $1 = \"JLA\""));
        assert_eq!(lines.next(), Some("-- $2 = \"Flash\""));
    }

    #[test]
    fn test_compose_bounded_over_base_limit_fails() {
        let err = run_args(&["compose", "--sql", "SELECT * FROM heroes LIMIT 5"]).unwrap_err();
        assert!(err.to_string().contains("unsupported base query"));
    }

    #[test]
    fn test_check_config_rejects_bad_limits() {
        let config = temp_config("limits", "default_limit = 50\nmax_limit_allowed = 10\n");
        let err = run_args(&["check-config", "--config", config.to_str().unwrap()]).unwrap_err();
        fs::remove_file(config).ok();

        let message = format!("{err:#}");
        assert!(message.contains("max_limit_allowed (10)"), "{message}");
    }

    #[test]
    fn test_check_config_describes_options() {
        let config = temp_config(
            "describe",
            r#"
whitelist = ["age", "name"]
searchable_columns = ["name"]
default_sorts = [{ column = "age", direction = "desc" }]
desc_nulls_last = true
aggregate_operator = "OR"
"#,
        );
        let out = run_args(&["check-config", "--config", config.to_str().unwrap()]).unwrap();
        fs::remove_file(config).ok();

        assert!(out.contains("whitelist:        age, name"));
        assert!(out.contains("default sorts:    age DESC"));
        assert!(out.contains("nulls last:       asc=false desc=true"));
        assert!(out.contains("aggregate:        OR"));
        assert!(out.contains("count alias:      _zf_count"));
    }

    #[test]
    fn test_missing_sql_is_a_usage_error() {
        assert!(Cli::try_parse_from(["funnel", "compose"]).is_err());
    }
}
