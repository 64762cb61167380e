use clap::{Parser, Subcommand, ValueEnum};
use eyre::{Result, eyre};
use searchdash::controller::LOAD_ERROR_LABEL;
use searchdash::render::render_words;
use searchdash::source::DataResponse;
use searchdash::store::DEFAULT_SAMPLE_LIMIT;
use searchdash::{
    Config, Controller, DateRange, DayOfWeek, Dimension, DimensionKey, LoadStatus, SearchLog, TextSurface, WordCloud,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "searchdash")]
#[command(about = "SearchDash CLI - Cross-filtering analytics over a search-log table")]
#[command(version)]
struct Cli {
    /// Path to the YAML config file (default: <config_dir>/searchdash/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the SQLite database (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import search-log rows from a JSONL file
    Import {
        /// JSONL file, one {fecha, tipo_busqueda, criterio_texto} object per line
        file: PathBuf,
    },

    /// Load a date range and draw the four charts
    Dashboard {
        #[command(flatten)]
        range: RangeArgs,

        /// Year shown by the monthly chart (default: earliest loaded year)
        #[arg(long)]
        year: Option<i32>,

        /// Select search types (repeatable)
        #[arg(long = "type")]
        types: Vec<String>,

        /// Select days of the week by short name, e.g. Lun (repeatable)
        #[arg(long)]
        day: Vec<String>,

        /// Brush an hour range, half-open, e.g. 9-18
        #[arg(long, value_parser = parse_hours)]
        hours: Option<HourSpan>,

        /// Print chart frames as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Word frequencies over the filtered free text
    Words {
        #[command(flatten)]
        range: RangeArgs,

        /// Select search types (repeatable)
        #[arg(long = "type")]
        types: Vec<String>,

        /// Maximum number of words (default: word_limit from config)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run one aggregate query against the database and print JSON
    Query {
        kind: QueryKind,

        /// Lower bound, YYYY-MM-DD, DD/MM/YYYY or RFC3339
        #[arg(long)]
        start: Option<String>,

        /// Upper bound, YYYY-MM-DD, DD/MM/YYYY or RFC3339
        #[arg(long)]
        end: Option<String>,

        /// Restrict to one search type
        #[arg(long)]
        tipo: Option<String>,

        /// Row limit for `sample`
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(clap::Args)]
struct RangeArgs {
    /// Lower bound, YYYY-MM-DD (default: start from config)
    #[arg(long)]
    start: Option<String>,

    /// Upper bound, YYYY-MM-DD (default: end from config)
    #[arg(long)]
    end: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum QueryKind {
    Monthly,
    Hourly,
    Dow,
    Types,
    Sample,
    Data,
}

#[derive(Debug, Clone, Copy)]
struct HourSpan(u32, u32);

fn parse_hours(s: &str) -> Result<HourSpan, String> {
    let (lo, hi) = s.split_once('-').ok_or_else(|| format!("expected LO-HI, got {}", s))?;
    let lo: u32 = lo.trim().parse().map_err(|_| format!("invalid hour: {}", lo))?;
    let hi: u32 = hi.trim().parse().map_err(|_| format!("invalid hour: {}", hi))?;
    if lo >= hi || hi > 24 {
        return Err(format!("hour range must satisfy 0 <= LO < HI <= 24, got {}", s));
    }
    Ok(HourSpan(lo, hi))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Open the database and load the requested range into a controller
fn load_dashboard(db: PathBuf, config: &Config, range: &RangeArgs) -> Result<Controller<SearchLog, TextSurface>> {
    let log = SearchLog::open(&db)?;
    let mut controller = Controller::new(log, TextSurface::new(config.bar_width));

    let start = range.start.as_deref().or(config.start.as_deref()).unwrap_or("");
    let end = range.end.as_deref().or(config.end.as_deref()).unwrap_or("");

    match controller.apply_filters(start, end)? {
        LoadStatus::Failed(msg) => return Err(eyre!("{}: {}", LOAD_ERROR_LABEL, msg)),
        status => info!(status = ?status, "Dashboard loaded"),
    }
    Ok(controller)
}

fn select_types(controller: &mut Controller<SearchLog, TextSurface>, types: Vec<String>) -> Result<()> {
    if types.is_empty() {
        return Ok(());
    }
    let keys = types.into_iter().map(DimensionKey::SearchType).collect();
    controller.select_many(Dimension::SearchType, keys)
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let db = cli.db.clone().unwrap_or_else(|| config.database_path());

    match cli.command {
        Commands::Import { file } => {
            let rows = searchdash::jsonl::read_rows(&file)?;
            let mut log = SearchLog::open(&db)?;
            let inserted = log.insert_rows(&rows)?;
            println!("Imported {} rows into {:?} ({} total)", inserted, db, log.count()?);
        }

        Commands::Dashboard {
            range,
            year,
            types,
            day,
            hours,
            json,
        } => {
            let mut controller = load_dashboard(db, &config, &range)?;

            if let Some(year) = year
                && !controller.select_year(year)
            {
                return Err(eyre!(
                    "Year {} not loaded, available: {:?}",
                    year,
                    controller.state().pager.available_years()
                ));
            }

            select_types(&mut controller, types)?;

            if !day.is_empty() {
                let keys = day
                    .iter()
                    .map(|d| {
                        DayOfWeek::from_name(d)
                            .map(DimensionKey::Day)
                            .ok_or_else(|| eyre!("Unknown day: {}", d))
                    })
                    .collect::<Result<Vec<_>>>()?;
                controller.select_many(Dimension::DayOfWeek, keys)?;
            }

            if let Some(HourSpan(lo, hi)) = hours {
                controller.brush(Dimension::Hour, DimensionKey::Hour(lo), DimensionKey::Hour(hi))?;
            }

            if json {
                let state = controller.state();
                let frames = match &state.index {
                    Some(index) => searchdash::ChartBindings::frames(index, &state.pager),
                    None => Vec::new(),
                };
                print_json(&frames)?;
            } else {
                print!("{}", controller.surface().render());
            }
        }

        Commands::Words {
            range,
            types,
            limit,
            json,
        } => {
            let mut controller = load_dashboard(db, &config, &range)?;
            select_types(&mut controller, types)?;

            match controller.word_cloud(limit.unwrap_or(config.word_limit)) {
                WordCloud::Words(words) if json => print_json(&words)?,
                WordCloud::Words(words) => print!("{}", render_words(&words)),
                other => println!("{}", other.message().unwrap_or_default()),
            }
        }

        Commands::Query {
            kind,
            start,
            end,
            tipo,
            limit,
        } => {
            let log = SearchLog::open(&db)?;
            let range = DateRange::from_query(start.as_deref(), end.as_deref());
            let tipo = tipo.as_deref();

            match kind {
                QueryKind::Monthly => print_json(&log.monthly(&range, tipo)?)?,
                QueryKind::Hourly => print_json(&log.hourly(&range, tipo)?)?,
                QueryKind::Dow => print_json(&log.dow(&range, tipo)?)?,
                QueryKind::Types => print_json(&log.types(&range)?)?,
                QueryKind::Sample => {
                    print_json(&log.sample(&range, tipo, limit.unwrap_or(DEFAULT_SAMPLE_LIMIT))?)?
                }
                QueryKind::Data => print_json(&DataResponse { data: log.rows(&range)? })?,
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hours() {
        let HourSpan(lo, hi) = parse_hours("9-18").unwrap();
        assert_eq!((lo, hi), (9, 18));
        let HourSpan(lo, hi) = parse_hours("0 - 24").unwrap();
        assert_eq!((lo, hi), (0, 24));

        assert!(parse_hours("18-9").is_err());
        assert!(parse_hours("9-25").is_err());
        assert!(parse_hours("nine").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["searchdash", "--db", "x.db", "dashboard", "--type", "autor", "--hours", "8-12"])
            .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        match cli.command {
            Commands::Dashboard { types, hours, .. } => {
                assert_eq!(types, vec!["autor".to_string()]);
                assert!(matches!(hours, Some(HourSpan(8, 12))));
            }
            _ => panic!("expected dashboard"),
        }

        assert!(Cli::try_parse_from(["searchdash", "query", "monthly", "--tipo", "autor"]).is_ok());
        assert!(Cli::try_parse_from(["searchdash", "query", "bogus"]).is_err());
    }
}
