mod print;

use listen_stats::{
    config::Config,
    date::DateRange,
    details::{listening_details, song_details},
    export,
    hierarchy::build_artist_hierarchy,
    history::{history_paths, load_history},
    query::{Analysis, Query, QueryParams},
    rank::{search_ranked, GroupBy},
    recap::{familiar_tracks, recap},
    Locale, PlayEvent,
};
use anyhow::{anyhow, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use log::error;
use std::fs::File;
use std::io::BufWriter;
use std::process::ExitCode;

#[derive(Parser)]
#[command(about = "Listening statistics from streaming history exports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Log more (repeatable)")]
    verbose: u8,

    #[arg(short, long, global = true, help = "Silence all log output")]
    quiet: bool,
}

#[derive(Args)]
struct Input {
    /// History files or directories containing them. Defaults to $LISTEN_STATS_DIR.
    #[arg(long = "input", short = 'i')]
    inputs: Vec<Utf8PathBuf>,

    #[arg(long, help = "Language of placeholder names: zh-tw or en")]
    locale: Option<String>,

    #[arg(long, help = "First day to include, YYYYMMDD")]
    start: Option<String>,

    #[arg(long, help = "Last day to include, YYYYMMDD")]
    end: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank songs, artists, albums or any other field.
    Rank {
        #[command(flatten)]
        input: Input,

        #[arg(short, long, default_value = "track", help = "Field to group by")]
        by: String,

        #[arg(short, long, default_value = "all", help = "Number of entries to show, or \"all\"")]
        limit: String,

        #[arg(short, long, default_value = "count", help = "count, duration or avg_duration")]
        metric: String,

        #[arg(short, long, help = "Only show entries containing this text")]
        search: Option<String>,
    },
    /// Show how listening changed month by month.
    Trend {
        #[command(flatten)]
        input: Input,

        /// monthly_total_duration, monthly_top_songs or monthly_top_artists
        kind: String,

        #[arg(short = 'n', long, default_value = "5", help = "Entries per month")]
        top: String,
    },
    /// Break an artist down into albums and songs.
    Artist {
        #[command(flatten)]
        input: Input,

        /// Exact artist name
        name: String,

        #[arg(short, long, help = "Only list the songs of this album")]
        album: Option<String>,
    },
    /// List the plays behind a ranked entry.
    Details {
        #[command(flatten)]
        input: Input,

        #[arg(short, long, default_value = "track", help = "Field the entry was ranked by")]
        by: String,

        /// The ranked entry, e.g. "Song - Artist"
        key: Option<String>,

        #[arg(long, requires = "song", conflicts_with = "key", help = "Artist of --song")]
        artist: Option<String>,

        #[arg(long, requires = "artist", help = "List the plays of one song of --artist")]
        song: Option<String>,
    },
    /// Print a summary of the period.
    Recap {
        #[command(flatten)]
        input: Input,
    },
    /// List the songs considered already familiar.
    Familiar {
        #[command(flatten)]
        input: Input,

        #[arg(short, long, help = "Number of most played songs, default $LISTEN_STATS_FAMILIAR or 300")]
        threshold: Option<usize>,
    },
    /// Write a ranking, a trend or listening details to a CSV file.
    Export {
        #[command(flatten)]
        input: Input,

        #[arg(short, long, default_value = "track", help = "Field to group by")]
        by: String,

        #[arg(short, long, default_value = "all", help = "Number of entries to export, or \"all\"")]
        limit: String,

        #[arg(short, long, default_value = "count", help = "count, duration or avg_duration")]
        metric: String,

        #[arg(short, long, default_value = "none", help = "Export a trend instead of a ranking")]
        trend: String,

        #[arg(short = 'n', long, default_value = "5", help = "Entries per month of a trend")]
        top: String,

        #[arg(long, help = "Export the plays behind this ranked entry instead")]
        details: Option<String>,

        #[arg(short, long, default_value = ".", help = "Directory to write the file to")]
        output: Utf8PathBuf,
    },
}

/// Everything a command needs: loaded records plus the settings in effect.
struct Session {
    records: Vec<PlayEvent>,
    locale: Locale,
    range: Option<DateRange>,
    config: Config,
}

impl Session {
    fn open(input: &Input) -> Result<Self> {
        let config = Config::from_env();
        let locale = match &input.locale {
            Some(s) => s.parse::<Locale>()?,
            None => config.locale,
        };
        let range = DateRange::parse(input.start.as_deref(), input.end.as_deref())?;
        let paths = resolve_paths(&input.inputs, &config)?;
        if paths.is_empty() {
            return Err(anyhow!("No history files found"));
        }
        let records = load_history(&paths, locale.labels())?;
        Ok(Self { records, locale, range, config })
    }

    fn query(&self, params: QueryParams) -> Result<Query> {
        let mut query = Query::parse(&params)?;
        query.range = self.range;
        Ok(query)
    }

    fn filtered(&self) -> Vec<&PlayEvent> {
        listen_stats::date::filter_by_range(&self.records, self.range.as_ref())
    }
}

/// Expands directories into the history files inside them. The configured directory is only
/// consulted when no inputs were given.
fn resolve_paths(inputs: &[Utf8PathBuf], config: &Config) -> Result<Vec<Utf8PathBuf>> {
    if inputs.is_empty() {
        return history_paths(config.history_dir()?);
    }
    let mut paths = Vec::<Utf8PathBuf>::new();
    for input in inputs {
        if input.is_dir() {
            paths.extend(history_paths(input)?);
        } else {
            paths.push(input.clone());
        }
    }
    Ok(paths)
}

fn create(dir: &Utf8Path, name: &str) -> Result<(Utf8PathBuf, BufWriter<File>)> {
    let path = dir.join(name);
    match File::create(&path) {
        Ok(file) => Ok((path, BufWriter::new(file))),
        Err(e) => Err(anyhow!("Failed to create '{}': {}", path, e)),
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Rank { input, by, limit, metric, search } => {
            let session = Session::open(&input)?;
            let query = session.query(QueryParams { group_by: &by, limit: &limit, metric: &metric, ..Default::default() })?;
            if let Analysis::Ranking(entries) = query.run(&session.records, session.locale.labels()) {
                match search {
                    Some(term) => print::ranking(&search_ranked(&entries, &term), query.metric),
                    None => print::ranking(&entries.iter().collect::<Vec<_>>(), query.metric),
                }
            }
        },

        Commands::Trend { input, kind, top } => {
            let session = Session::open(&input)?;
            let query = session.query(QueryParams { trend: &kind, top_n: &top, ..Default::default() })?;
            if query.trend.is_none() {
                return Err(anyhow!("Choose a trend kind: monthly_total_duration, monthly_top_songs or monthly_top_artists"));
            }
            if let Analysis::Trend(points) = query.run(&session.records, session.locale.labels()) {
                print::trend(&points);
            }
        },

        Commands::Artist { input, name, album } => {
            let session = Session::open(&input)?;
            let filtered = session.filtered();
            let Some(hierarchy) = build_artist_hierarchy(&filtered, &name) else {
                println!("No plays of '{}' found.", name);
                return Ok(());
            };
            match album {
                Some(album) => match hierarchy.album_songs(&album) {
                    Some(songs) => print::songs(&songs),
                    None => return Err(anyhow!("'{}' has no album named '{}'", name, album)),
                },
                None => print::hierarchy(&hierarchy),
            }
        },

        Commands::Details { input, by, key, artist, song } => {
            let session = Session::open(&input)?;
            let filtered = session.filtered();
            let details = match (key, artist, song) {
                (_, Some(artist), Some(song)) => song_details(&filtered, &artist, &song),
                (Some(key), _, _) => {
                    let group_by = by.parse::<GroupBy>()?;
                    listening_details(&filtered, group_by, &key, session.locale.labels())
                },
                _ => return Err(anyhow!("Give either a ranked entry or --artist with --song")),
            };
            print::details(&details, session.locale.labels());
        },

        Commands::Recap { input } => {
            let session = Session::open(&input)?;
            print::recap(&recap(&session.filtered(), session.locale.labels()));
        },

        Commands::Familiar { input, threshold } => {
            let session = Session::open(&input)?;
            let threshold = threshold.unwrap_or(session.config.familiar_threshold);
            let mut familiar = familiar_tracks(&session.filtered(), threshold, session.locale.labels())
                .into_iter()
                .collect::<Vec<_>>();
            familiar.sort_unstable();
            for key in familiar {
                println!("{}", key);
            }
        },

        Commands::Export { input, by, limit, metric, trend, top, details, output } => {
            let session = Session::open(&input)?;
            let labels = session.locale.labels();
            let query = session.query(QueryParams {
                group_by: &by,
                limit: &limit,
                metric: &metric,
                trend: &trend,
                top_n: &top,
                ..Default::default()
            })?;
            let path = if let Some(key) = details {
                let filtered = session.filtered();
                let details = listening_details(&filtered, query.group_by, &key, labels);
                let (path, file) = create(&output, &export::details_file_name(&key))?;
                export::write_details(file, &details, labels)?;
                path
            } else {
                match query.run(&session.records, labels) {
                    Analysis::Ranking(entries) => {
                        let (path, file) = create(&output, &export::ranking_file_name(query.group_by, query.range.as_ref()))?;
                        export::write_ranking(file, &entries, query.group_by, query.metric, query.range.as_ref())?;
                        path
                    },
                    Analysis::Trend(points) => {
                        // Only produced when a trend kind was parsed
                        let Some(kind) = query.trend else {
                            return Err(anyhow!("Trend export without a trend kind"));
                        };
                        let (path, file) = create(&output, &export::trend_file_name(kind, query.range.as_ref()))?;
                        export::write_trend(file, &points, kind, query.range.as_ref())?;
                        path
                    },
                }
            };
            println!("Exported to '{}'", path);
        },
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    stderrlog::new()
        .module(module_path!())
        .module("listen_stats")
        .quiet(cli.quiet)
        .verbosity(2 + cli.verbose as usize)
        .init()
        .unwrap();

    if let Err(e) = run(cli.command) {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
