use anyhow::{bail, Context};
use bzip2::read::BzDecoder;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use wikilex::{parse_page, Dictionary, DirectoryRetriever, Edition, ExtractionConfig, LexicalRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EditionArg {
    /// Polish edition (pl.wiktionary.org)
    Pl,
    /// English edition (en.wiktionary.org)
    En,
}

impl From<EditionArg> for Edition {
    fn from(arg: EditionArg) -> Self {
        match arg {
            EditionArg::Pl => Edition::Polish,
            EditionArg::En => Edition::English,
        }
    }
}

#[derive(Parser)]
#[command(name = "wikilex")]
#[command(about = "Extract dictionary records from Wiktionary wikitext - outputs one JSON record per line")]
struct Args {
    /// Extraction tables YAML (default: built-in Polish tables, see schema/pl.yaml)
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// Quiet mode - records only, no progress or log output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Include the raw page markup in each record
    #[arg(long, global = true)]
    raw: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a local page file (.wiki or .wiki.bz2)
    Parse {
        input: PathBuf,

        #[arg(short, long, value_enum, default_value_t = EditionArg::Pl)]
        edition: EditionArg,

        /// Headword (default: file name without extensions)
        #[arg(long)]
        word: Option<String>,
    },

    /// Look words up in a page directory laid out as <DIR>/<edition>/<word>.wiki
    Lookup {
        #[arg(short, long)]
        dir: PathBuf,

        #[arg(short, long, value_enum, default_value_t = EditionArg::Pl)]
        edition: EditionArg,

        /// Per-page retrieval timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,

        #[arg(required = true)]
        words: Vec<String>,
    },

    /// List page titles starting with a prefix
    Search {
        #[arg(short, long)]
        dir: PathBuf,

        #[arg(short, long, value_enum, default_value_t = EditionArg::Pl)]
        edition: EditionArg,

        prefix: String,
    },
}

fn init_tracing(quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(schema: Option<&Path>) -> anyhow::Result<ExtractionConfig> {
    match schema {
        Some(path) => ExtractionConfig::load(path).with_context(|| format!("loading schema {}", path.display())),
        None => Ok(ExtractionConfig::default()),
    }
}

/// Read a page file, decompressing `.bz2`
fn read_page(path: &Path) -> anyhow::Result<String> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader: Box<dyn Read> = if path.to_string_lossy().ends_with(".bz2") {
        Box::new(BzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(text)
}

/// `kot.wiki.bz2` → `kot`
fn headword_from_path(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_suffix(".bz2").unwrap_or(&name);
    name.strip_suffix(".wiki").unwrap_or(name).to_string()
}

fn print_record(record: &LexicalRecord, include_raw: bool) -> anyhow::Result<()> {
    let line = if include_raw || record.raw_source.is_empty() {
        serde_json::to_string(record)?
    } else {
        let mut trimmed = record.clone();
        trimmed.raw_source.clear();
        serde_json::to_string(&trimmed)?
    };
    println!("{}", line);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.quiet);
    let config = load_config(args.schema.as_deref())?;

    match args.command {
        Command::Parse { input, edition, word } => {
            let raw = read_page(&input)?;
            let word = word.unwrap_or_else(|| headword_from_path(&input));
            let record = parse_page(edition.into(), &word, &raw, &config);
            if let Some(degraded) = record.degraded() {
                if !args.quiet {
                    eprintln!("{}: missing {:?}", word, degraded.missing);
                }
            }
            print_record(&record, args.raw)?;
        }

        Command::Lookup {
            dir,
            edition,
            timeout,
            words,
        } => {
            let dict = Dictionary::new(DirectoryRetriever::new(dir))
                .with_config(config)
                .with_timeout(Duration::from_secs(timeout));

            let pb = if args.quiet {
                ProgressBar::hidden()
            } else {
                let pb = ProgressBar::new(words.len() as u64);
                pb.set_style(ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")?);
                pb
            };

            let mut failures = 0;
            for word in &words {
                pb.set_message(word.clone());
                match dict.get_record(edition.into(), word).await {
                    Ok(record) => pb.suspend(|| print_record(&record, args.raw))?,
                    Err(e) => {
                        failures += 1;
                        pb.suspend(|| eprintln!("{}: {}", word, e));
                    }
                }
                pb.inc(1);
            }
            pb.finish_and_clear();

            if failures > 0 {
                bail!("{} of {} lookups failed", failures, words.len());
            }
        }

        Command::Search { dir, edition, prefix } => {
            let dict = Dictionary::new(DirectoryRetriever::new(dir)).with_config(config);
            for title in dict.search(edition.into(), &prefix).await? {
                println!("{}", title);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headword_strips_page_extensions() {
        assert_eq!(headword_from_path(Path::new("pages/kot.wiki")), "kot");
        assert_eq!(headword_from_path(Path::new("kot.wiki.bz2")), "kot");
        assert_eq!(headword_from_path(Path::new("żaba")), "żaba");
    }

    #[test]
    fn args_parse_lookup() {
        let args = Args::try_parse_from(["wikilex", "lookup", "--dir", "pages", "-e", "en", "cat", "dog"]).unwrap();
        match args.command {
            Command::Lookup { edition, words, timeout, .. } => {
                assert_eq!(edition, EditionArg::En);
                assert_eq!(words, vec!["cat", "dog"]);
                assert_eq!(timeout, 10);
            }
            _ => panic!("expected lookup"),
        }
    }

    #[test]
    fn read_page_decompresses_bz2() {
        use bzip2::write::BzEncoder;
        use bzip2::Compression;
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kot.wiki.bz2");
        let mut encoder = BzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all("{{znaczenia}}\n: kot".as_bytes()).unwrap();
        encoder.finish().unwrap();

        assert_eq!(read_page(&path).unwrap(), "{{znaczenia}}\n: kot");
    }
}
