//! CLI tool for extracting clue words from an archive of PowerPoint decks.

use anyhow::{bail, Context, Result};
use clap::Parser;
use croco_core::{check_spelling, Speller};
use croco_speller::{SpellerConfig, YandexSpeller, DEFAULT_BASE_URL, DEFAULT_LANG};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extract clue words from the decks inside a ZIP archive into a word list.
#[derive(Parser, Debug)]
#[command(name = "croco-extract")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ZIP archive holding .pptx decks
    #[arg(short, long, default_value = "src/croco-blitz-source.zip")]
    archive: PathBuf,

    /// Output word list, one word per line
    #[arg(short, long, default_value = "words.txt")]
    output: PathBuf,

    /// Base URL of the Yandex Speller JSON service
    #[arg(long, env = "SPELLER_URL", default_value = DEFAULT_BASE_URL)]
    speller_url: String,

    /// Languages the speller checks against
    #[arg(long, env = "SPELLER_LANG", default_value = DEFAULT_LANG)]
    speller_lang: String,

    /// Speller request timeout in seconds
    #[arg(long, env = "SPELLER_TIMEOUT_SECS", default_value_t = 30)]
    speller_timeout_secs: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn speller_config(&self) -> SpellerConfig {
        SpellerConfig {
            base_url: self.speller_url.clone(),
            lang: self.speller_lang.clone(),
            timeout: Duration::from_secs(self.speller_timeout_secs),
            ..SpellerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let speller = YandexSpeller::new(args.speller_config())?;
    let count = extract_words(&args.archive, &args.output, &speller).await?;

    if args.verbose {
        eprintln!("Written {} words to {}", count, args.output.display());
    }

    Ok(())
}

/// Gather the clues of every deck in `archive`, spell-check them and write
/// them to `output`. Returns the number of words written.
async fn extract_words(archive: &Path, output: &Path, speller: &dyn Speller) -> Result<usize> {
    if !archive.is_file() {
        bail!("Archive not found: {}", archive.display());
    }

    let file = File::open(archive)
        .with_context(|| format!("Failed to open {}", archive.display()))?;
    let clues: BTreeSet<String> = croco_pptx::clues_in_zip(file)
        .with_context(|| format!("Failed to read decks from {}", archive.display()))?
        .into_iter()
        .collect();
    let sorted: Vec<String> = clues.into_iter().collect();

    let words = check_spelling(speller, &sorted)
        .await
        .context("Spell checking failed")?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    write_words(output, &words)?;

    Ok(words.len())
}

/// Write one word per line.
fn write_words(path: &Path, words: &[String]) -> Result<()> {
    log::info!("saving {} words to {}", words.len(), path.display());

    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for word in words {
        writeln!(writer, "{}", word)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
