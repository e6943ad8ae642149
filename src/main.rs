mod card_template;
mod carddeck;
mod config;
mod config_persistence;
mod enrichment;
mod extractor;
mod gateway;
mod playlist;
mod progress;
mod scannable;
mod snapshot;
mod summary;

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use carddeck::CardDeck;
use extractor::Extractor;
use gateway::SpotifyGateway;
use progress::TerminalProgressBar;
use summary::PlaylistSummary;

struct RunDirectories {
    images: PathBuf,
    datasets: PathBuf,
    htmls: PathBuf,
}

fn ensure_run_directories(result_dir: &Path) -> Result<RunDirectories, String> {
    let run_dirs = RunDirectories {
        images: result_dir.join("images"),
        datasets: result_dir.join("datasets"),
        htmls: result_dir.join("htmls"),
    };
    for dir in [
        result_dir,
        run_dirs.images.as_path(),
        run_dirs.datasets.as_path(),
        run_dirs.htmls.as_path(),
    ] {
        fs::create_dir_all(dir)
            .map_err(|error| format!("failed to create {}: {error}", dir.display()))?;
    }
    Ok(run_dirs)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.init();

    let config_file = config_persistence::config_file_path();
    let config = config_persistence::load_or_create(&config_file)?;
    if config.playlist.playlist_id.is_empty() {
        return Err(format!(
            "configuration error: playlist.playlist_id is empty; set it in {}",
            config_file.display()
        )
        .into());
    }

    let run_dirs = ensure_run_directories(Path::new(&config.output.result_dir))?;

    let mut gateway = SpotifyGateway::connect()?;
    let extractor = Extractor::from_config(&config.extraction);
    let mut progress = TerminalProgressBar::default();

    info!("fetching playlist {}", config.playlist.playlist_id);
    let records =
        extractor.extract_records(&mut gateway, &config.playlist.playlist_id, &mut progress)?;

    let code_client = scannable::code_http_agent();
    let records = scannable::attach_code_references(
        &code_client,
        &records,
        &config.code_image,
        &run_dirs.images,
        &mut progress,
    )?;
    snapshot::write_raw_csv_file(&records, &run_dirs.datasets.join("playlist.csv"))?;

    let tracks = enrichment::enrich_records(&records, &config.overrides)?;
    snapshot::write_enriched_csv_file(
        &tracks,
        &run_dirs.datasets.join("playlist_processed.csv"),
    )?;

    info!("{}", PlaylistSummary::from_tracks(&tracks));

    let deck = CardDeck::new(
        &tracks,
        &config.deck.content_columns,
        &config.deck.template_fields,
        config.deck.batch_size,
        &config.deck.template_path,
    )?;
    info!(
        "built {} batches of {} cards",
        deck.n_batches(),
        config.deck.batch_size
    );
    deck.render_to_file(&run_dirs.htmls.join(&config.output.cards_file))?;

    Ok(())
}
