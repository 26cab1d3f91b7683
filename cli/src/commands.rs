//! Subcommand handlers.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use dawa_engine::dawa_providers::{GeminiClient, WasteClassifier};
use dawa_engine::dawa_types::{Capability, Locale, Role};
use dawa_engine::{
    CaptureError, DawaConfig, InspectorNarrative, NarrativeRefresh, ScanOutcome, ScanSession,
    ScanSettings, load_image, open_history,
};

use crate::args::{Cli, Command};
use crate::render;

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config = DawaConfig::load().context("loading ~/.dawa/config.toml")?;
    let config = config.unwrap_or_default();

    match cli.command {
        Command::Scan { image, locale } => scan(&config, &image, locale, cli.json).await,
        Command::History { limit } => history(&config, limit, cli.json),
        Command::Dashboard { role, narrative } => {
            dashboard(&config, role, narrative, cli.json).await
        }
        Command::Waste { image } => waste(&config, &image, cli.json).await,
        Command::Locale { city } => set_locale(city),
    }
}

async fn scan(
    config: &DawaConfig,
    image: &Path,
    locale: Option<Locale>,
    json: bool,
) -> Result<ExitCode> {
    let settings: ScanSettings = config.scan_settings()?;
    let locale = locale.unwrap_or(settings.default_locale);

    let image = match load_image(Some(image)).await {
        Ok(image) => image,
        Err(CaptureError::NoFile) => return Ok(ExitCode::SUCCESS),
        Err(e) => return Err(e.into()),
    };

    let client = GeminiClient::new(config.gemini_config()?)?;
    let store = open_history(Some(config))?;
    let session = ScanSession::new(Arc::new(client), Arc::clone(&store), settings);

    let abandon = session.abandon_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted; abandoning scan");
            abandon.cancel();
        }
    });

    eprintln!("Verifying packaging photographed in {locale}...");
    let outcome = session.capture(Some(image), locale).await;
    ctrl_c.abort();

    match outcome? {
        ScanOutcome::Ignored => Ok(ExitCode::SUCCESS),
        ScanOutcome::Completed {
            record,
            persistence,
        } => {
            if !persistence.is_persisted() {
                eprintln!("{}", render::NOT_SAVED_WARNING);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("{}", render::record_card(&record));
            }
            Ok(ExitCode::SUCCESS)
        }
        ScanOutcome::Failed(failure) => {
            tracing::warn!("Scan failed: {failure}");
            eprintln!("{}", failure.user_message());
            Ok(ExitCode::FAILURE)
        }
        ScanOutcome::Abandoned => {
            eprintln!("Scan abandoned.");
            Ok(ExitCode::from(130))
        }
    }
}

fn history(config: &DawaConfig, limit: Option<usize>, json: bool) -> Result<ExitCode> {
    let store = open_history(Some(config))?;
    let snapshot = store.all();
    let shown = &snapshot[..limit.unwrap_or(snapshot.len()).min(snapshot.len())];

    if json {
        println!("{}", serde_json::to_string_pretty(shown)?);
    } else {
        print!("{}", render::cabinet(shown));
    }
    Ok(ExitCode::SUCCESS)
}

async fn dashboard(
    config: &DawaConfig,
    role: Role,
    want_narrative: bool,
    json: bool,
) -> Result<ExitCode> {
    if want_narrative && !role.can(Capability::PolicyNarrative) {
        bail!("the {role} dashboard has no action plan; use --role inspector");
    }

    let store = open_history(Some(config))?;
    let snapshot = store.all();

    let mut narrative = InspectorNarrative::new();
    if want_narrative {
        let client = GeminiClient::new(config.gemini_config()?)?;
        eprintln!("Generating action plan...");
        if narrative.refresh(&client, &snapshot).await == NarrativeRefresh::Unavailable {
            eprintln!("The action plan could not be generated right now.");
        }
    }

    if json {
        let value = render::dashboard_json(role, &snapshot, want_narrative.then_some(&narrative));
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!(
            "{}",
            render::dashboard(role, &snapshot, want_narrative.then_some(&narrative))
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn waste(config: &DawaConfig, image: &Path, json: bool) -> Result<ExitCode> {
    let image = load_image(Some(image)).await?;
    let client = GeminiClient::new(config.gemini_config()?)?;

    eprintln!("Classifying...");
    match client.classify(&image).await {
        Ok(analysis) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                println!("{}", render::waste_card(&analysis));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::warn!("Waste classification failed: {e}");
            eprintln!("Classification failed. Try a clearer photo.");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn set_locale(city: Locale) -> Result<ExitCode> {
    DawaConfig::persist_default_locale(city).context("saving default city")?;
    tracing::info!(%city, "Default city updated");
    println!("Default city set to {city}.");
    Ok(ExitCode::SUCCESS)
}
