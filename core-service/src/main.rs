//! Proctor Replay - feeds a recorded sample stream through the engine
//!
//! Usage: `proctor-replay <samples.jsonl> <exam_id> <subject_id> [incidents.csv]`
//!
//! Each input line is a host sample: `{"faceCount":0,"phoneDetected":false,"timestamp":1700000000000}`.
//! The finalized digest is submitted to the local proof vault and printed as JSON.

use std::fs::File;
use std::io::{BufRead, BufReader};

use anyhow::{bail, Context, Result};
use chrono::Utc;

use proctor_core::constants;
use proctor_core::logic::incident::{export_incidents, ExportFormat};
use proctor_core::logic::vault::{JsonlProofStore, ProofVault, VaultConfig, VaultError};
use proctor_core::{EngineConfig, FinalizeRequest, RawSample, SessionPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{} (replay)", constants::APP_NAME, constants::APP_VERSION);

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        bail!("usage: {} <samples.jsonl> <exam_id> <subject_id> [incidents.csv]", args[0]);
    }
    let (samples_path, exam_id, subject_id) = (&args[1], &args[2], &args[3]);
    let export_path = args.get(4);

    let samples = read_samples(samples_path)?;
    log::info!("Loaded {} samples from {}", samples.len(), samples_path);

    let config = EngineConfig::from_env();
    log::info!(
        "Thresholds: no-face={}, multi-face={}, looking-away={}, phone={}, absence={}, cooldown={}ms",
        config.no_face_threshold,
        config.multi_face_threshold,
        config.looking_away_threshold,
        config.phone_threshold,
        config.absence_threshold,
        config.incident_cooldown_ms
    );

    let started_at = samples.first().map(|s| s.timestamp).unwrap_or_else(Utc::now);
    let pipeline = SessionPipeline::spawn(config, started_at)?;
    let view = pipeline.view();

    for sample in samples {
        pipeline.push(sample)?;
    }

    let digest = pipeline
        .finalize(FinalizeRequest::new(exam_id, subject_id))
        .await
        .context("finalization failed; nothing was submitted")?;

    if let Some(path) = export_path {
        let mut file = File::create(path).with_context(|| format!("creating {}", path))?;
        let incidents = view.snapshot().incidents;
        let count = export_incidents(&incidents, &mut file, ExportFormat::Csv)?;
        log::info!("Exported {} incidents to {}", count, path);
    }

    let vault_config = VaultConfig::from_env();
    let store = JsonlProofStore::open(&vault_config.store_path)?;
    let vault = ProofVault::new(vault_config, store);
    log::info!("Vault: {}", vault.info());

    let creator = vault.config().creator.clone();
    match vault.create_exam(
        &creator,
        exam_id,
        constants::get_exam_duration_minutes(),
        constants::get_min_trust_score(),
        digest.started_at,
    ) {
        Ok(_) | Err(VaultError::ExamExists(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let receipt = vault
        .submit_proof(&digest, digest.ended_at)
        .context("proof submission rejected")?;
    log::info!("Submitted as {} (app {})", receipt.proof_key, receipt.app_id);

    println!("{}", serde_json::to_string_pretty(&digest)?);

    pipeline.shutdown().await;
    Ok(())
}

fn read_samples(path: &str) -> Result<Vec<RawSample>> {
    let file = File::open(path).with_context(|| format!("opening {}", path))?;
    let mut samples = Vec::new();

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RawSample>(&line) {
            Ok(sample) => samples.push(sample),
            Err(e) => log::warn!("Skipping line {}: {}", line_no + 1, e),
        }
    }

    Ok(samples)
}
