//! End-to-end tests for fragcheck
//!
//! Runs the complete flow against the local directory store:
//! generate → split → select → upload → download → verify → merge → verify
//!
//! Run with: cargo test --test end_to_end

use fragcheck_cli::commands::{self, run::RunOptions};
use fragcheck_cli::{Backend, FragcheckConfig, LocalStore, Pipeline, PipelineConfig};
use fragcheck_core::WorkDir;
use tempfile::TempDir;

fn local_config(base: &TempDir, total_size: u64, fragment_size: u64) -> FragcheckConfig {
    let mut config = FragcheckConfig::default();
    config.store.backend = Backend::Local;
    config.run.work_dir = base.path().join("temp_data");
    config.run.total_size = total_size;
    config.run.fragment_size = fragment_size;
    config
}

#[tokio::test]
async fn test_run_command_local_backend() {
    let base = TempDir::new().unwrap();
    let config = local_config(&base, 1024, 256);

    let success = commands::run(&config, RunOptions { json: true })
        .await
        .unwrap();

    assert!(success);
    assert!(!config.run.work_dir.exists());
}

#[tokio::test]
async fn test_run_command_keeps_work_dir() {
    let base = TempDir::new().unwrap();
    let mut config = local_config(&base, 1000, 256);
    config.run.keep_work_dir = true;

    let success = commands::run(&config, RunOptions { json: false })
        .await
        .unwrap();

    assert!(success);
    let work_dir = &config.run.work_dir;
    assert!(work_dir.join("source_1000b.bin").exists());
    assert!(work_dir.join("merged_1000b.bin").exists());
    for i in 0..4 {
        assert!(work_dir.join(format!("part_{}.bin", i)).exists());
        assert!(work_dir.join(format!("downloaded_part_{}.bin", i)).exists());
    }

    let merged = std::fs::read(work_dir.join("merged_1000b.bin")).unwrap();
    let source = std::fs::read(work_dir.join("source_1000b.bin")).unwrap();
    assert_eq!(merged, source);
}

#[tokio::test]
async fn test_run_command_refuses_non_empty_work_dir() {
    let base = TempDir::new().unwrap();
    let config = local_config(&base, 1024, 256);
    std::fs::create_dir_all(&config.run.work_dir).unwrap();
    std::fs::write(config.run.work_dir.join("notes.txt"), b"keep").unwrap();

    let result = commands::run(&config, RunOptions { json: true }).await;

    assert!(result.is_err());
    assert!(config.run.work_dir.join("notes.txt").exists());
}

#[tokio::test]
async fn test_pipeline_with_separate_store_dir() {
    let base = TempDir::new().unwrap();
    let store = LocalStore::open(base.path().join("objects")).await.unwrap();

    let config = local_config(&base, 64 * 1024, 4096);
    let work = WorkDir::create(&config.run.work_dir).unwrap();

    let report = Pipeline::new(&store, &store, PipelineConfig::from(&config))
        .run(&work)
        .await
        .unwrap();

    assert_eq!(report.fragments.len(), 16);
    assert_eq!(report.verified_count(), 16);
    assert!(report.merged.as_ref().unwrap().verified);

    // Objects outlive the run directory
    drop(work);
    let stored = std::fs::read_dir(store.root()).unwrap().count();
    assert_eq!(stored, 16);
    assert!(!config.run.work_dir.exists());
}
