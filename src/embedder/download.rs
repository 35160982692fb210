/// Embedding model auto-download from HuggingFace.
///
/// Fetches the ONNX export of all-MiniLM-L6-v2 plus its tokenizer files on
/// first start, so the binary is usable without a manual setup step.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Base URL for the HuggingFace model files.
const HF_BASE: &str = "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// Files required for the embedder, with their relative URL paths.
const MODEL_FILES: &[(&str, &str)] = &[
    ("model.onnx", "onnx/model.onnx"),
    ("tokenizer.json", "tokenizer.json"),
    ("config.json", "config.json"),
    ("special_tokens_map.json", "special_tokens_map.json"),
    ("tokenizer_config.json", "tokenizer_config.json"),
];

/// Check whether all required model files exist in `model_dir`.
#[must_use]
pub fn all_files_present(model_dir: &Path) -> bool {
    MODEL_FILES
        .iter()
        .all(|(name, _)| model_dir.join(name).exists())
}

/// Download any missing model files into `model_dir`.
///
/// Files that are already present are left untouched.
pub fn ensure_model(model_dir: &Path) -> Result<()> {
    fs::create_dir_all(model_dir)
        .with_context(|| format!("failed to create model directory: {}", model_dir.display()))?;

    if all_files_present(model_dir) {
        info!("All model files found in {}", model_dir.display());
        return Ok(());
    }

    eprintln!("[INFO] Downloading embedding model from HuggingFace...");
    eprintln!("[INFO] This is a one-time download (~90MB), please wait...");

    for &(filename, url_path) in MODEL_FILES {
        let dest = model_dir.join(filename);
        if dest.exists() {
            continue;
        }

        let url = format!("{HF_BASE}/{url_path}");
        info!("Downloading {filename} from {url}");
        download_file(&dest, &url).with_context(|| format!("failed to download {filename}"))?;
    }

    eprintln!("[INFO] Model download complete");
    Ok(())
}

/// Stream a single file to disk with a progress bar.
fn download_file(dest: &Path, url: &str) -> Result<()> {
    let mut resp =
        reqwest::blocking::get(url).with_context(|| format!("HTTP request failed: {url}"))?;

    if !resp.status().is_success() {
        anyhow::bail!("bad status: {} for {url}", resp.status());
    }

    let pb = match resp.content_length() {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {percent}% ({bytes}/{total_bytes})")
                    .expect("valid template")
                    .progress_chars("█▓░"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let file = fs::File::create(dest)
        .with_context(|| format!("failed to create file: {}", dest.display()))?;
    let mut writer = pb.wrap_write(file);

    resp.copy_to(&mut writer)
        .context("failed to stream response body")?;
    pb.finish_and_clear();

    Ok(())
}
