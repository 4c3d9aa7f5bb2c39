use clap::Args;
use serde::Serialize;

use crate::domain::classification::{ClassificationResult, classify, derive_title};
use crate::error::{AppError, AppResult};

#[derive(Args, Debug, Clone)]
pub struct ClassifyArgs {
    /// Free text to classify.
    #[arg(required = true)]
    pub text: Vec<String>,
}

#[derive(Serialize)]
struct ClassifyReport {
    title: String,
    #[serde(flatten)]
    classification: ClassificationResult,
}

pub fn run(args: ClassifyArgs) -> AppResult<()> {
    let text = args.text.join(" ");
    if text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }

    let report = ClassifyReport {
        title: derive_title(&text),
        classification: classify(&text),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
