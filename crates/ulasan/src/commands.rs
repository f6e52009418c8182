use anyhow::{Context, Result};
use chrono::Utc;
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use ulasan_common::{AppConfig, UlasanError};
use ulasan_eval::{evaluate_predictions, format_rouge_scores, Evaluation, HttpScorer};
use ulasan_llm::{
    create_aspect_based_prompt, create_multi_review_prompt, create_summarization_prompt,
    GenerateOptions, ModelType, OllamaClient, ReviewSummarizer,
};
use ulasan_preprocess::data_loader::text_field;
use ulasan_preprocess::{
    load_reviews, preprocess_review, save_processed_data, FileFormat, PreprocessOptions,
    ReviewRecord,
};

/// Text fields rewritten by `preprocess`
const PREPROCESSED_FIELDS: [&str; 2] = ["review", "summary"];

const RULE_WIDTH: usize = 80;

// ---------------------------------------------------------------------------
// preprocess
// ---------------------------------------------------------------------------

pub fn preprocess(
    input: &Path,
    output: &Path,
    lowercase: bool,
    remove_punctuation: bool,
    format: FileFormat,
) -> Result<()> {
    info!("Loading reviews from {}", input.display());
    let mut records = load_reviews(input, format)?;
    info!("Loaded {} reviews", records.len());

    let options = PreprocessOptions {
        lowercase,
        remove_punctuation,
        ..Default::default()
    };

    info!("Preprocessing reviews...");
    for record in &mut records {
        preprocess_record(record, &options);
    }

    info!("Saving processed reviews to {}", output.display());
    save_processed_data(&records, output, format)?;

    info!("Preprocessing complete! Processed {} reviews", records.len());
    Ok(())
}

/// Normalize review/summary text in place, keeping the raw value under `<field>_original`
///
/// A present field that is not a string (e.g. `null`) is kept as its original
/// and replaced by an empty string.
fn preprocess_record(record: &mut ReviewRecord, options: &PreprocessOptions) {
    for field in PREPROCESSED_FIELDS {
        let Some(original) = record.get(field).cloned() else {
            continue;
        };

        let processed = preprocess_review(original.as_str().unwrap_or_default(), options);
        record.insert(format!("{}_original", field), original);
        record.insert(field.to_string(), Value::String(processed));
    }
}

// ---------------------------------------------------------------------------
// generate
// ---------------------------------------------------------------------------

pub struct GenerateJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub review_field: String,
    pub model_type: ModelType,
    pub max_length: Option<usize>,
    pub batch: bool,
}

pub async fn generate(config: &AppConfig, job: GenerateJob) -> Result<()> {
    info!("Loading reviews from {}", job.input.display());
    let records = load_reviews(&job.input, FileFormat::Auto)?;
    info!("Loaded {} reviews", records.len());

    let (records, reviews) = select_reviews(records, &job.review_field);

    let client = OllamaClient::connect(&config.ollama_base_url, &config.llm_model).await?;
    info!("Model loaded successfully!");

    let options = GenerateOptions {
        max_new_tokens: config.max_new_tokens,
        temperature: config.temperature,
        batch_size: config.batch_size,
        ..Default::default()
    };
    let mut summarizer = ReviewSummarizer::new(client, job.model_type, options);
    if let Some(words) = job.max_length {
        summarizer = summarizer.with_max_length(words);
    }

    info!("Generating summaries...");
    let progress = progress_bar(reviews.len() as u64)?;
    let mut summaries = Vec::with_capacity(reviews.len());
    if job.batch {
        for chunk in reviews.chunks(config.batch_size) {
            summaries.extend(summarizer.summarize_each(chunk).await?);
            progress.inc(chunk.len() as u64);
        }
    } else {
        for review in &reviews {
            summaries.push(summarizer.summarize(std::slice::from_ref(review)).await?);
            progress.inc(1);
        }
    }
    progress.finish_with_message("done");

    let model = summarizer.client().model().to_string();
    let generated_at = Utc::now().to_rfc3339();
    let results: Vec<ReviewRecord> = records
        .into_iter()
        .zip(summaries)
        .map(|(record, summary)| annotate(record, summary, &model, job.model_type, &generated_at))
        .collect();

    info!("Saving results to {}", job.output.display());
    save_processed_data(&results, &job.output, FileFormat::Auto)?;

    info!("Successfully generated {} summaries!", results.len());
    Ok(())
}

/// Keep records with non-empty review text, paired with that text
fn select_reviews(records: Vec<ReviewRecord>, field: &str) -> (Vec<ReviewRecord>, Vec<String>) {
    let mut kept = Vec::with_capacity(records.len());
    let mut reviews = Vec::with_capacity(records.len());

    for record in records {
        let text = text_field(&record, field)
            .filter(|t| !t.is_empty())
            .map(str::to_owned);

        match text {
            Some(text) => {
                reviews.push(text);
                kept.push(record);
            }
            None => warn!("Empty review for item {}", record_id(&record)),
        }
    }

    (kept, reviews)
}

fn record_id(record: &ReviewRecord) -> String {
    match record.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(other) => other.to_string(),
        None => "unknown".to_string(),
    }
}

fn annotate(
    mut record: ReviewRecord,
    summary: String,
    model: &str,
    model_type: ModelType,
    generated_at: &str,
) -> ReviewRecord {
    record.insert("generated_summary".to_string(), Value::String(summary));
    record.insert("model".to_string(), Value::String(model.to_string()));
    record.insert(
        "model_type".to_string(),
        Value::String(model_type.as_str().to_string()),
    );
    record.insert(
        "generated_at".to_string(),
        Value::String(generated_at.to_string()),
    );
    record
}

fn progress_bar(len: u64) -> Result<ProgressBar> {
    let progress = ProgressBar::new(len);
    progress.set_style(
        ProgressStyle::with_template("{msg:>12} [{bar:40}] {pos}/{len} ({eta})")?
            .progress_chars("=> "),
    );
    progress.set_message("Processing");
    Ok(progress)
}

// ---------------------------------------------------------------------------
// evaluate
// ---------------------------------------------------------------------------

pub struct EvaluateJob {
    pub predictions: PathBuf,
    pub references: PathBuf,
    pub pred_field: String,
    pub ref_field: String,
    pub rouge_types: Vec<String>,
    pub aggregate: bool,
    pub output: Option<PathBuf>,
}

pub async fn evaluate(config: &AppConfig, job: EvaluateJob) -> Result<()> {
    info!("Loading predictions from {}", job.predictions.display());
    let predictions = extract_field(&load_reviews(&job.predictions, FileFormat::Auto)?, &job.pred_field)?;

    info!("Loading references from {}", job.references.display());
    let references = extract_field(&load_reviews(&job.references, FileFormat::Auto)?, &job.ref_field)?;

    info!("Evaluating {} predictions", predictions.len());
    let scorer = HttpScorer::connect(&config.scorer_url).await?;

    let requested: Vec<&str> = job.rouge_types.iter().map(String::as_str).collect();
    let rouge_types = (!requested.is_empty()).then_some(&requested[..]);

    let evaluation = evaluate_predictions(
        &scorer,
        &predictions[..],
        &references[..],
        rouge_types,
        job.aggregate,
    )
    .await?;

    info!("Evaluation Results:");
    let rule = "=".repeat(RULE_WIDTH);
    println!("\n{}", rule);
    println!("{}", render_evaluation(&evaluation));
    println!("{}\n", rule);

    if let Some(output) = &job.output {
        info!("Saving results to {}", output.display());
        write_json(&evaluation, output)?;
    }

    info!("Evaluation complete!");
    Ok(())
}

/// Pull one text field out of every record
fn extract_field(records: &[ReviewRecord], field: &str) -> ulasan_common::Result<Vec<String>> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            text_field(record, field).map(str::to_owned).ok_or_else(|| {
                UlasanError::invalid_input(format!("Record {} has no '{}' text field", i, field))
            })
        })
        .collect()
}

fn render_evaluation(evaluation: &Evaluation) -> String {
    match evaluation {
        Evaluation::Aggregated(scores) => format_rouge_scores(scores, 4),
        Evaluation::PerExample(all) => all
            .iter()
            .enumerate()
            .map(|(i, scores)| format!("Example {}:\n{}", i + 1, format_rouge_scores(scores, 4)))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

fn write_json(evaluation: &Evaluation, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(evaluation)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// prompt
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PromptVariant {
    /// Summarization prompt (single or numbered reviews)
    Summary,
    /// Multi-review prompt with optional focus aspects
    Multi,
    /// One summary per aspect
    Aspect,
}

pub fn build_prompt(
    variant: PromptVariant,
    reviews: &[String],
    aspects: &[String],
    model_type: &str,
    max_length: Option<usize>,
    custom_instruction: Option<&str>,
) -> ulasan_common::Result<String> {
    match variant {
        PromptVariant::Summary => {
            create_summarization_prompt(reviews, model_type, custom_instruction, max_length)
        }
        PromptVariant::Multi => create_multi_review_prompt(reviews, model_type, aspects),
        PromptVariant::Aspect => create_aspect_based_prompt(reviews, aspects, model_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ulasan_eval::{MetricScore, RougeScores};

    fn record(value: Value) -> ReviewRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_preprocess_record_keeps_originals() {
        let mut rec = record(json!({
            "id": 7,
            "review": "Barang  BAGUS bgt https://t.co/x",
            "summary": "Bagus&amp;murah",
            "rating": 5
        }));

        preprocess_record(&mut rec, &PreprocessOptions::default());

        assert_eq!(rec["review"], "barang bagus bgt");
        assert_eq!(rec["review_original"], "Barang  BAGUS bgt https://t.co/x");
        assert_eq!(rec["summary"], "bagus&murah");
        assert_eq!(rec["summary_original"], "Bagus&amp;murah");
        assert_eq!(rec["rating"], 5);
    }

    #[test]
    fn test_preprocess_record_skips_missing_fields() {
        let mut rec = record(json!({"review": "Oke"}));
        preprocess_record(&mut rec, &PreprocessOptions::default());

        assert!(rec.get("summary_original").is_none());
        assert_eq!(rec["review"], "oke");
    }

    #[test]
    fn test_preprocess_record_non_string_becomes_empty() {
        let mut rec = record(json!({"review": null, "summary": 4}));
        preprocess_record(&mut rec, &PreprocessOptions::default());

        assert_eq!(rec["review"], "");
        assert_eq!(rec["review_original"], Value::Null);
        assert_eq!(rec["summary"], "");
        assert_eq!(rec["summary_original"], 4);
    }

    #[test]
    fn test_preprocess_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.jsonl");
        let output = dir.path().join("out/clean.jsonl");
        std::fs::write(&input, "{\"review\": \"Mantap!!  Kirim cepat\"}\n\n{\"review\": \"Jelek.\"}\n").unwrap();

        preprocess(&input, &output, true, true, FileFormat::Auto).unwrap();

        let saved = load_reviews(&output, FileFormat::Auto).unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0]["review"], "mantap kirim cepat");
        assert_eq!(saved[1]["review"], "jelek");
    }

    #[test]
    fn test_select_reviews_drops_empty_text() {
        let records = vec![
            record(json!({"id": "a", "review": "Bagus"})),
            record(json!({"id": "b", "review": ""})),
            record(json!({"id": "c"})),
            record(json!({"id": "d", "review": "Lambat"})),
        ];

        let (kept, reviews) = select_reviews(records, "review");
        assert_eq!(reviews, vec!["Bagus", "Lambat"]);
        assert_eq!(kept[1]["id"], "d");
    }

    #[test]
    fn test_record_id() {
        assert_eq!(record_id(&record(json!({"id": "x1"}))), "x1");
        assert_eq!(record_id(&record(json!({"id": 3}))), "3");
        assert_eq!(record_id(&record(json!({}))), "unknown");
    }

    #[test]
    fn test_annotate_adds_generation_fields() {
        let rec = annotate(
            record(json!({"review": "Bagus"})),
            "Produk bagus.".to_string(),
            "mistral:instruct",
            ModelType::Mistral,
            "2024-01-01T00:00:00+00:00",
        );

        assert_eq!(rec["generated_summary"], "Produk bagus.");
        assert_eq!(rec["model"], "mistral:instruct");
        assert_eq!(rec["model_type"], "mistral");
        assert_eq!(rec["generated_at"], "2024-01-01T00:00:00+00:00");
        assert_eq!(rec["review"], "Bagus");
    }

    #[test]
    fn test_extract_field() {
        let records = vec![
            record(json!({"summary": "satu"})),
            record(json!({"summary": "dua"})),
        ];
        assert_eq!(extract_field(&records, "summary").unwrap(), vec!["satu", "dua"]);

        let err = extract_field(&records, "generated_summary").unwrap_err();
        assert!(matches!(err, UlasanError::InvalidInput(_)));
    }

    #[test]
    fn test_render_per_example() {
        let mut scores = RougeScores::new();
        scores.insert("rouge1".to_string(), MetricScore::new(1.0, 0.5, 0.6667));
        let rendered = render_evaluation(&Evaluation::PerExample(vec![scores.clone(), scores]));

        assert!(rendered.starts_with("Example 1:\nROUGE1:\n  precision: 1.0000"));
        assert!(rendered.contains("\n\nExample 2:\n"));
    }

    #[test]
    fn test_write_json_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results/rouge.json");
        let mut scores = RougeScores::new();
        scores.insert("rougeL".to_string(), MetricScore::new(0.5, 0.5, 0.5));

        write_json(&Evaluation::Aggregated(scores), &path).unwrap();

        let value: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["rougeL"]["recall"], 0.5);
    }

    #[test]
    fn test_build_prompt_variants() {
        let reviews = vec!["Bagus".to_string(), "Murah".to_string()];
        let aspects = vec!["harga".to_string()];

        let summary = build_prompt(PromptVariant::Summary, &reviews, &[], "generic", Some(20), None).unwrap();
        assert!(summary.contains("Ulasan-ulasan:\n1. Bagus\n2. Murah"));
        assert!(summary.contains("maksimal 20 kata"));

        let multi = build_prompt(PromptVariant::Multi, &reviews, &aspects, "llama", None, None).unwrap();
        assert!(multi.contains("Fokus pada aspek: harga."));

        let aspect = build_prompt(PromptVariant::Aspect, &reviews, &aspects, "indonesian", None, None).unwrap();
        assert!(aspect.contains("untuk setiap aspek: harga"));
    }

    #[test]
    fn test_build_prompt_errors() {
        let reviews = vec!["Bagus".to_string()];

        let err = build_prompt(PromptVariant::Summary, &reviews, &[], "gpt", None, None).unwrap_err();
        assert!(matches!(err, UlasanError::UnknownModelType { .. }));

        // Unknown model type wins even with no aspects
        let err = build_prompt(PromptVariant::Aspect, &reviews, &[], "gpt", None, None).unwrap_err();
        assert!(matches!(err, UlasanError::UnknownModelType { .. }));
    }

    #[test]
    fn test_build_prompt_aspect_accepts_empty_aspects() {
        let reviews = vec!["Bagus".to_string()];
        let prompt = build_prompt(PromptVariant::Aspect, &reviews, &[], "mistral", None, None).unwrap();
        assert!(prompt.contains("untuk setiap aspek: "));
        assert!(prompt.contains("Ulasan 1: Bagus"));
    }
}
