use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ulasan_common::{logger, AppConfig};
use ulasan_llm::ModelType;
use ulasan_preprocess::FileFormat;

mod commands;

use commands::PromptVariant;

/// Find the nearest .env file walking up from the current directory
fn find_dotenv() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        let candidate = current_dir.join(".env");
        if candidate.exists() {
            return Some(candidate);
        }

        if !current_dir.pop() {
            return None;
        }
    }
}

fn load_dotenv() {
    match find_dotenv() {
        Some(path) => {
            dotenv::from_path(&path).ok();
        }
        None => {
            dotenv::dotenv().ok();
        }
    }
}

/// Console plus file logging for the dataset commands
fn init_logging(config: &AppConfig) -> Result<()> {
    logger::setup_logging(&config.log_dir, &config.log_level)?;
    tracing::info!(
        "Logging to {}",
        config.get_log_path(logger::LOG_FILE_NAME).display()
    );
    Ok(())
}

#[derive(Parser)]
#[command(name = "ulasan")]
#[command(about = "Ulasan - Indonesian product review summarization toolkit", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean and normalize review/summary text in a dataset
    Preprocess {
        /// Input dataset (json, jsonl or csv)
        #[arg(long)]
        input: PathBuf,

        /// Output dataset
        #[arg(long)]
        output: PathBuf,

        /// Lowercase text during normalization
        #[arg(long)]
        lowercase: bool,

        /// Strip punctuation and symbols
        #[arg(long)]
        remove_punctuation: bool,

        /// Dataset format for input and output (auto, json, jsonl, csv)
        #[arg(long, default_value = "auto")]
        format: FileFormat,
    },

    /// Generate a summary for every review in a dataset
    Generate {
        /// Input dataset
        #[arg(long)]
        input: PathBuf,

        /// Output dataset with generated summaries
        #[arg(long)]
        output: PathBuf,

        /// Ollama model name
        #[arg(long)]
        model: Option<String>,

        /// Prompt template (mistral, llama, generic, indonesian)
        #[arg(long)]
        model_type: Option<String>,

        /// Field holding the review text
        #[arg(long, default_value = "review")]
        review_field: String,

        /// Maximum tokens per summary
        #[arg(long)]
        max_new_tokens: Option<u32>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,

        /// Prompts per generation batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Ask for summaries of at most this many words
        #[arg(long)]
        max_length: Option<usize>,

        /// Send prompts in concurrent batches
        #[arg(long)]
        batch: bool,
    },

    /// Score generated summaries against references with ROUGE
    Evaluate {
        /// File with predictions
        #[arg(long)]
        predictions: PathBuf,

        /// File with references
        #[arg(long)]
        references: PathBuf,

        /// Prediction text field
        #[arg(long, default_value = "summary")]
        pred_field: String,

        /// Reference text field
        #[arg(long, default_value = "summary")]
        ref_field: String,

        /// ROUGE variants, comma separated
        #[arg(long, value_delimiter = ',')]
        rouge_types: Vec<String>,

        /// Report every pair instead of the mean
        #[arg(long)]
        per_example: bool,

        /// Write results as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the prompt built for the given reviews
    Prompt {
        /// Prompt kind
        #[arg(value_enum)]
        variant: PromptVariant,

        /// Review texts
        #[arg(required = true)]
        reviews: Vec<String>,

        /// Aspects, comma separated
        #[arg(long, value_delimiter = ',')]
        aspects: Vec<String>,

        /// Prompt template (mistral, llama, generic, indonesian)
        #[arg(long)]
        model_type: Option<String>,

        /// Maximum summary length in words
        #[arg(long)]
        max_length: Option<usize>,

        /// Replace the default summarization instruction
        #[arg(long)]
        custom_instruction: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI overrides are applied as env vars before AppConfig::from_env reads them
    load_dotenv();
    if let Some(level) = &cli.log_level {
        std::env::set_var("LOG_LEVEL", level);
    }

    match cli.command {
        Commands::Preprocess {
            input,
            output,
            lowercase,
            remove_punctuation,
            format,
        } => {
            let config = AppConfig::from_env()?;
            init_logging(&config)?;

            commands::preprocess(&input, &output, lowercase, remove_punctuation, format)?;
        }
        Commands::Generate {
            input,
            output,
            model,
            model_type,
            review_field,
            max_new_tokens,
            temperature,
            batch_size,
            max_length,
            batch,
        } => {
            if let Some(model) = &model {
                std::env::set_var("LLM_MODEL", model);
            }
            if let Some(model_type) = &model_type {
                std::env::set_var("MODEL_TYPE", model_type);
            }
            if let Some(tokens) = max_new_tokens {
                std::env::set_var("MAX_NEW_TOKENS", tokens.to_string());
            }
            if let Some(temperature) = temperature {
                std::env::set_var("TEMPERATURE", temperature.to_string());
            }
            if let Some(size) = batch_size {
                std::env::set_var("BATCH_SIZE", size.to_string());
            }

            let config = AppConfig::from_env()?;
            init_logging(&config)?;

            let model_type: ModelType = config.model_type.parse()?;
            tracing::info!("Ulasan generation starting...");
            tracing::info!("  Ollama: {}", config.ollama_base_url);
            tracing::info!("  Model: {} ({})", config.llm_model, model_type);

            let job = commands::GenerateJob {
                input,
                output,
                review_field,
                model_type,
                max_length,
                batch,
            };
            commands::generate(&config, job).await?;
        }
        Commands::Evaluate {
            predictions,
            references,
            pred_field,
            ref_field,
            rouge_types,
            per_example,
            output,
        } => {
            let config = AppConfig::from_env()?;
            init_logging(&config)?;

            let job = commands::EvaluateJob {
                predictions,
                references,
                pred_field,
                ref_field,
                rouge_types,
                aggregate: !per_example,
                output,
            };
            commands::evaluate(&config, job).await?;
        }
        Commands::Prompt {
            variant,
            reviews,
            aspects,
            model_type,
            max_length,
            custom_instruction,
        } => {
            let config = AppConfig::from_env()?;
            logger::setup_console_logging(&config.log_level)?;

            let model_type = model_type.unwrap_or(config.model_type);
            let prompt = commands::build_prompt(
                variant,
                &reviews,
                &aspects,
                &model_type,
                max_length,
                custom_instruction.as_deref(),
            )?;
            println!("{}", prompt);
        }
    }

    Ok(())
}
