//! Ulasan preprocessing
//!
//! Cleaning and normalization of informal Indonesian review text, plus
//! loading and saving of review datasets.

pub mod data_loader;
pub mod text_cleaner;

pub use data_loader::{load_dataset_splits, load_reviews, save_processed_data, FileFormat, ReviewRecord};
pub use text_cleaner::{clean_text, normalize_text, preprocess_review, PreprocessOptions};
