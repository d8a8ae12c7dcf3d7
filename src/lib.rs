//! Email intent triage: ONNX sequence classification with a markdown
//! report formatter and a small web form front end.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use mailroom::{Classifier, Triage};
//!
//! let classifier = Classifier::builder()
//!     .with_model_dir("models/email-intent")?
//!     .build()?;
//!
//! let labels = classifier.labels.clone();
//! let triage = Triage::new(Arc::new(classifier), labels);
//!
//! let outcome = triage.analyze(
//!     "Question about API documentation",
//!     "Where are the rate limits documented?",
//! )?;
//! println!("{}", outcome.report);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The classifier is thread-safe and can be shared across server handlers
//! using `Arc`; the formatter is a pure function with no shared state, so
//! concurrent triage calls need no locking.

pub mod classifier;
pub mod labels;
pub mod model_manager;
pub mod models;
pub mod report;
mod runtime;
pub mod server;
pub mod triage;

pub use classifier::{Classifier, ClassifierBuilder, ClassifierError, ClassifierInfo};
pub use labels::{emoji_for, recommendation_for, LabelSet};
pub use model_manager::{ModelError, ModelManager};
pub use models::{ModelCharacteristics, ModelSpec};
pub use report::{render_report, MISSING_INPUT_PROMPT};
pub use runtime::{create_session_builder, OptLevel, RuntimeConfig};
pub use triage::{IntentScorer, Prediction, Triage, TriageOutcome};

pub fn init_logger() {
    env_logger::init();
}
