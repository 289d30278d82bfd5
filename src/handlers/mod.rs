mod flashcards;
mod generate;
mod health;
mod metrics;
mod summarize;
mod upload;

pub use flashcards::flashcards_handler;
pub use generate::generate_handler;
pub use health::{health_handler, hello_handler};
pub use metrics::metrics_handler;
pub use summarize::summarize_handler;
pub use upload::upload_handler;
