pub mod answer;

pub use answer::{AnswerClient, DEFAULT_ENDPOINT};
