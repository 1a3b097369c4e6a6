pub mod fallback;
pub mod llm_factory;
pub mod llm_provider;
pub mod openai_llm_provider;
pub mod pipeline;
pub mod prompt;
pub mod validator;

pub use fallback::*;
pub use llm_factory::*;
pub use llm_provider::*;
pub use openai_llm_provider::*;
pub use pipeline::*;
pub use prompt::{build_prompt, render_sample, SAMPLE_LIMIT};
pub use validator::{is_out_of_domain, validate_response, ParsedResponse, DEFAULT_SUMMARY_LINE};
