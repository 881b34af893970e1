pub mod error;
pub mod gemini;
pub mod traits;
pub mod util;

pub use error::AiError;
pub use gemini::Gemini;
pub use traits::TextGenerator;
pub use util::{first_json_object, truncate_to_char_boundary};
