pub mod completion_llm;
pub mod db;
pub mod image_gen;
pub mod image_search;
pub mod tts;

pub use completion_llm::OpenAiCompletionAdapter;
pub use db::DbAdapter;
pub use image_gen::OpenAiImageAdapter;
pub use image_search::CommonsImageSearchAdapter;
pub use tts::OpenAiTtsAdapter;
