//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the `/api` routes, by default to `openapi.json`.
//! An alternative output path may be given as the first argument.

use api_lib::web::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());
    std::fs::write(&path, ApiDoc::openapi().to_pretty_json()?)?;
    println!("✅ OpenAPI specification generated at {}", path);
    Ok(())
}
