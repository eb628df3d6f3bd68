//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the book tracker REST API to
//! `openapi.json`, or to the path given as the first argument. The server URL
//! follows `API_PREFIX`.

use api_lib::config::Config;
use api_lib::web::rest::api_doc;

/// Serializes the OpenAPI document and writes it to `path`.
fn write_openapi_document(
    doc: utoipa::openapi::OpenApi,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec_json = doc.to_pretty_json()?;
    std::fs::write(path, spec_json)?;
    println!("OpenAPI specification for the book tracker written to {}", path);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());
    let config = Config::from_env()?;
    write_openapi_document(api_doc(&config.api_prefix), &path)?;
    Ok(())
}
