use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Parses a JSON file into a given type `T`.
///
/// Errors are converted into `crate::error::Error` variants:
/// - `Error::IoError` if the file cannot be read.
/// - `Error::DeserializationError` if the JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: impl AsRef<Path>) -> Result<T> {
    let data = fs::read_to_string(file_path.as_ref()).map_err(Error::IoError)?;

    parse_json_str(&data)
}

/// Parses an in-memory JSON document into `T`.
pub fn parse_json_str<T: DeserializeOwned>(json: &str) -> Result<T> {
    let parsed_data: T = serde_json::from_str(json).map_err(Error::DeserializationError)?;

    Ok(parsed_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config_dto::OrchestratorConfigDto;

    #[test]
    fn test_missing_file_is_io_error() {
        let result = parse_json_file::<OrchestratorConfigDto>("/definitely/not/here.json");
        assert!(matches!(result, Err(Error::IoError(_))));
    }

    #[test]
    fn test_malformed_json_is_deserialization_error() {
        let result = parse_json_str::<OrchestratorConfigDto>("{ \"nodes\": [ }");
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }
}
