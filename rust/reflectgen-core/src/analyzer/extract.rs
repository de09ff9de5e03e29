use super::metadata::ComponentReflectionInfo;
use crate::error::ExtractError;
use crate::lexer::tokenize;
use crate::parser::parse;
use std::path::Path;

/// Tokenize and parse one file's text. Any lexical or structural error makes
/// the whole file unusable, so nothing partial is returned.
pub fn extract_components(
    source: &str,
    filepath: &Path,
) -> Result<Vec<ComponentReflectionInfo>, ExtractError> {
    let tokens = tokenize(source)
        .into_result()
        .map_err(|errors| ExtractError::Lex {
            path: filepath.to_path_buf(),
            errors,
        })?;

    let mut components = Vec::new();
    parse(&tokens, filepath, &mut components)?;
    Ok(components)
}

/// Read `filepath` from disk and extract its components. Bytes that are not
/// UTF-8 (legacy encodings in comments or strings) are decoded lossily.
pub fn extract_file(filepath: &Path) -> Result<Vec<ComponentReflectionInfo>, ExtractError> {
    let bytes = std::fs::read(filepath).map_err(|source| ExtractError::Read {
        path: filepath.to_path_buf(),
        source,
    })?;
    extract_components(&String::from_utf8_lossy(&bytes), filepath)
}
