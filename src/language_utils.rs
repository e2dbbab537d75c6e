//! Language utilities for the dubbing options
//!
//! The dubbing API takes ISO 639-1 codes where one exists. Users may type
//! ISO 639-1, ISO 639-2/T or ISO 639-2/B codes; these helpers validate and
//! normalize them before they reach a request.

use anyhow::{Result, anyhow};
use isolang::Language;

/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// ISO 639-2/T equivalent of an ISO 639-2/B code that differs from it
fn bibliographic_to_terminology(code: &str) -> Option<&'static str> {
    let terminology = match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        _ => return None,
    };
    Some(terminology)
}

/// Resolve any accepted code form to a language
fn resolve(code: &str) -> Option<(Language, LanguageCodeType)> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code).map(|lang| (lang, LanguageCodeType::Part1)),
        3 => Language::from_639_3(&normalized_code)
            .map(|lang| (lang, LanguageCodeType::Part2T))
            .or_else(|| {
                bibliographic_to_terminology(&normalized_code)
                    .and_then(Language::from_639_3)
                    .map(|lang| (lang, LanguageCodeType::Part2B))
            }),
        _ => None,
    }
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    resolve(code)
        .map(|(_, code_type)| code_type)
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let (lang, _) = resolve(code).ok_or_else(|| anyhow!("Cannot normalize invalid language code: {}", code))?;

    Ok(match lang.to_639_1() {
        Some(part1) => part1.to_string(),
        None => lang.to_639_3().to_string(),
    })
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    let (lang, _) = resolve(code).ok_or_else(|| anyhow!("Invalid language code: {}", code))?;
    Ok(lang.to_name().to_string())
}
