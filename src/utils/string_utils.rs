//! # 문자열 유틸리티
//!
//! 컬렉션/필드 이름 변환에 사용하는 대소문자 변환 함수들입니다.
//! 모든 함수는 순수 함수이며, 구분자 설정은 [`NamingConfig`]에서 읽습니다.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::NamingConfig;

/// 대문자 연속 구간 (`SNAKE`, `T`, `AF`)
static UPPERCASE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new("([A-Z]+)").expect("valid uppercase-run pattern"));

/// 대문자로 시작하는 단어 (`Case`, `Field`)
static CAPITALIZED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new("([A-Z][a-z]+)").expect("valid capitalized-word pattern"));

/// snake_case 변환
///
/// 대문자 구간과 대문자로 시작하는 단어 앞에 공백을 넣은 뒤, 소문자로 바꾸고
/// 연속된 공백을 하나로 합쳐 `name_separator`로 연결합니다.
///
/// # 예제
/// ```rust,ignore
/// let config = NamingConfig::default();
///
/// assert_eq!(snake_case("SNAKE Case", &config), "snake_case");
/// assert_eq!(snake_case("TestCase", &config), "test_case");
/// assert_eq!(snake_case("SNAKE    Case with  SPACES", &config), "snake_case_with_spaces");
/// ```
pub fn snake_case(text: &str, config: &NamingConfig) -> String {
    let spaced = UPPERCASE_RUN.replace_all(text, " ${1}");
    let spaced = CAPITALIZED_WORD.replace_all(&spaced, " ${1}");

    spaced
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(&config.name_separator)
}

/// camelCase 변환
///
/// 구분자로 단어를 나누고, 첫 단어는 소문자로 두고 나머지 단어는
/// 첫 글자만 대문자로 바꿉니다.
///
/// # 예제
/// ```rust,ignore
/// assert_eq!(camel_case("TEXT_wiTH -separators", &config), "textWithSeparators");
/// assert_eq!(camel_case("TeXT", &config), "text");
/// ```
pub fn camel_case(text: &str, config: &NamingConfig) -> String {
    let words = split_words(text, config);
    let mut iter = words.iter();

    let mut result = iter.next().cloned().unwrap_or_default();
    for word in iter {
        result.push_str(&capitalize(word));
    }
    result
}

/// PascalCase 변환
///
/// # 예제
/// ```rust,ignore
/// assert_eq!(pascal_case("tEXT_wiTH -separators", &config), "TextWithSeparators");
/// assert_eq!(pascal_case("teXT", &config), "Text");
/// ```
pub fn pascal_case(text: &str, config: &NamingConfig) -> String {
    split_words(text, config)
        .iter()
        .map(|word| capitalize(word))
        .collect()
}

/// 보조 구분자를 기준 구분자로 치환한 뒤 단어 단위로 나눕니다.
///
/// 각 단어는 앞뒤 공백을 제거하고 소문자로 변환됩니다.
fn split_words(text: &str, config: &NamingConfig) -> Vec<String> {
    let Some((primary, rest)) = config.strip_separators.split_first() else {
        return vec![text.trim().to_lowercase()];
    };

    if primary.is_empty() {
        return vec![text.trim().to_lowercase()];
    }

    let mut normalized = text.to_string();
    for separator in rest.iter().filter(|sep| !sep.is_empty()) {
        normalized = normalized.replace(separator.as_str(), primary);
    }

    normalized
        .split(primary.as_str())
        .map(|word| word.trim().to_lowercase())
        .collect()
}

/// 첫 글자만 대문자로 바꿉니다. 빈 문자열은 그대로 반환합니다.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
