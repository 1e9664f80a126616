//! 명명 규칙 설정 모듈
//!
//! 컬렉션 이름과 필드 이름을 데이터베이스에 저장할 때 적용할 명명 규칙을
//! 관리합니다. 전역 가변 상태 대신 명시적인 설정값(`NamingConfig`)을 변환
//! 호출마다 전달합니다.
//!
//! # 환경 변수
//!
//! ```bash
//! export MONGORM_COLLECTION_NAMING="snake"   # snake, camel, pascal, unchanged
//! export MONGORM_FIELD_NAMING="camel"
//! export MONGORM_NAME_SEPARATOR="_"
//! export MONGORM_STRIP_SEPARATORS="_-"       # 각 문자가 하나의 구분자
//! ```

use std::env;
use std::fmt;
use std::str::FromStr;

use log::warn;

use crate::core::errors::OdmError;
use crate::utils::string_utils::{camel_case, pascal_case, snake_case};

/// 이름 변환 규칙
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamingConvention {
    /// `test_person_model`
    SnakeCase,
    /// `testPersonModel`
    CamelCase,
    /// `TestPersonModel`
    PascalCase,
    /// 입력을 그대로 사용
    Unchanged,
}

impl FromStr for NamingConvention {
    type Err = OdmError;

    /// 대소문자를 구분하지 않고 규칙 이름을 파싱합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "snake" | "snake_case" => Ok(NamingConvention::SnakeCase),
            "camel" | "camel_case" | "camelcase" => Ok(NamingConvention::CamelCase),
            "pascal" | "pascal_case" | "pascalcase" => Ok(NamingConvention::PascalCase),
            "unchanged" | "none" => Ok(NamingConvention::Unchanged),
            other => Err(OdmError::ConfigError(format!(
                "unknown naming convention: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NamingConvention::SnakeCase => "snake",
            NamingConvention::CamelCase => "camel",
            NamingConvention::PascalCase => "pascal",
            NamingConvention::Unchanged => "unchanged",
        };
        f.write_str(name)
    }
}

/// 명명 규칙 설정
///
/// 기본값은 컬렉션 이름 snake_case, 필드 이름 camelCase,
/// 이름 구분자 `_`, 제거 대상 구분자 `_`, `-` 입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConfig {
    /// 컬렉션 이름에 적용할 규칙
    pub collection_convention: NamingConvention,
    /// 필드 이름에 적용할 규칙
    pub field_convention: NamingConvention,
    /// snake_case 변환 시 단어 사이에 넣을 구분자
    pub name_separator: String,
    /// camel/Pascal 변환 시 단어 경계로 취급할 구분자 (첫 번째가 기준)
    pub strip_separators: Vec<String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            collection_convention: NamingConvention::SnakeCase,
            field_convention: NamingConvention::CamelCase,
            name_separator: "_".to_string(),
            strip_separators: vec!["_".to_string(), "-".to_string()],
        }
    }
}

impl NamingConfig {
    /// 환경 변수에서 명명 규칙을 읽어옵니다.
    ///
    /// 잘못된 값은 경고 로그를 남기고 기본값으로 대체합니다.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 임의의 key → value 조회 함수로 설정을 구성합니다.
    ///
    /// `from_env`의 실제 구현이며, 테스트에서는 프로세스 환경 대신
    /// 고정된 맵을 주입합니다.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let convention = |key: &str, fallback: NamingConvention| match lookup(key) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{} 값을 사용할 수 없습니다 ({}). 기본값 {} 사용", key, e, fallback);
                fallback
            }),
            None => fallback,
        };

        let collection_convention =
            convention("MONGORM_COLLECTION_NAMING", defaults.collection_convention);
        let field_convention = convention("MONGORM_FIELD_NAMING", defaults.field_convention);

        let name_separator = lookup("MONGORM_NAME_SEPARATOR")
            .filter(|sep| !sep.is_empty())
            .unwrap_or(defaults.name_separator);

        let strip_separators = lookup("MONGORM_STRIP_SEPARATORS")
            .map(|raw| raw.chars().map(String::from).collect::<Vec<_>>())
            .filter(|seps| !seps.is_empty())
            .unwrap_or(defaults.strip_separators);

        Self {
            collection_convention,
            field_convention,
            name_separator,
            strip_separators,
        }
    }

    /// 컬렉션 규칙을 바꾼 사본을 반환합니다.
    pub fn with_collection_convention(mut self, convention: NamingConvention) -> Self {
        self.collection_convention = convention;
        self
    }

    /// 필드 규칙을 바꾼 사본을 반환합니다.
    pub fn with_field_convention(mut self, convention: NamingConvention) -> Self {
        self.field_convention = convention;
        self
    }

    /// 이름 구분자를 바꾼 사본을 반환합니다.
    pub fn with_name_separator(mut self, separator: impl Into<String>) -> Self {
        self.name_separator = separator.into();
        self
    }

    /// 컬렉션 이름 규칙을 적용합니다.
    pub fn convert_collection_name(&self, name: &str) -> String {
        self.convert(name, self.collection_convention)
    }

    /// 필드 이름 규칙을 적용합니다.
    pub fn convert_field_name(&self, name: &str) -> String {
        self.convert(name, self.field_convention)
    }

    fn convert(&self, name: &str, convention: NamingConvention) -> String {
        match convention {
            NamingConvention::SnakeCase => snake_case(name, self),
            NamingConvention::CamelCase => camel_case(name, self),
            NamingConvention::PascalCase => pascal_case(name, self),
            NamingConvention::Unchanged => name.to_string(),
        }
    }
}
