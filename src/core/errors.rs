//! # ODM Error Handling System
//!
//! 매핑 계층 전역에서 사용하는 에러 타입입니다.
//! `thiserror`로 `Error` trait을 구현하며, 드라이버 에러는 원본을 보존한 채
//! 그대로 전파합니다. 이 계층은 재시도나 복구 로직을 추가하지 않습니다.
//!
//! ## 에러 분류
//!
//! | OdmError | 발생 지점 | 사용 시나리오 |
//! |----------|-----------|---------------|
//! | `TypeError` | 필드 변환 | 값을 BSON 타입으로 변환할 수 없음 |
//! | `UnknownField` | `from_dict` | 선언되지 않은 키가 입력에 포함됨 |
//! | `DuplicateField` | 스키마 해석 | 두 필드가 같은 wire 이름으로 해석됨 |
//! | `MissingIdentifier` | 리포지토리 | `_id` 없는 문서로 식별자 필터 생성 |
//! | `InvalidOperation` | 커서 | 순회 시작 후 쿼리 수정 시도 |
//! | `IndexOutOfRange` | 커서 | 인덱스 접근 결과 없음 |
//! | `ConfigError` | 설정 | 잘못된 명명 규칙 값 |
//! | `DatabaseError` | 드라이버 | 네트워크, 중복 키, 검증 오류 |
//! | `DeserializationError` | setter | BSON → Rust 값 역직렬화 실패 |
//!
//! ## 사용 패턴
//!
//! ```rust,ignore
//! use mongorm::core::errors::{OdmError, OdmResult};
//!
//! fn parse_age(raw: &str) -> OdmResult<i32> {
//!     raw.parse::<i32>()
//!         .map_err(|e| OdmError::TypeError(format!("invalid age {}: {}", raw, e)))
//! }
//! ```

use thiserror::Error;

/// ODM 계층 전역 에러 타입
///
/// 변환/조회 단계의 에러는 메시지를 가진 변형으로, 드라이버와 BSON 라이브러리의
/// 에러는 `#[from]`으로 원본을 감싸 `source()` 체인을 유지합니다.
#[derive(Error, Debug)]
pub enum OdmError {
    /// 타입 불일치 에러
    ///
    /// 필드 값이 선언된 BSON 타입으로 강제 변환될 수 없을 때 발생합니다.
    ///
    /// # 발생 시나리오
    /// - 날짜 필드에 날짜가 아닌 값이 주어짐
    /// - 임베디드 문서 필드에 문서가 아닌 값이 주어짐
    /// - 숫자 필드에 파싱할 수 없는 문자열이 주어짐
    #[error("Type error: {0}")]
    TypeError(String),

    /// 선언되지 않은 필드 키 (엄격한 lookup 실패)
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// wire 이름 충돌
    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    /// 식별자가 필요한 연산에 `_id` 값이 없음
    #[error("Missing identifier: {0}")]
    MissingIdentifier(String),

    /// 현재 상태에서 허용되지 않는 연산
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// 커서 인덱스 접근 실패
    #[error("No document at cursor index {0}")]
    IndexOutOfRange(usize),

    /// 설정값 파싱 에러
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// MongoDB 드라이버 에러
    ///
    /// 네트워크 오류, 중복 키, 스키마 검증 실패 등 드라이버가 반환한 에러를
    /// 변경 없이 전달합니다.
    #[error("Database error: {0}")]
    DatabaseError(#[from] mongodb::error::Error),

    /// BSON 역직렬화 에러
    #[error("Deserialization error: {0}")]
    DeserializationError(#[from] mongodb::bson::de::Error),
}

/// 편의성을 위한 Result 타입 별칭
pub type OdmResult<T> = Result<T, OdmError>;

/// 외부 라이브러리 에러를 `OdmError::TypeError`로 변환하는 확장 trait
///
/// 값 변환 중 발생하는 파싱 에러(`ParseIntError`, `rust_decimal::Error` 등)에
/// 어떤 변환이 실패했는지 컨텍스트를 붙입니다.
///
/// ```rust,ignore
/// let age = "28".parse::<i32>().context("cannot convert to int32")?;
/// ```
pub trait ErrorContext<T> {
    /// 컨텍스트 정보와 함께 에러를 변환합니다.
    fn context(self, msg: &str) -> OdmResult<T>;

    /// 클로저를 사용하여 지연 평가된 컨텍스트를 제공합니다.
    fn with_context<F>(self, f: F) -> OdmResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, msg: &str) -> OdmResult<T> {
        self.map_err(|e| OdmError::TypeError(format!("{}: {}", msg, e)))
    }

    fn with_context<F>(self, f: F) -> OdmResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| OdmError::TypeError(format!("{}: {}", f(), e)))
    }
}
