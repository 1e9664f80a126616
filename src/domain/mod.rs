//! # Domain Layer Module
//!
//! Rust 구조체를 MongoDB 문서로 매핑하는 핵심 모듈입니다.
//!
//! ## 아키텍처 개요
//!
//! ```text
//! Domain Layer (이 모듈)
//! ├── Document  - 문서 타입 trait (to_son / from_dict)
//! └── Fields    - 필드 래퍼, 종류별 BSON 변환, 필드 선언
//!      │
//!      ▼
//! Repositories (CRUD, QueryCursor)
//!      │
//!      ▼
//! MongoDB 드라이버
//! ```
//!
//! ## 모듈 구성
//!
//! ### [`document`] - 문서 매핑
//!
//! 타입별 필드 선언과 직렬화/역직렬화 규칙을 정의합니다.
//!
//! ### [`fields`] - 타입이 있는 필드
//!
//! | 선언 메서드 | BSON 타입 | 변환 규칙 |
//! |-------------|-----------|-----------|
//! | `string` | String | 값의 문자열 표현 |
//! | `int32` / `int64` | Int32 / Int64 | 정수 변환 (int32는 int64 값을 그대로 유지) |
//! | `double` | Double | 실수 변환 |
//! | `boolean` | Boolean | 참/거짓 판정 |
//! | `datetime` | Date | 일자는 UTC 자정으로 승격, 그 외 값은 에러 |
//! | `timestamp` | Timestamp | 시각은 초 단위, 그 외 값은 (0, 0) |
//! | `binary` | BinaryData | 선언된 subtype으로 태깅 |
//! | `decimal128` | Decimal128 | IEEE 754 decimal128 |
//! | `regex` | Regex | 선언된 플래그 부착 |
//! | `array` | Array | 순회 가능한 값을 배열로 |
//! | `object_id` / `primary_key` | ObjectId | 기본 키는 항상 `_id` |
//! | `embedded` | Object | 하위 문서 직렬화 |
//! | `custom` | 사용자 정의 | `CustomField` 구현 |
//!
//! ## 예제
//!
//! ```rust,ignore
//! use mongorm::domain::{Document, FieldSet, assign};
//!
//! #[derive(Debug, Clone, Default)]
//! pub struct Address {
//!     pub street: Option<String>,
//! }
//!
//! impl Document for Address {
//!     fn declare_fields(fields: &mut FieldSet<Self>) {
//!         fields.string("street", |a| a.street.clone(), |a, v| assign(&mut a.street, v));
//!     }
//! }
//! ```

pub mod document;
pub mod fields;

#[cfg(test)]
pub(crate) mod test_models;

pub use document::{Document, ID_KEY};
pub use fields::*;
