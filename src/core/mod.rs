//! # Core Module
//!
//! 매핑 계층 전반에서 공유하는 기반 기능입니다.
//!
//! ## 모듈 구성
//!
//! ### [`registry`] - 스키마 레지스트리
//! - **SchemaRegistry**: 타입별 스키마와 컬렉션 이름 캐시
//! - **자동 등록**: `inventory` 기반 `register_document!` 매크로
//! - **시작 시 검증**: 등록된 모든 문서의 wire 이름 충돌 검사
//!
//! ### [`errors`] - 통합 에러 처리
//! - **OdmError**: 매핑 계층 전역 에러 타입
//! - **ErrorContext**: 파싱 에러에 변환 컨텍스트 부여
//!
//! ## 애플리케이션 초기화
//!
//! ```rust,ignore
//! use mongorm::core::{OdmResult, SchemaRegistry};
//!
//! #[tokio::main]
//! async fn main() -> OdmResult<()> {
//!     let database = Database::new().await?;
//!     SchemaRegistry::validate_all(database.naming())?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod registry;

pub use errors::*;
pub use registry::*;
