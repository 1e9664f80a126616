//! # Configuration Module
//!
//! 매핑 계층의 설정을 담당하는 모듈입니다.
//! 환경 변수 기반의 설정값을 타입이 있는 구조체로 읽어오며,
//! 모든 변환 함수는 전역 상태 대신 설정값을 인자로 받습니다.
//!
//! ## 모듈 구성
//!
//! - [`data_config`] - MongoDB 연결 설정
//! - [`naming_config`] - 컬렉션/필드 명명 규칙
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! use mongorm::config::{DatabaseConfig, NamingConfig, NamingConvention};
//!
//! let database = DatabaseConfig::from_env();
//! let naming = NamingConfig::from_env()
//!     .with_field_convention(NamingConvention::SnakeCase);
//!
//! assert_eq!(naming.convert_collection_name("TestPersonModel"), "test_person_model");
//! ```
//!
//! ## 환경 변수 설정 가이드
//!
//! ```bash
//! # 연결 설정
//! export MONGODB_URI="mongodb://localhost:27017"
//! export DATABASE_NAME="mongorm_dev"
//!
//! # 명명 규칙
//! export MONGORM_COLLECTION_NAMING="snake"
//! export MONGORM_FIELD_NAMING="camel"
//! ```

pub mod data_config;
pub mod naming_config;

pub use data_config::*;
pub use naming_config::*;
