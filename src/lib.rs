//! mongorm
//!
//! Rust 구조체와 MongoDB 문서 사이의 매핑 계층입니다.
//! 타입이 있는 필드 선언, 명명 규칙 기반 컬렉션/필드 이름 변환,
//! 그리고 문서 타입별 리포지토리를 제공합니다.
//!
//! # Features
//!
//! - **필드 선언**: 문서 타입마다 선언 순서가 유지되는 정적 스키마
//! - **BSON 변환**: 필드 종류별 강제 변환 규칙 (날짜 승격, decimal128, 정규식 플래그 등)
//! - **명명 규칙**: snake / camel / Pascal / unchanged, 설정값으로 명시적 전달
//! - **리포지토리**: find / insert / replace / update(`$set`) / delete, 지연 실행 커서
//! - **스키마 레지스트리**: `inventory` 기반 등록과 시작 시 wire 이름 충돌 검사
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Repositories   │ ← CRUD, QueryCursor
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │     Domain      │ ← Document, Field, Schema
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ Config / Utils  │ ← NamingConfig, 대소문자 변환
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │     MongoDB     │ ← 저장소
//! └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use mongorm::db::Database;
//! use mongorm::repositories::MongoRepository;
//!
//! let database = Database::new().await?;
//! let people = MongoRepository::<Person>::new(&database);
//!
//! let mut john = Person::default();
//! people.insert_one(&mut john).await?;
//! ```

pub mod config;
pub mod core;
pub mod db;
pub mod domain;
pub mod repositories;
pub mod utils;

#[doc(hidden)]
pub use inventory;
