//! 데이터 액세스 계층을 담당하는 리포지토리 모듈
//!
//! 문서 타입별 컬렉션에 대한 CRUD 연산과, 지연 실행되는 쿼리 커서를 제공합니다.
//!
//! # Examples
//!
//! ```rust,ignore
//! use mongorm::repositories::MongoRepository;
//!
//! let people = MongoRepository::<Person>::new(&database);
//! let john = people.find_one(doc! { "name": "John" }).await?;
//! ```

pub mod mongo_repository;
pub mod query_cursor;

pub use mongo_repository::{MongoRepository, Selector};
pub use query_cursor::QueryCursor;
