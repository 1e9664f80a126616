//! 공통 유틸리티 함수 모듈
//!
//! # Modules
//!
//! - [`string_utils`] - snake/camel/Pascal 이름 변환

pub mod string_utils;
