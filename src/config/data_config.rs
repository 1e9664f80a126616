//! 데이터베이스 연결 설정 관리 모듈
//!
//! MongoDB 연결 URI, 데이터베이스 이름, 애플리케이션 이름을 관리합니다.

use std::env;

/// MongoDB 연결 설정
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// MongoDB 연결 URI
    pub uri: String,
    /// 사용할 데이터베이스 이름
    pub database_name: String,
    /// 드라이버 핸드셰이크에 전달할 애플리케이션 이름
    pub app_name: String,
}

impl DatabaseConfig {
    /// 환경 변수에서 연결 설정을 읽어옵니다.
    ///
    /// # Environment Variables
    ///
    /// - `MONGODB_URI`: 연결 URI (기본값: "mongodb://localhost:27017")
    /// - `DATABASE_NAME`: 데이터베이스 이름 (기본값: "mongorm_dev")
    /// - `MONGODB_APP_NAME`: 애플리케이션 이름 (기본값: "mongorm")
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 임의의 조회 함수로 설정을 구성합니다.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            uri: lookup("MONGODB_URI").unwrap_or_else(|| "mongodb://localhost:27017".to_string()),
            database_name: lookup("DATABASE_NAME").unwrap_or_else(|| "mongorm_dev".to_string()),
            app_name: lookup("MONGODB_APP_NAME").unwrap_or_else(|| "mongorm".to_string()),
        }
    }
}
