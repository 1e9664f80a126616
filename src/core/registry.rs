//! # Schema Registry
//!
//! 문서 타입별 스키마와 컬렉션 이름을 보관하는 전역 레지스트리입니다.
//!
//! ## 주요 구성 요소
//!
//! ### SchemaRegistry
//! - **지연 생성**: 타입의 스키마는 첫 사용 시점에 `declare_fields`로 한 번 만들어집니다.
//! - **Thread-safe**: `RwLock` + double-checked insert로 동시 접근에서도 타입당
//!   하나의 스키마만 유지합니다.
//! - **컬렉션 이름 캐시**: 처음 계산한 컬렉션 이름을 고정합니다.
//!
//! ### 자동 등록 (inventory)
//! - `register_document!` 매크로가 [`DocumentRegistration`]을 제출합니다.
//! - `SchemaRegistry::validate_all`이 등록된 모든 문서의 wire 이름 충돌을
//!   시작 시점에 한 번에 검사합니다.
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! register_document!(Person);
//!
//! let naming = NamingConfig::from_env();
//! let count = SchemaRegistry::validate_all(&naming)?;
//! info!("{} document types validated", count);
//!
//! let schema = SchemaRegistry::schema::<Person>();
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info};
use once_cell::sync::Lazy;

use crate::config::NamingConfig;
use crate::core::errors::OdmResult;
use crate::domain::document::Document;
use crate::domain::fields::{FieldSet, Schema};

/// inventory로 수집되는 문서 등록 정보
///
/// 직접 만들지 말고 `register_document!` 매크로를 사용합니다.
pub struct DocumentRegistration {
    /// 등록 시 사용한 타입 이름
    pub name: &'static str,
    /// 주어진 명명 규칙에서 스키마를 검증하는 함수
    pub validate: fn(&NamingConfig) -> OdmResult<()>,
}

inventory::collect!(DocumentRegistration);

/// 문서 타입을 레지스트리에 등록합니다.
///
/// ```rust,ignore
/// register_document!(TestPersonModel);
/// ```
#[macro_export]
macro_rules! register_document {
    ($ty:ty) => {
        $crate::inventory::submit! {
            $crate::core::registry::DocumentRegistration {
                name: stringify!($ty),
                validate: $crate::core::registry::SchemaRegistry::validate::<$ty>,
            }
        }
    };
}

/// 타입별 스키마 저장소
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    collection_names: RwLock<HashMap<TypeId, String>>,
}

static REGISTRY: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::new);

impl SchemaRegistry {
    fn new() -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
            collection_names: RwLock::new(HashMap::new()),
        }
    }

    /// 타입의 스키마를 반환합니다. 처음 호출되면 생성해 캐시합니다.
    ///
    /// # Panics
    ///
    /// `declare_fields`가 기본 키를 두 번 선언하면 패닉합니다.
    pub fn schema<T: Document>() -> Arc<Schema<T>> {
        let type_id = TypeId::of::<T>();

        // 1단계: 캐시 확인 (읽기 락)
        {
            let schemas = REGISTRY
                .schemas
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(schema) = schemas.get(&type_id) {
                if let Ok(schema) = schema.clone().downcast::<Schema<T>>() {
                    return schema;
                }
            }
        }

        // 2단계: 락 밖에서 생성 (declare_fields가 다른 타입의 스키마를 요청할 수 있음)
        let mut fields = FieldSet::new();
        T::declare_fields(&mut fields);
        let built = Arc::new(fields.into_schema());
        debug!(
            "schema built for {} ({} fields)",
            T::document_name(),
            built.fields().len()
        );

        // 3단계: 다른 스레드가 먼저 넣었으면 그 값을 사용
        let mut schemas = REGISTRY
            .schemas
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = schemas
            .entry(type_id)
            .or_insert_with(|| built.clone() as Arc<dyn Any + Send + Sync>)
            .clone();
        entry.downcast::<Schema<T>>().unwrap_or(built)
    }

    /// 타입의 컬렉션 이름
    ///
    /// 처음 계산된 이름이 고정되며, 이후 다른 명명 규칙으로 호출해도 같은
    /// 이름을 반환합니다.
    pub fn collection_name<T: Document>(naming: &NamingConfig) -> String {
        let type_id = TypeId::of::<T>();

        if let Some(name) = REGISTRY
            .collection_names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
        {
            return name.clone();
        }

        let computed = naming.convert_collection_name(T::document_name());
        REGISTRY
            .collection_names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(type_id)
            .or_insert(computed)
            .clone()
    }

    /// 타입 하나의 스키마를 검증합니다.
    pub fn validate<T: Document>(naming: &NamingConfig) -> OdmResult<()> {
        Self::schema::<T>().validate(naming)
    }

    /// 등록된 모든 문서 타입을 검증하고 개수를 반환합니다.
    ///
    /// 첫 번째 실패에서 멈추고 그 에러를 반환합니다.
    pub fn validate_all(naming: &NamingConfig) -> OdmResult<usize> {
        let mut count = 0;
        for registration in inventory::iter::<DocumentRegistration>() {
            (registration.validate)(naming)?;
            debug!("validated document {}", extract_clean_type_name(registration.name));
            count += 1;
        }
        info!("{} document types registered", count);
        Ok(count)
    }

    /// 등록된 문서 타입 이름 목록
    pub fn registered() -> Vec<&'static str> {
        inventory::iter::<DocumentRegistration>()
            .map(|registration| extract_clean_type_name(registration.name))
            .collect()
    }
}

/// 타입 이름에서 모듈 경로와 제네릭 인자를 제거합니다.
///
/// `std::any::type_name::<T>()`는 전체 경로를 포함하므로
/// (예: `app::models::Person<u8>`) 마지막 타입 이름만 남깁니다.
pub(crate) fn extract_clean_type_name(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name).trim();
    match base.rfind("::") {
        Some(pos) => &base[pos + 2..],
        None => base,
    }
}
