//! # Document Mapping
//!
//! Rust 구조체와 MongoDB 문서(SON) 사이의 매핑을 정의하는 trait입니다.
//!
//! ## 직렬화 규칙
//!
//! - 필드는 선언 순서대로 기록됩니다.
//! - 기본 키는 항상 `_id`로 기록되며, 값이 null이면 생략해 서버가 생성하게 합니다.
//! - 기본 키 값은 변환 없이 그대로 기록됩니다.
//! - 문서의 `skip_none()`이 true이거나 필드가 `skip_none`으로 선언되었으면
//!   null 값을 생략합니다.
//! - 두 필드가 같은 wire 이름으로 해석되면 `DuplicateField` 에러입니다.
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! #[derive(Debug, Clone, Default)]
//! struct Person {
//!     id: Option<ObjectId>,
//!     name: Option<String>,
//! }
//!
//! impl Document for Person {
//!     fn declare_fields(fields: &mut FieldSet<Self>) {
//!         fields.primary_key("id", |p| p.id, |p, v| assign(&mut p.id, v));
//!         fields.string("name", |p| p.name.clone(), |p, v| assign(&mut p.name, v));
//!     }
//! }
//!
//! register_document!(Person);
//!
//! let naming = NamingConfig::default();
//! let son = person.to_son(&naming)?;
//! let restored = Person::from_dict(son, &naming)?;
//! ```

use std::fmt;
use std::sync::Arc;

use mongodb::bson::{self, Bson};

use crate::config::NamingConfig;
use crate::core::errors::{OdmError, OdmResult};
use crate::core::registry::{SchemaRegistry, extract_clean_type_name};
use crate::domain::fields::{Field, FieldSet, Schema, Value};

/// 기본 키의 wire 이름
pub const ID_KEY: &str = "_id";

/// MongoDB에 저장되는 문서 타입
pub trait Document: Default + Clone + fmt::Debug + Send + Sync + 'static {
    /// 필드를 선언합니다. 타입당 한 번만 호출되어 스키마로 캐시됩니다.
    fn declare_fields(fields: &mut FieldSet<Self>);

    /// 컬렉션 이름 변환의 입력이 되는 문서 이름 (기본값: 타입 이름)
    fn document_name() -> &'static str {
        extract_clean_type_name(std::any::type_name::<Self>())
    }

    /// true면 모든 null 필드를 직렬화에서 제외합니다.
    fn skip_none(&self) -> bool {
        false
    }

    fn schema() -> Arc<Schema<Self>> {
        SchemaRegistry::schema::<Self>()
    }

    /// 이 타입이 저장되는 컬렉션 이름
    ///
    /// 처음 계산한 값이 캐시되며, 이후 다른 설정으로 호출해도 바뀌지 않습니다.
    fn collection_name(naming: &NamingConfig) -> String {
        SchemaRegistry::collection_name::<Self>(naming)
    }

    /// 선언 순서대로 모든 필드의 스냅샷을 반환합니다.
    fn fields(&self, naming: &NamingConfig) -> Vec<Field> {
        Self::schema()
            .fields()
            .iter()
            .map(|spec| spec.read(self, naming))
            .collect()
    }

    /// 접근자 이름으로 필드 스냅샷을 찾습니다.
    fn field(&self, name: &str, naming: &NamingConfig) -> Option<Field> {
        Self::schema().field(name).map(|spec| spec.read(self, naming))
    }

    /// 접근자 이름으로 원시 값을 기록합니다.
    fn set_field(&mut self, name: &str, value: Bson, naming: &NamingConfig) -> OdmResult<()> {
        let schema = Self::schema();
        let spec = schema.field(name).ok_or_else(|| {
            OdmError::UnknownField(format!("{} has no field '{}'", Self::document_name(), name))
        })?;
        spec.write(self, value, naming)
    }

    /// null이 아닌 기본 키 값
    fn primary_key_value(&self) -> Option<Bson> {
        let schema = Self::schema();
        match schema.primary_key()?.value_of(self) {
            Value::Bson(Bson::Null) => None,
            Value::Bson(raw) => Some(raw),
            _ => None,
        }
    }

    /// 기본 키에 값을 기록합니다. 기본 키가 없는 타입이면 false를 반환합니다.
    fn set_primary_key(&mut self, value: Bson, naming: &NamingConfig) -> OdmResult<bool> {
        let schema = Self::schema();
        match schema.primary_key() {
            Some(spec) => spec.write(self, value, naming).map(|_| true),
            None => Ok(false),
        }
    }

    /// 문서를 SON(`bson::Document`)으로 직렬화합니다.
    fn to_son(&self, naming: &NamingConfig) -> OdmResult<bson::Document> {
        let schema = Self::schema();
        schema.validate(naming)?;

        let skip_all_none = self.skip_none();
        let mut son = bson::Document::new();

        for spec in schema.fields() {
            let field = spec.read(self, naming);

            if field.is_primary_key() {
                match field.value() {
                    Value::Bson(Bson::Null) => {}
                    Value::Bson(raw) => {
                        son.insert(ID_KEY, raw.clone());
                    }
                    _ => {
                        son.insert(ID_KEY, field.to_mongo(naming)?);
                    }
                }
                continue;
            }

            if field.value().is_null() && (skip_all_none || field.skip_none()) {
                continue;
            }

            let value = field.to_mongo(naming)?;
            son.insert(field.field_name(), value);
        }

        Ok(son)
    }

    /// SON에서 문서를 복원합니다.
    ///
    /// 입력의 모든 키는 선언된 필드의 wire 이름이어야 하며, 입력에 없는 필드는
    /// `Default` 값을 유지합니다.
    fn from_dict(son: bson::Document, naming: &NamingConfig) -> OdmResult<Self> {
        let schema = Self::schema();
        let lookup = schema.wire_lookup(naming)?;
        let mut document = Self::default();

        for (key, value) in son {
            let spec = lookup.get(key.as_str()).ok_or_else(|| {
                OdmError::UnknownField(format!(
                    "{} has no field stored as '{}'",
                    Self::document_name(),
                    key
                ))
            })?;
            spec.write(&mut document, value, naming)?;
        }

        Ok(document)
    }

    /// 선언된 모든 필드의 값이 같은지 비교합니다.
    fn same_fields(&self, other: &Self) -> bool {
        Self::schema()
            .fields()
            .iter()
            .all(|spec| spec.value_of(self) == spec.value_of(other))
    }
}
