//! 필드의 원시 값 표현
//!
//! getter가 반환하는 값은 아직 BSON 타입으로 강제 변환되지 않은 상태입니다.
//! 대부분은 `Bson` 그대로이고, BSON에 직접 대응하지 않는 값(일자, 바이트열,
//! 십진수, 임베디드 문서)은 별도 변형으로 보관했다가 `to_mongo`에서 변환합니다.

use std::any::Any;
use std::fmt;

use chrono::{NaiveDate, Utc};
use mongodb::bson::{
    self, Binary, Bson, DateTime, Decimal128, Regex, Timestamp, oid::ObjectId,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::NamingConfig;
use crate::core::errors::OdmResult;
use crate::domain::document::Document;

/// 필드 getter가 반환하는 원시 값
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// BSON으로 표현 가능한 값 (null 포함)
    Bson(Bson),
    /// 시각 정보가 없는 일자. DateTime 필드에서 자정으로 승격됩니다.
    Date(NaiveDate),
    /// 원시 바이트열. Binary 필드에서 선언된 subtype으로 태깅됩니다.
    Bytes(Vec<u8>),
    /// 십진수. Decimal128 필드에서 IEEE 754 decimal128로 인코딩됩니다.
    Decimal(Decimal),
    /// 임베디드 문서
    Document(EmbeddedDoc),
}

impl Value {
    /// `Bson::Null` 값
    pub const fn null() -> Self {
        Value::Bson(Bson::Null)
    }

    /// null 여부
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Bson(Bson::Null))
    }

    /// BSON 값이면 참조를 반환합니다.
    pub fn as_bson(&self) -> Option<&Bson> {
        match self {
            Value::Bson(value) => Some(value),
            _ => None,
        }
    }

    /// 에러 메시지용 값 종류 설명
    pub(crate) fn describe(&self) -> String {
        match self {
            Value::Bson(value) => format!("{:?}", value.element_type()),
            Value::Date(_) => "Date".to_string(),
            Value::Bytes(_) => "Bytes".to_string(),
            Value::Decimal(_) => "Decimal".to_string(),
            Value::Document(doc) => doc.document_name().to_string(),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::null()
    }
}

macro_rules! value_from_bson {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Bson(Bson::from(value))
                }
            }
        )*
    };
}

value_from_bson!(
    String,
    Option<String>,
    &str,
    i32,
    Option<i32>,
    i64,
    Option<i64>,
    f64,
    Option<f64>,
    bool,
    Option<bool>,
    ObjectId,
    Option<ObjectId>,
    DateTime,
    Option<DateTime>,
    Timestamp,
    Option<Timestamp>,
    Binary,
    Option<Binary>,
    Regex,
    Option<Regex>,
    Decimal128,
    Option<Decimal128>,
    bson::Document,
    Option<bson::Document>,
    Vec<String>,
    Vec<i32>,
    Vec<i64>,
    Vec<f64>,
    Vec<Bson>,
);

impl From<Bson> for Value {
    fn from(value: Bson) -> Self {
        Value::Bson(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<Option<NaiveDate>> for Value {
    fn from(value: Option<NaiveDate>) -> Self {
        value.map(Value::Date).unwrap_or_default()
    }
}

impl From<chrono::DateTime<Utc>> for Value {
    fn from(value: chrono::DateTime<Utc>) -> Self {
        Value::Bson(Bson::DateTime(DateTime::from_millis(value.timestamp_millis())))
    }
}

impl From<Option<chrono::DateTime<Utc>>> for Value {
    fn from(value: Option<chrono::DateTime<Utc>>) -> Self {
        value.map(Value::from).unwrap_or_default()
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<Option<Vec<u8>>> for Value {
    fn from(value: Option<Vec<u8>>) -> Self {
        value.map(Value::Bytes).unwrap_or_default()
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Bytes(value.as_bytes().to_vec())
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<Option<Decimal>> for Value {
    fn from(value: Option<Decimal>) -> Self {
        value.map(Value::Decimal).unwrap_or_default()
    }
}

impl From<EmbeddedDoc> for Value {
    fn from(value: EmbeddedDoc) -> Self {
        Value::Document(value)
    }
}

/// 타입이 지워진 문서 (임베디드 필드 값 보관용)
trait ErasedDocument: fmt::Debug + Send + Sync {
    fn to_son(&self, naming: &NamingConfig) -> OdmResult<bson::Document>;
    fn as_any(&self) -> &dyn Any;
    fn clone_box(&self) -> Box<dyn ErasedDocument>;
    fn same_as(&self, other: &dyn ErasedDocument) -> bool;
    fn document_name(&self) -> &'static str;
}

impl<D: Document> ErasedDocument for D {
    fn to_son(&self, naming: &NamingConfig) -> OdmResult<bson::Document> {
        Document::to_son(self, naming)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn ErasedDocument> {
        Box::new(self.clone())
    }

    fn same_as(&self, other: &dyn ErasedDocument) -> bool {
        other
            .as_any()
            .downcast_ref::<D>()
            .is_some_and(|other| self.same_fields(other))
    }

    fn document_name(&self) -> &'static str {
        <D as Document>::document_name()
    }
}

/// 임베디드 문서 값
///
/// 부모 문서가 소유하는 하위 문서의 사본입니다. 구체 타입은 `downcast_ref`로
/// 다시 꺼낼 수 있습니다.
pub struct EmbeddedDoc(Box<dyn ErasedDocument>);

impl EmbeddedDoc {
    pub fn new<D: Document>(document: D) -> Self {
        Self(Box::new(document))
    }

    /// 하위 문서를 직렬화합니다.
    pub fn to_son(&self, naming: &NamingConfig) -> OdmResult<bson::Document> {
        self.0.to_son(naming)
    }

    pub fn downcast_ref<D: Document>(&self) -> Option<&D> {
        self.0.as_any().downcast_ref::<D>()
    }

    pub fn document_name(&self) -> &'static str {
        self.0.document_name()
    }
}

impl Clone for EmbeddedDoc {
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl fmt::Debug for EmbeddedDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl PartialEq for EmbeddedDoc {
    fn eq(&self, other: &Self) -> bool {
        self.0.same_as(other.0.as_ref())
    }
}
