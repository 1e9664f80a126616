//! # Typed Fields
//!
//! 문서 속성 하나를 감싸는 필드 래퍼와, 필드 종류별 BSON 강제 변환 규칙입니다.
//!
//! ## 구성
//!
//! - [`value`] - getter가 반환하는 원시 값 (`Value`)
//! - [`convert`] - 종류별 강제 변환과 setter 헬퍼
//! - [`declare`] - 문서 타입의 필드 선언 (`FieldSet`, `Schema`)
//!
//! ## BSON 타입 코드
//!
//! | 종류 | MongoType | 코드 |
//! |------|-----------|------|
//! | String | `String` | 2 |
//! | Int32 / Int64 | `Int32` / `Int64` | 16 / 18 |
//! | Double | `Double` | 1 |
//! | Boolean | `Boolean` | 8 |
//! | DateTime | `Date` | 9 |
//! | Timestamp | `Timestamp` | 17 |
//! | Binary | `BinaryData` | 5 |
//! | Decimal128 | `Decimal128` | 19 |
//! | Regex | `Regex` | 11 |
//! | Array | `Array` | 4 |
//! | ObjectId | `ObjectId` | 7 |
//! | EmbeddedDocument | `Object` | 3 |

pub mod convert;
pub mod declare;
pub mod value;

use std::fmt;
use std::sync::Arc;

use mongodb::bson::{Bson, spec::BinarySubtype as WireSubtype};

use crate::config::NamingConfig;
use crate::core::errors::OdmResult;

pub use convert::{
    assign, bytes_from_wire, date_from_wire, decimal128_from_decimal, decimal_from_decimal128,
    decimal_from_wire, from_wire,
};
pub use declare::{FieldOptions, FieldSet, FieldSpec, Schema};
pub use value::{EmbeddedDoc, Value};

/// BSON 타입 코드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MongoType {
    Double = 1,
    String = 2,
    Object = 3,
    Array = 4,
    BinaryData = 5,
    Undefined = 6,
    ObjectId = 7,
    Boolean = 8,
    Date = 9,
    Null = 10,
    Regex = 11,
    Int32 = 16,
    Timestamp = 17,
    Int64 = 18,
    Decimal128 = 19,
}

impl MongoType {
    /// BSON 사양의 숫자 코드
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Binary 필드의 subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BinarySubtype {
    #[default]
    DefaultBinary,
    Function,
    OldBinary,
    OldUuid,
    Uuid,
    Md5,
    /// 0x80 이상의 사용자 정의 subtype
    UserDefined(u8),
}

impl BinarySubtype {
    pub fn code(self) -> u8 {
        match self {
            BinarySubtype::DefaultBinary => 0,
            BinarySubtype::Function => 1,
            BinarySubtype::OldBinary => 2,
            BinarySubtype::OldUuid => 3,
            BinarySubtype::Uuid => 4,
            BinarySubtype::Md5 => 5,
            BinarySubtype::UserDefined(code) => code,
        }
    }
}

impl From<BinarySubtype> for WireSubtype {
    fn from(subtype: BinarySubtype) -> Self {
        match subtype {
            BinarySubtype::DefaultBinary => WireSubtype::Generic,
            BinarySubtype::Function => WireSubtype::Function,
            BinarySubtype::OldBinary => WireSubtype::BinaryOld,
            BinarySubtype::OldUuid => WireSubtype::UuidOld,
            BinarySubtype::Uuid => WireSubtype::Uuid,
            BinarySubtype::Md5 => WireSubtype::Md5,
            BinarySubtype::UserDefined(code) => WireSubtype::UserDefined(code),
        }
    }
}

/// 사용자 정의 필드 변환기
///
/// 기본 제공 종류로 표현할 수 없는 변환 규칙을 등록할 때 구현합니다.
///
/// ```rust,ignore
/// #[derive(Debug)]
/// struct Upper;
///
/// impl CustomField for Upper {
///     fn to_mongo(&self, value: &Value) -> OdmResult<Bson> {
///         match value {
///             Value::Bson(Bson::String(s)) => Ok(Bson::String(s.to_uppercase())),
///             _ => Ok(Bson::Null),
///         }
///     }
/// }
/// ```
pub trait CustomField: fmt::Debug + Send + Sync {
    fn to_mongo(&self, value: &Value) -> OdmResult<Bson>;

    fn mongo_type(&self) -> MongoType {
        MongoType::Undefined
    }
}

/// 필드 종류 (강제 변환 규칙 선택자)
#[derive(Debug, Clone)]
pub enum FieldKind {
    String,
    Int32,
    Int64,
    Double,
    Boolean,
    DateTime,
    Timestamp,
    Binary(BinarySubtype),
    Decimal128,
    /// 패턴에 붙일 정규식 플래그
    Regex(String),
    Array,
    ObjectId { primary_key: bool },
    EmbeddedDocument,
    Custom(Arc<dyn CustomField>),
}

impl FieldKind {
    pub fn mongo_type(&self) -> MongoType {
        match self {
            FieldKind::String => MongoType::String,
            FieldKind::Int32 => MongoType::Int32,
            FieldKind::Int64 => MongoType::Int64,
            FieldKind::Double => MongoType::Double,
            FieldKind::Boolean => MongoType::Boolean,
            FieldKind::DateTime => MongoType::Date,
            FieldKind::Timestamp => MongoType::Timestamp,
            FieldKind::Binary(_) => MongoType::BinaryData,
            FieldKind::Decimal128 => MongoType::Decimal128,
            FieldKind::Regex(_) => MongoType::Regex,
            FieldKind::Array => MongoType::Array,
            FieldKind::ObjectId { .. } => MongoType::ObjectId,
            FieldKind::EmbeddedDocument => MongoType::Object,
            FieldKind::Custom(converter) => converter.mongo_type(),
        }
    }

    pub fn is_primary_key(&self) -> bool {
        matches!(self, FieldKind::ObjectId { primary_key: true })
    }
}

/// 문서 속성 하나의 스냅샷
///
/// 값, wire 이름, 변환 규칙을 함께 들고 있습니다. 문서에서 꺼낸 시점의
/// 값을 보관하므로 이후 문서가 바뀌어도 영향을 받지 않습니다.
#[derive(Debug, Clone)]
pub struct Field {
    value: Value,
    field_name: String,
    kind: FieldKind,
    skip_none: bool,
    order: usize,
}

impl Field {
    pub fn new(value: impl Into<Value>, field_name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            value: value.into(),
            field_name: field_name.into(),
            kind,
            skip_none: false,
            order: 0,
        }
    }

    pub(crate) fn with_layout(mut self, skip_none: bool, order: usize) -> Self {
        self.skip_none = skip_none;
        self.order = order;
        self
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// wire 이름 (명명 규칙 적용 후)
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn mongo_type(&self) -> MongoType {
        self.kind.mongo_type()
    }

    /// null일 때 직렬화에서 제외하는지 여부
    pub fn skip_none(&self) -> bool {
        self.skip_none
    }

    /// 선언 순서
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn is_primary_key(&self) -> bool {
        self.kind.is_primary_key()
    }

    /// 선언된 종류의 규칙으로 값을 BSON으로 변환합니다.
    pub fn to_mongo(&self, naming: &NamingConfig) -> OdmResult<Bson> {
        match &self.kind {
            FieldKind::String => convert::to_string(&self.value),
            FieldKind::Int32 => convert::to_int32(&self.value),
            FieldKind::Int64 => convert::to_int64(&self.value),
            FieldKind::Double => convert::to_double(&self.value),
            FieldKind::Boolean => convert::to_boolean(&self.value),
            FieldKind::DateTime => convert::to_datetime(&self.value),
            FieldKind::Timestamp => convert::to_timestamp(&self.value),
            FieldKind::Binary(subtype) => convert::to_binary(&self.value, *subtype),
            FieldKind::Decimal128 => convert::to_decimal128(&self.value),
            FieldKind::Regex(flags) => convert::to_regex(&self.value, flags),
            FieldKind::Array => convert::to_array(&self.value),
            FieldKind::ObjectId { .. } => convert::to_object_id(&self.value),
            FieldKind::EmbeddedDocument => convert::to_embedded(&self.value, naming),
            FieldKind::Custom(converter) => converter.to_mongo(&self.value),
        }
    }
}

/// 값, wire 이름, BSON 타입이 모두 같으면 같은 필드입니다.
impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && self.field_name == other.field_name
            && self.mongo_type() == other.mongo_type()
    }
}
