//! 문서 타입의 필드 선언
//!
//! 각 문서 타입은 `Document::declare_fields`에서 [`FieldSet`] 빌더로 자신의
//! 필드를 선언합니다. 선언 결과인 [`Schema`]는 타입별로 한 번 만들어져
//! 레지스트리에 캐시됩니다.
//!
//! ```rust,ignore
//! impl Document for Person {
//!     fn declare_fields(fields: &mut FieldSet<Self>) {
//!         fields.primary_key("id", |p| p.id, |p, v| assign(&mut p.id, v));
//!         fields.string("name", |p| p.name.clone(), |p, v| assign(&mut p.name, v));
//!         fields.int64("insurance_number", |p| p.insurance_number, |p, v| {
//!             assign(&mut p.insurance_number, v)
//!         })
//!         .named("insuranceNo");
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use mongodb::bson::Bson;

use crate::config::NamingConfig;
use crate::core::errors::{OdmError, OdmResult};
use crate::domain::document::{Document, ID_KEY};

use super::value::{EmbeddedDoc, Value};
use super::{BinarySubtype, CustomField, Field, FieldKind};

type Getter<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, Bson, &NamingConfig) -> OdmResult<()> + Send + Sync>;

/// 선언된 필드 하나
pub struct FieldSpec<T> {
    name: &'static str,
    alias: Option<String>,
    kind: FieldKind,
    skip_none: bool,
    order: usize,
    getter: Getter<T>,
    setter: Setter<T>,
}

impl<T> FieldSpec<T> {
    /// 선언 시 사용한 접근자 이름
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn is_primary_key(&self) -> bool {
        self.kind.is_primary_key()
    }

    /// 저장 시 사용할 이름
    ///
    /// 기본 키는 항상 `_id`, 명시적 이름은 그대로, 나머지는 필드 명명 규칙을
    /// 적용한 접근자 이름입니다.
    pub fn wire_name(&self, naming: &NamingConfig) -> String {
        if self.is_primary_key() {
            return ID_KEY.to_string();
        }
        match &self.alias {
            Some(alias) => alias.clone(),
            None => naming.convert_field_name(self.name),
        }
    }

    /// getter가 반환하는 현재 값
    pub fn value_of(&self, document: &T) -> Value {
        (self.getter)(document)
    }

    /// 문서에서 필드 스냅샷을 꺼냅니다.
    pub fn read(&self, document: &T, naming: &NamingConfig) -> Field {
        Field::new(self.value_of(document), self.wire_name(naming), self.kind.clone())
            .with_layout(self.skip_none, self.order)
    }

    /// 저장된 값을 문서에 기록합니다.
    pub fn write(&self, document: &mut T, value: Bson, naming: &NamingConfig) -> OdmResult<()> {
        (self.setter)(document, value, naming)
    }
}

impl<T> fmt::Debug for FieldSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("kind", &self.kind)
            .field("skip_none", &self.skip_none)
            .field("order", &self.order)
            .finish()
    }
}

/// 문서 타입의 필드 목록 (선언 순서 유지)
#[derive(Debug)]
pub struct Schema<T> {
    fields: Vec<FieldSpec<T>>,
}

impl<T> Schema<T> {
    pub fn fields(&self) -> &[FieldSpec<T>] {
        &self.fields
    }

    /// 접근자 이름으로 필드를 찾습니다.
    pub fn field(&self, name: &str) -> Option<&FieldSpec<T>> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn primary_key(&self) -> Option<&FieldSpec<T>> {
        self.fields.iter().find(|spec| spec.is_primary_key())
    }

    /// wire 이름 → 필드 맵
    ///
    /// 두 필드가 같은 wire 이름으로 해석되면 `DuplicateField`를 반환합니다.
    pub fn wire_lookup(&self, naming: &NamingConfig) -> OdmResult<HashMap<String, &FieldSpec<T>>> {
        let mut lookup = HashMap::with_capacity(self.fields.len());
        for spec in &self.fields {
            let wire_name = spec.wire_name(naming);
            if let Some(previous) = lookup.insert(wire_name.clone(), spec) {
                return Err(OdmError::DuplicateField(format!(
                    "'{}' and '{}' both map to '{}'",
                    previous.name, spec.name, wire_name
                )));
            }
        }
        Ok(lookup)
    }

    /// 주어진 명명 규칙에서 wire 이름이 모두 고유한지 확인합니다.
    pub fn validate(&self, naming: &NamingConfig) -> OdmResult<()> {
        self.wire_lookup(naming).map(|_| ())
    }
}

/// 필드 선언 빌더
pub struct FieldSet<T> {
    fields: Vec<FieldSpec<T>>,
}

/// 방금 선언한 필드의 옵션 설정
pub struct FieldOptions<'a, T> {
    spec: &'a mut FieldSpec<T>,
}

impl<T> FieldOptions<'_, T> {
    /// 명명 규칙 대신 고정된 wire 이름을 사용합니다. 기본 키에는 적용되지 않습니다.
    pub fn named(self, name: impl Into<String>) -> Self {
        self.spec.alias = Some(name.into());
        self
    }

    /// 값이 null이면 직렬화에서 제외합니다.
    pub fn skip_none(self) -> Self {
        self.spec.skip_none = true;
        self
    }
}

macro_rules! scalar_fields {
    ($($(#[$meta:meta])* $method:ident => $kind:expr;)*) => {
        $(
            $(#[$meta])*
            pub fn $method<G, V, S>(&mut self, name: &'static str, get: G, set: S) -> FieldOptions<'_, T>
            where
                G: Fn(&T) -> V + Send + Sync + 'static,
                V: Into<Value>,
                S: Fn(&mut T, Bson) -> OdmResult<()> + Send + Sync + 'static,
            {
                self.declare(name, $kind, get, set)
            }
        )*
    };
}

impl<T: Document> FieldSet<T> {
    pub(crate) fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub(crate) fn into_schema(self) -> Schema<T> {
        Schema { fields: self.fields }
    }

    fn push(
        &mut self,
        name: &'static str,
        kind: FieldKind,
        getter: Getter<T>,
        setter: Setter<T>,
    ) -> FieldOptions<'_, T> {
        if kind.is_primary_key() && self.fields.iter().any(FieldSpec::is_primary_key) {
            panic!(
                "{} declares more than one primary key ('{}')",
                T::document_name(),
                name
            );
        }

        let order = self.fields.len();
        self.fields.push(FieldSpec {
            name,
            alias: None,
            kind,
            skip_none: false,
            order,
            getter,
            setter,
        });
        FieldOptions { spec: &mut self.fields[order] }
    }

    fn declare<G, V, S>(&mut self, name: &'static str, kind: FieldKind, get: G, set: S) -> FieldOptions<'_, T>
    where
        G: Fn(&T) -> V + Send + Sync + 'static,
        V: Into<Value>,
        S: Fn(&mut T, Bson) -> OdmResult<()> + Send + Sync + 'static,
    {
        self.push(
            name,
            kind,
            Box::new(move |document| get(document).into()),
            Box::new(move |document, value, _| set(document, value)),
        )
    }

    scalar_fields! {
        string => FieldKind::String;
        int32 => FieldKind::Int32;
        int64 => FieldKind::Int64;
        double => FieldKind::Double;
        boolean => FieldKind::Boolean;
        /// 일자 값은 UTC 자정으로 승격됩니다.
        datetime => FieldKind::DateTime;
        /// 타임스탬프가 아닌 값은 (0, 0)으로 저장됩니다.
        timestamp => FieldKind::Timestamp;
        decimal128 => FieldKind::Decimal128;
        array => FieldKind::Array;
        object_id => FieldKind::ObjectId { primary_key: false };
        /// 문서의 식별자 필드. wire 이름은 항상 `_id`이며 타입당 하나만 허용됩니다.
        primary_key => FieldKind::ObjectId { primary_key: true };
    }

    pub fn binary<G, V, S>(
        &mut self,
        name: &'static str,
        subtype: BinarySubtype,
        get: G,
        set: S,
    ) -> FieldOptions<'_, T>
    where
        G: Fn(&T) -> V + Send + Sync + 'static,
        V: Into<Value>,
        S: Fn(&mut T, Bson) -> OdmResult<()> + Send + Sync + 'static,
    {
        self.declare(name, FieldKind::Binary(subtype), get, set)
    }

    pub fn regex<G, V, S>(&mut self, name: &'static str, flags: &str, get: G, set: S) -> FieldOptions<'_, T>
    where
        G: Fn(&T) -> V + Send + Sync + 'static,
        V: Into<Value>,
        S: Fn(&mut T, Bson) -> OdmResult<()> + Send + Sync + 'static,
    {
        self.declare(name, FieldKind::Regex(flags.to_string()), get, set)
    }

    pub fn custom<C, G, V, S>(&mut self, name: &'static str, converter: C, get: G, set: S) -> FieldOptions<'_, T>
    where
        C: CustomField + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
        V: Into<Value>,
        S: Fn(&mut T, Bson) -> OdmResult<()> + Send + Sync + 'static,
    {
        self.declare(name, FieldKind::Custom(Arc::new(converter)), get, set)
    }

    /// 임베디드 문서 필드
    ///
    /// getter가 `None`을 반환하면 null로 취급되어 직렬화 시 `TypeError`가
    /// 발생합니다. 저장된 하위 문서는 `E::from_dict`로 복원해 setter에 넘깁니다.
    pub fn embedded<E, G, S>(&mut self, name: &'static str, get: G, set: S) -> FieldOptions<'_, T>
    where
        E: Document,
        G: Fn(&T) -> Option<E> + Send + Sync + 'static,
        S: Fn(&mut T, Option<E>) + Send + Sync + 'static,
    {
        self.push(
            name,
            FieldKind::EmbeddedDocument,
            Box::new(move |document| {
                get(document)
                    .map(|nested| Value::Document(EmbeddedDoc::new(nested)))
                    .unwrap_or_default()
            }),
            Box::new(move |document, value, naming| {
                let nested = match value {
                    Bson::Document(son) => Some(E::from_dict(son, naming)?),
                    Bson::Null => None,
                    other => {
                        return Err(OdmError::TypeError(format!(
                            "field '{}' expects an embedded {}, got {:?}",
                            name,
                            E::document_name(),
                            other.element_type()
                        )));
                    }
                };
                set(document, nested);
                Ok(())
            }),
        )
    }
}
