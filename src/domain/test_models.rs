//! 테스트 전용 문서 모델

use chrono::{NaiveDate, TimeZone, Utc};
use mongodb::bson::{Bson, DateTime, Regex, Timestamp, oid::ObjectId};
use rust_decimal::Decimal;

use crate::core::errors::{OdmError, OdmResult};
use crate::domain::document::Document;
use crate::domain::fields::{
    BinarySubtype, CustomField, FieldSet, Value, assign, bytes_from_wire, date_from_wire,
    decimal_from_wire, from_wire,
};

/// 문자열 뒤에 접미사와 연도를 붙이는 변환기
#[derive(Debug)]
pub struct Greeting {
    pub suffix: String,
    pub year: i32,
}

impl CustomField for Greeting {
    fn to_mongo(&self, value: &Value) -> OdmResult<Bson> {
        match value {
            Value::Bson(Bson::String(text)) => {
                Ok(Bson::String(format!("{}{}{}", text, self.suffix, self.year)))
            }
            Value::Bson(Bson::Null) => Ok(Bson::Null),
            other => Err(OdmError::TypeError(format!(
                "greeting expects a string, got {:?}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestAddress {
    pub address: Option<String>,
}

impl Document for TestAddress {
    fn declare_fields(fields: &mut FieldSet<Self>) {
        fields.string("address", |a| a.address.clone(), |a, v| assign(&mut a.address, v));
    }
}

#[derive(Debug, Clone)]
pub struct TestPersonModel {
    pub id: Option<ObjectId>,
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub age: i32,
    pub insurance_number: i64,
    pub height: f64,
    pub address: TestAddress,
    pub address_missing: bool,
    pub attributes: Vec<String>,
    pub hourly_rate: Decimal,
    pub date_created: DateTime,
    pub birthday: Option<NaiveDate>,
    pub last_modified: Option<Timestamp>,
    pub last_viewed: DateTime,
    pub photo: Vec<u8>,
    pub account_enabled: bool,
    pub some_regex: String,
    pub custom_field: String,
    pub skip_nulls: bool,
}

impl Default for TestPersonModel {
    fn default() -> Self {
        Self {
            id: None,
            name: Some("John".to_string()),
            nickname: None,
            age: 28,
            insurance_number: 1_234_567_890_213_434,
            height: 1.82,
            address: TestAddress::default(),
            address_missing: false,
            attributes: vec![
                "Friendly".to_string(),
                "Loyal".to_string(),
                "Hard-working".to_string(),
            ],
            hourly_rate: Decimal::new(9999, 2),
            date_created: at(2020, 7, 26, 23, 49),
            birthday: NaiveDate::from_ymd_opt(1992, 3, 14),
            last_modified: None,
            last_viewed: at(2020, 7, 26, 0, 41),
            photo: b"photo-bytes".to_vec(),
            account_enabled: true,
            some_regex: "ab*".to_string(),
            custom_field: "Hello".to_string(),
            skip_nulls: false,
        }
    }
}

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime {
    let instant = Utc
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .map(|utc| utc.timestamp_millis())
        .unwrap_or_default();
    DateTime::from_millis(instant)
}

impl Document for TestPersonModel {
    fn declare_fields(fields: &mut FieldSet<Self>) {
        fields.primary_key("id", |p| p.id, |p, v| assign(&mut p.id, v));
        fields.string("name", |p| p.name.clone(), |p, v| assign(&mut p.name, v));
        fields
            .string("nickname", |p| p.nickname.clone(), |p, v| assign(&mut p.nickname, v))
            .named("nick")
            .skip_none();
        fields.int32("age", |p| p.age, |p, v| assign(&mut p.age, v));
        fields.int64("insurance_number", |p| p.insurance_number, |p, v| {
            assign(&mut p.insurance_number, v)
        });
        fields.double("height", |p| p.height, |p, v| assign(&mut p.height, v));
        fields.embedded(
            "address",
            |p: &Self| (!p.address_missing).then(|| p.address.clone()),
            |p, address| p.address = address.unwrap_or_default(),
        );
        fields.array("attributes", |p| p.attributes.clone(), |p, v| assign(&mut p.attributes, v));
        fields.decimal128("hourly_rate", |p| p.hourly_rate, |p, v| {
            p.hourly_rate = decimal_from_wire(v)?.unwrap_or_default();
            Ok(())
        });
        fields.datetime("date_created", |p| p.date_created, |p, v| assign(&mut p.date_created, v));
        fields.datetime("birthday", |p| p.birthday, |p, v| {
            p.birthday = date_from_wire(v)?;
            Ok(())
        });
        fields.timestamp("last_modified", |p| p.last_modified, |p, v| {
            p.last_modified = from_wire::<Option<Timestamp>>(v)?
                .filter(|ts| ts.time != 0 || ts.increment != 0);
            Ok(())
        });
        fields.timestamp("last_viewed", |p| p.last_viewed, |p, v| {
            p.last_viewed = match v {
                Bson::Timestamp(ts) => DateTime::from_millis(i64::from(ts.time) * 1000),
                other => from_wire(other)?,
            };
            Ok(())
        });
        fields.binary("photo", BinarySubtype::DefaultBinary, |p| p.photo.clone(), |p, v| {
            p.photo = bytes_from_wire(v)?.unwrap_or_default();
            Ok(())
        });
        fields.boolean("account_enabled", |p| p.account_enabled, |p, v| {
            assign(&mut p.account_enabled, v)
        });
        fields.regex("some_regex", "", |p| p.some_regex.clone(), |p, v| {
            p.some_regex = from_wire::<Regex>(v)?.pattern;
            Ok(())
        });
        fields.custom(
            "custom_field",
            Greeting { suffix: "World".to_string(), year: 2020 },
            |p| p.custom_field.clone(),
            |p, v| {
                let stored: String = from_wire(v)?;
                p.custom_field = stored
                    .strip_suffix("World2020")
                    .map(str::to_string)
                    .unwrap_or_else(|| stored.clone());
                Ok(())
            },
        );
    }

    fn skip_none(&self) -> bool {
        self.skip_nulls
    }
}

/// camelCase에서 같은 이름으로 해석되는 두 필드
#[derive(Debug, Clone, Default)]
pub struct Clashing {
    pub user_name: String,
    pub user_name_alt: String,
}

impl Document for Clashing {
    fn declare_fields(fields: &mut FieldSet<Self>) {
        fields.string("user_name", |c| c.user_name.clone(), |c, v| assign(&mut c.user_name, v));
        fields.string("user-name", |c| c.user_name_alt.clone(), |c, v| {
            assign(&mut c.user_name_alt, v)
        });
    }
}

#[derive(Debug, Clone, Default)]
pub struct TwoKeys {
    pub first: Option<ObjectId>,
    pub second: Option<ObjectId>,
}

impl Document for TwoKeys {
    fn declare_fields(fields: &mut FieldSet<Self>) {
        fields.primary_key("first", |k| k.first, |k, v| assign(&mut k.first, v));
        fields.primary_key("second", |k| k.second, |k, v| assign(&mut k.second, v));
    }
}

/// 구조체 필드 순서와 선언 순서가 다른 문서
#[derive(Debug, Clone, Default)]
pub struct Reordered {
    pub zeta: Option<String>,
    pub alpha: Option<i32>,
    pub middle: bool,
}

impl Document for Reordered {
    fn declare_fields(fields: &mut FieldSet<Self>) {
        fields.boolean("middle", |r| r.middle, |r, v| assign(&mut r.middle, v));
        fields.int32("alpha", |r| r.alpha, |r, v| assign(&mut r.alpha, v));
        fields.string("zeta", |r| r.zeta.clone(), |r, v| assign(&mut r.zeta, v));
    }
}

crate::register_document!(TestPersonModel);
crate::register_document!(TestAddress);
