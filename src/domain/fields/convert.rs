//! 필드 종류별 BSON 강제 변환
//!
//! `Field::to_mongo`가 선언된 필드 종류에 따라 호출하는 함수 모음입니다.
//! 역방향(BSON → Rust 값) 변환을 위한 setter 헬퍼도 함께 제공합니다.

use std::str::FromStr;

use chrono::NaiveDate;
use mongodb::bson::{
    self, Binary, Bson, DateTime, Decimal128, Regex, Timestamp, oid::ObjectId,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::de::DeserializeOwned;

use crate::config::NamingConfig;
use crate::core::errors::{ErrorContext, OdmError, OdmResult};

use super::BinarySubtype;
use super::value::Value;

const DECIMAL128_EXPONENT_BIAS: i64 = 6176;
const DECIMAL128_COEFFICIENT_MASK: u128 = (1 << 113) - 1;

fn mismatch(target: &str, value: &Value) -> OdmError {
    OdmError::TypeError(format!(
        "cannot convert {} to {}",
        value.describe(),
        target
    ))
}

/// 소수부를 버리고 i64 범위 안에 들어오는지 확인합니다.
fn truncate(value: f64, target: &str) -> OdmResult<i64> {
    let truncated = value.trunc();
    if !truncated.is_finite() || truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(OdmError::TypeError(format!(
            "{} is out of range for {}",
            value, target
        )));
    }
    Ok(truncated as i64)
}

fn narrow(value: i64) -> OdmResult<i32> {
    i32::try_from(value).with_context(|| format!("{} is out of range for int32", value))
}

pub(crate) fn to_string(value: &Value) -> OdmResult<Bson> {
    let text = match value {
        Value::Bson(Bson::Null) => return Ok(Bson::Null),
        Value::Bson(Bson::String(text)) => text.clone(),
        Value::Bson(Bson::Int32(n)) => n.to_string(),
        Value::Bson(Bson::Int64(n)) => n.to_string(),
        Value::Bson(Bson::Double(n)) => n.to_string(),
        Value::Bson(Bson::Boolean(b)) => b.to_string(),
        Value::Bson(Bson::ObjectId(id)) => id.to_hex(),
        Value::Bson(other) => other.to_string(),
        Value::Date(date) => date.to_string(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Decimal(decimal) => decimal.to_string(),
        Value::Document(document) => format!("{:?}", document),
    };
    Ok(Bson::String(text))
}

pub(crate) fn to_int32(value: &Value) -> OdmResult<Bson> {
    match value {
        Value::Bson(raw @ (Bson::Null | Bson::Int32(_) | Bson::Int64(_))) => Ok(raw.clone()),
        Value::Bson(Bson::Double(n)) => Ok(Bson::Int32(narrow(truncate(*n, "int32")?)?)),
        Value::Bson(Bson::Boolean(b)) => Ok(Bson::Int32(i32::from(*b))),
        Value::Bson(Bson::String(text)) => text
            .trim()
            .parse::<i32>()
            .with_context(|| format!("cannot convert {:?} to int32", text))
            .map(Bson::Int32),
        Value::Bson(Bson::Decimal128(raw)) => decimal_to_int(&decimal_from_decimal128(raw)?)
            .and_then(narrow)
            .map(Bson::Int32),
        Value::Decimal(decimal) => decimal_to_int(decimal).and_then(narrow).map(Bson::Int32),
        other => Err(mismatch("int32", other)),
    }
}

pub(crate) fn to_int64(value: &Value) -> OdmResult<Bson> {
    match value {
        Value::Bson(raw @ (Bson::Null | Bson::Int64(_))) => Ok(raw.clone()),
        Value::Bson(Bson::Int32(n)) => Ok(Bson::Int64(i64::from(*n))),
        Value::Bson(Bson::Double(n)) => truncate(*n, "int64").map(Bson::Int64),
        Value::Bson(Bson::Boolean(b)) => Ok(Bson::Int64(i64::from(*b))),
        Value::Bson(Bson::String(text)) => text
            .trim()
            .parse::<i64>()
            .with_context(|| format!("cannot convert {:?} to int64", text))
            .map(Bson::Int64),
        Value::Bson(Bson::Decimal128(raw)) => {
            decimal_to_int(&decimal_from_decimal128(raw)?).map(Bson::Int64)
        }
        Value::Decimal(decimal) => decimal_to_int(decimal).map(Bson::Int64),
        other => Err(mismatch("int64", other)),
    }
}

fn decimal_to_int(decimal: &Decimal) -> OdmResult<i64> {
    decimal
        .trunc()
        .to_i64()
        .ok_or_else(|| OdmError::TypeError(format!("{} is out of range for int64", decimal)))
}

pub(crate) fn to_double(value: &Value) -> OdmResult<Bson> {
    match value {
        Value::Bson(raw @ (Bson::Null | Bson::Double(_))) => Ok(raw.clone()),
        Value::Bson(Bson::Int32(n)) => Ok(Bson::Double(f64::from(*n))),
        Value::Bson(Bson::Int64(n)) => Ok(Bson::Double(*n as f64)),
        Value::Bson(Bson::Boolean(b)) => Ok(Bson::Double(if *b { 1.0 } else { 0.0 })),
        Value::Bson(Bson::String(text)) => text
            .trim()
            .parse::<f64>()
            .with_context(|| format!("cannot convert {:?} to double", text))
            .map(Bson::Double),
        Value::Bson(Bson::Decimal128(raw)) => decimal_to_double(&decimal_from_decimal128(raw)?),
        Value::Decimal(decimal) => decimal_to_double(decimal),
        other => Err(mismatch("double", other)),
    }
}

fn decimal_to_double(decimal: &Decimal) -> OdmResult<Bson> {
    decimal
        .to_f64()
        .map(Bson::Double)
        .ok_or_else(|| OdmError::TypeError(format!("{} cannot be represented as double", decimal)))
}

/// 값의 참/거짓 판정 (null은 그대로 유지)
pub(crate) fn to_boolean(value: &Value) -> OdmResult<Bson> {
    let truthy = match value {
        Value::Bson(Bson::Null) => return Ok(Bson::Null),
        Value::Bson(Bson::Boolean(b)) => *b,
        Value::Bson(Bson::Int32(n)) => *n != 0,
        Value::Bson(Bson::Int64(n)) => *n != 0,
        Value::Bson(Bson::Double(n)) => *n != 0.0,
        Value::Bson(Bson::String(text)) => !text.is_empty(),
        Value::Bson(Bson::Array(items)) => !items.is_empty(),
        Value::Bson(Bson::Document(son)) => !son.is_empty(),
        Value::Bson(Bson::Binary(binary)) => !binary.bytes.is_empty(),
        Value::Bson(Bson::Decimal128(raw)) => {
            decimal_from_decimal128(raw).map_or(true, |decimal| !decimal.is_zero())
        }
        Value::Bson(_) => true,
        Value::Date(_) | Value::Document(_) => true,
        Value::Bytes(bytes) => !bytes.is_empty(),
        Value::Decimal(decimal) => !decimal.is_zero(),
    };
    Ok(Bson::Boolean(truthy))
}

/// 일자는 UTC 자정으로 승격합니다. null을 포함한 다른 값은 거부합니다.
pub(crate) fn to_datetime(value: &Value) -> OdmResult<Bson> {
    match value {
        Value::Bson(raw @ Bson::DateTime(_)) => Ok(raw.clone()),
        Value::Date(date) => Ok(Bson::DateTime(midnight(date)?)),
        _ => Err(OdmError::TypeError(
            "value must be of type date or datetime".to_string(),
        )),
    }
}

fn midnight(date: &NaiveDate) -> OdmResult<DateTime> {
    let start = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| OdmError::TypeError(format!("{} has no midnight", date)))?;
    Ok(DateTime::from_millis(start.and_utc().timestamp_millis()))
}

/// 타임스탬프가 아닌 값은 (0, 0)으로 기록합니다.
pub(crate) fn to_timestamp(value: &Value) -> OdmResult<Bson> {
    match value {
        Value::Bson(raw @ Bson::Timestamp(_)) => Ok(raw.clone()),
        Value::Bson(Bson::DateTime(instant)) => {
            let seconds = instant.timestamp_millis().div_euclid(1000);
            let time = u32::try_from(seconds)
                .with_context(|| format!("{} cannot be stored as a timestamp", instant))?;
            Ok(Bson::Timestamp(Timestamp { time, increment: 0 }))
        }
        _ => Ok(Bson::Timestamp(Timestamp { time: 0, increment: 0 })),
    }
}

pub(crate) fn to_binary(value: &Value, subtype: BinarySubtype) -> OdmResult<Bson> {
    match value {
        Value::Bson(raw @ Bson::Binary(_)) => Ok(raw.clone()),
        Value::Bytes(bytes) => Ok(Bson::Binary(Binary {
            subtype: subtype.into(),
            bytes: bytes.clone(),
        })),
        other => Err(mismatch("binary", other)),
    }
}

pub(crate) fn to_decimal128(value: &Value) -> OdmResult<Bson> {
    let decimal = match value {
        Value::Bson(raw @ Bson::Decimal128(_)) => return Ok(raw.clone()),
        Value::Decimal(decimal) => *decimal,
        Value::Bson(Bson::Int32(n)) => Decimal::from(*n),
        Value::Bson(Bson::Int64(n)) => Decimal::from(*n),
        Value::Bson(Bson::Double(n)) => Decimal::try_from(*n)
            .with_context(|| format!("cannot convert {} to decimal128", n))?,
        Value::Bson(Bson::String(text)) => Decimal::from_str(text.trim())
            .with_context(|| format!("cannot convert {:?} to decimal128", text))?,
        other => return Err(mismatch("decimal128", other)),
    };
    Ok(Bson::Decimal128(decimal128_from_decimal(&decimal)))
}

/// 문자열 패턴에 선언된 플래그를 붙입니다. 플래그는 정렬해 저장합니다.
pub(crate) fn to_regex(value: &Value, flags: &str) -> OdmResult<Bson> {
    match value {
        Value::Bson(raw @ Bson::RegularExpression(_)) => Ok(raw.clone()),
        Value::Bson(Bson::String(pattern)) => {
            let mut options: Vec<char> = flags.chars().collect();
            options.sort_unstable();
            options.dedup();
            Ok(Bson::RegularExpression(Regex {
                pattern: pattern.clone(),
                options: options.into_iter().collect(),
            }))
        }
        other => Err(mismatch("regex", other)),
    }
}

/// 순회 가능한 값을 배열로 변환합니다.
pub(crate) fn to_array(value: &Value) -> OdmResult<Bson> {
    match value {
        Value::Bson(raw @ (Bson::Null | Bson::Array(_))) => Ok(raw.clone()),
        Value::Bson(Bson::String(text)) => Ok(Bson::Array(
            text.chars().map(|c| Bson::String(c.to_string())).collect(),
        )),
        Value::Bson(Bson::Document(son)) => Ok(Bson::Array(
            son.keys().map(|key| Bson::String(key.clone())).collect(),
        )),
        Value::Bson(Bson::Binary(binary)) => Ok(byte_array(&binary.bytes)),
        Value::Bytes(bytes) => Ok(byte_array(bytes)),
        other => Err(OdmError::TypeError(format!(
            "{} is not iterable",
            other.describe()
        ))),
    }
}

fn byte_array(bytes: &[u8]) -> Bson {
    Bson::Array(bytes.iter().map(|b| Bson::Int32(i32::from(*b))).collect())
}

pub(crate) fn to_object_id(value: &Value) -> OdmResult<Bson> {
    match value {
        Value::Bson(raw @ (Bson::Null | Bson::ObjectId(_))) => Ok(raw.clone()),
        Value::Bson(Bson::String(hex)) => ObjectId::parse_str(hex)
            .with_context(|| format!("{:?} is not a valid object id", hex))
            .map(Bson::ObjectId),
        other => Err(mismatch("object id", other)),
    }
}

pub(crate) fn to_embedded(value: &Value, naming: &NamingConfig) -> OdmResult<Bson> {
    match value {
        Value::Document(document) => document.to_son(naming).map(Bson::Document),
        other => Err(OdmError::TypeError(format!(
            "embedded document field expects a document, got {}",
            other.describe()
        ))),
    }
}

/// `rust_decimal::Decimal` → BSON decimal128 (BID 인코딩)
///
/// 계수 96비트와 스케일 0..=28은 항상 decimal128 범위 안에 들어오므로
/// 손실 없이 변환됩니다.
pub fn decimal128_from_decimal(value: &Decimal) -> Decimal128 {
    let coefficient = value.mantissa().unsigned_abs();
    let exponent = (DECIMAL128_EXPONENT_BIAS - i64::from(value.scale())) as u128;

    let mut bits = (exponent << 113) | coefficient;
    if value.is_sign_negative() {
        bits |= 1 << 127;
    }
    Decimal128::from_bytes(bits.to_le_bytes())
}

/// BSON decimal128 → `rust_decimal::Decimal`
///
/// NaN, 무한대, 또는 `Decimal` 범위(계수 96비트, 스케일 28)를 벗어나는
/// 값은 `TypeError`를 반환합니다.
pub fn decimal_from_decimal128(value: &Decimal128) -> OdmResult<Decimal> {
    let bits = u128::from_le_bytes(value.bytes());
    let negative = bits >> 127 == 1;

    if (bits >> 125) & 0b11 == 0b11 {
        return Err(OdmError::TypeError(
            "decimal128 special value is not supported".to_string(),
        ));
    }

    let exponent = ((bits >> 113) & 0x3FFF) as i64 - DECIMAL128_EXPONENT_BIAS;
    let mut coefficient = bits & DECIMAL128_COEFFICIENT_MASK;
    let mut scale = 0u32;

    if exponent > 0 {
        for _ in 0..exponent {
            coefficient = coefficient.checked_mul(10).ok_or_else(|| {
                OdmError::TypeError("decimal128 value is too large".to_string())
            })?;
        }
    } else {
        scale = u32::try_from(-exponent).context("decimal128 exponent out of range")?;
    }

    let magnitude = i128::try_from(coefficient).context("decimal128 value is too large")?;
    let mantissa = if negative { -magnitude } else { magnitude };

    Decimal::try_from_i128_with_scale(mantissa, scale)
        .context("decimal128 value does not fit a decimal")
}

/// BSON 값을 임의의 역직렬화 가능한 타입으로 변환합니다.
pub fn from_wire<V: DeserializeOwned>(value: Bson) -> OdmResult<V> {
    Ok(bson::from_bson(value)?)
}

/// setter용 헬퍼: 역직렬화한 값을 슬롯에 대입합니다.
///
/// ```rust,ignore
/// fields.int32("age", |p: &Person| p.age, |p, v| assign(&mut p.age, v));
/// ```
pub fn assign<V: DeserializeOwned>(slot: &mut V, value: Bson) -> OdmResult<()> {
    *slot = from_wire(value)?;
    Ok(())
}

/// Binary 값 → 바이트열 (null은 `None`)
pub fn bytes_from_wire(value: Bson) -> OdmResult<Option<Vec<u8>>> {
    match value {
        Bson::Null => Ok(None),
        Bson::Binary(binary) => Ok(Some(binary.bytes)),
        other => Err(OdmError::TypeError(format!(
            "expected binary, got {:?}",
            other.element_type()
        ))),
    }
}

/// Decimal128 값 → `Decimal` (null은 `None`)
pub fn decimal_from_wire(value: Bson) -> OdmResult<Option<Decimal>> {
    match value {
        Bson::Null => Ok(None),
        Bson::Decimal128(raw) => decimal_from_decimal128(&raw).map(Some),
        Bson::String(text) => Decimal::from_str(text.trim())
            .with_context(|| format!("cannot convert {:?} to decimal", text))
            .map(Some),
        other => Err(OdmError::TypeError(format!(
            "expected decimal128, got {:?}",
            other.element_type()
        ))),
    }
}

/// DateTime 값 → UTC 기준 일자 (null은 `None`)
pub fn date_from_wire(value: Bson) -> OdmResult<Option<NaiveDate>> {
    match value {
        Bson::Null => Ok(None),
        Bson::DateTime(instant) => chrono::DateTime::from_timestamp_millis(
            instant.timestamp_millis(),
        )
        .map(|utc| Some(utc.date_naive()))
        .ok_or_else(|| OdmError::TypeError(format!("{} is out of range", instant))),
        other => Err(OdmError::TypeError(format!(
            "expected datetime, got {:?}",
            other.element_type()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::spec::BinarySubtype as WireSubtype;
    use pretty_assertions::assert_eq;

    fn bson(value: impl Into<Bson>) -> Value {
        Value::Bson(value.into())
    }

    #[test]
    fn test_decimal128_encoding_of_one() {
        let encoded = decimal128_from_decimal(&Decimal::ONE);
        let bits = u128::from_le_bytes(encoded.bytes());

        assert_eq!((bits >> 64) as u64, 0x3040_0000_0000_0000);
        assert_eq!(bits as u64, 1);
    }

    #[test]
    fn test_decimal128_decoding_restores_scale_and_sign() {
        for text in ["99.99", "-0.001", "1234567890.123456789", "0"] {
            let decimal = Decimal::from_str(text).unwrap();
            let decoded = decimal_from_decimal128(&decimal128_from_decimal(&decimal)).unwrap();

            assert_eq!(decoded.to_string(), decimal.to_string());
        }
    }

    #[test]
    fn test_decimal128_positive_exponent_is_expanded() {
        // 12 × 10^3
        let bits: u128 = ((6176 + 3) << 113) | 12;
        let decoded = decimal_from_decimal128(&Decimal128::from_bytes(bits.to_le_bytes())).unwrap();

        assert_eq!(decoded, Decimal::from(12_000));
    }

    #[test]
    fn test_decimal128_nan_is_rejected() {
        let bits: u128 = 0b11111 << 122;
        let result = decimal_from_decimal128(&Decimal128::from_bytes(bits.to_le_bytes()));

        assert!(matches!(result, Err(OdmError::TypeError(_))));
    }

    #[test]
    fn test_int32_keeps_int64_as_is() {
        assert_eq!(to_int32(&bson(5_000_000_000i64)).unwrap(), Bson::Int64(5_000_000_000));
        assert_eq!(to_int32(&bson(28.9)).unwrap(), Bson::Int32(28));
        assert_eq!(to_int32(&bson("42")).unwrap(), Bson::Int32(42));
        assert!(to_int32(&bson(1e12)).is_err());
        assert!(to_int32(&bson("forty")).is_err());
    }

    #[test]
    fn test_int64_widens() {
        assert_eq!(to_int64(&bson(7)).unwrap(), Bson::Int64(7));
        assert_eq!(to_int64(&bson(true)).unwrap(), Bson::Int64(1));
        assert_eq!(to_int64(&Value::null()).unwrap(), Bson::Null);
        assert_eq!(
            to_int64(&bson(-9_223_372_036_854_775_808.0)).unwrap(),
            Bson::Int64(i64::MIN)
        );
        assert!(matches!(
            to_int64(&bson(9_223_372_036_854_775_808.0)),
            Err(OdmError::TypeError(_))
        ));
    }

    #[test]
    fn test_double_from_numbers_and_text() {
        assert_eq!(to_double(&bson(2)).unwrap(), Bson::Double(2.0));
        assert_eq!(to_double(&bson(" 1.82 ")).unwrap(), Bson::Double(1.82));
        assert_eq!(
            to_double(&Value::Decimal(Decimal::from_str("0.5").unwrap())).unwrap(),
            Bson::Double(0.5)
        );
    }

    #[test]
    fn test_boolean_uses_truthiness() {
        assert_eq!(to_boolean(&bson(0)).unwrap(), Bson::Boolean(false));
        assert_eq!(to_boolean(&bson("no")).unwrap(), Bson::Boolean(true));
        assert_eq!(to_boolean(&bson("")).unwrap(), Bson::Boolean(false));
        assert_eq!(to_boolean(&Value::Bytes(vec![])).unwrap(), Bson::Boolean(false));
        assert_eq!(to_boolean(&Value::null()).unwrap(), Bson::Null);
    }

    #[test]
    fn test_string_formats_scalars() {
        assert_eq!(to_string(&bson(28)).unwrap(), Bson::String("28".to_string()));
        assert_eq!(to_string(&bson(false)).unwrap(), Bson::String("false".to_string()));
        assert_eq!(
            to_string(&Value::Date(NaiveDate::from_ymd_opt(2020, 7, 26).unwrap())).unwrap(),
            Bson::String("2020-07-26".to_string())
        );
    }

    #[test]
    fn test_datetime_promotes_date_to_midnight() {
        let date = NaiveDate::from_ymd_opt(2020, 7, 26).unwrap();

        assert_eq!(
            to_datetime(&Value::Date(date)).unwrap(),
            Bson::DateTime(DateTime::from_millis(1_595_721_600_000))
        );
    }

    #[test]
    fn test_datetime_rejects_other_values() {
        for value in [Value::null(), bson("2020-07-26"), bson(1)] {
            match to_datetime(&value) {
                Err(OdmError::TypeError(msg)) => {
                    assert_eq!(msg, "value must be of type date or datetime")
                }
                other => panic!("Expected TypeError, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_timestamp_from_datetime_and_fallback() {
        let instant = DateTime::from_millis(1_595_724_060_000);

        assert_eq!(
            to_timestamp(&bson(instant)).unwrap(),
            Bson::Timestamp(Timestamp { time: 1_595_724_060, increment: 0 })
        );
        assert_eq!(
            to_timestamp(&Value::null()).unwrap(),
            Bson::Timestamp(Timestamp { time: 0, increment: 0 })
        );
        assert!(to_timestamp(&bson(DateTime::from_millis(-1_000))).is_err());
    }

    #[test]
    fn test_binary_tags_declared_subtype() {
        let encoded = to_binary(&Value::Bytes(vec![1, 2, 3]), BinarySubtype::Md5).unwrap();

        assert_eq!(
            encoded,
            Bson::Binary(Binary { subtype: WireSubtype::Md5, bytes: vec![1, 2, 3] })
        );
        assert!(to_binary(&bson("abc"), BinarySubtype::DefaultBinary).is_err());
    }

    #[test]
    fn test_regex_sorts_flags() {
        let encoded = to_regex(&bson("ab*"), "xi").unwrap();

        assert_eq!(
            encoded,
            Bson::RegularExpression(Regex { pattern: "ab*".to_string(), options: "ix".to_string() })
        );
    }

    #[test]
    fn test_array_coerces_iterables() {
        assert_eq!(
            to_array(&bson("ab")).unwrap(),
            Bson::Array(vec![Bson::String("a".into()), Bson::String("b".into())])
        );
        assert_eq!(
            to_array(&Value::Bytes(vec![7])).unwrap(),
            Bson::Array(vec![Bson::Int32(7)])
        );
        assert!(to_array(&bson(3)).is_err());
    }

    #[test]
    fn test_object_id_parses_hex() {
        let id = ObjectId::parse_str("5f2234f0a36b8cfba16e3f67").unwrap();

        assert_eq!(to_object_id(&bson("5f2234f0a36b8cfba16e3f67")).unwrap(), Bson::ObjectId(id));
        assert_eq!(to_object_id(&Value::null()).unwrap(), Bson::Null);
        assert!(to_object_id(&bson("not-an-id")).is_err());
    }

    #[test]
    fn test_embedded_rejects_non_documents() {
        let naming = NamingConfig::default();

        assert!(matches!(to_embedded(&Value::null(), &naming), Err(OdmError::TypeError(_))));
        assert!(matches!(to_embedded(&bson(1), &naming), Err(OdmError::TypeError(_))));
    }

    #[test]
    fn test_wire_helpers() {
        assert_eq!(bytes_from_wire(Bson::Null).unwrap(), None);
        assert_eq!(
            decimal_from_wire(Bson::Decimal128(decimal128_from_decimal(&Decimal::ONE))).unwrap(),
            Some(Decimal::ONE)
        );
        assert_eq!(
            date_from_wire(Bson::DateTime(DateTime::from_millis(1_595_721_600_000))).unwrap(),
            NaiveDate::from_ymd_opt(2020, 7, 26)
        );

        let mut age = 0i32;
        assign(&mut age, Bson::Int32(29)).unwrap();
        assert_eq!(age, 29);
    }
}
