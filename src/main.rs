//! mongorm 데모 애플리케이션
//!
//! 환경 설정을 읽어 MongoDB에 연결하고, 등록된 문서 스키마를 검증한 뒤
//! 임베디드 주소를 가진 사람 문서 하나를 저장, 조회, 삭제합니다.

use chrono::NaiveDate;
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};
use mongodb::bson::{Bson, oid::ObjectId};
use rust_decimal::Decimal;

use mongorm::core::errors::OdmResult;
use mongorm::core::registry::SchemaRegistry;
use mongorm::db::Database;
use mongorm::domain::{Document, FieldSet, assign, date_from_wire, decimal_from_wire};
use mongorm::register_document;
use mongorm::repositories::MongoRepository;

#[derive(Debug, Clone, Default)]
struct Address {
    street: Option<String>,
    city: Option<String>,
}

impl Document for Address {
    fn declare_fields(fields: &mut FieldSet<Self>) {
        fields.string("street", |a| a.street.clone(), |a, v| assign(&mut a.street, v));
        fields.string("city", |a| a.city.clone(), |a, v| assign(&mut a.city, v));
    }
}

#[derive(Debug, Clone, Default)]
struct Person {
    id: Option<ObjectId>,
    name: Option<String>,
    birthday: Option<NaiveDate>,
    hourly_rate: Option<Decimal>,
    address: Option<Address>,
    tags: Vec<String>,
}

impl Document for Person {
    fn declare_fields(fields: &mut FieldSet<Self>) {
        fields.primary_key("id", |p| p.id, |p, v| assign(&mut p.id, v));
        fields.string("name", |p| p.name.clone(), |p, v| assign(&mut p.name, v));
        fields.datetime("birthday", |p| p.birthday, |p, v| {
            p.birthday = date_from_wire(v)?;
            Ok(())
        });
        fields
            .decimal128("hourly_rate", |p| p.hourly_rate, |p, v| {
                p.hourly_rate = decimal_from_wire(v)?;
                Ok(())
            })
            .skip_none();
        fields.embedded("address", |p: &Self| p.address.clone(), |p, a| p.address = a);
        fields.array("tags", |p| p.tags.clone(), |p, v| assign(&mut p.tags, v));
    }
}

register_document!(Address);
register_document!(Person);

#[tokio::main]
async fn main() {
    load_env_file();
    init_logging();

    info!("🚀 mongorm 데모 시작중...");

    if let Err(e) = run().await {
        error!("❌ 데모 실패: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> OdmResult<()> {
    let database = Database::new().await?;

    let count = SchemaRegistry::validate_all(database.naming())?;
    info!("✅ {}개 문서 스키마 검증 완료", count);

    let people = MongoRepository::<Person>::new(&database);
    info!("📦 컬렉션: {}", people.collection_name());

    let mut john = Person {
        name: Some("John".to_string()),
        birthday: NaiveDate::from_ymd_opt(1992, 3, 14),
        hourly_rate: Some(Decimal::new(9999, 2)),
        address: Some(Address {
            street: Some("Main St. 1".to_string()),
            city: Some("Springfield".to_string()),
        }),
        tags: vec!["Friendly".to_string(), "Loyal".to_string()],
        ..Default::default()
    };

    people.insert_one(&mut john).await?;
    info!("저장됨: {:?}", john.id);

    if let Some(found) = people.find_one(&john).await? {
        let son = found.to_son(database.naming())?;
        let json = Bson::Document(son).into_relaxed_extjson();
        match serde_json::to_string_pretty(&json) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("JSON 변환 실패: {}", e),
        }
    }

    let deleted = people.delete_one(&john).await?;
    info!("🧹 삭제된 문서 수: {}", deleted.deleted_count);

    Ok(())
}

/// 환경별 설정 파일을 로드합니다
///
/// # Environment Variables
///
/// * `PROFILE=dev` - .env.dev 파일 로드 (기본값)
/// * `PROFILE=prod` - .env.prod 파일 로드
/// * 기타 - 기본 .env 파일 로드
fn load_env_file() {
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "dev".to_string());

    info!("Current profile: {}", profile);

    match profile.as_str() {
        "prod" => match dotenv::from_filename(".env.prod") {
            Ok(_) => info!(".env.prod 파일 로드 됨"),
            Err(e) => error!(".env.prod 파일 로드 실패: {}", e),
        },
        "dev" => match dotenv::from_filename(".env.dev") {
            Ok(_) => info!(".env.dev 파일 로드 됨"),
            Err(e) => error!(".env.dev 파일 로드 실패: {}", e),
        },
        _ => {
            dotenv().ok();
            info!("기본 .env 파일 로드");
        }
    }
}

/// `RUST_LOG`가 없으면 info 레벨로 시작합니다.
///
/// ```bash
/// RUST_LOG=mongorm=debug cargo run
/// ```
fn init_logging() {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
}
