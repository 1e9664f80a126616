//! # 문서 리포지토리
//!
//! 문서 타입 `T`의 컬렉션에 대한 CRUD 연산을 제공합니다.
//! 각 메서드는 같은 이름의 드라이버 컬렉션 연산 하나에 대응하며, 입력은
//! `to_son`으로 직렬화하고 결과는 `from_dict`로 복원합니다.
//!
//! ## 특징
//!
//! - **타입 제약**: 문서 타입 검사는 `T: Document` 바운드로 컴파일 타임에 이루어집니다.
//! - **Selector**: 필터 문서, 문서 인스턴스(`_id`로 축약), `ObjectId`를 모두 받습니다.
//! - **식별자 반영**: `insert_one` / `insert_many`는 서버가 생성한 `_id`를 문서에 기록합니다.
//!
//! ## 사용 예제
//!
//! ```rust,ignore
//! let database = Database::new().await?;
//! let people = MongoRepository::<Person>::new(&database);
//!
//! let mut john = Person { name: Some("John".into()), ..Default::default() };
//! people.insert_one(&mut john).await?;
//!
//! let found = people.find_one(&john).await?;
//! people.update_one(&john, doc! { "age": 29 }, false).await?;
//! people.delete_one(&john).await?;
//! ```

use std::collections::HashMap;
use std::marker::PhantomData;

use log::debug;
use mongodb::Collection;
use mongodb::bson::{self, Bson, doc, oid::ObjectId};
use mongodb::options::{FindOneOptions, FindOptions, InsertManyOptions, ReplaceOptions, UpdateOptions};
use mongodb::results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult};

use crate::config::NamingConfig;
use crate::core::errors::{OdmError, OdmResult};
use crate::db::Database;
use crate::domain::document::{Document, ID_KEY};

use super::query_cursor::QueryCursor;

/// 쿼리 대상 지정
///
/// ```rust,ignore
/// people.find_one(doc! { "name": "John" }).await?;   // 필터 그대로
/// people.find_one(&john).await?;                     // { "_id": john.id }
/// people.find_one(id).await?;                        // { "_id": id }
/// ```
#[derive(Debug)]
pub enum Selector<'a, T> {
    Filter(bson::Document),
    Instance(&'a T),
}

impl<T> From<bson::Document> for Selector<'_, T> {
    fn from(filter: bson::Document) -> Self {
        Selector::Filter(filter)
    }
}

impl<'a, T: Document> From<&'a T> for Selector<'a, T> {
    fn from(document: &'a T) -> Self {
        Selector::Instance(document)
    }
}

impl<T> From<ObjectId> for Selector<'_, T> {
    fn from(id: ObjectId) -> Self {
        Selector::Filter(doc! { ID_KEY: id })
    }
}

impl<T: Document> Selector<'_, T> {
    /// 드라이버에 넘길 필터 문서
    ///
    /// 문서 인스턴스는 기본 키 값으로 축약되며, 값이 없으면 `MissingIdentifier`입니다.
    pub fn into_filter(self) -> OdmResult<bson::Document> {
        match self {
            Selector::Filter(filter) => Ok(filter),
            Selector::Instance(document) => match document.primary_key_value() {
                Some(id) => Ok(doc! { ID_KEY: id }),
                None => Err(OdmError::MissingIdentifier(format!(
                    "{} has no primary key value",
                    T::document_name()
                ))),
            },
        }
    }
}

/// 문서 타입 `T`의 컬렉션 리포지토리
pub struct MongoRepository<T: Document> {
    database: mongodb::Database,
    collection: Collection<bson::Document>,
    naming: NamingConfig,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> Clone for MongoRepository<T> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            collection: self.collection.clone(),
            naming: self.naming.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> MongoRepository<T> {
    /// 연결의 명명 규칙으로 리포지토리를 만듭니다.
    pub fn new(database: &Database) -> Self {
        Self::with_naming(database.get_database(), database.naming().clone())
    }

    /// 데이터베이스 핸들과 명명 규칙을 직접 지정합니다.
    pub fn with_naming(database: mongodb::Database, naming: NamingConfig) -> Self {
        let collection_name = T::collection_name(&naming);
        let collection = database.collection::<bson::Document>(&collection_name);
        Self {
            database,
            collection,
            naming,
            _marker: PhantomData,
        }
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    pub fn collection(&self) -> &Collection<bson::Document> {
        &self.collection
    }

    pub fn naming(&self) -> &NamingConfig {
        &self.naming
    }

    /// 조건에 맞는 첫 문서. 없으면 `Ok(None)`입니다.
    pub async fn find_one<'a>(&self, selector: impl Into<Selector<'a, T>>) -> OdmResult<Option<T>> {
        self.find_one_with_options(selector, FindOneOptions::default()).await
    }

    pub async fn find_one_with_options<'a>(
        &self,
        selector: impl Into<Selector<'a, T>>,
        options: FindOneOptions,
    ) -> OdmResult<Option<T>> {
        let filter = selector.into().into_filter()?;
        debug!("find_one on {}: {:?}", self.collection_name(), filter);

        let found = self.collection.find_one(filter).with_options(options).await?;
        restore(found, &self.naming)
    }

    /// 문서를 저장하고 서버가 부여한 `_id`를 문서에 기록합니다.
    pub async fn insert_one(&self, document: &mut T) -> OdmResult<InsertOneResult> {
        let son = document.to_son(&self.naming)?;
        debug!("insert_one into {}", self.collection_name());

        let result = self.collection.insert_one(son).await?;
        document.set_primary_key(result.inserted_id.clone(), &self.naming)?;
        Ok(result)
    }

    /// 여러 문서를 한 번에 저장합니다.
    ///
    /// `ordered`가 true면 첫 실패에서 멈추고, false면 나머지를 계속 시도합니다.
    pub async fn insert_many(&self, documents: &mut [T], ordered: bool) -> OdmResult<InsertManyResult> {
        let sons = documents
            .iter()
            .map(|document| document.to_son(&self.naming))
            .collect::<OdmResult<Vec<_>>>()?;
        debug!("insert_many into {}: {} documents", self.collection_name(), sons.len());

        let options = InsertManyOptions::builder().ordered(ordered).build();
        let result = self.collection.insert_many(sons).with_options(options).await?;
        write_back_ids(documents, &result.inserted_ids, &self.naming)?;
        Ok(result)
    }

    /// 조건에 맞는 문서를 통째로 교체합니다.
    pub async fn replace_one<'a>(
        &self,
        selector: impl Into<Selector<'a, T>>,
        replacement: &T,
        upsert: bool,
    ) -> OdmResult<UpdateResult> {
        let filter = selector.into().into_filter()?;
        let son = replacement.to_son(&self.naming)?;
        debug!("replace_one on {}: {:?}", self.collection_name(), filter);

        let options = ReplaceOptions::builder().upsert(upsert).build();
        Ok(self
            .collection
            .replace_one(filter, son)
            .with_options(options)
            .await?)
    }

    /// 조건에 맞는 첫 문서의 일부 필드를 `$set`으로 갱신합니다.
    ///
    /// `fields`의 키는 wire 이름이어야 합니다.
    pub async fn update_one<'a>(
        &self,
        selector: impl Into<Selector<'a, T>>,
        fields: bson::Document,
        upsert: bool,
    ) -> OdmResult<UpdateResult> {
        let filter = selector.into().into_filter()?;
        debug!("update_one on {}: {:?}", self.collection_name(), filter);

        let options = UpdateOptions::builder().upsert(upsert).build();
        Ok(self
            .collection
            .update_one(filter, doc! { "$set": fields })
            .with_options(options)
            .await?)
    }

    pub async fn delete_one<'a>(&self, selector: impl Into<Selector<'a, T>>) -> OdmResult<DeleteResult> {
        let filter = selector.into().into_filter()?;
        debug!("delete_one on {}: {:?}", self.collection_name(), filter);

        Ok(self.collection.delete_one(filter).await?)
    }

    pub async fn delete_many<'a>(&self, selector: impl Into<Selector<'a, T>>) -> OdmResult<DeleteResult> {
        let filter = selector.into().into_filter()?;
        debug!("delete_many on {}: {:?}", self.collection_name(), filter);

        Ok(self.collection.delete_many(filter).await?)
    }

    /// 조건에 맞는 문서를 순회하는 커서. 쿼리는 첫 `next()`에서 실행됩니다.
    pub fn find<'a>(&self, selector: impl Into<Selector<'a, T>>) -> OdmResult<QueryCursor<T>> {
        self.find_with_options(selector, FindOptions::default())
    }

    pub fn find_with_options<'a>(
        &self,
        selector: impl Into<Selector<'a, T>>,
        options: FindOptions,
    ) -> OdmResult<QueryCursor<T>> {
        let filter = selector.into().into_filter()?;
        debug!("find on {}: {:?}", self.collection_name(), filter);

        Ok(QueryCursor::new(
            self.database.clone(),
            self.collection.clone(),
            filter,
            options,
            self.naming.clone(),
        ))
    }

    pub async fn count_documents<'a>(&self, selector: impl Into<Selector<'a, T>>) -> OdmResult<u64> {
        let filter = selector.into().into_filter()?;
        Ok(self.collection.count_documents(filter).await?)
    }
}

/// 조회 결과를 문서 타입으로 복원합니다. 결과가 없으면 `Ok(None)`입니다.
fn restore<T: Document>(found: Option<bson::Document>, naming: &NamingConfig) -> OdmResult<Option<T>> {
    found.map(|son| T::from_dict(son, naming)).transpose()
}

/// 배치 저장 결과의 `_id`를 입력 순서대로 각 문서에 기록합니다.
fn write_back_ids<T: Document>(
    documents: &mut [T],
    inserted_ids: &HashMap<usize, Bson>,
    naming: &NamingConfig,
) -> OdmResult<()> {
    for (index, id) in inserted_ids {
        if let Some(document) = documents.get_mut(*index) {
            document.set_primary_key(id.clone(), naming)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::domain::test_models::{TestAddress, TestPersonModel};
    use mongodb::Client;
    use pretty_assertions::assert_eq;

    async fn offline_repository() -> MongoRepository<TestPersonModel> {
        let client = Client::with_uri_str("mongodb://localhost:27017").await.unwrap();
        let database = Database::from_client(client, "mongorm_test", NamingConfig::default());
        MongoRepository::new(&database)
    }

    async fn live_repository() -> MongoRepository<TestPersonModel> {
        let config = DatabaseConfig::from_env();
        let database = Database::connect(&config, NamingConfig::default()).await.unwrap();
        MongoRepository::new(&database)
    }

    #[test]
    fn test_selector_passes_filter_through() {
        let selector: Selector<'_, TestPersonModel> = doc! { "name": "John" }.into();

        assert_eq!(selector.into_filter().unwrap(), doc! { "name": "John" });
    }

    #[test]
    fn test_selector_reduces_instance_to_id() {
        let id = ObjectId::new();
        let person = TestPersonModel { id: Some(id), ..Default::default() };
        let selector: Selector<'_, TestPersonModel> = (&person).into();

        assert_eq!(selector.into_filter().unwrap(), doc! { "_id": id });
    }

    #[test]
    fn test_selector_without_id_is_rejected() {
        let person = TestPersonModel::default();
        let selector: Selector<'_, TestPersonModel> = (&person).into();

        assert!(matches!(selector.into_filter(), Err(OdmError::MissingIdentifier(_))));
    }

    #[test]
    fn test_selector_from_object_id() {
        let id = ObjectId::new();
        let selector: Selector<'_, TestPersonModel> = id.into();

        assert_eq!(selector.into_filter().unwrap(), doc! { "_id": Bson::ObjectId(id) });
    }

    #[test]
    fn test_restore_without_match_is_none() {
        let found = restore::<TestPersonModel>(None, &NamingConfig::default()).unwrap();

        assert!(found.is_none());
    }

    #[test]
    fn test_restore_rebuilds_the_document() {
        let id = ObjectId::new();
        let son = doc! { "_id": id, "name": "John", "age": 28 };

        let found = restore::<TestPersonModel>(Some(son), &NamingConfig::default())
            .unwrap()
            .unwrap();

        assert_eq!(found.id, Some(id));
        assert_eq!(found.name.as_deref(), Some("John"));
        assert_eq!(found.age, 28);
    }

    #[test]
    fn test_generated_id_is_written_back() {
        let naming = NamingConfig::default();
        let mut person = TestPersonModel::default();
        let inserted_id = Bson::ObjectId(ObjectId::new());

        person.set_primary_key(inserted_id.clone(), &naming).unwrap();

        assert_eq!(person.primary_key_value(), Some(inserted_id));
    }

    #[test]
    fn test_batch_ids_follow_input_positions() {
        let naming = NamingConfig::default();
        let mut people = vec![TestPersonModel::default(), TestPersonModel::default()];
        let (first, second) = (ObjectId::new(), ObjectId::new());
        let inserted_ids = HashMap::from([(1, Bson::ObjectId(second)), (0, Bson::ObjectId(first))]);

        write_back_ids(&mut people, &inserted_ids, &naming).unwrap();

        assert_eq!(people[0].id, Some(first));
        assert_eq!(people[1].id, Some(second));
    }

    #[tokio::test]
    async fn test_repository_uses_document_collection() {
        let people = offline_repository().await;

        assert_eq!(people.collection_name(), "test_person_model");
        assert_eq!(people.naming(), &NamingConfig::default());
    }

    #[tokio::test]
    async fn test_identity_operations_need_an_id() {
        let people = offline_repository().await;
        let person = TestPersonModel::default();

        assert!(matches!(people.delete_one(&person).await, Err(OdmError::MissingIdentifier(_))));
        assert!(matches!(people.find(&person), Err(OdmError::MissingIdentifier(_))));
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB at MONGODB_URI"]
    async fn test_insert_find_update_delete() {
        let people = live_repository().await;
        let mut john = TestPersonModel {
            address: TestAddress { address: Some("Main St. 1".to_string()) },
            ..Default::default()
        };

        people.insert_one(&mut john).await.unwrap();
        assert!(john.id.is_some());

        let found = people.find_one(&john).await.unwrap().unwrap();
        assert!(found.same_fields(&john));

        let updated = people.update_one(&john, doc! { "age": 29 }, false).await.unwrap();
        assert_eq!(updated.modified_count, 1);
        let found = people.find_one(&john).await.unwrap().unwrap();
        assert_eq!(found.age, 29);

        let deleted = people.delete_one(&john).await.unwrap();
        assert_eq!(deleted.deleted_count, 1);
        assert!(people.find_one(&john).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB at MONGODB_URI"]
    async fn test_insert_many_and_cursor() {
        let people = live_repository().await;
        let marker = ObjectId::new().to_hex();
        let mut batch: Vec<_> = (0..3)
            .map(|age| TestPersonModel {
                name: Some(marker.clone()),
                age,
                ..Default::default()
            })
            .collect();

        people.insert_many(&mut batch, true).await.unwrap();
        assert!(batch.iter().all(|person| person.id.is_some()));

        let mut cursor = people.find(doc! { "name": marker.as_str() }).unwrap();
        assert_eq!(cursor.count().await.unwrap(), 3);
        assert_eq!(cursor.get(1).await.unwrap().name.as_deref(), Some(marker.as_str()));
        assert!(matches!(cursor.get(3).await, Err(OdmError::IndexOutOfRange(3))));

        let first = cursor.next().await.unwrap().unwrap();
        assert!(first.id.is_some());
        assert!(matches!(cursor.limit(1), Err(OdmError::InvalidOperation(_))));

        let rest = cursor.try_collect().await.unwrap();
        assert_eq!(rest.len(), 2);

        let deleted = people.delete_many(doc! { "name": marker.as_str() }).await.unwrap();
        assert_eq!(deleted.deleted_count, 3);
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB at MONGODB_URI"]
    async fn test_find_one_without_match_is_none() {
        let people = live_repository().await;

        assert!(people.find_one(ObjectId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB at MONGODB_URI"]
    async fn test_replace_one_with_upsert() {
        let people = live_repository().await;
        let mut jane = TestPersonModel {
            id: Some(ObjectId::new()),
            name: Some("Jane".to_string()),
            ..Default::default()
        };

        let result = people.replace_one(&jane, &jane, true).await.unwrap();
        assert!(result.upserted_id.is_some());

        jane.age = 41;
        people.replace_one(&jane, &jane, false).await.unwrap();
        assert_eq!(people.find_one(&jane).await.unwrap().unwrap().age, 41);

        people.delete_one(&jane).await.unwrap();
    }
}
