//! # 쿼리 결과 커서
//!
//! `find` 결과를 문서 타입으로 복원하며 순회하는 커서입니다.
//! 드라이버 커서는 첫 `next()` 호출 시점에 열리므로, 그 전까지는 필터와
//! 옵션(`skip`, `limit`, `hint`, `$comment`, `$where`)을 자유롭게 바꿀 수 있습니다.
//!
//! ```rust,ignore
//! let mut adults = people.find(doc! { "age": { "$gte": 18 } })?;
//! adults.limit(10)?.comment("adult listing")?;
//!
//! while let Some(person) = adults.next().await {
//!     println!("{:?}", person?);
//! }
//! ```

use std::marker::PhantomData;

use futures_util::StreamExt;
use log::debug;
use mongodb::bson::{self, Bson, doc};
use mongodb::options::{FindOptions, Hint};
use mongodb::{Collection, Cursor};

use crate::config::NamingConfig;
use crate::core::errors::{OdmError, OdmResult};
use crate::domain::document::Document;

/// 지연 실행되는 쿼리 결과 커서
pub struct QueryCursor<T: Document> {
    database: mongodb::Database,
    collection: Collection<bson::Document>,
    filter: bson::Document,
    options: FindOptions,
    naming: NamingConfig,
    cursor: Option<Cursor<bson::Document>>,
    started: bool,
    exhausted: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> QueryCursor<T> {
    pub(crate) fn new(
        database: mongodb::Database,
        collection: Collection<bson::Document>,
        filter: bson::Document,
        options: FindOptions,
        naming: NamingConfig,
    ) -> Self {
        Self {
            database,
            collection,
            filter,
            options,
            naming,
            cursor: None,
            started: false,
            exhausted: false,
            _marker: PhantomData,
        }
    }

    pub fn filter(&self) -> &bson::Document {
        &self.filter
    }

    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    fn ensure_not_started(&self, operation: &str) -> OdmResult<()> {
        if self.started {
            return Err(OdmError::InvalidOperation(format!(
                "cannot apply {} after iteration has started",
                operation
            )));
        }
        Ok(())
    }

    /// 사용할 인덱스를 지정합니다.
    pub fn hint(&mut self, hint: Hint) -> OdmResult<&mut Self> {
        self.ensure_not_started("hint")?;
        self.options.hint = Some(hint);
        Ok(self)
    }

    /// 쿼리에 `$comment`를 붙입니다.
    pub fn comment(&mut self, text: impl Into<String>) -> OdmResult<&mut Self> {
        self.ensure_not_started("comment")?;
        self.filter.insert("$comment", Bson::String(text.into()));
        Ok(self)
    }

    /// 서버 측 JavaScript 조건(`$where`)을 추가합니다.
    pub fn where_code(&mut self, code: impl Into<String>) -> OdmResult<&mut Self> {
        self.ensure_not_started("where")?;
        self.filter.insert("$where", Bson::String(code.into()));
        Ok(self)
    }

    pub fn skip(&mut self, count: u64) -> OdmResult<&mut Self> {
        self.ensure_not_started("skip")?;
        self.options.skip = Some(count);
        Ok(self)
    }

    pub fn limit(&mut self, count: i64) -> OdmResult<&mut Self> {
        self.ensure_not_started("limit")?;
        self.options.limit = Some(count);
        Ok(self)
    }

    /// 더 읽을 결과가 남아 있을 수 있는지 여부
    pub fn alive(&self) -> bool {
        !self.exhausted
    }

    /// 다음 문서를 읽습니다. 끝에 도달하면 커서를 닫고 `None`을 반환합니다.
    pub async fn next(&mut self) -> Option<OdmResult<T>> {
        if self.exhausted {
            return None;
        }

        if self.cursor.is_none() {
            debug!("opening cursor on {} with {:?}", self.collection.name(), self.filter);
            self.started = true;
            match self
                .collection
                .find(self.filter.clone())
                .with_options(self.options.clone())
                .await
            {
                Ok(cursor) => self.cursor = Some(cursor),
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(e.into()));
                }
            }
        }

        let cursor = self.cursor.as_mut()?;
        match cursor.next().await {
            Some(Ok(son)) => Some(T::from_dict(son, &self.naming)),
            Some(Err(e)) => Some(Err(e.into())),
            None => {
                self.close();
                None
            }
        }
    }

    /// 남은 결과를 모두 읽습니다. 첫 에러에서 멈춥니다.
    pub async fn try_collect(mut self) -> OdmResult<Vec<T>> {
        let mut documents = Vec::new();
        while let Some(document) = self.next().await {
            documents.push(document?);
        }
        Ok(documents)
    }

    /// `skip + index` 위치의 문서 하나를 조회합니다.
    ///
    /// 순회 상태와 무관하게 별도 쿼리를 실행합니다.
    pub async fn get(&self, index: usize) -> OdmResult<T> {
        if let Some(limit) = self.options.limit {
            if limit > 0 && index as i64 >= limit {
                return Err(OdmError::IndexOutOfRange(index));
            }
        }

        let position = u64::try_from(index)
            .ok()
            .and_then(|index| self.options.skip.unwrap_or(0).checked_add(index))
            .ok_or(OdmError::IndexOutOfRange(index))?;

        let mut options = self.options.clone();
        options.skip = Some(position);
        options.limit = Some(1);

        let mut cursor = self
            .collection
            .find(self.filter.clone())
            .with_options(options)
            .await?;

        match cursor.next().await {
            Some(son) => T::from_dict(son?, &self.naming),
            None => Err(OdmError::IndexOutOfRange(index)),
        }
    }

    /// 필터에 일치하는 문서 수 (`skip`/`limit` 미적용)
    ///
    /// `count_documents`는 `$match` 집계로 실행되어 `$where`를 거부하므로
    /// `count` 명령을 직접 보냅니다.
    pub async fn count(&self) -> OdmResult<u64> {
        let reply = self.database.run_command(self.count_command()).await?;
        let counted = match reply.get("n") {
            Some(Bson::Int32(n)) => i64::from(*n),
            Some(Bson::Int64(n)) => *n,
            Some(Bson::Double(n)) => *n as i64,
            other => {
                return Err(OdmError::TypeError(format!(
                    "unexpected count reply value: {:?}",
                    other
                )));
            }
        };
        u64::try_from(counted)
            .map_err(|_| OdmError::TypeError(format!("negative count reply: {}", counted)))
    }

    fn count_command(&self) -> bson::Document {
        doc! {
            "count": self.collection.name(),
            "query": self.filter.clone(),
        }
    }

    /// 서버의 `explain` 결과 (queryPlanner)
    pub async fn explain(&self) -> OdmResult<bson::Document> {
        let command = doc! {
            "explain": self.find_command(),
            "verbosity": "queryPlanner",
        };
        Ok(self.database.run_command(command).await?)
    }

    fn find_command(&self) -> bson::Document {
        let mut find = doc! {
            "find": self.collection.name(),
            "filter": self.filter.clone(),
        };
        if let Some(skip) = self.options.skip {
            find.insert("skip", skip as i64);
        }
        if let Some(limit) = self.options.limit {
            find.insert("limit", limit);
        }
        let hint = match &self.options.hint {
            Some(Hint::Keys(keys)) => Some(Bson::Document(keys.clone())),
            Some(Hint::Name(name)) => Some(Bson::String(name.clone())),
            _ => None,
        };
        if let Some(hint) = hint {
            find.insert("hint", hint);
        }
        find
    }

    /// 드라이버 커서를 해제합니다. 이후 `next()`는 `None`을 반환합니다.
    pub fn close(&mut self) {
        self.cursor = None;
        self.exhausted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_models::TestPersonModel;
    use mongodb::Client;
    use pretty_assertions::assert_eq;

    async fn cursor(filter: bson::Document) -> QueryCursor<TestPersonModel> {
        let client = Client::with_uri_str("mongodb://localhost:27017").await.unwrap();
        let database = client.database("mongorm_test");
        let collection = database.collection::<bson::Document>("test_person_model");
        QueryCursor::new(database, collection, filter, FindOptions::default(), NamingConfig::default())
    }

    #[tokio::test]
    async fn test_modifiers_shape_the_query() {
        let mut people = cursor(doc! { "age": 28 }).await;

        people
            .skip(5)
            .unwrap()
            .limit(10)
            .unwrap()
            .comment("listing")
            .unwrap()
            .where_code("this.age > 1")
            .unwrap()
            .hint(Hint::Name("age_1".to_string()))
            .unwrap();

        assert_eq!(
            people.filter(),
            &doc! { "age": 28, "$comment": "listing", "$where": "this.age > 1" }
        );
        assert_eq!(people.options().skip, Some(5));
        assert_eq!(people.options().limit, Some(10));
        assert_eq!(
            people.find_command(),
            doc! {
                "find": "test_person_model",
                "filter": { "age": 28, "$comment": "listing", "$where": "this.age > 1" },
                "skip": 5i64,
                "limit": 10i64,
                "hint": "age_1",
            }
        );
        assert!(people.alive());
    }

    #[tokio::test]
    async fn test_count_command_keeps_where_in_query() {
        let mut people = cursor(doc! { "age": 28 }).await;
        people.where_code("this.age > 1").unwrap().skip(3).unwrap();

        assert_eq!(
            people.count_command(),
            doc! {
                "count": "test_person_model",
                "query": { "age": 28, "$where": "this.age > 1" },
            }
        );
    }

    #[tokio::test]
    async fn test_get_with_overflowing_position_is_out_of_range() {
        let mut people = cursor(doc! {}).await;
        people.skip(u64::MAX).unwrap();

        assert!(matches!(people.get(1).await, Err(OdmError::IndexOutOfRange(1))));
    }

    #[tokio::test]
    async fn test_close_ends_iteration_without_a_query() {
        let mut people = cursor(doc! {}).await;

        people.close();

        assert!(!people.alive());
        assert!(people.next().await.is_none());
    }

    #[tokio::test]
    async fn test_get_past_limit_is_out_of_range() {
        let mut people = cursor(doc! {}).await;
        people.limit(2).unwrap();

        assert!(matches!(people.get(2).await, Err(OdmError::IndexOutOfRange(2))));
    }

    #[tokio::test]
    async fn test_modifiers_rejected_after_iteration_started() {
        let mut people = cursor(doc! {}).await;
        people.started = true;

        assert!(matches!(people.skip(1), Err(OdmError::InvalidOperation(_))));
        assert!(matches!(people.comment("late"), Err(OdmError::InvalidOperation(_))));
    }
}
