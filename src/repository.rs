//! Generic CRUD and specification execution over any entity set. Every
//! function takes a `ConnectionTrait` so the same calls run against the pool or
//! inside a transaction.

use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel, PaginatorTrait,
    PrimaryKeyTrait,
};

use crate::error::{ServiceError, ServiceResult};
use crate::pagination::{Page, PageParameters};
use crate::specification::Specification;

pub async fn find_by_id<E, C>(db: &C, id: &str) -> Result<Option<E::Model>, DbErr>
where
    E: EntityTrait,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = String>,
    C: ConnectionTrait,
{
    E::find_by_id(id.to_owned()).one(db).await
}

/// Like [`find_by_id`] but a missing row is a not-found failure labelled with
/// `label`.
pub async fn get<E, C>(db: &C, id: &str, label: &str) -> ServiceResult<E::Model>
where
    E: EntityTrait,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = String>,
    C: ConnectionTrait,
{
    find_by_id::<E, C>(db, id)
        .await?
        .ok_or_else(|| ServiceError::not_found(label, id))
}

pub async fn exists<E, C>(db: &C, id: &str) -> Result<bool, DbErr>
where
    E: EntityTrait,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = String>,
    C: ConnectionTrait,
{
    Ok(find_by_id::<E, C>(db, id).await?.is_some())
}

pub async fn list<E, C, S>(db: &C, spec: &S) -> Result<Vec<E::Model>, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
    S: Specification<E>,
{
    spec.apply(E::find()).all(db).await
}

pub async fn count<E, C, S>(db: &C, spec: &S) -> Result<u64, DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
    S: Specification<E>,
{
    spec.apply(E::find()).count(db).await
}

/// Executes `spec` and returns the requested page together with the total
/// match count. Parameters must already be validated.
pub async fn paged<E, C, S>(
    db: &C,
    spec: &S,
    params: &PageParameters,
) -> Result<Page<E::Model>, DbErr>
where
    E: EntityTrait,
    E::Model: Sync,
    C: ConnectionTrait,
    S: Specification<E>,
{
    let paginator = spec.apply(E::find()).paginate(db, params.page_size);
    let total_count = paginator.num_items().await?;
    let items = paginator
        .fetch_page(params.page_nr.saturating_sub(1))
        .await?;
    Ok(Page {
        items,
        total_count,
        page_nr: params.page_nr,
        page_size: params.page_size,
    })
}

/// Bulk insert of child rows. An empty batch is a no-op.
pub async fn insert_all<A, C>(db: &C, models: Vec<A>) -> Result<u64, DbErr>
where
    A: ActiveModelTrait,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    if models.is_empty() {
        return Ok(0);
    }
    <A::Entity as EntityTrait>::insert_many(models)
        .exec_without_returning(db)
        .await
}

pub async fn delete_by_id<E, C>(db: &C, id: &str) -> Result<u64, DbErr>
where
    E: EntityTrait,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = String>,
    C: ConnectionTrait,
{
    Ok(E::delete_by_id(id.to_owned()).exec(db).await?.rows_affected)
}
