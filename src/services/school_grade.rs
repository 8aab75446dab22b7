use sea_orm::{
    ActiveModelTrait, DatabaseConnection, IntoActiveModel, Order, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::school_grade;
use crate::error::{ServiceError, ServiceResult};
use crate::pagination::{Page, PageParameters};
use crate::repository;
use crate::services::communication::purge_entity_references;
use crate::services::{id_or_new, Checks};
use crate::specification::{FilterSpec, PagedSpec};

const LABEL: &str = "School grade";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchoolGradeDto {
    pub id: String,
    pub name: String,
}

impl From<school_grade::Model> for SchoolGradeDto {
    fn from(model: school_grade::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchoolGradeRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Clone)]
pub struct SchoolGradeService {
    db: DatabaseConnection,
    max_page_size: u64,
}

impl SchoolGradeService {
    pub fn new(db: DatabaseConnection, max_page_size: u64) -> Self {
        Self { db, max_page_size }
    }

    pub async fn all(&self) -> ServiceResult<Vec<SchoolGradeDto>> {
        let spec = FilterSpec::<school_grade::Entity>::all()
            .order_by(school_grade::Column::Name, Order::Asc);
        let rows = repository::list(&self.db, &spec).await?;
        Ok(rows.into_iter().map(SchoolGradeDto::from).collect())
    }

    pub async fn paged(&self, params: &PageParameters) -> ServiceResult<Page<SchoolGradeDto>> {
        params.validate(self.max_page_size)?;
        let spec = PagedSpec::<school_grade::Entity>::new(params, vec![school_grade::Column::Name])
            .with_default_order(school_grade::Column::Name, Order::Asc);
        let page = repository::paged(&self.db, &spec, params).await?;
        Ok(page.map(SchoolGradeDto::from))
    }

    pub async fn get(&self, id: &str) -> ServiceResult<SchoolGradeDto> {
        let model = repository::get::<school_grade::Entity, _>(&self.db, id, LABEL).await?;
        Ok(model.into())
    }

    pub async fn create(&self, request: SchoolGradeRequest) -> ServiceResult<SchoolGradeDto> {
        let mut checks = Checks::default();
        let name = checks.required("Name", request.name.as_deref()).to_string();
        checks.finish()?;

        let model = school_grade::ActiveModel {
            id: Set(id_or_new(request.id)?),
            name: Set(name),
        }
        .insert(&self.db)
        .await?;

        crate::metrics::entity_created("school_grades");
        tracing::info!(grade_id = %model.id, "school grade created");
        Ok(model.into())
    }

    pub async fn update(&self, request: SchoolGradeRequest) -> ServiceResult<SchoolGradeDto> {
        let id = request
            .id
            .as_deref()
            .ok_or_else(|| ServiceError::validation("Id is required"))?;
        let existing = repository::get::<school_grade::Entity, _>(&self.db, id, LABEL).await?;

        let mut active = existing.into_active_model();
        if let Some(name) = request.name {
            let mut checks = Checks::default();
            let name = checks.required("Name", Some(name.as_str())).to_string();
            checks.finish()?;
            active.name = Set(name);
        }
        let model = active.update(&self.db).await?;
        Ok(model.into())
    }

    /// Removes the grade and every notification and message about it in one
    /// transaction. Learners in the grade keep existing with no grade.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let txn = self.db.begin().await?;
        if repository::delete_by_id::<school_grade::Entity, _>(&txn, id).await? == 0 {
            return Err(ServiceError::not_found(LABEL, id));
        }
        let purged = purge_entity_references(&txn, &[id.to_string()]).await?;
        txn.commit().await?;

        crate::metrics::entity_deleted("school_grades");
        tracing::info!(
            grade_id = %id,
            notifications = purged.notifications,
            messages = purged.messages,
            "school grade deleted"
        );
        Ok(())
    }
}
