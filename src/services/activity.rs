//! Teachers, age groups and the activity groups that tie them together.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Order,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::{activity_group, age_group, participating_activity_group, teacher};
use crate::error::{ServiceError, ServiceResult};
use crate::pagination::{Page, PageParameters};
use crate::repository;
use crate::services::communication::purge_entity_references;
use crate::services::{id_or_new, Checks};
use crate::specification::{FilterSpec, PagedSpec};

const TEACHER: &str = "Teacher";
const AGE_GROUP: &str = "Age group";
const ACTIVITY_GROUP: &str = "Activity group";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TeacherDto {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

impl From<teacher::Model> for TeacherDto {
    fn from(model: teacher::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TeacherRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgeGroupDto {
    pub id: String,
    pub name: String,
    pub min_age: i32,
    pub max_age: i32,
}

impl From<age_group::Model> for AgeGroupDto {
    fn from(model: age_group::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            min_age: model.min_age,
            max_age: model.max_age,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgeGroupRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivityGroupDto {
    pub id: String,
    pub name: String,
    pub age_group_id: String,
    pub teacher_id: String,
}

impl From<activity_group::Model> for ActivityGroupDto {
    fn from(model: activity_group::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            age_group_id: model.age_group_id,
            teacher_id: model.teacher_id,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivityGroupRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: Option<String>,
    pub age_group_id: Option<String>,
    pub teacher_id: Option<String>,
}

#[derive(Clone)]
pub struct ActivityService {
    db: DatabaseConnection,
    max_page_size: u64,
}

impl ActivityService {
    pub fn new(db: DatabaseConnection, max_page_size: u64) -> Self {
        Self { db, max_page_size }
    }

    // Teachers

    pub async fn all_teachers(&self) -> ServiceResult<Vec<TeacherDto>> {
        let spec = FilterSpec::<teacher::Entity>::all()
            .order_by(teacher::Column::LastName, Order::Asc)
            .order_by(teacher::Column::FirstName, Order::Asc);
        let rows = repository::list(&self.db, &spec).await?;
        Ok(rows.into_iter().map(TeacherDto::from).collect())
    }

    pub async fn paged_teachers(&self, params: &PageParameters) -> ServiceResult<Page<TeacherDto>> {
        params.validate(self.max_page_size)?;
        let spec = PagedSpec::<teacher::Entity>::new(
            params,
            vec![
                teacher::Column::FirstName,
                teacher::Column::LastName,
                teacher::Column::Email,
            ],
        )
        .with_default_order(teacher::Column::LastName, Order::Asc);
        Ok(repository::paged(&self.db, &spec, params).await?.map(TeacherDto::from))
    }

    pub async fn get_teacher(&self, id: &str) -> ServiceResult<TeacherDto> {
        Ok(repository::get::<teacher::Entity, _>(&self.db, id, TEACHER).await?.into())
    }

    pub async fn create_teacher(&self, request: TeacherRequest) -> ServiceResult<TeacherDto> {
        let mut checks = Checks::default();
        let first_name = checks
            .required("First name", request.first_name.as_deref())
            .to_string();
        let last_name = checks
            .required("Last name", request.last_name.as_deref())
            .to_string();
        checks.finish()?;

        let model = teacher::ActiveModel {
            id: Set(id_or_new(request.id)?),
            first_name: Set(first_name),
            last_name: Set(last_name),
            email: Set(request.email),
        }
        .insert(&self.db)
        .await?;
        crate::metrics::entity_created("teachers");
        Ok(model.into())
    }

    pub async fn update_teacher(&self, request: TeacherRequest) -> ServiceResult<TeacherDto> {
        let id = request
            .id
            .as_deref()
            .ok_or_else(|| ServiceError::validation("Id is required"))?;
        let existing = repository::get::<teacher::Entity, _>(&self.db, id, TEACHER).await?;
        let mut checks = Checks::default();
        let mut active = existing.into_active_model();
        if let Some(first_name) = request.first_name.as_deref() {
            active.first_name = Set(checks.required("First name", Some(first_name)).to_string());
        }
        if let Some(last_name) = request.last_name.as_deref() {
            active.last_name = Set(checks.required("Last name", Some(last_name)).to_string());
        }
        checks.finish()?;
        if let Some(email) = request.email {
            active.email = Set(Some(email));
        }
        Ok(active.update(&self.db).await?.into())
    }

    pub async fn delete_teacher(&self, id: &str) -> ServiceResult<()> {
        let teacher = repository::get::<teacher::Entity, _>(&self.db, id, TEACHER).await?;
        let groups = activity_group::Entity::find()
            .filter(activity_group::Column::TeacherId.eq(id))
            .count(&self.db)
            .await?;
        if groups > 0 {
            return Err(ServiceError::validation(format!(
                "Teacher {} {} still leads {groups} activity group(s)",
                teacher.first_name, teacher.last_name
            )));
        }

        let txn = self.db.begin().await?;
        repository::delete_by_id::<teacher::Entity, _>(&txn, id).await?;
        purge_entity_references(&txn, &[id.to_string()]).await?;
        txn.commit().await?;
        crate::metrics::entity_deleted("teachers");
        Ok(())
    }

    // Age groups

    pub async fn all_age_groups(&self) -> ServiceResult<Vec<AgeGroupDto>> {
        let spec = FilterSpec::<age_group::Entity>::all()
            .order_by(age_group::Column::MinAge, Order::Asc);
        let rows = repository::list(&self.db, &spec).await?;
        Ok(rows.into_iter().map(AgeGroupDto::from).collect())
    }

    pub async fn paged_age_groups(&self, params: &PageParameters) -> ServiceResult<Page<AgeGroupDto>> {
        params.validate(self.max_page_size)?;
        let spec = PagedSpec::<age_group::Entity>::new(params, vec![age_group::Column::Name])
            .with_default_order(age_group::Column::MinAge, Order::Asc);
        Ok(repository::paged(&self.db, &spec, params).await?.map(AgeGroupDto::from))
    }

    pub async fn get_age_group(&self, id: &str) -> ServiceResult<AgeGroupDto> {
        Ok(repository::get::<age_group::Entity, _>(&self.db, id, AGE_GROUP).await?.into())
    }

    pub async fn create_age_group(&self, request: AgeGroupRequest) -> ServiceResult<AgeGroupDto> {
        let mut checks = Checks::default();
        let name = checks.required("Name", request.name.as_deref()).to_string();
        checks.check(request.min_age.is_some(), "Minimum age is required");
        checks.check(request.max_age.is_some(), "Maximum age is required");
        let (min_age, max_age) = (
            request.min_age.unwrap_or_default(),
            request.max_age.unwrap_or_default(),
        );
        checks.check(min_age <= max_age, "Minimum age may not exceed maximum age");
        checks.finish()?;

        let model = age_group::ActiveModel {
            id: Set(id_or_new(request.id)?),
            name: Set(name),
            min_age: Set(min_age),
            max_age: Set(max_age),
        }
        .insert(&self.db)
        .await?;
        crate::metrics::entity_created("age_groups");
        Ok(model.into())
    }

    pub async fn update_age_group(&self, request: AgeGroupRequest) -> ServiceResult<AgeGroupDto> {
        let id = request
            .id
            .as_deref()
            .ok_or_else(|| ServiceError::validation("Id is required"))?;
        let existing = repository::get::<age_group::Entity, _>(&self.db, id, AGE_GROUP).await?;
        let mut checks = Checks::default();
        let min_age = request.min_age.unwrap_or(existing.min_age);
        let max_age = request.max_age.unwrap_or(existing.max_age);
        checks.check(min_age <= max_age, "Minimum age may not exceed maximum age");

        let mut active = existing.into_active_model();
        if let Some(name) = request.name.as_deref() {
            active.name = Set(checks.required("Name", Some(name)).to_string());
        }
        checks.finish()?;
        if request.min_age.is_some() {
            active.min_age = Set(min_age);
        }
        if request.max_age.is_some() {
            active.max_age = Set(max_age);
        }
        Ok(active.update(&self.db).await?.into())
    }

    pub async fn delete_age_group(&self, id: &str) -> ServiceResult<()> {
        let age_group = repository::get::<age_group::Entity, _>(&self.db, id, AGE_GROUP).await?;
        let groups = activity_group::Entity::find()
            .filter(activity_group::Column::AgeGroupId.eq(id))
            .count(&self.db)
            .await?;
        if groups > 0 {
            return Err(ServiceError::validation(format!(
                "Age group {} is used by {groups} activity group(s)",
                age_group.name
            )));
        }

        let txn = self.db.begin().await?;
        repository::delete_by_id::<age_group::Entity, _>(&txn, id).await?;
        purge_entity_references(&txn, &[id.to_string()]).await?;
        txn.commit().await?;
        crate::metrics::entity_deleted("age_groups");
        Ok(())
    }

    // Activity groups

    pub async fn all_activity_groups(&self) -> ServiceResult<Vec<ActivityGroupDto>> {
        let spec = FilterSpec::<activity_group::Entity>::all()
            .order_by(activity_group::Column::Name, Order::Asc);
        let rows = repository::list(&self.db, &spec).await?;
        Ok(rows.into_iter().map(ActivityGroupDto::from).collect())
    }

    pub async fn paged_activity_groups(
        &self,
        params: &PageParameters,
    ) -> ServiceResult<Page<ActivityGroupDto>> {
        params.validate(self.max_page_size)?;
        let spec = PagedSpec::<activity_group::Entity>::new(params, vec![activity_group::Column::Name])
            .with_default_order(activity_group::Column::Name, Order::Asc);
        Ok(repository::paged(&self.db, &spec, params)
            .await?
            .map(ActivityGroupDto::from))
    }

    pub async fn get_activity_group(&self, id: &str) -> ServiceResult<ActivityGroupDto> {
        Ok(repository::get::<activity_group::Entity, _>(&self.db, id, ACTIVITY_GROUP)
            .await?
            .into())
    }

    pub async fn create_activity_group(
        &self,
        request: ActivityGroupRequest,
    ) -> ServiceResult<ActivityGroupDto> {
        let mut checks = Checks::default();
        let name = checks.required("Name", request.name.as_deref()).to_string();
        let age_group_id = checks
            .required("Age group", request.age_group_id.as_deref())
            .to_string();
        let teacher_id = checks
            .required("Teacher", request.teacher_id.as_deref())
            .to_string();
        checks.finish()?;
        repository::get::<age_group::Entity, _>(&self.db, &age_group_id, AGE_GROUP).await?;
        repository::get::<teacher::Entity, _>(&self.db, &teacher_id, TEACHER).await?;

        let model = activity_group::ActiveModel {
            id: Set(id_or_new(request.id)?),
            name: Set(name),
            age_group_id: Set(age_group_id),
            teacher_id: Set(teacher_id),
        }
        .insert(&self.db)
        .await?;
        crate::metrics::entity_created("activity_groups");
        Ok(model.into())
    }

    pub async fn update_activity_group(
        &self,
        request: ActivityGroupRequest,
    ) -> ServiceResult<ActivityGroupDto> {
        let id = request
            .id
            .as_deref()
            .ok_or_else(|| ServiceError::validation("Id is required"))?;
        let existing =
            repository::get::<activity_group::Entity, _>(&self.db, id, ACTIVITY_GROUP).await?;
        let mut checks = Checks::default();
        let mut active = existing.into_active_model();
        if let Some(name) = request.name.as_deref() {
            active.name = Set(checks.required("Name", Some(name)).to_string());
        }
        checks.finish()?;
        if let Some(age_group_id) = request.age_group_id {
            repository::get::<age_group::Entity, _>(&self.db, &age_group_id, AGE_GROUP).await?;
            active.age_group_id = Set(age_group_id);
        }
        if let Some(teacher_id) = request.teacher_id {
            repository::get::<teacher::Entity, _>(&self.db, &teacher_id, TEACHER).await?;
            active.teacher_id = Set(teacher_id);
        }
        Ok(active.update(&self.db).await?.into())
    }

    /// Withdraws the group from every event it takes part in, then removes it.
    pub async fn delete_activity_group(&self, id: &str) -> ServiceResult<()> {
        let txn = self.db.begin().await?;
        let withdrawn = participating_activity_group::Entity::delete_many()
            .filter(participating_activity_group::Column::ActivityGroupId.eq(id))
            .exec(&txn)
            .await?
            .rows_affected;
        if repository::delete_by_id::<activity_group::Entity, _>(&txn, id).await? == 0 {
            return Err(ServiceError::not_found(ACTIVITY_GROUP, id));
        }
        purge_entity_references(&txn, &[id.to_string()]).await?;
        txn.commit().await?;

        crate::metrics::entity_deleted("activity_groups");
        tracing::info!(activity_group_id = %id, events = withdrawn, "activity group deleted");
        Ok(())
    }
}
