use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, PaginatorTrait, QueryOrder, Set};
use serde::Serialize;

/// A message persisted for a student. `read` only ever moves from `false`
/// to `true`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub student_id: i64,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Student,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        student_id: i64,
        message: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            id: NotSet,
            student_id: Set(student_id),
            message: Set(message.to_owned()),
            read: Set(false),
            created_at: Set(created_at),
        }
        .insert(db)
        .await
    }

    /// Newest first.
    pub async fn list_for_student(db: &DatabaseConnection, student_id: i64) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(db)
            .await
    }

    pub async fn count_for_student(db: &DatabaseConnection, student_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .count(db)
            .await
    }

    /// Looks a notification up only if `student_id` owns it.
    pub async fn find_owned(db: &DatabaseConnection, id: i64, student_id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id)
            .filter(Column::StudentId.eq(student_id))
            .one(db)
            .await
    }

    /// Sets `read = true`. Already-read rows are returned as is.
    pub async fn mark_read(&self, db: &DatabaseConnection) -> Result<Self, DbErr> {
        if self.read {
            return Ok(self.clone());
        }
        let mut active: ActiveModel = self.clone().into();
        active.read = Set(true);
        active.update(db).await
    }
}
