use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, Set};

/// A teacher assigned to teach a course to a class.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "course_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub course_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub class_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub teacher_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id"
    )]
    Class,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::TeacherId",
        to = "super::user::Column::Id"
    )]
    Teacher,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        course_id: i64,
        class_id: i64,
        teacher_id: i64,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            course_id: Set(course_id),
            class_id: Set(class_id),
            teacher_id: Set(teacher_id),
        }
        .insert(db)
        .await
    }

    /// Whether `teacher_id` teaches `course_id` to `class_id`.
    pub async fn is_assigned(
        db: &DatabaseConnection,
        course_id: i64,
        class_id: i64,
        teacher_id: i64,
    ) -> Result<bool, DbErr> {
        let count = Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::TeacherId.eq(teacher_id))
            .count(db)
            .await?;
        Ok(count > 0)
    }
}
