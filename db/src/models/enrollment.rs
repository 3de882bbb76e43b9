use sea_orm::entity::prelude::*;
use sea_orm::{PaginatorTrait, QueryOrder, Set};

use super::user;

/// A student taking a course within a class.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub course_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub class_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::class::Entity",
        from = "Column::ClassId",
        to = "super::class::Column::Id"
    )]
    Class,
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::class::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Class.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        student_id: i64,
        class_id: i64,
        course_id: i64,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            course_id: Set(course_id),
            class_id: Set(class_id),
            student_id: Set(student_id),
        }
        .insert(db)
        .await
    }

    pub async fn is_enrolled(
        db: &DatabaseConnection,
        student_id: i64,
        class_id: i64,
        course_id: i64,
    ) -> Result<bool, DbErr> {
        let count = Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::CourseId.eq(course_id))
            .count(db)
            .await?;
        Ok(count > 0)
    }

    /// Ids of every student enrolled in the pair.
    pub async fn student_ids(db: &DatabaseConnection, class_id: i64, course_id: i64) -> Result<Vec<i64>, DbErr> {
        let rows = Entity::find()
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::CourseId.eq(course_id))
            .order_by_asc(Column::StudentId)
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|r| r.student_id).collect())
    }

    /// Enrolled students as user rows, ordered by registration number.
    pub async fn students_in(
        db: &DatabaseConnection,
        class_id: i64,
        course_id: i64,
    ) -> Result<Vec<user::Model>, DbErr> {
        let ids = Self::student_ids(db, class_id, course_id).await?;
        user::Model::find_many(db, &ids).await
    }

    /// Every (class, course) enrollment held by a student.
    pub async fn for_student(db: &DatabaseConnection, student_id: i64) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_asc(Column::CourseId)
            .all(db)
            .await
    }
}
