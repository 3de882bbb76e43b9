use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{QueryOrder, Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One student's mark for one session. `(session_id, student_id)` is the
/// primary key, so a student can never hold two records for a session.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,
    pub status: AttendanceStatus,
    pub source: RecordSource,
    pub recorded_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_status")]
#[strum(ascii_case_insensitive)]
pub enum AttendanceStatus {
    #[sea_orm(string_value = "present")]
    Present,

    #[sea_orm(string_value = "absent")]
    Absent,
}

/// How the record was written.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_source")]
#[strum(serialize_all = "lowercase")]
pub enum RecordSource {
    #[sea_orm(string_value = "qr")]
    Qr,

    #[sea_orm(string_value = "manual")]
    Manual,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::attendance_session::Entity",
        from = "Column::SessionId",
        to = "super::attendance_session::Column::Id"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::StudentId",
        to = "super::user::Column::Id"
    )]
    Student,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn active(
    session_id: i64,
    student_id: i64,
    status: AttendanceStatus,
    source: RecordSource,
    recorded_at: DateTime<Utc>,
) -> ActiveModel {
    ActiveModel {
        session_id: Set(session_id),
        student_id: Set(student_id),
        status: Set(status),
        source: Set(source),
        recorded_at: Set(recorded_at),
    }
}

impl Model {
    /// Atomic insert-if-absent.
    ///
    /// Returns `true` when this call created the row and `false` when a
    /// record for `(session_id, student_id)` already existed. The existing
    /// row is never touched.
    pub async fn insert_if_absent<C: ConnectionTrait>(
        db: &C,
        session_id: i64,
        student_id: i64,
        status: AttendanceStatus,
        source: RecordSource,
        recorded_at: DateTime<Utc>,
    ) -> Result<bool, DbErr> {
        let rows = Entity::insert(active(session_id, student_id, status, source, recorded_at))
            .on_conflict(
                OnConflict::columns([Column::SessionId, Column::StudentId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
        Ok(rows > 0)
    }

    /// Writes a manual mark, replacing whatever was recorded before.
    pub async fn upsert_manual<C: ConnectionTrait>(
        db: &C,
        session_id: i64,
        student_id: i64,
        status: AttendanceStatus,
        recorded_at: DateTime<Utc>,
    ) -> Result<(), DbErr> {
        Entity::insert(active(session_id, student_id, status, RecordSource::Manual, recorded_at))
            .on_conflict(
                OnConflict::columns([Column::SessionId, Column::StudentId])
                    .update_columns([Column::Status, Column::Source, Column::RecordedAt])
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
        Ok(())
    }

    pub async fn find(db: &DatabaseConnection, session_id: i64, student_id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id((session_id, student_id)).one(db).await
    }

    /// All records belonging to any of `session_ids`.
    pub async fn for_sessions(db: &DatabaseConnection, session_ids: &[i64]) -> Result<Vec<Self>, DbErr> {
        if session_ids.is_empty() {
            return Ok(Vec::new());
        }
        Entity::find()
            .filter(Column::SessionId.is_in(session_ids.iter().copied()))
            .order_by_asc(Column::SessionId)
            .order_by_asc(Column::StudentId)
            .all(db)
            .await
    }

    pub async fn for_session(db: &DatabaseConnection, session_id: i64) -> Result<Vec<Self>, DbErr> {
        Self::for_sessions(db, &[session_id]).await
    }
}
