use chrono::{DateTime, Duration, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, PaginatorTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use strum::{Display, EnumString};

type HmacSha256 = Hmac<Sha256>;

/// A time-boxed attendance window for one course, class and date.
///
/// The `token` is what the QR code carries. It is derived from the
/// per-session `secret`, so two sessions for the same sitting never share a
/// token.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "attendance_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub course_id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub date: NaiveDate,
    pub token: String,
    #[serde(skip_serializing)]
    pub secret: String,
    pub status: SessionStatus,
    pub origin: SessionOrigin,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stored lifecycle state. See [`Model::effective_status`] for the value
/// that accounts for the clock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_session_status")]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    #[sea_orm(string_value = "active")]
    Active,

    #[sea_orm(string_value = "expired")]
    Expired,
}

/// How the sitting came about. A storage-level guard allows one `Manual`
/// sitting per course, class and date.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "attendance_session_origin")]
#[strum(serialize_all = "lowercase")]
pub enum SessionOrigin {
    #[sea_orm(string_value = "qr")]
    Qr,

    #[sea_orm(string_value = "manual")]
    Manual,
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
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn random_hex(len_bytes: usize) -> String {
    let mut buf = vec![0u8; len_bytes];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

impl Model {
    /// `hex(HMAC-SHA256(secret, "course|class|date|nonce"))`, 64 characters.
    pub fn sign_token(
        secret: &str,
        course_id: i64,
        class_id: i64,
        date: NaiveDate,
        nonce: &str,
    ) -> Result<String, DbErr> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| DbErr::Custom(format!("Invalid session secret: {e}")))?;
        mac.update(format!("{course_id}|{class_id}|{date}|{nonce}").as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Inserts a new session that accepts redemptions until
    /// `issued_at + validity`.
    pub async fn create(
        db: &DatabaseConnection,
        course_id: i64,
        class_id: i64,
        teacher_id: i64,
        date: NaiveDate,
        issued_at: DateTime<Utc>,
        validity: Duration,
    ) -> Result<Self, DbErr> {
        Self::insert_new(
            db,
            course_id,
            class_id,
            teacher_id,
            date,
            issued_at,
            issued_at + validity,
            SessionStatus::Active,
            SessionOrigin::Qr,
        )
        .await
    }

    /// Inserts a session that is already closed. Used when a teacher records
    /// a sitting by hand without ever displaying a QR code.
    pub async fn create_closed(
        db: &DatabaseConnection,
        course_id: i64,
        class_id: i64,
        teacher_id: i64,
        date: NaiveDate,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        Self::insert_new(
            db,
            course_id,
            class_id,
            teacher_id,
            date,
            issued_at,
            issued_at,
            SessionStatus::Expired,
            SessionOrigin::Manual,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_new(
        db: &DatabaseConnection,
        course_id: i64,
        class_id: i64,
        teacher_id: i64,
        date: NaiveDate,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        status: SessionStatus,
        origin: SessionOrigin,
    ) -> Result<Self, DbErr> {
        let secret = random_hex(32);
        let nonce = random_hex(16);
        let token = Self::sign_token(&secret, course_id, class_id, date, &nonce)?;

        ActiveModel {
            id: NotSet,
            course_id: Set(course_id),
            class_id: Set(class_id),
            teacher_id: Set(teacher_id),
            date: Set(date),
            token: Set(token),
            secret: Set(secret),
            status: Set(status),
            origin: Set(origin),
            issued_at: Set(issued_at),
            expires_at: Set(expires_at),
            updated_at: Set(issued_at),
        }
        .insert(db)
        .await
    }

    /// Status as observed at `now`. A session past `expires_at` is expired
    /// even if the stored row still says active.
    pub fn effective_status(&self, now: DateTime<Utc>) -> SessionStatus {
        if self.status == SessionStatus::Expired || now > self.expires_at {
            SessionStatus::Expired
        } else {
            SessionStatus::Active
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == SessionStatus::Expired
    }

    /// Persists the expired state. Returns the row unchanged if it is
    /// already stored as expired.
    pub async fn mark_expired(&self, db: &DatabaseConnection, now: DateTime<Utc>) -> Result<Self, DbErr> {
        if self.status == SessionStatus::Expired {
            return Ok(self.clone());
        }
        let mut active: ActiveModel = self.clone().into();
        active.status = Set(SessionStatus::Expired);
        if now < self.expires_at {
            active.expires_at = Set(now);
        }
        active.updated_at = Set(now);
        active.update(db).await
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    pub async fn find_by_token(db: &DatabaseConnection, token: &str) -> Result<Option<Self>, DbErr> {
        Entity::find().filter(Column::Token.eq(token)).one(db).await
    }

    /// The session for this sitting that still accepts redemptions at `now`.
    pub async fn find_active_for(
        db: &DatabaseConnection,
        course_id: i64,
        class_id: i64,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, DbErr> {
        let candidates = Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::Date.eq(date))
            .filter(Column::Status.eq(SessionStatus::Active))
            .all(db)
            .await?;
        Ok(candidates.into_iter().find(|s| !s.is_expired(now)))
    }

    /// Rows for the sitting still stored as active, whatever the clock says.
    pub async fn find_stored_active(
        db: &DatabaseConnection,
        course_id: i64,
        class_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::Date.eq(date))
            .filter(Column::Status.eq(SessionStatus::Active))
            .one(db)
            .await
    }

    /// Persists `Expired` on every row of the sitting whose window has
    /// passed, freeing the live-sitting slot. Returns how many were flipped.
    pub async fn expire_stale(
        db: &DatabaseConnection,
        course_id: i64,
        class_id: i64,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<usize, DbErr> {
        let stale: Vec<Self> = Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::Date.eq(date))
            .filter(Column::Status.eq(SessionStatus::Active))
            .all(db)
            .await?
            .into_iter()
            .filter(|s| s.is_expired(now))
            .collect();
        for s in &stale {
            s.mark_expired(db, now).await?;
        }
        Ok(stale.len())
    }

    /// Most recently issued session for the sitting, if any.
    pub async fn latest_for_date(
        db: &DatabaseConnection,
        course_id: i64,
        class_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::ClassId.eq(class_id))
            .filter(Column::Date.eq(date))
            .order_by_desc(Column::IssuedAt)
            .order_by_desc(Column::Id)
            .one(db)
            .await
    }

    /// Every session held for the pair, oldest first.
    pub async fn list_for(db: &DatabaseConnection, course_id: i64, class_id: i64) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::ClassId.eq(class_id))
            .order_by_asc(Column::Date)
            .order_by_asc(Column::IssuedAt)
            .order_by_asc(Column::Id)
            .all(db)
            .await
    }

    pub async fn count_for(db: &DatabaseConnection, course_id: i64, class_id: i64) -> Result<u64, DbErr> {
        Entity::find()
            .filter(Column::CourseId.eq(course_id))
            .filter(Column::ClassId.eq(class_id))
            .count(db)
            .await
    }
}
