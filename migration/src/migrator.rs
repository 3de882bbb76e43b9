use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202501100001_create_users::Migration),
            Box::new(migrations::m202501100002_create_courses::Migration),
            Box::new(migrations::m202501100003_create_classes::Migration),
            Box::new(migrations::m202501100004_create_course_assignments::Migration),
            Box::new(migrations::m202501100005_create_enrollments::Migration),
            Box::new(migrations::m202501100006_create_attendance::Migration),
            Box::new(migrations::m202501100007_create_notifications::Migration),
        ]
    }
}
