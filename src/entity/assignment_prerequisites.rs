//! 前置作业边实体（有向边 assignment -> prerequisite，整体必须保持 DAG）

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assignment_prerequisites")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub assignment_id: i64,
    pub prerequisite_id: i64,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::assignments::Column::Id"
    )]
    Assignment,
    #[sea_orm(
        belongs_to = "super::assignments::Entity",
        from = "Column::PrerequisiteId",
        to = "super::assignments::Column::Id"
    )]
    Prerequisite,
}

impl ActiveModelBehavior for ActiveModel {}
