use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建作业表
        manager
            .create_table(
                Table::create()
                    .table(Assignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assignments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Assignments::CourseId).big_integer().not_null())
                    .col(ColumnDef::new(Assignments::UnitId).big_integer().null())
                    .col(ColumnDef::new(Assignments::LessonId).big_integer().null())
                    .col(ColumnDef::new(Assignments::Title).string().not_null())
                    .col(ColumnDef::new(Assignments::MaxScore).double().not_null())
                    .col(ColumnDef::new(Assignments::DeadlineAt).big_integer().null())
                    .col(
                        ColumnDef::new(Assignments::ToleranceMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Assignments::MaxAttempts).integer().null())
                    .col(
                        ColumnDef::new(Assignments::CooldownMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Assignments::RetakeEnabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Assignments::AllowLateSubmission)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Assignments::ReviewMode).string().not_null())
                    .col(ColumnDef::new(Assignments::TimeLimitMinutes).integer().null())
                    .col(
                        ColumnDef::new(Assignments::RandomizationType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignments::RandomSubsetCount)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Assignments::Status).string().not_null())
                    .col(ColumnDef::new(Assignments::AvailableFrom).big_integer().null())
                    .col(
                        ColumnDef::new(Assignments::AvailableUntil)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(Assignments::CreatedBy).big_integer().not_null())
                    .col(ColumnDef::new(Assignments::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Assignments::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建题目表
        manager
            .create_table(
                Table::create()
                    .table(Questions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Questions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Questions::AssignmentId).big_integer().not_null())
                    .col(ColumnDef::new(Questions::Kind).string().not_null())
                    .col(ColumnDef::new(Questions::Prompt).text().not_null())
                    .col(ColumnDef::new(Questions::Options).text().null())
                    .col(ColumnDef::new(Questions::Weight).double().not_null())
                    .col(ColumnDef::new(Questions::MaxScore).double().not_null())
                    .col(ColumnDef::new(Questions::AnswerKey).text().null())
                    .col(ColumnDef::new(Questions::Position).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Questions::Table, Questions::AssignmentId)
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建前置作业边表（必须保持 DAG）
        manager
            .create_table(
                Table::create()
                    .table(AssignmentPrerequisites::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssignmentPrerequisites::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AssignmentPrerequisites::AssignmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentPrerequisites::PrerequisiteId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentPrerequisites::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                AssignmentPrerequisites::Table,
                                AssignmentPrerequisites::AssignmentId,
                            )
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                AssignmentPrerequisites::Table,
                                AssignmentPrerequisites::PrerequisiteId,
                            )
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_prerequisites_edge_unique")
                    .table(AssignmentPrerequisites::Table)
                    .col(AssignmentPrerequisites::AssignmentId)
                    .col(AssignmentPrerequisites::PrerequisiteId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 创建提交表
        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Submissions::AssignmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::StudentId).big_integer().not_null())
                    .col(ColumnDef::new(Submissions::State).string().not_null())
                    .col(
                        ColumnDef::new(Submissions::AttemptNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::IsLate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Submissions::IsResubmission)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Submissions::QuestionSet).text().not_null())
                    .col(ColumnDef::new(Submissions::Score).double().null())
                    .col(ColumnDef::new(Submissions::StartedAt).big_integer().not_null())
                    .col(ColumnDef::new(Submissions::SubmittedAt).big_integer().null())
                    // in_progress 时为 1，其余状态为 NULL，配合唯一索引保证
                    // 每个 (assignment, student) 最多一个进行中的提交
                    .col(ColumnDef::new(Submissions::Active).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Submissions::Table, Submissions::AssignmentId)
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_submissions_single_active")
                    .table(Submissions::Table)
                    .col(Submissions::AssignmentId)
                    .col(Submissions::StudentId)
                    .col(Submissions::Active)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 创建答案表
        manager
            .create_table(
                Table::create()
                    .table(Answers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Answers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Answers::SubmissionId).big_integer().not_null())
                    .col(ColumnDef::new(Answers::QuestionId).big_integer().not_null())
                    .col(ColumnDef::new(Answers::Content).text().null())
                    .col(ColumnDef::new(Answers::SelectedOptions).text().null())
                    .col(ColumnDef::new(Answers::FilePaths).text().null())
                    .col(ColumnDef::new(Answers::Score).double().null())
                    .col(
                        ColumnDef::new(Answers::IsAutoGraded)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Answers::Feedback).text().null())
                    .col(ColumnDef::new(Answers::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Answers::Table, Answers::SubmissionId)
                            .to(Submissions::Table, Submissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Answers::Table, Answers::QuestionId)
                            .to(Questions::Table, Questions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_answers_submission_question_unique")
                    .table(Answers::Table)
                    .col(Answers::SubmissionId)
                    .col(Answers::QuestionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 创建成绩表
        manager
            .create_table(
                Table::create()
                    .table(Grades::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Grades::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Grades::SourceType).string().not_null())
                    .col(ColumnDef::new(Grades::SourceId).big_integer().not_null())
                    .col(ColumnDef::new(Grades::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Grades::GraderId).big_integer().null())
                    .col(ColumnDef::new(Grades::Score).double().not_null())
                    .col(ColumnDef::new(Grades::MaxScore).double().not_null())
                    .col(
                        ColumnDef::new(Grades::IsDraft)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Grades::Feedback).text().null())
                    .col(ColumnDef::new(Grades::GradedAt).big_integer().not_null())
                    .col(ColumnDef::new(Grades::ReleasedAt).big_integer().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_grades_source_user_unique")
                    .table(Grades::Table)
                    .col(Grades::SourceType)
                    .col(Grades::SourceId)
                    .col(Grades::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 创建豁免表
        manager
            .create_table(
                Table::create()
                    .table(Overrides::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Overrides::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Overrides::AssignmentId).big_integer().not_null())
                    .col(ColumnDef::new(Overrides::StudentId).big_integer().not_null())
                    .col(ColumnDef::new(Overrides::Kind).string().not_null())
                    .col(ColumnDef::new(Overrides::Value).text().not_null())
                    .col(ColumnDef::new(Overrides::Reason).text().not_null())
                    .col(ColumnDef::new(Overrides::GrantedBy).big_integer().not_null())
                    .col(ColumnDef::new(Overrides::GrantedAt).big_integer().not_null())
                    .col(ColumnDef::new(Overrides::ExpiresAt).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Overrides::Table, Overrides::AssignmentId)
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建申诉表
        manager
            .create_table(
                Table::create()
                    .table(Appeals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Appeals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Appeals::SubmissionId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Appeals::StudentId).big_integer().not_null())
                    .col(ColumnDef::new(Appeals::Status).string().not_null())
                    .col(ColumnDef::new(Appeals::Reason).text().not_null())
                    .col(ColumnDef::new(Appeals::Documents).text().null())
                    .col(ColumnDef::new(Appeals::DecidedBy).big_integer().null())
                    .col(ColumnDef::new(Appeals::DecisionNote).text().null())
                    .col(ColumnDef::new(Appeals::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Appeals::DecidedAt).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Appeals::Table, Appeals::SubmissionId)
                            .to(Submissions::Table, Submissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建选课表
        manager
            .create_table(
                Table::create()
                    .table(Enrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Enrollments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Enrollments::CourseId).big_integer().not_null())
                    .col(ColumnDef::new(Enrollments::StudentId).big_integer().not_null())
                    .col(ColumnDef::new(Enrollments::Status).string().not_null())
                    .col(ColumnDef::new(Enrollments::JoinedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enrollments_course_student_unique")
                    .table(Enrollments::Table)
                    .col(Enrollments::CourseId)
                    .col(Enrollments::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Enrollments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Appeals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Overrides::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Grades::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Answers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(AssignmentPrerequisites::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Questions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Assignments::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Assignments {
    #[sea_orm(iden = "assignments")]
    Table,
    Id,
    CourseId,
    UnitId,
    LessonId,
    Title,
    MaxScore,
    DeadlineAt,
    ToleranceMinutes,
    MaxAttempts,
    CooldownMinutes,
    RetakeEnabled,
    AllowLateSubmission,
    ReviewMode,
    TimeLimitMinutes,
    RandomizationType,
    RandomSubsetCount,
    Status,
    AvailableFrom,
    AvailableUntil,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Questions {
    #[sea_orm(iden = "questions")]
    Table,
    Id,
    AssignmentId,
    Kind,
    Prompt,
    Options,
    Weight,
    MaxScore,
    AnswerKey,
    Position,
}

#[derive(DeriveIden)]
enum AssignmentPrerequisites {
    #[sea_orm(iden = "assignment_prerequisites")]
    Table,
    Id,
    AssignmentId,
    PrerequisiteId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Submissions {
    #[sea_orm(iden = "submissions")]
    Table,
    Id,
    AssignmentId,
    StudentId,
    State,
    AttemptNumber,
    IsLate,
    IsResubmission,
    QuestionSet,
    Score,
    StartedAt,
    SubmittedAt,
    Active,
}

#[derive(DeriveIden)]
enum Answers {
    #[sea_orm(iden = "answers")]
    Table,
    Id,
    SubmissionId,
    QuestionId,
    Content,
    SelectedOptions,
    FilePaths,
    Score,
    IsAutoGraded,
    Feedback,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Grades {
    #[sea_orm(iden = "grades")]
    Table,
    Id,
    SourceType,
    SourceId,
    UserId,
    GraderId,
    Score,
    MaxScore,
    IsDraft,
    Feedback,
    GradedAt,
    ReleasedAt,
}

#[derive(DeriveIden)]
enum Overrides {
    #[sea_orm(iden = "overrides")]
    Table,
    Id,
    AssignmentId,
    StudentId,
    Kind,
    Value,
    Reason,
    GrantedBy,
    GrantedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum Appeals {
    #[sea_orm(iden = "appeals")]
    Table,
    Id,
    SubmissionId,
    StudentId,
    Status,
    Reason,
    Documents,
    DecidedBy,
    DecisionNote,
    CreatedAt,
    DecidedAt,
}

#[derive(DeriveIden)]
enum Enrollments {
    #[sea_orm(iden = "enrollments")]
    Table,
    Id,
    CourseId,
    StudentId,
    Status,
    JoinedAt,
}
