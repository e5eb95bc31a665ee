use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Users::Table)
                    .col(pk_id_col(manager, Users::Id))
                    .col(uuid_col(Users::Uuid))
                    .col(ColumnDef::new(Users::Name).string())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::EmailVerifiedAt).timestamp())
                    .col(timestamp_col(Users::CreatedAt))
                    .col(timestamp_col(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_uuid")
                    .table(Users::Table)
                    .col(Users::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Categories::Table)
                    .col(pk_id_col(manager, Categories::Id))
                    .col(uuid_col(Categories::Uuid))
                    .col(fk_id_col(manager, Categories::OwnerId))
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::Color).string_len(7).not_null())
                    .col(ColumnDef::new(Categories::Icon).string())
                    .col(timestamp_col(Categories::CreatedAt))
                    .col(timestamp_col(Categories::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_categories_owner_id")
                            .from(Categories::Table, Categories::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_categories_uuid")
                    .table(Categories::Table)
                    .col(Categories::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_categories_owner_id")
                    .table(Categories::Table)
                    .col(Categories::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Tags::Table)
                    .col(pk_id_col(manager, Tags::Id))
                    .col(uuid_col(Tags::Uuid))
                    .col(fk_id_col(manager, Tags::OwnerId))
                    .col(ColumnDef::new(Tags::Name).string().not_null())
                    .col(ColumnDef::new(Tags::Color).string_len(7).not_null())
                    .col(timestamp_col(Tags::CreatedAt))
                    .col(timestamp_col(Tags::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tags_owner_id")
                            .from(Tags::Table, Tags::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tags_uuid")
                    .table(Tags::Table)
                    .col(Tags::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tags_owner_id")
                    .table(Tags::Table)
                    .col(Tags::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Todos::Table)
                    .col(pk_id_col(manager, Todos::Id))
                    .col(uuid_col(Todos::Uuid))
                    .col(fk_id_col(manager, Todos::OwnerId))
                    .col(fk_id_nullable_col(manager, Todos::CategoryId))
                    .col(ColumnDef::new(Todos::Title).string().not_null())
                    .col(ColumnDef::new(Todos::Description).text())
                    .col(
                        ColumnDef::new(Todos::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("pending")),
                    )
                    .col(
                        ColumnDef::new(Todos::Priority)
                            .string_len(16)
                            .not_null()
                            .default(Expr::val("medium")),
                    )
                    .col(ColumnDef::new(Todos::DueDate).timestamp())
                    .col(
                        ColumnDef::new(Todos::SortOrder)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(
                        ColumnDef::new(Todos::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(Expr::val(false)),
                    )
                    .col(ColumnDef::new(Todos::DeletedAt).timestamp())
                    .col(ColumnDef::new(Todos::CompletedAt).timestamp())
                    .col(timestamp_col(Todos::CreatedAt))
                    .col(timestamp_col(Todos::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_todos_owner_id")
                            .from(Todos::Table, Todos::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_todos_category_id")
                            .from(Todos::Table, Todos::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_todos_uuid")
                    .table(Todos::Table)
                    .col(Todos::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_todos_owner_deleted_order")
                    .table(Todos::Table)
                    .col(Todos::OwnerId)
                    .col(Todos::IsDeleted)
                    .col(Todos::SortOrder)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_todos_due_date")
                    .table(Todos::Table)
                    .col(Todos::DueDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Subtasks::Table)
                    .col(pk_id_col(manager, Subtasks::Id))
                    .col(uuid_col(Subtasks::Uuid))
                    .col(fk_id_col(manager, Subtasks::TodoId))
                    .col(ColumnDef::new(Subtasks::Title).string().not_null())
                    .col(
                        ColumnDef::new(Subtasks::IsCompleted)
                            .boolean()
                            .not_null()
                            .default(Expr::val(false)),
                    )
                    .col(
                        ColumnDef::new(Subtasks::SortOrder)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(timestamp_col(Subtasks::CreatedAt))
                    .col(timestamp_col(Subtasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_subtasks_todo_id")
                            .from(Subtasks::Table, Subtasks::TodoId)
                            .to(Todos::Table, Todos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_subtasks_uuid")
                    .table(Subtasks::Table)
                    .col(Subtasks::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_subtasks_todo_id_order")
                    .table(Subtasks::Table)
                    .col(Subtasks::TodoId)
                    .col(Subtasks::SortOrder)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(TodoTags::Table)
                    .col(pk_id_col(manager, TodoTags::Id))
                    .col(uuid_col(TodoTags::Uuid))
                    .col(fk_id_col(manager, TodoTags::TodoId))
                    .col(fk_id_col(manager, TodoTags::TagId))
                    .col(timestamp_col(TodoTags::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_todo_tags_todo_id")
                            .from(TodoTags::Table, TodoTags::TodoId)
                            .to(Todos::Table, Todos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_todo_tags_tag_id")
                            .from(TodoTags::Table, TodoTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_todo_tags_uuid")
                    .table(TodoTags::Table)
                    .col(TodoTags::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_todo_tags_todo_id_tag_id")
                    .table(TodoTags::Table)
                    .col(TodoTags::TodoId)
                    .col(TodoTags::TagId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(SharedTodos::Table)
                    .col(pk_id_col(manager, SharedTodos::Id))
                    .col(uuid_col(SharedTodos::Uuid))
                    .col(fk_id_col(manager, SharedTodos::TodoId))
                    .col(fk_id_col(manager, SharedTodos::UserId))
                    .col(
                        ColumnDef::new(SharedTodos::Permission)
                            .string_len(16)
                            .not_null()
                            .default(Expr::val("view")),
                    )
                    .col(timestamp_col(SharedTodos::CreatedAt))
                    .col(timestamp_col(SharedTodos::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shared_todos_todo_id")
                            .from(SharedTodos::Table, SharedTodos::TodoId)
                            .to(Todos::Table, Todos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shared_todos_user_id")
                            .from(SharedTodos::Table, SharedTodos::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_shared_todos_uuid")
                    .table(SharedTodos::Table)
                    .col(SharedTodos::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_shared_todos_todo_id_user_id")
                    .table(SharedTodos::Table)
                    .col(SharedTodos::TodoId)
                    .col(SharedTodos::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .if_not_exists()
                    .table(Activities::Table)
                    .col(pk_id_col(manager, Activities::Id))
                    .col(uuid_col(Activities::Uuid))
                    .col(fk_id_col(manager, Activities::UserId))
                    .col(fk_id_nullable_col(manager, Activities::TodoId))
                    .col(
                        ColumnDef::new(Activities::ActivityType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Activities::Description).text().not_null())
                    .col(ColumnDef::new(Activities::Metadata).json())
                    .col(timestamp_col(Activities::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activities_user_id")
                            .from(Activities::Table, Activities::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activities_todo_id")
                            .from(Activities::Table, Activities::TodoId)
                            .to(Todos::Table, Todos::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_activities_uuid")
                    .table(Activities::Table)
                    .col(Activities::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Activities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SharedTodos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TodoTags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subtasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Todos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = id_col(manager, col);
    col.not_null().auto_increment().primary_key().to_owned()
}

fn fk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = id_col(manager, col);
    col.not_null().to_owned()
}

fn fk_id_nullable_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    id_col(manager, col)
}

// SQLite only auto-increments INTEGER primary keys.
fn id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col
}

fn uuid_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Uuid,
    Name,
    Email,
    PasswordHash,
    EmailVerifiedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Uuid,
    OwnerId,
    Name,
    Color,
    Icon,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Tags {
    Table,
    Id,
    Uuid,
    OwnerId,
    Name,
    Color,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Todos {
    Table,
    Id,
    Uuid,
    OwnerId,
    CategoryId,
    Title,
    Description,
    Status,
    Priority,
    DueDate,
    SortOrder,
    IsDeleted,
    DeletedAt,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Subtasks {
    Table,
    Id,
    Uuid,
    TodoId,
    Title,
    IsCompleted,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TodoTags {
    Table,
    Id,
    Uuid,
    TodoId,
    TagId,
    CreatedAt,
}

#[derive(Iden)]
enum SharedTodos {
    Table,
    Id,
    Uuid,
    TodoId,
    UserId,
    Permission,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Activities {
    Table,
    Id,
    Uuid,
    UserId,
    TodoId,
    ActivityType,
    Description,
    Metadata,
    CreatedAt,
}
