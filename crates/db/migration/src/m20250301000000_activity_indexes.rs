use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_activities_user_id_created_at")
                    .table(Activities::Table)
                    .col(Activities::UserId)
                    .col(Activities::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_activities_todo_id")
                    .table(Activities::Table)
                    .col(Activities::TodoId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_shared_todos_user_id")
                    .table(SharedTodos::Table)
                    .col(SharedTodos::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .name("idx_shared_todos_user_id")
                    .table(SharedTodos::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .name("idx_activities_todo_id")
                    .table(Activities::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .name("idx_activities_user_id_created_at")
                    .table(Activities::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Activities {
    Table,
    UserId,
    TodoId,
    CreatedAt,
}

#[derive(Iden)]
enum SharedTodos {
    Table,
    UserId,
}
