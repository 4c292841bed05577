use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::models::user::{CreateUserRequest, UpdateUserRequest, UserDto, UserListQuery};
use crate::services::access::Identity;
use crate::utils::password::hash_password;
use crate::utils::search::contains_pattern;
use chrono::Utc;
use sea_orm::sea_query::{Condition, Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{error, info};
use validator::Validate;

/// Well-known id of the system account that inherits a deleted user's content.
pub const DELETED_USER_ID: i32 = 1;
pub const DELETED_USERNAME: &str = "deleted";
pub const DELETED_EMAIL: &str = "deleted@system.local";

const DUPLICATE_USER: &str = "Username or email already exists.";

/// What an anonymization moved or removed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnonymizeSummary {
    pub movies_reassigned: u64,
    pub reviews_reassigned: u64,
    pub refresh_tokens_removed: u64,
}

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Admin-only. `q` matches username or email, case-insensitively.
    pub async fn list(
        &self,
        query: &UserListQuery,
        identity: &Identity,
    ) -> Result<Vec<UserDto>, AppError> {
        identity.require_admin("Only administrators can list users.")?;

        let mut select = Users::find();
        if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = contains_pattern(q);
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((Users, users::Column::Username))))
                            .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((Users, users::Column::Email))))
                            .like(pattern),
                    ),
            );
        }

        Ok(select
            .order_by_asc(users::Column::Username)
            .all(&self.db)
            .await?
            .into_iter()
            .map(UserDto::from)
            .collect())
    }

    pub async fn get(&self, id: i32, identity: &Identity) -> Result<UserDto, AppError> {
        identity.require_user_id()?;
        let user = self.find(id).await?;
        identity.require_can_modify(user.id, "You can only view your own profile.")?;
        Ok(user.into())
    }

    pub async fn me(&self, identity: &Identity) -> Result<UserDto, AppError> {
        let user_id = identity.require_user_id()?;
        Ok(self.find(user_id).await?.into())
    }

    pub async fn create(
        &self,
        req: CreateUserRequest,
        identity: &Identity,
    ) -> Result<UserDto, AppError> {
        identity.require_admin("Only administrators can create users.")?;
        req.validate()?;

        let username = req.username.trim().to_string();
        let email = req.email.trim().to_string();
        ensure_unique(&self.db, &username, &email, None).await?;

        let password_hash = req
            .password
            .as_deref()
            .map(hash_password)
            .transpose()?;

        let user = users::ActiveModel {
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(req.role.unwrap_or_default()),
            is_system: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| AppError::on_write(e, DUPLICATE_USER))?;

        info!("👤 User {} '{}' created as {:?}", user.id, user.username, user.role);
        Ok(user.into())
    }

    pub async fn update(
        &self,
        id: i32,
        req: UpdateUserRequest,
        identity: &Identity,
    ) -> Result<UserDto, AppError> {
        identity.require_user_id()?;
        let user = self.find(id).await?;
        if user.is_system {
            return Err(AppError::ForbiddenOperation(
                "The system user cannot be modified.".to_string(),
            ));
        }
        identity.require_can_modify(user.id, "You can only update your own profile.")?;
        req.validate()?;

        if let Some(role) = req.role {
            if role != user.role && !identity.is_admin() {
                return Err(AppError::Forbidden(
                    "Only administrators can change roles.".to_string(),
                ));
            }
        }

        let username = req.username.trim().to_string();
        let email = req.email.trim().to_string();
        ensure_unique(&self.db, &username, &email, Some(id)).await?;

        let mut active: users::ActiveModel = user.into();
        active.username = Set(username);
        active.email = Set(email);
        if let Some(role) = req.role {
            active.role = Set(role);
        }
        if let Some(password) = req.password.as_deref() {
            active.password_hash = Set(Some(hash_password(password)?));
        }

        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| AppError::on_write(e, DUPLICATE_USER))?;

        Ok(updated.into())
    }

    /// Admin-only entry point for removing a user.
    pub async fn delete(&self, id: i32, identity: &Identity) -> Result<(), AppError> {
        identity.require_admin("Only administrators can delete users.")?;
        self.anonymize_and_delete(id).await.map(|_| ())
    }

    /// Hands the user's movies and reviews to the system account, drops their refresh
    /// tokens and deletes the account, all in one transaction.
    pub async fn anonymize_and_delete(&self, id: i32) -> Result<AnonymizeSummary, AppError> {
        let user = self.find(id).await?;
        if user.id == DELETED_USER_ID || user.is_system {
            return Err(AppError::ForbiddenOperation(
                "The system user cannot be deleted.".to_string(),
            ));
        }

        let sentinel = Users::find_by_id(DELETED_USER_ID)
            .filter(users::Column::IsSystem.eq(true))
            .one(&self.db)
            .await?;
        if sentinel.is_none() {
            error!("System user {} is missing; refusing to delete user {}", DELETED_USER_ID, id);
            return Err(AppError::Internal(
                "System user for deleted accounts is not seeded".to_string(),
            ));
        }

        let txn = self.db.begin().await?;
        let summary = reassign_and_remove(&txn, id).await?;
        txn.commit().await?;

        info!(
            "🧹 User {} anonymized: {} movie(s), {} review(s) reassigned, {} token(s) removed",
            id, summary.movies_reassigned, summary.reviews_reassigned, summary.refresh_tokens_removed
        );
        Ok(summary)
    }

    async fn find(&self, id: i32) -> Result<users::Model, AppError> {
        Users::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

/// The write half of anonymization. Callers own the transaction; nothing here commits.
pub async fn reassign_and_remove<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> Result<AnonymizeSummary, AppError> {
    let movies_reassigned = Movies::update_many()
        .col_expr(movies::Column::UploadedByUserId, Expr::value(DELETED_USER_ID))
        .filter(movies::Column::UploadedByUserId.eq(user_id))
        .exec(conn)
        .await?
        .rows_affected;

    let reviews_reassigned = Reviews::update_many()
        .col_expr(reviews::Column::UserId, Expr::value(DELETED_USER_ID))
        .filter(reviews::Column::UserId.eq(user_id))
        .exec(conn)
        .await?
        .rows_affected;

    let refresh_tokens_removed = RefreshTokens::delete_many()
        .filter(refresh_tokens::Column::UserId.eq(user_id))
        .exec(conn)
        .await?
        .rows_affected;

    let removed = Users::delete_by_id(user_id).exec(conn).await?.rows_affected;
    if removed != 1 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(AnonymizeSummary {
        movies_reassigned,
        reviews_reassigned,
        refresh_tokens_removed,
    })
}

pub(crate) async fn ensure_unique<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    email: &str,
    exclude_id: Option<i32>,
) -> Result<(), AppError> {
    let mut select = Users::find().filter(
        Condition::any()
            .add(
                Expr::expr(Func::lower(Expr::col((Users, users::Column::Username))))
                    .eq(Func::lower(Expr::val(username))),
            )
            .add(
                Expr::expr(Func::lower(Expr::col((Users, users::Column::Email))))
                    .eq(Func::lower(Expr::val(email))),
            ),
    );
    if let Some(id) = exclude_id {
        select = select.filter(users::Column::Id.ne(id));
    }

    if select.count(conn).await? > 0 {
        return Err(AppError::Conflict(DUPLICATE_USER.to_string()));
    }
    Ok(())
}
