use crate::entities::{pastes, prelude::*};
use crate::models::{NewPaste, Owner, Paste, PasteChanges};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::debug;

/// Repository for paste rows
pub struct PasteRepository {
    conn: DatabaseConnection,
}

impl PasteRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: pastes::Model) -> Paste {
        Paste {
            id: m.id,
            title: m.title,
            content: m.content,
            language: m.language,
            is_public: m.is_public,
            views: m.views,
            expires_at: m.expires_at,
            burn_after_read: m.burn_after_read,
            owner: Owner::from_user_id(m.user_id),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    pub async fn exists(&self, id: &str) -> Result<bool> {
        let count = Pastes::find_by_id(id.to_string())
            .count(&self.conn)
            .await
            .context("Failed to check paste id")?;
        Ok(count > 0)
    }

    pub async fn insert(&self, paste: NewPaste) -> Result<Paste> {
        let active = pastes::ActiveModel {
            id: Set(paste.id),
            title: Set(paste.title),
            content: Set(paste.content),
            language: Set(paste.language),
            is_public: Set(paste.is_public),
            views: Set(0),
            expires_at: Set(paste.expires_at),
            burn_after_read: Set(paste.burn_after_read),
            user_id: Set(paste.owner.user_id()),
            created_at: Set(paste.created_at),
            updated_at: Set(paste.created_at),
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert paste")?;
        debug!("Inserted paste {}", model.id);
        Ok(Self::map_model(model))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Paste>> {
        let model = Pastes::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query paste")?;
        Ok(model.map(Self::map_model))
    }

    pub async fn update(
        &self,
        id: &str,
        changes: &PasteChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Paste>> {
        let Some(model) = Pastes::find_by_id(id.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query paste for update")?
        else {
            return Ok(None);
        };

        let mut active: pastes::ActiveModel = model.into();
        if let Some(title) = &changes.title {
            active.title = Set(Some(title.clone()));
        }
        if let Some(content) = &changes.content {
            active.content = Set(content.clone());
        }
        if let Some(language) = &changes.language {
            active.language = Set(Some(language.clone()));
        }
        if let Some(is_public) = changes.is_public {
            active.is_public = Set(is_public);
        }
        active.updated_at = Set(now);

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update paste")?;
        Ok(Some(Self::map_model(model)))
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = Pastes::delete_by_id(id.to_string())
            .exec(&self.conn)
            .await
            .context("Failed to delete paste")?;
        Ok(result.rows_affected > 0)
    }

    /// Bumps the view counter by one. With `expected_views` set the update only
    /// applies while the counter still holds that value, so a single caller
    /// wins a race on a burn-after-read paste.
    pub async fn increment_views(&self, id: &str, expected_views: Option<i64>) -> Result<bool> {
        let mut update = Pastes::update_many()
            .col_expr(
                pastes::Column::Views,
                Expr::col(pastes::Column::Views).add(1),
            )
            .filter(pastes::Column::Id.eq(id));

        if let Some(expected) = expected_views {
            update = update.filter(pastes::Column::Views.eq(expected));
        }

        let result = update
            .exec(&self.conn)
            .await
            .context("Failed to increment paste views")?;
        Ok(result.rows_affected > 0)
    }

    pub async fn list_public_recent(&self, limit: u64) -> Result<Vec<Paste>> {
        let rows = Pastes::find()
            .filter(pastes::Column::IsPublic.eq(true))
            .order_by_desc(pastes::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list recent pastes")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn list_by_owner(&self, user_id: i32, public_only: bool) -> Result<Vec<Paste>> {
        let mut query = Pastes::find().filter(pastes::Column::UserId.eq(user_id));
        if public_only {
            query = query.filter(pastes::Column::IsPublic.eq(true));
        }

        let rows = query
            .order_by_desc(pastes::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list pastes for owner")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn count_by_owner(&self, user_id: i32, is_public: bool) -> Result<u64> {
        Pastes::find()
            .filter(pastes::Column::UserId.eq(user_id))
            .filter(pastes::Column::IsPublic.eq(is_public))
            .count(&self.conn)
            .await
            .context("Failed to count pastes for owner")
    }
}
