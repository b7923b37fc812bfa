//! Post repository
//!
//! Every feed (index, group, profile, follow) goes through one query shape:
//! posts joined with their author and group, newest first, plus a count
//! query that feeds the paginator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use super::users::display_name;
use super::DbError;
use crate::models::{short_label, Page, Paginator, PostText};

/// Post record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl std::fmt::Display for Post {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Author fields embedded in a post card
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthorRef {
    pub id: i64,
    pub username: String,
    pub display_name: String,
}

/// Group fields embedded in a post card
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GroupRef {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

/// Post with author, group and comment count for display
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub id: i64,
    pub text: String,
    pub short_text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub author: AuthorRef,
    pub group: Option<GroupRef>,
    pub comment_count: i64,
}

impl<'r> FromRow<'r, SqliteRow> for PostCard {
    fn from_row(r: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let text: String = r.try_get("text")?;
        let username: String = r.try_get("author_username")?;
        let first_name: String = r.try_get("author_first_name")?;
        let last_name: String = r.try_get("author_last_name")?;
        let group_id: Option<i64> = r.try_get("group_id")?;

        let group = match group_id {
            Some(id) => Some(GroupRef {
                id,
                title: r.try_get("group_title")?,
                slug: r.try_get("group_slug")?,
            }),
            None => None,
        };

        Ok(Self {
            id: r.try_get("id")?,
            short_text: short_label(&text),
            text,
            pub_date: r.try_get("pub_date")?,
            image: r.try_get("image")?,
            author: AuthorRef {
                id: r.try_get("author_id")?,
                display_name: display_name(&username, &first_name, &last_name),
                username,
            },
            group,
            comment_count: r.try_get("comment_count")?,
        })
    }
}

/// Fields for a new post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub text: PostText,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// What an edit does to the stored image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageUpdate {
    Keep,
    Replace(String),
    Clear,
}

/// Which posts a feed shows
#[derive(Debug, Clone, Copy)]
enum Feed {
    All,
    Group(i64),
    Author(i64),
    FollowedBy(i64),
}

impl Feed {
    fn clause(self) -> &'static str {
        match self {
            Self::All => "",
            Self::Group(_) => "WHERE p.group_id = ?",
            Self::Author(_) => "WHERE p.author_id = ?",
            Self::FollowedBy(_) => {
                "WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ?)"
            }
        }
    }

    fn param(self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::Group(id) | Self::Author(id) | Self::FollowedBy(id) => Some(id),
        }
    }
}

const CARD_SELECT: &str = r#"
    SELECT
        p.id,
        p.text,
        p.pub_date,
        p.image,
        u.id AS author_id,
        u.username AS author_username,
        u.first_name AS author_first_name,
        u.last_name AS author_last_name,
        g.id AS group_id,
        g.title AS group_title,
        g.slug AS group_slug,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

/// Post repository
pub struct PostRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PostRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, post: NewPost) -> Result<Post, DbError> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO posts (text, pub_date, author_id, group_id, image)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, text, pub_date, author_id, group_id, image
            "#,
        )
        .bind(post.text.as_str())
        .bind(Utc::now())
        .bind(post.author_id)
        .bind(post.group_id)
        .bind(post.image.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// Update text, group and image. Author and publication date never change.
    pub async fn update(
        &self,
        id: i64,
        text: &PostText,
        group_id: Option<i64>,
        image: ImageUpdate,
    ) -> Result<Post, DbError> {
        let (touch_image, new_image) = match image {
            ImageUpdate::Keep => (false, None),
            ImageUpdate::Replace(path) => (true, Some(path)),
            ImageUpdate::Clear => (true, None),
        };

        sqlx::query_as(
            r#"
            UPDATE posts
            SET text = ?,
                group_id = ?,
                image = CASE WHEN ? THEN ? ELSE image END
            WHERE id = ?
            RETURNING id, text, pub_date, author_id, group_id, image
            "#,
        )
        .bind(text.as_str())
        .bind(group_id)
        .bind(touch_image)
        .bind(new_image)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("post", id))
    }

    pub async fn get(&self, id: i64) -> Result<PostCard, DbError> {
        let sql = format!("{CARD_SELECT} WHERE p.id = ?");
        sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("post", id))
    }

    /// A post only resolves under its own author's URL.
    pub async fn get_for_author(&self, author_id: i64, id: i64) -> Result<PostCard, DbError> {
        let sql = format!("{CARD_SELECT} WHERE p.id = ? AND p.author_id = ?");
        sqlx::query_as(&sql)
            .bind(id)
            .bind(author_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("post", id))
    }

    pub async fn list_all(
        &self,
        paginator: Paginator,
        raw_page: Option<&str>,
    ) -> Result<Page<PostCard>, DbError> {
        self.list(Feed::All, paginator, raw_page).await
    }

    pub async fn list_for_group(
        &self,
        group_id: i64,
        paginator: Paginator,
        raw_page: Option<&str>,
    ) -> Result<Page<PostCard>, DbError> {
        self.list(Feed::Group(group_id), paginator, raw_page).await
    }

    pub async fn list_for_author(
        &self,
        author_id: i64,
        paginator: Paginator,
        raw_page: Option<&str>,
    ) -> Result<Page<PostCard>, DbError> {
        self.list(Feed::Author(author_id), paginator, raw_page).await
    }

    /// Posts by every author `user_id` follows.
    pub async fn list_for_follower(
        &self,
        user_id: i64,
        paginator: Paginator,
        raw_page: Option<&str>,
    ) -> Result<Page<PostCard>, DbError> {
        self.list(Feed::FollowedBy(user_id), paginator, raw_page).await
    }

    pub async fn count_for_author(&self, author_id: i64) -> Result<i64, DbError> {
        self.count(Feed::Author(author_id)).await
    }

    async fn count(&self, feed: Feed) -> Result<i64, DbError> {
        let sql = format!("SELECT COUNT(*) FROM posts p {}", feed.clause());
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(param) = feed.param() {
            query = query.bind(param);
        }
        Ok(query.fetch_one(self.pool).await?)
    }

    async fn list(
        &self,
        feed: Feed,
        paginator: Paginator,
        raw_page: Option<&str>,
    ) -> Result<Page<PostCard>, DbError> {
        let total = self.count(feed).await?;
        let position = paginator.get_page(raw_page, total);

        let sql = format!(
            "{CARD_SELECT} {} ORDER BY p.pub_date DESC, p.id DESC LIMIT ? OFFSET ?",
            feed.clause()
        );
        let mut query = sqlx::query_as::<_, PostCard>(&sql);
        if let Some(param) = feed.param() {
            query = query.bind(param);
        }
        let items = query
            .bind(position.limit())
            .bind(position.offset())
            .fetch_all(self.pool)
            .await?;

        Ok(Page::new(items, total, position))
    }
}
