use super::models::{Menu, MenuItem, MenuItemRow, PageRef, UrlItem};
use super::DbPool;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::FromRow;
use tracing::debug;

/// The slice of a menu item the reordering logic needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct ItemRank {
    pub id: i64,
    pub menu_id: i64,
    pub rank: i32,
}

/// Persistence port for the ranked-list operations. Kept narrow so the
/// move logic can be exercised against an in-memory store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RankStore: Send + Sync {
    async fn item_rank(&self, item_id: i64) -> Result<Option<ItemRank>>;

    /// Sibling with the greatest rank strictly below `rank`; ties resolved
    /// toward the smallest id.
    async fn neighbor_below(&self, menu_id: i64, rank: i32) -> Result<Option<ItemRank>>;

    /// Sibling with the smallest rank strictly above `rank`; ties resolved
    /// toward the smallest id.
    async fn neighbor_above(&self, menu_id: i64, rank: i32) -> Result<Option<ItemRank>>;

    /// Exchange the rank values of two items. Both rows or neither.
    async fn swap_ranks(&self, first: ItemRank, second: ItemRank) -> Result<()>;
}

const ITEM_SELECT: &str = r#"
    SELECT
        mi.id, mi.menu_id, mi.name, mi.rank,
        mi.page_id, p.title AS page_title,
        mi.url_item_id, u.name AS url_name, u.url,
        mi.created_at
    FROM menu_items mi
    LEFT JOIN pages p ON p.id = mi.page_id
    LEFT JOIN url_items u ON u.id = mi.url_item_id
"#;

/// Append rank for a new sibling: one past the current maximum, 0 when
/// the menu is empty.
pub(crate) fn next_rank(max_rank: Option<i32>) -> i32 {
    max_rank.map_or(0, |rank| rank + 1)
}

/// Rank an item ends up with after an edit: unchanged while it stays in
/// its menu, appended at the end when it moves to another one (carrying
/// the old rank over could collide there).
pub(crate) fn rank_after_edit(
    current_menu: i64,
    current_rank: i32,
    target_menu: i64,
    max_in_target: Option<i32>,
) -> i32 {
    if current_menu == target_menu {
        current_rank
    } else {
        next_rank(max_in_target)
    }
}

pub struct Repository {
    pub pool: DbPool,
}

impl Repository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    // ---- menus -------------------------------------------------------

    pub async fn create_menu(&self, name: &str) -> Result<Menu> {
        let menu = sqlx::query_as::<_, Menu>(
            "INSERT INTO menus (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(self.pool.get_pool())
        .await?;

        Ok(menu)
    }

    pub async fn list_menus(&self) -> Result<Vec<Menu>> {
        let menus = sqlx::query_as::<_, Menu>(
            "SELECT id, name, created_at FROM menus ORDER BY name",
        )
        .fetch_all(self.pool.get_pool())
        .await?;

        Ok(menus)
    }

    pub async fn find_menu(&self, id: i64) -> Result<Option<Menu>> {
        let menu = sqlx::query_as::<_, Menu>(
            "SELECT id, name, created_at FROM menus WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.get_pool())
        .await?;

        Ok(menu)
    }

    pub async fn find_menu_by_name(&self, name: &str) -> Result<Option<Menu>> {
        let menu = sqlx::query_as::<_, Menu>(
            "SELECT id, name, created_at FROM menus WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(self.pool.get_pool())
        .await?;

        Ok(menu)
    }

    /// Deletes a menu; its items go with it (ON DELETE CASCADE).
    pub async fn delete_menu(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM menus WHERE id = $1")
            .bind(id)
            .execute(self.pool.get_pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ---- url items ---------------------------------------------------

    pub async fn list_url_items(&self) -> Result<Vec<UrlItem>> {
        let items = sqlx::query_as::<_, UrlItem>(
            "SELECT id, name, url, created_at FROM url_items ORDER BY name, url",
        )
        .fetch_all(self.pool.get_pool())
        .await?;

        Ok(items)
    }

    /// Reuses an existing (name, url) record or creates one; URL items are
    /// shared across menu items, never duplicated.
    pub async fn find_or_create_url_item(&self, name: &str, url: &str) -> Result<UrlItem> {
        let item = sqlx::query_as::<_, UrlItem>(
            r#"
            INSERT INTO url_items (name, url)
            VALUES ($1, $2)
            ON CONFLICT (name, url) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, url, created_at
            "#,
        )
        .bind(name)
        .bind(url)
        .fetch_one(self.pool.get_pool())
        .await?;

        Ok(item)
    }

    pub async fn update_url_item(&self, id: i64, name: &str, url: &str) -> Result<Option<UrlItem>> {
        let item = sqlx::query_as::<_, UrlItem>(
            r#"
            UPDATE url_items SET name = $2, url = $3
            WHERE id = $1
            RETURNING id, name, url, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(url)
        .fetch_optional(self.pool.get_pool())
        .await?;

        Ok(item)
    }

    pub async fn delete_url_item(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM url_items WHERE id = $1")
            .bind(id)
            .execute(self.pool.get_pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ---- pages (host-owned, read only) -------------------------------

    pub async fn find_page(&self, id: i64) -> Result<Option<PageRef>> {
        let page = sqlx::query_as::<_, PageRef>("SELECT id, title FROM pages WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.get_pool())
            .await?;

        Ok(page)
    }

    // ---- menu items --------------------------------------------------

    pub async fn list_items(&self, menu_id: Option<i64>) -> Result<Vec<MenuItem>> {
        let sql = format!(
            "{ITEM_SELECT} WHERE ($1::bigint IS NULL OR mi.menu_id = $1) \
             ORDER BY mi.menu_id, mi.rank, mi.id"
        );
        let rows = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(menu_id)
            .fetch_all(self.pool.get_pool())
            .await?;

        rows.into_iter().map(MenuItem::try_from).collect()
    }

    pub async fn find_item(&self, id: i64) -> Result<Option<MenuItem>> {
        let sql = format!("{ITEM_SELECT} WHERE mi.id = $1");
        let row = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool.get_pool())
            .await?;

        row.map(MenuItem::try_from).transpose()
    }

    /// Inserts an item at the end of its menu; see [`next_rank`] for the
    /// append rule. Max lookup and insert share one transaction.
    pub async fn insert_item(
        &self,
        menu_id: i64,
        name: Option<&str>,
        page_id: Option<i64>,
        url_item_id: Option<i64>,
    ) -> Result<MenuItem> {
        let mut tx = self.pool.get_pool().begin().await?;

        let max_rank: Option<i32> =
            sqlx::query_scalar("SELECT MAX(rank) FROM menu_items WHERE menu_id = $1")
                .bind(menu_id)
                .fetch_one(&mut *tx)
                .await?;

        let rank = next_rank(max_rank);

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO menu_items (menu_id, name, page_id, url_item_id, rank)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(menu_id)
        .bind(name)
        .bind(page_id)
        .bind(url_item_id)
        .bind(rank)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!("Inserted menu item {} into menu {} at rank {}", id, menu_id, rank);

        self.find_item(id)
            .await?
            .context("freshly inserted menu item vanished")
    }

    /// Updates caption, target, and owning menu; see [`rank_after_edit`]
    /// for what happens to the rank when the item changes menus.
    pub async fn update_item(
        &self,
        id: i64,
        menu_id: i64,
        name: Option<&str>,
        page_id: Option<i64>,
        url_item_id: Option<i64>,
    ) -> Result<Option<MenuItem>> {
        let mut tx = self.pool.get_pool().begin().await?;

        let current: Option<(i64, i32)> =
            sqlx::query_as("SELECT menu_id, rank FROM menu_items WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((current_menu, current_rank)) = current else {
            return Ok(None);
        };

        let max_in_target: Option<i32> =
            sqlx::query_scalar("SELECT MAX(rank) FROM menu_items WHERE menu_id = $1")
                .bind(menu_id)
                .fetch_one(&mut *tx)
                .await?;

        let rank = rank_after_edit(current_menu, current_rank, menu_id, max_in_target);

        sqlx::query(
            r#"
            UPDATE menu_items SET
                menu_id = $2, name = $3, page_id = $4, url_item_id = $5, rank = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(menu_id)
        .bind(name)
        .bind(page_id)
        .bind(url_item_id)
        .bind(rank)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_item(id).await
    }

    pub async fn delete_item(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(id)
            .execute(self.pool.get_pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RankStore for Repository {
    async fn item_rank(&self, item_id: i64) -> Result<Option<ItemRank>> {
        let item = sqlx::query_as::<_, ItemRank>(
            "SELECT id, menu_id, rank FROM menu_items WHERE id = $1",
        )
        .bind(item_id)
        .fetch_optional(self.pool.get_pool())
        .await?;

        Ok(item)
    }

    async fn neighbor_below(&self, menu_id: i64, rank: i32) -> Result<Option<ItemRank>> {
        let neighbor = sqlx::query_as::<_, ItemRank>(
            r#"
            SELECT id, menu_id, rank FROM menu_items
            WHERE menu_id = $1 AND rank < $2
            ORDER BY rank DESC, id ASC
            LIMIT 1
            "#,
        )
        .bind(menu_id)
        .bind(rank)
        .fetch_optional(self.pool.get_pool())
        .await?;

        Ok(neighbor)
    }

    async fn neighbor_above(&self, menu_id: i64, rank: i32) -> Result<Option<ItemRank>> {
        let neighbor = sqlx::query_as::<_, ItemRank>(
            r#"
            SELECT id, menu_id, rank FROM menu_items
            WHERE menu_id = $1 AND rank > $2
            ORDER BY rank ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(menu_id)
        .bind(rank)
        .fetch_optional(self.pool.get_pool())
        .await?;

        Ok(neighbor)
    }

    /// Single statement, so either both rows take the other's rank or the
    /// update fails as a whole. The per-menu unique constraint on rank is
    /// deferred, which lets the intermediate state exist inside the
    /// statement's transaction.
    async fn swap_ranks(&self, first: ItemRank, second: ItemRank) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE menu_items
            SET rank = CASE id WHEN $1 THEN $4 WHEN $3 THEN $2 END
            WHERE id IN ($1, $3)
            "#,
        )
        .bind(first.id)
        .bind(first.rank)
        .bind(second.id)
        .bind(second.rank)
        .execute(self.pool.get_pool())
        .await?;

        debug!(
            "Swapped ranks of menu items {} and {} ({} <-> {})",
            first.id, second.id, first.rank, second.rank
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_rank_in_empty_menu_is_zero() {
        assert_eq!(next_rank(None), 0);
    }

    #[test]
    fn test_append_rank_follows_current_maximum() {
        assert_eq!(next_rank(Some(0)), 1);
        assert_eq!(next_rank(Some(2)), 3);
        // gap-tolerant: appends after the max, no renumbering
        assert_eq!(next_rank(Some(7)), 8);
    }

    #[test]
    fn test_edit_within_menu_keeps_rank() {
        assert_eq!(rank_after_edit(1, 4, 1, Some(9)), 4);
    }

    #[test]
    fn test_edit_into_other_menu_appends() {
        assert_eq!(rank_after_edit(1, 4, 2, Some(1)), 2);
        assert_eq!(rank_after_edit(1, 4, 2, None), 0);
    }
}
