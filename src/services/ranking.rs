//! Reordering of menu items inside one menu.
//!
//! Ranks form a strict, gap-tolerant order per menu. A move swaps the rank
//! of an item with its nearest neighbor in the requested direction, so any
//! sequence of moves only permutes the existing rank values.

use crate::database::{ItemRank, RankStore};
use crate::utils::error::ApiError;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Swapped,
    /// The item was already first (move up) or last (move down). Not an
    /// error; nothing changes.
    AtBoundary,
}

pub struct RankedListManager {
    store: Arc<dyn RankStore>,
}

impl RankedListManager {
    pub fn new(store: Arc<dyn RankStore>) -> Self {
        Self { store }
    }

    /// Move the item one place earlier in its menu by swapping ranks with
    /// the closest lower-ranked sibling.
    pub async fn decrease_rank(&self, item_id: i64) -> Result<MoveOutcome, ApiError> {
        let item = self.load(item_id).await?;
        let neighbor = self
            .store
            .neighbor_below(item.menu_id, item.rank)
            .await
            .map_err(db_err)?;
        self.swap_with(item, neighbor).await
    }

    /// Move the item one place later in its menu by swapping ranks with
    /// the closest higher-ranked sibling.
    pub async fn increase_rank(&self, item_id: i64) -> Result<MoveOutcome, ApiError> {
        let item = self.load(item_id).await?;
        let neighbor = self
            .store
            .neighbor_above(item.menu_id, item.rank)
            .await
            .map_err(db_err)?;
        self.swap_with(item, neighbor).await
    }

    async fn load(&self, item_id: i64) -> Result<ItemRank, ApiError> {
        self.store
            .item_rank(item_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| ApiError::NotFound(format!("menu item {} does not exist", item_id)))
    }

    async fn swap_with(
        &self,
        item: ItemRank,
        neighbor: Option<ItemRank>,
    ) -> Result<MoveOutcome, ApiError> {
        match neighbor {
            Some(neighbor) => {
                self.store.swap_ranks(item, neighbor).await.map_err(db_err)?;
                info!(
                    "Menu item {} moved to rank {} in menu {}",
                    item.id, neighbor.rank, item.menu_id
                );
                Ok(MoveOutcome::Swapped)
            }
            None => {
                debug!("Menu item {} is already at the boundary", item.id);
                Ok(MoveOutcome::AtBoundary)
            }
        }
    }
}

fn db_err(err: anyhow::Error) -> ApiError {
    ApiError::DatabaseError(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::MockRankStore;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// In-memory stand-in for the Postgres store, with the same neighbor
    /// and tie-break semantics as the SQL queries.
    struct MemoryStore {
        items: Mutex<Vec<ItemRank>>,
    }

    impl MemoryStore {
        fn new(items: Vec<(i64, i64, i32)>) -> Self {
            Self {
                items: Mutex::new(
                    items
                        .into_iter()
                        .map(|(id, menu_id, rank)| ItemRank { id, menu_id, rank })
                        .collect(),
                ),
            }
        }

        fn rank_of(&self, id: i64) -> i32 {
            self.items
                .lock()
                .unwrap()
                .iter()
                .find(|i| i.id == id)
                .unwrap()
                .rank
        }

        fn ranks(&self, menu_id: i64) -> Vec<i32> {
            let mut ranks: Vec<i32> = self
                .items
                .lock()
                .unwrap()
                .iter()
                .filter(|i| i.menu_id == menu_id)
                .map(|i| i.rank)
                .collect();
            ranks.sort_unstable();
            ranks
        }

        /// Item ids of a menu in display order.
        fn order(&self, menu_id: i64) -> Vec<i64> {
            let mut items: Vec<ItemRank> = self
                .items
                .lock()
                .unwrap()
                .iter()
                .filter(|i| i.menu_id == menu_id)
                .copied()
                .collect();
            items.sort_by_key(|i| (i.rank, i.id));
            items.into_iter().map(|i| i.id).collect()
        }
    }

    #[async_trait]
    impl RankStore for MemoryStore {
        async fn item_rank(&self, item_id: i64) -> Result<Option<ItemRank>> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .find(|i| i.id == item_id)
                .copied())
        }

        async fn neighbor_below(&self, menu_id: i64, rank: i32) -> Result<Option<ItemRank>> {
            let items = self.items.lock().unwrap();
            let mut candidates: Vec<ItemRank> = items
                .iter()
                .filter(|i| i.menu_id == menu_id && i.rank < rank)
                .copied()
                .collect();
            candidates.sort_by_key(|i| (std::cmp::Reverse(i.rank), i.id));
            Ok(candidates.first().copied())
        }

        async fn neighbor_above(&self, menu_id: i64, rank: i32) -> Result<Option<ItemRank>> {
            let items = self.items.lock().unwrap();
            let mut candidates: Vec<ItemRank> = items
                .iter()
                .filter(|i| i.menu_id == menu_id && i.rank > rank)
                .copied()
                .collect();
            candidates.sort_by_key(|i| (i.rank, i.id));
            Ok(candidates.first().copied())
        }

        async fn swap_ranks(&self, first: ItemRank, second: ItemRank) -> Result<()> {
            let mut items = self.items.lock().unwrap();
            for item in items.iter_mut() {
                if item.id == first.id {
                    item.rank = second.rank;
                } else if item.id == second.id {
                    item.rank = first.rank;
                }
            }
            Ok(())
        }
    }

    fn three_item_menu() -> (RankedListManager, Arc<MemoryStore>) {
        // A(1, rank 0), B(2, rank 1), C(3, rank 2) in menu 1
        let store = Arc::new(MemoryStore::new(vec![(1, 1, 0), (2, 1, 1), (3, 1, 2)]));
        (RankedListManager::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_move_down_swaps_with_next_sibling() {
        let (manager, store) = three_item_menu();

        let outcome = manager.increase_rank(2).await.unwrap();

        assert_eq!(outcome, MoveOutcome::Swapped);
        assert_eq!(store.rank_of(1), 0);
        assert_eq!(store.rank_of(2), 2);
        assert_eq!(store.rank_of(3), 1);
    }

    #[tokio::test]
    async fn test_move_down_then_up_restores_order() {
        let (manager, store) = three_item_menu();
        let before = store.order(1);

        manager.increase_rank(2).await.unwrap();
        manager.decrease_rank(2).await.unwrap();

        assert_eq!(store.order(1), before);
        assert_eq!(store.rank_of(1), 0);
        assert_eq!(store.rank_of(2), 1);
        assert_eq!(store.rank_of(3), 2);
    }

    #[tokio::test]
    async fn test_first_item_up_is_noop() {
        let (manager, store) = three_item_menu();

        let outcome = manager.decrease_rank(1).await.unwrap();

        assert_eq!(outcome, MoveOutcome::AtBoundary);
        assert_eq!(store.order(1), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_last_item_down_is_noop() {
        let (manager, store) = three_item_menu();

        let outcome = manager.increase_rank(3).await.unwrap();

        assert_eq!(outcome, MoveOutcome::AtBoundary);
        assert_eq!(store.order(1), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_moves_permute_existing_ranks() {
        // Gap-tolerant ranks: the set of values must survive any sequence
        // of moves untouched.
        let store = Arc::new(MemoryStore::new(vec![
            (1, 1, 0),
            (2, 1, 3),
            (3, 1, 7),
            (4, 1, 8),
        ]));
        let manager = RankedListManager::new(store.clone());
        let before = store.ranks(1);

        for item_id in [2, 4, 1, 3, 3, 2, 1, 4] {
            manager.increase_rank(item_id).await.unwrap();
            manager.decrease_rank(item_id).await.unwrap();
        }
        manager.increase_rank(1).await.unwrap();
        manager.decrease_rank(4).await.unwrap();

        assert_eq!(store.ranks(1), before);
    }

    #[tokio::test]
    async fn test_moves_stay_within_menu() {
        // Two menus side by side; moving in one never touches the other.
        let store = Arc::new(MemoryStore::new(vec![
            (1, 1, 0),
            (2, 1, 1),
            (10, 2, 0),
            (11, 2, 1),
        ]));
        let manager = RankedListManager::new(store.clone());

        manager.increase_rank(1).await.unwrap();

        assert_eq!(store.order(1), vec![2, 1]);
        assert_eq!(store.order(2), vec![10, 11]);
    }

    #[tokio::test]
    async fn test_duplicate_ranks_pick_smallest_id() {
        // Ranks 0, 1, 1, 2: the tie at rank 1 must resolve to id 2 both
        // times, never arbitrarily.
        let store = Arc::new(MemoryStore::new(vec![
            (1, 1, 0),
            (2, 1, 1),
            (3, 1, 1),
            (4, 1, 2),
        ]));
        let manager = RankedListManager::new(store.clone());

        manager.increase_rank(1).await.unwrap();
        assert_eq!(store.rank_of(1), 1);
        assert_eq!(store.rank_of(2), 0);
        assert_eq!(store.rank_of(3), 1);

        manager.decrease_rank(4).await.unwrap();
        assert_eq!(store.rank_of(4), 1);
        assert_eq!(store.rank_of(1), 2);
    }

    #[tokio::test]
    async fn test_unknown_item_is_not_found() {
        let (manager, _) = three_item_menu();

        let err = manager.decrease_rank(99).await.unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_store_failure_maps_to_database_error() {
        let mut store = MockRankStore::new();
        store
            .expect_item_rank()
            .returning(|_| Err(anyhow!("connection reset")));
        let manager = RankedListManager::new(Arc::new(store));

        let err = manager.increase_rank(1).await.unwrap_err();

        assert!(matches!(err, ApiError::DatabaseError(_)));
    }
}
