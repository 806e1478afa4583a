//! Dense, ID-indexed storage for model entities.
//!
//! A [`Pool`] provides O(1) insertion and lookup by opaque [`PoolId`] keys.
//! Items are only ever appended, so IDs stay stable for the lifetime of the
//! pool. Expression nodes in particular live in pools so that analysis
//! results can be stored in side tables keyed by node identity instead of
//! mutating the nodes themselves.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Trait for opaque ID types used as pool keys.
pub trait PoolId: Copy {
    /// Creates an ID from a raw `u32` index.
    fn from_raw(index: u32) -> Self;

    /// Returns the raw `u32` index.
    fn as_raw(self) -> u32;
}

/// A dense, append-only container indexed by an opaque ID type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool<I: PoolId, T> {
    items: Vec<T>,
    #[serde(skip)]
    _marker: PhantomData<I>,
}

impl<I: PoolId, T> Default for Pool<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: PoolId, T> Pool<I, T> {
    /// Creates a new, empty pool.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Appends an item to the pool and returns its ID.
    pub fn push(&mut self, item: T) -> I {
        let id = I::from_raw(self.items.len() as u32);
        self.items.push(item);
        id
    }

    /// Returns a reference to the item with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get(&self, id: I) -> &T {
        &self.items[id.as_raw() as usize]
    }

    /// Returns a mutable reference to the item with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if the ID is out of bounds.
    pub fn get_mut(&mut self, id: I) -> &mut T {
        &mut self.items[id.as_raw() as usize]
    }

    /// Returns the number of items in the pool.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the pool contains no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over `(ID, &T)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (I::from_raw(i as u32), item))
    }

    /// Iterates over `(ID, &mut T)` pairs in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (I, &mut T)> {
        self.items
            .iter_mut()
            .enumerate()
            .map(|(i, item)| (I::from_raw(i as u32), item))
    }

    /// Iterates over the IDs in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = I> {
        (0..self.items.len() as u32).map(I::from_raw)
    }

    /// Iterates over references to items in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<I: PoolId, T> Index<I> for Pool<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        self.get(id)
    }
}

impl<I: PoolId, T> IndexMut<I> for Pool<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        self.get_mut(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ExprId;

    #[test]
    fn push_and_get() {
        let mut pool: Pool<ExprId, String> = Pool::new();
        let id = pool.push("hello".to_string());
        assert_eq!(pool[id], "hello");
    }

    #[test]
    fn ids_are_sequential() {
        let mut pool: Pool<ExprId, u32> = Pool::new();
        pool.push(10);
        pool.push(20);
        let ids: Vec<u32> = pool.ids().map(|id| id.as_raw()).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn get_mut_modifies() {
        let mut pool: Pool<ExprId, u32> = Pool::new();
        let id = pool.push(1);
        *pool.get_mut(id) = 2;
        assert_eq!(pool[id], 2);
    }

    #[test]
    fn empty_pool() {
        let pool: Pool<ExprId, u32> = Pool::new();
        assert!(pool.is_empty());
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn iter_in_order() {
        let mut pool: Pool<ExprId, &str> = Pool::new();
        pool.push("a");
        pool.push("b");
        let collected: Vec<_> = pool.values().copied().collect();
        assert_eq!(collected, vec!["a", "b"]);
    }

    #[test]
    fn serde_roundtrip() {
        let mut pool: Pool<ExprId, u32> = Pool::new();
        pool.push(7);
        pool.push(8);
        let json = serde_json::to_string(&pool).unwrap();
        let back: Pool<ExprId, u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[ExprId::from_raw(1)], 8);
    }
}
