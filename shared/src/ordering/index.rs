//! Order Index Model
//!
//! 容器内兄弟实体（看板上的列、列中的卡片）的 `order` 必须是 `0..n-1` 的稠密排列。
//! 所有创建、删除、移动都通过这里的重编号原语得到新的顺序。

use serde::{Deserialize, Serialize};

use crate::models::{Card, Column};

/// An entity that sorts among its siblings by an explicit `order`
pub trait Ordered {
    fn id(&self) -> i64;
    fn order(&self) -> i64;
    fn set_order(&mut self, order: i64);
}

impl Ordered for Column {
    fn id(&self) -> i64 {
        self.id
    }
    fn order(&self) -> i64 {
        self.order
    }
    fn set_order(&mut self, order: i64) {
        self.order = order;
    }
}

impl Ordered for Card {
    fn id(&self) -> i64 {
        self.id
    }
    fn order(&self) -> i64 {
        self.order
    }
    fn set_order(&mut self, order: i64) {
        self.order = order;
    }
}

/// `(id, newOrder)` pair produced by renumbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderAssignment {
    pub id: i64,
    pub order: i64,
}

/// Assign `0..n-1` by position, in the given order
pub fn renumber<T: Ordered>(items: &[T]) -> Vec<OrderAssignment> {
    items
        .iter()
        .enumerate()
        .map(|(pos, item)| OrderAssignment {
            id: item.id(),
            order: pos as i64,
        })
        .collect()
}

/// Like [`renumber`], but only the entities whose order actually moves
pub fn changed_assignments<T: Ordered>(items: &[T]) -> Vec<OrderAssignment> {
    items
        .iter()
        .enumerate()
        .filter(|(pos, item)| item.order() != *pos as i64)
        .map(|(pos, item)| OrderAssignment {
            id: item.id(),
            order: pos as i64,
        })
        .collect()
}

/// Overwrite each item's order with its position
pub fn renumber_in_place<T: Ordered>(items: &mut [T]) {
    for (pos, item) in items.iter_mut().enumerate() {
        item.set_order(pos as i64);
    }
}

/// Stable sort by `(order, id)`
///
/// Storage hands siblings back unordered, and after a last-write-wins race two
/// siblings can share an order; the id tiebreak keeps every reader agreeing.
pub fn sort_by_order<T: Ordered>(items: &mut [T]) {
    items.sort_by_key(|item| (item.order(), item.id()));
}

/// Whether `orders` is exactly a permutation of `0..n-1`
pub fn is_dense(orders: impl IntoIterator<Item = i64>) -> bool {
    let mut orders: Vec<i64> = orders.into_iter().collect();
    orders.sort_unstable();
    orders.iter().enumerate().all(|(pos, order)| *order == pos as i64)
}

/// Order assigned to an entity appended to a container of `len` siblings
#[inline]
pub fn append_order(len: usize) -> i64 {
    len as i64
}
