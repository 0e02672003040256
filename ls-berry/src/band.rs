//! 窄带分层存储 (Layer Store).
//!
//! 每个 layer id 对应当前被赋予该状态的网格点集合.
//! 周围的演化算法假定成员关系永远精确一致, 因此所有违例
//! (重复插入, 删除不存在的点, 从错误的层移动) 都会立即 panic,
//! 而不是被静默纠正.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{Idx, LayerId};

/// 窄带分层存储.
///
/// 内部同时维护 layer id 到点集合的正向映射与点到 layer id 的反查,
/// 两者始终一致. 集合内点的顺序没有意义.
#[derive(Clone, Debug)]
pub struct LayerStore<const D: usize> {
    /// layer id -> 成员点集合. `BTreeMap` 保证按 id 升序迭代.
    layers: BTreeMap<LayerId, HashSet<Idx<D>>>,

    /// 点 -> 所在 layer 的 O(1) 反查.
    index: HashMap<Idx<D>, LayerId>,
}

impl<const D: usize> LayerStore<D> {
    /// 以 `alphabet` 中的 layer id 创建空存储.
    ///
    /// `alphabet` 不允许重复, 否则程序 panic.
    pub fn new(alphabet: &[LayerId]) -> Self {
        let mut layers = BTreeMap::new();
        for &id in alphabet {
            let old = layers.insert(id, HashSet::new());
            assert!(old.is_none(), "layer {id} 重复");
        }
        Self {
            layers,
            index: HashMap::new(),
        }
    }

    /// 迭代 layer `id` 的当前成员. 迭代器可以重新获取 (restartable),
    /// 反映的是迭代开始前已经完成的全部修改.
    ///
    /// `id` 不在字母表内时 panic.
    #[inline]
    pub fn points_in_layer(&self, id: LayerId) -> impl Iterator<Item = &Idx<D>> + '_ {
        self.layer_set(id).iter()
    }

    /// 将 `point` 从 layer `from` 移动到 layer `to`.
    ///
    /// `point` 当前不在 `from` 中, 或者任一 id 不在字母表内时, 程序 panic.
    pub fn move_to_layer(&mut self, point: Idx<D>, from: LayerId, to: LayerId) {
        let removed = self.layer_set_mut(from).remove(&point);
        assert!(removed, "点 {point:?} 不在 layer {from} 中");

        let inserted = self.layer_set_mut(to).insert(point);
        debug_assert!(inserted);
        let old = self.index.insert(point, to);
        debug_assert_eq!(old, Some(from));
    }

    /// 将 `point` 插入 layer `id`.
    ///
    /// `point` 已经属于任何一层 (重复插入), 或 `id` 不在字母表内时, 程序 panic.
    pub fn insert(&mut self, point: Idx<D>, id: LayerId) {
        assert!(
            !self.index.contains_key(&point),
            "点 {point:?} 已在窄带中, 不可重复插入",
        );
        self.layer_set_mut(id).insert(point);
        self.index.insert(point, id);
    }

    /// 将 `point` 从 layer `id` 中删除.
    ///
    /// `point` 当前不在 `id` 中时程序 panic.
    pub fn erase(&mut self, point: Idx<D>, id: LayerId) {
        let removed = self.layer_set_mut(id).remove(&point);
        assert!(removed, "点 {point:?} 不在 layer {id} 中, 无法删除");
        let old = self.index.remove(&point);
        debug_assert_eq!(old, Some(id));
    }

    /// 查询 `point` 所在的 layer. 点不在窄带中时返回 `None`.
    #[inline]
    pub fn layer_of(&self, point: &Idx<D>) -> Option<LayerId> {
        self.index.get(point).copied()
    }

    /// `point` 是否在窄带中?
    #[inline]
    pub fn is_banded(&self, point: &Idx<D>) -> bool {
        self.index.contains_key(point)
    }

    /// layer `id` 的当前成员个数. `id` 不在字母表内时 panic.
    #[inline]
    pub fn layer_len(&self, id: LayerId) -> usize {
        self.layer_set(id).len()
    }

    /// 整个窄带的点个数.
    #[inline]
    pub fn band_len(&self) -> usize {
        self.index.len()
    }

    /// 窄带是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// 字母表 (按升序).
    #[inline]
    pub fn alphabet(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.layers.keys().copied()
    }

    #[inline]
    fn layer_set(&self, id: LayerId) -> &HashSet<Idx<D>> {
        self.layers
            .get(&id)
            .unwrap_or_else(|| panic!("layer {id} 不在字母表内"))
    }

    #[inline]
    fn layer_set_mut(&mut self, id: LayerId) -> &mut HashSet<Idx<D>> {
        self.layers
            .get_mut(&id)
            .unwrap_or_else(|| panic!("layer {id} 不在字母表内"))
    }
}

#[cfg(test)]
mod tests {
    use super::LayerStore;

    fn store() -> LayerStore<2> {
        LayerStore::new(&[-1, 1])
    }

    /// 插入 / 移动后的成员关系后置条件.
    #[test]
    fn test_move_postcondition() {
        let mut s = store();
        s.insert([2, 3], -1);
        assert_eq!(s.layer_of(&[2, 3]), Some(-1));
        assert_eq!(s.band_len(), 1);

        s.move_to_layer([2, 3], -1, 1);
        assert!(!s.points_in_layer(-1).any(|p| *p == [2, 3]));
        assert!(s.points_in_layer(1).any(|p| *p == [2, 3]));
        assert_eq!(s.layer_of(&[2, 3]), Some(1));
        assert_eq!(s.layer_len(-1), 0);
        assert_eq!(s.layer_len(1), 1);
    }

    /// 从点当前不在的层移动是逻辑错误.
    #[test]
    #[should_panic]
    fn test_move_absent_rejected() {
        let mut s = store();
        s.insert([0, 0], 1);
        s.move_to_layer([0, 0], -1, 1);
    }

    /// 重复插入是逻辑错误.
    #[test]
    #[should_panic]
    fn test_double_insert_rejected() {
        let mut s = store();
        s.insert([0, 0], 1);
        s.insert([0, 0], -1);
    }

    /// 删除不存在的点是逻辑错误.
    #[test]
    #[should_panic]
    fn test_erase_absent_rejected() {
        let mut s = store();
        s.erase([5, 5], -1);
    }

    /// 字母表外的 layer id 是逻辑错误.
    #[test]
    #[should_panic]
    fn test_unknown_layer_rejected() {
        let s = store();
        let _ = s.layer_len(0);
    }

    /// 迭代器可重新获取, 且反映迭代前的修改.
    #[test]
    fn test_points_in_layer_restartable() {
        let mut s = store();
        s.insert([0, 1], -1);
        s.insert([1, 0], -1);
        assert_eq!(s.points_in_layer(-1).count(), 2);
        assert_eq!(s.points_in_layer(-1).count(), 2);

        s.erase([0, 1], -1);
        assert_eq!(s.points_in_layer(-1).count(), 1);
        assert!(s.is_banded(&[1, 0]));
        assert!(!s.is_banded(&[0, 1]));
    }
}
