//! 内部区域的 run-length 存储.
//!
//! 稀疏表示不按点存储水平集函数值, 但远离窄带的点仍然必须能稳定回答
//! "在内部还是外部". 我们沿最后一维把内部点压缩成半开区间
//! (原始实现中以行程线段组织的 label 对象的对应物),
//! 内存规模与区间个数同阶, 即与窄带同阶.

use std::collections::HashMap;

use crate::Idx;

/// 行 key: 将索引最后一维清零后的索引.
#[inline]
fn line_key<const D: usize>(mut p: Idx<D>) -> Idx<D> {
    p[D - 1] = 0;
    p
}

/// 内部 (水平集函数为负) 区域的 run-length 集合.
#[derive(Clone, Debug, Default)]
pub struct InteriorRuns<const D: usize> {
    /// 行 key -> 按起点升序排列的互不相交半开区间 `[start, end)`.
    lines: HashMap<Idx<D>, Vec<(usize, usize)>>,
}

impl<const D: usize> InteriorRuns<D> {
    /// 创建空集合.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// `point` 是否属于内部区域?
    pub fn contains(&self, point: &Idx<D>) -> bool {
        let Some(runs) = self.lines.get(&line_key(*point)) else {
            return false;
        };
        let w = point[D - 1];
        // 找到起点不超过 w 的最后一个区间.
        match runs.partition_point(|&(start, _)| start <= w) {
            0 => false,
            i => w < runs[i - 1].1,
        }
    }

    /// 将 `point` 加入内部区域. 重复加入是逻辑错误, 程序 panic.
    pub fn insert(&mut self, point: Idx<D>) {
        let w = point[D - 1];
        let runs = self.lines.entry(line_key(point)).or_default();
        let i = runs.partition_point(|&(start, _)| start <= w);
        assert!(
            i == 0 || w >= runs[i - 1].1,
            "点 {point:?} 已属于内部区域",
        );

        let joins_prev = i > 0 && runs[i - 1].1 == w;
        let joins_next = i < runs.len() && runs[i].0 == w + 1;
        match (joins_prev, joins_next) {
            (true, true) => {
                // 两个区间被连接成一个.
                runs[i - 1].1 = runs[i].1;
                runs.remove(i);
            }
            (true, false) => runs[i - 1].1 = w + 1,
            (false, true) => runs[i].0 = w,
            (false, false) => runs.insert(i, (w, w + 1)),
        }
    }

    /// 将 `point` 移出内部区域. `point` 不在内部时是逻辑错误, 程序 panic.
    pub fn remove(&mut self, point: Idx<D>) {
        let w = point[D - 1];
        let key = line_key(point);
        let runs = self
            .lines
            .get_mut(&key)
            .unwrap_or_else(|| panic!("点 {point:?} 不属于内部区域"));
        let i = runs.partition_point(|&(start, _)| start <= w);
        assert!(i > 0 && w < runs[i - 1].1, "点 {point:?} 不属于内部区域");

        let (start, end) = runs[i - 1];
        match (w == start, w + 1 == end) {
            (true, true) => {
                runs.remove(i - 1);
            }
            (true, false) => runs[i - 1].0 = w + 1,
            (false, true) => runs[i - 1].1 = w,
            (false, false) => {
                // 区间被切成两半.
                runs[i - 1].1 = w;
                runs.insert(i, (w + 1, end));
            }
        }
        if runs.is_empty() {
            self.lines.remove(&key);
        }
    }

    /// 内部区域的点总数.
    pub fn len(&self) -> usize {
        self.lines
            .values()
            .flat_map(|runs| runs.iter().map(|&(s, e)| e - s))
            .sum()
    }

    /// 内部区域是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 当前保存的区间总个数 (容量诊断用).
    #[inline]
    pub fn run_count(&self) -> usize {
        self.lines.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::InteriorRuns;

    /// 插入相邻点时区间会被合并.
    #[test]
    fn test_insert_merges_runs() {
        let mut r = InteriorRuns::<2>::new();
        r.insert([0, 0]);
        r.insert([0, 2]);
        assert_eq!(r.run_count(), 2);
        assert_eq!(r.len(), 2);

        r.insert([0, 1]);
        assert_eq!(r.run_count(), 1);
        assert_eq!(r.len(), 3);
        for w in 0..3 {
            assert!(r.contains(&[0, w]));
        }
        assert!(!r.contains(&[0, 3]));
        assert!(!r.contains(&[1, 0]));
    }

    /// 删除区间中部的点会切分区间.
    #[test]
    fn test_remove_splits_runs() {
        let mut r = InteriorRuns::<2>::new();
        for w in 0..5 {
            r.insert([3, w]);
        }
        assert_eq!(r.run_count(), 1);

        r.remove([3, 2]);
        assert_eq!(r.run_count(), 2);
        assert!(r.contains(&[3, 1]));
        assert!(!r.contains(&[3, 2]));
        assert!(r.contains(&[3, 3]));

        r.remove([3, 0]);
        r.remove([3, 1]);
        r.remove([3, 3]);
        r.remove([3, 4]);
        assert!(r.is_empty());
    }

    /// 重复插入是逻辑错误.
    #[test]
    #[should_panic]
    fn test_double_insert_rejected() {
        let mut r = InteriorRuns::<2>::new();
        r.insert([0, 0]);
        r.insert([0, 0]);
    }

    /// 删除不存在的点是逻辑错误.
    #[test]
    #[should_panic]
    fn test_remove_absent_rejected() {
        let mut r = InteriorRuns::<3>::new();
        r.insert([0, 0, 1]);
        r.remove([0, 0, 0]);
    }
}
