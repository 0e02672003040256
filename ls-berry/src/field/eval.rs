//! 窄带上的微分算子求值.
//!
//! 所有算子都基于 [`SparseLevelSet::evaluate`] 在固定小邻域上做有限差分,
//! 复杂度与 2·D 同阶, 不做任何全网格扫描. 邻居落在窄带外时,
//! 取对应一侧的饱和常量 (与 `evaluate` 相同的约定), 绝不失败;
//! 邻居落在网格外时按 replicate 方式钳制到边界.

use crate::Idx;

use super::SparseLevelSet;

/// 一次遍历即可填满的求值结果包.
///
/// 相比分别调用各个算子, 它只抓取一遍邻居值.
/// 反复独立取邻居是朴素实现的主要开销, 因此这是性能契约而不只是便利.
#[derive(Clone, Debug)]
pub struct PointData<const D: usize> {
    /// 函数值 (layer id 或饱和常量).
    pub value: f64,

    /// 中心差分梯度.
    pub gradient: [f64; D],

    /// Hessian 矩阵.
    pub hessian: [[f64; D]; D],

    /// Laplacian (Hessian 的迹).
    pub laplacian: f64,

    /// 平均曲率.
    pub mean_curvature: f64,
}

impl<const D: usize> SparseLevelSet<D> {
    /// `point` 处的函数值, 以浮点返回.
    #[inline]
    fn value_f64(&self, point: &Idx<D>) -> f64 {
        self.evaluate(point) as f64
    }

    /// 中心差分梯度. 网格边界处自动退化为钳制后的单侧差分.
    ///
    /// 越界索引是前置条件违例, 程序 panic.
    pub fn evaluate_gradient(&self, point: &Idx<D>) -> [f64; D] {
        assert!(self.check(point), "索引 {point:?} 越界");
        let mut g = [0.0; D];
        for (axis, slot) in g.iter_mut().enumerate() {
            let plus = self.value_f64(&self.clamped_offset(point, axis, 1));
            let minus = self.value_f64(&self.clamped_offset(point, axis, -1));
            *slot = (plus - minus) * 0.5;
        }
        g
    }

    /// Hessian 矩阵. 对角项用二阶中心差分, 混合项用四角模板.
    ///
    /// 越界索引是前置条件违例, 程序 panic.
    pub fn evaluate_hessian(&self, point: &Idx<D>) -> [[f64; D]; D] {
        assert!(self.check(point), "索引 {point:?} 越界");
        let center = self.value_f64(point);
        let mut h = [[0.0; D]; D];
        for i in 0..D {
            let plus = self.value_f64(&self.clamped_offset(point, i, 1));
            let minus = self.value_f64(&self.clamped_offset(point, i, -1));
            h[i][i] = plus + minus - 2.0 * center;
            for j in (i + 1)..D {
                let corner = |di: isize, dj: isize| {
                    let q = self.clamped_offset(point, i, di);
                    self.value_f64(&self.clamped_offset(&q, j, dj))
                };
                let mixed =
                    (corner(1, 1) - corner(1, -1) - corner(-1, 1) + corner(-1, -1)) * 0.25;
                h[i][j] = mixed;
                h[j][i] = mixed;
            }
        }
        h
    }

    /// Laplacian, 即 Hessian 的迹.
    ///
    /// 越界索引是前置条件违例, 程序 panic.
    pub fn evaluate_laplacian(&self, point: &Idx<D>) -> f64 {
        assert!(self.check(point), "索引 {point:?} 越界");
        let center = self.value_f64(point);
        let mut lap = 0.0;
        for axis in 0..D {
            let plus = self.value_f64(&self.clamped_offset(point, axis, 1));
            let minus = self.value_f64(&self.clamped_offset(point, axis, -1));
            lap += plus + minus - 2.0 * center;
        }
        lap
    }

    /// 平均曲率 `div(∇φ / |∇φ|)`.
    ///
    /// 梯度退化 (模长接近 0) 时按约定返回 `0.0`, 不产生除法错误.
    pub fn evaluate_mean_curvature(&self, point: &Idx<D>) -> f64 {
        let gradient = self.evaluate_gradient(point);
        let hessian = self.evaluate_hessian(point);
        mean_curvature_of(&gradient, &hessian)
    }

    /// 一次遍历填满全部求值结果.
    ///
    /// 与分别调用各算子的结果一致 (见测试), 但邻居值只取一遍.
    pub fn evaluate_all(&self, point: &Idx<D>) -> PointData<D> {
        assert!(self.check(point), "索引 {point:?} 越界");
        let value = self.value_f64(point);

        // 轴向邻居只抓取一遍, 梯度 / 对角 Hessian / Laplacian 共享.
        let mut plus = [0.0; D];
        let mut minus = [0.0; D];
        for axis in 0..D {
            plus[axis] = self.value_f64(&self.clamped_offset(point, axis, 1));
            minus[axis] = self.value_f64(&self.clamped_offset(point, axis, -1));
        }

        let mut gradient = [0.0; D];
        let mut hessian = [[0.0; D]; D];
        let mut laplacian = 0.0;
        for i in 0..D {
            gradient[i] = (plus[i] - minus[i]) * 0.5;
            hessian[i][i] = plus[i] + minus[i] - 2.0 * value;
            laplacian += hessian[i][i];
            for j in (i + 1)..D {
                let corner = |di: isize, dj: isize| {
                    let q = self.clamped_offset(point, i, di);
                    self.value_f64(&self.clamped_offset(&q, j, dj))
                };
                let mixed =
                    (corner(1, 1) - corner(1, -1) - corner(-1, 1) + corner(-1, -1)) * 0.25;
                hessian[i][j] = mixed;
                hessian[j][i] = mixed;
            }
        }

        PointData {
            value,
            gradient,
            hessian,
            laplacian,
            mean_curvature: mean_curvature_of(&gradient, &hessian),
        }
    }
}

/// 由梯度与 Hessian 计算平均曲率.
fn mean_curvature_of<const D: usize>(gradient: &[f64; D], hessian: &[[f64; D]; D]) -> f64 {
    let norm_sq: f64 = gradient.iter().map(|g| g * g).sum();
    if norm_sq < 1e-12 {
        return 0.0;
    }
    let mut numerator = 0.0;
    for i in 0..D {
        numerator += hessian[i][i] * (norm_sq - gradient[i] * gradient[i]);
        for j in (i + 1)..D {
            numerator -= 2.0 * gradient[i] * gradient[j] * hessian[i][j];
        }
    }
    numerator / norm_sq.powf(1.5)
}

#[cfg(test)]
mod tests {
    use ndarray::ArrayD;

    use super::super::SparseLevelSet;
    use crate::consts::BandScheme;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    fn seed_field() -> SparseLevelSet<2> {
        let mut m = ArrayD::<u8>::zeros(ndarray::IxDyn(&[5, 5]));
        m[[2, 2]] = 1;
        SparseLevelSet::from_mask(m.view(), BandScheme::TwoLayer)
    }

    /// 入带点的值在字母表范围内, 窄带外等于正确一侧的饱和值.
    #[test]
    fn test_value_range_and_sentinel() {
        let f = seed_field();
        let alphabet = f.scheme().alphabet();
        for h in 0..5 {
            for w in 0..5 {
                let v = f.evaluate(&[h, w]);
                if f.is_banded(&[h, w]) {
                    assert!(alphabet.contains(&v), "({h}, {w}) -> {v}");
                } else {
                    assert_eq!(v, 3, "({h}, {w})");
                }
            }
        }
    }

    /// 种子点处的 Laplacian: 每个轴贡献 `1 + 1 - 2·(-1) = 4`.
    #[test]
    fn test_laplacian_at_seed() {
        let f = seed_field();
        assert!(f64_eq(f.evaluate_laplacian(&[2, 2]), 8.0));
    }

    /// 梯度: 中心差分与边界钳制.
    #[test]
    fn test_gradient() {
        let f = seed_field();
        // [1, 2] 上方是饱和外部 (3), 下方是种子 (-1).
        let g = f.evaluate_gradient(&[1, 2]);
        assert!(f64_eq(g[0], (-1.0 - 3.0) * 0.5));
        assert!(f64_eq(g[1], 0.0));

        // 角点: 钳制后差分仍有定义.
        let g = f.evaluate_gradient(&[0, 0]);
        assert!(f64_eq(g[0], 0.0));
        assert!(f64_eq(g[1], 0.0));
    }

    /// `evaluate_all` 与各独立算子结果一致.
    #[test]
    fn test_evaluate_all_consistent() {
        let f = seed_field();
        for h in 0..5 {
            for w in 0..5 {
                let p = [h, w];
                let all = f.evaluate_all(&p);
                assert!(f64_eq(all.value, f.evaluate(&p) as f64));
                let g = f.evaluate_gradient(&p);
                let hess = f.evaluate_hessian(&p);
                for i in 0..2 {
                    assert!(f64_eq(all.gradient[i], g[i]));
                    for j in 0..2 {
                        assert!(f64_eq(all.hessian[i][j], hess[i][j]));
                    }
                }
                assert!(f64_eq(all.laplacian, f.evaluate_laplacian(&p)));
                assert!(f64_eq(all.mean_curvature, f.evaluate_mean_curvature(&p)));
            }
        }
    }

    /// 梯度退化时平均曲率按约定为 0.
    #[test]
    fn test_flat_mean_curvature() {
        let f = SparseLevelSet::<2>::empty([4, 4], BandScheme::TwoLayer);
        assert!(f64_eq(f.evaluate_mean_curvature(&[1, 1]), 0.0));
    }
}
