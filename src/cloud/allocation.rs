//! CPU 分配策略
//!
//! 把固定容量划分给多个有上限的需求方。VM 调度器和 cloudlet 调度器
//! 共用同一个策略接口。

/// 把 `capacity` 分给 `demands`，返回与 `demands` 等长的分配结果。
///
/// 实现必须保证：每项分配不超过对应需求，且总和不超过 `capacity`。
pub trait AllocationPolicy: std::fmt::Debug + Send {
    fn allocate(&self, capacity: f64, demands: &[f64]) -> Vec<f64>;
}

/// 带上限的 max-min 公平分配（water-filling）。
///
/// 每轮把剩余容量平均分给尚未满足的需求方；需求小于份额的直接满足，
/// 多出的部分留给下一轮，直到没有可再分配的容量或所有需求方都已满足。
#[derive(Debug, Default, Clone, Copy)]
pub struct FairShare;

impl AllocationPolicy for FairShare {
    fn allocate(&self, capacity: f64, demands: &[f64]) -> Vec<f64> {
        let mut grants = vec![0.0; demands.len()];
        let capacity = capacity.max(0.0);
        let total: f64 = demands.iter().map(|d| d.max(0.0)).sum();
        if total <= capacity {
            for (g, d) in grants.iter_mut().zip(demands) {
                *g = d.max(0.0);
            }
            return grants;
        }

        // 按需求升序处理：比较小的需求先被满足，剩余容量均分给更大的需求。
        let mut order: Vec<usize> = (0..demands.len()).filter(|&i| demands[i] > 0.0).collect();
        order.sort_by(|&a, &b| demands[a].total_cmp(&demands[b]).then(a.cmp(&b)));

        let mut remaining = capacity;
        let mut left = order.len();
        for i in order {
            let share = remaining / left as f64;
            let grant = demands[i].min(share);
            grants[i] = grant;
            remaining = (remaining - grant).max(0.0);
            left -= 1;
        }
        grants
    }
}
