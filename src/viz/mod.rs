//! 时间线记录
//!
//! 仿真过程中记录 VM 放置/销毁、cloudlet 开始/结束以及每次重新分配后的
//! VM 份额，结束后整体写成一个 JSON 数组，供离线回放或画图。
//! 第一条总是 `meta`，描述主机和 VM 的静态配置。

mod types;

pub use types::{VizEvent, VizEventKind, VizHostInfo, VizLogger, VizVmInfo};
