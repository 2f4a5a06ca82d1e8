//! 云仿真事件
//!
//! 每个事件都把世界向下转型为 `CloudWorld`，然后交给对应的处理函数。

use super::cloud_world::CloudWorld;
use super::id::{CloudletId, VmId};
use crate::error::SimError;
use crate::sim::{Event, Simulator, World};
use tracing::trace;

fn cloud_world(world: &mut dyn World) -> &mut CloudWorld {
    world
        .as_any_mut()
        .downcast_mut::<CloudWorld>()
        .expect("world must be CloudWorld")
}

/// 事件：经纪人把 VM 放到主机上，并把 cloudlet 分配给 VM。
#[derive(Debug)]
pub struct CreateVms;

impl Event for CreateVms {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> Result<(), SimError> {
        trace!("CreateVms::execute");
        cloud_world(world).on_create_vms(sim)
    }
}

/// 事件：cloudlet 到达 VM，开始执行。
#[derive(Debug)]
pub struct CloudletArrive {
    pub vm: VmId,
    pub cloudlet: CloudletId,
}

impl Event for CloudletArrive {
    #[tracing::instrument(skip(self, sim, world), fields(vm = self.vm.0, cloudlet = self.cloudlet.0))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> Result<(), SimError> {
        let CloudletArrive { vm, cloudlet } = *self;
        cloud_world(world).on_cloudlet_arrive(vm, cloudlet, sim)
    }
}

/// 事件：按当前份额推算出的 cloudlet 完成时刻。份额变化时会被取消并重新调度。
#[derive(Debug)]
pub struct CloudletFinish {
    pub vm: VmId,
    pub cloudlet: CloudletId,
}

impl Event for CloudletFinish {
    #[tracing::instrument(skip(self, sim, world), fields(vm = self.vm.0, cloudlet = self.cloudlet.0))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> Result<(), SimError> {
        let CloudletFinish { vm, cloudlet } = *self;
        cloud_world(world).on_cloudlet_finish(vm, cloudlet, sim)
    }
}

/// 事件：销毁 VM（其上未完成的 cloudlet 失败）。
#[derive(Debug)]
pub struct DestroyVm {
    pub vm: VmId,
}

impl Event for DestroyVm {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> Result<(), SimError> {
        cloud_world(world).on_destroy_vm(self.vm, sim)
    }
}

/// 事件：取消一个 cloudlet。
#[derive(Debug)]
pub struct CancelCloudlet {
    pub cloudlet: CloudletId,
}

impl Event for CancelCloudlet {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) -> Result<(), SimError> {
        cloud_world(world).on_cancel_cloudlet(self.cloudlet, sim)
    }
}
