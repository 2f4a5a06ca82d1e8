use crate::cloud::{
    Cloudlet, CloudletAssignment, CloudletId, CloudletSpec, Datacenter, FirstAvailable, FirstFit,
    HostId, HostSpec, PlacementPolicy, RoundRobin, Vm, VmId, VmSpec, WorstFit,
};
use crate::sim::SimTime;

fn two_hosts() -> Datacenter {
    let spec = HostSpec {
        pes: 4,
        pe_mips: 1000.0,
        ram: 4096,
        bw: 10_000,
        storage: 100_000,
    };
    Datacenter::new(&[spec.clone(), spec])
}

fn vm(id: usize) -> Vm {
    Vm::new(
        VmId(id),
        VmSpec {
            ram: 512,
            ..VmSpec::new(2, 1000.0)
        },
    )
}

fn place_all(policy: &dyn PlacementPolicy, n: usize) -> Vec<HostId> {
    let mut dc = two_hosts();
    (0..n)
        .map(|i| {
            dc.place_vm(vm(i), policy, SimTime::ZERO)
                .expect("placement succeeds")
        })
        .collect()
}

#[test]
fn first_fit_packs_the_first_host() {
    assert_eq!(place_all(&FirstFit, 3), vec![HostId(0), HostId(0), HostId(0)]);
}

#[test]
fn worst_fit_spreads_vms_across_hosts() {
    assert_eq!(
        place_all(&WorstFit, 3),
        vec![HostId(0), HostId(1), HostId(0)]
    );
}

#[test]
fn rejected_vm_stays_visible_with_rejected_state() {
    let mut dc = two_hosts();
    let huge = Vm::new(VmId(0), VmSpec::new(16, 1000.0));
    assert!(dc.place_vm(huge, &FirstFit, SimTime::ZERO).is_err());
    let stored = dc.vm(VmId(0)).expect("vm recorded");
    assert_eq!(stored.state(), crate::cloud::VmState::Rejected);
    assert_eq!(stored.host(), None);
    assert!(dc.running_vms().is_empty());
}

fn vms() -> Vec<Vm> {
    vec![
        Vm::new(VmId(0), VmSpec::new(2, 1000.0)),
        Vm::new(VmId(1), VmSpec::new(4, 1000.0)),
    ]
}

#[test]
fn round_robin_cycles_and_skips_vms_without_enough_pes() {
    let vms = vms();
    let refs: Vec<&Vm> = vms.iter().collect();
    let mut rr = RoundRobin::default();

    let one_pe = CloudletSpec::new(100, 1);
    let picks: Vec<_> = (0..3).map(|_| rr.select_vm(&one_pe, &refs)).collect();
    assert_eq!(picks, vec![Some(VmId(0)), Some(VmId(1)), Some(VmId(0))]);

    let wide = CloudletSpec::new(100, 4);
    assert_eq!(rr.select_vm(&wide, &refs), Some(VmId(1)));
    assert_eq!(rr.select_vm(&wide, &refs), Some(VmId(1)));

    let too_wide = CloudletSpec::new(100, 8);
    assert_eq!(rr.select_vm(&too_wide, &refs), None);
    assert_eq!(rr.select_vm(&one_pe, &[]), None);
}

#[test]
fn first_available_prefers_the_least_loaded_vm() {
    let mut vms = vms();
    let mut fa = FirstAvailable;
    let spec = CloudletSpec::new(100, 1);

    {
        let refs: Vec<&Vm> = vms.iter().collect();
        assert_eq!(fa.select_vm(&spec, &refs), Some(VmId(0)));
    }

    vms[0]
        .scheduler
        .submit(Cloudlet::new(CloudletId(0), spec.clone()));
    let refs: Vec<&Vm> = vms.iter().collect();
    assert_eq!(fa.select_vm(&spec, &refs), Some(VmId(1)));
}
