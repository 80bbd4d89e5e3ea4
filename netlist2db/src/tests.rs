use approx::assert_relative_eq;
use test_log::test;

use crate::db::{Database, IoType};
use crate::mem::{MemDb, MemDbError, MemNetwork};
use crate::netlist::PortDirection;
use crate::translate;
use crate::units::{dbu_to_meters, meters_to_dbu};

/// A single DFF clocked from a top-level `clk` port.
fn dff_network() -> MemNetwork {
    let mut network = MemNetwork::new("chip_top");
    let dff = network.add_cell("DFF");
    let u1 = network.add_instance(network.top(), dff, "u1");
    let clk = network.add_net(network.top(), "clk");
    network.add_port(clk, "clk", PortDirection::Input);
    network.add_pin(u1, clk, "CK");
    network
}

fn dff_db() -> MemDb {
    let mut db = MemDb::new();
    let lib = db.add_lib("stdcells");
    let dff = db.add_master(lib, "DFF");
    db.add_mterm(dff, "CK");
    db
}

#[test]
fn flattens_dff_clock_into_block() {
    let network = dff_network();
    let mut db = dff_db();
    translate(&network, &mut db).unwrap();

    let block = db.blocks()[0];
    assert_eq!(db.block_name(block), "chip_top");
    assert_eq!(db.block_divider(block), '/');
    assert_eq!(db.bus_delimiters(block), Some(('[', ']')));

    let insts = db.block_insts(block);
    assert_eq!(insts.len(), 1);
    assert_eq!(db.inst_name(insts[0]), "u1");
    let master = db.inst_master(insts[0]).unwrap();
    assert_eq!(db.master_name(master), "DFF");

    let nets = db.block_nets(block);
    assert_eq!(nets.len(), 1);
    assert_eq!(db.net_name(nets[0]), "clk");
    let iterms = db.net_iterms(nets[0]);
    assert_eq!(iterms.len(), 1);
    assert_eq!(iterms[0].0, insts[0]);
    assert_eq!(db.mterm_name(iterms[0].1), "CK");

    let bterm = db.find_bterm(block, "clk").unwrap();
    assert_eq!(db.bterm_io(bterm), IoType::Input);
    assert_eq!(db.net_bterms(nets[0]), &[bterm]);
}

#[test]
fn components_are_named_by_hierarchical_path() {
    let mut network = MemNetwork::new("top");
    let buf = network.add_cell("BUF");
    let sub = network.add_cell("sub");
    let mid = network.add_instance(network.top(), sub, "mid");
    network.add_instance(network.top(), buf, "u0");
    network.add_instance(mid, buf, "u1");

    let mut db = MemDb::new();
    let lib = db.add_lib("stdcells");
    db.add_master(lib, "BUF");
    translate(&network, &mut db).unwrap();

    let block = db.blocks()[0];
    let names: Vec<_> = db
        .block_insts(block)
        .iter()
        .map(|&inst| db.inst_name(inst).clone())
        .collect();
    assert_eq!(names, vec!["u0", "mid/u1"]);
}

#[test]
fn master_resolution_is_cached() {
    let mut network = MemNetwork::new("top");
    let inv = network.add_cell("INV");
    network.add_instance(network.top(), inv, "u0");
    network.add_instance(network.top(), inv, "u1");
    network.add_instance(network.top(), inv, "u2");

    let mut db = MemDb::new();
    let lib = db.add_lib("stdcells");
    let master = db.add_master(lib, "INV");
    translate(&network, &mut db).unwrap();

    // One scan resolves the cell; the other two instances hit the cache.
    assert_eq!(db.master_lookups(), 1);
    let block = db.blocks()[0];
    for inst in db.block_insts(block) {
        assert_eq!(db.inst_master(inst), Some(master));
    }
}

#[test]
fn libraries_scan_in_load_order() {
    let mut network = MemNetwork::new("top");
    let inv = network.add_cell("INV");
    network.add_instance(network.top(), inv, "u0");

    let mut db = MemDb::new();
    let first = db.add_lib("first");
    let second = db.add_lib("second");
    let expected = db.add_master(first, "INV");
    db.add_master(second, "INV");
    translate(&network, &mut db).unwrap();

    let block = db.blocks()[0];
    let inst = db.block_insts(block)[0];
    assert_eq!(db.inst_master(inst), Some(expected));
}

#[test]
fn unresolved_masters_leave_null_instances() {
    let network = dff_network();
    // No libraries loaded, so DFF cannot resolve.
    let mut db = MemDb::new();
    translate(&network, &mut db).unwrap();

    let block = db.blocks()[0];
    let inst = db.block_insts(block)[0];
    assert_eq!(db.inst_master(inst), None);

    // The net is still created; only the unresolvable connection drops.
    let nets = db.block_nets(block);
    assert_eq!(nets.len(), 1);
    assert!(db.net_iterms(nets[0]).is_empty());
    assert!(db.find_bterm(block, "clk").is_some());
}

#[test]
fn unknown_master_terminals_drop_connections() {
    let network = dff_network();
    let mut db = MemDb::new();
    let lib = db.add_lib("stdcells");
    // DFF resolves, but has no terminal named CK.
    db.add_master(lib, "DFF");
    translate(&network, &mut db).unwrap();

    let block = db.blocks()[0];
    let nets = db.block_nets(block);
    assert_eq!(nets.len(), 1);
    assert!(db.net_iterms(nets[0]).is_empty());
}

#[test]
fn port_directions_map_to_io_types() {
    let cases = [
        (PortDirection::Input, IoType::Input),
        (PortDirection::Output, IoType::Output),
        (PortDirection::Bidirectional, IoType::InOut),
        (PortDirection::Tristate, IoType::Output),
        (PortDirection::Undetermined, IoType::InOut),
    ];
    for (dir, io) in cases {
        assert_eq!(IoType::from(dir), io);
    }
}

#[test]
fn block_terminals_carry_mapped_io_types() {
    let ports = [
        ("a", PortDirection::Input, IoType::Input),
        ("b", PortDirection::Output, IoType::Output),
        ("c", PortDirection::Bidirectional, IoType::InOut),
        ("d", PortDirection::Tristate, IoType::Output),
        ("e", PortDirection::Undetermined, IoType::InOut),
    ];
    let mut network = MemNetwork::new("top");
    for (name, dir, _) in ports {
        let net = network.add_net(network.top(), name);
        network.add_port(net, name, dir);
    }

    let mut db = MemDb::new();
    translate(&network, &mut db).unwrap();

    let block = db.blocks()[0];
    assert_eq!(db.block_bterms(block).len(), ports.len());
    for (name, _, io) in ports {
        let bterm = db.find_bterm(block, name).unwrap();
        assert_eq!(db.bterm_io(bterm), io);
    }
}

#[test]
fn duplicate_port_names_reuse_one_terminal() {
    let mut network = MemNetwork::new("top");
    let n1 = network.add_net(network.top(), "n1");
    let n2 = network.add_net(network.top(), "n2");
    network.add_port(n1, "io", PortDirection::Input);
    network.add_port(n2, "io", PortDirection::Output);

    let mut db = MemDb::new();
    translate(&network, &mut db).unwrap();

    let block = db.blocks()[0];
    assert_eq!(db.block_nets(block).len(), 2);
    assert_eq!(db.block_bterms(block).len(), 1);
    // The first visit created the terminal; the revisit left it alone.
    let bterm = db.find_bterm(block, "io").unwrap();
    assert_eq!(db.bterm_io(bterm), IoType::Input);
}

#[test]
fn supply_nets_are_never_materialized() {
    let mut network = MemNetwork::new("top");
    let inv = network.add_cell("INV");
    let u0 = network.add_instance(network.top(), inv, "u0");
    let vdd = network.add_net(network.top(), "vdd");
    network.set_power(vdd);
    network.add_pin(u0, vdd, "VPWR");
    let vss = network.add_net(network.top(), "vss");
    network.set_ground(vss);
    network.add_pin(u0, vss, "VGND");

    let mut db = MemDb::new();
    let lib = db.add_lib("stdcells");
    let master = db.add_master(lib, "INV");
    db.add_mterm(master, "VPWR");
    db.add_mterm(master, "VGND");
    translate(&network, &mut db).unwrap();

    let block = db.blocks()[0];
    assert!(db.block_nets(block).is_empty());
}

#[test]
fn empty_net_translates_with_no_terminals() {
    let mut network = MemNetwork::new("top");
    network.add_net(network.top(), "floating");

    let mut db = MemDb::new();
    translate(&network, &mut db).unwrap();

    let block = db.blocks()[0];
    let nets = db.block_nets(block);
    assert_eq!(nets.len(), 1);
    assert_eq!(db.net_name(nets[0]), "floating");
    assert!(db.net_iterms(nets[0]).is_empty());
    assert!(db.net_bterms(nets[0]).is_empty());
}

#[test]
fn lower_level_nets_follow_the_terminal_rule() {
    let mut network = MemNetwork::new("top");
    let sub = network.add_cell("sub");
    let inv = network.add_cell("INV");
    let mid = network.add_instance(network.top(), sub, "mid");
    let u0 = network.add_instance(mid, inv, "u0");
    let u1 = network.add_instance(mid, inv, "u1");

    // A pass-through net with no terminal at its own scope is
    // flattened into a real net, named by its full path.
    let n1 = network.add_net(mid, "n1");
    network.add_pin(u0, n1, "Y");
    network.add_pin(u1, n1, "A");

    // A net that terminates locally is not materialized.
    let n2 = network.add_net(mid, "n2");
    network.add_term(n2);
    network.add_pin(u1, n2, "Y");

    let mut db = MemDb::new();
    let lib = db.add_lib("stdcells");
    let master = db.add_master(lib, "INV");
    db.add_mterm(master, "A");
    db.add_mterm(master, "Y");
    translate(&network, &mut db).unwrap();

    let block = db.blocks()[0];
    let nets = db.block_nets(block);
    assert_eq!(nets.len(), 1);
    assert_eq!(db.net_name(nets[0]), "mid/n1");
    assert_eq!(db.net_iterms(nets[0]).len(), 2);
}

#[test]
fn database_failures_abort_translation() {
    let mut network = MemNetwork::new("top");
    network.add_net(network.top(), "n1");
    network.add_net(network.top(), "n1");

    let mut db = MemDb::new();
    let err = translate(&network, &mut db).unwrap_err();
    assert!(matches!(err, MemDbError::DuplicateNet(_)));

    // The first net landed before the collision aborted the pass.
    let block = db.blocks()[0];
    assert_eq!(db.block_nets(block).len(), 1);
}

#[test]
fn distances_snap_to_manufacturing_grid() {
    assert_eq!(meters_to_dbu(0.0000015, None), 1500);
    assert_eq!(meters_to_dbu(0.0000015, Some(10)), 1500);
    assert_eq!(meters_to_dbu(0.0000015, Some(7)), 1498);
}

#[test]
fn grid_comes_from_the_technology() {
    let mut db = MemDb::new();
    assert_eq!(db.manufacturing_grid(), None);
    db.set_manufacturing_grid(7);
    assert_eq!(meters_to_dbu(0.0000015, db.manufacturing_grid()), 1498);
}

#[test]
fn grid_aligned_dbu_round_trips() {
    for dbu in [0, 10, 1500, 123_450] {
        assert_eq!(meters_to_dbu(dbu_to_meters(dbu), Some(10)), dbu);
    }
    for dbu in [0, 7, 1498, 699_993] {
        assert_eq!(meters_to_dbu(dbu_to_meters(dbu), Some(7)), dbu);
    }
    for dbu in [1, 1500, 999_999_937] {
        assert_eq!(meters_to_dbu(dbu_to_meters(dbu), None), dbu);
    }
}

#[test]
fn dbu_to_meters_scales_by_nanometers() {
    assert_relative_eq!(dbu_to_meters(1500), 1.5e-6);
    assert_relative_eq!(dbu_to_meters(0), 0.0);
}
