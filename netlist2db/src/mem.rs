//! In-memory implementations of the contract surfaces.
//!
//! [`MemNetwork`] and [`MemDb`] are small reference implementations of
//! [`Network`] and [`Database`] intended for tests and examples. They
//! carry no geometry or storage engine, just enough structure to
//! exercise a translation end to end: a buildable instance tree with
//! nets, pins, and terminals on the logical side, and a single-chip
//! object store with name-keyed lookup on the physical side.
//!
//! [`MemDb`] rejects duplicate block-scoped names with [`MemDbError`],
//! exercising the translator's propagation of database-policy
//! failures.

use std::cell::Cell;

use arcstr::ArcStr;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Database, IoType};
use crate::netlist::{Network, PortDirection};

/// A cell in a [`MemNetwork`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CellId(usize);

/// An instance in a [`MemNetwork`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct InstanceId(usize);

/// A net in a [`MemNetwork`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct NetId(usize);

/// A pin in a [`MemNetwork`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct PinId(usize);

/// A net terminal in a [`MemNetwork`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct TermId(usize);

#[derive(Debug, Clone)]
struct CellData {
    name: ArcStr,
}

#[derive(Debug, Clone)]
struct InstanceData {
    name: ArcStr,
    cell: CellId,
    parent: Option<InstanceId>,
    children: Vec<InstanceId>,
    nets: Vec<NetId>,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
enum NetKind {
    #[default]
    Signal,
    Power,
    Ground,
}

#[derive(Debug, Clone)]
struct NetData {
    name: ArcStr,
    owner: InstanceId,
    kind: NetKind,
    pins: Vec<PinId>,
    terms: Vec<TermId>,
}

#[derive(Debug, Clone, Copy)]
enum PinTarget {
    /// The top-level boundary.
    Top,
    /// A pin on the given instance.
    Instance(InstanceId),
}

#[derive(Debug, Clone)]
struct PinData {
    name: ArcStr,
    direction: PortDirection,
    target: PinTarget,
}

/// An in-memory hierarchical logical netlist.
///
/// [`MemNetwork::new`] creates the top cell together with its
/// instance; cells, instances, nets, pins, and terminals are then
/// added explicitly. The hierarchy path divider defaults to `/`.
#[derive(Debug, Clone)]
pub struct MemNetwork {
    divider: char,
    cells: Vec<CellData>,
    instances: Vec<InstanceData>,
    nets: Vec<NetData>,
    pins: Vec<PinData>,
    term_count: usize,
}

impl MemNetwork {
    /// Creates a network whose top cell and top instance carry the
    /// given name.
    pub fn new(top: impl Into<ArcStr>) -> Self {
        let name: ArcStr = top.into();
        Self {
            divider: '/',
            cells: vec![CellData { name: name.clone() }],
            instances: vec![InstanceData {
                name,
                cell: CellId(0),
                parent: None,
                children: Vec::new(),
                nets: Vec::new(),
            }],
            nets: Vec::new(),
            pins: Vec::new(),
            term_count: 0,
        }
    }

    /// The top instance.
    #[inline]
    pub fn top(&self) -> InstanceId {
        InstanceId(0)
    }

    /// Sets the hierarchy path divider.
    pub fn set_divider(&mut self, divider: char) {
        self.divider = divider;
    }

    /// Adds a cell with the given name.
    pub fn add_cell(&mut self, name: impl Into<ArcStr>) -> CellId {
        let id = CellId(self.cells.len());
        self.cells.push(CellData { name: name.into() });
        id
    }

    /// Adds an instance of `cell` inside `parent`.
    pub fn add_instance(
        &mut self,
        parent: InstanceId,
        cell: CellId,
        name: impl Into<ArcStr>,
    ) -> InstanceId {
        let id = InstanceId(self.instances.len());
        self.instances.push(InstanceData {
            name: name.into(),
            cell,
            parent: Some(parent),
            children: Vec::new(),
            nets: Vec::new(),
        });
        self.instances[parent.0].children.push(id);
        id
    }

    /// Adds a net owned by `owner`.
    pub fn add_net(&mut self, owner: InstanceId, name: impl Into<ArcStr>) -> NetId {
        let id = NetId(self.nets.len());
        self.nets.push(NetData {
            name: name.into(),
            owner,
            kind: NetKind::Signal,
            pins: Vec::new(),
            terms: Vec::new(),
        });
        self.instances[owner.0].nets.push(id);
        id
    }

    /// Tags the given net as a power supply.
    pub fn set_power(&mut self, net: NetId) {
        self.nets[net.0].kind = NetKind::Power;
    }

    /// Tags the given net as a ground supply.
    pub fn set_ground(&mut self, net: NetId) {
        self.nets[net.0].kind = NetKind::Ground;
    }

    /// Adds a top-level port pin with the given direction, connected
    /// to `net`.
    pub fn add_port(
        &mut self,
        net: NetId,
        name: impl Into<ArcStr>,
        direction: PortDirection,
    ) -> PinId {
        self.add_pin_data(
            net,
            PinData {
                name: name.into(),
                direction,
                target: PinTarget::Top,
            },
        )
    }

    /// Adds a pin named `name` on `inst`, connected to `net`.
    pub fn add_pin(&mut self, inst: InstanceId, net: NetId, name: impl Into<ArcStr>) -> PinId {
        self.add_pin_data(
            net,
            PinData {
                name: name.into(),
                direction: PortDirection::Undetermined,
                target: PinTarget::Instance(inst),
            },
        )
    }

    /// Attaches a terminal to `net` at its own scope.
    pub fn add_term(&mut self, net: NetId) -> TermId {
        let id = TermId(self.term_count);
        self.term_count += 1;
        self.nets[net.0].terms.push(id);
        id
    }

    fn add_pin_data(&mut self, net: NetId, pin: PinData) -> PinId {
        let id = PinId(self.pins.len());
        self.pins.push(pin);
        self.nets[net.0].pins.push(id);
        id
    }

    /// The hierarchical path of `inst`, excluding the top instance's
    /// own name.
    fn join_path(&self, inst: InstanceId) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let mut cur = &self.instances[inst.0];
        while let Some(parent) = cur.parent {
            parts.push(cur.name.as_str());
            cur = &self.instances[parent.0];
        }
        parts.reverse();
        parts.join(&self.divider.to_string())
    }
}

impl Network for MemNetwork {
    type Cell = CellId;
    type Instance = InstanceId;
    type Net = NetId;
    type Pin = PinId;
    type Term = TermId;

    fn top_instance(&self) -> InstanceId {
        InstanceId(0)
    }

    fn cell(&self, inst: InstanceId) -> CellId {
        self.instances[inst.0].cell
    }

    fn cell_name(&self, cell: CellId) -> ArcStr {
        self.cells[cell.0].name.clone()
    }

    fn path_divider(&self) -> char {
        self.divider
    }

    fn leaf_instances(&self) -> Vec<InstanceId> {
        self.instances
            .iter()
            .enumerate()
            .filter(|(i, data)| *i != 0 && data.children.is_empty())
            .map(|(i, _)| InstanceId(i))
            .collect()
    }

    fn child_instances(&self, inst: InstanceId) -> Vec<InstanceId> {
        self.instances[inst.0].children.clone()
    }

    fn instance_path(&self, inst: InstanceId) -> ArcStr {
        ArcStr::from(self.join_path(inst))
    }

    fn instance_nets(&self, inst: InstanceId) -> Vec<NetId> {
        self.instances[inst.0].nets.clone()
    }

    fn net_path(&self, net: NetId) -> ArcStr {
        let data = &self.nets[net.0];
        let prefix = self.join_path(data.owner);
        if prefix.is_empty() {
            data.name.clone()
        } else {
            arcstr::format!("{}{}{}", prefix, self.divider, data.name)
        }
    }

    fn net_terms(&self, net: NetId) -> Vec<TermId> {
        self.nets[net.0].terms.clone()
    }

    fn connected_pins(&self, net: NetId) -> Vec<PinId> {
        self.nets[net.0].pins.clone()
    }

    fn is_power(&self, net: NetId) -> bool {
        self.nets[net.0].kind == NetKind::Power
    }

    fn is_ground(&self, net: NetId) -> bool {
        self.nets[net.0].kind == NetKind::Ground
    }

    fn is_top_level_port(&self, pin: PinId) -> bool {
        matches!(self.pins[pin.0].target, PinTarget::Top)
    }

    fn is_leaf_pin(&self, pin: PinId) -> bool {
        match self.pins[pin.0].target {
            PinTarget::Instance(inst) => self.instances[inst.0].children.is_empty(),
            PinTarget::Top => false,
        }
    }

    fn port_name(&self, pin: PinId) -> ArcStr {
        self.pins[pin.0].name.clone()
    }

    fn pin_instance(&self, pin: PinId) -> InstanceId {
        match self.pins[pin.0].target {
            PinTarget::Instance(inst) => inst,
            PinTarget::Top => InstanceId(0),
        }
    }

    fn direction(&self, pin: PinId) -> PortDirection {
        self.pins[pin.0].direction
    }
}

/// A chip in a [`MemDb`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChipId(usize);

/// A block in a [`MemDb`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockId(usize);

/// A library in a [`MemDb`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct LibId(usize);

/// A master in a [`MemDb`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct MasterId(usize);

/// A physical instance in a [`MemDb`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct DbInstId(usize);

/// A physical net in a [`MemDb`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct DbNetId(usize);

/// A block terminal in a [`MemDb`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct BTermId(usize);

/// A master terminal definition in a [`MemDb`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct MTermId(usize);

/// A creation failure raised by [`MemDb`] as database policy.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum MemDbError {
    /// The database already has a chip.
    #[error("chip already exists")]
    DuplicateChip,
    /// A block with the same name already exists.
    #[error("block `{0}` already exists")]
    DuplicateBlock(ArcStr),
    /// An instance with the same name already exists in the block.
    #[error("instance `{0}` already exists in block")]
    DuplicateInst(ArcStr),
    /// A net with the same name already exists in the block.
    #[error("net `{0}` already exists in block")]
    DuplicateNet(ArcStr),
    /// A block terminal with the same name already exists in the block.
    #[error("block terminal `{0}` already exists in block")]
    DuplicateBTerm(ArcStr),
}

#[derive(Debug, Clone)]
struct BlockData {
    name: ArcStr,
    divider: char,
    bus_delimiters: Option<(char, char)>,
    insts: IndexMap<ArcStr, DbInstId>,
    nets: IndexMap<ArcStr, DbNetId>,
    bterms: IndexMap<ArcStr, BTermId>,
}

#[derive(Debug, Clone)]
struct LibData {
    name: ArcStr,
    masters: IndexMap<ArcStr, MasterId>,
}

#[derive(Debug, Clone)]
struct MasterData {
    name: ArcStr,
    mterms: IndexMap<ArcStr, MTermId>,
}

#[derive(Debug, Clone)]
struct MTermData {
    name: ArcStr,
}

#[derive(Debug, Clone)]
struct DbInstData {
    name: ArcStr,
    master: Option<MasterId>,
}

#[derive(Debug, Clone)]
struct DbNetData {
    name: ArcStr,
    block: BlockId,
    iterms: Vec<(DbInstId, MTermId)>,
    bterms: Vec<BTermId>,
}

#[derive(Debug, Clone)]
struct BTermData {
    name: ArcStr,
    io: IoType,
}

/// An in-memory single-chip physical design database.
///
/// Libraries, masters, and master terminals are loaded up front with
/// the `add_*` methods; the [`Database`] impl then creates blocks,
/// instances, nets, and terminals. Name maps keep insertion order, so
/// enumeration in tests follows creation order. The number of
/// [`find_master`](Database::find_master) calls served is counted,
/// making master-cache behavior observable.
#[derive(Debug, Clone, Default)]
pub struct MemDb {
    has_chip: bool,
    blocks: Vec<BlockData>,
    libs: Vec<LibData>,
    masters: Vec<MasterData>,
    mterms: Vec<MTermData>,
    insts: Vec<DbInstData>,
    nets: Vec<DbNetData>,
    bterms: Vec<BTermData>,
    grid: Option<u32>,
    master_lookups: Cell<usize>,
}

impl MemDb {
    /// Creates an empty database with no libraries loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an empty library.
    pub fn add_lib(&mut self, name: impl Into<ArcStr>) -> LibId {
        let id = LibId(self.libs.len());
        self.libs.push(LibData {
            name: name.into(),
            masters: IndexMap::new(),
        });
        id
    }

    /// Adds a master to the given library.
    pub fn add_master(&mut self, lib: LibId, name: impl Into<ArcStr>) -> MasterId {
        let id = MasterId(self.masters.len());
        let name: ArcStr = name.into();
        self.masters.push(MasterData {
            name: name.clone(),
            mterms: IndexMap::new(),
        });
        self.libs[lib.0].masters.insert(name, id);
        id
    }

    /// Adds a terminal definition to the given master.
    pub fn add_mterm(&mut self, master: MasterId, name: impl Into<ArcStr>) -> MTermId {
        let id = MTermId(self.mterms.len());
        let name: ArcStr = name.into();
        self.mterms.push(MTermData { name: name.clone() });
        self.masters[master.0].mterms.insert(name, id);
        id
    }

    /// Defines the technology's manufacturing grid, in database units.
    pub fn set_manufacturing_grid(&mut self, grid: u32) {
        self.grid = Some(grid);
    }

    /// The blocks in creation order.
    pub fn blocks(&self) -> Vec<BlockId> {
        (0..self.blocks.len()).map(BlockId).collect()
    }

    /// The name of the given block.
    pub fn block_name(&self, block: BlockId) -> &ArcStr {
        &self.blocks[block.0].name
    }

    /// The given block's hierarchy path divider.
    pub fn block_divider(&self, block: BlockId) -> char {
        self.blocks[block.0].divider
    }

    /// The given block's bus delimiter pair, if configured.
    pub fn bus_delimiters(&self, block: BlockId) -> Option<(char, char)> {
        self.blocks[block.0].bus_delimiters
    }

    /// The given block's instances in creation order.
    pub fn block_insts(&self, block: BlockId) -> Vec<DbInstId> {
        self.blocks[block.0].insts.values().copied().collect()
    }

    /// The given block's nets in creation order.
    pub fn block_nets(&self, block: BlockId) -> Vec<DbNetId> {
        self.blocks[block.0].nets.values().copied().collect()
    }

    /// The given block's terminals in creation order.
    pub fn block_bterms(&self, block: BlockId) -> Vec<BTermId> {
        self.blocks[block.0].bterms.values().copied().collect()
    }

    /// The name of the given library.
    pub fn lib_name(&self, lib: LibId) -> &ArcStr {
        &self.libs[lib.0].name
    }

    /// The name of the given master.
    pub fn master_name(&self, master: MasterId) -> &ArcStr {
        &self.masters[master.0].name
    }

    /// The name of the given master terminal.
    pub fn mterm_name(&self, mterm: MTermId) -> &ArcStr {
        &self.mterms[mterm.0].name
    }

    /// The name of the given instance.
    pub fn inst_name(&self, inst: DbInstId) -> &ArcStr {
        &self.insts[inst.0].name
    }

    /// The name of the given net.
    pub fn net_name(&self, net: DbNetId) -> &ArcStr {
        &self.nets[net.0].name
    }

    /// The instance terminals connected to the given net.
    pub fn net_iterms(&self, net: DbNetId) -> &[(DbInstId, MTermId)] {
        &self.nets[net.0].iterms
    }

    /// The block terminals attached to the given net.
    pub fn net_bterms(&self, net: DbNetId) -> &[BTermId] {
        &self.nets[net.0].bterms
    }

    /// The name of the given block terminal.
    pub fn bterm_name(&self, bterm: BTermId) -> &ArcStr {
        &self.bterms[bterm.0].name
    }

    /// The I/O type of the given block terminal.
    pub fn bterm_io(&self, bterm: BTermId) -> IoType {
        self.bterms[bterm.0].io
    }

    /// The number of master lookups served so far.
    pub fn master_lookups(&self) -> usize {
        self.master_lookups.get()
    }
}

impl Database for MemDb {
    type Chip = ChipId;
    type Block = BlockId;
    type Lib = LibId;
    type Master = MasterId;
    type Inst = DbInstId;
    type Net = DbNetId;
    type BTerm = BTermId;
    type MTerm = MTermId;
    type Error = MemDbError;

    fn chip(&self) -> Option<ChipId> {
        if self.has_chip {
            Some(ChipId(0))
        } else {
            None
        }
    }

    fn create_chip(&mut self) -> Result<ChipId, MemDbError> {
        if self.has_chip {
            return Err(MemDbError::DuplicateChip);
        }
        self.has_chip = true;
        Ok(ChipId(0))
    }

    fn create_block(
        &mut self,
        _chip: ChipId,
        name: &str,
        path_divider: char,
    ) -> Result<BlockId, MemDbError> {
        if self.blocks.iter().any(|block| block.name == name) {
            return Err(MemDbError::DuplicateBlock(ArcStr::from(name)));
        }
        let id = BlockId(self.blocks.len());
        self.blocks.push(BlockData {
            name: ArcStr::from(name),
            divider: path_divider,
            bus_delimiters: None,
            insts: IndexMap::new(),
            nets: IndexMap::new(),
            bterms: IndexMap::new(),
        });
        Ok(id)
    }

    fn set_bus_delimiters(&mut self, block: BlockId, open: char, close: char) {
        self.blocks[block.0].bus_delimiters = Some((open, close));
    }

    fn libs(&self) -> Vec<LibId> {
        (0..self.libs.len()).map(LibId).collect()
    }

    fn find_master(&self, lib: LibId, name: &str) -> Option<MasterId> {
        self.master_lookups.set(self.master_lookups.get() + 1);
        self.libs[lib.0].masters.get(name).copied()
    }

    fn create_inst(
        &mut self,
        block: BlockId,
        master: Option<MasterId>,
        name: &str,
    ) -> Result<DbInstId, MemDbError> {
        if self.blocks[block.0].insts.contains_key(name) {
            return Err(MemDbError::DuplicateInst(ArcStr::from(name)));
        }
        let id = DbInstId(self.insts.len());
        let name = ArcStr::from(name);
        self.insts.push(DbInstData {
            name: name.clone(),
            master,
        });
        self.blocks[block.0].insts.insert(name, id);
        Ok(id)
    }

    fn find_inst(&self, block: BlockId, name: &str) -> Option<DbInstId> {
        self.blocks[block.0].insts.get(name).copied()
    }

    fn inst_master(&self, inst: DbInstId) -> Option<MasterId> {
        self.insts[inst.0].master
    }

    fn create_net(&mut self, block: BlockId, name: &str) -> Result<DbNetId, MemDbError> {
        if self.blocks[block.0].nets.contains_key(name) {
            return Err(MemDbError::DuplicateNet(ArcStr::from(name)));
        }
        let id = DbNetId(self.nets.len());
        let name = ArcStr::from(name);
        self.nets.push(DbNetData {
            name: name.clone(),
            block,
            iterms: Vec::new(),
            bterms: Vec::new(),
        });
        self.blocks[block.0].nets.insert(name, id);
        Ok(id)
    }

    fn find_bterm(&self, block: BlockId, name: &str) -> Option<BTermId> {
        self.blocks[block.0].bterms.get(name).copied()
    }

    fn create_bterm(&mut self, net: DbNetId, name: &str) -> Result<BTermId, MemDbError> {
        let block = self.nets[net.0].block;
        if self.blocks[block.0].bterms.contains_key(name) {
            return Err(MemDbError::DuplicateBTerm(ArcStr::from(name)));
        }
        let id = BTermId(self.bterms.len());
        let name = ArcStr::from(name);
        self.bterms.push(BTermData {
            name: name.clone(),
            io: IoType::InOut,
        });
        self.blocks[block.0].bterms.insert(name, id);
        self.nets[net.0].bterms.push(id);
        Ok(id)
    }

    fn set_io_type(&mut self, bterm: BTermId, io: IoType) {
        self.bterms[bterm.0].io = io;
    }

    fn find_mterm(&self, master: MasterId, name: &str) -> Option<MTermId> {
        self.masters[master.0].mterms.get(name).copied()
    }

    fn connect_iterm(
        &mut self,
        inst: DbInstId,
        net: DbNetId,
        mterm: MTermId,
    ) -> Result<(), MemDbError> {
        self.nets[net.0].iterms.push((inst, mterm));
        Ok(())
    }

    fn manufacturing_grid(&self) -> Option<u32> {
        self.grid
    }
}
