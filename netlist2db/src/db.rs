//! The physical database contract surface.
//!
//! The translator populates the physical design database through the
//! [`Database`] trait: creation and lookup of chips, blocks, library
//! masters, instances, nets, and terminals. Creation methods carry the
//! database's own error type; the translator propagates those errors
//! without wrapping or reinterpreting them.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::netlist::PortDirection;

/// The I/O type of a block terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
pub enum IoType {
    /// Input.
    Input,
    /// Output.
    Output,
    /// Input or output.
    #[default]
    InOut,
}

impl Display for IoType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
            Self::InOut => write!(f, "inout"),
        }
    }
}

impl From<PortDirection> for IoType {
    /// Folds the logical direction domain onto the physical one.
    ///
    /// Tristate ports map to [`IoType::Output`] and undetermined ports
    /// to [`IoType::InOut`]. The tristate fold is lossy; downstream
    /// consumers see a plain output.
    fn from(dir: PortDirection) -> Self {
        match dir {
            PortDirection::Input => Self::Input,
            PortDirection::Output | PortDirection::Tristate => Self::Output,
            PortDirection::Bidirectional | PortDirection::Undetermined => Self::InOut,
        }
    }
}

/// A physical design database.
///
/// Handle types are plain copyable values whose meaning is private to
/// the implementation. Lookup methods return [`None`] on a miss;
/// creation methods return the database's [`Database::Error`] when the
/// database itself rejects the operation (for example on a name
/// collision). Whether a block name may repeat, or a second chip may
/// exist, is database policy and not part of this contract.
pub trait Database {
    /// The container for a chip's blocks.
    type Chip: Copy;
    /// A flattened design container.
    type Block: Copy;
    /// A loaded physical library.
    type Lib: Copy;
    /// A library cell template.
    type Master: Copy;
    /// A physical instance of a master.
    type Inst: Copy;
    /// A flat physical net.
    type Net: Copy;
    /// A named connection point on a block boundary.
    type BTerm: Copy;
    /// A terminal definition on a master.
    type MTerm: Copy;
    /// The failure signal raised by creation operations.
    type Error: std::error::Error;

    /// The chip container, if one exists.
    fn chip(&self) -> Option<Self::Chip>;

    /// Creates a chip container.
    fn create_chip(&mut self) -> Result<Self::Chip, Self::Error>;

    /// Creates a block under the given chip.
    fn create_block(
        &mut self,
        chip: Self::Chip,
        name: &str,
        path_divider: char,
    ) -> Result<Self::Block, Self::Error>;

    /// Sets the pair of characters delimiting bus bit indices in the
    /// block's names.
    fn set_bus_delimiters(&mut self, block: Self::Block, open: char, close: char);

    /// Enumerates the loaded libraries in their defined order.
    fn libs(&self) -> Vec<Self::Lib>;

    /// Finds a master by name within the given library.
    fn find_master(&self, lib: Self::Lib, name: &str) -> Option<Self::Master>;

    /// Creates a physical instance under the given block.
    ///
    /// A `None` master records an instance whose cell could not be
    /// resolved against the loaded libraries.
    fn create_inst(
        &mut self,
        block: Self::Block,
        master: Option<Self::Master>,
        name: &str,
    ) -> Result<Self::Inst, Self::Error>;

    /// Finds an instance by name within the given block.
    fn find_inst(&self, block: Self::Block, name: &str) -> Option<Self::Inst>;

    /// The master the given instance is bound to, if any.
    fn inst_master(&self, inst: Self::Inst) -> Option<Self::Master>;

    /// Creates a physical net under the given block.
    fn create_net(&mut self, block: Self::Block, name: &str) -> Result<Self::Net, Self::Error>;

    /// Finds a block terminal by name within the given block.
    fn find_bterm(&self, block: Self::Block, name: &str) -> Option<Self::BTerm>;

    /// Creates a block terminal on the given net.
    fn create_bterm(&mut self, net: Self::Net, name: &str) -> Result<Self::BTerm, Self::Error>;

    /// Sets a block terminal's I/O type.
    fn set_io_type(&mut self, bterm: Self::BTerm, io: IoType);

    /// Finds a terminal definition by name on the given master.
    fn find_mterm(&self, master: Self::Master, name: &str) -> Option<Self::MTerm>;

    /// Creates an instance terminal binding the given instance's
    /// master terminal to the given net.
    fn connect_iterm(
        &mut self,
        inst: Self::Inst,
        net: Self::Net,
        mterm: Self::MTerm,
    ) -> Result<(), Self::Error>;

    /// The technology's manufacturing grid in database units, if one
    /// is defined.
    fn manufacturing_grid(&self) -> Option<u32>;
}
