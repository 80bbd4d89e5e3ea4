//! The logical netlist contract surface.
//!
//! The translator reads the hierarchical netlist through the
//! [`Network`] trait: opaque copyable handles for cells, instances,
//! nets, pins, and terminals, plus iteration and naming queries. The
//! model behind the trait is read-only for the duration of a
//! translation.

use std::fmt::{Display, Formatter};
use std::hash::Hash;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

/// The direction of a logical port.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input.
    Input,
    /// Output.
    Output,
    /// Input and output.
    Bidirectional,
    /// An output that can be disabled.
    Tristate,
    /// Direction not determined by the source description.
    #[default]
    Undetermined,
}

impl Display for PortDirection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
            Self::Bidirectional => write!(f, "bidirectional"),
            Self::Tristate => write!(f, "tristate"),
            Self::Undetermined => write!(f, "undetermined"),
        }
    }
}

/// A hierarchical logical netlist.
///
/// Handle types are plain copyable values whose meaning is private to
/// the implementation. [`Network::Cell`] additionally requires
/// identity comparison and hashing: cell identity keys the
/// cell-to-master cache during translation.
///
/// Enumeration methods return finite, consumed-once sequences with no
/// ordering guarantee beyond what the model itself provides.
pub trait Network {
    /// A logical device type, leaf or hierarchical.
    type Cell: Copy + Eq + Hash;
    /// An occurrence of a cell, forming a tree rooted at the top instance.
    type Instance: Copy;
    /// An equipotential set of pins, scoped to the instance that owns it.
    type Net: Copy;
    /// A connection point on an instance or on the top-level boundary.
    type Pin: Copy;
    /// A connection point of a net at its own hierarchical scope.
    type Term: Copy;

    /// The root of the hierarchy, representing the whole design.
    fn top_instance(&self) -> Self::Instance;

    /// The cell the given instance instantiates.
    fn cell(&self, inst: Self::Instance) -> Self::Cell;

    /// The name of the given cell.
    fn cell_name(&self, cell: Self::Cell) -> ArcStr;

    /// The character joining instance names into hierarchical paths.
    fn path_divider(&self) -> char;

    /// Enumerates every leaf instance in the hierarchy.
    fn leaf_instances(&self) -> Vec<Self::Instance>;

    /// Enumerates the instances directly inside the given instance.
    fn child_instances(&self, inst: Self::Instance) -> Vec<Self::Instance>;

    /// The fully qualified hierarchical path of the given instance.
    fn instance_path(&self, inst: Self::Instance) -> ArcStr;

    /// Enumerates the nets owned by the given instance.
    fn instance_nets(&self, inst: Self::Instance) -> Vec<Self::Net>;

    /// The fully qualified hierarchical path of the given net.
    fn net_path(&self, net: Self::Net) -> ArcStr;

    /// Enumerates the given net's terminals at its own scope.
    fn net_terms(&self, net: Self::Net) -> Vec<Self::Term>;

    /// Enumerates every pin connected to the given net.
    ///
    /// Each connected pin appears exactly once.
    fn connected_pins(&self, net: Self::Net) -> Vec<Self::Pin>;

    /// Whether the given net is tagged as a power supply.
    fn is_power(&self, net: Self::Net) -> bool;

    /// Whether the given net is tagged as a ground supply.
    fn is_ground(&self, net: Self::Net) -> bool;

    /// Whether the given pin sits on the top-level boundary.
    fn is_top_level_port(&self, pin: Self::Pin) -> bool;

    /// Whether the given pin belongs to a leaf instance.
    fn is_leaf_pin(&self, pin: Self::Pin) -> bool;

    /// The pin's local port name (unqualified).
    fn port_name(&self, pin: Self::Pin) -> ArcStr;

    /// The instance the given pin belongs to.
    fn pin_instance(&self, pin: Self::Pin) -> Self::Instance;

    /// The direction of the given pin.
    fn direction(&self, pin: Self::Pin) -> PortDirection;
}
