//! Logical-to-physical netlist translation.
//!
//! Translates a hierarchical logical netlist (cells, instances, pins,
//! nets, ports) into a flattened physical-design database: a single
//! block holding one physical instance per leaf instance, one physical
//! net per retained logical net, and the block/instance terminals that
//! connect them. The result is suitable for downstream physical design
//! tools such as placers and routers.
//!
//! Neither model is owned by this crate. The logical netlist is
//! consumed through the [`Network`] trait and the physical database is
//! populated through the [`Database`] trait; any pair of
//! implementations can be translated with [`translate`]. Small
//! in-memory implementations of both traits live in [`mem`] for tests
//! and examples.
//!
//! A logical net is retained in the flat netlist if it belongs to the
//! top instance, or if it has no terminal at its own hierarchical
//! scope (a pass-through net crossing a hierarchy boundary). Power and
//! ground nets are never retained.
//!
//! Linking is best-effort: a cell with no matching library master
//! still produces a physical instance (with no master), and a pin
//! whose master terminal cannot be resolved is dropped from the flat
//! netlist without raising an error. Callers that depend on full
//! connectivity coverage must verify terminal counts themselves; a
//! fail-fast mode that reports unresolved pins would be a
//! behavior-compatible extension, but the default soft policy is part
//! of this crate's contract. Failures raised by the database itself
//! (for example name collisions) are propagated untouched and abort
//! the remaining traversal.
#![warn(missing_docs)]

pub mod conv;
pub mod db;
pub mod mem;
pub mod netlist;
pub mod units;

#[cfg(test)]
pub(crate) mod tests;

pub use conv::translate;
pub use db::{Database, IoType};
pub use netlist::{Network, PortDirection};
pub use units::{dbu_to_meters, meters_to_dbu, Dbu, DBU_PER_METER};
