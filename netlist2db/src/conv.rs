//! Hierarchical netlist flattening.
//!
//! Translation runs in three phases over a single forward pass: create
//! the block, materialize one physical instance per leaf instance,
//! then walk the hierarchy's nets and materialize the retained ones
//! together with their terminals. There is no retry and no rollback; a
//! database failure leaves the database partially populated.

use std::collections::HashMap;

use tracing::{debug, span, Level};

use crate::db::Database;
use crate::netlist::Network;

/// Translates `network` into a flattened block inside `db`.
///
/// Creates the chip container if the database has none, then a block
/// named after the top cell, configured with the network's path
/// divider and `[`/`]` bus delimiters. Every leaf instance becomes a
/// physical instance named by its hierarchical path; every retained
/// net becomes a physical net named by its hierarchical path, with
/// block terminals for top-level ports and instance terminals for
/// resolvable leaf pins.
///
/// Unresolvable links (a cell with no library master, a pin with no
/// matching master terminal) are skipped without error; see the crate
/// documentation for the consequences of this soft policy.
///
/// # Errors
///
/// Propagates the database's own error if any creation operation
/// fails, aborting the remaining traversal.
pub fn translate<N: Network, D: Database>(network: &N, db: &mut D) -> Result<(), D::Error> {
    let _guard = span!(Level::INFO, "translating netlist into physical database").entered();
    let mut conv = Converter {
        network,
        db,
        masters: HashMap::new(),
    };
    let block = conv.make_block()?;
    conv.make_components(block)?;
    conv.make_nets(block)
}

struct Converter<'a, N: Network, D: Database> {
    network: &'a N,
    db: &'a mut D,
    /// Cell-to-master resolutions, misses included.
    masters: HashMap<N::Cell, Option<D::Master>>,
}

impl<'a, N: Network, D: Database> Converter<'a, N, D> {
    fn make_block(&mut self) -> Result<D::Block, D::Error> {
        let chip = match self.db.chip() {
            Some(chip) => chip,
            None => self.db.create_chip()?,
        };
        let design = self.network.cell_name(self.network.cell(self.network.top_instance()));
        let block = self
            .db
            .create_block(chip, &design, self.network.path_divider())?;
        self.db.set_bus_delimiters(block, '[', ']');
        Ok(block)
    }

    fn make_components(&mut self, block: D::Block) -> Result<(), D::Error> {
        let _guard = span!(Level::INFO, "creating physical instances").entered();
        for inst in self.network.leaf_instances() {
            let master = self.master(self.network.cell(inst));
            let name = self.network.instance_path(inst);
            self.db.create_inst(block, master, &name)?;
        }
        Ok(())
    }

    /// Resolves a cell to a library master, memoizing the result.
    ///
    /// Libraries are scanned in their defined order and the first
    /// master whose name matches the cell's name wins. Misses are
    /// memoized too, so each distinct cell triggers at most one scan.
    fn master(&mut self, cell: N::Cell) -> Option<D::Master> {
        if let Some(&master) = self.masters.get(&cell) {
            return master;
        }
        let name = self.network.cell_name(cell);
        let mut found = None;
        for lib in self.db.libs() {
            if let Some(master) = self.db.find_master(lib, &name) {
                found = Some(master);
                break;
            }
        }
        if found.is_none() {
            debug!("no master found for cell `{}`", name);
        }
        self.masters.insert(cell, found);
        found
    }

    fn make_nets(&mut self, block: D::Block) -> Result<(), D::Error> {
        let _guard = span!(Level::INFO, "flattening nets").entered();
        self.flatten_nets(block, self.network.top_instance(), true)
    }

    /// Walks the nets owned by `inst`, then recurses into its children.
    ///
    /// A net is retained if it is owned by the top instance or has no
    /// terminal at its own scope, and is not a supply net.
    fn flatten_nets(
        &mut self,
        block: D::Block,
        inst: N::Instance,
        is_top: bool,
    ) -> Result<(), D::Error> {
        for net in self.network.instance_nets(inst) {
            if (is_top || self.network.net_terms(net).is_empty())
                && !self.network.is_ground(net)
                && !self.network.is_power(net)
            {
                self.make_net(block, net)?;
            }
        }
        for child in self.network.child_instances(inst) {
            self.flatten_nets(block, child, false)?;
        }
        Ok(())
    }

    fn make_net(&mut self, block: D::Block, net: N::Net) -> Result<(), D::Error> {
        let db_net = self.db.create_net(block, &self.network.net_path(net))?;
        for pin in self.network.connected_pins(net) {
            if self.network.is_top_level_port(pin) {
                let port = self.network.port_name(pin);
                // Revisits of an already-exposed port reuse its terminal.
                if self.db.find_bterm(block, &port).is_none() {
                    let bterm = self.db.create_bterm(db_net, &port)?;
                    self.db.set_io_type(bterm, self.network.direction(pin).into());
                }
            } else if self.network.is_leaf_pin(pin) {
                self.connect_pin(block, db_net, pin)?;
            }
        }
        Ok(())
    }

    /// Connects a leaf pin to `db_net` through its master's terminal.
    ///
    /// An unresolved link anywhere along the chain (instance, master,
    /// master terminal) drops the connection silently.
    fn connect_pin(&mut self, block: D::Block, db_net: D::Net, pin: N::Pin) -> Result<(), D::Error> {
        let port = self.network.port_name(pin);
        let inst_name = self.network.instance_path(self.network.pin_instance(pin));
        if let Some(db_inst) = self.db.find_inst(block, &inst_name) {
            if let Some(master) = self.db.inst_master(db_inst) {
                if let Some(mterm) = self.db.find_mterm(master, &port) {
                    return self.db.connect_iterm(db_inst, db_net, mterm);
                }
            }
        }
        debug!("dropping unresolved connection `{}`/`{}`", inst_name, port);
        Ok(())
    }
}
