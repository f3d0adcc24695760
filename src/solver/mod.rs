//! Frequency-domain evaluation of the element tree.
//!
//! ## Two-port cascade
//!
//! Every element between the input and a speaker is a two-port with an
//! input impedance `Zin` and a voltage transfer `T`, both functions of the
//! load `Zc` presented by its children:
//!
//! ```text
//!   passive ladder   Zin = f(sections, Zc)   T = Π Z/(Zb + Z)
//!   active transfer  Zin = Zc                T = H(f)
//!   amplifier        Zin = Zc                T = G·ΠH(f)·Zc/(Zc + Zout)
//! ```
//!
//! Groups sum the responses of their children and combine impedances as
//! admittances. Powers are reflected toward the input with
//! `P_in = P_child·|Zc|/(|T|²·|Zin|)`.

mod ladder;
mod node;
mod simulator;

pub use ladder::{Ladder, Section, TwoPort};
pub use node::Node;
pub use simulator::{Simulator, SweepPoint};
