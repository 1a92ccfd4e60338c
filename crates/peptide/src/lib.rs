//! Translates peptides between HELM, MAP, and SMILES
//!
//! Both text notations are read into the same [`Peptide`] model, resolved against a
//! [`MonomerLibrary`](monomers::MonomerLibrary). From there, a peptide can be written back out as either notation, or
//! planned ([`LinkPlan`]) and assembled into a SMILES structure with a [`GraphEngine`](molzip::GraphEngine).

mod assembly;
mod errors;
pub mod helm;
mod linkage;
pub mod map;
mod model;
mod planner;
mod translate;

// Public API ==========================================================================================================

pub use assembly::assemble;
pub use errors::{AssemblyError, Error, Notation, NotationErrorKind, Result};
pub use linkage::{Convention, CycTag, Linkage, LinkageError};
pub use model::{Peptide, Residue, Unit};
pub use planner::{Consumption, LinkPlan};
pub use translate::{Conversion, DEFAULT_HELM_ID, Translator};
