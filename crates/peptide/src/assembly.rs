// External Crate Imports
use molzip::{AttachmentId, GraphEngine, Site};
use tracing::debug;

// Local Crate Imports
use crate::{
    AssemblyError, Error, Notation, Peptide, Result,
    model::Residue,
    planner::{Consumption, LinkPlan},
};

// Public API ==========================================================================================================

/// Builds the full structure of `peptide` with `engine`
///
/// Every monomer's fragment is loaded and its unused attachment points are capped. The fragments are then joined
/// left to right, `R2` to `R1`, and the ring (if there is one) is closed last.
///
/// # Errors
///
/// Fails if the peptide contains literals or opaque terminal tags, which have no structure, if the [`LinkPlan`] can't
/// be built, or if the engine fails at any step.
pub fn assemble<E: GraphEngine>(engine: &E, peptide: &Peptide) -> Result<String> {
    let unknown = peptide
        .literals()
        .chain(peptide.n_term_mods().iter().map(String::as_str))
        .chain(peptide.c_term_mods().iter().map(String::as_str))
        .next();
    if let Some(token) = unknown {
        return Err(Error::UnknownMonomer {
            notation: Notation::Map,
            token: token.to_owned(),
        });
    }

    let plan = LinkPlan::new(peptide)?;

    let mut fragments = peptide.residues().map(|residue| capped_fragment(engine, &plan, residue));
    let Some(first) = fragments.next() else {
        return Err(Error::EmptyPeptide);
    };
    let chain = fragments.zip(2..).try_fold(first?, |left, (right, position)| {
        let left_site = Site::new(position - 1, AttachmentId::A2);
        let right_site = Site::new(position, AttachmentId::A1);
        engine
            .join_fragments(left, left_site, right?, right_site)
            .map_err(|source| AssemblyError::Join {
                left: left_site,
                right: right_site,
                source,
            })
    })?;

    let chain = match plan.cyclization() {
        Some(link) => engine
            .close_ring(chain, link.source, link.target)
            .map_err(|source| AssemblyError::Ring { link, source })?,
        None => chain,
    };

    let smiles = engine.write(&chain).map_err(|source| AssemblyError::Write { source })?;
    debug!(residues = peptide.len(), cyclic = plan.cyclization().is_some(), "assembled peptide");
    Ok(smiles)
}

// Private Helper Code =================================================================================================

fn capped_fragment<E: GraphEngine>(
    engine: &E,
    plan: &LinkPlan,
    Residue { position, monomer }: Residue,
) -> Result<E::Fragment, AssemblyError> {
    let fragment = engine
        .fragment(&monomer.smiles, position)
        .map_err(|source| AssemblyError::Fragment {
            position,
            symbol: monomer.symbol.clone(),
            source,
        })?;

    plan.at(position)
        .filter(|&(_, consumption)| consumption == Consumption::Unused)
        .filter_map(|(attachment, _)| Some((Site::new(position, attachment), monomer.cap(attachment)?)))
        .try_fold(fragment, |fragment, (site, cap)| {
            engine
                .cap_attachment(fragment, site, cap)
                .map_err(|source| AssemblyError::Cap {
                    site,
                    cap: cap.to_owned(),
                    source,
                })
        })
}

// Module Tests ========================================================================================================
