// External Crate Imports
use derive_more::Display;
use molzip::{GraphEngine, SmilesEngine};
use monomers::MonomerLibrary;
use rayon::prelude::*;
use tracing::{debug, info};

// Local Crate Imports
use crate::{Convention, Peptide, Result, assembly, helm, map};

// Public API ==========================================================================================================

/// The HELM id used when none is given
pub const DEFAULT_HELM_ID: u32 = 1;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum Conversion {
    #[display("HELM to MAP")]
    HelmToMap,
    #[display("MAP to HELM")]
    MapToHelm,
    #[display("MAP to SMILES")]
    MapToSmiles,
    #[display("HELM to SMILES")]
    HelmToSmiles,
}

/// Translates between HELM, MAP, and SMILES using a single monomer library
///
/// A `Translator` holds no per-peptide state, so one can be shared freely between threads.
#[derive(Copy, Clone, Debug)]
pub struct Translator<'l, E = SmilesEngine> {
    library: &'l MonomerLibrary,
    convention: Convention,
    engine: E,
}

impl<'l> Translator<'l> {
    #[must_use]
    pub fn new(library: &'l MonomerLibrary) -> Self {
        Self {
            library,
            convention: Convention::default(),
            engine: SmilesEngine,
        }
    }
}

impl<'l, E: GraphEngine> Translator<'l, E> {
    #[must_use]
    pub const fn with_convention(mut self, convention: Convention) -> Self {
        self.convention = convention;
        self
    }

    #[must_use]
    pub fn with_engine<F: GraphEngine>(self, engine: F) -> Translator<'l, F> {
        Translator {
            library: self.library,
            convention: self.convention,
            engine,
        }
    }

    #[must_use]
    pub const fn library(&self) -> &'l MonomerLibrary {
        self.library
    }

    #[must_use]
    pub const fn convention(&self) -> Convention {
        self.convention
    }

    pub fn parse_helm(&self, helm: &str) -> Result<Peptide<'l>> {
        helm::parse(self.library, helm)
    }

    pub fn parse_map(&self, map: &str) -> Result<Peptide<'l>> {
        map::parse(self.library, self.convention, map)
    }

    #[must_use]
    pub fn write_helm(&self, peptide: &Peptide, id: u32) -> String {
        helm::write(peptide, id)
    }

    #[must_use]
    pub fn write_map(&self, peptide: &Peptide) -> String {
        map::write(peptide, self.convention)
    }

    pub fn smiles(&self, peptide: &Peptide) -> Result<String> {
        assembly::assemble(&self.engine, peptide)
    }

    pub fn helm_to_map(&self, helm: &str) -> Result<String> {
        self.parse_helm(helm).map(|p| self.write_map(&p))
    }

    pub fn map_to_helm(&self, map: &str, id: u32) -> Result<String> {
        self.parse_map(map).map(|p| self.write_helm(&p, id))
    }

    pub fn map_to_smiles(&self, map: &str) -> Result<String> {
        self.smiles(&self.parse_map(map)?)
    }

    pub fn helm_to_smiles(&self, helm: &str) -> Result<String> {
        self.smiles(&self.parse_helm(helm)?)
    }

    /// Translates a single line of batch input. Blank lines translate to empty output.
    ///
    /// When translating MAP to HELM, the line may carry its own HELM id as `MAP,ID`, otherwise `default_id` is used.
    pub fn translate(&self, conversion: Conversion, line: &str, default_id: u32) -> Result<String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(String::new());
        }

        match conversion {
            Conversion::HelmToMap => self.helm_to_map(line),
            Conversion::MapToHelm => {
                let (map, id) = split_id(line).unwrap_or((line, default_id));
                self.map_to_helm(map, id)
            }
            Conversion::MapToSmiles => self.map_to_smiles(line),
            Conversion::HelmToSmiles => self.helm_to_smiles(line),
        }
    }

    /// Translates every line independently and in parallel, returning the results in input order
    pub fn translate_batch<S>(&self, conversion: Conversion, lines: &[S], default_id: u32) -> Vec<Result<String>>
    where
        S: AsRef<str> + Sync,
        E: Sync,
    {
        debug!(%conversion, lines = lines.len(), "starting batch translation");
        let results: Vec<_> = lines
            .par_iter()
            .map(|line| self.translate(conversion, line.as_ref(), default_id))
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(
            %conversion,
            translated = results.len() - failed,
            failed,
            "finished batch translation"
        );
        results
    }
}

// Private Helper Code =================================================================================================

fn split_id(line: &str) -> Option<(&str, u32)> {
    let (map, id) = line.split_once(',')?;
    let id = id.trim().parse().ok()?;
    Some((map.trim_end(), id))
}

// Module Tests ========================================================================================================
