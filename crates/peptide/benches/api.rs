use std::sync::LazyLock;

use divan::{AllocProfiler, Bencher, black_box};
use molzip::SmilesEngine;
use monomers::MonomerLibrary;
use peptide::{Convention, Conversion, LinkPlan, Translator, assemble, helm, map};

#[global_allocator]
static ALLOC: AllocProfiler = AllocProfiler::system();

const MAPS: [&str; 4] = [
    "LLLL{d}PY{cyc:N-C}",
    "AAAKAAAAAAAD{cyc:4-12}",
    "AALV{nnm:NMX}LFFPITGD{ct:PPD}{cyc:N-12}",
    "{nnr:ABU}G{nnm:NMX}L{nnm:NMX}VL{nnm:NMX}AA{d}L{nnm:NMX}L{nnm:NMX}V{nnm:NMX}{nnr:MBM}{cyc:N-C}",
];
const HELM: &str = "PEPTIDE48{A.A.L.[meV].L.F.F.P.I.T.G.D.[-pip]}$PEPTIDE48,PEPTIDE48,1:R1-12:R3$$$";

static LIBRARY: LazyLock<MonomerLibrary> = LazyLock::new(MonomerLibrary::default);

fn main() {
    LazyLock::force(&LIBRARY);
    divan::main();
}

#[divan::bench]
fn load_library() -> MonomerLibrary {
    MonomerLibrary::default()
}

#[divan::bench(args = MAPS)]
fn parse_map(map: &str) {
    black_box(map::parse(&LIBRARY, Convention::Canonical, map).unwrap());
}

#[divan::bench]
fn parse_helm() {
    black_box(helm::parse(&LIBRARY, HELM).unwrap());
}

#[divan::bench(args = MAPS)]
fn plan(bencher: Bencher, map: &str) {
    let peptide = map::parse(&LIBRARY, Convention::Canonical, map).unwrap();
    bencher.bench(|| LinkPlan::new(black_box(&peptide)).unwrap());
}

#[divan::bench(args = MAPS)]
fn assembly(bencher: Bencher, map: &str) {
    let peptide = map::parse(&LIBRARY, Convention::Canonical, map).unwrap();
    bencher.bench(|| assemble(&SmilesEngine, black_box(&peptide)).unwrap());
}

#[divan::bench]
fn batch(bencher: Bencher) {
    let translator = Translator::new(&LIBRARY);
    let lines: Vec<_> = MAPS.iter().copied().cycle().take(256).collect();
    bencher.bench(|| translator.translate_batch(Conversion::MapToSmiles, &lines, 1));
}
