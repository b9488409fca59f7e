/*!
# Vigil DevKit - Fixtures pour tests de la sonde

Bibliothèque facilitant les tests des collecteurs Vigil avec:
- Arborescences `/proc` factices dans un répertoire temporaire
- Rendu des formats texte du noyau (stat, meminfo, net/dev, net/tcp)
*/

pub mod proc_fixture;

pub use proc_fixture::{CpuTicks, ProcFixture};
