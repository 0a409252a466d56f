/*!
# Coolwatch DevKit - Scénarios et Utilitaires pour Développement

Bibliothèque facilitant les tests du moteur Coolwatch avec:
- Harness de scénarios déterministes (seed fixe, horloge logique)
- Températures forcées pour piloter les seuils sans hasard
- Helpers d'inspection du journal et des alertes
*/

pub mod scenario;

pub use scenario::ScenarioHarness;
