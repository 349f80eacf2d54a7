//! Assertion ingestion.
//!
//! Turns an uncurated list of candidate CIDs into a [`DerivationIndex`].
//! Candidates that are not assertions, carry a bad signature, or whose claim
//! does not dereference to the expected shapes are skipped. Annotated
//! productions and annotated sequents are read through to their target. Content the store
//! cannot deliver aborts the whole ingestion.

use dispatch_core::{
    is_valid_signature, Annotatable, FingerprintCache, ObjectStore, Production, ProductionMode,
    Record, Sequent,
};
use tracing::{debug, info};

use crate::error::LookupError;
use crate::types::{AssertionUnit, DerivationIndex, Mode};

/// One ingestion session over a store.
pub struct Ingestor<'s, S: ObjectStore + ?Sized> {
    store: &'s S,
    fingerprints: FingerprintCache,
}

impl<'s, S: ObjectStore + ?Sized> Ingestor<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            fingerprints: FingerprintCache::new(),
        }
    }

    /// Ingest every candidate, in order.
    pub async fn build_index(&mut self, candidates: &[String]) -> Result<DerivationIndex, LookupError> {
        let mut index = DerivationIndex::new();

        for cid in candidates {
            if let Some((conclusion, unit)) = self.ingest(cid).await? {
                index.push(conclusion, unit);
            }
        }

        info!(
            candidates = candidates.len(),
            assertions = index.assertion_count(),
            conclusions = index.len(),
            agents = self.fingerprints.len(),
            "Built derivation index"
        );
        Ok(index)
    }

    /// Normalize one candidate into `(conclusion, unit)`, or `None` if it
    /// does not qualify.
    pub async fn ingest(&mut self, cid: &str) -> Result<Option<(String, AssertionUnit)>, LookupError> {
        self.store.ensure_full_dag(cid).await?;

        let Some(Record::Assertion(assertion)) = self.fetch(cid).await? else {
            debug!(cid = %cid, "Skipping candidate: not an assertion");
            return Ok(None);
        };

        if !is_valid_signature(&assertion) {
            info!(cid = %cid, "Skipping assertion with invalid signature");
            return Ok(None);
        }

        let agent = self.fingerprints.fingerprint(&assertion.agent);

        let Some(production) = self.production(assertion.claim.cid()).await? else {
            debug!(cid = %cid, claim = %assertion.claim.cid(), "Skipping assertion: claim is not a production");
            return Ok(None);
        };

        let Some(sequent) = self.sequent(production.sequent.cid()).await? else {
            debug!(cid = %cid, "Skipping assertion: production does not link a sequent");
            return Ok(None);
        };

        for formula in sequent.dependencies.iter().chain(std::iter::once(&sequent.conclusion)) {
            if !matches!(self.fetch(formula.cid()).await?, Some(Record::Formula(_))) {
                debug!(cid = %cid, formula = %formula.cid(), "Skipping assertion: sequent links a non-formula");
                return Ok(None);
            }
        }

        if let ProductionMode::Tool(tool) = &production.mode {
            if !matches!(self.fetch(tool.cid()).await?, Some(Record::Tool(_))) {
                debug!(cid = %cid, tool = %tool.cid(), "Skipping assertion: mode does not link a tool");
                return Ok(None);
            }
        }

        let unit = AssertionUnit {
            agent,
            mode: Mode::from(&production.mode),
            dependencies: sequent
                .dependencies
                .iter()
                .map(|link| link.cid().to_string())
                .collect(),
        };
        debug!(cid = %cid, conclusion = %sequent.conclusion.cid(), agent = %unit.agent, "Indexed assertion");

        Ok(Some((sequent.conclusion.cid, unit)))
    }

    /// Dereference a claim to its production, through an annotation if needed.
    async fn production(&self, cid: &str) -> Result<Option<Production>, LookupError> {
        match self.fetch(cid).await? {
            Some(Record::Production(production)) => Ok(Some(production)),
            Some(Record::Annotated(wrapper)) if wrapper.kind == Annotatable::Production => {
                match self.fetch(wrapper.target.cid()).await? {
                    Some(Record::Production(production)) => Ok(Some(production)),
                    _ => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    /// Dereference a production's sequent, through an annotation if needed.
    async fn sequent(&self, cid: &str) -> Result<Option<Sequent>, LookupError> {
        match self.fetch(cid).await? {
            Some(Record::Sequent(sequent)) => Ok(Some(sequent)),
            Some(Record::Annotated(wrapper)) if wrapper.kind == Annotatable::Sequent => {
                match self.fetch(wrapper.target.cid()).await? {
                    Some(Record::Sequent(sequent)) => Ok(Some(sequent)),
                    _ => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    /// Fetch and decode a record. Fetch failures are errors, malformed
    /// records are `None`.
    async fn fetch(&self, cid: &str) -> Result<Option<Record>, LookupError> {
        let value = self.store.get(cid).await?;
        match Record::from_value(&value) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                debug!(cid = %cid, error = %e, "Malformed record");
                Ok(None)
            }
        }
    }
}

/// Build a derivation index with a fresh session.
pub async fn build_index<S: ObjectStore + ?Sized>(
    store: &S,
    candidates: &[String],
) -> Result<DerivationIndex, LookupError> {
    Ingestor::new(store).build_index(candidates).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_core::MemoryStore;
    use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
    use ed25519_dalek::pkcs8::EncodePublicKey;
    use ed25519_dalek::{Signer, SigningKey};
    use serde_json::{json, Value};

    struct Graph {
        store: MemoryStore,
        lang: String,
    }

    impl Graph {
        async fn new() -> Self {
            let store = MemoryStore::new();
            let lang = store.put(&json!({"format": "language", "content": "fol"})).await.unwrap();
            Self { store, lang }
        }

        async fn put(&self, value: Value) -> String {
            self.store.put(&value).await.unwrap()
        }

        async fn formula(&self, content: &str) -> String {
            self.put(json!({
                "format": "formula",
                "language": {"/": self.lang},
                "content": content,
                "context": []
            }))
            .await
        }

        async fn production(&self, deps: &[&str], conclusion: &str, mode: Value) -> String {
            let deps: Vec<Value> = deps.iter().map(|d| json!({"/": d})).collect();
            let sequent = self
                .put(json!({"format": "sequent", "dependencies": deps, "conclusion": {"/": conclusion}}))
                .await;
            self.put(json!({"format": "production", "sequent": {"/": sequent}, "mode": mode}))
                .await
        }

        async fn assert(&self, key: &SigningKey, claim: &str) -> String {
            let agent = key.verifying_key().to_public_key_pem(LineEnding::LF).unwrap();
            let signature = hex::encode(key.sign(claim.as_bytes()).to_bytes());
            self.put(json!({
                "format": "assertion",
                "agent": agent,
                "claim": {"/": claim},
                "signature": signature
            }))
            .await
        }
    }

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    #[tokio::test]
    async fn test_indexes_valid_assertion() {
        let g = Graph::new().await;
        let p = g.formula("p").await;
        let q = g.formula("q").await;
        let claim = g.production(&[&p], &q, json!("conjecture")).await;
        let assertion = g.assert(&key(1), &claim).await;

        let index = build_index(&g.store, &[assertion]).await.unwrap();
        let units = index.derivations(&q);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].mode, Mode::Conjecture);
        assert_eq!(units[0].dependencies, vec![p]);
    }

    #[tokio::test]
    async fn test_skips_non_assertions_and_bad_signatures() {
        let g = Graph::new().await;
        let q = g.formula("q").await;
        let claim = g.production(&[], &q, json!("axiom")).await;
        let other_claim = g.production(&[], &q, json!(null)).await;

        // Signed over a different claim than the one it links.
        let agent = key(2).verifying_key().to_public_key_pem(LineEnding::LF).unwrap();
        let forged = g
            .put(json!({
                "format": "assertion",
                "agent": agent,
                "claim": {"/": claim},
                "signature": hex::encode(key(2).sign(other_claim.as_bytes()).to_bytes())
            }))
            .await;

        let index = build_index(&g.store, &[q.clone(), claim.clone(), forged]).await.unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_annotated_production_and_tool_mode() {
        let g = Graph::new().await;
        let q = g.formula("q").await;
        let tool = g.put(json!({"format": "tool", "content": "vampire 4.8"})).await;
        let production = g.production(&[], &q, json!({"/": tool})).await;
        let annotated = g
            .put(json!({
                "format": "annotated-production",
                "production": {"/": production},
                "annotation": "found by saturation"
            }))
            .await;
        let assertion = g.assert(&key(3), &annotated).await;

        let index = build_index(&g.store, &[assertion]).await.unwrap();
        assert_eq!(index.derivations(&q)[0].mode, Mode::Tool(tool));
    }

    #[tokio::test]
    async fn test_annotated_sequent_is_read_through() {
        let g = Graph::new().await;
        let p = g.formula("p").await;
        let q = g.formula("q").await;
        let sequent = g
            .put(json!({"format": "sequent", "dependencies": [{"/": p}], "conclusion": {"/": q}}))
            .await;
        let annotated = g
            .put(json!({
                "format": "annotated-sequent",
                "sequent": {"/": sequent},
                "annotation": {"source": "textbook"}
            }))
            .await;
        let production = g
            .put(json!({"format": "production", "sequent": {"/": annotated}, "mode": "axiom"}))
            .await;
        let assertion = g.assert(&key(7), &production).await;

        let index = build_index(&g.store, &[assertion]).await.unwrap();
        let units = index.derivations(&q);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].mode, Mode::Axiom);
        assert_eq!(units[0].dependencies, vec![p]);
    }

    #[tokio::test]
    async fn test_foreign_object_is_skipped() {
        let g = Graph::new().await;
        g.store
            .insert_raw("bagaaieraforeign", json!({"hello": "world", "links": [{"/": g.lang}]}));

        let index = build_index(&g.store, &["bagaaieraforeign".to_string()])
            .await
            .unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_mode_link_must_be_tool() {
        let g = Graph::new().await;
        let q = g.formula("q").await;
        let not_a_tool = g.formula("r").await;
        let production = g.production(&[], &q, json!({"/": not_a_tool})).await;
        let assertion = g.assert(&key(3), &production).await;

        let index = build_index(&g.store, &[assertion]).await.unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_sequent_must_link_formulas() {
        let g = Graph::new().await;
        let q = g.formula("q").await;
        let tool = g.put(json!({"format": "tool", "content": "z3"})).await;
        let production = g.production(&[&tool], &q, json!("axiom")).await;
        let assertion = g.assert(&key(4), &production).await;

        let index = build_index(&g.store, &[assertion]).await.unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_alternatives_accumulate_in_order() {
        let g = Graph::new().await;
        let q = g.formula("q").await;
        let axiom = g.production(&[], &q, json!("axiom")).await;
        let first = g.assert(&key(5), &axiom).await;
        let second = g.assert(&key(6), &axiom).await;

        let mut ingestor = Ingestor::new(&g.store);
        let index = ingestor
            .build_index(&[first.clone(), second, first])
            .await
            .unwrap();

        let agents: Vec<&str> = index.derivations(&q).iter().map(|u| u.agent.as_str()).collect();
        assert_eq!(agents.len(), 3);
        assert_eq!(agents[0], agents[2]);
        assert_ne!(agents[0], agents[1]);
        assert_eq!(ingestor.fingerprints.len(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_candidate_is_fatal() {
        let g = Graph::new().await;
        let err = build_index(&g.store, &["bagaaieramissing".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, LookupError::Store(dispatch_core::StoreError::Unavailable { .. })));
    }
}
